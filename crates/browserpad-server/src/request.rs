//! Decoding of request parameters.

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Parameters of one API call, taken from the query string or a JSON body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Params {
    pub action: Option<String>,
    pub file: Option<String>,
    pub dir: Option<String>,
    pub parent: Option<String>,
    pub content: Option<String>,
    pub filename: Option<String>,
    pub dirname: Option<String>,
    pub newname: Option<String>,
    #[serde(deserialize_with = "truthy")]
    pub permanent: bool,
}

impl Params {
    /// Decode URL query parameters. Unknown keys are ignored.
    pub(crate) fn from_query(query: Option<&str>) -> Self {
        let map: Map<String, Value> = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect();
        serde_json::from_value(Value::Object(map)).unwrap_or_default()
    }

    /// Decode a JSON body, which must be a non-empty object.
    pub(crate) fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) if !map.is_empty() => {
                serde_json::from_value(Value::Object(map)).map_err(|e| {
                    tracing::debug!(error = %e, "Rejected JSON body");
                    ApiError::invalid_json()
                })
            }
            Ok(_) => Err(ApiError::invalid_json()),
            Err(e) => {
                tracing::debug!(error = %e, "Malformed JSON body");
                Err(ApiError::invalid_json())
            }
        }
    }
}

/// The `action` field of a JSON body, if the body is a JSON object with one.
pub(crate) fn body_action(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("action")?.as_str().map(str::to_string)
}

/// A present, non-empty parameter.
pub(crate) fn required(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Collect the request body, refusing anything over `limit` bytes.
pub(crate) async fn read_body(body: Incoming, limit: usize) -> Result<Bytes, ApiError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::warn!(limit, "Request body too large");
            Err(ApiError::bad_request("Request body too large"))
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            Err(ApiError::bad_request("Invalid request body"))
        }
    }
}

/// Accept booleans, numbers and strings for a flag.
///
/// `""`, `"0"` and `"false"` are false, as are `0`, `null` and empty
/// containers.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(s.as_str(), "" | "0" | "false"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query() {
        let params = Params::from_query(Some("action=list&dir=%2Fdocs%20and%20notes&extra=1"));
        assert_eq!(params.action.as_deref(), Some("list"));
        assert_eq!(params.dir.as_deref(), Some("/docs and notes"));
        assert!(!params.permanent);

        let empty = Params::from_query(None);
        assert!(empty.action.is_none());
    }

    #[test]
    fn test_from_json_rejects_empty_and_non_objects() {
        let bodies: [&[u8]; 6] = [b"", b"{}", b"[]", b"\"text\"", b"{not json", b"null"];
        for body in bodies {
            let err = Params::from_json(body).unwrap_err();
            assert_eq!(err.message, "Invalid JSON input", "body {:?}", String::from_utf8_lossy(body));
        }
    }

    #[test]
    fn test_permanent_accepts_truthy_forms() {
        let cases: [(&[u8], bool); 7] = [
            (br#"{"file":"a","permanent":true}"#, true),
            (br#"{"file":"a","permanent":1}"#, true),
            (br#"{"file":"a","permanent":"1"}"#, true),
            (br#"{"file":"a","permanent":"true"}"#, true),
            (br#"{"file":"a","permanent":false}"#, false),
            (br#"{"file":"a","permanent":"0"}"#, false),
            (br#"{"file":"a"}"#, false),
        ];
        for (body, expected) in cases {
            assert_eq!(Params::from_json(body).unwrap().permanent, expected);
        }
    }

    #[test]
    fn test_body_action() {
        assert_eq!(body_action(br#"{"action":"rename"}"#).as_deref(), Some("rename"));
        assert_eq!(body_action(b"garbage"), None);
        assert_eq!(body_action(br#"{"action":3}"#), None);
    }

    #[test]
    fn test_required() {
        let present = "a".to_string();
        let empty = String::new();
        assert_eq!(required(Some(&present)), Some("a"));
        assert_eq!(required(Some(&empty)), None);
        assert_eq!(required(None), None);
    }
}
