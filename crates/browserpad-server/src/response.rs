//! JSON response envelope and CORS headers.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::{Response, StatusCode};
use serde_json::{Map, Value};

use crate::error::ApiError;

const ALLOW_METHODS: &str = "POST, GET, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

/// A response before it is turned into HTTP.
///
/// The body is `{"success": ..., "message": ...}` with any extra fields
/// merged in at the top level. A reply without a body is sent empty.
#[derive(Debug)]
pub(crate) struct Reply {
    status: StatusCode,
    body: Option<Map<String, Value>>,
}

impl Reply {
    /// A successful reply with no extra fields.
    pub(crate) fn ok(message: &str) -> Self {
        Self::envelope(StatusCode::OK, true, message)
    }

    /// Empty 200 reply for CORS pre-flight.
    pub(crate) fn preflight() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
        }
    }

    /// Merge the fields of `data` (a JSON object) into the envelope.
    pub(crate) fn with(mut self, data: Value) -> Self {
        if let (Some(body), Value::Object(fields)) = (self.body.as_mut(), data) {
            body.extend(fields);
        }
        self
    }

    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }

    fn envelope(status: StatusCode, success: bool, message: &str) -> Self {
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(success));
        body.insert("message".into(), Value::String(message.to_string()));
        Self {
            status,
            body: Some(body),
        }
    }

    pub(crate) fn into_response(self, allowed_origin: &HeaderValue) -> Response<Full<Bytes>> {
        let body = self
            .body
            .map(|map| Bytes::from(Value::Object(map).to_string()))
            .unwrap_or_default();

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allowed_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
        response
    }
}

impl From<ApiError> for Reply {
    fn from(err: ApiError) -> Self {
        Self::envelope(err.status, false, &err.message)
    }
}
