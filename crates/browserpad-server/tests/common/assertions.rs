//! Custom assertions for API integration tests.

use reqwest::StatusCode;
use serde_json::Value;

/// Assert a successful envelope and return it.
#[track_caller]
pub fn assert_ok(response: (StatusCode, Value)) -> Value {
    let (status, body) = response;
    assert_eq!(status, StatusCode::OK, "Expected 200, got {status}: {body}");
    assert_eq!(body["success"], true, "Expected success: {body}");
    body
}

/// Assert a failed envelope with the given status and message.
#[track_caller]
pub fn assert_fails(response: (StatusCode, Value), expected_status: StatusCode, expected_message: &str) {
    let (status, body) = response;
    assert_eq!(status, expected_status, "Unexpected status, body: {body}");
    assert_eq!(body["success"], false, "Expected failure: {body}");
    assert_eq!(body["message"], expected_message, "Unexpected message: {body}");
}

/// Names in a `files` array, in order.
pub fn file_names(body: &Value) -> Vec<String> {
    body["files"]
        .as_array()
        .unwrap_or_else(|| panic!("No files array in {body}"))
        .iter()
        .map(|f| f["name"].as_str().unwrap_or_default().to_string())
        .collect()
}
