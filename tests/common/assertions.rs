//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert response is a TSPL payload for a label of the given size
pub fn assert_payload(response: &TestResponse, width_px: u32, height_px: u32) {
    assert_ok(response);
    assert_eq!(
        response.header("content-type"),
        Some("application/octet-stream")
    );

    let stride = width_px.div_ceil(8);
    let bitmap_line = format!("BITMAP 0,0,{stride},{height_px},0,");
    let text = String::from_utf8_lossy(response.bytes());
    assert!(
        text.contains(&bitmap_line),
        "Expected {bitmap_line:?} in payload"
    );
    assert!(
        response.bytes().ends_with(b"\r\nPRINT 1\r\n"),
        "Payload should end with PRINT 1"
    );
}
