//! Header parsing utilities for upload requests.

use axum::http::HeaderMap;

use crate::error::ApiError;

/// Extension trait for convenient header parsing.
pub trait HeaderMapExt {
    /// Get a header value as a string, or return an error if missing.
    fn require_str(&self, name: &'static str) -> Result<&str, ApiError>;

    /// Get a header value as a string, returning None if missing.
    fn get_str(&self, name: &str) -> Option<&str>;
}

impl HeaderMapExt for HeaderMap {
    fn require_str(&self, name: &'static str) -> Result<&str, ApiError> {
        self.get_str(name).ok_or(ApiError::MissingHeader(name))
    }

    fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }
}
