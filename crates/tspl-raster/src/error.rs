//! Error type shared by every stage of the conversion pipeline.

use thiserror::Error;

/// Errors produced while turning an upload into a print payload.
///
/// Every variant aborts only the current conversion. The encoder itself is
/// infallible, so all of these originate in the extractor or the decoder.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RasterError {
    /// A structural element of the multipart body was not found.
    #[error("malformed upload: missing {0}")]
    MalformedUpload(&'static str),

    /// The bitmap header is inconsistent (bad magic, non-positive size, overflow).
    #[error("invalid bitmap: {0}")]
    InvalidBitmap(String),

    #[error("unsupported bitmap format: {bits_per_pixel} bits per pixel (expected 24 or 32)")]
    UnsupportedFormat { bits_per_pixel: u16 },

    #[error("unsupported bitmap compression: {0}")]
    UnsupportedCompression(u32),

    /// Declared pixel-data bounds exceed the buffer.
    #[error("truncated bitmap data: need {needed} bytes, got {actual}")]
    TruncatedData { needed: usize, actual: usize },
}
