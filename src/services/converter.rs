//! Normalizes uploads to the bitmap container the label pipeline decodes.
//!
//! Bitmaps the decoder already handles, and that fit the print head, pass
//! through untouched. Anything else is piped through an external
//! ImageMagick-compatible tool that flattens transparency onto
//! white, shrinks the image to the print-head width, and writes a 24-bit
//! uncompressed bitmap to stdout.

use axum::body::Bytes;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tspl_raster::{BmpHeader, RasterError};

use crate::models::ConverterConfig;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no image converter available (tried {0})")]
    Unavailable(String),

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shells out to the first available conversion program
pub struct ImageConverter {
    programs: Vec<String>,
    max_width: u32,
    timeout: Duration,
}

impl ImageConverter {
    pub fn new(config: &ConverterConfig, max_width: u32) -> Self {
        Self {
            programs: config.programs.clone(),
            max_width,
            timeout: config.timeout(),
        }
    }

    /// Return `input` as a bitmap container, converting it if needed.
    ///
    /// Programs are tried in order; one that is not installed is skipped,
    /// any other failure is final. A bitmap that needs conversion but finds
    /// no converter is handed on unchanged so the decoder reports why it
    /// cannot be printed.
    pub async fn normalize(&self, input: Bytes) -> Result<Bytes, ConvertError> {
        let is_bitmap = tspl_raster::is_bmp(&input);
        if is_bitmap && !self.needs_conversion(&input) {
            tracing::debug!(bytes = input.len(), "Upload is already a printable bitmap");
            return Ok(input);
        }

        for program in &self.programs {
            match self.run(program, &input).await {
                Err(ConvertError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(program = %program, "Converter not installed, trying next");
                }
                Ok(output) => {
                    tracing::info!(
                        program = %program,
                        input_bytes = input.len(),
                        output_bytes = output.len(),
                        "Converted upload to bitmap"
                    );
                    return Ok(Bytes::from(output));
                }
                Err(e) => return Err(e),
            }
        }

        if is_bitmap {
            tracing::warn!(
                programs = %self.programs.join(", "),
                "No converter available for bitmap, decoding as-is"
            );
            return Ok(input);
        }

        Err(ConvertError::Unavailable(self.programs.join(", ")))
    }

    /// Whether a bitmap has a layout or width the decoder rejects but a
    /// converter can fix. Structurally broken files are left to the decoder.
    fn needs_conversion(&self, bitmap: &[u8]) -> bool {
        match BmpHeader::parse(bitmap) {
            Ok(header) => header.width > self.max_width,
            Err(RasterError::UnsupportedFormat { .. } | RasterError::UnsupportedCompression(_)) => {
                true
            }
            Err(_) => false,
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-".to_string(),
            "-background".to_string(),
            "white".to_string(),
            "-alpha".to_string(),
            "remove".to_string(),
            // `>` only shrinks, never enlarges
            "-resize".to_string(),
            format!("{}x>", self.max_width),
            "-type".to_string(),
            "TrueColor".to_string(),
            "BMP3:-".to_string(),
        ]
    }

    async fn run(&self, program: &str, input: &Bytes) -> Result<Vec<u8>, ConvertError> {
        let mut child = Command::new(program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Feed stdin concurrently so a large upload cannot deadlock against
        // a full stdout pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("converter stdin unavailable"))?;
        let input = input.clone();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ConvertError::Timeout {
                program: program.to_string(),
                secs: self.timeout.as_secs(),
            })??;

        if let Ok(Err(e)) = writer.await {
            // A converter that rejects its input may close stdin early.
            tracing::debug!(program = %program, %e, "Converter stopped reading input");
        }

        if !output.status.success() {
            return Err(ConvertError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}
