use axum::body::Bytes;
use std::sync::Arc;
use tspl_raster::{decode_bmp, encode, quantize, LabelProfile, PrintPayload};

use crate::error::{ApiError, PipelineError};

/// A finished payload together with the dimensions it was built from
#[derive(Debug, Clone)]
pub struct RenderedLabel {
    pub payload: PrintPayload,
    pub width_px: u32,
    pub height_px: u32,
    pub width_mm: u32,
    pub height_mm: u32,
}

/// Decode → quantize → encode, with the print-head bound checked up front
pub struct LabelPipeline {
    profile: LabelProfile,
}

impl LabelPipeline {
    pub fn new(profile: LabelProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &LabelProfile {
        &self.profile
    }

    /// Convert a bitmap container into a print payload.
    ///
    /// Images wider than the print head are rejected here; the encoder
    /// itself never clamps.
    pub fn render(&self, bmp: &[u8]) -> Result<RenderedLabel, PipelineError> {
        let image = decode_bmp(bmp)?;

        if image.width() > self.profile.max_width_dots {
            return Err(PipelineError::LabelTooWide {
                width: image.width(),
                max: self.profile.max_width_dots,
            });
        }

        let bitmap = quantize(&image);
        let payload = encode(&bitmap, &self.profile);
        let (width_mm, height_mm) = self
            .profile
            .physical_size_mm(bitmap.width(), bitmap.height());

        tracing::debug!(
            width_px = bitmap.width(),
            height_px = bitmap.height(),
            width_mm,
            height_mm,
            payload_bytes = payload.len(),
            "Encoded label"
        );

        Ok(RenderedLabel {
            payload,
            width_px: bitmap.width(),
            height_px: bitmap.height(),
            width_mm,
            height_mm,
        })
    }

    /// Run [`render`](Self::render) on the blocking pool
    ///
    /// Keeps large decodes off the async worker threads.
    pub async fn render_in_blocking_context(
        self: &Arc<Self>,
        bmp: Bytes,
    ) -> Result<RenderedLabel, ApiError> {
        let pipeline = self.clone();

        tokio::task::spawn_blocking(move || pipeline.render(&bmp))
            .await
            .map_err(|e| ApiError::Internal(format!("Render task failed: {e}")))?
            .map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tspl_raster::RasterError;

    fn bmp24(width: u32, height: u32, value: u8) -> Vec<u8> {
        let stride = (width as usize * 3).div_ceil(4) * 4;
        let mut out = b"BM".to_vec();
        out.extend_from_slice(&((54 + stride * height as usize) as u32).to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&54u32.to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&(width as i32).to_le_bytes());
        out.extend_from_slice(&(height as i32).to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&24u16.to_le_bytes());
        out.extend_from_slice(&[0; 24]);
        out.resize(out.len() + stride * height as usize, value);
        out
    }

    #[test]
    fn test_render_reports_dimensions() {
        let pipeline = LabelPipeline::new(LabelProfile::DEFAULT);
        let label = pipeline.render(&bmp24(832, 203, 0)).unwrap();

        assert_eq!(label.width_px, 832);
        assert_eq!(label.height_px, 203);
        assert_eq!(label.width_mm, 104);
        assert_eq!(label.height_mm, 25);
        assert!(label
            .payload
            .as_bytes()
            .starts_with(b"SIZE 104 mm,25 mm\r\nGAP 2 mm,0 mm\r\nCLS\r\nBITMAP 0,0,104,203,0,"));
    }

    #[test]
    fn test_render_at_print_head_width() {
        let pipeline = LabelPipeline::new(LabelProfile::DEFAULT);
        assert!(pipeline.render(&bmp24(832, 1, 255)).is_ok());
    }

    #[test]
    fn test_render_beyond_print_head_width() {
        let pipeline = LabelPipeline::new(LabelProfile::DEFAULT);

        match pipeline.render(&bmp24(833, 1, 255)) {
            Err(PipelineError::LabelTooWide { width, max }) => {
                assert_eq!(width, 833);
                assert_eq!(max, 832);
            }
            other => panic!("expected LabelTooWide, got {other:?}"),
        }
    }

    #[test]
    fn test_render_propagates_decode_errors() {
        let pipeline = LabelPipeline::new(LabelProfile::DEFAULT);
        let mut data = bmp24(4, 4, 0);
        data.truncate(60);

        assert!(matches!(
            pipeline.render(&data),
            Err(PipelineError::Raster(RasterError::TruncatedData { .. }))
        ));
    }

    #[tokio::test]
    async fn test_render_in_blocking_context() {
        let pipeline = Arc::new(LabelPipeline::new(LabelProfile::DEFAULT));
        let label = pipeline
            .render_in_blocking_context(Bytes::from(bmp24(16, 8, 0)))
            .await
            .unwrap();

        assert_eq!(label.width_px, 16);
        assert_eq!(label.height_px, 8);
    }
}
