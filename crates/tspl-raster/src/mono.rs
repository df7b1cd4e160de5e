//! Fixed-threshold reduction of an RGB raster to a packed 1-bit bitmap.

use crate::bmp::RasterImage;

/// Luminance below which a pixel is printed.
///
/// Fixed at build time; there is deliberately no dithering or gamma step.
pub const THRESHOLD: u32 = 128;

/// Packed monochrome bitmap, MSB-first, one bit per pixel, `1` = mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoBitmap {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl MonoBitmap {
    /// An all-blank bitmap.
    pub fn blank(width: u32, height: u32) -> Self {
        let stride = row_stride(width);
        Self {
            width,
            height,
            stride,
            data: vec![0; stride * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, `ceil(width / 8)`.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Whether the pixel at `(x, y)` is marked.
    pub fn is_marked(&self, x: u32, y: u32) -> bool {
        let byte = self.row(y)[x as usize / 8];
        byte & (0x80 >> (x % 8)) != 0
    }

    fn mark(&mut self, x: u32, y: u32) {
        let i = y as usize * self.stride + x as usize / 8;
        self.data[i] |= 0x80 >> (x % 8);
    }
}

/// Bytes needed for one packed row of `width` pixels.
pub fn row_stride(width: u32) -> usize {
    (width as usize).div_ceil(8)
}

/// Whether a pixel is dark enough to print.
///
/// Compares the channel sum against `3 * THRESHOLD`, which is exactly
/// "mean < THRESHOLD" without any integer rounding of the mean.
pub fn is_dark(r: u8, g: u8, b: u8) -> bool {
    (r as u32 + g as u32 + b as u32) < 3 * THRESHOLD
}

/// Quantize `image` to a monochrome bitmap of identical dimensions.
pub fn quantize(image: &RasterImage) -> MonoBitmap {
    let mut bitmap = MonoBitmap::blank(image.width(), image.height());
    let width = image.width() as usize;

    if width == 0 {
        return bitmap;
    }

    for (y, row) in image.pixels().chunks_exact(width * 3).enumerate() {
        for (x, px) in row.chunks_exact(3).enumerate() {
            if is_dark(px[0], px[1], px[2]) {
                bitmap.mark(x as u32, y as u32);
            }
        }
    }

    bitmap
}
