//! Decoder for uncompressed 24/32-bit bitmap containers.
//!
//! Only the fixed-offset fields needed to locate the pixel data are read.
//! Palettes, RLE and bitfield masks other than plain BGRA are not supported;
//! anything the decoder cannot represent exactly is rejected rather than
//! approximated.

use crate::error::RasterError;

const MAGIC: &[u8; 2] = b"BM";

const DATA_OFFSET_AT: usize = 10;
const INFO_HEADER_SIZE_AT: usize = 14;
const WIDTH_AT: usize = 18;
const HEIGHT_AT: usize = 22;
const BITS_PER_PIXEL_AT: usize = 28;
const COMPRESSION_AT: usize = 30;

/// Smallest buffer that holds every field up to and including the bit depth.
const MIN_HEADER_LEN: usize = BITS_PER_PIXEL_AT + 2;

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

const MASKS_AT: usize = 54;
/// Red, green, blue masks for pixels stored as B, G, R, A.
const BGRA_MASKS: [u32; 3] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF];

/// A decoded raster: top-down rows of interleaved R,G,B bytes, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap an RGB buffer, checking `pixels.len() == width * height * 3`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| RasterError::InvalidBitmap(format!("{width}x{height} overflows")))?;
        if pixels.len() != expected {
            return Err(RasterError::InvalidBitmap(format!(
                "{width}x{height} raster needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The `(r, g, b)` triple at column `x` of row `y` (top-down).
    pub fn rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        (self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
    }
}

/// True when `data` starts with the bitmap container magic.
pub fn is_bmp(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

/// The header fields of a bitmap container this crate can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpHeader {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub top_down: bool,
    data_offset: usize,
}

impl BmpHeader {
    /// Read and validate the header without touching the pixel data.
    ///
    /// Succeeds only for layouts [`decode_bmp`] supports: 24 or 32 bpp,
    /// uncompressed, or 32 bpp bitfields with the standard BGRA masks.
    pub fn parse(data: &[u8]) -> Result<Self, RasterError> {
        if data.len() < MIN_HEADER_LEN {
            return Err(RasterError::TruncatedData {
                needed: MIN_HEADER_LEN,
                actual: data.len(),
            });
        }
        if !is_bmp(data) {
            return Err(RasterError::InvalidBitmap("missing BM signature".to_string()));
        }

        let data_offset = read_u32(data, DATA_OFFSET_AT) as usize;
        let info_header_size = read_u32(data, INFO_HEADER_SIZE_AT) as usize;
        let raw_width = read_i32(data, WIDTH_AT);
        let raw_height = read_i32(data, HEIGHT_AT);
        let bits_per_pixel = read_u16(data, BITS_PER_PIXEL_AT);

        // Rejected before anything proportional to the declared size is allocated.
        if raw_width <= 0 || raw_height == 0 {
            return Err(RasterError::InvalidBitmap(format!(
                "non-positive dimensions {raw_width}x{raw_height}"
            )));
        }

        if bits_per_pixel != 24 && bits_per_pixel != 32 {
            return Err(RasterError::UnsupportedFormat { bits_per_pixel });
        }

        // Older core headers end before the compression field.
        if info_header_size >= COMPRESSION_AT + 4 - INFO_HEADER_SIZE_AT
            && data.len() >= COMPRESSION_AT + 4
        {
            match read_u32(data, COMPRESSION_AT) {
                BI_RGB => {}
                BI_BITFIELDS if bits_per_pixel == 32 => check_bgra_masks(data)?,
                other => return Err(RasterError::UnsupportedCompression(other)),
            }
        }

        Ok(Self {
            width: raw_width as u32,
            height: raw_height.unsigned_abs(),
            bits_per_pixel,
            top_down: raw_height < 0,
            data_offset,
        })
    }

    fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel as usize / 8
    }
}

/// Masks follow the 40-byte info header (or sit at the same offset inside
/// a V4/V5 header). Only the layout stored as B, G, R, A is decoded.
fn check_bgra_masks(data: &[u8]) -> Result<(), RasterError> {
    if data.len() < MASKS_AT + 12 {
        return Err(RasterError::TruncatedData {
            needed: MASKS_AT + 12,
            actual: data.len(),
        });
    }
    let masks = [
        read_u32(data, MASKS_AT),
        read_u32(data, MASKS_AT + 4),
        read_u32(data, MASKS_AT + 8),
    ];
    if masks != BGRA_MASKS {
        return Err(RasterError::UnsupportedCompression(BI_BITFIELDS));
    }
    Ok(())
}

/// Decode a bitmap container into a top-down RGB raster.
pub fn decode_bmp(data: &[u8]) -> Result<RasterImage, RasterError> {
    let header = BmpHeader::parse(data)?;
    let BmpHeader {
        width,
        height,
        top_down,
        data_offset,
        ..
    } = header;
    let bytes_per_pixel = header.bytes_per_pixel();

    let overflow = || RasterError::InvalidBitmap(format!("{width}x{height} overflows"));
    let row_bytes = (width as usize)
        .checked_mul(bytes_per_pixel)
        .ok_or_else(overflow)?;
    let stride = row_bytes.checked_add(3).ok_or_else(overflow)? / 4 * 4;
    let needed = stride
        .checked_mul(height as usize)
        .and_then(|n| n.checked_add(data_offset))
        .ok_or_else(overflow)?;

    if needed > data.len() {
        return Err(RasterError::TruncatedData {
            needed,
            actual: data.len(),
        });
    }

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height as usize {
        let src_row = if top_down { y } else { height as usize - 1 - y };
        let start = data_offset + src_row * stride;
        let row = &data[start..start + row_bytes];

        for px in row.chunks_exact(bytes_per_pixel) {
            // Stored as B, G, R[, A].
            pixels.extend_from_slice(&[px[2], px[1], px[0]]);
        }
    }

    RasterImage::new(width, height, pixels)
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn read_i32(data: &[u8], at: usize) -> i32 {
    read_u32(data, at) as i32
}
