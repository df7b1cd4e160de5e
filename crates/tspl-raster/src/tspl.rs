//! TSPL command payload encoding.
//!
//! A payload is a handful of CR LF terminated text directives with one raw
//! binary block embedded in the `BITMAP` directive:
//!
//! ```text
//! SIZE 104 mm,25 mm
//! GAP 2 mm,0 mm
//! CLS
//! BITMAP 0,0,104,200,0,<packed rows>
//! PRINT 1
//! ```

use crate::mono::MonoBitmap;

const CRLF: &[u8] = b"\r\n";

/// `BITMAP` mode selector: overwrite.
pub const BITMAP_MODE_OVERWRITE: u8 = 0;

/// Tenths of a millimeter per inch.
const TENTH_MM_PER_INCH: u64 = 254;

/// Device constants that shape the payload.
///
/// These are fixed per deployment, never per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelProfile {
    /// Print resolution in dots per inch.
    pub dpi: u32,
    /// Print-head width in dots. Not enforced by [`encode`].
    pub max_width_dots: u32,
    /// Gap between labels in millimeters.
    pub gap_mm: u32,
}

impl LabelProfile {
    /// 203 dpi, 104 mm (832 dot) print head, 2 mm gap.
    pub const DEFAULT: Self = Self {
        dpi: 203,
        max_width_dots: 832,
        gap_mm: 2,
    };

    /// Physical `(width, height)` in millimeters for a pixel size.
    pub fn physical_size_mm(&self, width_px: u32, height_px: u32) -> (u32, u32) {
        (px_to_mm(width_px, self.dpi), px_to_mm(height_px, self.dpi))
    }
}

impl Default for LabelProfile {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Convert a pixel count to whole millimeters at `dpi`.
///
/// Computes `round(px / dpi * 25.4)` in integer arithmetic, rounding exact
/// halves away from zero, so results never depend on float representation.
/// A `dpi` of zero yields 0; results beyond `u32` saturate.
pub fn px_to_mm(px: u32, dpi: u32) -> u32 {
    if dpi == 0 {
        return 0;
    }
    let numerator = 2 * px as u64 * TENTH_MM_PER_INCH + 10 * dpi as u64;
    u32::try_from(numerator / (20 * dpi as u64)).unwrap_or(u32::MAX)
}

/// Transport-ready printer command stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintPayload(Vec<u8>);

impl PrintPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for PrintPayload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Wrap `bitmap` in a single-copy print job.
pub fn encode(bitmap: &MonoBitmap, profile: &LabelProfile) -> PrintPayload {
    let (width_mm, height_mm) = profile.physical_size_mm(bitmap.width(), bitmap.height());

    let mut out = Vec::with_capacity(bitmap.data().len() + 96);
    directive(&mut out, &format!("SIZE {width_mm} mm,{height_mm} mm"));
    directive(&mut out, &format!("GAP {} mm,0 mm", profile.gap_mm));
    directive(&mut out, "CLS");

    out.extend_from_slice(
        format!(
            "BITMAP 0,0,{},{},{},",
            bitmap.stride(),
            bitmap.height(),
            BITMAP_MODE_OVERWRITE
        )
        .as_bytes(),
    );
    out.extend_from_slice(bitmap.data());
    out.extend_from_slice(CRLF);

    directive(&mut out, "PRINT 1");

    PrintPayload(out)
}

fn directive(buf: &mut Vec<u8>, line: &str) {
    buf.extend_from_slice(line.as_bytes());
    buf.extend_from_slice(CRLF);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmp::RasterImage;
    use crate::mono::quantize;
    use pretty_assertions::assert_eq;

    fn solid(width: u32, height: u32, value: u8) -> MonoBitmap {
        let pixels = vec![value; width as usize * height as usize * 3];
        quantize(&RasterImage::new(width, height, pixels).unwrap())
    }

    #[test]
    fn test_px_to_mm_rounding() {
        // 832 / 203 * 25.4 = 104.04
        assert_eq!(px_to_mm(832, 203), 104);
        // 8 / 203 * 25.4 = 1.0009
        assert_eq!(px_to_mm(8, 203), 1);
        // 12 / 203 * 25.4 = 1.5015, rounds up
        assert_eq!(px_to_mm(12, 203), 2);
        // 150 / 300 * 25.4 = 12.7
        assert_eq!(px_to_mm(150, 300), 13);
        assert_eq!(px_to_mm(0, 203), 0);
        assert_eq!(px_to_mm(100, 0), 0);
    }

    #[test]
    fn test_px_to_mm_saturates_at_tiny_dpi() {
        assert_eq!(px_to_mm(u32::MAX, 1), u32::MAX);
        assert_eq!(px_to_mm(1, 1), 25);
    }

    #[test]
    fn test_px_to_mm_exact_half_rounds_away_from_zero() {
        // 5 / 254 * 25.4 = 0.5 exactly
        assert_eq!(px_to_mm(5, 254), 1);
        // 25 / 254 * 25.4 = 2.5 exactly
        assert_eq!(px_to_mm(25, 254), 3);
    }

    #[test]
    fn test_encode_layout() {
        let bitmap = solid(16, 2, 0);
        let payload = encode(&bitmap, &LabelProfile::DEFAULT);

        let mut expected = b"SIZE 2 mm,0 mm\r\nGAP 2 mm,0 mm\r\nCLS\r\nBITMAP 0,0,2,2,0,".to_vec();
        expected.extend_from_slice(&[0xFF; 4]);
        expected.extend_from_slice(b"\r\nPRINT 1\r\n");

        assert_eq!(payload.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_encode_uses_profile_gap_and_dpi() {
        let profile = LabelProfile {
            dpi: 300,
            max_width_dots: 1248,
            gap_mm: 3,
        };
        let payload = encode(&solid(300, 600, 255), &profile);
        let text = String::from_utf8_lossy(payload.as_bytes());

        assert!(text.starts_with("SIZE 25 mm,51 mm\r\nGAP 3 mm,0 mm\r\nCLS\r\n"));
        assert!(text.contains("BITMAP 0,0,38,600,0,"));
        assert!(text.ends_with("\r\nPRINT 1\r\n"));
    }

    #[test]
    fn test_bitmap_block_length() {
        let bitmap = solid(10, 3, 255);
        let payload = encode(&bitmap, &LabelProfile::DEFAULT);
        let header = b"SIZE 1 mm,0 mm\r\nGAP 2 mm,0 mm\r\nCLS\r\nBITMAP 0,0,2,3,0,";
        let trailer = b"\r\nPRINT 1\r\n";

        assert_eq!(payload.len(), header.len() + 6 + trailer.len());
        assert_eq!(&payload.as_bytes()[header.len()..header.len() + 6], &[0; 6]);
    }

    #[test]
    fn test_encode_at_and_beyond_print_head_width() {
        let profile = LabelProfile::DEFAULT;

        let at_bound = encode(&solid(832, 1, 0), &profile);
        let text = String::from_utf8_lossy(at_bound.as_bytes());
        assert!(text.starts_with("SIZE 104 mm,0 mm\r\n"));
        assert!(text.contains("BITMAP 0,0,104,1,0,"));

        // Wider input is encoded as given: no clamping, no truncation.
        let beyond = encode(&solid(840, 1, 0), &profile);
        let text = String::from_utf8_lossy(beyond.as_bytes());
        assert!(text.contains("BITMAP 0,0,105,1,0,"));
        let block_start = text.find("BITMAP 0,0,105,1,0,").unwrap() + "BITMAP 0,0,105,1,0,".len();
        assert_eq!(&beyond.as_bytes()[block_start..block_start + 105], &[0xFF; 105][..]);
    }
}
