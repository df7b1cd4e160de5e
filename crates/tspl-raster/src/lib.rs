//! tspl-raster: bitmap uploads to TSPL label payloads
//!
//! Pure, allocation-bounded conversion from an uploaded image to the byte
//! stream a direct-thermal label printer consumes. Nothing in this crate
//! performs I/O; each stage takes a buffer and returns a new value or a
//! [`RasterError`].
//!
//! # Pipeline
//!
//! ```
//! use tspl_raster::{decode_bmp, encode, extract_first_part, quantize, LabelProfile};
//!
//! // A 1x1 black pixel as a top-down 24-bit bitmap container.
//! let mut bmp = b"BM".to_vec();
//! bmp.extend_from_slice(&58u32.to_le_bytes());
//! bmp.extend_from_slice(&[0; 4]);
//! bmp.extend_from_slice(&54u32.to_le_bytes());
//! bmp.extend_from_slice(&40u32.to_le_bytes());
//! bmp.extend_from_slice(&1i32.to_le_bytes());
//! bmp.extend_from_slice(&(-1i32).to_le_bytes());
//! bmp.extend_from_slice(&1u16.to_le_bytes());
//! bmp.extend_from_slice(&24u16.to_le_bytes());
//! bmp.extend_from_slice(&[0; 24]);
//! bmp.extend_from_slice(&[0, 0, 0, 0]);
//!
//! let mut body = b"--X\r\nContent-Disposition: form-data; name=\"file\"; filename=\"dot.bmp\"\r\n\r\n".to_vec();
//! body.extend_from_slice(&bmp);
//! body.extend_from_slice(b"\r\n--X--\r\n");
//!
//! let part = extract_first_part(&body, "X").unwrap();
//! let image = decode_bmp(part.bytes).unwrap();
//! let bitmap = quantize(&image);
//! let payload = encode(&bitmap, &LabelProfile::DEFAULT);
//!
//! assert!(bitmap.is_marked(0, 0));
//! assert!(payload.as_bytes().starts_with(b"SIZE 0 mm,0 mm\r\n"));
//! ```
//!
//! # Stages
//!
//! - [`multipart`]: first file part of a `multipart/form-data` body
//! - [`bmp`]: 24/32 bpp bitmap container to top-down RGB
//! - [`mono`]: fixed-threshold 1-bit quantization, MSB-first packing
//! - [`tspl`]: `SIZE`/`GAP`/`CLS`/`BITMAP`/`PRINT` command stream

pub mod bmp;
pub mod error;
pub mod mono;
pub mod multipart;
pub mod tspl;

pub use bmp::{decode_bmp, is_bmp, BmpHeader, RasterImage};
pub use error::RasterError;
pub use mono::{quantize, MonoBitmap, THRESHOLD};
pub use multipart::{boundary_from_content_type, extract_first_part, UploadPart};
pub use tspl::{encode, px_to_mm, LabelProfile, PrintPayload};
