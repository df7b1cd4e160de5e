//! Test fixtures: bitmap containers and multipart bodies.

pub const BOUNDARY: &str = "labelpress-test-boundary";

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Wrap `data` as the only part of a multipart body
pub fn multipart(boundary: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\
         \r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

/// Bottom-up 24-bit bitmap filled with one gray value
pub fn bmp24(width: u32, height: u32, value: u8) -> Vec<u8> {
    bitmap(width, height, 24, value)
}

/// Bottom-up bitmap with an arbitrary bit depth (header only describes it)
pub fn bitmap(width: u32, height: u32, bits_per_pixel: u16, value: u8) -> Vec<u8> {
    let row_bytes = (width as usize * bits_per_pixel as usize).div_ceil(8);
    let stride = row_bytes.div_ceil(4) * 4;
    let data_len = stride * height as usize;

    let mut out = b"BM".to_vec();
    out.extend_from_slice(&((54 + data_len) as u32).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&54u32.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bits_per_pixel.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(data_len as u32).to_le_bytes());
    out.extend_from_slice(&[0; 16]);
    out.resize(out.len() + data_len, value);
    out
}

/// Write a stand-in converter into `dir` that discards its input and
/// prints `output`; returns the program path for `converter.programs`.
#[cfg(unix)]
pub fn scripted_converter(dir: &std::path::Path, output: &[u8]) -> String {
    use std::os::unix::fs::PermissionsExt;

    let fixture = dir.join("converted.bmp");
    std::fs::write(&fixture, output).unwrap();

    let script = dir.join("fake-magick");
    std::fs::write(
        &script,
        format!("#!/bin/sh\ncat > /dev/null\ncat '{}'\n", fixture.display()),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script.display().to_string()
}
