//! Single-part extraction from a `multipart/form-data` request body.
//!
//! This is deliberately not a general multipart parser: only the first part
//! of the body is isolated, and every later part is ignored. The extracted
//! bytes borrow from the request body.

use crate::error::RasterError;

const CRLF: &[u8] = b"\r\n";
const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";

/// File name used when the part carries no `filename` parameter.
pub const DEFAULT_FILENAME: &str = "upload.bin";

/// Content type used when the part carries no `Content-Type` header.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The first file part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart<'a> {
    pub filename: String,
    pub content_type: String,
    pub bytes: &'a [u8],
}

/// Extract the `boundary` parameter from a `Content-Type` header value.
///
/// Accepts both `boundary=abc` and `boundary="abc"`.
pub fn boundary_from_content_type(content_type: &str) -> Result<&str, RasterError> {
    let (_, params) = content_type
        .split_once(';')
        .ok_or(RasterError::MalformedUpload("boundary parameter"))?;

    split_params(params)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| unquote(value.trim()))
        .filter(|boundary| !boundary.is_empty())
        .ok_or(RasterError::MalformedUpload("boundary parameter"))
}

/// Isolate the first part of `body` delimited by `--<boundary>`.
pub fn extract_first_part<'a>(
    body: &'a [u8],
    boundary: &str,
) -> Result<UploadPart<'a>, RasterError> {
    if boundary.is_empty() {
        return Err(RasterError::MalformedUpload("boundary parameter"));
    }

    let delimiter = [b"--".as_slice(), boundary.as_bytes()].concat();
    let opening = find(body, &delimiter, 0)
        .ok_or(RasterError::MalformedUpload("opening boundary"))?;

    // Skip the delimiter and the line terminator that follows it.
    let part_start = opening + delimiter.len() + CRLF.len();

    // Searching for the terminator together with the delimiter bounds the
    // part body exactly and avoids matching the delimiter text inside it.
    let closing_delimiter = [CRLF, delimiter.as_slice()].concat();
    let part_end = find(body, &closing_delimiter, part_start)
        .ok_or(RasterError::MalformedUpload("closing boundary"))?;

    let part = &body[part_start..part_end];
    let separator = find(part, HEADER_SEPARATOR, 0)
        .ok_or(RasterError::MalformedUpload("header separator"))?;

    let headers = String::from_utf8_lossy(&part[..separator]);
    let mut filename = None;
    let mut content_type = None;

    for line in headers.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.eq_ignore_ascii_case("content-disposition") {
            filename = filename_param(value);
        } else if name.eq_ignore_ascii_case("content-type") {
            let value = value.trim();
            if !value.is_empty() {
                content_type = Some(value.to_string());
            }
        }
    }

    Ok(UploadPart {
        filename: filename.unwrap_or_else(|| DEFAULT_FILENAME.to_string()),
        content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        bytes: &part[separator + HEADER_SEPARATOR.len()..],
    })
}

/// Parse `filename` from a `Content-Disposition` value, quoted or unquoted.
fn filename_param(disposition: &str) -> Option<String> {
    split_params(disposition)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, value)| unquote(value.trim()).to_string())
        .filter(|name| !name.is_empty())
}

/// Split a header value on `;`, ignoring separators inside double quotes.
fn split_params(value: &str) -> impl Iterator<Item = &str> {
    let mut in_quotes = false;
    let mut start = 0;
    let mut params = Vec::new();

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params.into_iter()
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
