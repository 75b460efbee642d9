//! Decoding of uploaded image payloads.
//!
//! Clients send images and masks as base64, either bare or wrapped in a
//! `data:` URL. Source image dimensions can be read straight from the PNG
//! header without decoding pixels.

use base64::Engine;

use crate::error::ServiceResult;

/// PNG file signature.
const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Decode a base64 payload, stripping a `data:...;base64,` prefix if present.
///
/// Everything up to and including the first comma is dropped. Whitespace
/// (line-wrapped base64) is ignored.
pub fn decode_data_url(data: &str) -> ServiceResult<Vec<u8>> {
    let payload = match data.find(',') {
        Some(idx) => &data[idx + 1..],
        None => data,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
}

/// Encode bytes as a PNG data URL.
pub fn encode_png_data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Read (width, height) from a PNG IHDR chunk.
///
/// Returns None if the bytes are not a PNG or the header is truncated.
pub fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || !bytes.starts_with(&PNG_SIGNATURE) || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}
