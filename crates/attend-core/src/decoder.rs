//! Data-URL frame decoding.
//!
//! Browsers post frames as `data:image/jpeg;base64,<payload>`. Only the
//! segment between the first comma and the next one (if any) is decoded;
//! the media type is ignored and the image format is sniffed from the bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::DynamicImage;
use thiserror::Error;

const BASE64_MARKER: &str = "base64,";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("input is not a base64 data URL")]
    InvalidFormat,
    #[error("base64 payload is corrupt: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode a base64 data URL into a raster image.
pub fn decode_data_url(data_url: &str) -> Result<DynamicImage, DecodeError> {
    if !data_url.contains(BASE64_MARKER) {
        return Err(DecodeError::InvalidFormat);
    }
    let payload = data_url
        .split(',')
        .nth(1)
        .ok_or(DecodeError::InvalidFormat)?;

    let bytes = STANDARD.decode(payload.trim())?;
    let image = image::load_from_memory(&bytes)?;

    tracing::trace!(
        bytes = bytes.len(),
        width = image.width(),
        height = image.height(),
        "frame decoded"
    );
    Ok(image)
}
