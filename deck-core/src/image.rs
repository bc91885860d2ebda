//! Image decoding for the slide image slot.
//!
//! Decoding is the one suspension point in the store's action API: the store
//! hands raw bytes to an [`ImageDecoder`] and commits once the intrinsic
//! dimensions are known.

use std::io::Cursor;

use async_trait::async_trait;
use base64::Engine;

use crate::error::{DeckError, DeckResult};

/// A decoded image ready to be stored on a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Original bytes as a `data:<mime>;base64,...` URL.
    pub data_url: String,
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
}

/// Learns an image's intrinsic size and encodes it for storage.
#[async_trait]
pub trait ImageDecoder: Send + Sync + std::fmt::Debug {
    /// Decode `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::ImageDecode`] if the bytes are not an image.
    async fn decode(&self, bytes: Vec<u8>) -> DeckResult<DecodedImage>;
}

/// Decoder backed by the `image` crate. Work runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterImageDecoder;

#[async_trait]
impl ImageDecoder for RasterImageDecoder {
    async fn decode(&self, bytes: Vec<u8>) -> DeckResult<DecodedImage> {
        tokio::task::spawn_blocking(move || decode_bytes(&bytes))
            .await
            .map_err(|e| DeckError::ImageDecode(format!("decode task failed: {e}")))?
    }
}

/// Synchronously decode `bytes`, sniffing the format from magic bytes.
///
/// The whole image is decoded, not just its header, so a corrupt body is
/// rejected here rather than when the slide is later rendered.
///
/// # Errors
///
/// Returns [`DeckError::ImageDecode`] for unknown formats or corrupt data.
pub fn decode_bytes(bytes: &[u8]) -> DeckResult<DecodedImage> {
    let format = image::guess_format(bytes)
        .map_err(|e| DeckError::ImageDecode(format!("unrecognized image format: {e}")))?;
    let pixels = image::ImageReader::with_format(Cursor::new(bytes), format)
        .decode()
        .map_err(|e| DeckError::ImageDecode(e.to_string()))?;
    let (width, height) = (pixels.width(), pixels.height());
    if width == 0 || height == 0 {
        return Err(DeckError::ImageDecode("image has no pixels".to_string()));
    }
    Ok(DecodedImage {
        data_url: to_data_url(format.to_mime_type(), bytes),
        width,
        height,
    })
}

/// Encode bytes as a base64 `data:` URL.
#[must_use]
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime_type};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Split a base64 `data:` URL into its MIME type and bytes.
///
/// # Errors
///
/// Returns [`DeckError::ImageDecode`] if the URL is not a base64 data URL.
pub fn parse_data_url(url: &str) -> DeckResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| DeckError::ImageDecode("not a data URL".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| DeckError::ImageDecode("invalid data URL: missing comma".to_string()))?;
    let mime_type = metadata
        .strip_suffix(";base64")
        .ok_or_else(|| DeckError::ImageDecode("data URL is not base64".to_string()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| DeckError::ImageDecode(format!("failed to decode base64: {e}")))?;
    Ok((mime_type.to_string(), bytes))
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png_dimensions() {
        let decoded = decode_bytes(&sample_png(4, 2)).expect("decode");
        assert_eq!((decoded.width, decoded.height), (4, 2));
        assert!(decoded.data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_bytes(b"definitely not an image"),
            Err(DeckError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_png() {
        let png = sample_png(4, 4);
        assert!(decode_bytes(&png[..12]).is_err());
    }

    #[test]
    fn test_decode_rejects_valid_header_with_missing_body() {
        let png = sample_png(16, 16);
        // Signature and IHDR are intact; the pixel data is cut off.
        let header_only = &png[..40];
        let reader =
            image::ImageReader::with_format(Cursor::new(header_only), image::ImageFormat::Png);
        assert_eq!(reader.into_dimensions().expect("header readable"), (16, 16));
        assert!(matches!(
            decode_bytes(header_only),
            Err(DeckError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_data_url_round_trip() {
        let url = to_data_url("image/png", &[1, 2, 3]);
        let (mime, bytes) = parse_data_url(&url).expect("parse");
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(parse_data_url("http://example.com/x.png").is_err());
        assert!(parse_data_url("data:image/png,raw").is_err());
    }

    #[tokio::test]
    async fn test_raster_decoder_runs_off_thread() {
        let decoded = RasterImageDecoder
            .decode(sample_png(3, 5))
            .await
            .expect("decode");
        assert_eq!((decoded.width, decoded.height), (3, 5));
    }
}
