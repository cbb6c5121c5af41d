//! Activation payload: a full-screen snapshot carried as a `data:` URL

use crate::{FrameBuffer, SnapshotError, SnapshotResult};
use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

const DATA_URL_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Activation event delivered to the overlay once per capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationEvent {
    pub image_data_url: String,
}

impl ActivationEvent {
    pub fn new(image_data_url: impl Into<String>) -> Self {
        Self {
            image_data_url: image_data_url.into(),
        }
    }

    /// Encode a raster as `data:image/png;base64,...`
    pub fn from_image(image: &RgbaImage) -> SnapshotResult<Self> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png)?;

        let payload = general_purpose::STANDARD.encode(buffer.get_ref());
        Ok(Self::new(format!("data:image/png;base64,{}", payload)))
    }

    /// Validate the payload and decode it into a frame buffer.
    ///
    /// The media type after `data:` is informational; the raster format is
    /// detected from the decoded bytes.
    pub fn decode(&self) -> SnapshotResult<FrameBuffer> {
        let url = self.image_data_url.trim();
        if url.is_empty() {
            return Err(SnapshotError::EmptyPayload);
        }

        let rest = url
            .strip_prefix(DATA_URL_SCHEME)
            .ok_or(SnapshotError::NotDataUrl)?;
        let (_media_type, payload) = rest
            .split_once(BASE64_MARKER)
            .ok_or(SnapshotError::NotBase64)?;
        if payload.is_empty() {
            return Err(SnapshotError::EmptyPayload);
        }

        let bytes = general_purpose::STANDARD.decode(payload)?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            encoded_len = payload.len(),
            "decoded activation snapshot"
        );

        FrameBuffer::new(image)
    }
}

#[cfg(test)]
mod tests {
    use super::ActivationEvent;
    use crate::SnapshotError;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encoded_image_decodes_to_same_pixels() {
        let image = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8 * 80, y as u8 * 120, 7, 255]));

        let event = ActivationEvent::from_image(&image).unwrap();
        assert!(event.image_data_url.starts_with("data:image/png;base64,"));

        let frame = event.decode().unwrap();
        assert_eq!(frame.as_image(), &image);
    }

    #[test]
    fn empty_payloads_are_rejected() {
        assert!(matches!(
            ActivationEvent::new("").decode(),
            Err(SnapshotError::EmptyPayload)
        ));
        assert!(matches!(
            ActivationEvent::new("data:image/png;base64,").decode(),
            Err(SnapshotError::EmptyPayload)
        ));
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(matches!(
            ActivationEvent::new("http://example.com/a.png").decode(),
            Err(SnapshotError::NotDataUrl)
        ));
        assert!(matches!(
            ActivationEvent::new("data:image/png,rawbytes").decode(),
            Err(SnapshotError::NotBase64)
        ));
        assert!(matches!(
            ActivationEvent::new("data:image/png;base64,***").decode(),
            Err(SnapshotError::Base64(_))
        ));
        // valid base64, but not an image
        assert!(matches!(
            ActivationEvent::new("data:image/png;base64,aGVsbG8gd29ybGQ=").decode(),
            Err(SnapshotError::Image(_))
        ));
    }
}
