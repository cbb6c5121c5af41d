//! Decoded screen raster for one capture session

use crate::{Point, Rect, SnapshotError, SnapshotResult};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Immutable full-screen snapshot.
///
/// Clones share the same pixels. A new session gets a new buffer; nothing
/// ever writes into an existing one.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    image: Arc<RgbaImage>,
}

impl FrameBuffer {
    /// Wrap a decoded raster, rejecting zero-sized images
    pub fn new(image: RgbaImage) -> SnapshotResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SnapshotError::EmptyImage);
        }

        Ok(Self {
            image: Arc::new(image),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Surface rectangle covered by this buffer, anchored at the origin
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    /// Pixel at `(x, y)`, clamped to the last row/column
    pub fn pixel(&self, x: i32, y: i32) -> Rgba<u8> {
        let x = x.clamp(0, self.width() as i32 - 1) as u32;
        let y = y.clamp(0, self.height() as i32 - 1) as u32;
        *self.image.get_pixel(x, y)
    }

    /// Pixel under a surface point, `None` outside the buffer
    pub fn pixel_at(&self, point: Point) -> Option<Rgba<u8>> {
        if self.bounds().contains(point.x, point.y) {
            Some(*self.image.get_pixel(point.x as u32, point.y as u32))
        } else {
            None
        }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Copy out a region, clipped to the buffer
    pub fn crop(&self, rect: &Rect) -> Option<RgbaImage> {
        let clipped = rect.intersection(&self.bounds())?;

        Some(
            image::imageops::crop_imm(
                self.image.as_ref(),
                clipped.x as u32,
                clipped.y as u32,
                clipped.width,
                clipped.height,
            )
            .to_image(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::FrameBuffer;
    use crate::{Point, Rect, SnapshotError};
    use image::{Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> FrameBuffer {
        let image = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        FrameBuffer::new(image).unwrap()
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let err = FrameBuffer::new(RgbaImage::new(0, 4)).unwrap_err();
        assert!(matches!(err, SnapshotError::EmptyImage));
    }

    #[test]
    fn pixel_reads_clamp_to_edges() {
        let frame = gradient(8, 4);

        assert_eq!(frame.pixel(3, 2), Rgba([3, 2, 0, 255]));
        assert_eq!(frame.pixel(-5, -5), Rgba([0, 0, 0, 255]));
        assert_eq!(frame.pixel(100, 100), Rgba([7, 3, 0, 255]));
        assert_eq!(frame.pixel_at(Point::new(8, 0)), None);
    }

    #[test]
    fn crop_is_clipped_to_bounds() {
        let frame = gradient(8, 4);

        let cropped = frame.crop(&Rect::new(6, 2, 10, 10)).unwrap();
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(*cropped.get_pixel(0, 0), Rgba([6, 2, 0, 255]));

        assert!(frame.crop(&Rect::new(20, 20, 4, 4)).is_none());
    }
}
