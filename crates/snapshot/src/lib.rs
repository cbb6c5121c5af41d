//! Snapshot module for PickShot
//!
//! Shared geometry, the decoded screen raster and the activation payload codec.

pub mod activation;
pub mod frame;

pub use activation::ActivationEvent;
pub use frame::FrameBuffer;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Activation payload is empty")]
    EmptyPayload,

    #[error("Activation payload is not a data URL")]
    NotDataUrl,

    #[error("Activation payload is not base64 encoded")]
    NotBase64,

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Decoded image has no pixels")]
    EmptyImage,
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Point in surface pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in surface pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Normalized rectangle spanned by two corner points
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: a.x.abs_diff(b.x),
            height: a.y.abs_diff(b.y),
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && self.right() > other.x &&
        self.y < other.bottom() && self.bottom() > other.y
    }

    /// Overlapping part of two rectangles, `None` when they are disjoint
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= x || bottom <= y {
            return None;
        }

        Some(Rect::new(x, y, (right - x) as u32, (bottom - y) as u32))
    }

    /// Clamp a point into `[x, right] x [y, bottom]` (edges inclusive)
    pub fn clamp_point(&self, point: Point) -> Point {
        Point {
            x: point.x.clamp(self.x, self.right()),
            y: point.y.clamp(self.y, self.bottom()),
        }
    }

    /// Clamp a point onto the last pixel row/column, `[x, right - 1]`
    pub fn clamp_pixel(&self, point: Point) -> Point {
        Point {
            x: point.x.clamp(self.x, (self.right() - 1).max(self.x)),
            y: point.y.clamp(self.y, (self.bottom() - 1).max(self.y)),
        }
    }

    /// Center point, rounded towards the top-left
    pub fn center(&self) -> Point {
        Point {
            x: self.x + (self.width / 2) as i32,
            y: self.y + (self.height / 2) as i32,
        }
    }
}
