//! Magnifier geometry: source window, pixel mapping and placement

use crate::config::MagnifierConfig;
use snapshot::{Point, Rect};

/// Region of the snapshot shown in the magnifier, in fractional surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceWindow {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceWindow {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Source window for a pointer position.
///
/// `size / zoom` on each axis, offset by half of that from `current`, so the
/// center is `current` for every size/zoom combination.
pub fn source_window(current: Point, config: &MagnifierConfig) -> SourceWindow {
    let side = config.size as f64 / config.zoom_factor();
    SourceWindow {
        x: current.x as f64 - side / 2.0,
        y: current.y as f64 - side / 2.0,
        width: side,
        height: side,
    }
}

/// Snapshot pixel shown at magnifier-local pixel `(dx, dy)`
pub fn source_pixel(window: &SourceWindow, zoom: f64, dx: u32, dy: u32) -> (i32, i32) {
    let sx = window.x + (dx as f64 + 0.5) / zoom;
    let sy = window.y + (dy as f64 + 0.5) / zoom;
    (sx.floor() as i32, sy.floor() as i32)
}

/// Magnifier-local cell that displays the pixel at `current`
pub fn reticle_cell(current: Point, window: &SourceWindow, zoom: f64) -> Rect {
    let first = |edge: f64, origin: f64| ((edge - origin) * zoom - 0.5).ceil() as i32;

    let x0 = first(current.x as f64, window.x);
    let x1 = first(current.x as f64 + 1.0, window.x);
    let y0 = first(current.y as f64, window.y);
    let y1 = first(current.y as f64 + 1.0, window.y);

    Rect::new(x0, y0, (x1 - x0).max(1) as u32, (y1 - y0).max(1) as u32)
}

/// Pick the corner for the magnifier inset.
///
/// Corners are tried clockwise from top-left; the first one clear of both the
/// live selection and the pointer wins. If all collide, use the corner
/// farthest from the pointer.
pub fn place(
    surface: Rect,
    config: &MagnifierConfig,
    selection: Option<Rect>,
    pointer: Point,
) -> Rect {
    let (width, height) = config.footprint();
    let margin = config.margin as i32;
    let left = surface.x + margin;
    let top = surface.y + margin;
    let right = surface.right() - margin - width as i32;
    let bottom = surface.bottom() - margin - height as i32;

    let corners = [
        Rect::new(left, top, width, height),
        Rect::new(right, top, width, height),
        Rect::new(right, bottom, width, height),
        Rect::new(left, bottom, width, height),
    ];

    let is_clear = |candidate: &Rect| {
        !candidate.contains(pointer.x, pointer.y)
            && selection.map_or(true, |sel| !candidate.intersects(&sel))
    };

    if let Some(corner) = corners.iter().find(|c| is_clear(c)) {
        return *corner;
    }

    let distance = |candidate: &Rect| {
        let center = candidate.center();
        let dx = (center.x - pointer.x) as i64;
        let dy = (center.y - pointer.y) as i64;
        dx * dx + dy * dy
    };

    corners
        .iter()
        .copied()
        .max_by_key(distance)
        .unwrap_or(corners[0])
}
