//! Software compositor for the overlay surface
//!
//! Every frame is composed from scratch into an RGBA surface the size of the
//! snapshot. Text is not rasterized here; it is returned as [`Label`]s that
//! the host draws with its own text API on top of the surface.

use crate::config::{MagnifierShape, OverlayConfig};
use crate::magnifier;
use crate::sampler::{ColorSample, DisplayFormat};
use crate::selection::PointerState;
use image::{Rgba, RgbaImage};
use snapshot::{FrameBuffer, Point, Rect};

/// Advance of one glyph in the host's label font
pub const GLYPH_WIDTH: u32 = 8;
/// Line height of the host's label font
pub const GLYPH_HEIGHT: u32 = 16;
const LABEL_PADDING: u32 = 4;
const LABEL_GAP: i32 = 6;

/// Text the host draws on top of the composed surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    /// Background box already filled on the surface
    pub bounds: Rect,
    pub color: Rgba<u8>,
}

impl Label {
    /// Where the host should start drawing the text
    pub fn text_origin(&self) -> Point {
        Point::new(
            self.bounds.x + LABEL_PADDING as i32,
            self.bounds.y + LABEL_PADDING as i32,
        )
    }
}

/// One composed frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub surface: RgbaImage,
    pub labels: Vec<Label>,
}

/// Everything one frame is drawn from
pub struct Scene<'a> {
    pub frame: &'a FrameBuffer,
    pub pointer: &'a PointerState,
    pub sample: Option<&'a ColorSample>,
    pub format: DisplayFormat,
    pub copy_feedback: bool,
}

/// Overlay renderer
pub struct Compositor {
    config: OverlayConfig,
}

impl Compositor {
    pub fn new(config: OverlayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Compose one frame. Later steps occlude earlier ones.
    pub fn render(&self, scene: &Scene<'_>) -> Frame {
        let frame = scene.frame;
        let mut surface = RgbaImage::new(frame.width(), frame.height());
        let mut labels = Vec::new();

        image::imageops::replace(&mut surface, frame.as_image(), 0, 0);
        self.draw_mask(&mut surface);

        let selection = scene.pointer.selection();
        if let Some(ref rect) = selection {
            self.draw_selection(&mut surface, frame, rect);
        }

        if let Some(current) = scene.pointer.position() {
            self.draw_magnifier(&mut surface, &mut labels, scene, current, selection);
        }

        if let Some(ref rect) = selection {
            self.draw_size_label(&mut surface, &mut labels, frame.bounds(), rect);
        }

        Frame { surface, labels }
    }

    fn draw_mask(&self, surface: &mut RgbaImage) {
        let alpha = self.config.mask_alpha;
        for pixel in surface.pixels_mut() {
            *pixel = blend(*pixel, Rgba([0, 0, 0, 255]), alpha);
        }
    }

    fn draw_selection(&self, surface: &mut RgbaImage, frame: &FrameBuffer, rect: &Rect) {
        if let Some(visible) = rect.intersection(&frame.bounds()) {
            for y in visible.y..visible.bottom() {
                for x in visible.x..visible.right() {
                    surface.put_pixel(x as u32, y as u32, frame.pixel(x, y));
                }
            }
        }

        stroke_rect(
            surface,
            rect,
            self.config.selection_border_width,
            self.config.palette.selection_border,
        );
    }

    fn draw_magnifier(
        &self,
        surface: &mut RgbaImage,
        labels: &mut Vec<Label>,
        scene: &Scene<'_>,
        current: Point,
        selection: Option<Rect>,
    ) {
        let config = &self.config.magnifier;
        let palette = &self.config.palette;
        let zoom = config.zoom_factor();
        let frame = scene.frame;

        // the pointer may rest on the far edge; magnify the pixel it covers
        let current = frame.bounds().clamp_pixel(current);
        let footprint = magnifier::place(frame.bounds(), config, selection, current);
        let window = magnifier::source_window(current, config);
        let radius = config.size as f64 / 2.0;

        let inside_clip = |dx: u32, dy: u32| match config.shape {
            MagnifierShape::Square => true,
            MagnifierShape::Circle => {
                let fx = dx as f64 + 0.5 - radius;
                let fy = dy as f64 + 0.5 - radius;
                fx * fx + fy * fy <= radius * radius
            }
        };

        for dy in 0..config.size {
            for dx in 0..config.size {
                if !inside_clip(dx, dy) {
                    continue;
                }
                let (sx, sy) = magnifier::source_pixel(&window, zoom, dx, dy);
                let color = frame
                    .pixel_at(Point::new(sx, sy))
                    .unwrap_or(palette.out_of_bounds);
                put_clipped(
                    surface,
                    footprint.x + dx as i32,
                    footprint.y + dy as i32,
                    color,
                );
            }
        }

        let cell = magnifier::reticle_cell(current, &window, zoom);
        let reticle = Rect::new(
            footprint.x + cell.x - 1,
            footprint.y + cell.y - 1,
            cell.width + 2,
            cell.height + 2,
        );
        stroke_rect(surface, &reticle, 1, palette.reticle);

        let border = if scene.copy_feedback {
            palette.magnifier_success
        } else {
            palette.magnifier_border
        };

        let zoom_area = Rect::new(footprint.x, footprint.y, config.size, config.size);
        match config.shape {
            MagnifierShape::Square => stroke_rect(surface, &zoom_area, config.border_width, border),
            MagnifierShape::Circle => stroke_circle(surface, &zoom_area, config.border_width, border),
        }

        if config.swatch_height == 0 {
            return;
        }

        let strip = Rect::new(
            footprint.x,
            footprint.y + config.size as i32,
            config.strip_width(),
            config.swatch_height,
        );
        fill_rect(surface, &strip, palette.label_background);
        stroke_rect(surface, &strip, config.border_width, border);

        if let Some(sample) = scene.sample {
            let inset = config.swatch_inset() as i32;
            let side = config.swatch_height.saturating_sub(2 * inset as u32);
            let swatch = Rect::new(strip.x + inset, strip.y + inset, side, side);
            fill_rect(surface, &swatch, Rgba([sample.r, sample.g, sample.b, 255]));

            let text = sample.text(scene.format).to_string();
            let text_x = swatch.right() + inset;
            let text_y = strip.y + (config.swatch_height as i32 - label_height() as i32) / 2;
            labels.push(Label {
                bounds: Rect::new(text_x, text_y, label_width(&text), label_height()),
                text,
                color: palette.label_text,
            });
        }
    }

    fn draw_size_label(
        &self,
        surface: &mut RgbaImage,
        labels: &mut Vec<Label>,
        bounds: Rect,
        selection: &Rect,
    ) {
        let text = format!("{} x {}", selection.width, selection.height);
        let rect = size_label_rect(bounds, selection, label_width(&text), label_height());

        fill_rect(surface, &rect, self.config.palette.label_background);
        labels.push(Label {
            text,
            bounds: rect,
            color: self.config.palette.label_text,
        });
    }
}

pub fn label_width(text: &str) -> u32 {
    text.chars().count() as u32 * GLYPH_WIDTH + 2 * LABEL_PADDING
}

pub fn label_height() -> u32 {
    GLYPH_HEIGHT + 2 * LABEL_PADDING
}

/// Box for the size readout.
///
/// Sits past the selection's bottom-right corner; flips to the leading side
/// on each axis that would overflow, then is clamped into the surface.
pub fn size_label_rect(surface: Rect, selection: &Rect, width: u32, height: u32) -> Rect {
    let mut x = selection.right() + LABEL_GAP;
    let mut y = selection.bottom() + LABEL_GAP;

    if x + width as i32 > surface.right() {
        x = selection.x - LABEL_GAP - width as i32;
    }
    if y + height as i32 > surface.bottom() {
        y = selection.y - LABEL_GAP - height as i32;
    }

    let max_x = (surface.right() - width as i32).max(surface.x);
    let max_y = (surface.bottom() - height as i32).max(surface.y);

    Rect::new(
        x.clamp(surface.x, max_x),
        y.clamp(surface.y, max_y),
        width,
        height,
    )
}

/// Source-over blend of `top` onto `bottom` with the given coverage
fn blend(bottom: Rgba<u8>, top: Rgba<u8>, alpha: u8) -> Rgba<u8> {
    let a = alpha as u32;
    let mix = |t: u8, b: u8| ((t as u32 * a + b as u32 * (255 - a) + 127) / 255) as u8;

    Rgba([
        mix(top[0], bottom[0]),
        mix(top[1], bottom[1]),
        mix(top[2], bottom[2]),
        bottom[3].max(top[3]),
    ])
}

fn put_clipped(surface: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < surface.width() && (y as u32) < surface.height() {
        surface.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_rect(surface: &mut RgbaImage, rect: &Rect, color: Rgba<u8>) {
    let bounds = Rect::new(0, 0, surface.width(), surface.height());
    if let Some(visible) = rect.intersection(&bounds) {
        for y in visible.y..visible.bottom() {
            for x in visible.x..visible.right() {
                surface.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Outline drawn inside `rect`
fn stroke_rect(surface: &mut RgbaImage, rect: &Rect, width: u32, color: Rgba<u8>) {
    if rect.is_empty() || width == 0 {
        return;
    }

    let w = width.min(rect.width).min(rect.height);
    let edges = [
        Rect::new(rect.x, rect.y, rect.width, w),
        Rect::new(rect.x, rect.bottom() - w as i32, rect.width, w),
        Rect::new(rect.x, rect.y, w, rect.height),
        Rect::new(rect.right() - w as i32, rect.y, w, rect.height),
    ];
    for edge in &edges {
        fill_rect(surface, edge, color);
    }
}

/// Ring inscribed in `rect`
fn stroke_circle(surface: &mut RgbaImage, rect: &Rect, width: u32, color: Rgba<u8>) {
    let radius = rect.width.min(rect.height) as f64 / 2.0;
    let inner = (radius - width as f64).max(0.0);

    for dy in 0..rect.height {
        for dx in 0..rect.width {
            let fx = dx as f64 + 0.5 - radius;
            let fy = dy as f64 + 0.5 - radius;
            let d2 = fx * fx + fy * fy;
            if d2 <= radius * radius && d2 > inner * inner {
                put_clipped(surface, rect.x + dx as i32, rect.y + dy as i32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, PointerButton};
    use crate::sampler::WIDEST_SAMPLE_TEXT;
    use crate::session::Session;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> FrameBuffer {
        FrameBuffer::new(RgbaImage::from_pixel(width, height, Rgba(color))).unwrap()
    }

    fn compositor() -> Compositor {
        Compositor::new(OverlayConfig::default())
    }

    #[test]
    fn idle_frame_is_uniformly_masked() {
        let frame = solid(64, 48, [200, 100, 50, 255]);
        let pointer = PointerState::new();
        let out = compositor().render(&Scene {
            frame: &frame,
            pointer: &pointer,
            sample: None,
            format: DisplayFormat::Hex,
            copy_feedback: false,
        });

        assert!(out.labels.is_empty());
        for pixel in out.surface.pixels() {
            assert_eq!(*pixel, Rgba([100, 50, 25, 255]));
        }
    }

    #[test]
    fn selection_is_punched_through_the_mask() {
        let frame = solid(400, 300, [200, 200, 200, 255]);
        let mut pointer = PointerState::new();
        pointer.press(PointerButton::Primary, Point::new(100, 100));
        pointer.move_to(Point::new(200, 180));

        let mut config = OverlayConfig::default();
        config.magnifier.margin = 0;
        let out = Compositor::new(config).render(&Scene {
            frame: &frame,
            pointer: &pointer,
            sample: None,
            format: DisplayFormat::Hex,
            copy_feedback: false,
        });

        assert_eq!(*out.surface.get_pixel(150, 140), Rgba([200, 200, 200, 255]));
        assert_eq!(*out.surface.get_pixel(100, 140), Rgba([0, 255, 0, 255]));
        assert_eq!(*out.surface.get_pixel(50, 250), Rgba([100, 100, 100, 255]));

        let size = out.labels.iter().find(|l| l.text == "100 x 80").unwrap();
        assert_eq!(size.bounds.x, 206);
        assert_eq!(size.bounds.y, 186);
    }

    #[test]
    fn size_label_flips_at_surface_edges() {
        let surface = Rect::new(0, 0, 800, 600);
        let selection = Rect::new(600, 500, 190, 90);

        let rect = size_label_rect(surface, &selection, 80, 24);
        assert_eq!(rect, Rect::new(600 - 6 - 80, 500 - 6 - 24, 80, 24));
    }

    #[test]
    fn size_label_never_leaves_surface() {
        let surface = Rect::new(0, 0, 320, 200);
        let selections = [
            Rect::new(0, 0, 320, 200),
            Rect::new(0, 0, 10, 10),
            Rect::new(310, 190, 10, 10),
            Rect::new(5, 150, 300, 49),
            Rect::new(100, 0, 200, 199),
        ];

        for selection in selections {
            let rect = size_label_rect(surface, &selection, 88, 24);
            assert!(rect.x >= 0 && rect.right() <= 320, "{selection:?} -> {rect:?}");
            assert!(rect.y >= 0 && rect.bottom() <= 200, "{selection:?} -> {rect:?}");
        }
    }

    #[test]
    fn magnifier_center_shows_pointer_pixel_and_feedback_border() {
        let mut image = RgbaImage::from_pixel(600, 400, Rgba([0, 0, 255, 255]));
        image.put_pixel(400, 300, Rgba([255, 0, 0, 255]));
        let frame = FrameBuffer::new(image).unwrap();

        let mut pointer = PointerState::new();
        pointer.move_to(Point::new(400, 300));
        let sample = ColorSample::new(255, 0, 0);

        let render = |copy_feedback| {
            compositor().render(&Scene {
                frame: &frame,
                pointer: &pointer,
                sample: Some(&sample),
                format: DisplayFormat::Rgb,
                copy_feedback,
            })
        };

        let out = render(false);
        // default placement: top-left corner, 16px margin, 120px zoom area
        assert_eq!(*out.surface.get_pixel(16 + 60, 16 + 60), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.surface.get_pixel(16 + 20, 16 + 20), Rgba([0, 0, 255, 255]));
        assert_eq!(*out.surface.get_pixel(16, 16), Rgba([224, 224, 224, 255]));
        assert_eq!(out.labels.len(), 1);
        assert_eq!(out.labels[0].text, "rgb(255, 0, 0)");

        let out = render(true);
        assert_eq!(*out.surface.get_pixel(16, 16), Rgba([46, 204, 113, 255]));
    }

    #[test]
    fn labels_fit_their_boxes_inside_the_surface() {
        let frame = solid(1920, 1080, [255, 255, 255, 255]);
        let sample = ColorSample::new(255, 255, 255);
        let surface = frame.bounds();

        let mut idle = PointerState::new();
        idle.move_to(Point::new(30, 30));
        let mut dragging = PointerState::new();
        dragging.press(PointerButton::Primary, Point::new(1500, 900));
        dragging.move_to(Point::new(1919, 1079));

        for pointer in [idle, dragging] {
            for format in [DisplayFormat::Hex, DisplayFormat::Rgb] {
                let out = compositor().render(&Scene {
                    frame: &frame,
                    pointer: &pointer,
                    sample: Some(&sample),
                    format,
                    copy_feedback: false,
                });

                assert!(!out.labels.is_empty());
                for label in &out.labels {
                    let b = label.bounds;
                    assert!(label_width(&label.text) <= b.width, "{label:?}");
                    assert!(label_height() <= b.height, "{label:?}");
                    assert!(b.x >= surface.x && b.right() <= surface.right(), "{label:?}");
                    assert!(b.y >= surface.y && b.bottom() <= surface.bottom(), "{label:?}");
                }
            }
        }
    }

    #[test]
    fn swatch_strip_holds_widest_sample_text() {
        let config = OverlayConfig::default().magnifier;
        let inset = config.swatch_inset();
        let side = config.swatch_height - 2 * inset;

        assert!(config.strip_width() >= 3 * inset + side + label_width(WIDEST_SAMPLE_TEXT));
        assert_eq!(config.footprint().0, config.strip_width());
    }

    #[test]
    fn circle_magnifier_clips_corners_and_rings_the_zoom_area() {
        let mut image = RgbaImage::from_pixel(600, 400, Rgba([200, 100, 50, 255]));
        image.put_pixel(400, 300, Rgba([255, 0, 0, 255]));
        let frame = FrameBuffer::new(image).unwrap();

        let mut pointer = PointerState::new();
        pointer.move_to(Point::new(400, 300));

        let mut config = OverlayConfig::default();
        config.magnifier.shape = MagnifierShape::Circle;
        let out = Compositor::new(config).render(&Scene {
            frame: &frame,
            pointer: &pointer,
            sample: None,
            format: DisplayFormat::Hex,
            copy_feedback: false,
        });

        // zoom area at (16, 16), 120px
        assert_eq!(*out.surface.get_pixel(16, 16), Rgba([100, 50, 25, 255]));
        assert_eq!(*out.surface.get_pixel(16 + 119, 16 + 2), Rgba([100, 50, 25, 255]));
        assert_eq!(*out.surface.get_pixel(16 + 60, 16), Rgba([224, 224, 224, 255]));
        assert_eq!(*out.surface.get_pixel(16 + 60, 16 + 60), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.surface.get_pixel(16 + 30, 16 + 60), Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn pointer_on_far_edge_magnifies_the_sampled_pixel() {
        let mut image = RgbaImage::from_pixel(300, 200, Rgba([0, 0, 255, 255]));
        image.put_pixel(299, 199, Rgba([255, 0, 0, 255]));
        let mut session = Session::new(FrameBuffer::new(image).unwrap());

        session.apply(InputEvent::PointerMove {
            position: Point::new(299, 199),
        });
        session.apply(InputEvent::PointerMove {
            position: Point::new(300, 200),
        });
        assert_eq!(session.pointer().position(), Some(Point::new(300, 200)));

        let out = compositor().render(&Scene {
            frame: session.frame(),
            pointer: session.pointer(),
            sample: session.sample(),
            format: DisplayFormat::Hex,
            copy_feedback: false,
        });

        assert_eq!(out.labels[0].text, "#FF0000");
        assert_eq!(*out.surface.get_pixel(16 + 60, 16 + 60), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn magnifier_fills_off_snapshot_cells() {
        let frame = solid(300, 300, [255, 255, 255, 255]);
        let mut pointer = PointerState::new();
        pointer.move_to(Point::new(299, 299));

        let out = compositor().render(&Scene {
            frame: &frame,
            pointer: &pointer,
            sample: None,
            format: DisplayFormat::Hex,
            copy_feedback: false,
        });

        // bottom-right of the zoom area samples beyond the last column
        assert_eq!(*out.surface.get_pixel(16 + 110, 16 + 110), Rgba([64, 64, 64, 255]));
    }
}
