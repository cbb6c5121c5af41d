//! Overlay configuration

use crate::render::label_width;
use crate::sampler::WIDEST_SAMPLE_TEXT;
use image::Rgba;
use std::time::Duration;

/// Magnifier outline shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnifierShape {
    Square,
    Circle,
}

/// Magnifier geometry
#[derive(Debug, Clone, Copy)]
pub struct MagnifierConfig {
    /// Edge length of the zoomed area in surface pixels
    pub size: u32,
    /// Upscale factor, clamped to at least 1
    pub zoom: f64,
    /// Distance from the surface corner
    pub margin: u32,
    /// Height of the color swatch strip under the zoomed area
    pub swatch_height: u32,
    pub border_width: u32,
    pub shape: MagnifierShape,
}

impl MagnifierConfig {
    pub fn zoom_factor(&self) -> f64 {
        self.zoom.max(1.0)
    }

    /// Gap between the strip border and the swatch or its text
    pub fn swatch_inset(&self) -> u32 {
        self.border_width + 2
    }

    /// Swatch strip width: never narrower than the zoom area, and wide
    /// enough for the longest sample text in either display format
    pub fn strip_width(&self) -> u32 {
        if self.swatch_height == 0 {
            return self.size;
        }

        let inset = self.swatch_inset();
        let swatch = self.swatch_height.saturating_sub(2 * inset);
        self.size
            .max(3 * inset + swatch + label_width(WIDEST_SAMPLE_TEXT))
    }

    /// Width and height of the whole inset, swatch strip included
    pub fn footprint(&self) -> (u32, u32) {
        (self.strip_width(), self.size + self.swatch_height)
    }
}

impl Default for MagnifierConfig {
    fn default() -> Self {
        Self {
            size: 120,
            zoom: 4.0,
            margin: 16,
            swatch_height: 28,
            border_width: 2,
            shape: MagnifierShape::Square,
        }
    }
}

/// Colors used by the compositor
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub selection_border: Rgba<u8>,
    pub magnifier_border: Rgba<u8>,
    pub magnifier_success: Rgba<u8>,
    pub reticle: Rgba<u8>,
    /// Fill for magnifier cells that fall outside the snapshot
    pub out_of_bounds: Rgba<u8>,
    pub label_background: Rgba<u8>,
    pub label_text: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            selection_border: Rgba([0, 255, 0, 255]),
            magnifier_border: Rgba([224, 224, 224, 255]),
            magnifier_success: Rgba([46, 204, 113, 255]),
            reticle: Rgba([255, 255, 255, 255]),
            out_of_bounds: Rgba([64, 64, 64, 255]),
            label_background: Rgba([32, 32, 32, 255]),
            label_text: Rgba([255, 255, 255, 255]),
        }
    }
}

/// Overlay configuration
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Releases narrower or shorter than this cancel instead of committing
    pub min_selection: u32,
    /// Alpha of the dark mask drawn over the snapshot
    pub mask_alpha: u8,
    pub selection_border_width: u32,
    /// How long the magnifier border shows the success color after a copy
    pub copy_feedback: Duration,
    pub magnifier: MagnifierConfig,
    pub palette: Palette,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            min_selection: 10,
            mask_alpha: 128,
            selection_border_width: 2,
            copy_feedback: Duration::from_millis(300),
            magnifier: MagnifierConfig::default(),
            palette: Palette::default(),
        }
    }
}
