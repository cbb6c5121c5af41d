//! Color sampling under the pointer

use snapshot::{FrameBuffer, Point};

/// Text representation shown for a sampled color.
///
/// A process-wide preference; it survives across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayFormat {
    #[default]
    Hex,
    Rgb,
}

impl DisplayFormat {
    pub fn toggled(self) -> Self {
        match self {
            DisplayFormat::Hex => DisplayFormat::Rgb,
            DisplayFormat::Rgb => DisplayFormat::Hex,
        }
    }
}

/// Longest text any sample can produce
pub const WIDEST_SAMPLE_TEXT: &str = "rgb(255, 255, 255)";

/// One sampled pixel with both text forms precomputed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub hex: String,
    pub rgb_text: String,
}

impl ColorSample {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            hex: format!("#{:02X}{:02X}{:02X}", r, g, b),
            rgb_text: format!("rgb({}, {}, {})", r, g, b),
        }
    }

    pub fn text(&self, format: DisplayFormat) -> &str {
        match format {
            DisplayFormat::Hex => &self.hex,
            DisplayFormat::Rgb => &self.rgb_text,
        }
    }
}

/// Read the pixel under `point`, clamped to the buffer
pub fn sample_at(frame: &FrameBuffer, point: Point) -> ColorSample {
    let pixel = frame.pixel(point.x, point.y);
    ColorSample::new(pixel[0], pixel[1], pixel[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn pure_red_formats_both_ways() {
        let sample = ColorSample::new(255, 0, 0);

        assert_eq!(sample.hex, "#FF0000");
        assert_eq!(sample.rgb_text, "rgb(255, 0, 0)");
    }

    #[test]
    fn hex_channels_are_zero_padded_and_uppercase() {
        let sample = ColorSample::new(10, 171, 3);
        assert_eq!(sample.hex, "#0AAB03");
        assert_eq!(sample.text(DisplayFormat::Rgb), "rgb(10, 171, 3)");
    }

    #[test]
    fn double_toggle_restores_format() {
        let sample = ColorSample::new(1, 2, 3);
        let format = DisplayFormat::default();
        let before = sample.text(format).to_string();

        let after = sample.text(format.toggled().toggled());
        assert_eq!(before, after);
        assert_ne!(sample.text(format.toggled()), before);
    }

    #[test]
    fn sampling_clamps_to_frame() {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        image.put_pixel(3, 3, Rgba([255, 0, 0, 255]));
        let frame = FrameBuffer::new(image).unwrap();

        assert_eq!(sample_at(&frame, Point::new(3, 3)).hex, "#FF0000");
        assert_eq!(sample_at(&frame, Point::new(4, 4)).hex, "#FF0000");
        assert_eq!(sample_at(&frame, Point::new(0, 0)).hex, "#0000FF");
    }
}
