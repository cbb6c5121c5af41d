//! One activation-to-resolution cycle

use crate::input::{InputEvent, Key};
use crate::sampler::{sample_at, ColorSample};
use crate::selection::{PointerState, Transition};
use snapshot::{FrameBuffer, Point};
use uuid::Uuid;

/// Session state: the snapshot plus everything derived from pointer input.
///
/// Created fresh for every activation, so no pointer or sample state can
/// leak from one capture into the next.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    frame: FrameBuffer,
    pointer: PointerState,
    sample: Option<ColorSample>,
}

impl Session {
    pub fn new(frame: FrameBuffer) -> Self {
        Self {
            id: Uuid::new_v4(),
            frame,
            pointer: PointerState::new(),
            sample: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn sample(&self) -> Option<&ColorSample> {
        self.sample.as_ref()
    }

    /// Feed one input event through the pointer state machine
    pub fn apply(&mut self, event: InputEvent) -> Transition {
        match event {
            InputEvent::PointerDown { button, position } => {
                let position = self.track(position);
                self.pointer.press(button, position)
            }
            InputEvent::PointerMove { position } => {
                let position = self.track(position);
                self.pointer.move_to(position)
            }
            InputEvent::PointerUp { button, position } => {
                let position = self.track(position);
                self.pointer.release(button, position)
            }
            InputEvent::Key(Key::Escape) => self.pointer.escape(),
            InputEvent::Key(_) => Transition::None,
        }
    }

    /// Clamp a raw position onto the surface and refresh the color sample.
    ///
    /// The returned position may sit on the far edge (a selection corner);
    /// the sample always comes from a real pixel. Sampling starts with the
    /// first position that lies on the snapshot; after that, positions past
    /// the edge sample the nearest edge pixel.
    fn track(&mut self, raw: Point) -> Point {
        let bounds = self.frame.bounds();
        let position = bounds.clamp_point(raw);

        if bounds.contains(raw.x, raw.y) || self.sample.is_some() {
            self.sample = Some(sample_at(&self.frame, bounds.clamp_pixel(raw)));
        }

        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerButton;
    use crate::selection::DragMode;
    use snapshot::Rect;
    use image::{Rgba, RgbaImage};

    fn session() -> Session {
        let mut image = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
        image.put_pixel(10, 20, Rgba([255, 0, 0, 255]));
        image.put_pixel(199, 99, Rgba([0, 255, 0, 255]));
        Session::new(FrameBuffer::new(image).unwrap())
    }

    #[test]
    fn new_session_starts_idle_without_sample() {
        let session = session();

        assert_eq!(session.pointer().mode, DragMode::Idle);
        assert_eq!(session.pointer().position(), None);
        assert!(session.sample().is_none());
    }

    #[test]
    fn moving_onto_a_pixel_samples_it() {
        let mut session = session();
        session.apply(InputEvent::PointerMove {
            position: Point::new(10, 20),
        });

        let sample = session.sample().unwrap();
        assert_eq!((sample.r, sample.g, sample.b), (255, 0, 0));
        assert_eq!(sample.hex, "#FF0000");
        assert_eq!(sample.rgb_text, "rgb(255, 0, 0)");
    }

    #[test]
    fn off_surface_positions_are_clamped() {
        let mut session = session();

        session.apply(InputEvent::PointerMove {
            position: Point::new(500, -40),
        });
        assert!(session.sample().is_none());
        assert_eq!(session.pointer().position(), Some(Point::new(200, 0)));

        session.apply(InputEvent::PointerMove {
            position: Point::new(150, 50),
        });
        session.apply(InputEvent::PointerMove {
            position: Point::new(900, 900),
        });
        assert_eq!(session.sample().unwrap().hex, "#00FF00");
    }

    #[test]
    fn drag_past_edge_stays_inside_surface() {
        let mut session = session();
        session.apply(InputEvent::PointerDown {
            button: PointerButton::Primary,
            position: Point::new(150, 50),
        });

        let transition = session.apply(InputEvent::PointerUp {
            button: PointerButton::Primary,
            position: Point::new(1000, 1000),
        });
        assert_eq!(transition, Transition::Release(Rect::new(150, 50, 50, 50)));
    }
}
