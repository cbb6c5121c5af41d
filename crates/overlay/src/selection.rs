//! Pointer state machine for region selection

use crate::input::PointerButton;
use snapshot::{Point, Rect};

/// Drag state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Idle,
    Dragging,
}

/// What the coordinator has to do after an input was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing visible changed
    None,
    /// State changed, schedule a frame
    Redraw,
    /// Primary button released; the finalized selection
    Release(Rect),
    /// Escape or secondary button; cancel regardless of size
    Abort,
}

/// Pointer tracking for one session
#[derive(Debug, Clone, Copy)]
pub struct PointerState {
    pub mode: DragMode,
    pub anchor: Point,
    pub current: Point,
    tracked: bool,
}

impl PointerState {
    pub fn new() -> Self {
        Self {
            mode: DragMode::Idle,
            anchor: Point::default(),
            current: Point::default(),
            tracked: false,
        }
    }

    /// Last pointer position, once the pointer has been seen on the surface
    pub fn position(&self) -> Option<Point> {
        self.tracked.then_some(self.current)
    }

    /// Normalized selection, defined only while dragging
    pub fn selection(&self) -> Option<Rect> {
        match self.mode {
            DragMode::Dragging => Some(calc_selection_rect(self.anchor, self.current)),
            DragMode::Idle => None,
        }
    }

    pub fn press(&mut self, button: PointerButton, position: Point) -> Transition {
        match (button, self.mode) {
            (PointerButton::Primary, DragMode::Idle) => {
                self.mode = DragMode::Dragging;
                self.anchor = position;
                self.current = position;
                self.tracked = true;
                Transition::Redraw
            }
            (PointerButton::Secondary, _) => {
                self.mode = DragMode::Idle;
                Transition::Abort
            }
            _ => Transition::None,
        }
    }

    pub fn move_to(&mut self, position: Point) -> Transition {
        if self.tracked && self.current == position {
            return Transition::None;
        }

        self.current = position;
        self.tracked = true;
        Transition::Redraw
    }

    pub fn release(&mut self, button: PointerButton, position: Point) -> Transition {
        if button != PointerButton::Primary || self.mode != DragMode::Dragging {
            return Transition::None;
        }

        self.current = position;
        let rect = calc_selection_rect(self.anchor, self.current);
        self.mode = DragMode::Idle;
        Transition::Release(rect)
    }

    /// Escape aborts from either state
    pub fn escape(&mut self) -> Transition {
        self.mode = DragMode::Idle;
        Transition::Abort
    }
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate selection rectangle from drag points
pub fn calc_selection_rect(anchor: Point, current: Point) -> Rect {
    Rect::from_corners(anchor, current)
}

/// Check if selection is large enough to commit
pub fn is_valid_selection(rect: &Rect, min_size: u32) -> bool {
    rect.width >= min_size && rect.height >= min_size
}
