//! Platform-neutral input events

use snapshot::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Keyboard actions the overlay reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ToggleFormat,
    CopyColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PointerDown { button: PointerButton, position: Point },
    PointerMove { position: Point },
    PointerUp { button: PointerButton, position: Point },
    Key(Key),
}
