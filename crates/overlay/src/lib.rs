//! Overlay module for PickShot
//!
//! Selection overlay over a frozen screen snapshot: drag a region with a live
//! magnifier and color sampler, then hand the region (or a cancellation) to
//! the processing backend.

pub mod config;
pub mod controller;
pub mod coordinator;
pub mod feedback;
pub mod host;
pub mod input;
pub mod lifecycle;
pub mod magnifier;
pub mod render;
pub mod sampler;
pub mod selection;
pub mod session;
#[cfg(windows)]
pub mod window;

pub use config::{MagnifierConfig, MagnifierShape, OverlayConfig, Palette};
pub use controller::Overlay;
pub use host::{Backend, WindowHost};
pub use input::{InputEvent, Key, PointerButton};
pub use lifecycle::{subscribe, ActivationListener, ActivationSender};
pub use render::{Frame, Label};
pub use sampler::{ColorSample, DisplayFormat};
pub use selection::{DragMode, PointerState};
pub use session::Session;
#[cfg(windows)]
pub use window::OverlayWindow;

use snapshot::{Rect, SnapshotError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Window host error: {0}")]
    Host(String),

    #[error("Invalid activation: {0}")]
    Activation(#[from] SnapshotError),

    #[error("Overlay window was closed")]
    Closed,

    #[error("Activation channel disconnected")]
    Disconnected,
}

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Why a session ended without a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Escape or secondary button
    UserAbort,
    /// Released with a selection under the minimum size
    TooSmall,
    /// Backend rejected the committed region
    CommitFailed,
}

/// Selection outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Region handed to the backend
    Committed(Rect),
    /// Session abandoned; the backend was told to cancel
    Cancelled(CancelReason),
}
