//! Collaborators on the far side of the overlay: the processing backend and
//! the window that hosts the overlay surface.

use snapshot::Rect;
use std::sync::Arc;

/// Processing backend that receives the outcome of a session
pub trait Backend {
    /// Hand over a committed region, in surface coordinates
    fn commit_selection(&self, rect: Rect) -> anyhow::Result<()>;

    /// Abandon the capture and release any lock held for it
    fn cancel_selection(&self) -> anyhow::Result<()>;

    fn write_clipboard_text(&self, text: &str) -> anyhow::Result<()>;
}

impl<T: Backend + ?Sized> Backend for Box<T> {
    fn commit_selection(&self, rect: Rect) -> anyhow::Result<()> {
        (**self).commit_selection(rect)
    }

    fn cancel_selection(&self) -> anyhow::Result<()> {
        (**self).cancel_selection()
    }

    fn write_clipboard_text(&self, text: &str) -> anyhow::Result<()> {
        (**self).write_clipboard_text(text)
    }
}

impl<T: Backend + ?Sized> Backend for Arc<T> {
    fn commit_selection(&self, rect: Rect) -> anyhow::Result<()> {
        (**self).commit_selection(rect)
    }

    fn cancel_selection(&self) -> anyhow::Result<()> {
        (**self).cancel_selection()
    }

    fn write_clipboard_text(&self, text: &str) -> anyhow::Result<()> {
        (**self).write_clipboard_text(text)
    }
}

/// Visibility controls of the window that shows the overlay.
///
/// `show` and `hide` return once the change has been applied.
pub trait WindowHost {
    fn show(&mut self) -> anyhow::Result<()>;

    fn hide(&mut self) -> anyhow::Result<()>;

    /// Tear the window down for good. Only used after a fatal activation.
    fn close(&mut self);

    /// Show a blocking error message to the user
    fn alert(&mut self, message: &str);
}
