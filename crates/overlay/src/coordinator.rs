//! Commit/cancel sequencing
//!
//! The window is always hidden before the backend is called, so the overlay
//! is never on screen while the backend works.

use crate::host::{Backend, WindowHost};
use crate::selection::is_valid_selection;
use crate::{CancelReason, SelectionOutcome};
use snapshot::Rect;
use tracing::{debug, info, warn};

/// Resolve a primary-button release: commit, or cancel when too small
pub fn release<B, H>(backend: &B, host: &mut H, rect: Rect, min_size: u32) -> SelectionOutcome
where
    B: Backend + ?Sized,
    H: WindowHost + ?Sized,
{
    if !is_valid_selection(&rect, min_size) {
        debug!(?rect, min_size, "selection below threshold");
        return cancel(backend, host, CancelReason::TooSmall);
    }

    commit(backend, host, rect)
}

pub fn commit<B, H>(backend: &B, host: &mut H, rect: Rect) -> SelectionOutcome
where
    B: Backend + ?Sized,
    H: WindowHost + ?Sized,
{
    hide(host);

    match backend.commit_selection(rect) {
        Ok(()) => {
            info!(
                x = rect.x,
                y = rect.y,
                width = rect.width,
                height = rect.height,
                "selection committed"
            );
            SelectionOutcome::Committed(rect)
        }
        Err(e) => {
            warn!(error = %e, "commit failed, cancelling capture");
            notify_cancel(backend);
            SelectionOutcome::Cancelled(CancelReason::CommitFailed)
        }
    }
}

pub fn cancel<B, H>(backend: &B, host: &mut H, reason: CancelReason) -> SelectionOutcome
where
    B: Backend + ?Sized,
    H: WindowHost + ?Sized,
{
    hide(host);
    notify_cancel(backend);
    info!(?reason, "selection cancelled");
    SelectionOutcome::Cancelled(reason)
}

fn hide<H: WindowHost + ?Sized>(host: &mut H) {
    if let Err(e) = host.hide() {
        warn!(error = %e, "failed to hide overlay window");
    }
}

fn notify_cancel<B: Backend + ?Sized>(backend: &B) {
    if let Err(e) = backend.cancel_selection() {
        warn!(error = %e, "backend cancel failed");
    }
}
