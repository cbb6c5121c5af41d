//! Frame scheduling and the copy confirmation flash

use std::time::{Duration, Instant};

/// Coalesces redraw requests into at most one frame per display refresh
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
}

impl FrameScheduler {
    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request, if any
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending = false;
    }
}

/// Copy feedback flag with a deferred reset.
///
/// Every successful copy pushes the reset out to `now + duration`, so
/// overlapping copies stay lit until the most recent one expires.
#[derive(Debug)]
pub struct CopyFeedback {
    duration: Duration,
    active_until: Option<Instant>,
}

impl CopyFeedback {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            active_until: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.active_until = Some(now + self.duration);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.active_until.is_some_and(|until| now < until)
    }

    /// Drop an elapsed deadline; returns true when the flag just turned off
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.active_until {
            Some(until) if now >= until => {
                self.active_until = None;
                true
            }
            _ => false,
        }
    }

    /// When the host should wake up next to clear the flag
    pub fn deadline(&self) -> Option<Instant> {
        self.active_until
    }
}
