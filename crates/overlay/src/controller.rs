//! Overlay controller: one long-lived instance per window

use crate::config::OverlayConfig;
use crate::coordinator;
use crate::feedback::{CopyFeedback, FrameScheduler};
use crate::host::{Backend, WindowHost};
use crate::input::{InputEvent, Key};
use crate::lifecycle::ActivationListener;
use crate::render::{Compositor, Frame, Scene};
use crate::sampler::DisplayFormat;
use crate::selection::Transition;
use crate::session::Session;
use crate::{CancelReason, OverlayError, OverlayResult, SelectionOutcome};
use snapshot::ActivationEvent;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Selection overlay bound to one host window.
///
/// The window and this controller persist across captures; each activation
/// builds a new [`Session`] and each commit or cancel drops it.
pub struct Overlay<B: Backend, H: WindowHost> {
    backend: B,
    host: H,
    compositor: Compositor,
    format: DisplayFormat,
    feedback: CopyFeedback,
    scheduler: FrameScheduler,
    session: Option<Session>,
    closed: bool,
}

impl<B: Backend, H: WindowHost> Overlay<B, H> {
    pub fn new(backend: B, host: H, config: OverlayConfig) -> Self {
        Self {
            backend,
            host,
            feedback: CopyFeedback::new(config.copy_feedback),
            compositor: Compositor::new(config),
            format: DisplayFormat::default(),
            scheduler: FrameScheduler::default(),
            session: None,
            closed: false,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn frame_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Start a session from an activation event.
    ///
    /// A payload that does not decode is fatal for this window: the user is
    /// alerted and the window is torn down instead of hidden.
    pub fn activate(&mut self, event: &ActivationEvent) -> OverlayResult<()> {
        if self.closed {
            warn!("activation received after the overlay window was closed");
            return Err(OverlayError::Closed);
        }

        let frame = match event.decode() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "invalid activation payload");
                self.session = None;
                self.scheduler.clear();
                self.host.alert(&format!("Unable to start screen selection: {}", e));
                self.host.close();
                self.closed = true;
                return Err(e.into());
            }
        };

        if let Some(previous) = self.session.take() {
            debug!(session = %previous.id(), "replacing unresolved session");
        }

        let session = Session::new(frame);
        info!(
            session = %session.id(),
            width = session.frame().width(),
            height = session.frame().height(),
            "overlay session started"
        );
        self.session = Some(session);
        self.scheduler.request();

        if let Err(e) = self.host.show() {
            warn!(error = %e, "failed to show overlay window");
        }

        Ok(())
    }

    /// Process every activation queued on the listener.
    ///
    /// The listener stays subscribed; call this again whenever the provider
    /// signals new events.
    pub fn dispatch(&mut self, listener: &ActivationListener) -> OverlayResult<usize> {
        let mut handled = 0;
        while let Some(event) = listener.try_recv()? {
            handled += 1;
            // activation failures are reported to the user by `activate`
            if self.activate(&event).is_err() && self.closed {
                break;
            }
        }
        Ok(handled)
    }

    /// Apply one input event. Returns the outcome when the session resolves.
    pub fn handle_input(&mut self, event: InputEvent, now: Instant) -> Option<SelectionOutcome> {
        match event {
            InputEvent::Key(Key::ToggleFormat) => {
                self.format = self.format.toggled();
                self.scheduler.request();
                return None;
            }
            InputEvent::Key(Key::CopyColor) => {
                self.copy_color(now);
                return None;
            }
            _ => {}
        }

        let session = self.session.as_mut()?;
        match session.apply(event) {
            Transition::None => None,
            Transition::Redraw => {
                self.scheduler.request();
                None
            }
            Transition::Release(rect) => {
                let min_size = self.compositor.config().min_selection;
                self.end_session();
                Some(coordinator::release(&self.backend, &mut self.host, rect, min_size))
            }
            Transition::Abort => {
                self.end_session();
                Some(coordinator::cancel(
                    &self.backend,
                    &mut self.host,
                    CancelReason::UserAbort,
                ))
            }
        }
    }

    /// Render a frame if one was requested since the last call.
    ///
    /// Hosts call this once per display refresh; any number of inputs in
    /// between collapse into this single frame.
    pub fn poll_frame(&mut self, now: Instant) -> Option<Frame> {
        if self.feedback.expire(now) {
            self.scheduler.request();
        }

        if !self.scheduler.take() {
            return None;
        }

        let session = self.session.as_ref()?;
        Some(self.compositor.render(&Scene {
            frame: session.frame(),
            pointer: session.pointer(),
            sample: session.sample(),
            format: self.format,
            copy_feedback: self.feedback.is_active(now),
        }))
    }

    /// Next instant the host must call [`Overlay::poll_frame`] without input
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.feedback.deadline()
    }

    fn copy_color(&mut self, now: Instant) {
        let Some(text) = self
            .session
            .as_ref()
            .and_then(|s| s.sample())
            .map(|sample| sample.text(self.format).to_string())
        else {
            return;
        };

        match self.backend.write_clipboard_text(&text) {
            Ok(()) => {
                debug!(%text, "color copied");
                self.feedback.trigger(now);
                self.scheduler.request();
            }
            Err(e) => warn!(error = %e, "failed to copy color to clipboard"),
        }
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(session = %session.id(), "overlay session ended");
        }
        self.scheduler.clear();
    }
}
