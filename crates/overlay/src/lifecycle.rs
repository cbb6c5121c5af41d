//! Activation subscription
//!
//! The overlay subscribes once for the lifetime of the process. The listener
//! never unsubscribes after a delivery: every later activation reaches the
//! same overlay and replaces its session.

use crate::{OverlayError, OverlayResult};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use snapshot::ActivationEvent;

/// Create a connected sender/listener pair
pub fn subscribe() -> (ActivationSender, ActivationListener) {
    let (tx, rx) = unbounded();
    (ActivationSender { tx }, ActivationListener { rx })
}

/// Provider side of the activation channel
#[derive(Debug, Clone)]
pub struct ActivationSender {
    tx: Sender<ActivationEvent>,
}

impl ActivationSender {
    pub fn send(&self, event: ActivationEvent) -> OverlayResult<()> {
        self.tx.send(event).map_err(|_| OverlayError::Disconnected)
    }
}

/// Overlay side of the activation channel
#[derive(Debug)]
pub struct ActivationListener {
    rx: Receiver<ActivationEvent>,
}

impl ActivationListener {
    /// Next queued activation without blocking
    pub fn try_recv(&self) -> OverlayResult<Option<ActivationEvent>> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(OverlayError::Disconnected),
        }
    }

    /// Block until the next activation arrives
    pub fn recv(&self) -> OverlayResult<ActivationEvent> {
        self.rx.recv().map_err(|_| OverlayError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_keeps_receiving_after_first_delivery() {
        let (tx, listener) = subscribe();

        tx.send(ActivationEvent::new("first")).unwrap();
        assert_eq!(listener.recv().unwrap().image_data_url, "first");

        tx.send(ActivationEvent::new("second")).unwrap();
        tx.send(ActivationEvent::new("third")).unwrap();
        assert_eq!(listener.try_recv().unwrap().unwrap().image_data_url, "second");
        assert_eq!(listener.try_recv().unwrap().unwrap().image_data_url, "third");
        assert!(listener.try_recv().unwrap().is_none());
    }

    #[test]
    fn dropped_provider_is_reported() {
        let (tx, listener) = subscribe();
        drop(tx);

        assert!(matches!(listener.try_recv(), Err(OverlayError::Disconnected)));
        assert!(matches!(listener.recv(), Err(OverlayError::Disconnected)));
    }
}
