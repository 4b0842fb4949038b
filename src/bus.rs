//! In-process event bus between the playback service and the screen
//!
//! Publishers never wait on subscribers. A subscriber receives events from a
//! single publisher in publish order and drains them from its own task, so
//! handlers always run on the subscriber's side regardless of which thread
//! published.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
#[cfg(test)]
use tokio::sync::broadcast::error::TryRecvError;

use crate::model::Track;

const BUS_CAPACITY: usize = 256;

/// Notifications carried by the bus
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    TrackChanged(Option<Track>),
    TrackStateChanged { is_playing: bool },
    SleepTimerChanged { seconds: u32 },
    PlaylistsUpdated,
    RefreshTracks,
    TrackDeleted,
    NoStoragePermission,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Fire and forget. Nobody listening is fine.
    pub fn publish(&self, event: Event) {
        tracing::trace!(?event, "Publishing event");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self, owner: &'static str) -> Subscription {
        tracing::debug!(owner, "Bus subscriber registered");
        Subscription {
            owner,
            rx: self.tx.subscribe(),
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live registration on the bus. Events published after
/// [`Subscription::unsubscribe`] are never observed.
pub struct Subscription {
    owner: &'static str,
    rx: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Waits for the next event. `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(owner = self.owner, skipped, "Bus subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-published event, if any
    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(owner = self.owner, skipped, "Bus subscriber lagged, events dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        tracing::debug!(owner = self.owner, "Bus subscriber released");
    }
}
