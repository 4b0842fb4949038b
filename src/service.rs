//! Playback service
//!
//! Runs on its own task, independent of any screen. It owns the queue, the
//! current track and the sleep timer countdown, publishes changes on the bus
//! and exposes the latest [`PlaybackSnapshot`] through a watch channel.
//! Audio output is not modelled here; "playing" is the transport state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::bus::{Event, EventBus};
use crate::model::{LibraryStore, Track};

const SLEEP_TICK: Duration = Duration::from_secs(1);

/// Commands accepted by the playback service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    InitQueue,
    TogglePlayback,
    Next,
    Previous,
    StartSleepTimer { seconds: u32 },
    StopSleepTimer,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub track: Option<Track>,
    pub is_playing: bool,
    /// Seconds left on a running sleep countdown
    pub sleep_remaining: Option<u32>,
}

/// Cheap handle the screen uses to talk to the service
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
}

impl PlaybackHandle {
    pub fn send(&self, command: EngineCommand) {
        tracing::debug!(?command, "Sending playback command");
        if self.commands.send(command).is_err() {
            tracing::warn!("Playback service is not running, command dropped");
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.snapshot.borrow().track.clone()
    }

    /// A handle wired to plain channels, for driving a screen without a service
    #[cfg(test)]
    pub(crate) fn detached(
        snapshot: PlaybackSnapshot,
    ) -> (Self, mpsc::UnboundedReceiver<EngineCommand>, watch::Sender<PlaybackSnapshot>) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(snapshot);
        (Self { commands, snapshot }, command_rx, snapshot_tx)
    }
}

pub struct PlaybackService {
    bus: EventBus,
    library: Arc<dyn LibraryStore>,
    queue: Vec<Track>,
    position: usize,
    snapshot: watch::Sender<PlaybackSnapshot>,
    sleep_deadline: Option<DateTime<Utc>>,
}

impl PlaybackService {
    pub fn spawn(bus: EventBus, library: Arc<dyn LibraryStore>) -> PlaybackHandle {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot::default());

        let service = Self {
            bus,
            library,
            queue: Vec::new(),
            position: 0,
            snapshot: snapshot_tx,
            sleep_deadline: None,
        };
        tokio::spawn(service.run(command_rx));

        PlaybackHandle {
            commands,
            snapshot: snapshot_rx,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<EngineCommand>) {
        tracing::info!("Playback service started");
        let mut tick = tokio::time::interval(SLEEP_TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                _ = tick.tick() => self.on_tick(Utc::now()),
            }
        }
        tracing::info!("Playback service stopped");
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::InitQueue => self.init_queue().await,
            EngineCommand::TogglePlayback => {
                if self.current().is_some() {
                    let playing = !self.snapshot.borrow().is_playing;
                    self.set_playing(playing);
                }
            }
            EngineCommand::Next => self.step(1),
            EngineCommand::Previous => self.step(-1),
            EngineCommand::StartSleepTimer { seconds } => {
                let now = Utc::now();
                self.sleep_deadline = Some(now + chrono::Duration::seconds(i64::from(seconds)));
                tracing::info!(seconds, "Sleep timer started");
                self.set_sleep_remaining(Some(seconds));
                self.bus.publish(Event::SleepTimerChanged { seconds });
            }
            EngineCommand::StopSleepTimer => {
                if self.sleep_deadline.take().is_some() {
                    tracing::info!("Sleep timer stopped");
                    self.set_sleep_remaining(None);
                }
            }
        }
    }

    async fn init_queue(&mut self) {
        let library = self.library.clone();
        let loaded = tokio::task::spawn_blocking(move || load_queue(library.as_ref())).await;

        match loaded {
            Ok(Ok(queue)) if !queue.is_empty() => {
                tracing::info!(tracks = queue.len(), "Queue restored");
                self.queue = queue;
                self.position = 0;
                self.publish_track();
                self.set_playing(false);
            }
            Ok(Ok(_)) => tracing::debug!("Saved queue is empty"),
            Ok(Err(e)) => tracing::error!(error = %e, "Failed to restore queue"),
            Err(e) => tracing::error!(error = %e, "Queue restore task failed"),
        }
    }

    fn current(&self) -> Option<&Track> {
        self.queue.get(self.position)
    }

    fn step(&mut self, delta: isize) {
        if self.queue.is_empty() {
            return;
        }
        let len = self.queue.len() as isize;
        self.position = (self.position as isize + delta).rem_euclid(len) as usize;
        self.publish_track();
    }

    fn publish_track(&mut self) {
        let track = self.current().cloned();
        tracing::info!(track = ?track.as_ref().map(|t| &t.title), "Current track changed");
        self.snapshot.send_modify(|snapshot| snapshot.track = track.clone());
        self.bus.publish(Event::TrackChanged(track));
    }

    fn set_playing(&mut self, is_playing: bool) {
        self.snapshot.send_modify(|snapshot| snapshot.is_playing = is_playing);
        self.bus.publish(Event::TrackStateChanged { is_playing });
    }

    fn set_sleep_remaining(&mut self, remaining: Option<u32>) {
        self.snapshot.send_modify(|snapshot| snapshot.sleep_remaining = remaining);
    }

    fn on_tick(&mut self, now: DateTime<Utc>) {
        let Some(deadline) = self.sleep_deadline else {
            return;
        };

        let remaining = (deadline - now).num_seconds().max(0);
        let seconds = u32::try_from(remaining).unwrap_or(u32::MAX);
        if seconds == 0 {
            tracing::info!("Sleep timer expired, pausing playback");
            self.sleep_deadline = None;
            self.set_sleep_remaining(None);
            self.set_playing(false);
        } else {
            self.set_sleep_remaining(Some(seconds));
        }
        self.bus.publish(Event::SleepTimerChanged { seconds });
    }
}

fn load_queue(library: &dyn LibraryStore) -> Result<Vec<Track>> {
    let ids = library.queue()?;
    let snapshot = library.snapshot()?;
    Ok(ids
        .iter()
        .filter_map(|id| snapshot.library_tracks().find(|t| t.id == *id).cloned())
        .collect())
}
