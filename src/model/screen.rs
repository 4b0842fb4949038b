//! UI state owned by the main screen

use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::sleep_timer::SleepOption;
use super::types::{SectionMask, Track};

const TOAST_TTL: Duration = Duration::from_secs(4);

/// What the current-track bar shows. Replaced wholesale on every update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MiniPlayer {
    pub track: Option<Track>,
    pub is_playing: bool,
}

impl MiniPlayer {
    pub fn is_visible(&self) -> bool {
        self.track.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    pub open: bool,
    pub query: String,
}

/// Tracks resolved from a folder, waiting for a playlist name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFolder {
    pub folder: PathBuf,
    pub tracks: Vec<Track>,
}

/// Modal shown on top of the pages
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Overlay {
    Help,
    SleepPicker {
        options: Vec<SleepOption>,
        selected: usize,
    },
    CustomSleep {
        input: String,
    },
    PlaylistName {
        input: String,
        pending: Option<PendingFolder>,
    },
    FolderPicker {
        folders: Vec<PathBuf>,
        selected: usize,
    },
    Settings {
        mask: SectionMask,
        selected: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub expires_at: Instant,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
