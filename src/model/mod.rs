//! Model module - Application state and data types
//!
//! This module contains the data structures and persisted state the main
//! screen works with. It is organized into submodules by responsibility:
//!
//! - `types`: Core type definitions (sections, section mask, tracks)
//! - `config`: Persisted screen configuration
//! - `library`: Persisted library store (tracks, playlists, queue)
//! - `sleep_timer`: Sleep timer state machine and picker entries
//! - `tabs`: Tab registry and tab/page selection sync
//! - `screen`: UI state of the main screen (mini player, overlays, toasts)

mod types;
mod config;
mod library;
mod sleep_timer;
mod tabs;
mod screen;

// Re-export all public types for convenient access
pub use types::{Section, SectionMask, Track};

pub use config::{Config, ConfigStore};

pub use library::{JsonLibrary, LibrarySnapshot, LibraryStore};

pub use sleep_timer::{sleep_timer_options, SleepOption, SleepTick, SleepTimer, CUSTOM_SLEEP_TIMER};

pub use tabs::{PageChange, PagerSync, TabRegistry};

pub use screen::{MiniPlayer, Overlay, PendingFolder, SearchState, Toast, ToastLevel};

#[cfg(test)]
pub(crate) use library::tests::track as test_track;
#[cfg(test)]
pub(crate) use sleep_timer::SleepTimerState;
#[cfg(test)]
pub(crate) use types::Playlist;
