//! Bus notification dispatch and background result handling

use chrono::Utc;

use crate::bus::Event;
use crate::model::{Overlay, PendingFolder, Section, SleepTick, ToastLevel};
use super::{Inbound, RefreshScope, ScreenController, ScreenExit, UiMessage};

impl ScreenController {
    pub fn handle_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Bus(event) => self.handle_event(event),
            Inbound::Ui(message) => self.handle_ui_message(message),
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::TrackChanged(track) => {
                tracing::debug!(track = ?track.as_ref().map(|t| &t.title), "Event::TrackChanged");
                self.mini_player.track = track;
            }
            Event::TrackStateChanged { is_playing } => {
                tracing::debug!(is_playing, "Event::TrackStateChanged");
                self.mini_player.is_playing = is_playing;
            }
            Event::SleepTimerChanged { seconds } => {
                tracing::trace!(seconds, "Event::SleepTimerChanged");
                match self.sleep_timer.remaining_seconds_changed(seconds, Utc::now()) {
                    SleepTick::Finished => {
                        tracing::info!("Sleep timer finished, closing main screen");
                        self.exit = Some(ScreenExit::SleepCompleted);
                    }
                    SleepTick::Ignored => tracing::debug!(seconds, "Dropping stale sleep timer tick"),
                    SleepTick::Remaining(_) => {}
                }
            }
            Event::PlaylistsUpdated => {
                tracing::debug!("Event::PlaylistsUpdated");
                self.request_refresh(RefreshScope::Only(Section::Playlists), false);
            }
            Event::RefreshTracks => {
                tracing::debug!("Event::RefreshTracks");
                self.request_refresh(RefreshScope::Only(Section::Tracks), false);
            }
            Event::TrackDeleted => {
                // A deletion can touch playlists, folders and tracks at once
                tracing::debug!("Event::TrackDeleted");
                self.request_refresh(RefreshScope::All, true);
            }
            Event::NoStoragePermission => {
                tracing::warn!("Event::NoStoragePermission");
                self.show_toast(ToastLevel::Warning, "No storage access, library changes can't be saved");
            }
        }
    }

    pub(crate) fn handle_ui_message(&mut self, message: UiMessage) {
        match message {
            UiMessage::LibraryLoaded { scope, snapshot } => {
                let mut refreshed = 0;
                for page in &mut self.pages {
                    let included = match scope {
                        RefreshScope::All => true,
                        RefreshScope::Only(section) => page.section() == section,
                    };
                    if included {
                        page.refresh(&snapshot);
                        refreshed += 1;
                    }
                }
                tracing::debug!(?scope, refreshed, "Pages refreshed");
                self.library_snapshot = snapshot;
            }
            UiMessage::FolderResolved { folder, tracks } => {
                if tracks.is_empty() {
                    tracing::info!(folder = %folder.display(), "Folder holds no tracks");
                    self.show_toast(ToastLevel::Info, format!("No tracks found in {}", folder.display()));
                    return;
                }
                tracing::info!(folder = %folder.display(), tracks = tracks.len(), "Folder resolved");
                self.overlay = Some(Overlay::PlaylistName {
                    input: String::new(),
                    pending: Some(PendingFolder { folder, tracks }),
                });
            }
            UiMessage::StoreFailed { operation, message } => {
                tracing::error!(operation, error = %message, "Background library operation failed");
                self.show_toast(ToastLevel::Error, format!("Could not {operation}: {message}"));
            }
        }
    }
}
