//! Playlist creation and track deletion
//!
//! Store writes run on the blocking pool. Other observers learn about the
//! result from the bus, never from a direct call.

use std::path::PathBuf;

use crate::bus::Event;
use crate::model::{Overlay, PendingFolder, Section, ToastLevel};
use super::{ScreenController, UiMessage};

impl ScreenController {
    /// Playlist actions are only offered on the Playlists page
    pub(crate) fn playlist_actions_available(&self) -> bool {
        self.active_section() == Some(Section::Playlists)
    }

    pub fn begin_new_playlist(&mut self) {
        self.overlay = Some(Overlay::PlaylistName {
            input: String::new(),
            pending: None,
        });
    }

    pub fn begin_playlist_from_folder(&mut self) {
        let folders = self.library_snapshot.folders();
        if folders.is_empty() {
            self.show_toast(ToastLevel::Info, "The library has no folders yet");
            return;
        }
        self.overlay = Some(Overlay::FolderPicker { folders, selected: 0 });
    }

    /// Resolves the folder's tracks in the background. The name prompt opens
    /// once they are known.
    pub fn create_playlist_from_folder(&mut self, folder: PathBuf) {
        self.overlay = None;
        tracing::info!(folder = %folder.display(), "Resolving folder tracks");

        let library = self.deps.library.clone();
        let ui_tx = self.ui_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = library.folder_tracks(&folder);
            crate::log_store_result!("folder_tracks", result);
            let message = match result {
                Ok(tracks) => UiMessage::FolderResolved { folder, tracks },
                Err(e) => UiMessage::StoreFailed {
                    operation: "read folder",
                    message: format!("{e:#}"),
                },
            };
            let _ = ui_tx.send(message);
        });
    }

    /// Creates the playlist and, for a folder playlist, stores a copy of every
    /// resolved track under the new playlist id.
    pub fn submit_playlist_name(&mut self, title: &str, pending: Option<PendingFolder>) {
        self.overlay = None;
        let title = title.trim().to_string();
        if title.is_empty() {
            tracing::debug!("Ignoring empty playlist name");
            return;
        }

        let library = self.deps.library.clone();
        let bus = self.deps.bus.clone();
        let ui_tx = self.ui_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = library.create_playlist(&title).and_then(|playlist_id| {
                let tracks: Vec<_> = pending
                    .map(|pending| pending.tracks)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|mut track| {
                        track.playlist_id = Some(playlist_id);
                        track
                    })
                    .collect();
                let inserted = if tracks.is_empty() { 0 } else { library.insert_tracks(tracks)? };
                Ok((playlist_id, inserted))
            });
            crate::log_store_result!("create_playlist", result);

            match result {
                Ok((playlist_id, inserted)) => {
                    tracing::info!(playlist_id, title = %title, inserted, "Playlist created");
                    bus.publish(Event::PlaylistsUpdated);
                }
                Err(e) => {
                    let _ = ui_tx.send(UiMessage::StoreFailed {
                        operation: "create playlist",
                        message: format!("{e:#}"),
                    });
                }
            }
        });
    }

    pub fn delete_selected_track(&mut self) {
        let Some(track) = self
            .active_page_mut()
            .and_then(|page| page.selected_row())
            .and_then(|row| row.track.clone())
        else {
            return;
        };

        tracing::info!(track_id = track.id, title = %track.title, "Deleting track");
        let library = self.deps.library.clone();
        let bus = self.deps.bus.clone();
        let ui_tx = self.ui_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = library.delete_track(track.id);
            crate::log_store_result!("delete_track", result);
            match result {
                Ok(()) => bus.publish(Event::TrackDeleted),
                Err(e) => {
                    let _ = ui_tx.send(UiMessage::StoreFailed {
                        operation: "delete track",
                        message: format!("{e:#}"),
                    });
                }
            }
        });
    }

    pub fn publish_refresh_tracks(&self) {
        self.deps.bus.publish(Event::RefreshTracks);
    }
}
