//! Persisted library: tracks, playlists and the saved playback queue
//!
//! Every method here does blocking file I/O and is meant to be called from
//! `tokio::task::spawn_blocking`, never from the screen loop itself.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::types::{Playlist, PlaylistId, Track, TrackId};

const LIBRARY_FILE: &str = ".cache/library.json";

/// Everything the pages need to draw themselves
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

impl LibrarySnapshot {
    /// Library rows, i.e. tracks that are not playlist entries
    pub fn library_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.playlist_id.is_none())
    }

    pub fn playlist_tracks(&self, playlist: PlaylistId) -> impl Iterator<Item = &Track> {
        self.tracks
            .iter()
            .filter(move |t| t.playlist_id == Some(playlist))
    }

    /// Distinct folders holding library tracks, sorted
    pub fn folders(&self) -> Vec<PathBuf> {
        let mut folders: Vec<PathBuf> = self
            .library_tracks()
            .filter_map(|t| t.folder().map(Path::to_path_buf))
            .collect();
        folders.sort();
        folders.dedup();
        folders
    }
}

pub trait LibraryStore: Send + Sync {
    /// Fails when the backing storage can't be read or written
    fn check_access(&self) -> Result<()>;

    /// Whether tracks can be resolved by folder (enables the Folders tab)
    fn supports_folders(&self) -> bool;

    /// Re-reads persisted data and drops entries pointing at missing tracks
    fn rescan(&self) -> Result<()>;

    fn snapshot(&self) -> Result<LibrarySnapshot>;

    fn queue(&self) -> Result<Vec<TrackId>>;

    /// Library tracks under `folder`, recursively
    fn folder_tracks(&self, folder: &Path) -> Result<Vec<Track>>;

    fn create_playlist(&self, title: &str) -> Result<PlaylistId>;

    /// Inserts or replaces rows keyed by track id and playlist id
    fn insert_tracks(&self, tracks: Vec<Track>) -> Result<usize>;

    /// Removes the track from the library, every playlist and the queue
    fn delete_track(&self, id: TrackId) -> Result<()>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct LibraryDocument {
    #[serde(flatten)]
    content: LibrarySnapshot,
    #[serde(default)]
    queue: Vec<TrackId>,
}

impl LibraryDocument {
    fn prune(&mut self) -> bool {
        let library_ids: Vec<TrackId> = self.content.library_tracks().map(|t| t.id).collect();
        let playlist_ids: Vec<PlaylistId> = self.content.playlists.iter().map(|p| p.id).collect();
        let before = (self.content.tracks.len(), self.queue.len());

        self.content.tracks.retain(|t| match t.playlist_id {
            None => true,
            Some(playlist) => library_ids.contains(&t.id) && playlist_ids.contains(&playlist),
        });
        self.queue.retain(|id| library_ids.contains(id));

        before != (self.content.tracks.len(), self.queue.len())
    }
}

/// [`LibraryStore`] kept in a single JSON document
pub struct JsonLibrary {
    path: PathBuf,
    document: RwLock<LibraryDocument>,
}

impl JsonLibrary {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = Self::read_document(&path)?;
        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(LIBRARY_FILE)
    }

    /// Replaces the saved queue
    #[cfg(test)]
    pub fn set_queue(&self, queue: Vec<TrackId>) -> Result<()> {
        let mut document = self.write()?;
        document.queue = queue;
        self.persist(&document)
    }

    fn read_document(path: &Path) -> Result<LibraryDocument> {
        if !path.exists() {
            return Ok(LibraryDocument::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("read library {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parse library {}", path.display()))
    }

    fn persist(&self, document: &LibraryDocument) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = serde_json::to_string_pretty(document)?;
        // Readers only ever see a complete document
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content)
            .with_context(|| format!("write library {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("replace library {}", self.path.display()))?;
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, LibraryDocument>> {
        self.document
            .read()
            .map_err(|_| anyhow!("library state lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, LibraryDocument>> {
        self.document
            .write()
            .map_err(|_| anyhow!("library state lock poisoned"))
    }
}

impl LibraryStore for JsonLibrary {
    fn check_access(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("create library directory {}", dir.display()))?;
            }
        }
        if self.path.exists() {
            OpenOptions::new()
                .read(true)
                .append(true)
                .open(&self.path)
                .with_context(|| format!("open library {}", self.path.display()))?;
        }
        Ok(())
    }

    fn supports_folders(&self) -> bool {
        true
    }

    fn rescan(&self) -> Result<()> {
        // Held across the read so no write can land between reading the file
        // and replacing the document with it
        let mut document = self.write()?;
        let mut fresh = Self::read_document(&self.path)?;
        let pruned = fresh.prune();
        if pruned {
            self.persist(&fresh)?;
        }
        tracing::debug!(
            tracks = fresh.content.tracks.len(),
            playlists = fresh.content.playlists.len(),
            pruned,
            "Library rescanned"
        );
        *document = fresh;
        Ok(())
    }

    fn snapshot(&self) -> Result<LibrarySnapshot> {
        Ok(self.read()?.content.clone())
    }

    fn queue(&self) -> Result<Vec<TrackId>> {
        Ok(self.read()?.queue.clone())
    }

    fn folder_tracks(&self, folder: &Path) -> Result<Vec<Track>> {
        let document = self.read()?;
        let mut tracks: Vec<Track> = document
            .content
            .library_tracks()
            .filter(|t| t.path.starts_with(folder))
            .cloned()
            .collect();
        tracks.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(tracks)
    }

    fn create_playlist(&self, title: &str) -> Result<PlaylistId> {
        let title = title.trim();
        if title.is_empty() {
            bail!("playlist title is empty");
        }

        let mut document = self.write()?;
        if document
            .content
            .playlists
            .iter()
            .any(|p| p.title.eq_ignore_ascii_case(title))
        {
            bail!("a playlist named \"{title}\" already exists");
        }

        let id = document
            .content
            .playlists
            .iter()
            .map(|p| p.id)
            .max()
            .unwrap_or(0)
            + 1;
        document.content.playlists.push(Playlist {
            id,
            title: title.to_string(),
        });
        self.persist(&document)?;
        Ok(id)
    }

    fn insert_tracks(&self, tracks: Vec<Track>) -> Result<usize> {
        let count = tracks.len();
        let mut document = self.write()?;
        for track in tracks {
            let existing = document
                .content
                .tracks
                .iter_mut()
                .find(|t| t.id == track.id && t.playlist_id == track.playlist_id);
            match existing {
                Some(row) => *row = track,
                None => document.content.tracks.push(track),
            }
        }
        self.persist(&document)?;
        Ok(count)
    }

    fn delete_track(&self, id: TrackId) -> Result<()> {
        let mut document = self.write()?;
        document.content.tracks.retain(|t| t.id != id);
        document.queue.retain(|queued| *queued != id);
        self.persist(&document)
    }
}
