//! Core type definitions for the application

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub type TrackId = u64;
pub type PlaylistId = u32;

/// One of the library views shown as a tab on the main screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Playlists,
    Folders,
    Artists,
    Albums,
    Tracks,
}

impl Section {
    /// Canonical tab order
    pub const ALL: [Section; 5] = [
        Section::Playlists,
        Section::Folders,
        Section::Artists,
        Section::Albums,
        Section::Tracks,
    ];

    pub fn bit(self) -> u32 {
        match self {
            Section::Playlists => 1,
            Section::Folders => 2,
            Section::Artists => 4,
            Section::Albums => 8,
            Section::Tracks => 16,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Playlists => "Playlists",
            Section::Folders => "Folders",
            Section::Artists => "Artists",
            Section::Albums => "Albums",
            Section::Tracks => "Tracks",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bitmask of enabled sections, persisted as `show_tabs`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionMask(u32);

impl SectionMask {
    pub const ALL: SectionMask = SectionMask(0b1_1111);
    #[cfg(test)]
    pub const EMPTY: SectionMask = SectionMask(0);

    #[cfg(test)]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[cfg(test)]
    pub fn of(sections: &[Section]) -> Self {
        sections.iter().fold(Self::EMPTY, |mask, section| mask.with(*section))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, section: Section) -> bool {
        self.0 & section.bit() != 0
    }

    #[cfg(test)]
    pub fn with(self, section: Section) -> Self {
        Self(self.0 | section.bit())
    }

    pub fn toggle(self, section: Section) -> Self {
        Self(self.0 ^ section.bit())
    }

    #[cfg(test)]
    pub fn is_empty(self) -> bool {
        self.0 & Self::ALL.0 == 0
    }
}

impl Default for SectionMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// A track row. Library rows have no playlist id; playlist entries are
/// copies of a library row carrying the playlist they belong to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub path: PathBuf,
    pub duration_secs: u32,
    #[serde(default)]
    pub playlist_id: Option<PlaylistId>,
}

impl Track {
    pub fn folder(&self) -> Option<&Path> {
        self.path.parent()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub title: String,
}
