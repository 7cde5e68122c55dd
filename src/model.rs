//! Defines the core data structures used by the playback engine.
//!
//! Wire types (`StateResponse`, `VideosResponse`) mirror the backend's JSON
//! and are converted into the domain types (`Configuration`, `Clip`) the
//! engine works with. Conversion is where defaults and clamping happen.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Name of the playlist that always exists.
pub const DEFAULT_PLAYLIST: &str = "default";

const DEFAULT_VOLUME: u8 = 60;

/// Playlist name to ordered filenames.
pub type PlaylistSet = BTreeMap<String, Vec<String>>;

/// A playable entry of the catalog. Identity is the filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clip {
    pub filename: String,
    /// Where a surface should load the clip from. Opaque to the engine.
    pub locator: String,
}

/// The backend's authoritative playback configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    /// 0..=100
    pub volume: u8,
    pub muted: bool,
    pub selected_filename: Option<String>,
    pub active_playlist: String,
    pub playlists: PlaylistSet,
}

impl Default for Configuration {
    /// Safe fallback used when the backend cannot be reached at startup.
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            muted: true,
            selected_filename: None,
            active_playlist: DEFAULT_PLAYLIST.to_string(),
            playlists: default_playlists(),
        }
    }
}

impl Configuration {
    pub fn audio(&self) -> AudioLevel {
        AudioLevel { volume: self.volume, muted: self.muted }
    }
}

fn default_playlists() -> PlaylistSet {
    let mut playlists = PlaylistSet::new();
    playlists.insert(DEFAULT_PLAYLIST.to_string(), Vec::new());
    playlists
}

/// Volume and mute state as applied to a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioLevel {
    pub volume: u8,
    pub muted: bool,
}

impl AudioLevel {
    /// Level handed to a surface: silent when muted, else `volume / 100`.
    pub fn effective(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            f32::from(self.volume.min(100)) / 100.0
        }
    }
}

/// `GET /api/state` response. Fields the engine does not use are ignored.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct StateResponse {
    pub volume: Option<i64>,
    pub muted: Option<bool>,
    pub selected_offline: Option<String>,
    pub active_playlist: Option<String>,
    pub playlists: Option<PlaylistSet>,
}

impl From<StateResponse> for Configuration {
    fn from(state: StateResponse) -> Self {
        let mut playlists = state.playlists.unwrap_or_default();
        playlists.entry(DEFAULT_PLAYLIST.to_string()).or_default();
        Configuration {
            volume: state.volume.map_or(DEFAULT_VOLUME, |v| v.clamp(0, 100) as u8),
            muted: state.muted.unwrap_or(true),
            selected_filename: state.selected_offline.filter(|s| !s.is_empty()),
            active_playlist: state.active_playlist
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_PLAYLIST.to_string()),
            playlists,
        }
    }
}

/// One entry of `GET /api/videos`.
#[derive(Deserialize, Clone, Debug)]
pub struct VideoEntry {
    pub filename: String,
}

/// `GET /api/videos` response.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct VideosResponse {
    #[serde(default)]
    pub videos: Vec<VideoEntry>,
}

/// Position of `filename` in the catalog, if present.
pub fn catalog_index(catalog: &[Clip], filename: &str) -> Option<usize> {
    catalog.iter().position(|clip| clip.filename == filename)
}
