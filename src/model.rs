use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Identity of a catalog track: album index plus position within the album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId {
    pub album: usize,
    pub track: usize,
}

impl TrackId {
    pub fn new(album: usize, track: usize) -> Self {
        Self { album, track }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaylistId(pub(crate) u64);

impl PlaylistId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub location: PathBuf,
    pub album: Option<usize>,
}

// Tracks compare by identity; equal names or locations do not make two tracks the same.
impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

#[derive(Debug, Clone)]
pub struct Album {
    pub title: String,
    pub artist: String,
    pub artwork: PathBuf,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Library,
    Playlist(PlaylistId),
}

impl PlaybackMode {
    pub fn playlist(self) -> Option<PlaylistId> {
        match self {
            Self::Library => None,
            Self::Playlist(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn step(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Library,
    Playlists {
        creating: Option<String>,
    },
    PlaylistDetail {
        playlist: PlaylistId,
        pending: Vec<TrackId>,
    },
}

impl ViewState {
    pub fn kind(&self) -> ViewKind {
        match self {
            Self::Library => ViewKind::Library,
            Self::Playlists { .. } => ViewKind::Playlists,
            Self::PlaylistDetail { .. } => ViewKind::PlaylistDetail,
        }
    }

    pub fn is_creating(&self) -> bool {
        matches!(self, Self::Playlists { creating: Some(_) })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Library,
    Playlists,
    PlaylistDetail,
}

#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub mode: PlaybackMode,
    pub album_index: usize,
    pub track_index: usize,
    pub playlist_track_index: usize,
    pub transport: Transport,
    pub volume: f32,
    /// Frame time the current stretch of playback began; `None` unless playing.
    pub started_at: Option<Instant>,
    /// Playback time accumulated before `started_at`.
    pub elapsed_offset: Duration,
    pub duration: Duration,
    pub media_loaded: bool,
    pub background_alpha: u8,
}

impl PlaybackState {
    pub fn new(volume: f32, default_duration: Duration) -> Self {
        Self {
            mode: PlaybackMode::Library,
            album_index: 0,
            track_index: 0,
            playlist_track_index: 0,
            transport: Transport::Stopped,
            volume: volume.clamp(0.0, 1.0),
            started_at: None,
            elapsed_offset: Duration::ZERO,
            duration: default_duration,
            media_loaded: false,
            background_alpha: u8::MAX,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.transport == Transport::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_compare_by_identity_not_fields() {
        let a = Track {
            id: TrackId::new(0, 0),
            name: String::from("same"),
            location: PathBuf::from("same.mp3"),
            album: Some(0),
        };
        let b = Track {
            id: TrackId::new(1, 0),
            ..a.clone()
        };
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn playback_state_clamps_initial_volume() {
        let state = PlaybackState::new(3.0, Duration::from_secs(180));
        assert_eq!(state.volume, 1.0);
        assert_eq!(state.transport, Transport::Stopped);
    }
}
