use crate::audio::AudioBackend;
use crate::catalog::Catalog;
use crate::config::Settings;
use crate::model::{
    Direction, PlaybackMode, PlaybackState, PlaylistId, TrackId, Transport, ViewState,
};
use crate::playlist::PlaylistStore;
use crate::suggest::{self, Suggestion};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const BACKGROUND_FADE_STEP: u8 = 5;

/// Application state owned by the frame driver.
///
/// Every mutation happens synchronously inside input handling or [`PlayerCore::tick`];
/// the audio backend is passed alongside rather than owned.
#[derive(Debug)]
pub struct PlayerCore {
    pub catalog: Catalog,
    pub playlists: PlaylistStore,
    pub view: ViewState,
    pub playback: PlaybackState,
    pub status: String,
    pub dirty: bool,
    suggestions: Vec<Suggestion>,
    frame_time: Instant,
    default_duration: Duration,
    restart_threshold: Duration,
}

impl PlayerCore {
    pub fn new(catalog: Catalog, settings: &Settings) -> Self {
        let suggestions = suggest::suggestions(&catalog);
        Self {
            catalog,
            playlists: PlaylistStore::new(),
            view: ViewState::Library,
            playback: PlaybackState::new(settings.volume(), settings.default_duration()),
            status: String::from("Ready"),
            dirty: true,
            suggestions,
            frame_time: Instant::now(),
            default_duration: settings.default_duration(),
            restart_threshold: settings.restart_threshold(),
        }
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self::new(catalog, &Settings::default())
    }

    pub fn frame_time(&self) -> Instant {
        self.frame_time
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// Playlist shown by the detail view, if that view is open.
    pub fn viewed_playlist(&self) -> Option<PlaylistId> {
        match &self.view {
            ViewState::PlaylistDetail { playlist, .. } => Some(*playlist),
            _ => None,
        }
    }

    pub fn pending(&self) -> &[TrackId] {
        match &self.view {
            ViewState::PlaylistDetail { pending, .. } => pending,
            _ => &[],
        }
    }

    /// Resolves the current track, resetting a stale index to the first entry.
    pub fn current_track(&mut self) -> Option<TrackId> {
        match self.playback.mode {
            PlaybackMode::Playlist(id) => {
                let playlist = self.playlists.get(id)?;
                if playlist.is_empty() {
                    return None;
                }
                if self.playback.playlist_track_index >= playlist.len() {
                    self.playback.playlist_track_index = 0;
                }
                playlist.get(self.playback.playlist_track_index)
            }
            PlaybackMode::Library => {
                let album = self.catalog.album(self.playback.album_index)?;
                if album.tracks.is_empty() {
                    return None;
                }
                if self.playback.track_index >= album.tracks.len() {
                    self.playback.track_index = 0;
                }
                album
                    .tracks
                    .get(self.playback.track_index)
                    .map(|track| track.id)
            }
        }
    }

    /// Same resolution as [`PlayerCore::current_track`] without storing the clamp.
    pub fn peek_current_track(&self) -> Option<TrackId> {
        match self.playback.mode {
            PlaybackMode::Playlist(id) => {
                let playlist = self.playlists.get(id)?;
                let index = self.playback.playlist_track_index;
                playlist.get(index).or_else(|| playlist.get(0))
            }
            PlaybackMode::Library => {
                let tracks = &self.catalog.album(self.playback.album_index)?.tracks;
                tracks
                    .get(self.playback.track_index)
                    .or_else(|| tracks.first())
                    .map(|track| track.id)
            }
        }
    }

    /// Steps the active index cyclically; no-op when the active collection is empty.
    pub fn advance(&mut self, direction: Direction) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let index = match self.playback.mode {
            PlaybackMode::Playlist(_) => &mut self.playback.playlist_track_index,
            PlaybackMode::Library => &mut self.playback.track_index,
        };
        *index = (*index as isize + direction.step()).rem_euclid(len as isize) as usize;
    }

    pub fn active_index(&self) -> usize {
        match self.playback.mode {
            PlaybackMode::Playlist(_) => self.playback.playlist_track_index,
            PlaybackMode::Library => self.playback.track_index,
        }
    }

    fn active_len(&self) -> usize {
        match self.playback.mode {
            PlaybackMode::Playlist(id) => self.playlists.get(id).map_or(0, |p| p.len()),
            PlaybackMode::Library => self
                .catalog
                .album(self.playback.album_index)
                .map_or(0, |album| album.tracks.len()),
        }
    }

    pub fn select_library_track(
        &mut self,
        album: usize,
        track: usize,
        audio: &mut dyn AudioBackend,
    ) {
        if album >= self.catalog.len() {
            return;
        }
        self.playback.mode = PlaybackMode::Library;
        self.playback.album_index = album;
        self.playback.track_index = track;
        self.load_and_play(audio);
    }

    pub fn select_album(&mut self, album: usize, audio: &mut dyn AudioBackend) {
        self.select_library_track(album, 0, audio);
    }

    /// Opens the detail view for a playlist with an empty pending selection.
    pub fn select_playlist(&mut self, id: PlaylistId) {
        if self.playlists.get(id).is_none() {
            return;
        }
        self.view = ViewState::PlaylistDetail {
            playlist: id,
            pending: Vec::new(),
        };
        self.dirty = true;
    }

    pub fn play_playlist(&mut self, audio: &mut dyn AudioBackend) {
        let Some(id) = self.viewed_playlist() else {
            return;
        };
        if self.playlists.get(id).is_none_or(|playlist| playlist.is_empty()) {
            self.set_status("Playlist is empty");
            return;
        }
        self.playback.mode = PlaybackMode::Playlist(id);
        self.playback.playlist_track_index = 0;
        self.load_and_play(audio);
    }

    pub fn load_and_play(&mut self, audio: &mut dyn AudioBackend) {
        self.stop_media(audio);

        let Some(track) = self
            .current_track()
            .and_then(|id| self.catalog.track(id))
            .cloned()
        else {
            self.playback.started_at = None;
            self.playback.elapsed_offset = Duration::ZERO;
            self.set_status("No track");
            return;
        };

        if let Err(err) = audio.load(&track.location) {
            warn!(track = %track.name, error = %err, "failed to load track");
            self.playback.started_at = None;
            self.playback.elapsed_offset = Duration::ZERO;
            self.set_status(&format!("playback error: {err}"));
            return;
        }

        audio.play(false);
        audio.set_volume(self.playback.volume);
        self.playback.media_loaded = true;
        self.playback.transport = Transport::Playing;
        self.playback.started_at = Some(self.frame_time);
        self.playback.elapsed_offset = Duration::ZERO;
        self.playback.duration = audio
            .duration()
            .filter(|duration| !duration.is_zero())
            .unwrap_or(self.default_duration);
        self.playback.background_alpha = 0;
        debug!(track = %track.name, duration = ?self.playback.duration, "track loaded");
        self.set_status(&format!("Playing {}", track.name));
    }

    fn stop_media(&mut self, audio: &mut dyn AudioBackend) {
        if self.playback.media_loaded {
            audio.stop();
            self.playback.media_loaded = false;
        }
        self.playback.transport = Transport::Stopped;
    }

    pub fn toggle_pause(&mut self, audio: &mut dyn AudioBackend) {
        match self.playback.transport {
            Transport::Playing => {
                audio.pause();
                self.playback.elapsed_offset = self.raw_elapsed();
                self.playback.started_at = None;
                self.playback.transport = Transport::Paused;
                self.set_status("Paused");
            }
            Transport::Paused => match audio.resume() {
                Ok(()) => {
                    self.playback.started_at = Some(self.frame_time);
                    self.playback.transport = Transport::Playing;
                    self.set_status("Resumed");
                }
                Err(err) => {
                    debug!(error = %err, "resume unavailable, replaying from start");
                    self.load_and_play(audio);
                }
            },
            Transport::Stopped => self.load_and_play(audio),
        }
    }

    /// Per-frame update; the only state change driven by time.
    pub fn tick(&mut self, now: Instant, audio: &mut dyn AudioBackend) {
        self.frame_time = now;
        if self.playback.background_alpha < u8::MAX {
            self.playback.background_alpha = self
                .playback
                .background_alpha
                .saturating_add(BACKGROUND_FADE_STEP);
            self.dirty = true;
        }

        if self.playback.transport != Transport::Playing {
            return;
        }
        if self.raw_elapsed() >= self.playback.duration {
            debug!("track finished, advancing");
            self.advance(Direction::Forward);
            self.load_and_play(audio);
        }
    }

    pub fn next(&mut self, audio: &mut dyn AudioBackend) {
        self.advance(Direction::Forward);
        self.load_and_play(audio);
    }

    pub fn previous(&mut self, audio: &mut dyn AudioBackend) {
        let elapsed = audio.position().unwrap_or_else(|| self.elapsed());
        if self.playback.media_loaded && elapsed > self.restart_threshold {
            self.load_and_play(audio);
            return;
        }
        self.advance(Direction::Backward);
        self.load_and_play(audio);
    }

    pub fn set_volume(&mut self, volume: f32, audio: &mut dyn AudioBackend) {
        if volume.is_nan() {
            return;
        }
        self.playback.volume = volume.clamp(0.0, 1.0);
        audio.set_volume(self.playback.volume);
        self.set_status(&format!(
            "Volume: {}%",
            (self.playback.volume * 100.0).round() as u16
        ));
    }

    /// Seeks to a fraction of the current track; absorbed when the backend cannot seek.
    pub fn seek(&mut self, fraction: f32, audio: &mut dyn AudioBackend) {
        if !self.playback.media_loaded || !fraction.is_finite() {
            return;
        }
        let target = self.playback.duration.mul_f32(fraction.clamp(0.0, 1.0));
        match audio.seek(target) {
            Ok(()) => {
                self.playback.elapsed_offset = target;
                if self.playback.transport == Transport::Playing {
                    self.playback.started_at = Some(self.frame_time);
                }
                self.dirty = true;
            }
            Err(err) => debug!(error = %err, "seek ignored"),
        }
    }

    fn raw_elapsed(&self) -> Duration {
        match self.playback.transport {
            Transport::Stopped => Duration::ZERO,
            Transport::Paused => self.playback.elapsed_offset,
            Transport::Playing => self.playback.elapsed_offset.saturating_add(
                self.playback
                    .started_at
                    .map(|started| self.frame_time.saturating_duration_since(started))
                    .unwrap_or_default(),
            ),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.raw_elapsed().min(self.playback.duration)
    }

    pub fn duration(&self) -> Duration {
        self.playback.duration
    }

    /// Artwork the render layer should fade in behind the current view.
    pub fn background_art(&self) -> Option<&Path> {
        let album = match self.playback.mode {
            PlaybackMode::Library => self.playback.album_index,
            PlaybackMode::Playlist(_) => {
                let track = self.peek_current_track()?;
                self.catalog.track(track)?.album?
            }
        };
        self.catalog
            .album(album)
            .map(|album| album.artwork.as_path())
    }

    pub fn show_library(&mut self) {
        self.view = ViewState::Library;
        self.dirty = true;
    }

    pub fn show_playlists(&mut self) {
        self.view = ViewState::Playlists { creating: None };
        self.dirty = true;
    }

    pub fn back_to_playlists(&mut self) {
        self.show_playlists();
    }

    pub fn toggle_create_mode(&mut self) {
        if let ViewState::Playlists { creating } = &mut self.view {
            *creating = match creating {
                Some(_) => None,
                None => Some(String::new()),
            };
            self.dirty = true;
        }
    }

    pub fn edit_name(&mut self, ch: char) {
        if let ViewState::Playlists {
            creating: Some(buffer),
        } = &mut self.view
        {
            buffer.push(ch);
            self.dirty = true;
        }
    }

    pub fn backspace_name(&mut self) {
        if let ViewState::Playlists {
            creating: Some(buffer),
        } = &mut self.view
        {
            buffer.pop();
            self.dirty = true;
        }
    }

    pub fn confirm_create(&mut self) -> Option<PlaylistId> {
        let ViewState::Playlists {
            creating: Some(buffer),
        } = &self.view
        else {
            return None;
        };
        let id = self.playlists.create(buffer)?;
        self.view = ViewState::Playlists { creating: None };
        info!(playlist = id.raw(), "playlist created");
        self.set_status("Playlist created");
        Some(id)
    }

    pub fn cancel_create(&mut self) {
        if let ViewState::Playlists { creating } = &mut self.view {
            *creating = None;
            self.dirty = true;
        }
    }

    pub fn delete_playlist(&mut self, id: PlaylistId, audio: &mut dyn AudioBackend) {
        if self.playlists.get(id).is_none() {
            return;
        }
        if self.playback.mode == PlaybackMode::Playlist(id) {
            self.revert_to_library(audio);
        }
        if self.viewed_playlist() == Some(id) {
            self.view = ViewState::Playlists { creating: None };
        }
        if let Some(playlist) = self.playlists.delete(id) {
            info!(playlist = id.raw(), name = %playlist.name, "playlist deleted");
            self.set_status(&format!("Deleted playlist {}", playlist.name));
        }
    }

    /// Removes one entry and keeps playback pointed at a consistent track.
    ///
    /// While the playlist is playing: removing the current entry stops it;
    /// removing at or before the current entry moves the index back one
    /// (floored at 0) and reloads; removing after it changes nothing; an
    /// emptied playlist hands playback back to the library.
    pub fn remove_playlist_track(
        &mut self,
        id: PlaylistId,
        index: usize,
        audio: &mut dyn AudioBackend,
    ) {
        let Some(len) = self.playlists.get(id).map(|playlist| playlist.len()) else {
            return;
        };
        if index >= len {
            return;
        }

        let active = self.playback.mode == PlaybackMode::Playlist(id);
        let current = self.playback.playlist_track_index;
        if active && index == current {
            self.stop_media(audio);
        }
        self.playlists.remove_track(id, index);
        self.set_status("Track removed");

        if !active {
            return;
        }
        if self.playlists.get(id).is_some_and(|playlist| playlist.is_empty()) {
            self.revert_to_library(audio);
        } else if index <= current {
            self.playback.playlist_track_index = current.saturating_sub(1);
            self.load_and_play(audio);
        }
    }

    fn revert_to_library(&mut self, audio: &mut dyn AudioBackend) {
        debug!("playlist playback ended, returning to library");
        self.stop_media(audio);
        self.playback.mode = PlaybackMode::Library;
        self.playback.playlist_track_index = 0;
        self.load_and_play(audio);
    }

    pub fn toggle_pending(&mut self, track: TrackId) {
        if self.catalog.track(track).is_none() {
            return;
        }
        if let ViewState::PlaylistDetail { pending, .. } = &mut self.view {
            match pending.iter().position(|candidate| *candidate == track) {
                Some(index) => {
                    pending.remove(index);
                }
                None => pending.push(track),
            }
            self.dirty = true;
        }
    }

    /// Adds every pending track to the viewed playlist; returns how many were new.
    pub fn commit_pending(&mut self) -> usize {
        let ViewState::PlaylistDetail { playlist, pending } = &mut self.view else {
            return 0;
        };
        let id = *playlist;
        let tracks = std::mem::take(pending);
        let added = tracks
            .into_iter()
            .filter(|track| self.playlists.add_track(id, *track))
            .count();
        self.set_status(&format!("Added {added} tracks"));
        added
    }

    pub fn adopt_suggestion(&mut self, index: usize) -> Option<PlaylistId> {
        let suggestion = self.suggestions.get(index)?.clone();
        let id = self.playlists.create(&suggestion.name)?;
        for track in suggestion.tracks {
            self.playlists.add_track(id, track);
        }
        info!(playlist = id.raw(), name = %suggestion.name, "suggestion adopted");
        self.set_status(&format!("Added {} to your playlists", suggestion.name));
        Some(id)
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}
