//! Clickable regions recorded while a frame is laid out, and the pointer
//! dispatch that resolves a click against them.

use crate::audio::AudioBackend;
use crate::core::PlayerCore;
use crate::model::{PlaylistId, TrackId, ViewKind};
use ratatui::layout::Rect;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Sidebar,
    Main,
    Transport,
}

const DISPATCH_ORDER: [Tier; 3] = [Tier::Sidebar, Tier::Main, Tier::Transport];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitAction {
    ShowLibrary,
    ShowPlaylists,
    SelectAlbum(usize),
    SelectTrack { album: usize, track: usize },
    ToggleCreate,
    ConfirmCreate,
    CancelCreate,
    OpenPlaylist(PlaylistId),
    DeletePlaylist(PlaylistId),
    AdoptSuggestion(usize),
    BackToPlaylists,
    TogglePending(TrackId),
    CommitPending,
    PlayPlaylist,
    RemovePlaylistTrack { playlist: PlaylistId, index: usize },
    Previous,
    TogglePause,
    Next,
    Seek,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRegion {
    pub tier: Tier,
    pub rect: Rect,
    pub action: HitAction,
}

impl HitRegion {
    /// Half-open containment; empty rects never match.
    pub fn contains(&self, x: u16, y: u16) -> bool {
        let rect = self.rect;
        if rect.width == 0 || rect.height == 0 {
            return false;
        }
        x >= rect.x
            && x < rect.x.saturating_add(rect.width)
            && y >= rect.y
            && y < rect.y.saturating_add(rect.height)
    }

    /// Horizontal click position within the region, 0.0 at the left edge and 1.0 at the right.
    pub fn fraction(&self, x: u16) -> f32 {
        if self.rect.width <= 1 {
            return 1.0;
        }
        let offset = x.saturating_sub(self.rect.x).min(self.rect.width - 1);
        f32::from(offset) / f32::from(self.rect.width - 1)
    }
}

#[derive(Debug, Default)]
pub struct HitRegionRegistry {
    regions: Vec<HitRegion>,
    view: Option<ViewKind>,
}

impl HitRegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the previous frame's regions; Main regions registered after this belong to `view`.
    pub fn begin_pass(&mut self, view: ViewKind) {
        self.regions.clear();
        self.view = Some(view);
    }

    pub fn register(&mut self, tier: Tier, rect: Rect, action: HitAction) {
        self.regions.push(HitRegion { tier, rect, action });
    }

    pub fn view(&self) -> Option<ViewKind> {
        self.view
    }

    pub fn regions(&self) -> &[HitRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// First region under the point, honouring tier priority and registration order.
    pub fn resolve(&self, x: u16, y: u16, current: ViewKind) -> Option<&HitRegion> {
        DISPATCH_ORDER.iter().find_map(|tier| {
            if *tier == Tier::Main && self.view != Some(current) {
                return None;
            }
            self.regions
                .iter()
                .filter(|region| region.tier == *tier)
                .find(|region| region.contains(x, y))
        })
    }
}

/// Routes a pointer press to the matching region's action.
///
/// Returns `false` when nothing was hit; such clicks are absorbed.
pub fn dispatch(
    core: &mut PlayerCore,
    registry: &HitRegionRegistry,
    x: u16,
    y: u16,
    audio: &mut dyn AudioBackend,
) -> bool {
    let Some(region) = registry.resolve(x, y, core.view.kind()).copied() else {
        return false;
    };
    debug!(x, y, action = ?region.action, "pointer hit");
    apply(core, region, x, audio);
    true
}

fn apply(core: &mut PlayerCore, region: HitRegion, x: u16, audio: &mut dyn AudioBackend) {
    match region.action {
        HitAction::ShowLibrary => core.show_library(),
        HitAction::ShowPlaylists => core.show_playlists(),
        HitAction::SelectAlbum(album) => core.select_album(album, audio),
        HitAction::SelectTrack { album, track } => core.select_library_track(album, track, audio),
        HitAction::ToggleCreate => core.toggle_create_mode(),
        HitAction::ConfirmCreate => {
            if core.confirm_create().is_none() {
                core.set_status("Playlist name cannot be empty");
            }
        }
        HitAction::CancelCreate => core.cancel_create(),
        HitAction::OpenPlaylist(id) => core.select_playlist(id),
        HitAction::DeletePlaylist(id) => core.delete_playlist(id, audio),
        HitAction::AdoptSuggestion(index) => {
            core.adopt_suggestion(index);
        }
        HitAction::BackToPlaylists => core.back_to_playlists(),
        HitAction::TogglePending(track) => core.toggle_pending(track),
        HitAction::CommitPending => {
            core.commit_pending();
        }
        HitAction::PlayPlaylist => core.play_playlist(audio),
        HitAction::RemovePlaylistTrack { playlist, index } => {
            core.remove_playlist_track(playlist, index, audio)
        }
        HitAction::Previous => core.previous(audio),
        HitAction::TogglePause => core.toggle_pause(audio),
        HitAction::Next => core.next(audio),
        HitAction::Seek => core.seek(region.fraction(x), audio),
        HitAction::Volume => core.set_volume(region.fraction(x), audio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudioBackend;
    use crate::catalog::Catalog;

    fn rect(x: u16, y: u16, width: u16, height: u16) -> Rect {
        Rect::new(x, y, width, height)
    }

    #[test]
    fn containment_is_half_open() {
        let region = HitRegion {
            tier: Tier::Main,
            rect: rect(10, 10, 5, 2),
            action: HitAction::Next,
        };
        assert!(region.contains(10, 10));
        assert!(region.contains(14, 11));
        assert!(!region.contains(15, 10));
        assert!(!region.contains(10, 12));
        assert!(!region.contains(9, 10));
    }

    #[test]
    fn zero_sized_regions_never_match() {
        let mut registry = HitRegionRegistry::new();
        registry.begin_pass(ViewKind::Library);
        registry.register(Tier::Sidebar, rect(0, 0, 0, 4), HitAction::ShowLibrary);
        registry.register(Tier::Sidebar, rect(0, 0, 4, 0), HitAction::ShowPlaylists);
        assert!(registry.resolve(0, 0, ViewKind::Library).is_none());
    }

    #[test]
    fn sidebar_beats_main_beats_transport() {
        let mut registry = HitRegionRegistry::new();
        registry.begin_pass(ViewKind::Library);
        registry.register(Tier::Transport, rect(0, 0, 10, 10), HitAction::Next);
        registry.register(Tier::Main, rect(0, 0, 10, 10), HitAction::SelectAlbum(0));
        registry.register(Tier::Sidebar, rect(0, 0, 5, 5), HitAction::ShowPlaylists);

        let hit = |x, y| registry.resolve(x, y, ViewKind::Library).map(|r| r.action);
        assert_eq!(hit(1, 1), Some(HitAction::ShowPlaylists));
        assert_eq!(hit(7, 7), Some(HitAction::SelectAlbum(0)));
    }

    #[test]
    fn first_registered_wins_within_a_tier() {
        let mut registry = HitRegionRegistry::new();
        registry.begin_pass(ViewKind::Library);
        registry.register(Tier::Main, rect(0, 0, 10, 1), HitAction::SelectAlbum(1));
        registry.register(Tier::Main, rect(0, 0, 10, 1), HitAction::SelectAlbum(2));
        assert_eq!(
            registry.resolve(3, 0, ViewKind::Library).map(|r| r.action),
            Some(HitAction::SelectAlbum(1))
        );
    }

    #[test]
    fn main_regions_from_another_view_are_skipped() {
        let mut registry = HitRegionRegistry::new();
        registry.begin_pass(ViewKind::Library);
        registry.register(Tier::Main, rect(0, 0, 10, 10), HitAction::SelectAlbum(0));
        registry.register(Tier::Transport, rect(0, 0, 10, 10), HitAction::TogglePause);

        assert_eq!(
            registry.resolve(2, 2, ViewKind::Playlists).map(|r| r.action),
            Some(HitAction::TogglePause)
        );
    }

    #[test]
    fn begin_pass_clears_previous_regions() {
        let mut registry = HitRegionRegistry::new();
        registry.begin_pass(ViewKind::Library);
        registry.register(Tier::Sidebar, rect(0, 0, 5, 5), HitAction::ShowLibrary);
        registry.begin_pass(ViewKind::Playlists);
        assert!(registry.is_empty());
        assert_eq!(registry.view(), Some(ViewKind::Playlists));
    }

    #[test]
    fn fraction_spans_edges() {
        let region = HitRegion {
            tier: Tier::Transport,
            rect: rect(20, 0, 11, 1),
            action: HitAction::Volume,
        };
        assert_eq!(region.fraction(20), 0.0);
        assert_eq!(region.fraction(25), 0.5);
        assert_eq!(region.fraction(30), 1.0);

        let single = HitRegion {
            rect: rect(4, 0, 1, 1),
            ..region
        };
        assert_eq!(single.fraction(4), 1.0);
    }

    #[test]
    fn unmatched_click_is_absorbed() {
        let mut core = PlayerCore::with_catalog(Catalog::empty());
        let mut audio = NullAudioBackend::new();
        let mut registry = HitRegionRegistry::new();
        registry.begin_pass(ViewKind::Library);
        registry.register(Tier::Sidebar, rect(0, 0, 5, 1), HitAction::ShowPlaylists);

        assert!(!dispatch(&mut core, &registry, 40, 40, &mut audio));
        assert!(dispatch(&mut core, &registry, 0, 0, &mut audio));
        assert_eq!(core.view.kind(), ViewKind::Playlists);
    }

    #[test]
    fn volume_region_sets_volume_from_click_position() {
        let mut core = PlayerCore::with_catalog(Catalog::empty());
        let mut audio = NullAudioBackend::new();
        let mut registry = HitRegionRegistry::new();
        registry.begin_pass(ViewKind::Library);
        registry.register(Tier::Transport, rect(10, 5, 5, 1), HitAction::Volume);

        assert!(dispatch(&mut core, &registry, 11, 5, &mut audio));
        assert_eq!(core.playback.volume, 0.25);
        assert_eq!(audio.volume(), 0.25);
    }
}
