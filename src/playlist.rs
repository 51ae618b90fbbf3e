use crate::model::{PlaylistId, TrackId};
use std::time::Duration;

/// Display estimate used for a playlist's total length.
pub const ESTIMATED_TRACK_SECONDS: u64 = 180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    tracks: Vec<TrackId>,
}

impl Playlist {
    fn new(id: PlaylistId, name: String) -> Self {
        Self {
            id,
            name,
            tracks: Vec::new(),
        }
    }

    pub fn tracks(&self) -> &[TrackId] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn contains(&self, track: TrackId) -> bool {
        self.tracks.contains(&track)
    }

    pub fn get(&self, index: usize) -> Option<TrackId> {
        self.tracks.get(index).copied()
    }

    /// Returns false when the track was already a member.
    pub fn add_track(&mut self, track: TrackId) -> bool {
        if self.contains(track) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    pub fn remove_track(&mut self, index: usize) -> Option<TrackId> {
        (index < self.tracks.len()).then(|| self.tracks.remove(index))
    }

    pub fn estimated_duration(&self) -> Duration {
        Duration::from_secs(self.tracks.len() as u64 * ESTIMATED_TRACK_SECONDS)
    }
}

#[derive(Debug, Default)]
pub struct PlaylistStore {
    playlists: Vec<Playlist>,
    next_id: u64,
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: &str) -> Option<PlaylistId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let id = PlaylistId(self.next_id);
        self.next_id += 1;
        self.playlists.push(Playlist::new(id, name.to_string()));
        Some(id)
    }

    pub fn delete(&mut self, id: PlaylistId) -> Option<Playlist> {
        let index = self.position(id)?;
        Some(self.playlists.remove(index))
    }

    pub fn get(&self, id: PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|playlist| playlist.id == id)
    }

    pub fn get_mut(&mut self, id: PlaylistId) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|playlist| playlist.id == id)
    }

    pub fn add_track(&mut self, id: PlaylistId, track: TrackId) -> bool {
        self.get_mut(id)
            .is_some_and(|playlist| playlist.add_track(track))
    }

    pub fn remove_track(&mut self, id: PlaylistId, index: usize) -> Option<TrackId> {
        self.get_mut(id)?.remove_track(index)
    }

    pub fn position(&self, id: PlaylistId) -> Option<usize> {
        self.playlists.iter().position(|playlist| playlist.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Playlist> {
        self.playlists.iter()
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_blank_names() {
        let mut store = PlaylistStore::new();
        assert_eq!(store.create("   "), None);
        assert_eq!(store.create(""), None);
        assert!(store.is_empty());

        let id = store.create("  Road trip ").expect("created");
        assert_eq!(store.get(id).expect("playlist").name, "Road trip");
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = PlaylistStore::new();
        let first = store.create("a").expect("a");
        store.delete(first);
        let second = store.create("a").expect("a again");
        assert_ne!(first, second);
    }

    #[test]
    fn add_track_is_idempotent() {
        let mut store = PlaylistStore::new();
        let id = store.create("mix").expect("mix");
        let track = TrackId::new(0, 2);

        assert!(store.add_track(id, track));
        assert!(!store.add_track(id, track));
        assert_eq!(store.get(id).expect("mix").len(), 1);
    }

    #[test]
    fn remove_track_is_bounds_checked() {
        let mut store = PlaylistStore::new();
        let id = store.create("mix").expect("mix");
        store.add_track(id, TrackId::new(0, 0));

        assert_eq!(store.remove_track(id, 3), None);
        assert_eq!(store.remove_track(id, 0), Some(TrackId::new(0, 0)));
        assert!(store.get(id).expect("mix").is_empty());
    }

    #[test]
    fn keeps_insertion_order_and_estimates_duration() {
        let mut store = PlaylistStore::new();
        let a = store.create("a").expect("a");
        store.create("b");
        store.create("c");
        store.add_track(a, TrackId::new(0, 0));
        store.add_track(a, TrackId::new(0, 1));

        let names: Vec<&str> = store.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(
            store.get(a).expect("a").estimated_duration(),
            Duration::from_secs(360)
        );
    }

    proptest::proptest! {
        #[test]
        fn membership_stays_unique(ops in proptest::collection::vec((0usize..3, 0usize..4), 1..64)) {
            let mut store = PlaylistStore::new();
            let id = store.create("p").expect("p");
            for (album, track) in ops {
                store.add_track(id, TrackId::new(album, track));
            }
            let tracks = store.get(id).expect("p").tracks().to_vec();
            let mut deduped = tracks.clone();
            deduped.sort();
            deduped.dedup();
            proptest::prop_assert_eq!(deduped.len(), tracks.len());
        }
    }
}
