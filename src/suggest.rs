use crate::catalog::Catalog;
use crate::model::TrackId;

const BEST_OF_ALBUMS: usize = 5;
const ARTIST_MIN_TRACKS: usize = 3;
const ARTIST_MAX_TRACKS: usize = 8;
const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub name: String,
    pub tracks: Vec<TrackId>,
}

/// Playlists derived from the catalog that the user can adopt.
pub fn suggestions(catalog: &Catalog) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if catalog.len() >= 2 {
        let tracks: Vec<TrackId> = catalog
            .albums()
            .iter()
            .take(BEST_OF_ALBUMS)
            .filter_map(|album| album.tracks.first().map(|track| track.id))
            .collect();
        if !tracks.is_empty() {
            out.push(Suggestion {
                name: String::from("Best of Your Collection"),
                tracks,
            });
        }
    }

    let mut by_artist: Vec<(&str, Vec<TrackId>)> = Vec::new();
    for album in catalog.albums() {
        let ids = album.tracks.iter().map(|track| track.id);
        match by_artist
            .iter()
            .position(|(artist, _)| *artist == album.artist)
        {
            Some(idx) => by_artist[idx].1.extend(ids),
            None => by_artist.push((album.artist.as_str(), ids.collect())),
        }
    }

    for (artist, mut tracks) in by_artist {
        if tracks.len() < ARTIST_MIN_TRACKS {
            continue;
        }
        tracks.truncate(ARTIST_MAX_TRACKS);
        out.push(Suggestion {
            name: format!("{artist} Collection"),
            tracks,
        });
    }

    out.truncate(MAX_SUGGESTIONS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ManifestAlbum, ManifestTrack};

    fn album(title: &str, artist: &str, tracks: usize) -> ManifestAlbum {
        ManifestAlbum {
            title: title.to_string(),
            artist: artist.to_string(),
            artwork: format!("{title}.png"),
            tracks: (0..tracks)
                .map(|n| ManifestTrack {
                    name: format!("{title} {n}"),
                    location: format!("{title}_{n}.wav"),
                })
                .collect(),
        }
    }

    #[test]
    fn single_album_gets_no_best_of() {
        let catalog = Catalog::from_manifest(vec![album("a", "x", 2)], None);
        assert!(suggestions(&catalog).is_empty());
    }

    #[test]
    fn best_of_takes_first_track_of_first_five_albums() {
        let entries = (0..7).map(|n| album(&format!("a{n}"), &format!("artist{n}"), 1));
        let catalog = Catalog::from_manifest(entries.collect(), None);
        let found = suggestions(&catalog);
        assert_eq!(found[0].name, "Best of Your Collection");
        assert_eq!(found[0].tracks.len(), 5);
        assert_eq!(found[0].tracks[4], TrackId::new(4, 0));
    }

    #[test]
    fn artist_collection_spans_albums_and_caps_length() {
        let catalog = Catalog::from_manifest(
            vec![album("a", "Miles", 5), album("b", "Miles", 5), album("c", "Bill", 2)],
            None,
        );
        let found = suggestions(&catalog);
        let miles = found
            .iter()
            .find(|s| s.name == "Miles Collection")
            .expect("artist suggestion");
        assert_eq!(miles.tracks.len(), 8);
        assert_eq!(miles.tracks[5], TrackId::new(1, 0));
        assert!(found.iter().all(|s| s.name != "Bill Collection"));
    }

    #[test]
    fn at_most_three_suggestions() {
        let entries = (0..5).map(|n| album(&format!("a{n}"), &format!("artist{n}"), 3));
        let catalog = Catalog::from_manifest(entries.collect(), None);
        assert_eq!(suggestions(&catalog).len(), 3);
    }
}
