//! Album/track catalog and the manifest formats it is loaded from.
//!
//! The text manifest is line oriented: album count, then per album the
//! title, artist, artwork path and track count, followed by one
//! name/location line pair per track. The JSON manifest carries the same
//! data as an array of album objects.

use crate::model::{Album, Track, TrackId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest ended early: expected {expected} on line {line}")]
    MissingLine { line: usize, expected: &'static str },
    #[error("invalid {expected} {value:?} on line {line}")]
    BadCount {
        line: usize,
        expected: &'static str,
        value: String,
    },
    #[error("invalid JSON manifest")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTrack {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAlbum {
    pub title: String,
    pub artist: String,
    pub artwork: String,
    pub tracks: Vec<ManifestTrack>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    albums: Vec<Album>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the catalog, assigning every track its identity and album back-reference.
    pub fn from_manifest(entries: Vec<ManifestAlbum>, base: Option<&Path>) -> Self {
        let albums = entries
            .into_iter()
            .enumerate()
            .map(|(album_idx, entry)| Album {
                title: entry.title,
                artist: entry.artist,
                artwork: resolve(base, &entry.artwork),
                tracks: entry
                    .tracks
                    .into_iter()
                    .enumerate()
                    .map(|(track_idx, track)| Track {
                        id: TrackId::new(album_idx, track_idx),
                        name: track.name,
                        location: resolve(base, &track.location),
                        album: Some(album_idx),
                    })
                    .collect(),
            })
            .collect();
        Self { albums }
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = if is_json(path) {
            parse_json(&raw)?
        } else {
            parse_text(&raw)?
        };
        Ok(Self::from_manifest(entries, path.parent()))
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn album(&self, index: usize) -> Option<&Album> {
        self.albums.get(index)
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.albums.get(id.album)?.tracks.get(id.track)
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    pub fn len(&self) -> usize {
        self.albums.len()
    }

    pub fn track_count(&self) -> usize {
        self.albums.iter().map(|album| album.tracks.len()).sum()
    }

    /// `"<artist> - <name>"` when the owning album is known.
    pub fn full_name(&self, id: TrackId) -> Option<String> {
        let track = self.track(id)?;
        Some(
            match track.album.and_then(|album| self.albums.get(album)) {
                Some(album) => format!("{} - {}", album.artist, track.name),
                None => track.name.clone(),
            },
        )
    }
}

pub fn parse_text(raw: &str) -> Result<Vec<ManifestAlbum>, ManifestError> {
    let mut lines = ManifestLines::new(raw);
    let album_count = lines.count("album count")?;
    let mut albums = Vec::with_capacity(album_count.min(1024));
    for _ in 0..album_count {
        let title = lines.text("album title")?;
        let artist = lines.text("album artist")?;
        let artwork = lines.text("artwork path")?;
        let track_count = lines.count("track count")?;
        let mut tracks = Vec::with_capacity(track_count.min(1024));
        for _ in 0..track_count {
            let name = lines.text("track name")?;
            let location = lines.text("track location")?;
            tracks.push(ManifestTrack { name, location });
        }
        albums.push(ManifestAlbum {
            title,
            artist,
            artwork,
            tracks,
        });
    }
    Ok(albums)
}

pub fn parse_json(raw: &str) -> Result<Vec<ManifestAlbum>, ManifestError> {
    Ok(serde_json::from_str(raw)?)
}

/// Rewrites a text manifest as the equivalent JSON manifest.
pub fn convert_text_to_json(input: &Path, output: &Path) -> anyhow::Result<usize> {
    use anyhow::Context;

    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read manifest {}", input.display()))?;
    let albums = parse_text(&raw)
        .with_context(|| format!("failed to parse manifest {}", input.display()))?;
    let json = serde_json::to_string_pretty(&albums)?;
    fs::write(output, json).with_context(|| format!("failed to write {}", output.display()))?;
    Ok(albums.len())
}

struct ManifestLines<'a> {
    lines: std::str::Lines<'a>,
    line: usize,
}

impl<'a> ManifestLines<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            lines: raw.lines(),
            line: 0,
        }
    }

    fn text(&mut self, expected: &'static str) -> Result<String, ManifestError> {
        self.line += 1;
        self.lines
            .next()
            .map(str::to_string)
            .ok_or(ManifestError::MissingLine {
                line: self.line,
                expected,
            })
    }

    fn count(&mut self, expected: &'static str) -> Result<usize, ManifestError> {
        let value = self.text(expected)?;
        value
            .trim()
            .parse::<usize>()
            .map_err(|_| ManifestError::BadCount {
                line: self.line,
                expected,
                value,
            })
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn resolve(base: Option<&Path>, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    match base {
        Some(base) if path.is_relative() && !base.as_os_str().is_empty() => base.join(path),
        _ => path,
    }
}
