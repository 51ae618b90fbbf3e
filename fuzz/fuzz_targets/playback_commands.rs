#![no_main]

use libfuzzer_sys::fuzz_target;
use lumatune::audio::NullAudioBackend;
use lumatune::catalog::{Catalog, ManifestAlbum, ManifestTrack};
use lumatune::core::PlayerCore;
use lumatune::model::{PlaybackMode, TrackId};
use std::time::{Duration, Instant};

fuzz_target!(|data: &[u8]| {
    let albums = (0..(data.len() % 4))
        .map(|album| ManifestAlbum {
            title: format!("album_{album}"),
            artist: format!("artist_{}", album % 2),
            artwork: format!("art_{album}.png"),
            tracks: (0..(album * 2 % 5))
                .map(|track| ManifestTrack {
                    name: format!("track_{track}"),
                    location: format!("track_{album}_{track}.mp3"),
                })
                .collect(),
        })
        .collect();
    let mut core = PlayerCore::with_catalog(Catalog::from_manifest(albums, None));
    let mut audio = NullAudioBackend::new();
    let start = Instant::now();

    for (step, byte) in data.iter().enumerate() {
        let arg = usize::from(byte >> 4);
        match byte % 12 {
            0 => core.next(&mut audio),
            1 => core.previous(&mut audio),
            2 => core.toggle_pause(&mut audio),
            3 => core.tick(start + Duration::from_secs(step as u64 * 40), &mut audio),
            4 => core.select_library_track(arg % 4, arg, &mut audio),
            5 => {
                core.show_playlists();
                core.toggle_create_mode();
                core.edit_name('x');
                core.confirm_create();
            }
            6 => {
                if let Some(id) = core.playlists.iter().nth(arg % 3).map(|p| p.id) {
                    core.select_playlist(id);
                }
            }
            7 => {
                core.toggle_pending(TrackId::new(arg % 4, arg % 5));
                core.commit_pending();
            }
            8 => core.play_playlist(&mut audio),
            9 => {
                if let Some(id) = core.viewed_playlist() {
                    core.remove_playlist_track(id, arg % 4, &mut audio);
                }
            }
            10 => {
                if let Some(id) = core.playlists.iter().nth(arg % 3).map(|p| p.id) {
                    core.delete_playlist(id, &mut audio);
                }
            }
            _ => core.seek(f32::from(*byte) / 128.0 - 0.5, &mut audio),
        }

        assert!((0.0..=1.0).contains(&core.playback.volume));
        if let PlaybackMode::Playlist(id) = core.playback.mode {
            assert!(core.playlists.get(id).is_some_and(|p| !p.is_empty()));
        }
    }
});
