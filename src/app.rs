use crate::audio::{AudioBackend, NullAudioBackend, RodioAudioBackend};
use crate::catalog::Catalog;
use crate::config::Settings;
use crate::core::PlayerCore;
use crate::hit::{self, HitRegionRegistry};
use crate::ui;
use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);
const VOLUME_STEP: f32 = 0.05;

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub settings: Settings,
    pub null_audio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn run(options: AppOptions) -> Result<()> {
    let settings = options.settings;
    let catalog = Catalog::load(&settings.manifest)
        .with_context(|| format!("failed to load manifest {}", settings.manifest.display()))?;
    info!(
        albums = catalog.len(),
        tracks = catalog.track_count(),
        "catalog loaded"
    );
    let mut core = PlayerCore::new(catalog, &settings);
    let mut audio = open_audio(options.null_audio);
    info!(backend = audio.name(), "audio ready");

    core.tick(Instant::now(), &mut *audio);
    if settings.autoplay {
        core.load_and_play(&mut *audio);
    }

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;
    terminal.clear()?;

    let result = frame_loop(&mut terminal, &mut core, &mut *audio);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    audio.stop();
    result
}

fn open_audio(null_audio: bool) -> Box<dyn AudioBackend> {
    if null_audio {
        return Box::new(NullAudioBackend::new());
    }
    match RodioAudioBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(err) => {
            warn!(error = %err, "no audio output, continuing silently");
            Box::new(NullAudioBackend::new())
        }
    }
}

/// Per frame: drain input, tick, then render (which rebuilds the hit regions).
fn frame_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    core: &mut PlayerCore,
    audio: &mut dyn AudioBackend,
) -> Result<()> {
    let mut hits = HitRegionRegistry::new();
    let mut last_draw: Option<Instant> = None;

    loop {
        if event::poll(FRAME_INTERVAL)? {
            loop {
                if handle_event(core, &hits, audio, event::read()?) == Flow::Quit {
                    return Ok(());
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }

        core.tick(Instant::now(), audio);

        if core.dirty || last_draw.is_none_or(|at| at.elapsed() > REDRAW_INTERVAL) {
            terminal.draw(|frame| ui::draw(frame, core, &mut hits))?;
            core.dirty = false;
            last_draw = Some(Instant::now());
        }
    }
}

pub fn handle_event(
    core: &mut PlayerCore,
    hits: &HitRegionRegistry,
    audio: &mut dyn AudioBackend,
    event: Event,
) -> Flow {
    match event {
        Event::Mouse(mouse) => {
            handle_mouse(core, hits, audio, mouse);
            Flow::Continue
        }
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(core, audio, key),
        Event::Resize(..) => {
            core.dirty = true;
            Flow::Continue
        }
        _ => Flow::Continue,
    }
}

fn handle_mouse(
    core: &mut PlayerCore,
    hits: &HitRegionRegistry,
    audio: &mut dyn AudioBackend,
    mouse: MouseEvent,
) {
    if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
        hit::dispatch(core, hits, mouse.column, mouse.row, audio);
    }
}

pub fn handle_key(core: &mut PlayerCore, audio: &mut dyn AudioBackend, key: KeyEvent) -> Flow {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Flow::Quit;
    }

    if core.view.is_creating() {
        match key.code {
            KeyCode::Esc => core.cancel_create(),
            KeyCode::Enter => {
                if core.confirm_create().is_none() {
                    core.set_status("Playlist name cannot be empty");
                }
            }
            KeyCode::Backspace => core.backspace_name(),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                core.edit_name(ch)
            }
            _ => {}
        }
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char(' ') => core.toggle_pause(audio),
        KeyCode::Char('n') => core.next(audio),
        KeyCode::Char('b') => core.previous(audio),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            core.set_volume(core.playback.volume + VOLUME_STEP, audio)
        }
        KeyCode::Char('-') => core.set_volume(core.playback.volume - VOLUME_STEP, audio),
        KeyCode::Char('l') => core.show_library(),
        KeyCode::Char('p') => core.show_playlists(),
        _ => {}
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ManifestAlbum, ManifestTrack};
    use crate::model::{Transport, ViewKind};
    use crossterm::event::KeyEventState;
    use ratatui::backend::TestBackend;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn core() -> PlayerCore {
        let album = ManifestAlbum {
            title: String::from("Album"),
            artist: String::from("Artist"),
            artwork: String::from("cover.png"),
            tracks: (0..3)
                .map(|n| ManifestTrack {
                    name: format!("Song {n}"),
                    location: format!("missing_{n}.wav"),
                })
                .collect(),
        };
        PlayerCore::with_catalog(Catalog::from_manifest(vec![album], None))
    }

    #[test]
    fn transport_shortcuts_drive_the_core() {
        let mut core = core();
        let mut audio = NullAudioBackend::new();

        handle_key(&mut core, &mut audio, press(KeyCode::Char(' ')));
        assert_eq!(core.playback.transport, Transport::Playing);
        handle_key(&mut core, &mut audio, press(KeyCode::Char('n')));
        assert_eq!(core.playback.track_index, 1);
        handle_key(&mut core, &mut audio, press(KeyCode::Char('b')));
        assert_eq!(core.playback.track_index, 0);
        handle_key(&mut core, &mut audio, press(KeyCode::Char('-')));
        assert!((core.playback.volume - 0.95).abs() < f32::EPSILON);
        handle_key(&mut core, &mut audio, press(KeyCode::Char('+')));
        handle_key(&mut core, &mut audio, press(KeyCode::Char('+')));
        assert_eq!(core.playback.volume, 1.0);
    }

    #[test]
    fn quit_keys() {
        let mut core = core();
        let mut audio = NullAudioBackend::new();
        assert_eq!(
            handle_key(&mut core, &mut audio, press(KeyCode::Char('q'))),
            Flow::Quit
        );
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut core, &mut audio, ctrl_c), Flow::Quit);
    }

    #[test]
    fn name_buffer_captures_printable_keys() {
        let mut core = core();
        let mut audio = NullAudioBackend::new();
        handle_key(&mut core, &mut audio, press(KeyCode::Char('p')));
        core.toggle_create_mode();

        for ch in "qn b".chars() {
            assert_eq!(
                handle_key(&mut core, &mut audio, press(KeyCode::Char(ch))),
                Flow::Continue
            );
        }
        handle_key(&mut core, &mut audio, press(KeyCode::Backspace));
        handle_key(&mut core, &mut audio, press(KeyCode::Enter));

        let names: Vec<&str> = core.playlists.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["qn"]);
        assert_eq!(core.playback.transport, Transport::Stopped);
        assert!(!core.view.is_creating());
    }

    #[test]
    fn escape_cancels_name_entry() {
        let mut core = core();
        let mut audio = NullAudioBackend::new();
        core.show_playlists();
        core.toggle_create_mode();
        handle_key(&mut core, &mut audio, press(KeyCode::Char('x')));
        handle_key(&mut core, &mut audio, press(KeyCode::Esc));
        assert!(!core.view.is_creating());
        assert!(core.playlists.is_empty());
    }

    #[test]
    fn release_events_are_ignored() {
        let mut core = core();
        let mut audio = NullAudioBackend::new();
        let hits = HitRegionRegistry::new();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(
            handle_event(&mut core, &hits, &mut audio, Event::Key(release)),
            Flow::Continue
        );
    }

    #[test]
    fn left_click_dispatches_against_last_frame() {
        let mut core = core();
        let mut audio = NullAudioBackend::new();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        let mut hits = HitRegionRegistry::new();
        terminal
            .draw(|frame| ui::draw(frame, &core, &mut hits))
            .expect("draw");

        let playlists = hits
            .regions()
            .iter()
            .find(|region| region.action == crate::hit::HitAction::ShowPlaylists)
            .map(|region| region.rect)
            .expect("sidebar entry");
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: playlists.x,
            row: playlists.y,
            modifiers: KeyModifiers::NONE,
        };
        handle_event(&mut core, &hits, &mut audio, Event::Mouse(click));
        assert_eq!(core.view.kind(), ViewKind::Playlists);

        let right_click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            ..click
        };
        core.show_library();
        handle_event(&mut core, &hits, &mut audio, Event::Mouse(right_click));
        assert_eq!(core.view.kind(), ViewKind::Library);
    }
}
