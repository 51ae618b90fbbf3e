use crate::core::PlayerCore;
use crate::hit::{HitAction, HitRegionRegistry, Tier};
use crate::model::{PlaybackMode, PlaylistId, TrackId, Transport, ViewState};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use std::time::Duration;

const APP_TITLE: &str = "lumatune";
const SIDEBAR_WIDTH: u16 = 18;
const TRANSPORT_HEIGHT: u16 = 6;
const ALBUM_COLUMNS: u16 = 4;
const ALBUM_CELL_HEIGHT: u16 = 2;
const BUTTON_WIDTH: u16 = 5;
const TIME_WIDTH: u16 = 6;
const VOLUME_BAR_WIDTH: u16 = 14;

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    playlist: Color,
    selected_bg: Color,
}

const PALETTE: Palette = Palette {
    bg: Color::Rgb(10, 15, 24),
    panel_bg: Color::Rgb(19, 29, 43),
    panel_alt_bg: Color::Rgb(24, 38, 58),
    border: Color::Rgb(69, 121, 176),
    text: Color::Rgb(214, 228, 248),
    muted: Color::Rgb(149, 173, 204),
    accent: Color::Rgb(100, 203, 184),
    alert: Color::Rgb(249, 174, 88),
    playlist: Color::Rgb(156, 186, 255),
    selected_bg: Color::Rgb(34, 55, 82),
};

/// Lays out one frame and records every clickable element in `hits`.
pub fn draw(frame: &mut Frame, core: &PlayerCore, hits: &mut HitRegionRegistry) {
    hits.begin_pass(core.view.kind());
    let colors = PALETTE;
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(TRANSPORT_HEIGHT)])
        .split(frame.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)])
        .split(vertical[0]);

    draw_sidebar(frame, core, hits, body[0], &colors);
    match &core.view {
        ViewState::Library => draw_library(frame, core, hits, body[1], &colors),
        ViewState::Playlists { creating } => {
            draw_playlists(frame, core, hits, body[1], creating.as_deref(), &colors)
        }
        ViewState::PlaylistDetail { playlist, pending } => {
            draw_playlist_detail(frame, core, hits, body[1], *playlist, pending, &colors)
        }
    }
    draw_transport(frame, core, hits, vertical[1], &colors);
}

fn draw_sidebar(
    frame: &mut Frame,
    core: &PlayerCore,
    hits: &mut HitRegionRegistry,
    area: Rect,
    colors: &Palette,
) {
    let block = panel_block(APP_TITLE, colors.panel_alt_bg, colors.accent, colors.border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let entries = [
        ("Library", HitAction::ShowLibrary, matches!(core.view, ViewState::Library)),
        (
            "Playlists",
            HitAction::ShowPlaylists,
            !matches!(core.view, ViewState::Library),
        ),
    ];
    for (index, (label, action, active)) in entries.into_iter().enumerate() {
        let Some(rect) = row(inner, index as u16) else {
            break;
        };
        let style = if active {
            Style::default()
                .fg(colors.accent)
                .bg(colors.selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.text)
        };
        frame.render_widget(Paragraph::new(Span::styled(format!(" {label}"), style)), rect);
        hits.register(Tier::Sidebar, rect, action);
    }
}

fn draw_library(
    frame: &mut Frame,
    core: &PlayerCore,
    hits: &mut HitRegionRegistry,
    area: Rect,
    colors: &Palette,
) {
    let block = panel_block("Library", colors.panel_bg, colors.text, colors.border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if core.catalog.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No albums in the manifest",
                Style::default().fg(colors.muted),
            )),
            inner,
        );
        return;
    }

    let albums = core.catalog.albums();
    let grid_rows = (albums.len() as u16).div_ceil(ALBUM_COLUMNS);
    let grid_height = (grid_rows * ALBUM_CELL_HEIGHT).min(inner.height / 2);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(grid_height),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    let grid = sections[0];
    let cell_width = grid.width / ALBUM_COLUMNS;
    let selected_album = core.playback.album_index;
    for (index, album) in albums.iter().enumerate() {
        let column = index as u16 % ALBUM_COLUMNS;
        let grid_row = index as u16 / ALBUM_COLUMNS;
        let y = grid.y + grid_row * ALBUM_CELL_HEIGHT;
        if y + ALBUM_CELL_HEIGHT > grid.y + grid.height {
            break;
        }
        let cell = Rect::new(grid.x + column * cell_width, y, cell_width, ALBUM_CELL_HEIGHT);
        let title_style = if index == selected_album {
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.text)
        };
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(album.title.as_str(), title_style)),
                Line::from(Span::styled(
                    album.artist.as_str(),
                    Style::default().fg(colors.muted),
                )),
            ]),
            cell,
        );
        hits.register(Tier::Main, cell, HitAction::SelectAlbum(index));
    }

    let Some(album) = core.catalog.album(selected_album) else {
        return;
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("{} - {}", album.title, album.artist),
            Style::default()
                .fg(colors.alert)
                .add_modifier(Modifier::BOLD),
        )),
        sections[1],
    );

    let playing = match core.playback.mode {
        PlaybackMode::Library if core.playback.transport != Transport::Stopped => {
            Some(core.playback.track_index)
        }
        _ => None,
    };
    for (index, track) in album.tracks.iter().enumerate() {
        let Some(rect) = row(sections[2], index as u16) else {
            break;
        };
        let is_playing = playing == Some(index);
        let marker = if is_playing { "> " } else { "  " };
        let style = if is_playing {
            Style::default()
                .fg(colors.accent)
                .bg(colors.selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.text)
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.muted)),
                Span::styled(format!("{:>2}. {}", index + 1, track.name), style),
            ])),
            rect,
        );
        hits.register(
            Tier::Main,
            rect,
            HitAction::SelectTrack {
                album: selected_album,
                track: index,
            },
        );
    }
}

fn draw_playlists(
    frame: &mut Frame,
    core: &PlayerCore,
    hits: &mut HitRegionRegistry,
    area: Rect,
    creating: Option<&str>,
    colors: &Palette,
) {
    let block = panel_block("Playlists", colors.panel_bg, colors.text, colors.border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut line = 0u16;
    if let Some(rect) = row(inner, line) {
        let label = if creating.is_some() {
            "- Create Playlist"
        } else {
            "+ Create Playlist"
        };
        let rect = Rect { width: rect.width.min(20), ..rect };
        frame.render_widget(
            Paragraph::new(Span::styled(
                label,
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            rect,
        );
        hits.register(Tier::Main, rect, HitAction::ToggleCreate);
    }
    line += 1;

    if let Some(buffer) = creating {
        if let Some(rect) = row(inner, line) {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("Name: ", Style::default().fg(colors.muted)),
                    Span::styled(
                        format!("{buffer}_"),
                        Style::default().fg(colors.text).bg(colors.selected_bg),
                    ),
                ])),
                rect,
            );
        }
        line += 1;
        if let Some(rect) = row(inner, line) {
            let create = Rect { width: rect.width.min(8), ..rect };
            let cancel = Rect {
                x: rect.x.saturating_add(10),
                width: rect.width.saturating_sub(10).min(8),
                ..rect
            };
            button(frame, create, "Create", colors.accent);
            button(frame, cancel, "Cancel", colors.alert);
            hits.register(Tier::Main, create, HitAction::ConfirmCreate);
            hits.register(Tier::Main, cancel, HitAction::CancelCreate);
        }
        line += 1;
    }
    line += 1;

    let active = core.playback.mode.playlist();
    if core.playlists.is_empty() {
        if let Some(rect) = row(inner, line) {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "No playlists yet",
                    Style::default().fg(colors.muted),
                )),
                rect,
            );
        }
        line += 1;
    }
    for playlist in core.playlists.iter() {
        let Some(rect) = row(inner, line) else {
            return;
        };
        line += 1;
        let delete = trailing(rect, 8);
        button(frame, delete, "Delete", colors.alert);
        hits.register(Tier::Main, delete, HitAction::DeletePlaylist(playlist.id));

        let style = if active == Some(playlist.id) {
            Style::default()
                .fg(colors.playlist)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.text)
        };
        let label = Rect {
            width: rect.width.saturating_sub(delete.width),
            ..rect
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(playlist.name.as_str(), style),
                Span::styled(
                    format!(
                        "  {} tracks, ~{}",
                        playlist.len(),
                        format_duration(playlist.estimated_duration())
                    ),
                    Style::default().fg(colors.muted),
                ),
            ])),
            label,
        );
        hits.register(Tier::Main, rect, HitAction::OpenPlaylist(playlist.id));
    }

    if core.suggestions().is_empty() {
        return;
    }
    line += 1;
    if let Some(rect) = row(inner, line) {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Suggested for you",
                Style::default()
                    .fg(colors.alert)
                    .add_modifier(Modifier::BOLD),
            )),
            rect,
        );
    }
    line += 1;
    for (index, suggestion) in core.suggestions().iter().enumerate() {
        let Some(rect) = row(inner, line) else {
            return;
        };
        line += 1;
        let add = trailing(rect, 5);
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{}  ({} tracks)", suggestion.name, suggestion.tracks.len()),
                Style::default().fg(colors.muted),
            )),
            Rect {
                width: rect.width.saturating_sub(add.width),
                ..rect
            },
        );
        button(frame, add, "Add", colors.accent);
        hits.register(Tier::Main, add, HitAction::AdoptSuggestion(index));
    }
}

fn draw_playlist_detail(
    frame: &mut Frame,
    core: &PlayerCore,
    hits: &mut HitRegionRegistry,
    area: Rect,
    id: PlaylistId,
    pending: &[TrackId],
    colors: &Palette,
) {
    let Some(playlist) = core.playlists.get(id) else {
        return;
    };
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let back = Rect {
        width: sections[0].width.min(8),
        ..sections[0]
    };
    button(frame, back, "< Back", colors.accent);
    hits.register(Tier::Main, back, HitAction::BackToPlaylists);
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("{}  ({} tracks)", playlist.name, playlist.len()),
            Style::default()
                .fg(colors.playlist)
                .add_modifier(Modifier::BOLD),
        )),
        Rect {
            x: sections[0].x.saturating_add(10),
            width: sections[0].width.saturating_sub(10),
            ..sections[0]
        },
    );

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(sections[1]);

    let picker = panel_block("Add Tracks", colors.panel_bg, colors.text, colors.border);
    let picker_inner = picker.inner(panels[0]);
    frame.render_widget(picker, panels[0]);

    let list_height = picker_inner.height.saturating_sub(1);
    let list_area = Rect {
        height: list_height,
        ..picker_inner
    };
    let mut line = 0u16;
    'albums: for album in core.catalog.albums() {
        let Some(rect) = row(list_area, line) else {
            break;
        };
        line += 1;
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{} - {}", album.title, album.artist),
                Style::default()
                    .fg(colors.alert)
                    .add_modifier(Modifier::BOLD),
            )),
            rect,
        );
        for track in &album.tracks {
            let Some(rect) = row(list_area, line) else {
                break 'albums;
            };
            line += 1;
            let checked = pending.contains(&track.id);
            let in_playlist = playlist.contains(track.id);
            let check = if checked { "[x] " } else { "[ ] " };
            let style = if in_playlist {
                Style::default().fg(colors.muted)
            } else {
                Style::default().fg(colors.text)
            };
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(check, Style::default().fg(colors.accent)),
                    Span::styled(track.name.as_str(), style),
                ])),
                rect,
            );
            hits.register(Tier::Main, rect, HitAction::TogglePending(track.id));
        }
    }

    if picker_inner.height > 0 {
        let commit = Rect {
            y: picker_inner.y + list_height,
            height: 1,
            width: picker_inner.width.min(20),
            ..picker_inner
        };
        button(
            frame,
            commit,
            &format!("Add Selected ({})", pending.len()),
            colors.accent,
        );
        hits.register(Tier::Main, commit, HitAction::CommitPending);
    }

    let tracks = panel_block("Playlist", colors.panel_alt_bg, colors.text, colors.border);
    let tracks_inner = tracks.inner(panels[1]);
    frame.render_widget(tracks, panels[1]);

    if let Some(rect) = row(tracks_inner, 0) {
        let play = Rect { width: rect.width.min(15), ..rect };
        button(frame, play, "Play Playlist", colors.playlist);
        hits.register(Tier::Main, play, HitAction::PlayPlaylist);
    }

    let playing = (core.playback.mode == PlaybackMode::Playlist(id)
        && core.playback.transport != Transport::Stopped)
        .then_some(core.playback.playlist_track_index);
    for (index, track) in playlist.tracks().iter().enumerate() {
        let Some(rect) = row(tracks_inner, index as u16 + 2) else {
            break;
        };
        let remove = trailing(rect, 3);
        let name = core
            .catalog
            .full_name(*track)
            .unwrap_or_else(|| String::from("-"));
        let style = if playing == Some(index) {
            Style::default()
                .fg(colors.accent)
                .bg(colors.selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors.text)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!("{:>2}. {name}", index + 1), style)),
            Rect {
                width: rect.width.saturating_sub(remove.width),
                ..rect
            },
        );
        button(frame, remove, "X", colors.alert);
        hits.register(
            Tier::Main,
            remove,
            HitAction::RemovePlaylistTrack {
                playlist: id,
                index,
            },
        );
    }
}

fn draw_transport(
    frame: &mut Frame,
    core: &PlayerCore,
    hits: &mut HitRegionRegistry,
    area: Rect,
    colors: &Palette,
) {
    let block = panel_block("Now Playing", colors.panel_bg, colors.text, colors.border);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let controls = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Length(BUTTON_WIDTH),
            Constraint::Length(BUTTON_WIDTH),
        ])
        .split(rows[0]);

    let now_playing = core
        .peek_current_track()
        .filter(|_| core.playback.transport != Transport::Stopped)
        .and_then(|track| core.catalog.full_name(track))
        .unwrap_or_else(|| String::from("-"));
    let mode = match core.playback.mode {
        PlaybackMode::Library => String::from("Library"),
        PlaybackMode::Playlist(id) => core
            .playlists
            .get(id)
            .map_or_else(|| String::from("Playlist"), |p| p.name.clone()),
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                now_playing,
                Style::default().fg(colors.text).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  |  ", Style::default().fg(colors.muted)),
            Span::styled(mode, Style::default().fg(colors.playlist)),
        ])),
        controls[0],
    );

    let pause_label = if core.playback.is_playing() { "||" } else { ">" };
    for (rect, label, action) in [
        (controls[1], "|<", HitAction::Previous),
        (controls[2], pause_label, HitAction::TogglePause),
        (controls[3], ">|", HitAction::Next),
    ] {
        button(frame, rect, label, colors.accent);
        hits.register(Tier::Transport, rect, action);
    }

    let timeline = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(TIME_WIDTH),
            Constraint::Min(4),
            Constraint::Length(TIME_WIDTH),
        ])
        .split(rows[1]);
    let elapsed = core.elapsed();
    let duration = core.duration();
    let ratio = (!duration.is_zero()).then(|| elapsed.as_secs_f64() / duration.as_secs_f64());
    frame.render_widget(
        Paragraph::new(Span::styled(
            format_duration(elapsed),
            Style::default().fg(colors.muted),
        )),
        timeline[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            progress_bar(ratio, usize::from(timeline[1].width)),
            Style::default().fg(colors.accent),
        )),
        timeline[1],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            format_duration(duration),
            Style::default().fg(colors.muted),
        ))
        .alignment(Alignment::Right),
        timeline[2],
    );
    hits.register(Tier::Transport, timeline[1], HitAction::Seek);

    let volume_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(VOLUME_BAR_WIDTH),
            Constraint::Length(6),
            Constraint::Min(0),
        ])
        .split(rows[2]);
    let volume = core.playback.volume;
    frame.render_widget(
        Paragraph::new(Span::styled("Vol", Style::default().fg(colors.muted))),
        volume_row[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            progress_bar(Some(f64::from(volume)), usize::from(volume_row[1].width)),
            Style::default().fg(colors.alert),
        )),
        volume_row[1],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("{:>4}%", (volume * 100.0).round() as u16),
            Style::default().fg(colors.text),
        )),
        volume_row[2],
    );
    hits.register(Tier::Transport, volume_row[1], HitAction::Volume);

    if let Some(art) = core.background_art().and_then(|path| path.file_name()) {
        let shade = blend(colors.panel_bg, colors.muted, core.playback.background_alpha);
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("art: {}", art.to_string_lossy()),
                Style::default().fg(shade),
            ))
            .alignment(Alignment::Right),
            volume_row[3],
        );
    }

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                "Space play/pause, n next, b previous, +/- volume, q quit",
                Style::default().fg(colors.muted),
            ),
            Span::styled("  |  ", Style::default().fg(colors.muted)),
            Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
        ])),
        rows[3],
    );
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

fn button(frame: &mut Frame, rect: Rect, label: &str, color: Color) {
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("[{label}]"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        rect,
    );
}

/// Single-line slice of `area` at `index`, or `None` once it runs past the bottom.
fn row(area: Rect, index: u16) -> Option<Rect> {
    (index < area.height).then(|| Rect {
        y: area.y + index,
        height: 1,
        ..area
    })
}

fn trailing(rect: Rect, width: u16) -> Rect {
    let width = width.min(rect.width);
    Rect {
        x: rect.x + rect.width - width,
        width,
        ..rect
    }
}

fn blend(from: Color, to: Color, alpha: u8) -> Color {
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |a: u8, b: u8| {
                let a = u16::from(a);
                let b = u16::from(b);
                let alpha = u16::from(alpha);
                ((a * (255 - alpha) + b * alpha) / 255) as u8
            };
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ => to,
    }
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

fn progress_bar(ratio: Option<f64>, width: usize) -> String {
    let clamped = ratio.unwrap_or(0.0).clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    let mut bar = String::with_capacity(width);
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width.saturating_sub(filled)));
    bar
}
