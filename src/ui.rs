use crate::model::Game;
use crate::player::PlayerCore;
use crate::visualizer::Visualizer;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

const APP_TITLE: &str = "Hallownest Radio  ";
const TAGLINE: &str = "Chill vibes from the depths of Hallownest";
const PLAYLIST_WIDTH: u16 = 44;

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    hollow: Color,
    silksong: Color,
    alert: Color,
    selected_bg: Color,
    popup_bg: Color,
    popup_selected_bg: Color,
    mote: Color,
}

fn palette() -> Palette {
    Palette {
        bg: Color::Rgb(12, 12, 18),
        panel_bg: Color::Rgb(20, 21, 30),
        panel_alt_bg: Color::Rgb(26, 27, 38),
        border: Color::Rgb(90, 96, 128),
        text: Color::Rgb(226, 228, 240),
        muted: Color::Rgb(140, 146, 170),
        hollow: Color::Rgb(240, 150, 70),
        silksong: Color::Rgb(110, 160, 250),
        alert: Color::Rgb(246, 196, 110),
        selected_bg: Color::Rgb(45, 48, 70),
        popup_bg: Color::Rgb(22, 23, 34),
        popup_selected_bg: Color::Rgb(55, 58, 86),
        mote: Color::Rgb(60, 62, 84),
    }
}

fn game_color(game: Game, colors: &Palette) -> Color {
    match game {
        Game::HollowKnight => colors.hollow,
        Game::Silksong => colors.silksong,
    }
}

/// Rect of the playlist overlay, for mouse hit testing.
pub fn playlist_rect(area: Rect) -> Rect {
    let width = PLAYLIST_WIDTH.min(area.width);
    Rect {
        x: area.width.saturating_sub(width),
        y: 0,
        width,
        height: area.height,
    }
}

pub fn draw(frame: &mut Frame, core: &PlayerCore, visualizer: &Visualizer, phase: u64) {
    let colors = palette();
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, core, &colors, vertical[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(vertical[1]);

    draw_track_info(frame, core, &colors, body[0]);
    draw_visualizer(frame, core, visualizer, &colors, phase, body[1]);
    draw_timeline(frame, core, &colors, vertical[2]);
    draw_footer(frame, core, &colors, vertical[3]);

    if core.show_playlist {
        draw_playlist(frame, core, &colors);
    }
}

fn draw_header(frame: &mut Frame, core: &PlayerCore, colors: &Palette, area: Rect) {
    frame.render_widget(
        panel_block("Status", colors.panel_bg, colors.text, colors.border),
        area,
    );

    let inner = area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    });
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(inner);

    let flags = format!(
        "Repeat {}  Shuffle {}",
        if core.repeat { "on" } else { "off" },
        if core.shuffle { "on" } else { "off" },
    );
    let left = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::default()
                .fg(colors.hollow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Tracks {}", core.tracks.len()),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(flags, Style::default().fg(colors.alert)),
    ]));
    frame.render_widget(left, chunks[0]);

    let right = Paragraph::new(Span::styled(TAGLINE, Style::default().fg(colors.muted)))
        .alignment(Alignment::Right);
    frame.render_widget(right, chunks[1]);
}

fn draw_track_info(frame: &mut Frame, core: &PlayerCore, colors: &Palette, area: Rect) {
    let lines = match core.current_track() {
        Some(track) => vec![
            Line::from(vec![
                Span::styled(
                    if core.playing { "|> " } else { "|| " },
                    Style::default().fg(colors.alert),
                ),
                Span::styled(
                    track.title.clone(),
                    Style::default()
                        .fg(colors.text)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                track.artist.clone(),
                Style::default().fg(colors.muted),
            )),
            Line::from(Span::styled(
                format!("[{}]", track.game.label()),
                Style::default().fg(game_color(track.game, colors)),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "Track {}/{}",
                    core.current.map(|index| index + 1).unwrap_or(0),
                    core.tracks.len()
                ),
                Style::default().fg(colors.muted),
            )),
        ],
        None => vec![
            Line::from(""),
            Line::from(Span::styled(
                "Loading playlist...",
                Style::default().fg(colors.muted),
            )),
        ],
    };

    let info = Paragraph::new(lines)
        .block(panel_block(
            "Now Playing",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(info, area);
}

/// Bar columns built from block glyphs, over a field of dim drifting
/// motes. Two-cell bars with a one-cell gap, centered.
fn draw_visualizer(
    frame: &mut Frame,
    core: &PlayerCore,
    visualizer: &Visualizer,
    colors: &Palette,
    phase: u64,
    area: Rect,
) {
    let block = panel_block("Visualizer", colors.panel_bg, colors.text, colors.border);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let bars = visualizer.bars();
    let width = inner.width as usize;
    let height = inner.height as usize;
    let bar_count = bars.len().min((width / 3).max(1));
    let used = bar_count * 3 - 1;
    let padding = width.saturating_sub(used) / 2;

    let bar_color = core
        .current_track()
        .map(|track| game_color(track.game, colors))
        .unwrap_or(colors.hollow);

    let mut lines = Vec::with_capacity(height);
    for row in 0..height {
        let threshold = 1.0 - (row as f64 + 0.5) / height as f64;
        let mut spans = Vec::new();
        if padding > 0 {
            spans.push(mote_span(0, row, padding, phase, colors));
        }
        for (column, bar) in bars.iter().take(bar_count).enumerate() {
            let glyph = if *bar >= threshold {
                "██"
            } else if *bar >= threshold - 0.04 {
                "▓▓"
            } else if *bar >= threshold - 0.08 {
                "▒▒"
            } else {
                ""
            };
            if glyph.is_empty() {
                spans.push(mote_span(padding + column * 3, row, 2, phase, colors));
            } else {
                spans.push(Span::styled(glyph, Style::default().fg(bar_color)));
            }
            if column + 1 < bar_count {
                spans.push(mote_span(padding + column * 3 + 2, row, 1, phase, colors));
            }
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Sparse decorative background: a cell carries a mote when a small
/// hash of its position and the animation phase lands on zero, so the
/// field slowly drifts as frames advance.
fn mote_span(x: usize, y: usize, width: usize, phase: u64, colors: &Palette) -> Span<'static> {
    let mut cell = String::with_capacity(width);
    for offset in 0..width {
        let column = (x + offset) as u64;
        let row = y as u64;
        let drift = (row + phase / 6) % 97;
        cell.push(if (column * 31 + drift * 17 + column * row) % 53 == 0 {
            '·'
        } else {
            ' '
        });
    }
    Span::styled(cell, Style::default().fg(colors.mote))
}

fn draw_timeline(frame: &mut Frame, core: &PlayerCore, colors: &Palette, area: Rect) {
    let duration = core
        .current_track()
        .and_then(|track| track.duration_seconds);
    let ratio = (core.progress_percent / 100.0).clamp(0.0, 1.0);

    let volume_marker = if core.muted { " [muted]" } else { "" };
    let text = format!(
        "{} / {} {}  |  Vol {} {:>3}%{}",
        format_time(core.current_time),
        duration.map(format_time).unwrap_or_else(|| String::from("--:--")),
        progress_bar(duration.map(|_| ratio), 26),
        progress_bar(Some(f64::from(core.effective_volume())), 12),
        core.volume,
        volume_marker,
    );

    let timeline = Paragraph::new(Span::styled(text, Style::default().fg(colors.text)))
        .block(panel_block(
            "Timeline",
            colors.panel_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(timeline, area);
}

fn draw_footer(frame: &mut Frame, core: &PlayerCore, colors: &Palette, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "Keys: Space play, <-/-> skip, ^/v volume, m mute, r repeat, s shuffle, 0-9 seek, l playlist, q quit",
            Style::default().fg(colors.muted),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
    ]))
    .block(panel_block(
        "Message",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(footer, area);
}

fn draw_playlist(frame: &mut Frame, core: &PlayerCore, colors: &Palette) {
    let popup = playlist_rect(frame.area());
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = core
        .tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let marker = if Some(index) == core.current {
                " > "
            } else {
                "   "
            };
            let duration = track
                .duration_seconds
                .map(format_time)
                .unwrap_or_else(|| String::from("--:--"));
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.alert)),
                Span::styled(track.title.clone(), Style::default().fg(colors.text)),
                Span::styled(
                    format!("  [{}]", track.game.label()),
                    Style::default().fg(game_color(track.game, colors)),
                ),
                Span::styled(format!("  {duration}"), Style::default().fg(colors.muted)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select((!core.tracks.is_empty()).then_some(core.playlist_cursor));

    let title = format!("Playlist - {} tracks", core.tracks.len());
    let list = List::new(items)
        .block(panel_block(
            &title,
            colors.popup_bg,
            colors.text,
            colors.border,
        ))
        .highlight_style(
            Style::default()
                .bg(colors.popup_selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, popup, &mut state);

    let hint_area = Rect {
        x: popup.x.saturating_add(2),
        y: popup.y.saturating_add(popup.height.saturating_sub(2)),
        width: popup.width.saturating_sub(4),
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            "Enter play, Esc close",
            Style::default().fg(colors.muted),
        )),
        hint_area,
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

/// `m:ss`, matching the player's time readout.
fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return String::from("--:--");
    }
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn progress_bar(ratio: Option<f64>, width: usize) -> String {
    let clamped = ratio.unwrap_or(0.0).clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width.saturating_sub(filled)));
    bar.push(']');
    bar
}
