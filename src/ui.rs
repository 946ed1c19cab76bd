use crate::audio::AudioEngine;
use crate::catalog::LoadStatus;
use crate::core::ReplayCore;
use crate::model::RepeatTarget;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use std::time::Duration;

const APP_TITLE_WITH_VERSION: &str = "Replay v0.1.0  ";

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
    selected_bg: Color,
}

fn palette() -> Palette {
    Palette {
        bg: Color::Rgb(10, 15, 24),
        panel_bg: Color::Rgb(19, 29, 43),
        panel_alt_bg: Color::Rgb(24, 38, 58),
        border: Color::Rgb(69, 121, 176),
        text: Color::Rgb(214, 228, 248),
        muted: Color::Rgb(149, 173, 204),
        accent: Color::Rgb(100, 203, 184),
        alert: Color::Rgb(249, 174, 88),
        selected_bg: Color::Rgb(34, 55, 82),
    }
}

pub fn draw(frame: &mut Frame, core: &ReplayCore, audio: &dyn AudioEngine) {
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

    match core.loader.status() {
        LoadStatus::Succeeded => {
            draw_catalog(frame, core, audio, &colors, vertical[1]);
            draw_timeline(frame, audio, &colors, vertical[2]);
        }
        // No playback controls until the catalog is in: the list and timeline
        // areas carry the loading / error text instead.
        LoadStatus::Idle | LoadStatus::Loading => {
            let notice = Paragraph::new(Span::styled(
                "Loading...",
                Style::default().fg(colors.muted),
            ))
            .block(panel_block("Tracks", colors.panel_bg, colors.text, colors.border));
            frame.render_widget(notice, vertical[1]);
            frame.render_widget(
                panel_block("Timeline", colors.panel_bg, colors.text, colors.border),
                vertical[2],
            );
        }
        LoadStatus::Failed(message) => {
            let notice = Paragraph::new(Span::styled(
                message.as_str(),
                Style::default().fg(colors.alert),
            ))
            .block(panel_block("Tracks", colors.panel_bg, colors.text, colors.border))
            .wrap(Wrap { trim: true });
            frame.render_widget(notice, vertical[1]);
            frame.render_widget(
                panel_block("Timeline", colors.panel_bg, colors.text, colors.border),
                vertical[2],
            );
        }
    }

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "Keys: Enter play, Space pause, n next, r repeat target, +/- volume, Ctrl+C quit",
            Style::default().fg(colors.muted),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
    ]))
    .block(panel_block("Message", colors.panel_bg, colors.text, colors.border));
    frame.render_widget(footer, vertical[3]);
}

fn draw_header(frame: &mut Frame, core: &ReplayCore, colors: &Palette, area: Rect) {
    frame.render_widget(
        panel_block("Status", colors.panel_bg, colors.text, colors.border),
        area,
    );

    let inner = area.inner(Margin {
        vertical: 0,
        horizontal: 1,
    });
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE_WITH_VERSION,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Tracks {}", core.tracks().len()),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            format!("Repeat {}", core.sequencer.repeat_target().label()),
            Style::default().fg(colors.alert),
        ),
    ]));
    frame.render_widget(header, inner);
}

fn draw_catalog(
    frame: &mut Frame,
    core: &ReplayCore,
    audio: &dyn AudioEngine,
    colors: &Palette,
    area: Rect,
) {
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(66), Constraint::Percentage(34)])
        .split(area);

    let active = core.sequencer.active_index();
    let items: Vec<ListItem> = core
        .tracks()
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let marker = if active == Some(index) { "  > " } else { "    " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.accent)),
                Span::styled(track.title.as_str(), Style::default().fg(colors.text)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select((!core.tracks().is_empty()).then_some(core.selected));

    let list = List::new(items)
        .block(panel_block("Tracks", colors.panel_bg, colors.text, colors.border))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, body[0], &mut state);

    let now_playing_title = active
        .and_then(|index| core.title_for(index))
        .unwrap_or("-");
    let play_count = core
        .sequencer
        .play_count()
        .map(|count| format!("{count}/{}", play_count_target_label(core)))
        .unwrap_or_else(|| String::from("-"));
    let paused = if audio.current_track().is_some() && audio.is_paused() {
        "paused"
    } else {
        ""
    };

    let info_text = vec![
        Line::from(vec![
            Span::styled(
                "Now",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {now_playing_title}  {paused}"),
                Style::default().fg(colors.text),
            ),
        ]),
        Line::from(Span::styled(
            format!("Play    {play_count}"),
            Style::default().fg(colors.alert),
        )),
        Line::from(Span::styled(
            format!("Repeat  {}", core.sequencer.repeat_target().label()),
            Style::default().fg(colors.muted),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Manifest  {}", core.loader.source().describe()),
            Style::default().fg(colors.muted),
        )),
    ];
    let info_block = Paragraph::new(info_text)
        .block(panel_block(
            "Now Playing",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(info_block, body[1]);
}

fn play_count_target_label(core: &ReplayCore) -> String {
    match core.sequencer.repeat_target() {
        RepeatTarget::Finite(target) => target.to_string(),
        RepeatTarget::Infinite => String::from("inf"),
    }
}

fn draw_timeline(frame: &mut Frame, audio: &dyn AudioEngine, colors: &Palette, area: Rect) {
    let timeline_block = Paragraph::new(Span::styled(
        timeline_line(audio, 26, 14),
        Style::default().fg(colors.text),
    ))
    .block(panel_block("Timeline", colors.panel_bg, colors.text, colors.border))
    .wrap(Wrap { trim: true });
    frame.render_widget(timeline_block, area);
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

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
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

fn timeline_line(
    audio: &dyn AudioEngine,
    timeline_bar_width: usize,
    volume_bar_width: usize,
) -> String {
    let elapsed = audio.position().unwrap_or(Duration::from_secs(0));
    let total = audio.duration();
    let ratio = total.and_then(|duration| {
        let total_secs = duration.as_secs_f64();
        (total_secs > 0.0).then_some((elapsed.as_secs_f64() / total_secs).clamp(0.0, 1.0))
    });

    let volume_percent = (audio.volume() * 100.0).round() as u16;
    let volume_ratio = f64::from(audio.volume().clamp(0.0, 1.0));

    format!(
        "{} / {} {}  |  Vol {} {:>3}%",
        format_duration(elapsed),
        total
            .map(format_duration)
            .unwrap_or_else(|| String::from("--:--")),
        progress_bar(ratio, timeline_bar_width),
        progress_bar(Some(volume_ratio), volume_bar_width),
        volume_percent
    )
}
