//! Sleep timer line and current track bar

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::model::MiniPlayer;
use super::utils::format_duration;

pub fn render_sleep_timer(frame: &mut Frame, area: Rect, remaining_seconds: u32, accent: Color) {
    let line = Line::from(vec![
        Span::styled(" ☾ Sleep in ", Style::default().fg(accent)),
        Span::styled(
            format_duration(remaining_seconds),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  (x to cancel)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

pub fn render_current_track(frame: &mut Frame, area: Rect, player: &MiniPlayer, text: Color, accent: Color) {
    let Some(track) = &player.track else {
        return;
    };

    let status = if player.is_playing { " ▶ " } else { " ⏸ " };
    let title = format!("{}{} ", status, track.title);
    let info = format!(
        "{} ({})  {}",
        track.artist,
        track.album,
        format_duration(track.duration_secs)
    );

    let bar = Paragraph::new(info).style(Style::default().fg(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
            .title_bottom(Line::from(" Space play/pause | < > skip ").right_aligned())
            .border_style(Style::default().fg(accent)),
    );
    frame.render_widget(bar, area);
}
