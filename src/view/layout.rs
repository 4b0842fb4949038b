//! Layout rendering (tab bar, search bar)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph},
    Frame,
};

use crate::model::Section;

pub fn render_tab_bar(
    frame: &mut Frame,
    area: Rect,
    sections: &[Section],
    selected: Option<usize>,
    text: Color,
    accent: Color,
) {
    let mut spans = Vec::with_capacity(sections.len() * 2);
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
        }
        let style = if selected == Some(i) {
            Style::default().fg(accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(text)
        };
        spans.push(Span::styled(format!("{} {}", i + 1, section.label()), style));
    }
    if sections.is_empty() {
        spans.push(Span::styled("No sections enabled (o for settings)", Style::default().fg(Color::DarkGray)));
    }

    let tabs = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Library ")
            .padding(Padding::horizontal(1))
            .border_style(Style::default().fg(accent)),
    );
    frame.render_widget(tabs, area);
}

pub fn render_search_bar(frame: &mut Frame, area: Rect, query: &str, accent: Color) {
    let (search_text, style) = if query.is_empty() {
        ("Type to search...", Style::default().fg(Color::DarkGray))
    } else {
        (query, Style::default().fg(accent))
    };

    let search = Paragraph::new(search_text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search (Esc to close) ")
            .padding(Padding::horizontal(1))
            .border_style(Style::default().fg(accent)),
    );
    frame.render_widget(search, area);
}
