//! Overlay rendering (pickers, prompts, settings, help popup, toasts)

use std::path::PathBuf;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::model::{Section, SectionMask, SleepOption, Toast, ToastLevel};
use super::utils::{centered_popup, truncate_string};

fn popup_block(title: impl Into<String>, accent: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(title.into())
        .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black))
}

fn picker_style(is_selected: bool, accent: Color) -> Style {
    if is_selected {
        Style::default()
            .fg(Color::Black)
            .bg(accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_picker(frame: &mut Frame, title: &str, items: Vec<ListItem>, selected: usize, width: u16, accent: Color) {
    let height = items.len() as u16 + 2;
    let popup_area = centered_popup(frame.area(), width, height);
    frame.render_widget(Clear, popup_area);

    let list = List::new(items).block(popup_block(title.to_string(), accent));
    let mut list_state = ListState::default();
    list_state.select(Some(selected));
    frame.render_stateful_widget(list, popup_area, &mut list_state);
}

pub fn render_toast(frame: &mut Frame, toast: &Toast) {
    let area = frame.area();
    let color = match toast.level {
        ToastLevel::Info => Color::Cyan,
        ToastLevel::Warning => Color::Yellow,
        ToastLevel::Error => Color::Red,
    };

    let popup_width = 52.min(area.width.saturating_sub(4));
    let inner_width = popup_width.saturating_sub(4).max(1) as usize;
    let line_count = toast.message.chars().count().div_ceil(inner_width) as u16;
    let popup_height = (2 + line_count.max(1)).min(area.height.saturating_sub(2));

    // Bottom right, above the track bar
    let popup_area = Rect {
        x: area.width.saturating_sub(popup_width + 1),
        y: area.height.saturating_sub(popup_height + 4),
        width: popup_width,
        height: popup_height,
    };
    frame.render_widget(Clear, popup_area);

    let toast_widget = Paragraph::new(toast.message.clone())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: false })
        .block(popup_block(" Esc to dismiss ", color));
    frame.render_widget(toast_widget, popup_area);
}

pub fn render_sleep_picker(frame: &mut Frame, options: &[SleepOption], selected: usize, accent: Color) {
    let items: Vec<ListItem> = options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let text = if option.is_custom() {
                format!("✎ {}", option.label)
            } else {
                format!("☾ {}", option.label)
            };
            ListItem::new(text).style(picker_style(i == selected, accent))
        })
        .collect();

    render_picker(frame, " Sleep Timer (↑↓ Enter Esc) ", items, selected, 36, accent);
}

pub fn render_folder_picker(frame: &mut Frame, folders: &[PathBuf], selected: usize, accent: Color) {
    let width = 60;
    let items: Vec<ListItem> = folders
        .iter()
        .enumerate()
        .map(|(i, folder)| {
            let text = truncate_string(&folder.display().to_string(), width as usize - 4);
            ListItem::new(text).style(picker_style(i == selected, accent))
        })
        .collect();

    render_picker(frame, " Playlist From Folder (↑↓ Enter Esc) ", items, selected, width, accent);
}

pub fn render_settings(frame: &mut Frame, sections: &[Section], mask: SectionMask, selected: usize, accent: Color) {
    let items: Vec<ListItem> = sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let check = if mask.contains(*section) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{} {}", check, section.label())).style(picker_style(i == selected, accent))
        })
        .collect();

    render_picker(frame, " Visible Tabs (Space toggle, Esc) ", items, selected, 40, accent);
}

pub fn render_text_prompt(frame: &mut Frame, title: &str, input: &str, accent: Color) {
    let popup_area = centered_popup(frame.area(), 50, 3);
    frame.render_widget(Clear, popup_area);

    let line = Line::from(vec![
        Span::styled(input.to_string(), Style::default().fg(Color::White)),
        Span::styled("▏", Style::default().fg(accent)),
    ]);
    let prompt = Paragraph::new(line).block(popup_block(title.to_string(), accent));
    frame.render_widget(prompt, popup_area);
}

pub fn render_help_popup(frame: &mut Frame) {
    let keybindings = [
        ("", "── Navigation ──"),
        ("Tab / Shift+Tab", "Next / previous tab"),
        ("← / →", "Swipe between pages"),
        ("1-5", "Jump to tab"),
        ("↑ / ↓", "Move selection"),
        ("/", "Search this page"),
        ("S", "Cycle sort order"),
        ("V", "Selection mode"),
        ("", ""),
        ("", "── Playback ──"),
        ("Space", "Play / Pause (mark in selection mode)"),
        ("> / <", "Next / previous track"),
        ("T", "Sleep timer"),
        ("X", "Stop sleep timer"),
        ("", ""),
        ("", "── Library ──"),
        ("N", "New playlist (Playlists tab)"),
        ("F", "Playlist from folder (Playlists tab)"),
        ("D", "Delete selected track"),
        ("Ctrl+R", "Refresh tracks"),
        ("", ""),
        ("", "── General ──"),
        ("O", "Settings"),
        ("?", "Toggle this help"),
        ("Q", "Quit"),
    ];

    let popup_area = centered_popup(frame.area(), 62, keybindings.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = keybindings
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>18}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    let help_text = Paragraph::new(lines)
        .block(popup_block(" Help (? or Esc to close) ", Color::Cyan))
        .style(Style::default().bg(Color::Black));

    frame.render_widget(help_text, popup_area);
}
