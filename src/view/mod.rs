//! View module - UI rendering
//!
//! This module handles all UI rendering for the main screen using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (formatting, scrollable lists)
//! - `layout`: Tab bar and search bar
//! - `pages`: Library pages shown under the tab bar
//! - `bars`: Sleep timer line and current track bar
//! - `overlays`: Modal overlays (pickers, prompts, settings, help, toasts)

mod utils;
mod layout;
mod pages;
mod bars;
mod overlays;

pub use pages::{ListPage, PageView};

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::controller::ScreenController;
use crate::model::Overlay;

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, screen: &mut ScreenController) {
        let (text, accent) = screen.colors;
        let show_sleep = screen.sleep_timer.is_armed();
        let show_player = screen.mini_player.is_visible();

        let mut constraints = vec![Constraint::Length(3)]; // Tabs
        if screen.search.open {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(0)); // Active page
        if show_sleep {
            constraints.push(Constraint::Length(1));
        }
        if show_player {
            constraints.push(Constraint::Length(3));
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(frame.area());
        let mut next = 0;
        let mut take = || {
            next += 1;
            chunks[next - 1]
        };

        layout::render_tab_bar(frame, take(), screen.registry.sections(), screen.pager.selected_tab(), text, accent);

        if screen.search.open {
            layout::render_search_bar(frame, take(), &screen.search.query, accent);
        }

        let page_area = take();
        let focused = screen.overlay.is_none() && !screen.search.open;
        let hint = if screen.registry.is_empty() {
            " Every tab is hidden, press o to choose some"
        } else {
            " Nothing to show here, pick a tab"
        };
        match screen.active_page_mut() {
            Some(page) => page.render(frame, page_area, focused),
            None => {
                let placeholder = Paragraph::new(hint)
                    .style(Style::default().fg(text))
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(placeholder, page_area);
            }
        }

        if let Some(remaining) = screen.sleep_timer.remaining_seconds() {
            bars::render_sleep_timer(frame, take(), remaining, accent);
        }

        if show_player {
            bars::render_current_track(frame, take(), &screen.mini_player, text, accent);
        }

        match &screen.overlay {
            Some(Overlay::Help) => overlays::render_help_popup(frame),
            Some(Overlay::SleepPicker { options, selected }) => {
                overlays::render_sleep_picker(frame, options, *selected, accent)
            }
            Some(Overlay::CustomSleep { input }) => {
                overlays::render_text_prompt(frame, " Sleep in how many minutes? ", input, accent)
            }
            Some(Overlay::PlaylistName { input, pending }) => {
                let title = match pending {
                    Some(pending) => format!(" Name for playlist of {} tracks ", pending.tracks.len()),
                    None => " New playlist name ".to_string(),
                };
                overlays::render_text_prompt(frame, &title, input, accent)
            }
            Some(Overlay::FolderPicker { folders, selected }) => {
                overlays::render_folder_picker(frame, folders, *selected, accent)
            }
            Some(Overlay::Settings { mask, selected }) => {
                let sections = screen.settings_sections();
                overlays::render_settings(frame, &sections, *mask, *selected, accent)
            }
            None => {}
        }

        if let Some(toast) = &screen.toast {
            overlays::render_toast(frame, toast);
        }
    }
}
