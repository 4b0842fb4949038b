//! Key event handling

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::{Overlay, Section};
use crate::service::EngineCommand;
use super::ScreenController;

impl ScreenController {
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.request_quit();
            return;
        }

        if let Some(overlay) = self.overlay.take() {
            self.handle_overlay_key(overlay, key);
            return;
        }

        if self.search.open {
            self.handle_search_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.request_quit(),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.publish_refresh_tracks();
            }
            KeyCode::Esc => {
                self.toast = None;
                if let Some(page) = self.active_page_mut() {
                    page.dismiss_selection_mode();
                }
            }
            KeyCode::Char('/') => self.open_search(),
            KeyCode::Tab => self.next_tab(),
            KeyCode::BackTab => self.previous_tab(),
            KeyCode::Right => self.swipe(1),
            KeyCode::Left => self.swipe(-1),
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.select_tab(index);
            }
            KeyCode::Up => self.move_page_selection(-1),
            KeyCode::Down => self.move_page_selection(1),
            KeyCode::PageUp => self.move_page_selection(-10),
            KeyCode::PageDown => self.move_page_selection(10),
            KeyCode::Char('v') => {
                if let Some(page) = self.active_page_mut() {
                    page.toggle_selection_mode();
                }
            }
            KeyCode::Char(' ') => {
                let marked = self.active_page_mut().is_some_and(|page| page.toggle_mark());
                if !marked {
                    self.send_command(EngineCommand::TogglePlayback);
                }
            }
            KeyCode::Char('>') => self.send_command(EngineCommand::Next),
            KeyCode::Char('<') => self.send_command(EngineCommand::Previous),
            KeyCode::Char('s') => self.request_sort(),
            KeyCode::Char('t') => self.show_sleep_picker(),
            KeyCode::Char('x') => self.stop_sleep_timer(),
            KeyCode::Char('n') if self.playlist_actions_available() => self.begin_new_playlist(),
            KeyCode::Char('f') if self.playlist_actions_available() => self.begin_playlist_from_folder(),
            KeyCode::Char('d') => self.delete_selected_track(),
            KeyCode::Char('o') => self.open_settings(),
            KeyCode::Char('?') => self.overlay = Some(Overlay::Help),
            _ => {}
        }
    }

    fn move_page_selection(&mut self, delta: isize) {
        if let Some(page) = self.active_page_mut() {
            page.move_selection(delta);
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.close_search(),
            KeyCode::Backspace => {
                let mut query = self.search.query.clone();
                query.pop();
                self.search_query_changed(&query);
            }
            KeyCode::Char(c) => {
                let query = format!("{}{}", self.search.query, c);
                self.search_query_changed(&query);
            }
            KeyCode::Up => self.move_page_selection(-1),
            KeyCode::Down => self.move_page_selection(1),
            KeyCode::Tab => self.next_tab(),
            KeyCode::BackTab => self.previous_tab(),
            _ => {}
        }
    }

    /// The overlay has already been taken out; put it back to keep it open.
    fn handle_overlay_key(&mut self, overlay: Overlay, key: KeyEvent) {
        match overlay {
            Overlay::Help => {
                if !matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?')) {
                    self.overlay = Some(Overlay::Help);
                }
            }
            Overlay::SleepPicker { options, mut selected } => match key.code {
                KeyCode::Up => {
                    selected = selected.saturating_sub(1);
                    self.overlay = Some(Overlay::SleepPicker { options, selected });
                }
                KeyCode::Down => {
                    selected = (selected + 1).min(options.len().saturating_sub(1));
                    self.overlay = Some(Overlay::SleepPicker { options, selected });
                }
                KeyCode::Enter => {
                    if let Some(option) = options.get(selected) {
                        self.choose_sleep_option(option.seconds);
                    }
                }
                KeyCode::Esc => {}
                _ => self.overlay = Some(Overlay::SleepPicker { options, selected }),
            },
            Overlay::CustomSleep { mut input } => match key.code {
                KeyCode::Enter => self.submit_custom_sleep(&input),
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    input.pop();
                    self.overlay = Some(Overlay::CustomSleep { input });
                }
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    input.push(c);
                    self.overlay = Some(Overlay::CustomSleep { input });
                }
                _ => self.overlay = Some(Overlay::CustomSleep { input }),
            },
            Overlay::PlaylistName { mut input, pending } => match key.code {
                KeyCode::Enter => self.submit_playlist_name(&input, pending),
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    input.pop();
                    self.overlay = Some(Overlay::PlaylistName { input, pending });
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    self.overlay = Some(Overlay::PlaylistName { input, pending });
                }
                _ => self.overlay = Some(Overlay::PlaylistName { input, pending }),
            },
            Overlay::FolderPicker { folders, mut selected } => match key.code {
                KeyCode::Up => {
                    selected = selected.saturating_sub(1);
                    self.overlay = Some(Overlay::FolderPicker { folders, selected });
                }
                KeyCode::Down => {
                    selected = (selected + 1).min(folders.len().saturating_sub(1));
                    self.overlay = Some(Overlay::FolderPicker { folders, selected });
                }
                KeyCode::Enter => {
                    if let Some(folder) = folders.get(selected).cloned() {
                        self.create_playlist_from_folder(folder);
                    }
                }
                KeyCode::Esc => {}
                _ => self.overlay = Some(Overlay::FolderPicker { folders, selected }),
            },
            Overlay::Settings { mut mask, mut selected } => {
                let sections = self.settings_sections();
                match key.code {
                    KeyCode::Up => selected = selected.saturating_sub(1),
                    KeyCode::Down => selected = (selected + 1).min(sections.len().saturating_sub(1)),
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        if let Some(section) = sections.get(selected) {
                            mask = self.toggle_section_visibility(mask, *section);
                        }
                    }
                    KeyCode::Esc | KeyCode::Char('o') => {
                        self.close_settings();
                        return;
                    }
                    _ => {}
                }
                self.overlay = Some(Overlay::Settings { mask, selected });
            }
        }
    }

    /// Sections the settings overlay can toggle
    pub(crate) fn settings_sections(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| *section != Section::Folders || self.folders_supported())
            .collect()
    }
}
