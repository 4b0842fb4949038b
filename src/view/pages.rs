//! Library pages shown under the tab bar

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Padding},
    Frame,
};

use crate::model::{LibrarySnapshot, Section, Track};
use super::utils::{calculate_num_width, render_scrollable_list, truncate_string};

/// Calls the screen makes into a page. Pages never call back.
pub trait PageView: Send {
    fn section(&self) -> Section;

    /// Rebuild rows from freshly fetched library data
    fn refresh(&mut self, library: &LibrarySnapshot);

    fn set_colors(&mut self, text: Color, accent: Color);

    fn on_search_opened(&mut self);

    fn on_search_closed(&mut self);

    fn on_search_query_changed(&mut self, text: &str);

    fn on_sort_requested(&mut self);

    fn dismiss_selection_mode(&mut self);

    fn move_selection(&mut self, _delta: isize) {}

    fn toggle_selection_mode(&mut self) {}

    /// Marks or unmarks the highlighted row. Returns false outside selection mode.
    fn toggle_mark(&mut self) -> bool {
        false
    }

    fn selected_row(&self) -> Option<&PageRow> {
        None
    }

    fn render(&mut self, _frame: &mut Frame, _area: Rect, _focused: bool) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRow {
    pub title: String,
    pub detail: String,
    pub track: Option<Track>,
    pub folder: Option<PathBuf>,
}

impl PageRow {
    fn plain(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
            track: None,
            folder: None,
        }
    }

    fn key(&self) -> String {
        format!("{}\u{1f}{}", self.title, self.detail)
    }

    fn matches(&self, query: &str) -> bool {
        query.is_empty()
            || self.title.to_lowercase().contains(query)
            || self.detail.to_lowercase().contains(query)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    TitleAscending,
    TitleDescending,
    DetailAscending,
}

impl SortOrder {
    pub fn next(self) -> Self {
        match self {
            Self::TitleAscending => Self::TitleDescending,
            Self::TitleDescending => Self::DetailAscending,
            Self::DetailAscending => Self::TitleAscending,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::TitleAscending => "title ↑",
            Self::TitleDescending => "title ↓",
            Self::DetailAscending => "detail ↑",
        }
    }
}

/// Default page: a filterable, sortable list of rows for one section
pub struct ListPage {
    section: Section,
    rows: Vec<PageRow>,
    visible: Vec<usize>,
    query: String,
    searching: bool,
    sort: SortOrder,
    selected: usize,
    selection_mode: bool,
    marked: BTreeSet<String>,
    text_color: Color,
    accent_color: Color,
}

impl ListPage {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            rows: Vec::new(),
            visible: Vec::new(),
            query: String::new(),
            searching: false,
            sort: SortOrder::default(),
            selected: 0,
            selection_mode: false,
            marked: BTreeSet::new(),
            text_color: Color::White,
            accent_color: Color::Green,
        }
    }

    pub fn boxed(section: Section) -> Box<dyn PageView> {
        Box::new(Self::new(section))
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &PageRow> {
        self.visible.iter().map(|i| &self.rows[*i])
    }

    pub fn is_selection_mode(&self) -> bool {
        self.selection_mode
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    fn rebuild_visible(&mut self) {
        let query = self.query.to_lowercase();
        let mut visible: Vec<usize> = (0..self.rows.len())
            .filter(|i| self.rows[*i].matches(&query))
            .collect();

        let rows = &self.rows;
        match self.sort {
            SortOrder::TitleAscending => {
                visible.sort_by(|a, b| rows[*a].title.to_lowercase().cmp(&rows[*b].title.to_lowercase()))
            }
            SortOrder::TitleDescending => {
                visible.sort_by(|a, b| rows[*b].title.to_lowercase().cmp(&rows[*a].title.to_lowercase()))
            }
            SortOrder::DetailAscending => {
                visible.sort_by(|a, b| rows[*a].detail.to_lowercase().cmp(&rows[*b].detail.to_lowercase()))
            }
        }

        self.visible = visible;
        self.selected = self.selected.min(self.visible.len().saturating_sub(1));
    }
}

impl PageView for ListPage {
    fn section(&self) -> Section {
        self.section
    }

    fn refresh(&mut self, library: &LibrarySnapshot) {
        self.rows = rows_for(self.section, library);
        let keys: BTreeSet<String> = self.rows.iter().map(PageRow::key).collect();
        self.marked.retain(|key| keys.contains(key));
        self.rebuild_visible();
        tracing::trace!(section = %self.section, rows = self.rows.len(), "Page refreshed");
    }

    fn set_colors(&mut self, text: Color, accent: Color) {
        self.text_color = text;
        self.accent_color = accent;
    }

    fn on_search_opened(&mut self) {
        self.searching = true;
    }

    fn on_search_closed(&mut self) {
        self.searching = false;
        if !self.query.is_empty() {
            self.query.clear();
            self.rebuild_visible();
        }
    }

    fn on_search_query_changed(&mut self, text: &str) {
        self.query = text.to_string();
        self.selected = 0;
        self.rebuild_visible();
    }

    fn on_sort_requested(&mut self) {
        self.sort = self.sort.next();
        self.rebuild_visible();
    }

    fn dismiss_selection_mode(&mut self) {
        self.selection_mode = false;
        self.marked.clear();
    }

    fn move_selection(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    fn toggle_selection_mode(&mut self) {
        if self.selection_mode {
            self.dismiss_selection_mode();
        } else {
            self.selection_mode = true;
        }
    }

    fn toggle_mark(&mut self) -> bool {
        if !self.selection_mode {
            return false;
        }
        if let Some(key) = self.selected_row().map(PageRow::key) {
            if !self.marked.remove(&key) {
                self.marked.insert(key);
            }
        }
        true
    }

    fn selected_row(&self) -> Option<&PageRow> {
        self.visible.get(self.selected).map(|i| &self.rows[*i])
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let content_width = area.width.saturating_sub(4) as usize;
        let num_width = calculate_num_width(self.visible.len());
        let title_width = (content_width.saturating_sub(num_width + 3) * 60) / 100;
        let detail_width = content_width.saturating_sub(num_width + 3 + title_width);

        let items: Vec<ListItem> = self
            .visible
            .iter()
            .enumerate()
            .map(|(position, index)| {
                let row = &self.rows[*index];
                let mark = if self.marked.contains(&row.key()) { "●" } else { " " };
                let text = format!(
                    "{:>num_width$} {} {} {}",
                    position + 1,
                    mark,
                    truncate_string(&row.title, title_width),
                    truncate_string(&row.detail, detail_width),
                );
                let style = if position == self.selected && focused {
                    Style::default().fg(self.accent_color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.text_color)
                };
                ListItem::new(text).style(style)
            })
            .collect();

        let mut title = format!(" {} ({}) ", self.section, self.sort.label());
        if self.searching && !self.query.is_empty() {
            title = format!(" {} matching \"{}\" ", self.section, self.query);
        }
        if self.selection_mode {
            title = format!("{}[{} selected] ", title, self.marked.len());
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .padding(Padding::horizontal(1))
            .border_style(Style::default().fg(self.accent_color));

        render_scrollable_list(frame, area, items, self.selected, block);
    }
}

fn count_label(count: usize) -> String {
    if count == 1 {
        "1 track".to_string()
    } else {
        format!("{count} tracks")
    }
}

fn rows_for(section: Section, library: &LibrarySnapshot) -> Vec<PageRow> {
    match section {
        Section::Playlists => library
            .playlists
            .iter()
            .map(|playlist| {
                let count = library.playlist_tracks(playlist.id).count();
                PageRow::plain(playlist.title.clone(), count_label(count))
            })
            .collect(),
        Section::Folders => {
            let mut folders: BTreeMap<PathBuf, usize> = BTreeMap::new();
            for folder in library.library_tracks().filter_map(|t| t.folder()) {
                *folders.entry(folder.to_path_buf()).or_default() += 1;
            }
            folders
                .into_iter()
                .map(|(folder, count)| {
                    let name = folder
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| folder.display().to_string());
                    let mut row = PageRow::plain(name, count_label(count));
                    row.folder = Some(folder);
                    row
                })
                .collect()
        }
        Section::Artists => {
            let mut artists: BTreeMap<&str, usize> = BTreeMap::new();
            for track in library.library_tracks() {
                *artists.entry(track.artist.as_str()).or_default() += 1;
            }
            artists
                .into_iter()
                .map(|(artist, count)| PageRow::plain(artist, count_label(count)))
                .collect()
        }
        Section::Albums => {
            let mut albums: BTreeMap<(&str, &str), usize> = BTreeMap::new();
            for track in library.library_tracks() {
                *albums
                    .entry((track.album.as_str(), track.artist.as_str()))
                    .or_default() += 1;
            }
            albums
                .into_iter()
                .map(|((album, artist), _)| PageRow::plain(album, artist))
                .collect()
        }
        Section::Tracks => library
            .library_tracks()
            .map(|track| {
                let mut row = PageRow::plain(track.title.clone(), track.artist.clone());
                row.track = Some(track.clone());
                row
            })
            .collect(),
    }
}
