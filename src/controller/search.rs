//! Search delegation, sorting and tab/page switching
//!
//! Everything here targets the active page only. With a stale page index
//! there is no active page and these calls do nothing.

use crate::model::{PageChange, PagerSync};
use super::ScreenController;

impl ScreenController {
    pub fn open_search(&mut self) {
        if self.search.open {
            return;
        }
        if let Some(page) = self.active_page_mut() {
            page.on_search_opened();
        }
        self.search.open = true;
        self.search.query.clear();
    }

    pub fn close_search(&mut self) {
        if !self.search.open {
            return;
        }
        if let Some(page) = self.active_page_mut() {
            page.on_search_closed();
        }
        self.search.open = false;
        self.search.query.clear();
    }

    pub fn search_query_changed(&mut self, text: &str) {
        self.search.query = text.to_string();
        if !self.search.open {
            return;
        }
        if let Some(page) = self.active_page_mut() {
            page.on_search_query_changed(text);
        }
    }

    pub fn request_sort(&mut self) {
        match self.active_page_mut() {
            Some(page) => page.on_sort_requested(),
            None => tracing::debug!("No active page to sort"),
        }
    }

    /// Tab bar selection
    pub fn select_tab(&mut self, index: usize) {
        self.switch_page(index, PagerSync::select_tab);
    }

    /// Pager swipe by `delta` pages
    pub fn swipe(&mut self, delta: isize) {
        let target = self.pager.current_page() as isize + delta;
        if target < 0 {
            return;
        }
        self.switch_page(target as usize, PagerSync::swipe_to);
    }

    pub fn next_tab(&mut self) {
        let count = self.pager.page_count();
        if count == 0 {
            return;
        }
        let next = self.pager.selected_tab().map_or(0, |tab| (tab + 1) % count);
        self.select_tab(next);
    }

    pub fn previous_tab(&mut self) {
        let count = self.pager.page_count();
        if count == 0 {
            return;
        }
        let previous = self.pager.selected_tab().map_or(0, |tab| (tab + count - 1) % count);
        self.select_tab(previous);
    }

    fn switch_page(&mut self, index: usize, apply: fn(&mut PagerSync, usize) -> Option<PageChange>) {
        if index >= self.pager.page_count() {
            return;
        }
        // Collapse search on the page that opened it, before it loses focus
        if index != self.pager.current_page() {
            self.close_search();
        }

        if let Some(change) = apply(&mut self.pager, index) {
            self.on_page_changed(change);
        }
    }

    fn on_page_changed(&mut self, change: PageChange) {
        tracing::debug!(from = change.previous, to = change.current, "Page changed");
        for (index, page) in self.pages.iter_mut().enumerate() {
            if index != change.current {
                page.dismiss_selection_mode();
            }
        }
    }
}
