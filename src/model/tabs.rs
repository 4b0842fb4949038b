//! Tab registry and tab/page selection sync

use super::types::{Section, SectionMask};

/// Enabled sections in canonical order, built once per screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabRegistry {
    sections: Vec<Section>,
}

impl TabRegistry {
    pub fn build(mask: SectionMask, folders_supported: bool) -> Self {
        let sections = Section::ALL
            .into_iter()
            .filter(|section| mask.contains(*section))
            .filter(|section| *section != Section::Folders || folders_supported)
            .collect();
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section shown at `index`, or `None` when the index is past the end.
    /// A stale persisted index is left alone; callers skip the action.
    pub fn resolve_active_page(&self, index: usize) -> Option<Section> {
        self.sections.get(index).copied()
    }

    pub fn position(&self, section: Section) -> Option<usize> {
        self.sections.iter().position(|s| *s == section)
    }
}

/// A page switch that actually happened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageChange {
    pub previous: usize,
    pub current: usize,
}

/// Keeps the selected tab and the current page in step.
///
/// Either side may start a change. The side that follows must not bounce
/// the change back, which the `syncing` flag prevents.
#[derive(Clone, Debug)]
pub struct PagerSync {
    page_count: usize,
    selected_tab: Option<usize>,
    current_page: usize,
    syncing: bool,
}

impl PagerSync {
    pub fn new(page_count: usize, last_used_page: usize) -> Self {
        Self {
            page_count,
            selected_tab: (last_used_page < page_count).then_some(last_used_page),
            current_page: last_used_page,
            syncing: false,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn selected_tab(&self) -> Option<usize> {
        self.selected_tab
    }

    /// Raw page index, possibly out of range
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Tab bar entry point
    pub fn select_tab(&mut self, index: usize) -> Option<PageChange> {
        if index >= self.page_count {
            return None;
        }
        self.selected_tab = Some(index);
        if self.syncing {
            return None;
        }

        self.syncing = true;
        let change = self.set_page(index);
        self.syncing = false;
        change
    }

    /// Pager entry point (swipe)
    pub fn swipe_to(&mut self, index: usize) -> Option<PageChange> {
        if index >= self.page_count {
            return None;
        }
        self.set_page(index)
    }

    fn set_page(&mut self, index: usize) -> Option<PageChange> {
        if self.current_page == index {
            return None;
        }
        let previous = self.current_page;
        self.current_page = index;

        if !self.syncing {
            self.syncing = true;
            self.select_tab(index);
            self.syncing = false;
        }
        Some(PageChange {
            previous,
            current: index,
        })
    }
}
