//! Controller module - main screen orchestration
//!
//! The screen controller owns everything the main screen shows and is only
//! ever touched from the screen task. Bus notifications and results of
//! background work reach it as [`Inbound`] values that the run loop feeds in
//! one at a time. It is organized into submodules by responsibility:
//!
//! - `dispatch`: Bus notifications and background results
//! - `input`: Key event handling
//! - `search`: Search delegation and tab/page switching
//! - `sleep`: Sleep timer picker and commands
//! - `library`: Playlist creation and track deletion

mod dispatch;
mod input;
mod library;
mod search;
mod sleep;
#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use ratatui::style::Color;
use tokio::sync::mpsc;

use crate::bus::{Event, EventBus, Subscription};
use crate::model::{
    Config, ConfigStore, LibrarySnapshot, LibraryStore, MiniPlayer, Overlay, PagerSync,
    SearchState, Section, SectionMask, SleepTimer, TabRegistry, Toast, ToastLevel, Track,
};
use crate::service::{EngineCommand, PlaybackHandle};
use crate::view::PageView;

const SCREEN_OWNER: &str = "main-screen";

/// Builds the page for a section when a screen is constructed
pub type PageFactory = dyn Fn(Section) -> Box<dyn PageView>;

/// Long-lived collaborators shared by every screen instance
#[derive(Clone)]
pub struct ScreenDeps {
    pub config_store: ConfigStore,
    pub library: Arc<dyn LibraryStore>,
    pub bus: EventBus,
    pub playback: PlaybackHandle,
}

/// Why a screen stopped running
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScreenExit {
    Quit,
    SleepCompleted,
    /// Visible sections changed; build a fresh screen from persisted config
    Rebuild,
    StorageUnavailable(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshScope {
    All,
    Only(Section),
}

/// Results of background work, delivered back to the screen task
#[derive(Debug)]
pub enum UiMessage {
    LibraryLoaded {
        scope: RefreshScope,
        snapshot: LibrarySnapshot,
    },
    FolderResolved {
        folder: PathBuf,
        tracks: Vec<Track>,
    },
    StoreFailed {
        operation: &'static str,
        message: String,
    },
}

#[derive(Debug)]
pub enum Inbound {
    Bus(Event),
    Ui(UiMessage),
}

pub struct ScreenController {
    deps: ScreenDeps,
    subscription: Option<Subscription>,
    ui_tx: mpsc::UnboundedSender<UiMessage>,
    ui_rx: mpsc::UnboundedReceiver<UiMessage>,
    pub(crate) registry: TabRegistry,
    pub(crate) pager: PagerSync,
    pub(crate) pages: Vec<Box<dyn PageView>>,
    stored_show_tabs: SectionMask,
    folders_supported: bool,
    pub(crate) sleep_timer: SleepTimer,
    pub(crate) mini_player: MiniPlayer,
    pub(crate) search: SearchState,
    pub(crate) overlay: Option<Overlay>,
    pub(crate) toast: Option<Toast>,
    pub(crate) colors: (Color, Color),
    library_snapshot: LibrarySnapshot,
    exit: Option<ScreenExit>,
}

impl ScreenController {
    /// Builds the screen from persisted config and starts listening.
    pub fn start(deps: ScreenDeps, make_page: &PageFactory) -> Result<Self> {
        let config = deps.config_store.load()?;
        let folders_supported = deps.library.supports_folders();
        let registry = TabRegistry::build(config.show_tabs, folders_supported);
        let pages = registry.sections().iter().map(|section| make_page(*section)).collect();
        let pager = PagerSync::new(registry.len(), config.last_used_page);
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();

        tracing::info!(
            show_tabs = config.show_tabs.bits(),
            last_used_page = config.last_used_page,
            tabs = ?registry.sections(),
            "Main screen starting"
        );

        let mut screen = Self {
            deps,
            subscription: None,
            ui_tx,
            ui_rx,
            registry,
            pager,
            pages,
            stored_show_tabs: config.show_tabs,
            folders_supported,
            sleep_timer: SleepTimer::new(),
            mini_player: MiniPlayer::default(),
            search: SearchState::default(),
            overlay: None,
            toast: None,
            colors: (config.text_color(), config.accent_color()),
            library_snapshot: LibrarySnapshot::default(),
            exit: None,
        };

        if let Err(e) = screen.deps.library.check_access() {
            tracing::error!(error = %e, "Library storage is not accessible");
            screen.exit = Some(ScreenExit::StorageUnavailable(format!("{e:#}")));
            return Ok(screen);
        }

        screen.subscription = Some(screen.deps.bus.subscribe(SCREEN_OWNER));
        screen.apply_colors(&config);
        screen.sync_mini_player();
        screen.adopt_running_sleep_timer();

        if screen.deps.playback.current_track().is_none() {
            screen.restore_queue();
        }
        screen.request_refresh(RefreshScope::All, true);

        Ok(screen)
    }

    /// Screen lost the foreground
    pub fn pause(&mut self) {
        let page = self.pager.current_page();
        match self.deps.config_store.update(|config| config.last_used_page = page) {
            Ok(config) => self.stored_show_tabs = config.show_tabs,
            Err(e) => tracing::error!(error = %e, "Failed to persist screen state on pause"),
        }
        tracing::debug!(page, "Main screen paused");
    }

    /// Screen is back in the foreground. A changed section mask can't be
    /// applied in place, so the screen asks to be rebuilt instead.
    pub fn resume(&mut self) {
        let live = match self.deps.config_store.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read config on resume");
                return;
            }
        };

        if live.show_tabs != self.stored_show_tabs {
            tracing::info!(
                stored = self.stored_show_tabs.bits(),
                live = live.show_tabs.bits(),
                "Visible sections changed, rebuilding screen"
            );
            if let Err(e) = self.deps.config_store.update(|config| config.last_used_page = 0) {
                tracing::error!(error = %e, "Failed to reset last used page");
            }
            self.exit = Some(ScreenExit::Rebuild);
            return;
        }

        self.apply_colors(&live);
        self.sync_mini_player();
        tracing::debug!("Main screen resumed");
    }

    /// Releases the bus subscription. Anything published afterwards is not
    /// observed by this screen.
    pub fn shutdown(mut self) {
        let persist_page = matches!(
            self.exit,
            None | Some(ScreenExit::Quit) | Some(ScreenExit::SleepCompleted)
        );
        if persist_page {
            let page = self.pager.current_page();
            if let Err(e) = self.deps.config_store.update(|config| config.last_used_page = page) {
                tracing::error!(error = %e, "Failed to persist last used page");
            }
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        tracing::info!(exit = ?self.exit, "Main screen closed");
    }

    /// Waits for the next bus notification or background result
    pub async fn next_inbound(&mut self) -> Option<Inbound> {
        let Self {
            subscription,
            ui_rx,
            ..
        } = self;

        tokio::select! {
            Some(event) = async {
                match subscription.as_mut() {
                    Some(subscription) => subscription.recv().await,
                    None => std::future::pending::<Option<Event>>().await,
                }
            } => Some(Inbound::Bus(event)),
            Some(message) = ui_rx.recv() => Some(Inbound::Ui(message)),
            else => None,
        }
    }

    pub fn on_tick(&mut self) {
        let now = Instant::now();
        if self.toast.as_ref().is_some_and(|toast| toast.is_expired(now)) {
            self.toast = None;
        }
    }

    pub fn exit(&self) -> Option<&ScreenExit> {
        self.exit.as_ref()
    }

    pub fn request_quit(&mut self) {
        self.exit = Some(ScreenExit::Quit);
    }

    pub(crate) fn folders_supported(&self) -> bool {
        self.folders_supported
    }

    pub(crate) fn active_section(&self) -> Option<Section> {
        self.registry.resolve_active_page(self.pager.current_page())
    }

    pub(crate) fn active_page_mut(&mut self) -> Option<&mut dyn PageView> {
        let index = self.pager.current_page();
        self.registry.resolve_active_page(index)?;
        let page: &mut dyn PageView = self.pages.get_mut(index)?.as_mut();
        Some(page)
    }

    pub(crate) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        let toast = Toast::new(level, message);
        tracing::debug!(level = ?toast.level, message = %toast.message, "Showing toast");
        self.toast = Some(toast);
    }

    pub(crate) fn send_command(&self, command: EngineCommand) {
        self.deps.playback.send(command);
    }

    fn apply_colors(&mut self, config: &Config) {
        let (text, accent) = (config.text_color(), config.accent_color());
        self.colors = (text, accent);
        for page in &mut self.pages {
            page.set_colors(text, accent);
        }
    }

    fn sync_mini_player(&mut self) {
        let snapshot = self.deps.playback.snapshot();
        self.mini_player = MiniPlayer {
            track: snapshot.track,
            is_playing: snapshot.is_playing,
        };
    }

    /// Picks up a countdown an earlier screen left running in the service
    fn adopt_running_sleep_timer(&mut self) {
        let Some(remaining) = self.deps.playback.snapshot().sleep_remaining else {
            return;
        };
        match self.sleep_timer.adopt(remaining, Utc::now()) {
            Ok(()) => tracing::info!(remaining, "Following running sleep timer"),
            Err(e) => tracing::debug!(error = %e, "Running sleep timer not adopted"),
        }
    }

    /// Asks the service to restore its queue when it has nothing loaded
    fn restore_queue(&self) {
        let library = self.deps.library.clone();
        let playback = self.deps.playback.clone();
        tokio::task::spawn_blocking(move || match library.queue() {
            Ok(queue) if !queue.is_empty() => playback.send(EngineCommand::InitQueue),
            Ok(_) => tracing::debug!("No saved queue to restore"),
            Err(e) => tracing::warn!(error = %e, "Failed to read saved queue"),
        });
    }

    /// Fetches library data off the screen task and hands it to the pages in
    /// `scope` once it arrives.
    pub(crate) fn request_refresh(&self, scope: RefreshScope, rescan: bool) {
        if let RefreshScope::Only(section) = scope {
            if self.registry.position(section).is_none() {
                tracing::trace!(%section, "Skipping refresh of a hidden section");
                return;
            }
        }

        let library = self.deps.library.clone();
        let ui_tx = self.ui_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = load_library(library.as_ref(), rescan);
            crate::log_store_result!("load_library", result);
            let message = match result {
                Ok(snapshot) => UiMessage::LibraryLoaded { scope, snapshot },
                Err(e) => UiMessage::StoreFailed {
                    operation: "load library",
                    message: format!("{e:#}"),
                },
            };
            let _ = ui_tx.send(message);
        });
    }

    /// Opening settings takes the screen out of the foreground
    pub fn open_settings(&mut self) {
        self.pause();
        self.overlay = Some(Overlay::Settings {
            mask: self.stored_show_tabs,
            selected: 0,
        });
    }

    pub fn close_settings(&mut self) {
        self.overlay = None;
        self.resume();
    }

    /// Flips one section in the persisted mask and returns the new mask.
    /// The running screen keeps its tabs until it is resumed.
    pub(crate) fn toggle_section_visibility(&mut self, current: SectionMask, section: Section) -> SectionMask {
        match self
            .deps
            .config_store
            .update(|config| config.show_tabs = config.show_tabs.toggle(section))
        {
            Ok(config) => {
                tracing::debug!(%section, show_tabs = config.show_tabs.bits(), "Section visibility toggled");
                config.show_tabs
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist visible sections");
                self.show_toast(ToastLevel::Error, "Could not save settings");
                current
            }
        }
    }
}

fn load_library(library: &dyn LibraryStore, rescan: bool) -> Result<LibrarySnapshot> {
    if rescan {
        library.rescan()?;
    }
    library.snapshot()
}
