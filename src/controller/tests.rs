use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Color;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

use super::*;
use crate::model::{test_track, JsonLibrary, SleepTimerState, CUSTOM_SLEEP_TIMER};
use crate::service::PlaybackSnapshot;

type CallLog = Arc<Mutex<Vec<(Section, String)>>>;

struct RecordingPage {
    section: Section,
    log: CallLog,
}

impl RecordingPage {
    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push((self.section, call.into()));
    }
}

impl PageView for RecordingPage {
    fn section(&self) -> Section {
        self.section
    }

    fn refresh(&mut self, _library: &LibrarySnapshot) {
        self.record("refresh");
    }

    fn set_colors(&mut self, _text: Color, _accent: Color) {
        self.record("colors");
    }

    fn on_search_opened(&mut self) {
        self.record("search_opened");
    }

    fn on_search_closed(&mut self) {
        self.record("search_closed");
    }

    fn on_search_query_changed(&mut self, text: &str) {
        self.record(format!("query:{text}"));
    }

    fn on_sort_requested(&mut self) {
        self.record("sort");
    }

    fn dismiss_selection_mode(&mut self) {
        self.record("dismiss");
    }
}

struct Fixture {
    _dir: TempDir,
    deps: ScreenDeps,
    library: Arc<JsonLibrary>,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
    _snapshot: watch::Sender<PlaybackSnapshot>,
    log: CallLog,
}

impl Fixture {
    fn new(config: Config) -> Self {
        Self::with_playback(config, PlaybackSnapshot::default())
    }

    fn with_playback(config: Config, playback: PlaybackSnapshot) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_store = ConfigStore::new(dir.path().join("config.json"));
        config_store.save(&config).unwrap();
        let library = Arc::new(JsonLibrary::open(dir.path().join("library.json")).unwrap());
        let (playback, commands, snapshot) = PlaybackHandle::detached(playback);

        Self {
            deps: ScreenDeps {
                config_store,
                library: library.clone(),
                bus: EventBus::new(),
                playback,
            },
            _dir: dir,
            library,
            commands,
            _snapshot: snapshot,
            log: Arc::default(),
        }
    }

    fn start(&self) -> ScreenController {
        let log = self.log.clone();
        let factory = move |section| {
            Box::new(RecordingPage {
                section,
                log: log.clone(),
            }) as Box<dyn PageView>
        };
        ScreenController::start(self.deps.clone(), &factory).unwrap()
    }

    fn config(&self) -> Config {
        self.deps.config_store.load().unwrap()
    }

    fn calls(&self, call: &str) -> Vec<Section> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, c)| c == call)
            .map(|(section, _)| *section)
            .collect()
    }

    fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    fn drain_commands(&mut self) -> Vec<EngineCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            commands.push(command);
        }
        commands
    }
}

fn config_with(mask: SectionMask, last_used_page: usize) -> Config {
    Config {
        show_tabs: mask,
        last_used_page,
        ..Config::default()
    }
}

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// Waits for the next inbound value and applies it. True for a library load.
async fn pump(screen: &mut ScreenController) -> bool {
    let inbound = tokio::time::timeout(Duration::from_secs(2), screen.next_inbound())
        .await
        .expect("timed out waiting for inbound")
        .expect("inbound channels closed");
    let loaded = matches!(inbound, Inbound::Ui(UiMessage::LibraryLoaded { .. }));
    screen.handle_inbound(inbound);
    loaded
}

async fn pump_library_loaded(screen: &mut ScreenController) {
    while !pump(screen).await {}
}

#[tokio::test]
async fn startup_refreshes_every_enabled_page() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    assert_eq!(screen.registry.sections(), &Section::ALL);

    pump_library_loaded(&mut screen).await;

    assert_eq!(fixture.calls("refresh"), Section::ALL.to_vec());
    assert_eq!(fixture.calls("colors").len(), 5);
    assert!(screen.exit().is_none());
}

#[tokio::test]
async fn track_deleted_refreshes_all_pages() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;
    fixture.clear_log();

    fixture.deps.bus.publish(Event::TrackDeleted);
    pump_library_loaded(&mut screen).await;

    assert_eq!(fixture.calls("refresh"), Section::ALL.to_vec());
}

#[tokio::test]
async fn playlists_updated_refreshes_only_playlists() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;
    fixture.clear_log();

    fixture.deps.bus.publish(Event::PlaylistsUpdated);
    pump_library_loaded(&mut screen).await;

    assert_eq!(fixture.calls("refresh"), vec![Section::Playlists]);
}

#[tokio::test]
async fn refresh_tracks_refreshes_only_tracks() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;
    fixture.clear_log();

    screen.handle_key_event(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
    pump_library_loaded(&mut screen).await;

    assert_eq!(fixture.calls("refresh"), vec![Section::Tracks]);
}

#[tokio::test]
async fn stale_page_index_makes_search_and_sort_no_ops() {
    let mask = SectionMask::of(&[Section::Playlists, Section::Tracks]);
    let fixture = Fixture::new(config_with(mask, 3));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;

    assert_eq!(screen.registry.len(), 2);
    assert_eq!(screen.active_section(), None);
    assert_eq!(screen.pager.selected_tab(), None);

    screen.open_search();
    screen.search_query_changed("abc");
    screen.request_sort();
    screen.close_search();

    for call in ["search_opened", "query:abc", "sort", "search_closed"] {
        assert!(fixture.calls(call).is_empty(), "{call} reached a page");
    }
    assert_eq!(fixture.config().last_used_page, 3);

    // The next tab step lands on the first page
    screen.next_tab();
    assert_eq!(screen.active_section(), Some(Section::Playlists));
    assert_eq!(screen.pager.selected_tab(), Some(0));
}

#[tokio::test]
async fn search_is_delegated_to_active_page_only() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 2));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;

    screen.handle_key_event(press(KeyCode::Char('/')));
    screen.handle_key_event(press(KeyCode::Char('j')));
    screen.handle_key_event(press(KeyCode::Char('a')));
    screen.handle_key_event(press(KeyCode::Backspace));

    assert_eq!(fixture.calls("search_opened"), vec![Section::Artists]);
    assert_eq!(fixture.calls("query:j"), vec![Section::Artists, Section::Artists]);
    assert_eq!(fixture.calls("query:ja"), vec![Section::Artists]);
    assert_eq!(screen.search.query, "j");

    // Switching pages collapses the search on the page that opened it
    screen.handle_key_event(press(KeyCode::Tab));
    assert_eq!(fixture.calls("search_closed"), vec![Section::Artists]);
    assert!(!screen.search.open);
    assert_eq!(screen.active_section(), Some(Section::Albums));
}

#[tokio::test]
async fn page_change_dismisses_selection_mode_on_other_pages() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;

    screen.swipe(1);
    assert_eq!(screen.pager.selected_tab(), Some(1));

    let mut dismissed = fixture.calls("dismiss");
    dismissed.sort();
    assert_eq!(
        dismissed,
        vec![Section::Playlists, Section::Artists, Section::Albums, Section::Tracks]
    );

    // Swiping past the last page is ignored
    fixture.clear_log();
    screen.select_tab(4);
    screen.swipe(1);
    assert_eq!(screen.pager.current_page(), 4);
}

#[tokio::test]
async fn sleep_timer_finishing_closes_screen() {
    let mut fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();

    screen.pick_sleep_timer(600);
    assert!(screen.sleep_timer.is_armed());
    assert_eq!(fixture.config().last_sleep_timer_seconds, 600);
    assert!(fixture
        .drain_commands()
        .contains(&EngineCommand::StartSleepTimer { seconds: 600 }));

    screen.handle_event(Event::SleepTimerChanged { seconds: 600 });
    screen.handle_event(Event::SleepTimerChanged { seconds: 12 });
    assert_eq!(screen.sleep_timer.remaining_seconds(), Some(12));
    assert!(screen.exit().is_none());

    screen.handle_event(Event::SleepTimerChanged { seconds: 0 });
    assert_eq!(screen.sleep_timer.state(), SleepTimerState::Disabled);
    assert_eq!(screen.exit(), Some(&ScreenExit::SleepCompleted));
}

#[tokio::test]
async fn cancelled_sleep_timer_stops_service_countdown() {
    let mut fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();

    screen.pick_sleep_timer(600);
    screen.handle_key_event(press(KeyCode::Char('x')));

    let commands = fixture.drain_commands();
    assert!(commands.contains(&EngineCommand::StartSleepTimer { seconds: 600 }));
    assert_eq!(commands.last(), Some(&EngineCommand::StopSleepTimer));
    assert!(!screen.sleep_timer.is_armed());
    assert!(screen.exit().is_none());
}

#[tokio::test]
async fn tick_in_flight_during_cancel_does_not_rearm() {
    let mut fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;

    screen.pick_sleep_timer(600);
    screen.handle_event(Event::SleepTimerChanged { seconds: 600 });
    // Published by the service just before it sees the stop
    fixture.deps.bus.publish(Event::SleepTimerChanged { seconds: 598 });
    screen.handle_key_event(press(KeyCode::Char('x')));
    assert_eq!(fixture.drain_commands().last(), Some(&EngineCommand::StopSleepTimer));

    assert!(!pump(&mut screen).await);
    assert_eq!(screen.sleep_timer.state(), SleepTimerState::Disabled);
    assert_eq!(screen.sleep_timer.remaining_seconds(), None);
    assert!(screen.exit().is_none());
}

#[tokio::test]
async fn old_countdown_ticks_do_not_override_a_new_pick() {
    let mut fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;

    screen.pick_sleep_timer(600);
    screen.handle_event(Event::SleepTimerChanged { seconds: 600 });
    screen.pick_sleep_timer(300);
    let commands = fixture.drain_commands();
    assert_eq!(
        &commands[commands.len() - 2..],
        &[EngineCommand::StopSleepTimer, EngineCommand::StartSleepTimer { seconds: 300 }]
    );

    fixture.deps.bus.publish(Event::SleepTimerChanged { seconds: 597 });
    fixture.deps.bus.publish(Event::SleepTimerChanged { seconds: 300 });
    fixture.deps.bus.publish(Event::SleepTimerChanged { seconds: 299 });
    pump(&mut screen).await;
    assert_eq!(screen.sleep_timer.remaining_seconds(), Some(300));
    pump(&mut screen).await;
    pump(&mut screen).await;
    assert_eq!(screen.sleep_timer.remaining_seconds(), Some(299));
}

#[tokio::test]
async fn rebuilt_screen_follows_running_countdown() {
    let running = PlaybackSnapshot {
        sleep_remaining: Some(420),
        ..PlaybackSnapshot::default()
    };
    let fixture = Fixture::with_playback(config_with(SectionMask::ALL, 0), running);
    let mut screen = fixture.start();
    assert_eq!(screen.sleep_timer.remaining_seconds(), Some(420));

    screen.handle_event(Event::SleepTimerChanged { seconds: 419 });
    assert_eq!(screen.sleep_timer.remaining_seconds(), Some(419));
    screen.handle_event(Event::SleepTimerChanged { seconds: 0 });
    assert_eq!(screen.exit(), Some(&ScreenExit::SleepCompleted));
}

#[tokio::test]
async fn screen_without_running_countdown_ignores_ticks() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();

    screen.handle_event(Event::SleepTimerChanged { seconds: 30 });
    assert!(!screen.sleep_timer.is_armed());
    screen.handle_event(Event::SleepTimerChanged { seconds: 0 });
    assert!(screen.exit().is_none());
}

#[tokio::test]
async fn custom_sleep_value_of_zero_is_ignored() {
    let mut fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    fixture.drain_commands();

    screen.choose_sleep_option(CUSTOM_SLEEP_TIMER);
    assert!(matches!(screen.overlay, Some(Overlay::CustomSleep { .. })));
    screen.handle_key_event(press(KeyCode::Char('0')));
    screen.handle_key_event(press(KeyCode::Enter));

    assert!(screen.overlay.is_none());
    assert!(!screen.sleep_timer.is_armed());
    assert!(fixture.drain_commands().is_empty());
    assert_eq!(fixture.config().last_sleep_timer_seconds, Config::default().last_sleep_timer_seconds);
}

#[tokio::test]
async fn custom_sleep_minutes_arm_the_timer() {
    let mut fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();

    screen.handle_key_event(press(KeyCode::Char('t')));
    assert!(matches!(screen.overlay, Some(Overlay::SleepPicker { .. })));
    screen.choose_sleep_option(CUSTOM_SLEEP_TIMER);
    screen.handle_key_event(press(KeyCode::Char('4')));
    screen.handle_key_event(press(KeyCode::Char('5')));
    screen.handle_key_event(press(KeyCode::Enter));

    assert_eq!(screen.sleep_timer.remaining_seconds(), Some(45 * 60));
    assert!(fixture
        .drain_commands()
        .contains(&EngineCommand::StartSleepTimer { seconds: 45 * 60 }));
}

#[tokio::test]
async fn huge_custom_sleep_value_is_clamped() {
    let mut fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();

    screen.choose_sleep_option(CUSTOM_SLEEP_TIMER);
    screen.submit_custom_sleep("71582789");

    assert_eq!(screen.sleep_timer.remaining_seconds(), Some(u32::MAX));
    assert!(fixture
        .drain_commands()
        .contains(&EngineCommand::StartSleepTimer { seconds: u32::MAX }));
    assert_eq!(fixture.config().last_sleep_timer_seconds, i64::from(u32::MAX));
    assert!(screen.toast.is_none());
}

#[tokio::test]
async fn playlist_from_folder_stores_every_track_and_notifies_once() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut tracks: Vec<_> = (1..=12)
        .map(|id| test_track(id, &format!("/music/Jazz/{id:02}.mp3")))
        .collect();
    tracks.push(test_track(50, "/music/Rock/01.mp3"));
    fixture.library.insert_tracks(tracks).unwrap();

    let mut observer = fixture.deps.bus.subscribe("observer");
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;

    screen.create_playlist_from_folder(PathBuf::from("/music/Jazz"));
    pump(&mut screen).await;
    let pending = match screen.overlay.take() {
        Some(Overlay::PlaylistName { pending: Some(pending), .. }) => pending,
        other => panic!("expected playlist name prompt, got {other:?}"),
    };
    assert_eq!(pending.tracks.len(), 12);

    screen.submit_playlist_name("Jazz", Some(pending));
    let event = tokio::time::timeout(Duration::from_secs(2), observer.recv())
        .await
        .unwrap();
    assert_eq!(event, Some(Event::PlaylistsUpdated));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(observer.try_recv(), None);

    let snapshot = fixture.library.snapshot().unwrap();
    let playlist = snapshot
        .playlists
        .iter()
        .find(|p| p.title == "Jazz")
        .expect("playlist created");
    assert_eq!(snapshot.playlist_tracks(playlist.id).count(), 12);
}

#[tokio::test]
async fn empty_folder_shows_a_toast() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;

    screen.create_playlist_from_folder(PathBuf::from("/nowhere"));
    pump(&mut screen).await;

    assert!(screen.overlay.is_none());
    assert_eq!(screen.toast.as_ref().map(|t| t.level), Some(ToastLevel::Info));
}

#[tokio::test]
async fn playlist_keys_only_work_on_playlists_page() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 4));
    let mut screen = fixture.start();

    screen.handle_key_event(press(KeyCode::Char('n')));
    assert!(screen.overlay.is_none());

    screen.select_tab(0);
    screen.handle_key_event(press(KeyCode::Char('n')));
    assert!(matches!(
        screen.overlay,
        Some(Overlay::PlaylistName { pending: None, .. })
    ));
}

#[tokio::test]
async fn duplicate_playlist_name_reports_failure() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    fixture.library.create_playlist("Mix").unwrap();
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;

    screen.submit_playlist_name("mix", None);
    pump(&mut screen).await;

    assert_eq!(screen.toast.as_ref().map(|t| t.level), Some(ToastLevel::Error));
}

#[tokio::test]
async fn changed_mask_between_pause_and_resume_rebuilds() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 3));
    let mut screen = fixture.start();

    screen.pause();
    fixture
        .deps
        .config_store
        .update(|config| config.show_tabs = config.show_tabs.toggle(Section::Albums))
        .unwrap();
    screen.resume();

    assert_eq!(screen.exit(), Some(&ScreenExit::Rebuild));
    assert_eq!(fixture.config().last_used_page, 0);

    screen.shutdown();
    assert_eq!(fixture.config().last_used_page, 0);
}

#[tokio::test]
async fn unchanged_mask_resumes_in_place() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 3));
    let mut screen = fixture.start();

    screen.pause();
    assert_eq!(fixture.config().last_used_page, 3);
    screen.resume();

    assert!(screen.exit().is_none());
}

#[tokio::test]
async fn settings_toggle_rebuilds_on_close() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 2));
    let mut screen = fixture.start();

    screen.handle_key_event(press(KeyCode::Char('o')));
    assert!(matches!(screen.overlay, Some(Overlay::Settings { selected: 0, .. })));
    screen.handle_key_event(press(KeyCode::Down));
    screen.handle_key_event(press(KeyCode::Enter));

    match &screen.overlay {
        Some(Overlay::Settings { mask, selected }) => {
            assert_eq!(*selected, 1);
            assert!(!mask.contains(Section::Folders));
        }
        other => panic!("expected settings overlay, got {other:?}"),
    }
    assert!(screen.exit().is_none());

    screen.handle_key_event(press(KeyCode::Esc));
    assert!(screen.overlay.is_none());
    assert_eq!(screen.exit(), Some(&ScreenExit::Rebuild));

    let config = fixture.config();
    assert!(!config.show_tabs.contains(Section::Folders));
    assert_eq!(config.last_used_page, 0);
}

#[tokio::test]
async fn shutdown_unsubscribes_and_persists_page() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let _observer = fixture.deps.bus.subscribe("observer");
    let mut screen = fixture.start();
    assert_eq!(fixture.deps.bus.subscriber_count(), 2);

    screen.select_tab(3);
    screen.handle_key_event(press(KeyCode::Char('q')));
    assert_eq!(screen.exit(), Some(&ScreenExit::Quit));
    screen.shutdown();

    assert_eq!(fixture.deps.bus.subscriber_count(), 1);
    assert_eq!(fixture.config().last_used_page, 3);
}

#[tokio::test]
async fn queue_is_restored_when_nothing_is_playing() {
    let mut fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    fixture
        .library
        .insert_tracks(vec![test_track(1, "/music/a.mp3")])
        .unwrap();
    fixture.library.set_queue(vec![1]).unwrap();

    let _screen = fixture.start();

    let command = tokio::time::timeout(Duration::from_secs(2), fixture.commands.recv())
        .await
        .unwrap();
    assert_eq!(command, Some(EngineCommand::InitQueue));
}

#[tokio::test]
async fn queue_is_left_alone_when_a_track_is_loaded() {
    let playing = PlaybackSnapshot {
        track: Some(test_track(1, "/music/a.mp3")),
        is_playing: true,
        ..PlaybackSnapshot::default()
    };
    let mut fixture = Fixture::with_playback(config_with(SectionMask::ALL, 0), playing);
    fixture
        .library
        .insert_tracks(vec![test_track(1, "/music/a.mp3")])
        .unwrap();
    fixture.library.set_queue(vec![1]).unwrap();

    let mut screen = fixture.start();
    assert!(screen.mini_player.is_playing);
    pump_library_loaded(&mut screen).await;

    let command = tokio::time::timeout(Duration::from_millis(200), fixture.commands.recv()).await;
    assert!(command.is_err(), "unexpected command {command:?}");
}

#[tokio::test]
async fn empty_queue_is_not_restored() {
    let mut fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;

    let command = tokio::time::timeout(Duration::from_millis(200), fixture.commands.recv()).await;
    assert!(command.is_err(), "unexpected command {command:?}");
}

#[tokio::test]
async fn track_events_update_the_mini_player() {
    let fixture = Fixture::new(config_with(SectionMask::ALL, 0));
    let mut screen = fixture.start();
    pump_library_loaded(&mut screen).await;
    assert!(!screen.mini_player.is_visible());

    fixture
        .deps
        .bus
        .publish(Event::TrackChanged(Some(test_track(7, "/music/x.mp3"))));
    fixture.deps.bus.publish(Event::TrackStateChanged { is_playing: true });
    pump(&mut screen).await;
    pump(&mut screen).await;

    assert!(screen.mini_player.is_playing);
    assert_eq!(screen.mini_player.track.as_ref().map(|t| t.id), Some(7));
}

#[tokio::test]
async fn inaccessible_storage_ends_the_screen() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let mut fixture = Fixture::new(Config::default());
    fixture.deps.library = Arc::new(JsonLibrary::open(blocker.join("library.json")).unwrap());
    let screen = fixture.start();

    assert!(matches!(screen.exit(), Some(ScreenExit::StorageUnavailable(_))));
    assert_eq!(fixture.deps.bus.subscriber_count(), 0);
    assert!(fixture.drain_commands().is_empty());
}
