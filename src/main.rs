mod bus;
mod controller;
mod logging;
mod model;
mod service;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event as TermEvent, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use bus::EventBus;
use controller::{Inbound, ScreenController, ScreenDeps, ScreenExit};
use model::{ConfigStore, JsonLibrary, LibraryStore};
use service::PlaybackService;
use view::{AppView, ListPage};

const TICK: Duration = Duration::from_millis(100);

/// Terminal input forwarded from the blocking poll thread
enum Input {
    Key(KeyEvent),
    FocusLost,
    FocusGained,
}

enum Step {
    Inbound(Option<Inbound>),
    Input(Option<Input>),
    Tick,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== TuneDeck Starting ===");

    let library: Arc<dyn LibraryStore> = Arc::new(JsonLibrary::open_default()?);
    let bus = EventBus::new();
    let playback = PlaybackService::spawn(bus.clone(), library.clone());
    let deps = ScreenDeps {
        config_store: ConfigStore::default(),
        library,
        bus,
        playback,
    };

    let mut terminal = init_terminal()?;
    let (input_tx, mut input_rx) = unbounded_channel();
    spawn_input_task(input_tx);

    let res = run_app(&mut terminal, deps, &mut input_rx).await;
    let restore = restore_terminal(&mut terminal);

    match &res {
        Ok(ScreenExit::StorageUnavailable(message)) => {
            eprintln!("Library storage is not accessible: {message}");
        }
        Ok(ScreenExit::SleepCompleted) => println!("Sleep timer finished, good night."),
        Ok(_) => {}
        Err(err) => tracing::error!(error = ?err, "Application error"),
    }

    tracing::info!("TuneDeck shutting down");
    restore?;
    res.map(|_| ())
}

/// Runs main screens until one exits for a reason other than a rebuild
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    deps: ScreenDeps,
    input_rx: &mut UnboundedReceiver<Input>,
) -> Result<ScreenExit> {
    loop {
        let mut screen = ScreenController::start(deps.clone(), &ListPage::boxed)?;
        let outcome = run_screen(terminal, &mut screen, input_rx).await;
        let exit = screen.exit().cloned().unwrap_or(ScreenExit::Quit);
        screen.shutdown();
        outcome?;

        if exit != ScreenExit::Rebuild {
            return Ok(exit);
        }
        tracing::info!("Rebuilding main screen");
    }
}

async fn run_screen(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    screen: &mut ScreenController,
    input_rx: &mut UnboundedReceiver<Input>,
) -> Result<()> {
    loop {
        screen.on_tick();
        terminal.draw(|frame| AppView::render(frame, screen))?;
        if screen.exit().is_some() {
            return Ok(());
        }

        let step = tokio::select! {
            inbound = screen.next_inbound() => Step::Inbound(inbound),
            input = input_rx.recv() => Step::Input(input),
            _ = tokio::time::sleep(TICK) => Step::Tick,
        };

        match step {
            Step::Inbound(Some(inbound)) => screen.handle_inbound(inbound),
            Step::Inbound(None) | Step::Tick => {}
            Step::Input(Some(Input::Key(key))) => screen.handle_key_event(key),
            Step::Input(Some(Input::FocusLost)) => screen.pause(),
            Step::Input(Some(Input::FocusGained)) => screen.resume(),
            Step::Input(None) => {
                tracing::warn!("Input task stopped");
                screen.request_quit();
            }
        }
    }
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_task(input_tx: UnboundedSender<Input>) {
    tokio::task::spawn_blocking(move || loop {
        let input = match event::poll(TICK) {
            Ok(true) => match event::read() {
                Ok(TermEvent::Key(key)) => Input::Key(key),
                Ok(TermEvent::FocusLost) => Input::FocusLost,
                Ok(TermEvent::FocusGained) => Input::FocusGained,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read terminal event");
                    break;
                }
            },
            Ok(false) => {
                if input_tx.is_closed() {
                    break;
                }
                continue;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to poll terminal events");
                break;
            }
        };
        if input_tx.send(input).is_err() {
            break;
        }
    });
}
