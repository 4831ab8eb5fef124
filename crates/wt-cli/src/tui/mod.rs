//! Full-screen story UI.
//!
//! The controller runs in its own tokio task. The UI thread sends it
//! [`Command`]s and redraws from the [`SessionEvent`]s it sends back.

mod app;
mod views;

use std::io;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, warn};

use wt_story::{Genre, InferenceEngine, NarrativeController, SessionEvent};

use crate::commands::EngineSetup;
use app::{App, Command, Screen};

const TICK: Duration = Duration::from_millis(50);

/// Launch the TUI and block until the player quits.
pub fn run(setup: EngineSetup, genre: Genre, turns: u32) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let model = setup.story.model.clone();
    let mut controller = NarrativeController::new(setup.engine, setup.story);
    controller.subscribe(event_tx);
    let worker = runtime.spawn(drive(controller, command_rx));

    enable_raw_mode().map_err(|e| format!("terminal error: {e}"))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| format!("terminal error: {e}"))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| format!("terminal error: {e}"))?;

    let mut app = App::new(command_tx, model, genre, turns);
    let result = run_loop(&mut terminal, &mut app, &mut event_rx);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if !app.should_quit {
        app.quit();
    }
    // A generation in flight is not waited for.
    worker.abort();
    runtime.shutdown_timeout(Duration::from_millis(200));

    result
}

/// Controller task: offer the engine's models, then serve commands one at a time.
async fn drive<E: InferenceEngine>(
    mut controller: NarrativeController<E>,
    mut commands: UnboundedReceiver<Command>,
) {
    if let Err(e) = controller.list_models().await {
        warn!(error = %e, "model listing failed");
    }

    while let Some(command) = commands.recv().await {
        debug!(?command, "controller command");
        let result = match command {
            Command::Load(model) => match controller.select_model(model) {
                Ok(()) => controller.load_model().await,
                Err(e) => Err(e),
            },
            Command::Start { genre, turns } => controller.start(genre, turns).await.map(drop),
            Command::Choose(index) => controller.choose(index).await.map(drop),
            Command::Restart => {
                controller.end_session();
                controller.restart();
                Ok(())
            }
            Command::Quit => break,
        };
        if let Err(e) = result {
            warn!(error = %e, "command rejected");
        }
    }
}

/// Main event loop.
fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut UnboundedReceiver<SessionEvent>,
) -> Result<(), String> {
    loop {
        while let Ok(event) = events.try_recv() {
            app.apply(event);
        }

        terminal
            .draw(|frame| views::draw(frame, app))
            .map_err(|e| format!("draw error: {e}"))?;

        if app.should_quit {
            return Ok(());
        }

        if event::poll(TICK).map_err(|e| format!("event error: {e}"))? {
            match event::read().map_err(|e| format!("event error: {e}"))? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }
    }
}

/// Handle keyboard input for the current screen.
fn handle_key(app: &mut App, key: KeyEvent) {
    // Ctrl+C always quits
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    match key.code {
        KeyCode::Char('q') => {
            app.quit();
            return;
        }
        KeyCode::Char('?') => {
            app.show_help = !app.show_help;
            return;
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Setup => match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.setup.prev_genre(),
            KeyCode::Down | KeyCode::Char('j') => app.setup.next_genre(),
            KeyCode::Left => app.setup.prev_model(),
            KeyCode::Right => app.setup.next_model(),
            KeyCode::Char(c) if c.is_ascii_digit() => app.setup.push_digit(c),
            KeyCode::Backspace => app.setup.backspace(),
            KeyCode::Char('l') => app.load(),
            KeyCode::Enter => app.submit_setup(),
            _ => {}
        },
        Screen::Story => match key.code {
            KeyCode::Char(c @ '1'..='4') => app.choose(c as usize - '1' as usize),
            KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
            KeyCode::Char('r') => app.restart(),
            _ => {}
        },
    }
}

/// Handle mouse clicks on choice slots and scrolling.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(slot) = views::hit_test(mouse.column, mouse.row, app.choices_area) {
                app.choose(slot);
            }
        }
        MouseEventKind::ScrollUp => app.scroll_up(),
        MouseEventKind::ScrollDown => app.scroll_down(),
        _ => {}
    }
}
