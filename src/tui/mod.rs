//! Interactive terminal browser.
//!
//! The control loop owns the [`App`] (and through it the
//! `BrowserController`). It waits on two sources with `tokio::select!`:
//! terminal key presses, read on a blocking thread, and background events
//! from the controller's channel. The screen is redrawn after each.

mod app;
mod highlight;
mod view;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use idgames_core::browser::BrowserController;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

use app::App;

/// How long the key reader blocks before checking whether the browser closed.
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(100);

type BrowserTerminal = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> Result<BrowserTerminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Failed to initialise terminal")
}

fn restore_terminal(terminal: &mut BrowserTerminal) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Reads key presses until the receiving side is dropped.
fn spawn_key_reader() -> UnboundedReceiver<KeyEvent> {
    let (tx, rx) = unbounded_channel();
    tokio::task::spawn_blocking(move || read_keys(&tx));
    rx
}

fn read_keys(tx: &UnboundedSender<KeyEvent>) {
    while !tx.is_closed() {
        match event::poll(KEY_POLL_INTERVAL) {
            Ok(false) => {}
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if tx.send(key).is_err() {
                        return;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(error = %error, "terminal read failed");
                    return;
                }
            },
            Err(error) => {
                warn!(error = %error, "terminal poll failed");
                return;
            }
        }
    }
}

/// Runs the browser until the user quits. The latest uploads are listed on
/// start.
///
/// # Errors
///
/// Returns an error when the terminal cannot be set up or drawn to.
pub async fn run(controller: BrowserController) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let outcome = event_loop(&mut terminal, App::new(controller)).await;
    let restored = restore_terminal(&mut terminal);
    outcome?;
    restored.context("Failed to restore terminal")
}

async fn event_loop(terminal: &mut BrowserTerminal, mut app: App) -> Result<()> {
    let mut keys = spawn_key_reader();
    app.start();
    info!("browser started");

    while !app.should_quit() {
        terminal
            .draw(|frame| view::draw(frame, &app))
            .context("Failed to draw browser")?;

        tokio::select! {
            key = keys.recv() => match key {
                Some(key) => app.handle_key(key),
                None => {
                    debug!("key reader stopped");
                    break;
                }
            },
            Some(event) = app.controller_mut().next_event() => {
                app.handle_event(event);
                while let Some(event) = app.controller_mut().try_next_event() {
                    app.handle_event(event);
                }
            }
        }
    }

    info!("browser closed");
    Ok(())
}
