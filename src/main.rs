//! Terminal practice runner (default binary).
//!
//! Uses crossterm for input and the framebuffer renderer from `blockfall-term`. Key events
//! are read on a dedicated thread and forwarded to the session loop, which runs on a
//! current-thread tokio runtime.

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use blockfall::adapter::{Config, FileStore};
use blockfall::engine::{run_practice, Command, LoopConfig, PracticeSession};
use blockfall::input::{handle_key_event, should_quit};
use blockfall::term::{FrameBuffer, GameView, Hud, TerminalRenderer, Viewport};
use blockfall::types::EngineStatus;

fn main() -> Result<()> {
    let config = Config::from_env();
    init_logging(&config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building runtime")?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = runtime.block_on(run(&config, &mut term));

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// File logging only; stdout belongs to the game screen.
fn init_logging(config: &Config) -> Result<()> {
    let Some(path) = config.log_path.as_ref() else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run(config: &Config, term: &mut TerminalRenderer) -> Result<()> {
    let store = FileStore::new(&config.data_dir);
    let mut session = PracticeSession::new(config.seed, Box::new(store))?;
    if let Some(profile) = session.profile() {
        tracing::info!(player = %profile.full_display_name, "profile loaded");
    }

    let (tx, mut rx) = mpsc::channel(64);
    spawn_input_thread(tx);
    session.apply_action(blockfall::types::GameAction::Start)?;

    let view = GameView::default();
    let mut fb = FrameBuffer::new(0, 0);
    let mut draw_error = None;
    let player = session.profile().map(|p| p.full_display_name.clone());

    run_practice(
        &mut session,
        &mut rx,
        LoopConfig::from_config(config),
        |session| {
            if draw_error.is_some() {
                return;
            }
            let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
            let engine = session.engine();
            let banner = match engine.status() {
                EngineStatus::GameOver => Some("R TO RESTART  Q TO QUIT"),
                EngineStatus::Paused => Some("P TO RESUME"),
                _ => None,
            };
            let hud = Hud {
                player: player.as_deref(),
                best: Some(session.best_score()),
                banner,
                ..Hud::new("PRACTICE", engine.stats())
            };
            view.render_into(&session.render_view(), &hud, &[], Viewport::new(w, h), &mut fb);
            if let Err(e) = term.draw_swap(&mut fb) {
                draw_error = Some(e);
            }
        },
    )
    .await?;

    match draw_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Blocking crossterm reads, forwarded until the loop stops listening.
fn spawn_input_thread(tx: mpsc::Sender<Command>) {
    thread::spawn(move || loop {
        if tx.is_closed() {
            return;
        }
        match event::poll(Duration::from_millis(100)) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                tracing::warn!(error = %e, "input poll failed");
                let _ = tx.blocking_send(Command::Quit);
                return;
            }
        }
        let command = match event::read() {
            Ok(Event::Key(key)) if should_quit(key) => Command::Quit,
            Ok(Event::Key(key)) => match handle_key_event(key) {
                Some(action) => Command::Action(action),
                None => continue,
            },
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "input read failed");
                Command::Quit
            }
        };
        let quit = command == Command::Quit;
        if tx.blocking_send(command).is_err() || quit {
            return;
        }
    });
}
