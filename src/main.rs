use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self as term, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use taskboard::api::HttpTaskApi;
use taskboard::app::{App, Message};
use taskboard::auth::FirebaseAuth;
use taskboard::config::Config;
use taskboard::event::handle_event;
use taskboard::store::Store;
use taskboard::{logging, ui};

const POLL: Duration = Duration::from_millis(50);

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::load();
    config.validate()?;
    let _log = logging::init(&config.log_dir()?)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let _rt = runtime.enter();

    let api = Arc::new(HttpTaskApi::new(&config.api_url));
    let identity = Arc::new(FirebaseAuth::new(
        &config.identity_url,
        &config.firebase_api_key,
    ));
    let (mut app, rx) = App::new(
        api,
        identity,
        Store::new(config.toast_duration()),
        config.start_route(),
    );
    app.spawn_auth_bridge();
    info!(api = %config.api_url, start = %config.start, "starting");

    // Terminal setup
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("exiting");
    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut rx: UnboundedReceiver<Message>,
) -> Result<()> {
    app.sync_route();
    loop {
        while let Ok(message) = rx.try_recv() {
            app.handle(message);
        }
        app.tick(Instant::now());
        app.sync_route();

        terminal.draw(|f| ui::draw(f, app))?;
        if app.should_quit {
            return Ok(());
        }

        if term::poll(POLL)? {
            let size = terminal.size()?;
            let area = Rect::new(0, 0, size.width, size.height);
            handle_event(app, term::read()?, area);
        }
    }
}
