//! SORI terminal client
//!
//! Chat screen, admin dashboard and modals rendered with ratatui. Logs go
//! to a file because the terminal belongs to the UI.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use sori::app::App;
use sori::client::{HttpAdminGateway, HttpChatTransport, LoggingTransport};
use sori::config::ClientConfig;
use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Input poll interval; backend results are applied between polls
const TICK: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env();

    // Initialize logging
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sori=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    let backend = config.backend_base();
    tracing::info!(
        %backend,
        chat_timeout_secs = config.chat_timeout.as_secs(),
        admin_login = config.admin.is_some(),
        "SORI client starting up"
    );
    if config.admin.is_none() {
        tracing::warn!("Admin login disabled. Set SORI_ADMIN_ID and SORI_ADMIN_PASSWORD.");
    }

    let http = reqwest::Client::builder().build()?;
    let chat = HttpChatTransport::from_config(http.clone(), &config);
    let transport = Arc::new(LoggingTransport::new(Arc::new(chat.clone())));
    let admin = Arc::new(HttpAdminGateway::from_config(http, &config));

    let mut app = App::new(transport, admin, config.admin.clone());
    app.probe_backend(chat);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("SORI client shutting down");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.drain_events();
        terminal.draw(|frame| sori::tui::render(frame, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = sori::tui::action_for_key(app, key) {
                    app.dispatch(action);
                }
            }
        }

        if app.view.should_quit {
            return Ok(());
        }
    }
}
