/// Signal Dashboard
///
/// Streams BUY/SELL/HOLD signals from the signal backend and renders price,
/// signal, a simulated order form and market news in the terminal.
use std::{
    error::Error,
    fs::File,
    io,
    sync::Mutex,
    time::Instant,
};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use rustls::crypto::ring::default_provider;
use signal_dashboard::{App, DashboardConfig, render_ui};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize logging to a file; the terminal belongs to the dashboard
fn init_logging(config: &DashboardConfig) -> Result<(), Box<dyn Error>> {
    let file = File::create(&config.log_path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Sleep until the order banner deadline, or forever if none is armed
async fn order_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &DashboardConfig,
) -> Result<(), Box<dyn Error>> {
    let (mut app, mut session_rx) = App::new(config);
    let mut terminal_events = EventStream::new();

    loop {
        terminal.draw(|f| render_ui(f, &app))?;

        let deadline = app.order_form().deadline();
        tokio::select! {
            maybe_event = terminal_events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => app.handle_key(key, Instant::now()),
                Some(Ok(_)) => {
                    // Resize and mouse events only need a redraw
                }
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(event) = session_rx.recv() => app.handle_session_event(event),
            _ = order_deadline(deadline) => {
                app.tick(Instant::now());
            }
        }

        if app.should_quit() {
            break;
        }
    }

    info!("Dashboard exiting");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = default_provider().install_default();

    let config = DashboardConfig::from_env()?;
    init_logging(&config)?;
    info!(url = %config.ws_url, "Starting signal dashboard");

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &config).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}
