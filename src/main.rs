mod app;
mod config;
mod members;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "kanri")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "A terminal-friendly admin panel for member rosters")]
struct Args {
    /// Member list endpoint (overrides the config file)
    #[arg(short, long)]
    source: Option<String>,

    /// Fetch the member list and print it as JSON (no TUI)
    #[arg(short, long)]
    dump: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = AppConfig::load().unwrap_or_default();

    let source_url = args
        .source
        .or_else(|| config.source_url.clone())
        .unwrap_or_else(|| members::DEFAULT_SOURCE_URL.to_string());

    // Handle CLI-only commands
    if args.dump {
        return dump_members(&source_url).await;
    }

    run_tui(config, &source_url).await
}

async fn dump_members(url: &str) -> Result<()> {
    let members = members::fetch_members(url).await?;
    println!("{}", serde_json::to_string_pretty(&members)?);
    Ok(())
}

async fn run_tui(config: AppConfig, source_url: &str) -> Result<()> {
    // Load the roster before taking over the terminal; a failed fetch
    // just leaves the table empty
    let mut app = App::new(config);
    match members::fetch_members(source_url).await {
        Ok(members) => app.set_members(members),
        Err(e) => tracing::warn!("Member fetch failed, starting empty: {}", e),
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.can_quit() => return Ok(()),
                        KeyCode::Char('c')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key) {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        // Periodic refresh
        app.tick();
    }
}
