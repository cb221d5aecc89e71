//! Patient TUI - Terminal User Interface for a patient profile
//!
//! A Ratatui-based TUI for browsing a patient's visits and documents and
//! filling clinical forms against a REST records API.

mod api;
mod app;
mod config;
mod doctors;
mod forms;
mod platform;
mod state;
mod ui;

use anyhow::Result;
use app::App;
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use forms::TemplateId;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_NAME: &str = "patient-tui.log";

#[derive(Parser)]
#[command(name = "patient-tui")]
#[command(about = "Patient profile TUI for the clinical records API")]
struct Cli {
    /// Patient whose profile is opened
    #[arg(long, env = "PATIENT_TUI_PATIENT_ID")]
    patient: String,
    /// Clinician the session acts as (overrides the config file)
    #[arg(long)]
    clinician: Option<String>,
    /// Primary API base URL (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,
    /// Fallback API base URL for form templates and structures
    #[arg(long)]
    fallback_url: Option<String>,
    /// Form template to open once the template list of a visit loads
    #[arg(long)]
    template: Option<TemplateId>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(id) = &self.clinician {
            config.clinician_id = Some(id.clone());
        }
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(url) = &self.fallback_url {
            config.fallback_api_base_url = url.clone();
        }
    }
}

/// Log to a file in the data directory; stderr would draw over the TUI
fn log_writer() -> BoxMakeWriter {
    let file = AppConfig::data_dir().and_then(|dir| {
        fs::create_dir_all(&dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE_NAME))
            .ok()
    });
    match file {
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None => BoxMakeWriter::new(io::stderr),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patient_tui=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(log_writer()),
        )
        .init();

    let mut config = AppConfig::load()?;
    cli.apply(&mut config);

    // Load the profile before taking over the terminal
    let mut app = App::new(config, cli.patient, cli.template).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Apply finished background work before drawing
        app.drain_events();

        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Global quit: Ctrl+C
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                app.handle_key(key).await?;
            }
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}
