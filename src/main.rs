use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod controller;
mod domain;
mod fetch;
mod filter;
mod form;
mod inputter;
mod model;
mod record;
mod repo;
mod store;
mod table;
mod theme;
mod ui;

use controller::Controller;
use domain::{AppConfig, AppError};
use model::{Model, Status};
use repo::Services;
use store::KvStore;

#[derive(Parser, Debug)]
#[command(
    name = "opsdash",
    about = "A tui based back-office dashboard over mock store data.",
    version
)]
struct Cli {
    /// JSON state file holding the session and theme preference
    #[arg(long, default_value = "~/.local/state/opsdash/state.json")]
    state_file: String,

    /// Simulated service latency in milliseconds
    #[arg(long, default_value_t = 500)]
    latency_ms: u64,

    /// Rows per page on the list screens
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Write logs to this file (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<String>,

    /// Log filter, e.g. "info" or "opsdash=trace"
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(()) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = AppConfig::default()
        .with_state_file(expand(&cli.state_file))
        .with_latency(Duration::from_millis(cli.latency_ms))
        .with_page_size(cli.page_size.max(1));
    info!("Starting opsdash with {config:?}");

    let store = KvStore::open(&config.state_file);
    let (mut model, completions) = Model::init(&config, Services::seeded(), store);
    let controller = Controller::new(&config, completions);

    let mut terminal = ratatui::init();
    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui::draw(&model, f))?;

        // Handle terminal events and fetch completions, map to messages
        for message in controller.handle_events(&model)? {
            model.update(message);
        }
    }

    Ok(())
}

fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(path),
    }
}

fn init_tracing(cli: &Cli) -> Result<(), AppError> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(expand(path))?;
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
