// Pick'em client entry point.
//
// Startup sequence:
// 1. Parse the command line
// 2. Initialize tracing (log to file, not terminal)
// 3. Load config
// 4. Open the session store and build the API client
// 5. Spawn the driver task
// 6. Run the TUI until the user quits
// 7. Wait briefly for the driver to wind down

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use pickem_api::ApiClient;
use pickem_app::app::{self, AppState};
use pickem_app::session::Session;
use pickem_core::config;
use pickem_core::db::SessionDb;
use pickem_core::models::{LeagueId, WeekId};

#[derive(Parser)]
#[command(name = "pickem")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Make your weekly picks against the spread")]
struct Cli {
    /// League id to open first (defaults to the first league you belong to)
    #[arg(long, value_name = "LEAGUE_ID")]
    league: Option<i64>,

    /// Backend week id to open first, not the week number (defaults to the
    /// sport's current week)
    #[arg(long, value_name = "WEEK_ID")]
    week: Option<i64>,

    /// Directory holding config/ and defaults/ (defaults to the working directory)
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;
    info!("Pick'em client starting up");

    let config = match &cli.config_dir {
        Some(dir) => {
            config::ensure_config_files(dir).context("failed to prepare configuration")?;
            config::load_config_from(dir)
        }
        None => config::load_config(),
    }
    .context("failed to load configuration")?;
    info!(
        "Config loaded: api={}, submit_style={:?}",
        config.api.base_url, config.api.submit_style
    );

    let db_path = config.resolve_db_path();
    let store = SessionDb::open(&db_path).context("failed to open session store")?;
    info!("Session store opened at {}", db_path);

    let client = ApiClient::new(&config.api).context("failed to build HTTP client")?;

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms);
    let app_state = AppState::new(
        config,
        Arc::new(client),
        Session::new(store),
        cli.league.map(LeagueId),
        cli.week.map(WeekId),
    );

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    if let Err(e) = pickem_tui::run(ui_rx, cmd_tx, tick_rate).await {
        error!("TUI error: {}", e);
    }

    let _ = tokio::time::timeout(Duration::from_secs(5), app_handle).await;

    info!("Pick'em client shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal belongs to the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("pickem.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pickem=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
