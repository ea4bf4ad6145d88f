use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use study_planner::{
    GeminiClient, GoogleCalendarClient, Settings, SqliteRecordStore, http_api, logging,
};

/// Study planner HTTP API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a planner.toml settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen address (e.g. 127.0.0.1:3000)
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        settings.http.addr = addr;
    }
    let secrets = settings.load_secrets()?;

    let store = SqliteRecordStore::new(&settings.store.path)
        .with_context(|| format!("opening record store {}", settings.store.path.display()))?;
    let mut state = http_api::AppState::new(Arc::new(store))
        .with_defaults(settings.schedule.clone())
        .with_pacing(Duration::from_millis(settings.generation.pacing_ms));

    if let Some(client) = GeminiClient::from_settings(&settings.generation, &secrets)? {
        state = state.with_generator(Arc::new(client));
    }
    if let Some(client) = GoogleCalendarClient::from_settings(&settings.calendar, &secrets)? {
        state = state.with_calendar(Arc::new(client));
    }

    let addr: SocketAddr = settings
        .http
        .addr
        .parse()
        .with_context(|| format!("invalid listen address '{}'", settings.http.addr))?;

    tracing::info!(%addr, "study-planner HTTP API listening");
    println!("study-planner HTTP API listening on http://{addr}");
    http_api::serve(addr, state).await?;
    Ok(())
}
