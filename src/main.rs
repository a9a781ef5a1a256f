//! Airtable to Webflow CMS sync tool
//!
//! Mirrors one configured Airtable table into a Webflow collection:
//! `flowsync [sync id or name]`

// flowsync/src/main.rs
mod airtable;
mod config;
mod errors;
mod http;
mod model;
mod sync;
mod utils;
mod webflow;

use anyhow::{Context, Result};
use config::AppConfig;
use std::env;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Main entry point for the sync tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    match run_app().await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flowsync=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_app() -> Result<()> {
    let config_path = AppConfig::default_path();
    let app_config = AppConfig::load_from_json(&config_path)
        .context(format!("Failed to load application configuration from {}", config_path.display()))?;

    let choice = env::args().nth(1);
    let sync = app_config.select_sync(choice.as_deref())?;

    println!(
        "⚙️ Starting sync \"{}\" ({} → {})...",
        sync.name, sync.airtable.table.name, sync.webflow.collection.name
    );
    let summary = sync::run_sync_flow(&app_config, sync)
        .await
        .context("Sync process failed")?;

    if summary.failed > 0 {
        println!(
            "⚠️ {} records failed to sync; their errors were written to the Airtable errors field.",
            summary.failed
        );
    }
    Ok(())
}
