// flowsync/src/sync/mod.rs
pub mod api;
pub mod batch;
pub mod classify;
pub mod delete;
pub mod events;
pub(crate) mod logic;
pub mod mutate;
pub mod parse;
pub mod partition;
pub mod reconcile;
pub mod writeback;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::airtable::AirtableClient;
use crate::config::AppConfig;
use crate::model::SyncConfig;
use crate::utils::verbose_log::write_verbose_log;
use crate::webflow::WebflowClient;
use events::{EventEmitter, ProgressKind, SyncEvent, SyncSummary, VerboseLogs};
use logic::{SyncContext, run_sync};

/// Public entry point for one sync run.
/// Builds the API clients, renders events to the console and persists the
/// verbose log when the sync asks for one.
pub async fn run_sync_flow(app_config: &AppConfig, sync: &SyncConfig) -> Result<SyncSummary> {
    let credentials = app_config.credentials_for(sync)?;
    let airtable = AirtableClient::new(&credentials.airtable).context("Failed to build the Airtable client")?;
    let webflow = WebflowClient::new(&credentials.webflow).context("Failed to build the Webflow client")?;

    let (events, rx) = EventEmitter::channel();
    let printer = tokio::spawn(print_events(rx));

    let ctx = SyncContext {
        sync,
        source: &airtable,
        destination: &webflow,
    };
    let outcome = run_sync(ctx, &events).await;
    // Closing the channel lets the printer drain and finish.
    drop(events);
    let logs = printer.await.context("Event printer task failed")?;

    let summary = outcome.with_context(|| format!("Sync \"{}\" failed", sync.name))?;

    if let Some(logs) = logs {
        let path = write_verbose_log(&app_config.log_dir, &sync.name, &logs)?;
        info!(path = %path.display(), "verbose log written");
        println!("📝 Verbose log written to {}", path.display());
    }
    Ok(summary)
}

/// Prints progress as it arrives and hands back the verbose logs carried by
/// the completion event, if any.
async fn print_events(mut rx: UnboundedReceiver<SyncEvent>) -> Option<VerboseLogs> {
    let mut logs = None;
    let (mut done, mut total) = (0usize, 0usize);

    while let Some(event) = rx.recv().await {
        match event {
            SyncEvent::Progress(progress) => match progress.kind {
                ProgressKind::Spinner => println!("⏳ {}", progress.message),
                ProgressKind::Start { total: phase_total } => {
                    (done, total) = (0, phase_total);
                    println!("🚀 {}", progress.message);
                }
                ProgressKind::Advance { increment } => {
                    done += increment;
                    println!("   {} {}/{}", progress.phase.as_str(), done, total);
                }
                ProgressKind::End => println!("✅ {}", progress.message),
            },
            SyncEvent::Error { message, fatal: true } => eprintln!("❌ {}", message),
            SyncEvent::Error { message, fatal: false } => println!("⚠️ {}", message),
            SyncEvent::Complete(done_event) => {
                let s = done_event.summary;
                println!(
                    "🏁 Finished in {:.1}s: {} created, {} updated, {} deleted, {} failed",
                    done_event.elapsed_secs, s.created, s.updated, s.deleted, s.failed
                );
                logs = done_event.logs;
            }
        }
    }
    logs
}
