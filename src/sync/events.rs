//! Progress, error and completion events emitted while a sync runs.
//!
//! The orchestrator never renders anything itself; callers subscribe to the
//! channel returned by [`EventEmitter::channel`].

use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::model::{DestinationItem, MatchedItem, RecordWithErrors, SourceRecord};
use crate::sync::partition::Partition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPhase {
    FetchingData,
    ParsingData,
    CreatingItems,
    UpdatingItems,
    DeletingItems,
    UpdatingRecords,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::FetchingData => "fetching-data",
            SyncPhase::ParsingData => "parsing-data",
            SyncPhase::CreatingItems => "creating-items",
            SyncPhase::UpdatingItems => "updating-items",
            SyncPhase::DeletingItems => "deleting-items",
            SyncPhase::UpdatingRecords => "updating-records",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressKind {
    Spinner,
    Start { total: usize },
    Advance { increment: usize },
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub phase: SyncPhase,
    pub message: String,
    pub kind: ProgressKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Everything a run saw and did, for external persistence.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerboseLogs {
    pub source_records: Vec<SourceRecord>,
    pub destination_items: Vec<DestinationItem>,
    pub partition: Option<Partition>,
    pub created: Vec<MatchedItem>,
    pub updated: Vec<MatchedItem>,
    pub deleted: Vec<SourceRecord>,
    pub failed: Vec<RecordWithErrors>,
    pub orphans_deleted: Vec<String>,
    pub orphans_failed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CompletionEvent {
    pub elapsed_secs: f64,
    pub summary: SyncSummary,
    pub logs: Option<VerboseLogs>,
}

#[derive(Debug, Clone)]
pub enum SyncEvent {
    Progress(ProgressEvent),
    Error { message: String, fatal: bool },
    Complete(CompletionEvent),
}

/// Sending half of the event stream. Events sent after the receiver is
/// dropped are discarded.
#[derive(Debug, Clone, Default)]
pub struct EventEmitter {
    tx: Option<UnboundedSender<SyncEvent>>,
}

impl EventEmitter {
    pub fn channel() -> (Self, UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// An emitter nobody listens to.
    #[cfg(test)]
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: SyncEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    fn progress(&self, phase: SyncPhase, message: impl Into<String>, kind: ProgressKind) {
        self.emit(SyncEvent::Progress(ProgressEvent {
            phase,
            message: message.into(),
            kind,
        }));
    }

    pub fn spinner(&self, phase: SyncPhase, message: impl Into<String>) {
        self.progress(phase, message, ProgressKind::Spinner);
    }

    pub fn start(&self, phase: SyncPhase, message: impl Into<String>, total: usize) {
        self.progress(phase, message, ProgressKind::Start { total });
    }

    pub fn advance(&self, phase: SyncPhase, increment: usize) {
        self.progress(phase, String::new(), ProgressKind::Advance { increment });
    }

    pub fn end(&self, phase: SyncPhase, message: impl Into<String>) {
        self.progress(phase, message, ProgressKind::End);
    }

    pub fn error(&self, message: impl Into<String>, fatal: bool) {
        self.emit(SyncEvent::Error {
            message: message.into(),
            fatal,
        });
    }

    pub fn complete(&self, event: CompletionEvent) {
        self.emit(SyncEvent::Complete(event));
    }
}
