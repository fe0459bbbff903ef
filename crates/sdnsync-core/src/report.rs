// ── Run reporting ──
//
// Operator-facing output goes through the `Reporter` trait so the engine
// stays agnostic of where messages land (job log, captured buffer, …).
// Diagnostics for developers use `tracing` directly.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

// ── Reporter ────────────────────────────────────────────────────────

/// Sink for operator-facing run messages.
///
/// `failed()` reports whether any failure was logged; the import entry
/// point folds it into its success boolean.
pub trait Reporter: Send + Sync {
    fn log_info(&self, message: &str);
    fn log_warning(&self, message: &str);
    fn log_failure(&self, message: &str);
    fn failed(&self) -> bool;
}

/// Reporter that forwards to `tracing` at info/warn/error levels.
#[derive(Debug, Default)]
pub struct TracingReporter {
    any_failure: AtomicBool,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for TracingReporter {
    fn log_info(&self, message: &str) {
        info!("{message}");
    }

    fn log_warning(&self, message: &str) {
        warn!("{message}");
    }

    fn log_failure(&self, message: &str) {
        self.any_failure.store(true, Ordering::Relaxed);
        error!("{message}");
    }

    fn failed(&self) -> bool {
        self.any_failure.load(Ordering::Relaxed)
    }
}

/// Severity of a collected report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Info,
    Warning,
    Failure,
}

/// Reporter that buffers messages in memory.
///
/// Used by tests and by embedders that surface run output after the
/// fact instead of streaming it.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    entries: Mutex<Vec<(ReportLevel, String)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All collected entries, in order.
    pub fn entries(&self) -> Vec<(ReportLevel, String)> {
        self.entries.lock().expect("reporter lock poisoned").clone()
    }

    /// Only the messages at one level.
    pub fn messages_at(&self, level: ReportLevel) -> Vec<String> {
        self.entries
            .lock()
            .expect("reporter lock poisoned")
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn failures(&self) -> Vec<String> {
        self.messages_at(ReportLevel::Failure)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages_at(ReportLevel::Warning)
    }

    fn push(&self, level: ReportLevel, message: &str) {
        self.entries
            .lock()
            .expect("reporter lock poisoned")
            .push((level, message.to_owned()));
    }
}

impl Reporter for CollectingReporter {
    fn log_info(&self, message: &str) {
        self.push(ReportLevel::Info, message);
    }

    fn log_warning(&self, message: &str) {
        self.push(ReportLevel::Warning, message);
    }

    fn log_failure(&self, message: &str) {
        self.push(ReportLevel::Failure, message);
    }

    fn failed(&self) -> bool {
        self.entries
            .lock()
            .expect("reporter lock poisoned")
            .iter()
            .any(|(l, _)| *l == ReportLevel::Failure)
    }
}

// ── Run report ──────────────────────────────────────────────────────

/// Prototype counts by lifecycle state for one controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub discovered: usize,
    pub imported: usize,
    pub deleted: usize,
}

impl StatusSummary {
    pub fn total(&self) -> usize {
        self.discovered + self.imported + self.deleted
    }
}

/// Outcome of one fetch-and-score pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub controller: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Raw device records fetched from the controller.
    pub devices_fetched: usize,
    /// Synthetic units after stack/chassis splitting.
    pub units_split: usize,
    pub prototypes_upserted: usize,
    /// Prototypes tombstoned by deletion detection in this pass.
    pub prototypes_deleted: usize,
    pub status_summary: StatusSummary,
    pub success: bool,
}

impl RunReport {
    pub fn started(controller: Uuid) -> Self {
        Self {
            controller,
            started_at: Utc::now(),
            finished_at: None,
            devices_fetched: 0,
            units_split: 0,
            prototypes_upserted: 0,
            prototypes_deleted: 0,
            status_summary: StatusSummary::default(),
            success: false,
        }
    }

    pub fn finish(&mut self, success: bool) {
        self.finished_at = Some(Utc::now());
        self.success = success;
    }
}
