//! Console Capture Store
//!
//! The dashboard shows the raw output of the most recent CLI invocation per
//! named context (`dashboard`, `payments`). The store is owned by the
//! application state and passed explicitly to whoever records or renders -
//! there is no process-wide global. Entries are overwritten, never merged.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde::Serialize;

use crate::runner::CommandResult;

/// Snapshot of one CLI invocation for display.
#[derive(Clone, Debug, Serialize)]
pub struct ConsoleEntry {
    pub command: String,
    pub label: String,
    pub timestamp: String,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub returncode: i32,
}

impl ConsoleEntry {
    pub fn from_result(label: impl Into<String>, result: &CommandResult) -> Self {
        Self {
            command: result.command_line(),
            label: label.into(),
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            stdout: result.stdout.lines().map(str::to_string).collect(),
            stderr: result.stderr.lines().map(str::to_string).collect(),
            returncode: result.returncode,
        }
    }
}

/// Last console output per named context.
#[derive(Default)]
pub struct ConsoleStore {
    entries: RwLock<HashMap<String, ConsoleEntry>>,
}

impl ConsoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry, replacing whatever the context held before.
    pub fn record(&self, context: &str, entry: ConsoleEntry) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(context.to_string(), entry);
    }

    pub fn get(&self, context: &str) -> Option<ConsoleEntry> {
        let entries = self.entries.read().unwrap();
        entries.get(context).cloned()
    }
}
