//! Per-item outcomes and the end-of-run summary

use crate::core::error::ItemError;
use chrono::{DateTime, Utc};
use std::fmt;

/// Exit code when every item was attempted (default policy)
pub const EXIT_OK: i32 = 0;
/// Exit code for a failed precondition
pub const EXIT_FATAL: i32 = 1;
/// Exit code in strict mode when at least one item failed
pub const EXIT_ITEM_FAILURES: i32 = 2;

/// Kind of subprocess invocation an item corresponds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Pack,
    Publish,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Query => "query",
            Operation::Pack => "pack",
            Operation::Publish => "publish",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Outcome of one attempted item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Succeeded,
    Failed(ItemError),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded)
    }
}

impl From<Result<(), ItemError>> for ItemOutcome {
    fn from(result: Result<(), ItemError>) -> Self {
        match result {
            Ok(()) => ItemOutcome::Succeeded,
            Err(e) => ItemOutcome::Failed(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub operation: Operation,
    /// Package spec (`name@version`), package name or artifact path
    pub label: String,
    pub outcome: ItemOutcome,
}

/// Ordered record of everything a run attempted
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub records: Vec<ItemRecord>,
}

impl RunSummary {
    pub fn new<S: Into<String>>(run_id: S) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Utc::now(),
            records: Vec::new(),
        }
    }

    pub fn record<S: Into<String>>(&mut self, operation: Operation, label: S, outcome: ItemOutcome) {
        self.records.push(ItemRecord {
            operation,
            label: label.into(),
            outcome,
        });
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &ItemRecord> {
        self.records.iter().filter(|r| r.outcome.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ItemRecord> {
        self.records.iter().filter(|r| !r.outcome.is_success())
    }

    /// Records of a single operation kind, in attempt order
    pub fn attempts(&self, operation: Operation) -> impl Iterator<Item = &ItemRecord> {
        self.records.iter().filter(move |r| r.operation == operation)
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    /// Process exit code for a completed run.
    ///
    /// Per-item failures only change the exit code in strict mode.
    pub fn exit_code(&self, strict: bool) -> i32 {
        if strict && self.has_failures() {
            EXIT_ITEM_FAILURES
        } else {
            EXIT_OK
        }
    }

    /// Print the run summary
    pub fn print(&self) {
        let elapsed = Utc::now() - self.started_at;
        let failed: Vec<&ItemRecord> = self.failed().collect();

        println!("\n{}", "=".repeat(60));
        println!("📊 Run Summary ({})", self.run_id);
        println!("{}", "=".repeat(60));

        for operation in [Operation::Query, Operation::Pack, Operation::Publish] {
            let total = self.attempts(operation).count();
            if total == 0 {
                continue;
            }
            let ok = self
                .attempts(operation)
                .filter(|r| r.outcome.is_success())
                .count();
            println!("  {:<8} {} attempted, {} succeeded", operation, total, ok);
        }

        println!("\n✅ Succeeded: {}", self.succeeded().count());
        println!("❌ Failed: {}", failed.len());
        for record in &failed {
            if let ItemOutcome::Failed(error) = &record.outcome {
                println!("   - [{}] {}: {}", record.operation, record.label, error);
            }
        }

        println!("\n{}", "=".repeat(60));
        println!("Elapsed: {}s", elapsed.num_seconds());
        println!("{}\n", "=".repeat(60));
    }
}
