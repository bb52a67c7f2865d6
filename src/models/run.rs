// src/models/run.rs

//! Ephemeral record of one crawl execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a dispatched run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every item extracted and reconciled
    Success { items: usize },

    /// Document retrieval failed; no upsert happened
    FetchFailed { kind: String, message: String },

    /// The page yielded no usable candidates; no upsert happened
    ExtractionFailed { message: String },

    /// Some items extracted and reconciled, others failed extraction
    Partial { items: usize, failures: usize },
}

impl RunOutcome {
    /// Whether any candidates reached the upsert engine.
    pub fn reconciled(&self) -> bool {
        matches!(self, RunOutcome::Success { .. } | RunOutcome::Partial { .. })
    }
}

/// Counts produced by one reconcile call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileResult {
    /// Campaigns inserted as new
    pub inserted: usize,
    /// Campaigns whose extracted fields changed
    pub updated: usize,
    /// Previously active campaigns expired by the sweep
    pub expired: usize,
    /// Matched campaigns where only last_seen_at moved
    pub unchanged: usize,
}

impl ReconcileResult {
    /// True when the call left the catalog untouched apart from last_seen.
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.expired == 0
    }
}

/// One execution of a rule, from dispatch to record_run.
///
/// Not persisted: consumed by logs, metrics and the rule's last-run
/// timestamp, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRun {
    pub rule_id: String,
    pub brand_id: String,
    pub started_at: DateTime<Utc>,
    pub outcome: RunOutcome,

    /// Present when the outcome reached the upsert engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconcile: Option<ReconcileResult>,
}

impl CrawlRun {
    /// One-line summary for operator logs.
    pub fn summary(&self) -> String {
        match (&self.outcome, &self.reconcile) {
            (RunOutcome::Success { items }, Some(r)) => format!(
                "{}: {} items ({} inserted, {} updated, {} expired)",
                self.rule_id, items, r.inserted, r.updated, r.expired
            ),
            (RunOutcome::Partial { items, failures }, Some(r)) => format!(
                "{}: partial, {} items / {} failures ({} inserted, {} updated, {} expired)",
                self.rule_id, items, failures, r.inserted, r.updated, r.expired
            ),
            (RunOutcome::FetchFailed { kind, .. }, _) => {
                format!("{}: fetch failed ({kind})", self.rule_id)
            }
            (RunOutcome::ExtractionFailed { message }, _) => {
                format!("{}: extraction failed ({message})", self.rule_id)
            }
            (outcome, None) => format!("{}: {:?}", self.rule_id, outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_reconciled() {
        assert!(RunOutcome::Success { items: 3 }.reconciled());
        assert!(
            RunOutcome::Partial {
                items: 2,
                failures: 1
            }
            .reconciled()
        );
        assert!(
            !RunOutcome::FetchFailed {
                kind: "timeout".to_string(),
                message: String::new()
            }
            .reconciled()
        );
    }

    #[test]
    fn test_reconcile_noop() {
        let mut result = ReconcileResult::default();
        result.unchanged = 5;
        assert!(result.is_noop());
        result.expired = 1;
        assert!(!result.is_noop());
    }
}
