// src/models/rule.rs

//! Crawl rule: one declarative scraping configuration per brand page.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::FieldSelectors;

/// How often an active rule becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    Hourly,
    Daily,
    Weekly,
}

impl Schedule {
    /// The schedule period as a duration.
    pub fn period(&self) -> Duration {
        match self {
            Schedule::Hourly => Duration::seconds(3600),
            Schedule::Daily => Duration::seconds(86_400),
            Schedule::Weekly => Duration::seconds(604_800),
        }
    }

    /// Literal token used in persisted records and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Schedule::Hourly => "hourly",
            Schedule::Daily => "daily",
            Schedule::Weekly => "weekly",
        }
    }

    /// Parse a schedule token.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Some(Schedule::Hourly),
            "daily" => Some(Schedule::Daily),
            "weekly" => Some(Schedule::Weekly),
            _ => None,
        }
    }
}

/// A scraping configuration bound to one brand.
///
/// The identifier is immutable after creation; `last_run_at` is the only
/// field the scheduler writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRule {
    /// Unique, stable identifier
    pub id: String,

    /// Brand the scraped campaigns belong to (weak reference)
    pub brand_id: String,

    /// Target page URL
    pub url: String,

    /// Field extraction selectors
    pub selectors: FieldSelectors,

    /// Recurrence period
    pub schedule: Schedule,

    /// Whether the scheduler may select this rule
    pub is_active: bool,

    /// Completion time of the most recent run, None if never run
    pub last_run_at: Option<DateTime<Utc>>,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl CrawlRule {
    /// Whether the rule is due at `now`: active, and either never run or
    /// past its schedule period since the last run.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.last_run_at {
            None => true,
            Some(last) => now - last >= self.schedule.period(),
        }
    }
}

/// Fields required to create a rule; the store mints the id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDraft {
    pub brand_id: String,
    pub url: String,
    #[serde(default)]
    pub selectors: FieldSelectors,
    pub schedule: Schedule,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update applied by admin edits; absent fields stay untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<FieldSelectors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
