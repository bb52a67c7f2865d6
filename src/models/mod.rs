// src/models/mod.rs

//! Domain models for the deal crawler.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod brand;
mod campaign;
mod config;
mod rule;
mod run;
mod selectors;

// Re-export all public types
pub use brand::{Brand, Category};
pub use campaign::{Campaign, CampaignPatch, CampaignStatus, Candidate};
pub use config::{Config, CrawlerConfig, SchedulerConfig};
pub use rule::{CrawlRule, RuleDraft, RuleUpdate, Schedule};
pub use run::{CrawlRun, ReconcileResult, RunOutcome};
pub use selectors::{Field, FieldSelectors};
