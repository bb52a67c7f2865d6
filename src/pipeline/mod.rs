//! Pipeline entry points for crawler operations.
//!
//! The scheduler owns the rule lifecycle: it evaluates which rules are due,
//! dispatches fetch -> extract -> reconcile cycles, and records every run
//! back onto its rule.

pub mod scheduler;

pub use scheduler::{RuleState, RunHandle, Scheduler};
