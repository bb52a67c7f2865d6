// src/store/mod.rs

//! Crawl rule ownership: CRUD, activation, last-run bookkeeping.

mod rules;

pub use rules::{RuleFilter, RuleStore};
