// src/pipeline/scheduler.rs

//! Rule scheduling and dispatch.
//!
//! A single logical loop evaluates all active rules on a fixed tick and
//! dispatches due rules as independent tasks. Rules are independent by
//! construction (each only touches its own brand's campaigns), so cycles
//! for different rules may overlap freely; what is excluded is two
//! concurrent cycles for the *same* rule.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::{Config, CrawlRule, CrawlRun, RunOutcome};
use crate::services::{Fetcher, UpsertEngine, extract};
use crate::store::{RuleFilter, RuleStore};

/// Derived per-rule state. Only `last_run_at` and `is_active` are stored;
/// the rest falls out of the clock and the in-flight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    /// Active, next due time in the future
    Idle,
    /// Active and past due (or never run)
    Due,
    /// A fetch/extract/reconcile cycle is in flight
    Running,
    /// Deactivated; skipped by tick evaluation entirely
    Disabled,
}

/// Handle for one dispatched rule run.
///
/// Awaitable and cancellable; dropping it detaches the run, which still
/// records its outcome.
pub struct RunHandle {
    pub rule_id: String,
    handle: JoinHandle<CrawlRun>,
}

impl RunHandle {
    /// Wait for the run to finish.
    pub async fn wait(self) -> Result<CrawlRun> {
        self.handle
            .await
            .map_err(|e| AppError::config(format!("run task failed: {e}")))
    }

    /// Abort the in-flight run.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Drives active crawl rules through their run cycle.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<RuleStore>,
    fetcher: Arc<dyn Fetcher>,
    engine: Arc<UpsertEngine>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    dispatch_slots: Arc<Semaphore>,
    tick_interval: Duration,
    dispatch_delay: Duration,
}

impl Scheduler {
    pub fn new(
        store: Arc<RuleStore>,
        fetcher: Arc<dyn Fetcher>,
        engine: Arc<UpsertEngine>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            fetcher,
            engine,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            dispatch_slots: Arc::new(Semaphore::new(config.crawler.max_concurrent.max(1))),
            tick_interval: Duration::from_secs(config.scheduler.tick_interval_secs),
            dispatch_delay: Duration::from_millis(config.crawler.request_delay_ms),
        }
    }

    /// Derived state of a rule at `now`.
    pub fn rule_state(&self, rule: &CrawlRule, now: DateTime<Utc>) -> RuleState {
        if self.is_running(&rule.id) {
            return RuleState::Running;
        }
        if !rule.is_active {
            return RuleState::Disabled;
        }
        if rule.is_due(now) {
            RuleState::Due
        } else {
            RuleState::Idle
        }
    }

    /// Active rules that are due at `now`, excluding in-flight ones.
    pub fn due_rules(&self, now: DateTime<Utc>) -> Result<Vec<CrawlRule>> {
        let active = self.store.list(&RuleFilter {
            brand_id: None,
            active: Some(true),
        })?;
        Ok(active
            .into_iter()
            .filter(|r| r.is_due(now) && !self.is_running(&r.id))
            .collect())
    }

    /// Evaluate all rules and dispatch the due ones, one handle each.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<Vec<RunHandle>> {
        let due = self.due_rules(now)?;
        if !due.is_empty() {
            log::info!("Tick: {} rule(s) due", due.len());
        }

        let mut handles = Vec::with_capacity(due.len());
        for (i, rule) in due.into_iter().enumerate() {
            if i > 0 && !self.dispatch_delay.is_zero() {
                tokio::time::sleep(self.dispatch_delay).await;
            }
            match self.dispatch(rule, now) {
                Ok(handle) => handles.push(handle),
                // Lost the race with a manual trigger; the next tick catches up
                Err(AppError::AlreadyRunning { rule_id }) => {
                    log::debug!("Skipping {rule_id}: already running");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(handles)
    }

    /// Tick and wait for every dispatched run to complete.
    pub async fn tick_and_wait(&self, now: DateTime<Utc>) -> Result<Vec<CrawlRun>> {
        let handles = self.tick(now).await?;
        let waited = future::join_all(handles.into_iter().map(RunHandle::wait)).await;
        waited.into_iter().collect()
    }

    /// Manual "run now": bypasses the due-time check, still subject to the
    /// one-running-execution-per-rule exclusion.
    pub fn trigger_now(&self, rule_id: &str) -> Result<RunHandle> {
        let rule = self.store.get(rule_id)?;
        self.dispatch(rule, Utc::now())
    }

    /// Run the scheduler loop until the task is cancelled.
    pub async fn run_forever(&self) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = self.tick(Utc::now()).await {
                // A tick-level failure must not kill the loop
                log::error!("Scheduler tick failed: {e}");
            }
        }
    }

    fn is_running(&self, rule_id: &str) -> bool {
        self.in_flight
            .lock()
            .map(|set| set.contains(rule_id))
            .unwrap_or(false)
    }

    /// Claim the rule's running slot and spawn its cycle.
    fn dispatch(&self, rule: CrawlRule, run_time: DateTime<Utc>) -> Result<RunHandle> {
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| AppError::config("scheduler in-flight lock poisoned"))?;
            if !in_flight.insert(rule.id.clone()) {
                return Err(AppError::AlreadyRunning {
                    rule_id: rule.id.clone(),
                });
            }
        }

        let scheduler = self.clone();
        let rule_id = rule.id.clone();
        let handle = tokio::spawn(async move {
            let _permit = scheduler
                .dispatch_slots
                .clone()
                .acquire_owned()
                .await
                .expect("dispatch semaphore closed");

            let run = scheduler.execute(&rule, run_time).await;
            log::info!("{}", run.summary());

            if let Ok(mut in_flight) = scheduler.in_flight.lock() {
                in_flight.remove(&rule.id);
            }
            run
        });

        Ok(RunHandle { rule_id, handle })
    }

    /// One fetch -> extract -> reconcile cycle.
    ///
    /// Always exits through `record_run`, whatever the outcome, so a failing
    /// URL waits out its schedule period exactly like a success.
    async fn execute(&self, rule: &CrawlRule, run_time: DateTime<Utc>) -> CrawlRun {
        let (outcome, reconcile) = match self.fetcher.fetch(&rule.url).await {
            Err(fetch_err) => {
                log::warn!("Fetch failed for {}: {fetch_err}", rule.id);
                (
                    RunOutcome::FetchFailed {
                        kind: fetch_err.kind().to_string(),
                        message: fetch_err.to_string(),
                    },
                    None,
                )
            }
            Ok(doc) => match extract(&doc, &rule.selectors) {
                Err(extract_err) => {
                    log::warn!("Extraction failed for {}: {extract_err}", rule.id);
                    (
                        RunOutcome::ExtractionFailed {
                            message: extract_err.to_string(),
                        },
                        None,
                    )
                }
                Ok(extraction)
                    if extraction.candidates.is_empty() && !extraction.failures.is_empty() =>
                {
                    // Every item on the page failed: treat as a page-level
                    // failure and leave the catalog alone.
                    let message = extraction.failures[0].to_string();
                    log::warn!("Extraction failed for {}: {message}", rule.id);
                    (RunOutcome::ExtractionFailed { message }, None)
                }
                Ok(extraction) => {
                    let items = extraction.candidates.len();
                    let failures = extraction.failures.len();
                    match self
                        .engine
                        .reconcile(&rule.brand_id, &extraction.candidates, run_time)
                        .await
                    {
                        Err(e) => {
                            log::error!("Reconcile failed for {}: {e}", rule.id);
                            (
                                RunOutcome::ExtractionFailed {
                                    message: format!("reconcile failed: {e}"),
                                },
                                None,
                            )
                        }
                        Ok(result) if failures == 0 => {
                            (RunOutcome::Success { items }, Some(result))
                        }
                        Ok(result) => (RunOutcome::Partial { items, failures }, Some(result)),
                    }
                }
            },
        };

        // The single exit from Running: every outcome records the run.
        if let Err(e) = self.store.record_run(&rule.id, run_time) {
            // Rule deleted while its run was in flight
            log::warn!("Could not record run for {}: {e}", rule.id);
        }

        CrawlRun {
            rule_id: rule.id.clone(),
            brand_id: rule.brand_id.clone(),
            started_at: run_time,
            outcome,
            reconcile,
        }
    }
}
