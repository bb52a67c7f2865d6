// src/store/rules.rs

//! In-memory crawl rule store.
//!
//! Owns the set of [`CrawlRule`] entities. Hydrated from and snapshotted to
//! JSON by the storage layer; all mutations go through here so validation
//! and id minting happen in one place.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, SecondsFormat, Utc};
use scraper::Selector;

use crate::catalog::BrandDirectory;
use crate::error::{AppError, Result};
use crate::models::{CrawlRule, FieldSelectors, RuleDraft, RuleUpdate};
use crate::utils::ids;

/// Optional constraints for [`RuleStore::list`].
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub brand_id: Option<String>,
    pub active: Option<bool>,
}

/// Store of crawl rules, guarded for concurrent admin/scheduler access.
pub struct RuleStore {
    rules: RwLock<HashMap<String, CrawlRule>>,
    directory: Arc<dyn BrandDirectory>,
}

impl RuleStore {
    /// Create an empty store validating brands against `directory`.
    pub fn new(directory: Arc<dyn BrandDirectory>) -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            directory,
        }
    }

    /// Create a store hydrated with previously persisted rules.
    ///
    /// Hydration skips validation: rules whose brand has since disappeared
    /// still load, they just fail on the next edit.
    pub fn with_rules(directory: Arc<dyn BrandDirectory>, rules: Vec<CrawlRule>) -> Self {
        let map = rules.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            rules: RwLock::new(map),
            directory,
        }
    }

    /// Create a rule, minting its id and stamping creation time.
    pub fn create(&self, draft: RuleDraft) -> Result<CrawlRule> {
        self.validate(&draft.brand_id, &draft.url, &draft.selectors)?;

        let created_at = Utc::now();
        let id = ids::mint(
            "cr",
            &[
                &draft.brand_id,
                &draft.url,
                &created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        );

        let rule = CrawlRule {
            id: id.clone(),
            brand_id: draft.brand_id,
            url: draft.url,
            selectors: draft.selectors,
            schedule: draft.schedule,
            is_active: draft.is_active,
            last_run_at: None,
            created_at,
        };

        let mut rules = self.rules.write().map_err(|_| Self::lock_err())?;
        rules.insert(id, rule.clone());
        Ok(rule)
    }

    /// Apply a partial admin edit. Identifier and creation time never change.
    pub fn update(&self, id: &str, update: RuleUpdate) -> Result<CrawlRule> {
        let mut rules = self.rules.write().map_err(|_| Self::lock_err())?;
        let existing = rules
            .get(id)
            .ok_or_else(|| AppError::not_found("CrawlRule", id))?;

        let mut next = existing.clone();
        if let Some(brand_id) = update.brand_id {
            next.brand_id = brand_id;
        }
        if let Some(url) = update.url {
            next.url = url;
        }
        if let Some(selectors) = update.selectors {
            next.selectors = selectors;
        }
        if let Some(schedule) = update.schedule {
            next.schedule = schedule;
        }
        if let Some(is_active) = update.is_active {
            next.is_active = is_active;
        }

        self.validate(&next.brand_id, &next.url, &next.selectors)?;
        rules.insert(id.to_string(), next.clone());
        Ok(next)
    }

    /// Delete a rule. Repeated deletion of the same id is an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut rules = self.rules.write().map_err(|_| Self::lock_err())?;
        rules
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("CrawlRule", id))
    }

    /// Flip the active flag.
    pub fn set_active(&self, id: &str, active: bool) -> Result<CrawlRule> {
        let mut rules = self.rules.write().map_err(|_| Self::lock_err())?;
        let rule = rules
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("CrawlRule", id))?;
        rule.is_active = active;
        Ok(rule.clone())
    }

    /// Fetch one rule.
    pub fn get(&self, id: &str) -> Result<CrawlRule> {
        let rules = self.rules.read().map_err(|_| Self::lock_err())?;
        rules
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found("CrawlRule", id))
    }

    /// List rules matching the filter, ordered by creation time.
    pub fn list(&self, filter: &RuleFilter) -> Result<Vec<CrawlRule>> {
        let rules = self.rules.read().map_err(|_| Self::lock_err())?;
        let mut out: Vec<CrawlRule> = rules
            .values()
            .filter(|r| {
                filter
                    .brand_id
                    .as_ref()
                    .is_none_or(|brand| r.brand_id == *brand)
            })
            .filter(|r| filter.active.is_none_or(|active| r.is_active == active))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    /// Record a run completion time.
    ///
    /// Touches `last_run_at` only, so a concurrent admin edit of other
    /// fields is never clobbered; last writer wins on the timestamp itself.
    pub fn record_run(&self, id: &str, ts: DateTime<Utc>) -> Result<()> {
        let mut rules = self.rules.write().map_err(|_| Self::lock_err())?;
        let rule = rules
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("CrawlRule", id))?;
        rule.last_run_at = Some(ts);
        Ok(())
    }

    /// All rules, ordered, for persistence snapshots.
    pub fn snapshot(&self) -> Result<Vec<CrawlRule>> {
        self.list(&RuleFilter::default())
    }

    fn validate(&self, brand_id: &str, url: &str, selectors: &FieldSelectors) -> Result<()> {
        if url.trim().is_empty() {
            return Err(AppError::validation("rule url must not be empty"));
        }
        if url::Url::parse(url).is_err() {
            return Err(AppError::validation(format!("rule url is not valid: {url}")));
        }
        if !self.directory.brand_exists(brand_id) {
            return Err(AppError::validation(format!("unknown brand: {brand_id}")));
        }
        for (name, selector) in selectors.non_empty() {
            if Selector::parse(selector).is_err() {
                return Err(AppError::validation(format!(
                    "invalid {name} selector: '{selector}'"
                )));
            }
        }
        Ok(())
    }

    fn lock_err() -> AppError {
        AppError::config("rule store lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryDirectory;
    use crate::models::{Brand, Schedule};

    fn directory() -> Arc<dyn BrandDirectory> {
        Arc::new(MemoryDirectory::new(
            vec![
                Brand {
                    id: "brand-1".to_string(),
                    name: "Trendy".to_string(),
                    logo_url: String::new(),
                    domain: "trendy.example.com".to_string(),
                    category_ids: vec!["cat-1".to_string()],
                },
                Brand {
                    id: "brand-2".to_string(),
                    name: "Hepsi".to_string(),
                    logo_url: String::new(),
                    domain: "hepsi.example.com".to_string(),
                    category_ids: vec![],
                },
            ],
            vec![],
        ))
    }

    fn draft(brand_id: &str) -> RuleDraft {
        RuleDraft {
            brand_id: brand_id.to_string(),
            url: "https://shop.example.com/campaigns".to_string(),
            selectors: FieldSelectors {
                item: ".campaign-card".to_string(),
                title: ".campaign-title".to_string(),
                ..FieldSelectors::default()
            },
            schedule: Schedule::Daily,
            is_active: true,
        }
    }

    #[test]
    fn test_create_mints_id_and_timestamps() {
        let store = RuleStore::new(directory());
        let rule = store.create(draft("brand-1")).unwrap();
        assert!(rule.id.starts_with("cr-"));
        assert!(rule.last_run_at.is_none());
        assert_eq!(store.get(&rule.id).unwrap(), rule);
    }

    #[test]
    fn test_create_rejects_empty_url() {
        let store = RuleStore::new(directory());
        let mut bad = draft("brand-1");
        bad.url = "  ".to_string();
        assert!(matches!(
            store.create(bad),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_create_rejects_unknown_brand() {
        let store = RuleStore::new(directory());
        assert!(matches!(
            store.create(draft("brand-404")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_create_rejects_bad_selector() {
        let store = RuleStore::new(directory());
        let mut bad = draft("brand-1");
        bad.selectors.title = "[[nope".to_string();
        assert!(matches!(
            store.create(bad),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_update_patches_only_given_fields() {
        let store = RuleStore::new(directory());
        let rule = store.create(draft("brand-1")).unwrap();

        let updated = store
            .update(
                &rule.id,
                RuleUpdate {
                    schedule: Some(Schedule::Weekly),
                    ..RuleUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.schedule, Schedule::Weekly);
        assert_eq!(updated.url, rule.url);
        assert_eq!(updated.id, rule.id);
        assert_eq!(updated.created_at, rule.created_at);
    }

    #[test]
    fn test_update_unknown_id() {
        let store = RuleStore::new(directory());
        assert!(matches!(
            store.update("cr-missing", RuleUpdate::default()),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_twice_is_an_error() {
        let store = RuleStore::new(directory());
        let rule = store.create(draft("brand-1")).unwrap();
        store.delete(&rule.id).unwrap();
        assert!(matches!(
            store.delete(&rule.id),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn test_list_filters() {
        let store = RuleStore::new(directory());
        let a = store.create(draft("brand-1")).unwrap();
        let b = store.create(draft("brand-2")).unwrap();
        store.set_active(&b.id, false).unwrap();

        let all = store.list(&RuleFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let brand1 = store
            .list(&RuleFilter {
                brand_id: Some("brand-1".to_string()),
                active: None,
            })
            .unwrap();
        assert_eq!(brand1.len(), 1);
        assert_eq!(brand1[0].id, a.id);

        let active = store
            .list(&RuleFilter {
                brand_id: None,
                active: Some(true),
            })
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a.id);
    }

    #[test]
    fn test_record_run_touches_only_last_run() {
        let store = RuleStore::new(directory());
        let rule = store.create(draft("brand-1")).unwrap();

        let ts = Utc::now();
        store.record_run(&rule.id, ts).unwrap();

        let after = store.get(&rule.id).unwrap();
        assert_eq!(after.last_run_at, Some(ts));
        assert_eq!(after.url, rule.url);
        assert_eq!(after.schedule, rule.schedule);
        assert_eq!(after.is_active, rule.is_active);
    }

    #[test]
    fn test_record_run_unknown_rule() {
        let store = RuleStore::new(directory());
        assert!(matches!(
            store.record_run("cr-gone", Utc::now()),
            Err(AppError::NotFound { .. })
        ));
    }
}
