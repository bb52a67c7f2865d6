// src/services/upsert.rs

//! Catalog reconciliation: extracted candidates -> campaign upserts.
//!
//! De-duplication key across runs is the natural key
//! (brand_id, normalized source URL); the source sites expose no stable
//! external id. One `run_time` is used for the whole reconcile call, so the
//! expiry sweep never races the writes that precede it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::catalog::{BrandDirectory, CampaignCatalog, CampaignDraft};
use crate::error::Result;
use crate::models::{Campaign, CampaignPatch, CampaignStatus, Candidate, ReconcileResult};
use crate::utils::normalize_source_url;

/// Reconciles a brand's extracted candidates against the campaign catalog.
pub struct UpsertEngine {
    catalog: Arc<dyn CampaignCatalog>,
    directory: Arc<dyn BrandDirectory>,
}

impl UpsertEngine {
    pub fn new(catalog: Arc<dyn CampaignCatalog>, directory: Arc<dyn BrandDirectory>) -> Self {
        Self { catalog, directory }
    }

    /// Insert new campaigns, update changed ones, expire the unseen.
    ///
    /// Status handling: expired campaigns that reappear are promoted back to
    /// active; hidden campaigns keep their status no matter what (field
    /// updates still apply). Expiry only ever targets campaigns that were
    /// active and untouched by this run.
    pub async fn reconcile(
        &self,
        brand_id: &str,
        candidates: &[Candidate],
        run_time: DateTime<Utc>,
    ) -> Result<ReconcileResult> {
        let mut result = ReconcileResult::default();

        for candidate in candidates {
            let key = normalize_source_url(&candidate.source_url);
            match self.catalog.find_by_natural_key(brand_id, &key).await? {
                None => {
                    self.insert_new(brand_id, candidate, &key, run_time).await?;
                    result.inserted += 1;
                }
                Some(existing) => {
                    let patch = build_patch(&existing, candidate, run_time);
                    // Status promotion (expired -> active) counts as an update
                    if patch_changes_fields(&patch) || patch.status.is_some() {
                        result.updated += 1;
                    } else {
                        result.unchanged += 1;
                    }
                    self.catalog.update(&existing.id, patch).await?;
                }
            }
        }

        // Anything still active for this brand that this run did not touch
        // is gone from the source page: expire it.
        for campaign in self.catalog.list_active_by_brand(brand_id).await? {
            if campaign.last_seen_at < run_time {
                self.catalog
                    .update(
                        &campaign.id,
                        CampaignPatch {
                            status: Some(CampaignStatus::Expired),
                            updated_at: Some(run_time),
                            ..CampaignPatch::default()
                        },
                    )
                    .await?;
                result.expired += 1;
            }
        }

        Ok(result)
    }

    async fn insert_new(
        &self,
        brand_id: &str,
        candidate: &Candidate,
        key: &str,
        run_time: DateTime<Utc>,
    ) -> Result<Campaign> {
        let category_id = self
            .directory
            .brand(brand_id)
            .map(|b| b.primary_category().to_string())
            .unwrap_or_default();

        self.catalog
            .insert(CampaignDraft {
                brand_id: brand_id.to_string(),
                category_id,
                title: candidate.title.clone().unwrap_or_default(),
                description: candidate.description.clone().unwrap_or_default(),
                discount_rate: candidate.discount_rate,
                image_url: candidate.image_url.clone().unwrap_or_default(),
                source_url: key.to_string(),
                status: CampaignStatus::Active,
                created_at: run_time,
            })
            .await
    }
}

/// Diff a candidate against the stored campaign.
///
/// Only extracted (Some) fields participate: an omitted field never
/// overwrites stored data. The returned patch always moves last_seen_at.
fn build_patch(existing: &Campaign, candidate: &Candidate, run_time: DateTime<Utc>) -> CampaignPatch {
    let mut patch = CampaignPatch {
        last_seen_at: Some(run_time),
        ..CampaignPatch::default()
    };

    if let Some(title) = &candidate.title {
        if *title != existing.title {
            patch.title = Some(title.clone());
        }
    }
    if let Some(description) = &candidate.description {
        if *description != existing.description {
            patch.description = Some(description.clone());
        }
    }
    if let Some(rate) = candidate.discount_rate {
        if Some(rate) != existing.discount_rate {
            patch.discount_rate = Some(Some(rate));
        }
    }
    if let Some(image_url) = &candidate.image_url {
        if *image_url != existing.image_url {
            patch.image_url = Some(image_url.clone());
        }
    }

    let changed = patch_changes_fields(&patch);
    if changed {
        patch.updated_at = Some(run_time);
    }

    // A reappeared campaign is active again; hidden is sticky against
    // automated promotion.
    if existing.status == CampaignStatus::Expired {
        patch.status = Some(CampaignStatus::Active);
        patch.updated_at = Some(run_time);
    }

    patch
}

/// Whether the patch changes extracted fields (not just bookkeeping).
fn patch_changes_fields(patch: &CampaignPatch) -> bool {
    patch.title.is_some()
        || patch.description.is_some()
        || patch.discount_rate.is_some()
        || patch.image_url.is_some()
}
