// src/catalog/memory.rs

//! In-memory catalog and directory implementations.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::catalog::{BrandDirectory, CampaignCatalog, CampaignDraft};
use crate::error::{AppError, Result};
use crate::models::{Brand, Campaign, CampaignPatch, CampaignStatus, Category};
use crate::utils::ids;
use crate::utils::normalize_source_url;

/// Campaign catalog held in process memory.
///
/// Keyed by campaign id, with natural-key lookups scanning the brand's
/// campaigns; catalogs here are small enough that an index is not worth the
/// bookkeeping.
#[derive(Default)]
pub struct MemoryCatalog {
    campaigns: RwLock<HashMap<String, Campaign>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog with existing campaigns (storage hydration).
    pub fn with_campaigns(campaigns: Vec<Campaign>) -> Self {
        let map = campaigns.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            campaigns: RwLock::new(map),
        }
    }

    fn lock_err() -> AppError {
        AppError::config("campaign catalog lock poisoned")
    }
}

#[async_trait]
impl CampaignCatalog for MemoryCatalog {
    async fn find_by_natural_key(
        &self,
        brand_id: &str,
        source_url: &str,
    ) -> Result<Option<Campaign>> {
        let key = normalize_source_url(source_url);
        let campaigns = self.campaigns.read().map_err(|_| Self::lock_err())?;
        Ok(campaigns
            .values()
            .find(|c| c.brand_id == brand_id && normalize_source_url(&c.source_url) == key)
            .cloned())
    }

    async fn insert(&self, draft: CampaignDraft) -> Result<Campaign> {
        let id = ids::mint("cmp", &[&draft.brand_id, &draft.source_url]);
        let campaign = Campaign {
            id: id.clone(),
            brand_id: draft.brand_id,
            category_id: draft.category_id,
            title: draft.title,
            description: draft.description,
            discount_rate: draft.discount_rate,
            image_url: draft.image_url,
            source_url: draft.source_url,
            start_date: None,
            end_date: None,
            status: draft.status,
            created_at: draft.created_at,
            updated_at: draft.created_at,
            last_seen_at: draft.created_at,
        };

        let mut campaigns = self.campaigns.write().map_err(|_| Self::lock_err())?;
        if campaigns.contains_key(&id) {
            return Err(AppError::validation(format!(
                "campaign {id} already exists for this natural key"
            )));
        }
        campaigns.insert(id, campaign.clone());
        Ok(campaign)
    }

    async fn update(&self, id: &str, patch: CampaignPatch) -> Result<Campaign> {
        let mut campaigns = self.campaigns.write().map_err(|_| Self::lock_err())?;
        let campaign = campaigns
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("Campaign", id))?;
        patch.apply(campaign);
        Ok(campaign.clone())
    }

    async fn list_active_by_brand(&self, brand_id: &str) -> Result<Vec<Campaign>> {
        let campaigns = self.campaigns.read().map_err(|_| Self::lock_err())?;
        Ok(campaigns
            .values()
            .filter(|c| c.brand_id == brand_id && c.status == CampaignStatus::Active)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Campaign>> {
        let campaigns = self.campaigns.read().map_err(|_| Self::lock_err())?;
        let mut all: Vec<Campaign> = campaigns.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

/// Brand/category directory held in process memory.
#[derive(Default, Clone)]
pub struct MemoryDirectory {
    brands: HashMap<String, Brand>,
    categories: HashMap<String, Category>,
}

impl MemoryDirectory {
    pub fn new(brands: Vec<Brand>, categories: Vec<Category>) -> Self {
        Self {
            brands: brands.into_iter().map(|b| (b.id.clone(), b)).collect(),
            categories: categories.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

impl BrandDirectory for MemoryDirectory {
    fn brand(&self, id: &str) -> Option<Brand> {
        self.brands.get(id).cloned()
    }

    fn category(&self, id: &str) -> Option<Category> {
        self.categories.get(id).cloned()
    }

    fn brands(&self) -> Vec<Brand> {
        let mut all: Vec<Brand> = self.brands.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    fn categories(&self) -> Vec<Category> {
        let mut all: Vec<Category> = self.categories.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}
