// src/catalog/mod.rs

//! Campaign catalog and brand/category directory boundaries.
//!
//! The upsert engine writes campaigns through [`CampaignCatalog`]; the rule
//! store and display joins read brands/categories through
//! [`BrandDirectory`]. Both ship with in-memory implementations backed by
//! the local storage snapshots.

mod memory;
pub mod query;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Brand, Campaign, CampaignPatch, CampaignStatus, Category};

pub use memory::{MemoryCatalog, MemoryDirectory};

/// Fields required to insert a campaign; the catalog mints the id.
#[derive(Debug, Clone)]
pub struct CampaignDraft {
    pub brand_id: String,
    pub category_id: String,
    pub title: String,
    pub description: String,
    pub discount_rate: Option<u32>,
    pub image_url: String,
    /// Already normalized by the caller
    pub source_url: String,
    pub status: CampaignStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Write/read boundary of the campaign catalog.
#[async_trait]
pub trait CampaignCatalog: Send + Sync {
    /// Look up a campaign by its (brand, normalized source URL) natural key.
    async fn find_by_natural_key(
        &self,
        brand_id: &str,
        source_url: &str,
    ) -> Result<Option<Campaign>>;

    /// Insert a new campaign, minting its identifier.
    async fn insert(&self, draft: CampaignDraft) -> Result<Campaign>;

    /// Apply a partial update; NotFound on unknown id.
    async fn update(&self, id: &str, patch: CampaignPatch) -> Result<Campaign>;

    /// All campaigns for a brand with status active.
    async fn list_active_by_brand(&self, brand_id: &str) -> Result<Vec<Campaign>>;

    /// All campaigns, for display and snapshots.
    async fn list_all(&self) -> Result<Vec<Campaign>>;
}

/// Read-only brand/category lookups.
pub trait BrandDirectory: Send + Sync {
    fn brand(&self, id: &str) -> Option<Brand>;

    fn category(&self, id: &str) -> Option<Category>;

    fn brands(&self) -> Vec<Brand>;

    fn categories(&self) -> Vec<Category>;

    fn brand_exists(&self, id: &str) -> bool {
        self.brand(id).is_some()
    }
}
