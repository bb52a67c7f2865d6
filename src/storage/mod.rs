//! Storage abstractions for crawler persistence.
//!
//! Everything durable lives as JSON snapshots under one storage directory:
//!
//! ```text
//! storage/
//! ├── config.toml       # Crawler configuration
//! ├── brands.json       # Brand directory
//! ├── categories.json   # Category directory
//! ├── rules.json        # Crawl rules
//! ├── campaigns.json    # Campaign catalog snapshot
//! └── prefs.json        # User preferences
//! ```

pub mod local;
pub mod seed;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Brand, Campaign, Category, CrawlRule};

// Re-export for convenience
pub use local::LocalStorage;

/// Persistence backend for rules, campaigns and the directory.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Load all crawl rules; empty when nothing persisted yet.
    async fn load_rules(&self) -> Result<Vec<CrawlRule>>;

    /// Persist the full rule set.
    async fn save_rules(&self, rules: &[CrawlRule]) -> Result<()>;

    /// Load the campaign catalog snapshot.
    async fn load_campaigns(&self) -> Result<Vec<Campaign>>;

    /// Persist the campaign catalog snapshot.
    async fn save_campaigns(&self, campaigns: &[Campaign]) -> Result<()>;

    /// Load the brand/category directory.
    async fn load_directory(&self) -> Result<(Vec<Brand>, Vec<Category>)>;

    /// Persist the brand/category directory.
    async fn save_directory(&self, brands: &[Brand], categories: &[Category]) -> Result<()>;
}
