//! Local filesystem storage implementation.
//!
//! JSON snapshots with atomic writes (temp file, then rename) so a crash
//! mid-write never leaves a torn file behind.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Brand, Campaign, Category, CrawlRule};
use crate::prefs::{Preferences, PrefsBackend};
use crate::storage::SnapshotStorage;

const RULES_FILE: &str = "rules.json";
const CAMPAIGNS_FILE: &str = "campaigns.json";
const BRANDS_FILE: &str = "brands.json";
const CATEGORIES_FILE: &str = "categories.json";
const PREFS_FILE: &str = "prefs.json";

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        Ok(self.read_json(key).await?.unwrap_or_default())
    }
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    async fn load_rules(&self) -> Result<Vec<CrawlRule>> {
        self.read_list(RULES_FILE).await
    }

    async fn save_rules(&self, rules: &[CrawlRule]) -> Result<()> {
        self.write_json(RULES_FILE, rules).await
    }

    async fn load_campaigns(&self) -> Result<Vec<Campaign>> {
        self.read_list(CAMPAIGNS_FILE).await
    }

    async fn save_campaigns(&self, campaigns: &[Campaign]) -> Result<()> {
        self.write_json(CAMPAIGNS_FILE, campaigns).await
    }

    async fn load_directory(&self) -> Result<(Vec<Brand>, Vec<Category>)> {
        let brands = self.read_list(BRANDS_FILE).await?;
        let categories = self.read_list(CATEGORIES_FILE).await?;
        Ok((brands, categories))
    }

    async fn save_directory(&self, brands: &[Brand], categories: &[Category]) -> Result<()> {
        self.write_json(BRANDS_FILE, brands).await?;
        self.write_json(CATEGORIES_FILE, categories).await
    }
}

#[async_trait]
impl PrefsBackend for LocalStorage {
    async fn load(&self) -> Result<Option<Preferences>> {
        self.read_json(PREFS_FILE).await
    }

    async fn save(&self, prefs: &Preferences) -> Result<()> {
        self.write_json(PREFS_FILE, prefs).await
    }
}
