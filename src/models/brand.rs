//! Brand and category directory entities.

use serde::{Deserialize, Serialize};

/// A brand whose site campaigns are scraped from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Brand logo URL
    #[serde(default)]
    pub logo_url: String,

    /// Primary web domain
    #[serde(default)]
    pub domain: String,

    /// Categories the brand sells in; the first is the default for
    /// newly ingested campaigns
    #[serde(default)]
    pub category_ids: Vec<String>,
}

impl Brand {
    /// Category assigned to campaigns ingested for this brand.
    pub fn primary_category(&self) -> &str {
        self.category_ids.first().map(String::as_str).unwrap_or("")
    }
}

/// A display category for campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,

    /// Icon key for the UI lookup table
    #[serde(default)]
    pub icon: String,

    /// Display color (hex)
    #[serde(default)]
    pub color: String,
}
