// src/models/campaign.rs

//! Campaign catalog entities and the candidates the extractor produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a catalog campaign.
///
/// `Expired` is only ever written by the reconcile pass; `Hidden` is an
/// admin-only state the pipeline must never overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Expired,
    Hidden,
}

/// A shopping campaign in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Unique identifier
    pub id: String,

    /// Owning brand
    pub brand_id: String,

    /// Display category
    pub category_id: String,

    /// Campaign title
    pub title: String,

    /// Campaign description
    #[serde(default)]
    pub description: String,

    /// Discount percentage, None when the deal has no single rate
    #[serde(default)]
    pub discount_rate: Option<u32>,

    /// Campaign image URL
    #[serde(default)]
    pub image_url: String,

    /// Canonical URL on the brand site; half of the natural key
    pub source_url: String,

    /// Campaign window, when the source site advertises one
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,

    /// Lifecycle status
    pub status: CampaignStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Last time a crawl produced this campaign
    pub last_seen_at: DateTime<Utc>,
}

/// A freshly extracted campaign candidate, before reconciliation.
///
/// Fields whose selector was empty are `None` (omitted, not defaulted).
/// `source_url` is always present: it anchors the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Per-item campaign URL, resolved against the page URL
    pub source_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Candidate {
    /// A candidate carrying nothing but its source URL.
    pub fn bare(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            title: None,
            description: None,
            discount_rate: None,
            image_url: None,
        }
    }
}

/// Partial update applied to an existing campaign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Some(None) clears the rate, Some(Some(n)) sets it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl CampaignPatch {
    /// True when the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.discount_rate.is_none()
            && self.image_url.is_none()
            && self.status.is_none()
            && self.updated_at.is_none()
            && self.last_seen_at.is_none()
    }

    /// Apply the patch to a campaign in place.
    pub fn apply(&self, campaign: &mut Campaign) {
        if let Some(title) = &self.title {
            campaign.title = title.clone();
        }
        if let Some(description) = &self.description {
            campaign.description = description.clone();
        }
        if let Some(rate) = self.discount_rate {
            campaign.discount_rate = rate;
        }
        if let Some(image_url) = &self.image_url {
            campaign.image_url = image_url.clone();
        }
        if let Some(status) = self.status {
            campaign.status = status;
        }
        if let Some(updated_at) = self.updated_at {
            campaign.updated_at = updated_at;
        }
        if let Some(last_seen_at) = self.last_seen_at {
            campaign.last_seen_at = last_seen_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_campaign() -> Campaign {
        let now = Utc::now();
        Campaign {
            id: "cmp-1".to_string(),
            brand_id: "brand-1".to_string(),
            category_id: "cat-1".to_string(),
            title: "Spring Sale".to_string(),
            description: "Up to half off".to_string(),
            discount_rate: Some(40),
            image_url: "https://cdn.example.com/spring.jpg".to_string(),
            source_url: "https://shop.example.com/spring".to_string(),
            start_date: None,
            end_date: None,
            status: CampaignStatus::Active,
            created_at: now,
            updated_at: now,
            last_seen_at: now,
        }
    }

    #[test]
    fn test_patch_apply_changes_only_present_fields() {
        let mut campaign = sample_campaign();
        let patch = CampaignPatch {
            title: Some("Summer Sale".to_string()),
            discount_rate: Some(None),
            ..CampaignPatch::default()
        };
        patch.apply(&mut campaign);
        assert_eq!(campaign.title, "Summer Sale");
        assert_eq!(campaign.discount_rate, None);
        assert_eq!(campaign.description, "Up to half off");
        assert_eq!(campaign.status, CampaignStatus::Active);
    }

    #[test]
    fn test_empty_patch() {
        assert!(CampaignPatch::default().is_empty());
        let patch = CampaignPatch {
            title: Some("x".to_string()),
            ..CampaignPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
