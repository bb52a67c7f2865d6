// src/catalog/query.rs

//! Campaign browsing: filters and sort orders for the list screens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Campaign, CampaignStatus};

/// Days before end_date at which a campaign counts as "ending soon".
const ENDING_SOON_DAYS: i64 = 3;

/// Sort orders offered on the campaign list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    Newest,
    EndingSoon,
    HighestDiscount,
    Popular,
}

/// Status filter on the campaign list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    Active,
    EndingSoon,
}

/// Filter against the user's followed brands/categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowFilter {
    All,
    Following,
    NotFollowing,
}

/// Combined filter for a campaign listing.
#[derive(Debug, Clone, Default)]
pub struct CampaignQuery {
    pub category_id: Option<String>,
    pub brand_id: Option<String>,
    pub status: Option<StatusFilter>,
    pub follow: Option<FollowFilter>,
    pub sort: Option<SortOption>,
}

fn ends_soon(campaign: &Campaign, now: DateTime<Utc>) -> bool {
    match campaign.end_date {
        Some(end) => end >= now && end - now <= Duration::days(ENDING_SOON_DAYS),
        None => false,
    }
}

/// Apply a query to a campaign slice. Hidden campaigns never appear.
///
/// `followed_brands`/`followed_categories` come from the preference store;
/// a campaign counts as followed when either its brand or its category is.
pub fn run_query(
    campaigns: &[Campaign],
    query: &CampaignQuery,
    followed_brands: &[String],
    followed_categories: &[String],
    now: DateTime<Utc>,
) -> Vec<Campaign> {
    let followed = |c: &Campaign| {
        followed_brands.iter().any(|b| *b == c.brand_id)
            || followed_categories.iter().any(|cat| *cat == c.category_id)
    };

    let mut out: Vec<Campaign> = campaigns
        .iter()
        .filter(|c| c.status != CampaignStatus::Hidden)
        .filter(|c| match query.status {
            None => true,
            Some(StatusFilter::Active) => c.status == CampaignStatus::Active,
            Some(StatusFilter::EndingSoon) => {
                c.status == CampaignStatus::Active && ends_soon(c, now)
            }
        })
        .filter(|c| {
            query
                .category_id
                .as_ref()
                .is_none_or(|id| c.category_id == *id)
        })
        .filter(|c| query.brand_id.as_ref().is_none_or(|id| c.brand_id == *id))
        .filter(|c| match query.follow {
            None | Some(FollowFilter::All) => true,
            Some(FollowFilter::Following) => followed(c),
            Some(FollowFilter::NotFollowing) => !followed(c),
        })
        .cloned()
        .collect();

    match query.sort.unwrap_or(SortOption::Newest) {
        SortOption::Newest => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOption::EndingSoon => out.sort_by(|a, b| {
            // Campaigns without an end date sort last
            match (a.end_date, b.end_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => b.created_at.cmp(&a.created_at),
            }
        }),
        SortOption::HighestDiscount | SortOption::Popular => out.sort_by(|a, b| {
            b.discount_rate
                .unwrap_or(0)
                .cmp(&a.discount_rate.unwrap_or(0))
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(
        id: &str,
        brand: &str,
        category: &str,
        discount: Option<u32>,
        created_days_ago: i64,
        ends_in_days: Option<i64>,
        status: CampaignStatus,
    ) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: id.to_string(),
            brand_id: brand.to_string(),
            category_id: category.to_string(),
            title: id.to_string(),
            description: String::new(),
            discount_rate: discount,
            image_url: String::new(),
            source_url: format!("https://x/{id}"),
            start_date: None,
            end_date: ends_in_days.map(|d| now + Duration::days(d)),
            status,
            created_at: now - Duration::days(created_days_ago),
            updated_at: now,
            last_seen_at: now,
        }
    }

    #[test]
    fn test_hidden_campaigns_never_listed() {
        let campaigns = vec![
            campaign("a", "b1", "c1", None, 1, None, CampaignStatus::Active),
            campaign("h", "b1", "c1", None, 1, None, CampaignStatus::Hidden),
        ];
        let out = run_query(&campaigns, &CampaignQuery::default(), &[], &[], Utc::now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn test_ending_soon_filter() {
        let campaigns = vec![
            campaign("soon", "b1", "c1", None, 1, Some(2), CampaignStatus::Active),
            campaign("late", "b1", "c1", None, 1, Some(30), CampaignStatus::Active),
            campaign("open", "b1", "c1", None, 1, None, CampaignStatus::Active),
        ];
        let query = CampaignQuery {
            status: Some(StatusFilter::EndingSoon),
            ..CampaignQuery::default()
        };
        let out = run_query(&campaigns, &query, &[], &[], Utc::now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "soon");
    }

    #[test]
    fn test_follow_filter_matches_brand_or_category() {
        let campaigns = vec![
            campaign("fb", "b1", "c9", None, 1, None, CampaignStatus::Active),
            campaign("fc", "b9", "c1", None, 1, None, CampaignStatus::Active),
            campaign("no", "b9", "c9", None, 1, None, CampaignStatus::Active),
        ];
        let query = CampaignQuery {
            follow: Some(FollowFilter::Following),
            ..CampaignQuery::default()
        };
        let out = run_query(
            &campaigns,
            &query,
            &["b1".to_string()],
            &["c1".to_string()],
            Utc::now(),
        );
        let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
        assert!(ids.contains(&"fb"));
        assert!(ids.contains(&"fc"));
        assert!(!ids.contains(&"no"));
    }

    #[test]
    fn test_highest_discount_sort() {
        let campaigns = vec![
            campaign("low", "b", "c", Some(10), 1, None, CampaignStatus::Active),
            campaign("high", "b", "c", Some(60), 1, None, CampaignStatus::Active),
            campaign("none", "b", "c", None, 1, None, CampaignStatus::Active),
        ];
        let query = CampaignQuery {
            sort: Some(SortOption::HighestDiscount),
            ..CampaignQuery::default()
        };
        let out = run_query(&campaigns, &query, &[], &[], Utc::now());
        assert_eq!(out[0].id, "high");
        assert_eq!(out[1].id, "low");
        assert_eq!(out[2].id, "none");
    }

    #[test]
    fn test_newest_sort_is_default() {
        let campaigns = vec![
            campaign("old", "b", "c", None, 10, None, CampaignStatus::Active),
            campaign("new", "b", "c", None, 0, None, CampaignStatus::Active),
        ];
        let out = run_query(&campaigns, &CampaignQuery::default(), &[], &[], Utc::now());
        assert_eq!(out[0].id, "new");
    }
}
