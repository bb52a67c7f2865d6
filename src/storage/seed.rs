// src/storage/seed.rs

//! Demo seed data for a fresh storage directory.

use chrono::Utc;

use crate::models::{Brand, Category, CrawlRule, FieldSelectors, Schedule};
use crate::utils::ids;

/// Demo categories.
pub fn demo_categories() -> Vec<Category> {
    vec![
        Category {
            id: "cat-fashion".to_string(),
            name: "Fashion".to_string(),
            icon: "shirt".to_string(),
            color: "#4F46E5".to_string(),
        },
        Category {
            id: "cat-electronics".to_string(),
            name: "Electronics".to_string(),
            icon: "laptop".to_string(),
            color: "#059669".to_string(),
        },
        Category {
            id: "cat-grocery".to_string(),
            name: "Grocery".to_string(),
            icon: "shopping-basket".to_string(),
            color: "#D97706".to_string(),
        },
    ]
}

/// Demo brands.
pub fn demo_brands() -> Vec<Brand> {
    vec![
        Brand {
            id: "brand-trendyol".to_string(),
            name: "Trendyol".to_string(),
            logo_url: "https://cdn.example.com/logos/trendyol.png".to_string(),
            domain: "trendyol.com".to_string(),
            category_ids: vec!["cat-fashion".to_string()],
        },
        Brand {
            id: "brand-hepsiburada".to_string(),
            name: "Hepsiburada".to_string(),
            logo_url: "https://cdn.example.com/logos/hepsiburada.png".to_string(),
            domain: "hepsiburada.com".to_string(),
            category_ids: vec!["cat-electronics".to_string(), "cat-fashion".to_string()],
        },
        Brand {
            id: "brand-migros".to_string(),
            name: "Migros".to_string(),
            logo_url: "https://cdn.example.com/logos/migros.png".to_string(),
            domain: "migros.com.tr".to_string(),
            category_ids: vec!["cat-grocery".to_string()],
        },
    ]
}

/// Demo crawl rules, one per brand, mirroring typical campaign listings.
pub fn demo_rules() -> Vec<CrawlRule> {
    let now = Utc::now();
    let rule = |brand_id: &str, url: &str, selectors: FieldSelectors, schedule, active| CrawlRule {
        id: ids::mint("cr", &[brand_id, url]),
        brand_id: brand_id.to_string(),
        url: url.to_string(),
        selectors,
        schedule,
        is_active: active,
        last_run_at: None,
        created_at: now,
    };

    vec![
        rule(
            "brand-trendyol",
            "https://www.trendyol.com/butik/liste/kampanyalar",
            FieldSelectors {
                item: ".campaign-card".to_string(),
                title: ".campaign-title".to_string(),
                discount: ".discount-badge".to_string(),
                image: ".campaign-image img".to_string(),
                description: ".campaign-description".to_string(),
                ..FieldSelectors::default()
            },
            Schedule::Hourly,
            true,
        ),
        rule(
            "brand-hepsiburada",
            "https://www.hepsiburada.com/kampanyalar",
            FieldSelectors {
                item: ".campaign-card".to_string(),
                title: ".campaign-card__title".to_string(),
                discount: ".campaign-card__discount".to_string(),
                image: ".campaign-card__image img".to_string(),
                description: ".campaign-card__desc".to_string(),
                ..FieldSelectors::default()
            },
            Schedule::Daily,
            true,
        ),
        rule(
            "brand-migros",
            "https://www.migros.com.tr/kampanyalar",
            FieldSelectors {
                item: ".promo".to_string(),
                title: ".promo-title".to_string(),
                discount: ".promo-discount".to_string(),
                image: ".promo-image img".to_string(),
                description: ".promo-detail".to_string(),
                ..FieldSelectors::default()
            },
            Schedule::Daily,
            false,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BrandDirectory, MemoryDirectory};

    #[test]
    fn test_seed_rules_reference_seed_brands() {
        let directory = MemoryDirectory::new(demo_brands(), demo_categories());
        for rule in demo_rules() {
            assert!(directory.brand_exists(&rule.brand_id), "{}", rule.brand_id);
        }
    }

    #[test]
    fn test_seed_brands_reference_seed_categories() {
        let directory = MemoryDirectory::new(demo_brands(), demo_categories());
        for brand in demo_brands() {
            for cat in &brand.category_ids {
                assert!(directory.category(cat).is_some(), "{cat}");
            }
        }
    }

    #[test]
    fn test_seed_rule_ids_are_unique() {
        let rules = demo_rules();
        let mut ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
    }
}
