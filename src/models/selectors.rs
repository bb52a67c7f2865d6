// src/models/selectors.rs

//! CSS selectors for scraping a brand campaign page.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The extractable fields of a campaign candidate, plus the structural
/// selectors (item container, link) referenced by extraction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Item,
    Title,
    Discount,
    Image,
    Description,
    Link,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Item => "item",
            Field::Title => "title",
            Field::Discount => "discount",
            Field::Image => "image",
            Field::Description => "description",
            Field::Link => "link",
        };
        f.write_str(name)
    }
}

/// CSS selectors describing how to pull campaign fields out of a page.
///
/// An empty string means "do not extract this field". The `item` selector
/// names the repeating campaign-card container on a listing page; when empty
/// the whole document is treated as a single item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelectors {
    /// Selector for each campaign card/container on the page
    #[serde(default)]
    pub item: String,

    /// Selector for the campaign title within an item
    #[serde(default)]
    pub title: String,

    /// Selector for the discount rate within an item
    #[serde(default)]
    pub discount: String,

    /// Selector for the campaign image within an item
    #[serde(default)]
    pub image: String,

    /// Selector for the campaign description within an item
    #[serde(default)]
    pub description: String,

    /// Selector for the element carrying the campaign link
    /// (falls back to the first `a` in the item when empty)
    #[serde(default)]
    pub link: String,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_link_attr")]
    pub link_attr: String,
}

fn default_link_attr() -> String {
    "href".to_string()
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            item: String::new(),
            title: String::new(),
            discount: String::new(),
            image: String::new(),
            description: String::new(),
            link: String::new(),
            link_attr: default_link_attr(),
        }
    }
}

impl FieldSelectors {
    /// The selector string for a given field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Item => &self.item,
            Field::Title => &self.title,
            Field::Discount => &self.discount,
            Field::Image => &self.image,
            Field::Description => &self.description,
            Field::Link => &self.link,
        }
    }

    /// Whether a field's selector is configured (non-empty).
    pub fn is_configured(&self, field: Field) -> bool {
        !self.get(field).trim().is_empty()
    }

    /// Extractable fields with a non-empty selector, in extraction order.
    pub fn configured_fields(&self) -> Vec<Field> {
        [
            Field::Title,
            Field::Discount,
            Field::Image,
            Field::Description,
        ]
        .into_iter()
        .filter(|f| self.is_configured(*f))
        .collect()
    }

    /// All non-empty selector strings paired with their field, for
    /// validation and error reporting.
    pub fn non_empty(&self) -> Vec<(Field, &str)> {
        [
            Field::Item,
            Field::Title,
            Field::Discount,
            Field::Image,
            Field::Description,
            Field::Link,
        ]
        .into_iter()
        .filter(|f| self.is_configured(*f))
        .map(|f| (f, self.get(f)))
        .collect()
    }
}
