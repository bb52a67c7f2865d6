// src/services/extractor.rs

//! Selector application: fetched document -> campaign candidates.
//!
//! Pure and deterministic: the same document and selectors always produce
//! the same candidates. Listing pages fan out through the rule's `item`
//! selector, one candidate per matched container; an empty `item` selector
//! treats the whole document as a single item.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ExtractionError;
use crate::models::{Candidate, Field, FieldSelectors};
use crate::services::RawDocument;
use crate::utils::{normalize_source_url, resolve_url};

/// Result of applying one rule's selectors to one page.
///
/// Item-level failures do not abort the page; the scheduler decides what a
/// mixed result means for the run outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<ExtractionError>,
}

/// Apply `selectors` to `doc`, producing candidates for reconciliation.
///
/// Page-level errors (`DocumentUnparseable`, `InvalidSelector`) abort the
/// whole extraction. A parsed page where the item selector matches nothing
/// is a successful extraction of zero candidates.
pub fn extract(
    doc: &RawDocument,
    selectors: &FieldSelectors,
) -> Result<Extraction, ExtractionError> {
    if doc.body.trim().is_empty() {
        return Err(ExtractionError::DocumentUnparseable {
            url: doc.url.clone(),
        });
    }

    let compiled = CompiledSelectors::compile(selectors)?;
    let html = Html::parse_document(&doc.body);
    let base_url = Url::parse(&doc.url).ok();

    let mut extraction = Extraction::default();
    let mut seen_urls: HashSet<String> = HashSet::new();

    let items: Vec<ElementRef> = match &compiled.item {
        Some(item_sel) => html.select(item_sel).collect(),
        None => vec![html.root_element()],
    };

    for item in items {
        match extract_item(&item, selectors, &compiled, base_url.as_ref(), &doc.url) {
            Ok(candidate) => {
                // A page can repeat the same campaign card; first wins
                if seen_urls.insert(candidate.source_url.clone()) {
                    extraction.candidates.push(candidate);
                }
            }
            Err(failure) => extraction.failures.push(failure),
        }
    }

    Ok(extraction)
}

struct CompiledSelectors {
    item: Option<Selector>,
    title: Option<Selector>,
    discount: Option<Selector>,
    image: Option<Selector>,
    description: Option<Selector>,
    link: Option<Selector>,
}

impl CompiledSelectors {
    fn compile(selectors: &FieldSelectors) -> Result<Self, ExtractionError> {
        let parse = |field: Field| -> Result<Option<Selector>, ExtractionError> {
            let raw = selectors.get(field).trim();
            if raw.is_empty() {
                return Ok(None);
            }
            Selector::parse(raw)
                .map(Some)
                .map_err(|_| ExtractionError::InvalidSelector {
                    field,
                    selector: raw.to_string(),
                })
        };

        Ok(Self {
            item: parse(Field::Item)?,
            title: parse(Field::Title)?,
            discount: parse(Field::Discount)?,
            image: parse(Field::Image)?,
            description: parse(Field::Description)?,
            link: parse(Field::Link)?,
        })
    }
}

fn extract_item(
    item: &ElementRef,
    selectors: &FieldSelectors,
    compiled: &CompiledSelectors,
    base_url: Option<&Url>,
    page_url: &str,
) -> Result<Candidate, ExtractionError> {
    let source_url = extract_link(item, selectors, compiled, base_url, page_url)?;
    let mut candidate = Candidate::bare(normalize_source_url(&source_url));

    if let Some(sel) = &compiled.title {
        let element = select_one(item, sel, Field::Title)?;
        candidate.title = Some(element_text(&element));
    }
    if let Some(sel) = &compiled.description {
        let element = select_one(item, sel, Field::Description)?;
        candidate.description = Some(element_text(&element));
    }
    if let Some(sel) = &compiled.discount {
        let element = select_one(item, sel, Field::Discount)?;
        candidate.discount_rate = parse_discount(&element_text(&element));
    }
    if let Some(sel) = &compiled.image {
        let element = select_one(item, sel, Field::Image)?;
        let src = element
            .value()
            .attr("src")
            .or_else(|| element.value().attr("data-src"))
            .ok_or(ExtractionError::SelectorNotFound { field: Field::Image })?;
        candidate.image_url = Some(resolve(base_url, src));
    }

    Ok(candidate)
}

/// Per-item source URL: explicit link selector, else the first anchor in
/// the item, else the page URL itself (single-page rules).
fn extract_link(
    item: &ElementRef,
    selectors: &FieldSelectors,
    compiled: &CompiledSelectors,
    base_url: Option<&Url>,
    page_url: &str,
) -> Result<String, ExtractionError> {
    if let Some(sel) = &compiled.link {
        let element = select_one(item, sel, Field::Link)?;
        let href = element
            .value()
            .attr(selectors.link_attr.as_str())
            .ok_or(ExtractionError::SelectorNotFound { field: Field::Link })?;
        return Ok(resolve(base_url, href));
    }

    static ANCHOR: OnceLock<Selector> = OnceLock::new();
    let anchor = ANCHOR.get_or_init(|| Selector::parse("a[href]").expect("static selector"));
    if let Some(a) = item.select(anchor).next() {
        if let Some(href) = a.value().attr("href") {
            return Ok(resolve(base_url, href));
        }
    }

    Ok(page_url.to_string())
}

/// Select exactly one element for a configured field.
fn select_one<'a>(
    item: &ElementRef<'a>,
    selector: &Selector,
    field: Field,
) -> Result<ElementRef<'a>, ExtractionError> {
    let mut matches = item.select(selector);
    let first = matches
        .next()
        .ok_or(ExtractionError::SelectorNotFound { field })?;
    let extra = matches.count();
    if extra > 0 {
        return Err(ExtractionError::MultipleMatches {
            field,
            matches: extra + 1,
        });
    }
    Ok(first)
}

/// Collapse an element's text into single-space-separated form.
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pull a percentage out of text like "%40", "40% off" or "up to 40".
fn parse_discount(text: &str) -> Option<u32> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"(\d{1,3})").expect("static regex"));
    let rate: u32 = digits.captures(text)?.get(1)?.as_str().parse().ok()?;
    (rate <= 100).then_some(rate)
}

fn resolve(base_url: Option<&Url>, href: &str) -> String {
    match base_url {
        Some(base) => resolve_url(base, href),
        None => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="campaign-card">
            <h2 class="campaign-title">Spring   Sale</h2>
            <span class="discount-badge">%40</span>
            <img class="campaign-image" src="/img/spring.jpg">
            <p class="campaign-desc">Big spring deals</p>
            <a href="/campaigns/spring">See</a>
          </div>
          <div class="campaign-card">
            <h2 class="campaign-title">Tech Week</h2>
            <span class="discount-badge">25% off</span>
            <img class="campaign-image" src="/img/tech.jpg">
            <p class="campaign-desc">Laptops and more</p>
            <a href="/campaigns/tech">See</a>
          </div>
        </body></html>
    "#;

    fn doc(body: &str) -> RawDocument {
        RawDocument {
            url: "https://shop.example.com/deals".to_string(),
            body: body.to_string(),
        }
    }

    fn listing_selectors() -> FieldSelectors {
        FieldSelectors {
            item: ".campaign-card".to_string(),
            title: ".campaign-title".to_string(),
            discount: ".discount-badge".to_string(),
            image: ".campaign-image".to_string(),
            description: ".campaign-desc".to_string(),
            ..FieldSelectors::default()
        }
    }

    #[test]
    fn test_extract_listing_page() {
        let extraction = extract(&doc(LISTING), &listing_selectors()).unwrap();
        assert!(extraction.failures.is_empty());
        assert_eq!(extraction.candidates.len(), 2);

        let first = &extraction.candidates[0];
        assert_eq!(first.title.as_deref(), Some("Spring Sale"));
        assert_eq!(first.discount_rate, Some(40));
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://shop.example.com/img/spring.jpg")
        );
        assert_eq!(
            first.source_url,
            "https://shop.example.com/campaigns/spring"
        );
    }

    #[test]
    fn test_empty_selector_omits_field() {
        let mut selectors = listing_selectors();
        selectors.discount = String::new();
        selectors.description = String::new();

        let extraction = extract(&doc(LISTING), &selectors).unwrap();
        assert!(extraction.failures.is_empty());
        let first = &extraction.candidates[0];
        assert_eq!(first.discount_rate, None);
        assert_eq!(first.description, None);
        assert!(first.title.is_some());
    }

    #[test]
    fn test_zero_items_is_success_with_no_candidates() {
        let extraction = extract(
            &doc("<html><body><p>maintenance</p></body></html>"),
            &listing_selectors(),
        )
        .unwrap();
        assert!(extraction.candidates.is_empty());
        assert!(extraction.failures.is_empty());
    }

    #[test]
    fn test_missing_configured_field_is_item_failure() {
        let body = r#"
            <div class="campaign-card">
              <h2 class="campaign-title">No badge here</h2>
              <a href="/c/1">x</a>
            </div>
        "#;
        let mut selectors = listing_selectors();
        selectors.image = String::new();
        selectors.description = String::new();

        let extraction = extract(&doc(body), &selectors).unwrap();
        assert!(extraction.candidates.is_empty());
        assert_eq!(extraction.failures.len(), 1);
        assert_eq!(extraction.failures[0].field(), Some(Field::Discount));
    }

    #[test]
    fn test_ambiguous_selector_is_item_failure() {
        let body = r#"
            <div class="campaign-card">
              <h2 class="campaign-title">One</h2>
              <h2 class="campaign-title">Two</h2>
              <a href="/c/1">x</a>
            </div>
        "#;
        let selectors = FieldSelectors {
            item: ".campaign-card".to_string(),
            title: ".campaign-title".to_string(),
            ..FieldSelectors::default()
        };
        let extraction = extract(&doc(body), &selectors).unwrap();
        assert!(matches!(
            extraction.failures[0],
            ExtractionError::MultipleMatches {
                field: Field::Title,
                matches: 2
            }
        ));
    }

    #[test]
    fn test_partial_page_keeps_good_items() {
        let body = r#"
            <div class="campaign-card">
              <h2 class="campaign-title">Good</h2>
              <span class="discount-badge">10</span>
              <a href="/c/good">x</a>
            </div>
            <div class="campaign-card">
              <span class="discount-badge">20</span>
              <a href="/c/broken">x</a>
            </div>
        "#;
        let mut selectors = listing_selectors();
        selectors.image = String::new();
        selectors.description = String::new();

        let extraction = extract(&doc(body), &selectors).unwrap();
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.failures.len(), 1);
        assert_eq!(extraction.candidates[0].title.as_deref(), Some("Good"));
    }

    #[test]
    fn test_blank_document_is_unparseable() {
        let err = extract(&doc("   "), &listing_selectors()).unwrap_err();
        assert!(matches!(err, ExtractionError::DocumentUnparseable { .. }));
    }

    #[test]
    fn test_invalid_selector_is_page_error() {
        let mut selectors = listing_selectors();
        selectors.title = "[[nope".to_string();
        let err = extract(&doc(LISTING), &selectors).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::InvalidSelector {
                field: Field::Title,
                ..
            }
        ));
    }

    #[test]
    fn test_whole_document_single_item() {
        let body = r#"
            <html><body>
              <h1 class="campaign-title">Site-wide Sale</h1>
              <span class="discount-badge">up to 70%</span>
            </body></html>
        "#;
        let selectors = FieldSelectors {
            title: ".campaign-title".to_string(),
            discount: ".discount-badge".to_string(),
            ..FieldSelectors::default()
        };
        let extraction = extract(&doc(body), &selectors).unwrap();
        assert_eq!(extraction.candidates.len(), 1);
        let candidate = &extraction.candidates[0];
        // No anchors: the page itself is the campaign URL
        assert_eq!(candidate.source_url, "https://shop.example.com/deals");
        assert_eq!(candidate.discount_rate, Some(70));
    }

    #[test]
    fn test_duplicate_cards_dedup_by_source_url() {
        let body = r#"
            <div class="campaign-card"><h2 class="campaign-title">A</h2><a href="/c/1">x</a></div>
            <div class="campaign-card"><h2 class="campaign-title">A again</h2><a href="/c/1">x</a></div>
        "#;
        let selectors = FieldSelectors {
            item: ".campaign-card".to_string(),
            title: ".campaign-title".to_string(),
            ..FieldSelectors::default()
        };
        let extraction = extract(&doc(body), &selectors).unwrap();
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.candidates[0].title.as_deref(), Some("A"));
    }

    #[test]
    fn test_explicit_link_selector_and_attr() {
        let body = r#"
            <div class="campaign-card">
              <h2 class="campaign-title">A</h2>
              <div class="cta" data-target="/c/cta">go</div>
            </div>
        "#;
        let selectors = FieldSelectors {
            item: ".campaign-card".to_string(),
            title: ".campaign-title".to_string(),
            link: ".cta".to_string(),
            link_attr: "data-target".to_string(),
            ..FieldSelectors::default()
        };
        let extraction = extract(&doc(body), &selectors).unwrap();
        assert_eq!(
            extraction.candidates[0].source_url,
            "https://shop.example.com/c/cta"
        );
    }

    #[test]
    fn test_parse_discount_variants() {
        assert_eq!(parse_discount("%40"), Some(40));
        assert_eq!(parse_discount("25% off"), Some(25));
        assert_eq!(parse_discount("up to 70"), Some(70));
        assert_eq!(parse_discount("free shipping"), None);
        assert_eq!(parse_discount("999"), None);
    }
}
