// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the domain from a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_lowercase()))
}

/// Normalize a campaign source URL for natural-key matching.
///
/// Lowercases the host, strips the fragment and any trailing slash on the
/// path, keeps the query. Unparseable input falls back to a trimmed copy so
/// two runs still agree on the key.
pub fn normalize_source_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.trim_end_matches('/').to_string();
    };

    url.set_fragment(None);
    if let Some(host) = url.host_str().map(|h| h.to_lowercase()) {
        // Host is already ASCII-normalized by the parser; lowercase is cheap
        let _ = url.set_host(Some(&host));
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}
