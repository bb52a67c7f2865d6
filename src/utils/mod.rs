//! Utility functions and helpers.

pub mod ids;
pub mod url;

pub use url::{get_domain, normalize_source_url, resolve_url};
