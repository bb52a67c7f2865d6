// src/error.rs

//! Unified error handling for the deal crawler.

use std::fmt;

use thiserror::Error;

use crate::models::Field;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error outside the fetch taxonomy (e.g. client build)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error, reported synchronously to the caller
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store operation on an unknown identifier
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Manual trigger on a rule that is already mid-run
    #[error("Rule {rule_id} is already running")]
    AlreadyRunning { rule_id: String },

    /// Document retrieval failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Selector application failed
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error for the given entity kind.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Failure retrieving a rule's target document.
///
/// Transient: the scheduler records the run and the rule waits out its
/// schedule period, so no retry logic lives here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Request exceeded the configured timeout
    #[error("Fetch timed out for {url}")]
    Timeout { url: String },

    /// Host could not be reached (DNS, connect, TLS)
    #[error("Unreachable {url}: {message}")]
    Unreachable { url: String, message: String },

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    /// Short token for logs and run records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Unreachable { .. } => "unreachable",
            Self::HttpStatus { .. } => "http-status",
        }
    }
}

/// Failure applying a rule's selectors to a fetched document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Document could not be parsed at all
    #[error("Document unparseable for {url}")]
    DocumentUnparseable { url: String },

    /// A selector string is not valid CSS
    #[error("Invalid selector for {field}: '{selector}'")]
    InvalidSelector { field: Field, selector: String },

    /// A non-empty selector matched nothing within its item
    #[error("Selector for {field} matched nothing")]
    SelectorNotFound { field: Field },

    /// A non-empty selector matched more than one element within its item
    #[error("Selector for {field} is ambiguous ({matches} matches)")]
    MultipleMatches { field: Field, matches: usize },
}

impl ExtractionError {
    /// The field the error refers to, if any.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::DocumentUnparseable { .. } => None,
            Self::InvalidSelector { field, .. }
            | Self::SelectorNotFound { field }
            | Self::MultipleMatches { field, .. } => Some(*field),
        }
    }
}
