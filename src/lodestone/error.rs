//! Error types for catalog loading, location building and page fetching.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for scraping operations.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Why a page fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// The server answered with a non-success status.
    #[error("HTTP {0}: failed to fetch page")]
    Status(u16),
    /// The request never produced a response (timeout, DNS, reset, ...).
    #[error("{0}")]
    Transport(String),
}

/// Errors raised while resolving and scraping a selector address.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("selector file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("selector file {} is not valid: {reason}", path.display())]
    MalformedCatalog { path: PathBuf, reason: String },

    #[error("no URI template for {key}")]
    NoTemplate { key: String },

    #[error("URI template for {key} takes {expected} values, {provided} provided")]
    TemplateMismatch {
        key: String,
        expected: usize,
        provided: usize,
    },

    #[error("key '{key}' not found in selector '{address}'")]
    SelectorNotFound { key: String, address: String },

    #[error("failed to fetch {url}: {failure}")]
    FetchFailed { url: String, failure: FetchFailure },
}

impl ScrapeError {
    /// Stable category name, shown to users alongside the message.
    pub fn category(&self) -> &'static str {
        match self {
            ScrapeError::NotFound { .. } => "NotFound",
            ScrapeError::MalformedCatalog { .. } => "MalformedCatalog",
            ScrapeError::NoTemplate { .. } => "NoTemplate",
            ScrapeError::TemplateMismatch { .. } => "TemplateMismatch",
            ScrapeError::SelectorNotFound { .. } => "SelectorNotFound",
            ScrapeError::FetchFailed { .. } => "FetchFailed",
        }
    }

    /// HTTP status of a failed fetch, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScrapeError::FetchFailed {
                failure: FetchFailure::Status(code),
                ..
            } => Some(*code),
            _ => None,
        }
    }
}
