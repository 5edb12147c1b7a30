//! Verification errors.

use thiserror::Error;

use crate::cache::CacheError;
use crate::lodestone::ScrapeError;
use crate::repository::DbError;

/// Result type for verification operations.
pub type VerificationResult<T> = Result<T, VerificationError>;

/// Why a verification step failed. Every variant leaves a pending token in place.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("no pending verification, or it has expired; start a new one")]
    TokenMissingOrExpired,

    #[error("verification token not found in the character profile")]
    TokenNotFound,

    #[error("'{0}' is not a valid Lodestone character id")]
    InvalidEntityId(String),

    #[error("character profile is missing {field}")]
    IncompleteProfile { field: &'static str },

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("{0}")]
    Persistence(String),
}

impl VerificationError {
    /// Stable category name, shown to users alongside the message.
    pub fn category(&self) -> &'static str {
        match self {
            VerificationError::TokenMissingOrExpired => "TokenMissingOrExpired",
            VerificationError::TokenNotFound => "TokenNotFound",
            VerificationError::InvalidEntityId(_) => "InvalidEntityId",
            VerificationError::IncompleteProfile { .. } => "IncompleteProfile",
            VerificationError::Scrape(e) => e.category(),
            VerificationError::Persistence(_) => "PersistenceFailure",
        }
    }
}

impl From<DbError> for VerificationError {
    fn from(e: DbError) -> Self {
        VerificationError::Persistence(format!("database: {}", e))
    }
}

impl From<CacheError> for VerificationError {
    fn from(e: CacheError) -> Self {
        VerificationError::Persistence(format!("cache: {}", e))
    }
}
