//! Remote metadata catalog (MusicBrainz).
//!
//! Every outbound call goes through a shared [`RateLimiter`] and is retried on
//! transient failures with exponential backoff (see [`retry`]).

mod musicbrainz;
mod rate_limiter;
pub mod retry;
mod types;

pub use musicbrainz::MusicBrainzClient;
pub use rate_limiter::RateLimiter;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when interacting with the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl CatalogError {
    /// Transport failures and 5xx responses are worth another attempt.
    /// 4xx responses and parse failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::HttpError(e) => e.status().is_none_or(|s| s.is_server_error()),
            CatalogError::ApiError { status, .. } => *status >= 500,
            CatalogError::NotFound(_) | CatalogError::ParseError(_) => false,
        }
    }
}

/// Trait for catalog backends.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Search artists by free-text query.
    async fn search_artists(&self, query: &str) -> Result<Vec<Artist>, CatalogError>;

    /// Enumerate the release groups of an artist.
    async fn release_groups(&self, artist_id: &str) -> Result<Vec<ReleaseGroup>, CatalogError>;

    /// Enumerate the releases of a release group, sorted by date ascending.
    async fn releases(&self, release_group: &ReleaseGroup)
        -> Result<Vec<Release>, CatalogError>;

    /// Fetch a release including its track list.
    async fn release_details(&self, release_id: &str) -> Result<ReleaseDetails, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CatalogError::ApiError {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_transient());
        assert!(!CatalogError::ApiError {
            status: 429,
            message: "slow down".to_string()
        }
        .is_transient());
        assert!(!CatalogError::NotFound("x".to_string()).is_transient());
        assert!(!CatalogError::ParseError("bad json".to_string()).is_transient());
    }
}
