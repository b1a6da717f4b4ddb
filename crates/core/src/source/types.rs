//! Types for the source network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a running search as reported by the network service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatus {
    /// The service's own completion flag. Not trusted on its own.
    pub is_complete: bool,
    /// Raw state string, e.g. "InProgress", "Completed, TimedOut".
    #[serde(default)]
    pub state: String,
    /// Number of peers that answered so far.
    pub response_count: u32,
}

impl SearchStatus {
    pub fn in_progress(response_count: u32) -> Self {
        Self {
            is_complete: false,
            state: "InProgress".to_string(),
            response_count,
        }
    }

    pub fn completed(response_count: u32) -> Self {
        Self {
            is_complete: true,
            state: "Completed".to_string(),
            response_count,
        }
    }
}

/// One peer's answer to a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerResponse {
    /// Peer identity.
    pub username: String,
    /// Whether the peer has an upload slot available right now.
    #[serde(default)]
    pub has_free_upload_slot: bool,
    /// Advertised upload speed in bytes/second.
    #[serde(default)]
    pub upload_speed: u64,
    #[serde(default)]
    pub queue_length: u64,
    #[serde(default)]
    pub files: Vec<PeerFile>,
}

/// A shared file as listed by a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerFile {
    /// Full path on the peer, with either separator style.
    pub filename: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u32>,
    /// Container extension without the dot; may be empty.
    #[serde(default)]
    pub extension: String,
}

/// A file to request from a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFile {
    pub filename: String,
    pub size: u64,
}

/// Errors that can occur during source network operations.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source network connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Source network API error: {0}")]
    ApiError(String),

    #[error("Search not found: {0}")]
    SearchNotFound(String),

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if e.is_connect() {
            SourceError::ConnectionFailed(e.to_string())
        } else {
            SourceError::ApiError(e.to_string())
        }
    }
}

/// Trait for source network backends.
#[async_trait]
pub trait SourceNetwork: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Start a search and return its identifier.
    async fn start_search(&self, text: &str) -> Result<String, SourceError>;

    /// Current status of a search.
    async fn search_status(&self, search_id: &str) -> Result<SearchStatus, SourceError>;

    /// All peer responses accumulated so far.
    async fn search_responses(&self, search_id: &str) -> Result<Vec<PeerResponse>, SourceError>;

    /// Queue the given files from one peer.
    async fn queue_transfer(
        &self,
        username: &str,
        files: &[TransferFile],
    ) -> Result<(), SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_response_minimal_json() {
        let json = r#"{"username": "peer", "files": [{"filename": "a\\b.flac", "size": 10}]}"#;
        let parsed: PeerResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.username, "peer");
        assert!(!parsed.has_free_upload_slot);
        assert_eq!(parsed.upload_speed, 0);
        assert_eq!(parsed.files[0].extension, "");
        assert!(parsed.files[0].bit_rate.is_none());
    }

    #[test]
    fn test_status_constructors() {
        assert!(!SearchStatus::in_progress(3).is_complete);
        let done = SearchStatus::completed(5);
        assert!(done.is_complete);
        assert_eq!(done.response_count, 5);
    }
}
