//! Mock catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{
    Artist, CatalogClient, CatalogError, Release, ReleaseDetails, ReleaseGroup,
};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCatalogQuery {
    SearchArtists { query: String },
    ReleaseGroups { artist_id: String },
    Releases { release_group_id: String },
    ReleaseDetails { release_id: String },
}

/// Mock implementation of the CatalogClient trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable artists, release groups, releases and details
/// - Track queries for assertions
/// - Simulate failures
#[derive(Debug, Default)]
pub struct MockCatalog {
    artists: Arc<RwLock<Vec<Artist>>>,
    /// Release groups by artist ID.
    release_groups: Arc<RwLock<HashMap<String, Vec<ReleaseGroup>>>>,
    /// Releases by release group ID.
    releases: Arc<RwLock<HashMap<String, Vec<Release>>>>,
    /// Details by release ID.
    details: Arc<RwLock<HashMap<String, ReleaseDetails>>>,
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Artists returned by every search.
    pub async fn set_artists(&self, artists: Vec<Artist>) {
        *self.artists.write().await = artists;
    }

    pub async fn set_release_groups(&self, artist_id: &str, groups: Vec<ReleaseGroup>) {
        self.release_groups
            .write()
            .await
            .insert(artist_id.to_string(), groups);
    }

    pub async fn set_releases(&self, release_group_id: &str, releases: Vec<Release>) {
        self.releases
            .write()
            .await
            .insert(release_group_id.to_string(), releases);
    }

    pub async fn add_details(&self, details: ReleaseDetails) {
        self.details
            .write()
            .await
            .insert(details.id.clone(), details);
    }

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    async fn record(&self, query: RecordedCatalogQuery) -> Result<(), CatalogError> {
        self.queries.write().await.push(query);
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn search_artists(&self, query: &str) -> Result<Vec<Artist>, CatalogError> {
        self.record(RecordedCatalogQuery::SearchArtists {
            query: query.to_string(),
        })
        .await?;
        Ok(self.artists.read().await.clone())
    }

    async fn release_groups(&self, artist_id: &str) -> Result<Vec<ReleaseGroup>, CatalogError> {
        self.record(RecordedCatalogQuery::ReleaseGroups {
            artist_id: artist_id.to_string(),
        })
        .await?;
        Ok(self
            .release_groups
            .read()
            .await
            .get(artist_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn releases(&self, release_group: &ReleaseGroup) -> Result<Vec<Release>, CatalogError> {
        self.record(RecordedCatalogQuery::Releases {
            release_group_id: release_group.id.clone(),
        })
        .await?;
        Ok(self
            .releases
            .read()
            .await
            .get(&release_group.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn release_details(&self, release_id: &str) -> Result<ReleaseDetails, CatalogError> {
        self.record(RecordedCatalogQuery::ReleaseDetails {
            release_id: release_id.to_string(),
        })
        .await?;
        self.details
            .read()
            .await
            .get(release_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(release_id.to_string()))
    }
}
