//! Mock source network for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::{
    PeerResponse, SearchStatus, SourceError, SourceNetwork, TransferFile,
};

/// A recorded transfer request for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTransfer {
    pub username: String,
    pub files: Vec<TransferFile>,
}

/// Mock implementation of the SourceNetwork trait.
///
/// Provides controllable behavior for testing:
/// - Scripted status sequences (the last entry repeats)
/// - Scripted response batches (the last batch repeats)
/// - Call counters and recorded transfers for assertions
/// - Simulated failures
///
/// # Example
///
/// ```rust,ignore
/// use albumhunt_core::testing::{MockSourceNetwork, fixtures};
///
/// let source = MockSourceNetwork::new();
/// source.set_statuses(vec![SearchStatus::in_progress(0), SearchStatus::completed(1)]).await;
/// source.set_responses(vec![fixtures::flac_peer("peer", "Abbey Road", 17)]).await;
/// ```
#[derive(Debug, Default)]
pub struct MockSourceNetwork {
    statuses: Arc<RwLock<VecDeque<SearchStatus>>>,
    response_batches: Arc<RwLock<VecDeque<Vec<PeerResponse>>>>,
    searches: Arc<RwLock<Vec<String>>>,
    transfers: Arc<RwLock<Vec<RecordedTransfer>>>,
    status_calls: Arc<RwLock<usize>>,
    fetch_calls: Arc<RwLock<usize>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<SourceError>>>,
}

impl MockSourceNetwork {
    /// Create a mock whose searches complete immediately with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status sequence returned by successive status calls.
    pub async fn set_statuses(&self, statuses: Vec<SearchStatus>) {
        *self.statuses.write().await = statuses.into();
    }

    /// Return the same responses on every fetch.
    pub async fn set_responses(&self, responses: Vec<PeerResponse>) {
        self.set_response_batches(vec![responses]).await;
    }

    /// Return these batches on successive fetches.
    pub async fn set_response_batches(&self, batches: Vec<Vec<PeerResponse>>) {
        *self.response_batches.write().await = batches.into();
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: SourceError) {
        *self.next_error.write().await = Some(error);
    }

    /// Search texts submitted so far.
    pub async fn recorded_searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    /// Transfers queued so far.
    pub async fn recorded_transfers(&self) -> Vec<RecordedTransfer> {
        self.transfers.read().await.clone()
    }

    pub async fn status_count(&self) -> usize {
        *self.status_calls.read().await
    }

    pub async fn fetch_count(&self) -> usize {
        *self.fetch_calls.read().await
    }

    async fn take_error(&self) -> Option<SourceError> {
        self.next_error.write().await.take()
    }
}

/// Pop the next scripted value, repeating the last one forever.
fn next_scripted<T: Clone>(script: &mut VecDeque<T>) -> Option<T> {
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

#[async_trait]
impl SourceNetwork for MockSourceNetwork {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start_search(&self, text: &str) -> Result<String, SourceError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        let mut searches = self.searches.write().await;
        searches.push(text.to_string());
        Ok(format!("search-{}", searches.len()))
    }

    async fn search_status(&self, _search_id: &str) -> Result<SearchStatus, SourceError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        *self.status_calls.write().await += 1;
        let mut statuses = self.statuses.write().await;
        Ok(next_scripted(&mut *statuses).unwrap_or_else(|| SearchStatus::completed(0)))
    }

    async fn search_responses(&self, _search_id: &str) -> Result<Vec<PeerResponse>, SourceError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        *self.fetch_calls.write().await += 1;
        let mut batches = self.response_batches.write().await;
        Ok(next_scripted(&mut *batches).unwrap_or_default())
    }

    async fn queue_transfer(
        &self,
        username: &str,
        files: &[TransferFile],
    ) -> Result<(), SourceError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.transfers.write().await.push(RecordedTransfer {
            username: username.to_string(),
            files: files.to_vec(),
        });
        Ok(())
    }
}
