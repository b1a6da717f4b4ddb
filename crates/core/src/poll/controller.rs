use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PollConfig;
use crate::source::{PeerResponse, SearchStatus, SourceError, SourceNetwork};

/// Counters carried between ticks of one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    pub search_id: String,
    pub response_count_last_seen: u32,
    pub stable_poll_count: u32,
    /// Non-zero while re-fetching an unexpectedly empty payload.
    pub fetch_retry_count: u32,
    pub total_poll_count: u32,
}

impl PollState {
    pub fn new(search_id: impl Into<String>) -> Self {
        Self {
            search_id: search_id.into(),
            ..Default::default()
        }
    }

    /// Human readable progress, more detailed the longer the search runs.
    pub fn status_line(&self, config: &PollConfig) -> String {
        let responses = match self.response_count_last_seen {
            1 => "1 response".to_string(),
            n => format!("{} responses", n),
        };

        if self.fetch_retry_count > 0 {
            return format!(
                "Fetching {} (retry {}/{})",
                responses, self.fetch_retry_count, config.max_fetch_retries
            );
        }

        if self.stable_poll_count > 0 {
            return format!(
                "Waiting for late responses ({}/{}), {}",
                self.stable_poll_count, config.stability_threshold, responses
            );
        }

        let elapsed_secs = (self.total_poll_count as u64 * config.tick_interval_ms) / 1000;
        if elapsed_secs >= 10 {
            format!("Searching ({}s), {}", elapsed_secs, responses)
        } else {
            format!("Searching, {}", responses)
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Not done yet; tick again with this state after the tick interval.
    Continue(PollState),
    /// Terminal. `timed_out` marks a forced fetch at the poll ceiling.
    Finished {
        responses: Vec<PeerResponse>,
        timed_out: bool,
    },
}

/// What a status observation calls for.
#[derive(Debug, PartialEq, Eq)]
enum Decision {
    Tick,
    Fetch,
    ForceFetch,
}

/// Drives one search to a terminal result, one tick at a time.
#[derive(Clone)]
pub struct PollController {
    source: Arc<dyn SourceNetwork>,
    config: PollConfig,
}

impl PollController {
    pub fn new(source: Arc<dyn SourceNetwork>, config: PollConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Run one tick. The inter-tick delay is the caller's responsibility.
    pub async fn tick(&self, mut state: PollState) -> Result<PollOutcome, SourceError> {
        state.total_poll_count += 1;

        if state.fetch_retry_count > 0 {
            return self.fetch(state).await;
        }

        let status = self.source.search_status(&state.search_id).await?;
        debug!(
            search_id = %state.search_id,
            tick = state.total_poll_count,
            complete = status.is_complete,
            responses = status.response_count,
            stable = state.stable_poll_count,
            "Search status"
        );

        match self.observe(&mut state, &status) {
            Decision::Tick => Ok(PollOutcome::Continue(state)),
            Decision::Fetch => self.fetch(state).await,
            Decision::ForceFetch => {
                warn!(
                    search_id = %state.search_id,
                    ticks = state.total_poll_count,
                    "Search never reported completion, fetching what exists"
                );
                let responses = self.source.search_responses(&state.search_id).await?;
                Ok(PollOutcome::Finished {
                    responses,
                    timed_out: true,
                })
            }
        }
    }

    fn observe(&self, state: &mut PollState, status: &SearchStatus) -> Decision {
        if state.total_poll_count >= self.config.max_polls && !status.is_complete {
            return Decision::ForceFetch;
        }

        if !status.is_complete {
            state.response_count_last_seen = status.response_count;
            state.stable_poll_count = 0;
            state.fetch_retry_count = 0;
            return Decision::Tick;
        }

        if status.response_count > state.response_count_last_seen {
            state.response_count_last_seen = status.response_count;
            state.stable_poll_count = 0;
            state.fetch_retry_count = 0;
            return Decision::Tick;
        }

        state.stable_poll_count += 1;
        if state.stable_poll_count < self.config.stability_threshold {
            return Decision::Tick;
        }

        Decision::Fetch
    }

    async fn fetch(&self, mut state: PollState) -> Result<PollOutcome, SourceError> {
        let responses = self.source.search_responses(&state.search_id).await?;

        if responses.is_empty()
            && state.response_count_last_seen > 0
            && state.fetch_retry_count < self.config.max_fetch_retries
        {
            state.fetch_retry_count += 1;
            debug!(
                search_id = %state.search_id,
                claimed = state.response_count_last_seen,
                retry = state.fetch_retry_count,
                "Search claims responses but none were returned, retrying fetch"
            );
            return Ok(PollOutcome::Continue(state));
        }

        Ok(PollOutcome::Finished {
            responses,
            timed_out: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockSourceNetwork};

    fn controller(source: &Arc<MockSourceNetwork>) -> PollController {
        PollController::new(
            Arc::clone(source) as Arc<dyn SourceNetwork>,
            PollConfig::default(),
        )
    }

    /// Tick until terminal.
    async fn run(controller: &PollController, search_id: &str) -> PollOutcome {
        let mut state = PollState::new(search_id);
        loop {
            match controller.tick(state).await.unwrap() {
                PollOutcome::Continue(next) => state = next,
                finished => return finished,
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_waits_for_six_stable_completed_ticks() {
        let source = Arc::new(MockSourceNetwork::new());
        let mut statuses = vec![SearchStatus::in_progress(0), SearchStatus::in_progress(2)];
        statuses.extend(std::iter::repeat_n(SearchStatus::completed(5), 7));
        source.set_statuses(statuses).await;
        source
            .set_responses(vec![fixtures::flac_peer("p", "Album", 3)])
            .await;

        let controller = controller(&source);
        let mut state = PollState::new("s1");

        // InProgress, InProgress, Completed(5) growth, then five stable ticks.
        for _ in 0..8 {
            match controller.tick(state).await.unwrap() {
                PollOutcome::Continue(next) => state = next,
                other => panic!("finished too early: {:?}", other),
            }
            assert_eq!(source.fetch_count().await, 0);
        }
        assert_eq!(state.stable_poll_count, 5);

        // Sixth stable tick fetches.
        let outcome = controller.tick(state).await.unwrap();
        assert_eq!(source.fetch_count().await, 1);
        match outcome {
            PollOutcome::Finished {
                responses,
                timed_out,
            } => {
                assert_eq!(responses.len(), 1);
                assert!(!timed_out);
            }
            other => panic!("expected finished, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_growing_count_resets_stability() {
        let source = Arc::new(MockSourceNetwork::new());
        source
            .set_statuses(vec![
                SearchStatus::completed(1),
                SearchStatus::completed(1),
                SearchStatus::completed(1),
                SearchStatus::completed(4),
            ])
            .await;

        let controller = controller(&source);
        let mut state = PollState::new("s1");
        for _ in 0..3 {
            if let PollOutcome::Continue(next) = controller.tick(state.clone()).await.unwrap() {
                state = next;
            }
        }
        assert_eq!(state.stable_poll_count, 2);

        let PollOutcome::Continue(state) = controller.tick(state).await.unwrap() else {
            panic!("expected continue");
        };
        assert_eq!(state.stable_poll_count, 0);
        assert_eq!(state.response_count_last_seen, 4);
    }

    #[tokio::test]
    async fn test_in_progress_resets_counters() {
        let source = Arc::new(MockSourceNetwork::new());
        source.set_statuses(vec![SearchStatus::in_progress(3)]).await;

        let controller = controller(&source);
        let state = PollState {
            search_id: "s1".to_string(),
            response_count_last_seen: 3,
            stable_poll_count: 4,
            fetch_retry_count: 0,
            total_poll_count: 10,
        };

        let PollOutcome::Continue(state) = controller.tick(state).await.unwrap() else {
            panic!("expected continue");
        };
        assert_eq!(state.stable_poll_count, 0);
        assert_eq!(state.total_poll_count, 11);
    }

    #[tokio::test]
    async fn test_ceiling_forces_fetch_when_never_complete() {
        let source = Arc::new(MockSourceNetwork::new());
        source.set_statuses(vec![SearchStatus::in_progress(2)]).await;
        source
            .set_responses(vec![
                fixtures::flac_peer("a", "Album", 3),
                fixtures::mp3_peer("b", "Album", 3),
            ])
            .await;

        let controller = controller(&source);
        let outcome = run(&controller, "s1").await;

        assert_eq!(source.status_count().await, 120);
        assert_eq!(source.fetch_count().await, 1);
        match outcome {
            PollOutcome::Finished {
                responses,
                timed_out,
            } => {
                assert_eq!(responses.len(), 2);
                assert!(timed_out);
            }
            other => panic!("expected finished, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_fetch_is_retried_without_status() {
        let source = Arc::new(MockSourceNetwork::new());
        source.set_statuses(vec![SearchStatus::completed(2)]).await;
        source
            .set_response_batches(vec![
                vec![],
                vec![],
                vec![fixtures::flac_peer("late", "Album", 3)],
            ])
            .await;

        let controller = controller(&source);
        let outcome = run(&controller, "s1").await;

        // One growth tick, six stable ticks; retries skip the status call.
        assert_eq!(source.status_count().await, 7);
        assert_eq!(source.fetch_count().await, 3);
        match outcome {
            PollOutcome::Finished { responses, .. } => {
                assert_eq!(responses[0].username, "late");
            }
            other => panic!("expected finished, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_fetch_accepted_after_retry_limit() {
        let source = Arc::new(MockSourceNetwork::new());
        source.set_statuses(vec![SearchStatus::completed(2)]).await;
        source.set_response_batches(vec![vec![]]).await;

        let controller = controller(&source);
        let outcome = run(&controller, "s1").await;

        assert_eq!(source.fetch_count().await, 21);
        assert_eq!(
            outcome,
            PollOutcome::Finished {
                responses: vec![],
                timed_out: false
            }
        );
    }

    #[tokio::test]
    async fn test_zero_responses_finish_without_retry() {
        let source = Arc::new(MockSourceNetwork::new());
        source.set_statuses(vec![SearchStatus::completed(0)]).await;

        let controller = controller(&source);
        let outcome = run(&controller, "s1").await;

        assert_eq!(source.status_count().await, 6);
        assert_eq!(source.fetch_count().await, 1);
        assert!(matches!(outcome, PollOutcome::Finished { .. }));
    }

    #[test]
    fn test_status_line_progression() {
        let config = PollConfig::default();
        let mut state = PollState::new("s");
        state.response_count_last_seen = 1;
        state.total_poll_count = 4;
        assert_eq!(state.status_line(&config), "Searching, 1 response");

        state.response_count_last_seen = 7;
        state.total_poll_count = 30;
        assert_eq!(state.status_line(&config), "Searching (15s), 7 responses");

        state.stable_poll_count = 2;
        assert_eq!(
            state.status_line(&config),
            "Waiting for late responses (2/6), 7 responses"
        );

        state.fetch_retry_count = 3;
        assert_eq!(
            state.status_line(&config),
            "Fetching 7 responses (retry 3/20)"
        );
    }
}
