//! Session lifecycle integration tests.
//!
//! These drive a full session through the runner against mock backends:
//! query -> artist -> release group -> release -> peer search -> transfer

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use albumhunt_core::{
    catalog::CatalogError,
    config::{FilterDefaults, PollConfig},
    session::ListView,
    source::SearchStatus,
    testing::{fixtures, MockCatalog, MockSourceNetwork, RecordedCatalogQuery},
    CatalogClient, Intent, Phase, PollController, Session, SessionHandle, SessionRunner, Snapshot,
    SourceNetwork,
};

/// Test helper wiring a session runner to mock backends.
struct TestHarness {
    catalog: Arc<MockCatalog>,
    source: Arc<MockSourceNetwork>,
    poll_config: PollConfig,
}

impl TestHarness {
    async fn new() -> Self {
        let catalog = Arc::new(MockCatalog::new());
        catalog
            .set_artists(vec![fixtures::artist("a1", "The Beatles")])
            .await;
        catalog
            .set_release_groups(
                "a1",
                vec![fixtures::release_group("rg1", "Abbey Road", "1969-09-26")],
            )
            .await;
        catalog
            .set_releases(
                "rg1",
                vec![fixtures::release("r1", "Abbey Road", "1969-09-26", "GB", 17)],
            )
            .await;
        catalog
            .add_details(fixtures::release_details(
                "r1",
                "The Beatles",
                "Abbey Road",
                "1969-09-26",
                17,
            ))
            .await;

        let source = Arc::new(MockSourceNetwork::new());
        source
            .set_statuses(vec![
                SearchStatus::in_progress(0),
                SearchStatus::in_progress(1),
                SearchStatus::completed(2),
            ])
            .await;
        source
            .set_responses(vec![
                fixtures::mp3_peer("mp3-peer", "Abbey Road", 17),
                fixtures::flac_peer("flac-peer", "Abbey Road", 17),
            ])
            .await;

        Self {
            catalog,
            source,
            poll_config: PollConfig::default(),
        }
    }

    fn start(&self) -> (JoinHandle<Snapshot>, SessionHandle) {
        let source = Arc::clone(&self.source) as Arc<dyn SourceNetwork>;
        let poller = PollController::new(Arc::clone(&source), self.poll_config.clone());
        let session = Session::new(&FilterDefaults::default(), self.poll_config.clone());
        let (runner, handle) = SessionRunner::new(
            session,
            Arc::clone(&self.catalog) as Arc<dyn CatalogClient>,
            source,
            poller,
        );
        (tokio::spawn(runner.run()), handle)
    }
}

/// Wait until the session reaches `phase`, returning that snapshot.
async fn wait_for_phase(handle: &SessionHandle, phase: Phase) -> Snapshot {
    let mut snapshots = handle.subscribe();
    let result = tokio::time::timeout(
        Duration::from_secs(300),
        snapshots.wait_for(|s| s.phase == phase),
    )
    .await;
    match result {
        Ok(Ok(snapshot)) => snapshot.clone(),
        _ => panic!(
            "session never reached {}, last: {:?}",
            phase,
            handle.snapshot().phase
        ),
    }
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_abbey_road_end_to_end() {
    let harness = TestHarness::new().await;
    let (runner, handle) = harness.start();

    handle.send(Intent::Submit("Abbey Road".to_string()));
    let snapshot = wait_for_phase(&handle, Phase::ArtistResults).await;
    assert_eq!(snapshot.list.len(), 1);

    handle.send(Intent::Confirm);
    wait_for_phase(&handle, Phase::ReleaseGroupResults).await;

    // The single 17-track edition is picked without a prompt
    handle.send(Intent::Confirm);
    let snapshot = wait_for_phase(&handle, Phase::SourceResults).await;
    assert_eq!(snapshot.resolved_track_count, Some(17));
    assert_eq!(snapshot.selected_release.as_ref().unwrap().id, "r1");
    assert_eq!(snapshot.expected_tracks, Some(17));

    match &snapshot.list {
        ListView::Sources(sources) => {
            assert_eq!(sources.len(), 1);
            assert_eq!(sources[0].username, "flac-peer");
            assert_eq!(sources[0].format, "FLAC");
            assert_eq!(sources[0].file_count(), 17);
        }
        other => panic!("expected sources, got {:?}", other),
    }
    assert_eq!(snapshot.stats.total_directories, 2);
    assert_eq!(snapshot.stats.wrong_format, 1);

    handle.send(Intent::Confirm);
    let last = runner.await.unwrap();
    assert_eq!(last.phase, Phase::Completed);

    let record = last.record.expect("record emitted");
    assert_eq!(record.release_group_id, "rg1");
    assert_eq!(record.release_id, "r1");
    assert_eq!(record.artist, "The Beatles");
    assert_eq!(record.album, "Abbey Road");
    assert_eq!(record.year.as_deref(), Some("1969"));
    assert_eq!(record.username, "flac-peer");
    assert_eq!(record.files.len(), 17);

    assert_eq!(
        harness.source.recorded_searches().await,
        vec!["The Beatles Abbey Road".to_string()]
    );
    let transfers = harness.source.recorded_transfers().await;
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].username, "flac-peer");
    assert_eq!(transfers[0].files.len(), 17);

    // Responses were fetched only once the count had settled
    assert_eq!(harness.source.fetch_count().await, 1);
    assert_eq!(harness.source.status_count().await, 3 + 6);
}

#[tokio::test(start_paused = true)]
async fn test_catalog_queries_follow_selection() {
    let harness = TestHarness::new().await;
    let (runner, handle) = harness.start();

    handle.send(Intent::Submit("beatles".to_string()));
    wait_for_phase(&handle, Phase::ArtistResults).await;
    handle.send(Intent::Confirm);
    wait_for_phase(&handle, Phase::ReleaseGroupResults).await;
    handle.send(Intent::Confirm);
    wait_for_phase(&handle, Phase::SourceResults).await;
    handle.send(Intent::Cancel);
    runner.await.unwrap();

    assert_eq!(
        harness.catalog.recorded_queries().await,
        vec![
            RecordedCatalogQuery::SearchArtists {
                query: "beatles".to_string()
            },
            RecordedCatalogQuery::ReleaseGroups {
                artist_id: "a1".to_string()
            },
            RecordedCatalogQuery::Releases {
                release_group_id: "rg1".to_string()
            },
            RecordedCatalogQuery::ReleaseDetails {
                release_id: "r1".to_string()
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_catalog_failure_returns_to_artist_results() {
    let harness = TestHarness::new().await;
    let (runner, handle) = harness.start();

    handle.send(Intent::Submit("beatles".to_string()));
    wait_for_phase(&handle, Phase::ArtistResults).await;

    harness
        .catalog
        .set_next_error(CatalogError::ApiError {
            status: 503,
            message: "Service Unavailable".to_string(),
        })
        .await;
    handle.send(Intent::Confirm);

    let mut snapshots = handle.subscribe();
    let snapshot = snapshots
        .wait_for(|s| s.phase == Phase::ArtistResults && s.error.is_some())
        .await
        .unwrap()
        .clone();
    assert!(snapshot.error.unwrap().contains("503"));
    assert!(snapshot.selected_artist.is_none());

    // The session is still usable
    handle.send(Intent::Confirm);
    wait_for_phase(&handle, Phase::ReleaseGroupResults).await;

    handle.send(Intent::Cancel);
    assert_eq!(runner.await.unwrap().phase, Phase::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_search_does_not_wait() {
    let harness = TestHarness::new().await;
    // A search that never settles
    harness
        .source
        .set_statuses(vec![SearchStatus::in_progress(1)])
        .await;
    let (runner, handle) = harness.start();

    handle.send(Intent::Submit("beatles".to_string()));
    wait_for_phase(&handle, Phase::ArtistResults).await;
    handle.send(Intent::Confirm);
    wait_for_phase(&handle, Phase::ReleaseGroupResults).await;
    handle.send(Intent::Confirm);

    let mut snapshots = handle.subscribe();
    snapshots
        .wait_for(|s| s.poll.as_ref().is_some_and(|p| p.total_poll_count >= 3))
        .await
        .unwrap();

    handle.send(Intent::Cancel);
    let last = runner.await.unwrap();
    assert_eq!(last.phase, Phase::Cancelled);
    assert!(last.record.is_none());
    assert_eq!(harness.source.fetch_count().await, 0);
    assert!(harness.source.recorded_transfers().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_poll_ceiling_yields_partial_results() {
    let mut harness = TestHarness::new().await;
    harness.poll_config.max_polls = 10;
    harness
        .source
        .set_statuses(vec![SearchStatus::in_progress(1)])
        .await;
    harness
        .source
        .set_responses(vec![fixtures::flac_peer("early", "Abbey Road", 17)])
        .await;
    let (runner, handle) = harness.start();

    handle.send(Intent::Submit("beatles".to_string()));
    wait_for_phase(&handle, Phase::ArtistResults).await;
    handle.send(Intent::Confirm);
    wait_for_phase(&handle, Phase::ReleaseGroupResults).await;
    handle.send(Intent::Confirm);

    let snapshot = wait_for_phase(&handle, Phase::SourceResults).await;
    assert!(snapshot.error.is_none());
    assert!(snapshot.status.contains("timed out"));
    assert_eq!(snapshot.list.len(), 1);

    handle.send(Intent::Cancel);
    runner.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_back_from_sources_allows_new_search() {
    let harness = TestHarness::new().await;
    let (runner, handle) = harness.start();

    handle.send(Intent::Submit("beatles".to_string()));
    wait_for_phase(&handle, Phase::ArtistResults).await;
    handle.send(Intent::Confirm);
    wait_for_phase(&handle, Phase::ReleaseGroupResults).await;
    handle.send(Intent::Confirm);
    wait_for_phase(&handle, Phase::SourceResults).await;

    handle.send(Intent::Back);
    let snapshot = wait_for_phase(&handle, Phase::ReleaseResults).await;
    assert!(snapshot.selected_release.is_none());
    assert!(matches!(snapshot.list, ListView::Releases(_)));

    handle.send(Intent::Confirm);
    wait_for_phase(&handle, Phase::SourceResults).await;
    assert_eq!(harness.source.recorded_searches().await.len(), 2);

    handle.send(Intent::Cancel);
    runner.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handles_cancels_session() {
    let harness = TestHarness::new().await;
    let (runner, handle) = harness.start();

    handle.send(Intent::Submit("beatles".to_string()));
    wait_for_phase(&handle, Phase::ArtistResults).await;
    drop(handle);

    let last = runner.await.unwrap();
    assert_eq!(last.phase, Phase::Cancelled);
}
