//! Session phases, intents, commands and snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{Artist, CatalogError, Release, ReleaseDetails, ReleaseGroup};
use crate::poll::{PollOutcome, PollState};
use crate::scoring::{CandidateSource, FilterConfig, FilterStats};
use crate::source::{SourceError, TransferFile};

use super::record::AcquisitionRecord;

// ============================================================================
// Phases
// ============================================================================

/// Where the session is in the acquisition flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingQuery,
    ArtistSearching,
    ArtistResults,
    ReleaseGroupLoading,
    ReleaseGroupResults,
    ReleaseLoading,
    ReleaseResults,
    ReleaseDetailsLoading,
    SourceSearching,
    SourceResults,
    QueuingTransfer,
    /// Transfer queued and record emitted.
    Completed,
    Cancelled,
}

impl Phase {
    /// No intent or result has any effect once here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Cancelled)
    }

    /// Phases that own a navigable list.
    pub fn has_list(&self) -> bool {
        matches!(
            self,
            Phase::ArtistResults
                | Phase::ReleaseGroupResults
                | Phase::ReleaseResults
                | Phase::SourceResults
        )
    }

    /// Phases waiting on an operation.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Phase::ArtistSearching
                | Phase::ReleaseGroupLoading
                | Phase::ReleaseLoading
                | Phase::ReleaseDetailsLoading
                | Phase::SourceSearching
                | Phase::QueuingTransfer
        )
    }

    /// Where "back" (or a failure) returns to.
    pub fn previous(&self) -> Option<Phase> {
        match self {
            Phase::QueuingTransfer => Some(Phase::SourceResults),
            Phase::SourceSearching | Phase::SourceResults | Phase::ReleaseDetailsLoading => {
                Some(Phase::ReleaseResults)
            }
            Phase::ReleaseResults | Phase::ReleaseLoading => Some(Phase::ReleaseGroupResults),
            Phase::ReleaseGroupResults | Phase::ReleaseGroupLoading => Some(Phase::ArtistResults),
            Phase::ArtistResults | Phase::ArtistSearching => Some(Phase::AwaitingQuery),
            Phase::AwaitingQuery | Phase::Completed | Phase::Cancelled => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::AwaitingQuery => "awaiting_query",
            Phase::ArtistSearching => "artist_searching",
            Phase::ArtistResults => "artist_results",
            Phase::ReleaseGroupLoading => "release_group_loading",
            Phase::ReleaseGroupResults => "release_group_results",
            Phase::ReleaseLoading => "release_loading",
            Phase::ReleaseResults => "release_results",
            Phase::ReleaseDetailsLoading => "release_details_loading",
            Phase::SourceSearching => "source_searching",
            Phase::SourceResults => "source_results",
            Phase::QueuingTransfer => "queuing_transfer",
            Phase::Completed => "completed",
            Phase::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Intents
// ============================================================================

/// A user action. Illegal intents for the current phase are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Submit the artist query.
    Submit(String),
    Confirm,
    Back,
    Cancel,
    CursorUp,
    CursorDown,
    CursorHome,
    CursorEnd,
    CycleFormat,
    ToggleFreeSlot,
    ToggleTrackCount,
    ToggleAlbumsOnly,
    ToggleDedup,
}

// ============================================================================
// Operations
// ============================================================================

/// Identifies one dispatched operation. Monotonic per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpId(pub u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Asynchronous work requested by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SearchArtists {
        op: OpId,
        query: String,
    },
    LoadReleaseGroups {
        op: OpId,
        artist_id: String,
    },
    LoadReleases {
        op: OpId,
        release_group: ReleaseGroup,
    },
    LoadReleaseDetails {
        op: OpId,
        release_id: String,
    },
    StartSourceSearch {
        op: OpId,
        search_text: String,
    },
    /// Wait one tick, then advance the poll by one step.
    PollSearch {
        op: OpId,
        state: PollState,
    },
    QueueTransfer {
        op: OpId,
        username: String,
        files: Vec<TransferFile>,
    },
}

impl Command {
    pub fn op(&self) -> OpId {
        match self {
            Command::SearchArtists { op, .. }
            | Command::LoadReleaseGroups { op, .. }
            | Command::LoadReleases { op, .. }
            | Command::LoadReleaseDetails { op, .. }
            | Command::StartSourceSearch { op, .. }
            | Command::PollSearch { op, .. }
            | Command::QueueTransfer { op, .. } => *op,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::SearchArtists { .. } => "search_artists",
            Command::LoadReleaseGroups { .. } => "load_release_groups",
            Command::LoadReleases { .. } => "load_releases",
            Command::LoadReleaseDetails { .. } => "load_release_details",
            Command::StartSourceSearch { .. } => "start_source_search",
            Command::PollSearch { .. } => "poll_search",
            Command::QueueTransfer { .. } => "queue_transfer",
        }
    }
}

/// Outcome of a command, delivered back to the session.
#[derive(Debug)]
pub enum OpResult {
    Artists(Result<Vec<Artist>, CatalogError>),
    ReleaseGroups(Result<Vec<ReleaseGroup>, CatalogError>),
    Releases(Result<Vec<Release>, CatalogError>),
    ReleaseDetails(Result<ReleaseDetails, CatalogError>),
    SearchStarted(Result<String, SourceError>),
    Poll(Result<PollOutcome, SourceError>),
    TransferQueued(Result<(), SourceError>),
}

impl OpResult {
    /// The loading phase this kind of result belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            OpResult::Artists(_) => Phase::ArtistSearching,
            OpResult::ReleaseGroups(_) => Phase::ReleaseGroupLoading,
            OpResult::Releases(_) => Phase::ReleaseLoading,
            OpResult::ReleaseDetails(_) => Phase::ReleaseDetailsLoading,
            OpResult::SearchStarted(_) | OpResult::Poll(_) => Phase::SourceSearching,
            OpResult::TransferQueued(_) => Phase::QueuingTransfer,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// The list shown for the current phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum ListView {
    #[default]
    None,
    Artists(Vec<Artist>),
    ReleaseGroups(Vec<ReleaseGroup>),
    Releases(Vec<Release>),
    Sources(Vec<CandidateSource>),
}

impl ListView {
    pub fn len(&self) -> usize {
        match self {
            ListView::None => 0,
            ListView::Artists(items) => items.len(),
            ListView::ReleaseGroups(items) => items.len(),
            ListView::Releases(items) => items.len(),
            ListView::Sources(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub query: String,
    pub selected_artist: Option<Artist>,
    pub selected_release_group: Option<ReleaseGroup>,
    pub selected_release: Option<Release>,
    pub selected_details: Option<ReleaseDetails>,
    pub selected_source: Option<CandidateSource>,
    pub list: ListView,
    pub cursor: usize,
    pub filters: FilterConfig,
    pub stats: FilterStats,
    /// Track count adopted from the release list.
    pub resolved_track_count: Option<u32>,
    /// Track count used when filtering sources.
    pub expected_tracks: Option<usize>,
    pub poll: Option<PollState>,
    pub status: String,
    pub error: Option<String>,
    pub record: Option<AcquisitionRecord>,
}
