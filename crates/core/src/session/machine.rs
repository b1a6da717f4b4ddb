//! The session state machine.
//!
//! `Session` performs no I/O. Intents and operation results go in; at most one
//! [`Command`] comes out per call, for the runner to execute. Every command is
//! tagged with a fresh [`OpId`] and the session remembers only the latest one,
//! so a result that arrives after back, cancel or a newer dispatch is dropped.

use tracing::{debug, info, warn};

use crate::catalog::{Artist, Release, ReleaseDetails, ReleaseGroup};
use crate::config::{FilterDefaults, PollConfig};
use crate::poll::{PollOutcome, PollState};
use crate::scoring::{dedup_releases, resolve_track_count, score_sources, FilterConfig, ScoredSources};
use crate::source::{PeerResponse, TransferFile};

use super::record::AcquisitionRecord;
use super::types::{Command, Intent, ListView, OpId, OpResult, Phase, Snapshot};

/// Cursor position for each navigable list.
#[derive(Debug, Clone, Copy, Default)]
struct Cursors {
    artists: usize,
    release_groups: usize,
    releases: usize,
    sources: usize,
}

/// One acquisition flow.
#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    filters: FilterConfig,
    preferred_country: String,
    poll_config: PollConfig,

    query: String,
    artists: Vec<Artist>,
    raw_release_groups: Vec<ReleaseGroup>,
    release_groups: Vec<ReleaseGroup>,
    raw_releases: Vec<Release>,
    releases: Vec<Release>,
    raw_responses: Vec<PeerResponse>,
    scored: ScoredSources,
    cursors: Cursors,

    selected_artist: Option<Artist>,
    selected_release_group: Option<ReleaseGroup>,
    selected_release: Option<Release>,
    selected_details: Option<ReleaseDetails>,
    selected_source: Option<usize>,
    resolved_track_count: Option<u32>,

    poll: Option<PollState>,
    pending: Option<OpId>,
    last_op: u64,

    status: String,
    error: Option<String>,
    record: Option<AcquisitionRecord>,
}

impl Session {
    pub fn new(defaults: &FilterDefaults, poll_config: PollConfig) -> Self {
        Self {
            phase: Phase::AwaitingQuery,
            filters: FilterConfig::from(defaults),
            preferred_country: defaults.preferred_country.clone(),
            poll_config,
            query: String::new(),
            artists: Vec::new(),
            raw_release_groups: Vec::new(),
            release_groups: Vec::new(),
            raw_releases: Vec::new(),
            releases: Vec::new(),
            raw_responses: Vec::new(),
            scored: ScoredSources::default(),
            cursors: Cursors::default(),
            selected_artist: None,
            selected_release_group: None,
            selected_release: None,
            selected_details: None,
            selected_source: None,
            resolved_track_count: None,
            poll: None,
            pending: None,
            last_op: 0,
            status: "Enter an artist".to_string(),
            error: None,
            record: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn filters(&self) -> &FilterConfig {
        &self.filters
    }

    /// The operation whose result is currently awaited.
    pub fn pending(&self) -> Option<OpId> {
        self.pending
    }

    pub fn record(&self) -> Option<&AcquisitionRecord> {
        self.record.as_ref()
    }

    // ------------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------------

    /// Apply a user intent.
    pub fn handle_intent(&mut self, intent: Intent) -> Option<Command> {
        use Intent::*;

        if self.phase.is_terminal() {
            return None;
        }

        match (self.phase, intent) {
            (_, Cancel) => {
                self.cancel();
                None
            }
            (_, Back) => {
                self.back();
                None
            }
            (Phase::AwaitingQuery, Submit(text)) => self.submit(text),
            (phase, CursorUp | CursorDown | CursorHome | CursorEnd) if !phase.has_list() => None,
            (_, CursorUp) => self.move_cursor(|c, _| c.saturating_sub(1)),
            (_, CursorDown) => self.move_cursor(|c, len| (c + 1).min(len - 1)),
            (_, CursorHome) => self.move_cursor(|_, _| 0),
            (_, CursorEnd) => self.move_cursor(|_, len| len - 1),

            (Phase::ArtistResults, Confirm) => self.confirm_artist(),
            (Phase::ReleaseGroupResults, Confirm) => self.confirm_release_group(),
            (Phase::ReleaseResults, Confirm) => self.confirm_release(),
            (Phase::SourceResults, Confirm) => self.confirm_source(),

            (Phase::ReleaseGroupLoading | Phase::ReleaseGroupResults, ToggleAlbumsOnly) => {
                self.filters.albums_only = !self.filters.albums_only;
                self.refilter_release_groups();
                None
            }
            (Phase::ReleaseLoading | Phase::ReleaseResults, ToggleDedup) => {
                self.filters.dedup_releases = !self.filters.dedup_releases;
                self.refilter_releases();
                None
            }
            (Phase::SourceSearching | Phase::SourceResults, CycleFormat) => {
                self.filters.format = self.filters.format.cycle();
                self.rescore();
                None
            }
            (Phase::SourceSearching | Phase::SourceResults, ToggleFreeSlot) => {
                self.filters.require_free_slot = !self.filters.require_free_slot;
                self.rescore();
                None
            }
            (Phase::SourceSearching | Phase::SourceResults, ToggleTrackCount) => {
                self.filters.require_track_count = !self.filters.require_track_count;
                self.rescore();
                None
            }

            (phase, intent) => {
                debug!("Ignoring {:?} in {}", intent, phase);
                None
            }
        }
    }

    fn cancel(&mut self) {
        info!("Session cancelled in {}", self.phase);
        self.phase = Phase::Cancelled;
        self.pending = None;
        self.poll = None;
        self.status = "Cancelled".to_string();
    }

    fn back(&mut self) {
        let Some(target) = self.phase.previous() else {
            return;
        };
        self.rewind_to(target);
        self.error = None;
        self.status = format!("Back to {}", target);
    }

    /// Move to an earlier phase, discarding everything derived after it.
    fn rewind_to(&mut self, target: Phase) {
        debug!("Rewinding {} -> {}", self.phase, target);
        match target {
            Phase::SourceResults => self.clear_source_selection(),
            Phase::ReleaseResults => self.clear_release_selection(),
            Phase::ReleaseGroupResults => self.clear_releases(),
            Phase::ArtistResults => self.clear_release_groups(),
            _ => self.clear_artists(),
        }
        self.pending = None;
        self.phase = target;
    }

    fn submit(&mut self, text: String) -> Option<Command> {
        let query = text.trim();
        if query.is_empty() {
            self.status = "Enter an artist name to search".to_string();
            return None;
        }

        self.query = query.to_string();
        self.error = None;
        self.status = format!("Searching artists for \"{}\"", self.query);
        self.enter(Phase::ArtistSearching);
        let query = self.query.clone();
        Some(self.issue(|op| Command::SearchArtists { op, query }))
    }

    fn move_cursor(&mut self, step: impl FnOnce(usize, usize) -> usize) -> Option<Command> {
        let len = self.list_len();
        if len == 0 {
            return None;
        }
        let cursor = self.cursor_mut();
        *cursor = step(*cursor, len);
        None
    }

    fn confirm_artist(&mut self) -> Option<Command> {
        let artist = self.artists.get(self.cursors.artists)?.clone();
        self.status = format!("Loading albums of {}", artist.name);
        let artist_id = artist.id.clone();
        self.selected_artist = Some(artist);
        self.enter(Phase::ReleaseGroupLoading);
        Some(self.issue(|op| Command::LoadReleaseGroups { op, artist_id }))
    }

    fn confirm_release_group(&mut self) -> Option<Command> {
        let group = self.release_groups.get(self.cursors.release_groups)?.clone();
        self.status = format!("Loading editions of {}", group.title);
        self.selected_release_group = Some(group.clone());
        self.enter(Phase::ReleaseLoading);
        Some(self.issue(|op| Command::LoadReleases {
            op,
            release_group: group,
        }))
    }

    fn confirm_release(&mut self) -> Option<Command> {
        let release = self.releases.get(self.cursors.releases)?.clone();
        Some(self.select_release(release))
    }

    fn select_release(&mut self, release: Release) -> Command {
        self.status = format!("Loading track list of {}", release.title);
        let release_id = release.id.clone();
        self.selected_release = Some(release);
        self.enter(Phase::ReleaseDetailsLoading);
        self.issue(|op| Command::LoadReleaseDetails { op, release_id })
    }

    fn confirm_source(&mut self) -> Option<Command> {
        let index = self.cursors.sources;
        let source = self.scored.candidates.get(index)?;
        let username = source.username.clone();
        let files = source
            .files
            .iter()
            .map(|f| TransferFile {
                filename: f.filename.clone(),
                size: f.size,
            })
            .collect::<Vec<_>>();

        self.status = format!("Queuing {} files from {}", files.len(), username);
        self.selected_source = Some(index);
        self.enter(Phase::QueuingTransfer);
        Some(self.issue(|op| Command::QueueTransfer {
            op,
            username,
            files,
        }))
    }

    // ------------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------------

    /// Apply the result of a dispatched command.
    ///
    /// Results for anything but the pending operation, or arriving outside
    /// the phase the operation was issued from, are discarded.
    pub fn handle_result(&mut self, op: OpId, result: OpResult) -> Option<Command> {
        if self.pending != Some(op) || self.phase != result.phase() {
            warn!(
                "Discarding stale result for {} (pending {:?}, phase {})",
                op, self.pending, self.phase
            );
            return None;
        }
        self.pending = None;

        match result {
            OpResult::Artists(Ok(artists)) => {
                self.status = match artists.len() {
                    0 => format!("No artists found for \"{}\"", self.query),
                    n => format!("{} artists", n),
                };
                self.artists = artists;
                self.cursors.artists = 0;
                self.enter(Phase::ArtistResults);
                None
            }
            OpResult::ReleaseGroups(Ok(groups)) => {
                self.raw_release_groups = groups;
                self.cursors.release_groups = 0;
                self.enter(Phase::ReleaseGroupResults);
                self.refilter_release_groups();
                None
            }
            OpResult::Releases(Ok(releases)) => {
                self.raw_releases = releases;
                self.cursors.releases = 0;
                self.enter(Phase::ReleaseResults);
                self.refilter_releases();
                self.auto_select_release()
            }
            OpResult::ReleaseDetails(Ok(details)) => {
                let search_text = self.search_text(&details);
                self.selected_details = Some(details);
                self.status = format!("Searching peers for \"{}\"", search_text);
                self.enter(Phase::SourceSearching);
                Some(self.issue(|op| Command::StartSourceSearch { op, search_text }))
            }
            OpResult::SearchStarted(Ok(search_id)) => {
                debug!("Source search {} started", search_id);
                let state = PollState::new(search_id);
                self.status = state.status_line(&self.poll_config);
                self.poll = Some(state.clone());
                Some(self.issue(|op| Command::PollSearch { op, state }))
            }
            OpResult::Poll(Ok(PollOutcome::Continue(state))) => {
                self.status = state.status_line(&self.poll_config);
                self.poll = Some(state.clone());
                Some(self.issue(|op| Command::PollSearch { op, state }))
            }
            OpResult::Poll(Ok(PollOutcome::Finished {
                responses,
                timed_out,
            })) => {
                self.poll = None;
                self.raw_responses = responses;
                self.cursors.sources = 0;
                self.enter(Phase::SourceResults);
                self.rescore();
                if timed_out {
                    self.status.push_str(" (search timed out)");
                }
                None
            }
            OpResult::TransferQueued(Ok(())) => {
                self.complete();
                None
            }

            OpResult::Artists(Err(e))
            | OpResult::ReleaseGroups(Err(e))
            | OpResult::Releases(Err(e))
            | OpResult::ReleaseDetails(Err(e)) => {
                self.fail(e.to_string());
                None
            }
            OpResult::SearchStarted(Err(e))
            | OpResult::Poll(Err(e))
            | OpResult::TransferQueued(Err(e)) => {
                self.fail(e.to_string());
                None
            }
        }
    }

    /// Return to the nearest results phase with a visible error.
    fn fail(&mut self, message: String) {
        warn!("{} failed: {}", self.phase, message);
        if let Some(target) = self.phase.previous() {
            self.rewind_to(target);
        }
        self.status = format!("Error: {}", message);
        self.error = Some(message);
    }

    /// Pick the first edition with the resolved track count and load it.
    fn auto_select_release(&mut self) -> Option<Command> {
        let count = self.resolved_track_count?;
        let index = self.releases.iter().position(|r| r.track_count == count)?;
        info!("Track count resolved to {}, auto-selecting release", count);
        self.cursors.releases = index;
        let release = self.releases[index].clone();
        let command = self.select_release(release);
        self.status = format!("Auto-selected {}-track edition", count);
        Some(command)
    }

    fn complete(&mut self) {
        let (Some(group), Some(release), Some(details), Some(source)) = (
            self.selected_release_group.as_ref(),
            self.selected_release.as_ref(),
            self.selected_details.as_ref(),
            self.selected_source.and_then(|i| self.scored.candidates.get(i)),
        ) else {
            warn!("Transfer queued without a complete selection");
            return;
        };

        let record = AcquisitionRecord::new(group, release, details, self.year(), source);
        info!(
            "Queued {} files from {} for {} - {}",
            record.files.len(),
            record.username,
            record.artist,
            record.album
        );
        self.status = format!("Queued {} files from {}", record.files.len(), record.username);
        self.record = Some(record);
        self.enter(Phase::Completed);
    }

    // ------------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------------

    fn refilter_release_groups(&mut self) {
        self.release_groups = if self.filters.albums_only {
            self.raw_release_groups
                .iter()
                .filter(|g| g.is_album())
                .cloned()
                .collect()
        } else {
            self.raw_release_groups.clone()
        };
        self.cursors.release_groups =
            clamp(self.cursors.release_groups, self.release_groups.len());

        if self.phase != Phase::ReleaseGroupResults {
            return;
        }
        let hidden = self.raw_release_groups.len() - self.release_groups.len();
        self.status = match (self.release_groups.len(), hidden) {
            (0, 0) => "No release groups found".to_string(),
            (0, hidden) => format!("No albums found ({} hidden by albums-only)", hidden),
            (n, 0) => format!("{} release groups", n),
            (n, hidden) => format!("{} release groups ({} hidden)", n, hidden),
        };
    }

    fn refilter_releases(&mut self) {
        self.releases = if self.filters.dedup_releases {
            dedup_releases(&self.raw_releases, &self.preferred_country)
        } else {
            self.raw_releases.clone()
        };
        self.cursors.releases = clamp(self.cursors.releases, self.releases.len());
        self.resolved_track_count = resolve_track_count(&self.releases);

        if self.phase != Phase::ReleaseResults {
            return;
        }
        self.status = match self.resolved_track_count {
            Some(count) => format!("{} editions, {} tracks", self.releases.len(), count),
            None if self.releases.is_empty() => "No editions found".to_string(),
            None => format!("{} editions, pick one", self.releases.len()),
        };
    }

    /// Rebuild the source list from the retained responses.
    fn rescore(&mut self) {
        if self.phase != Phase::SourceResults {
            return;
        }
        self.scored = score_sources(
            &self.raw_responses,
            &self.filters,
            self.catalog_track_count(),
            self.year(),
        );
        self.cursors.sources = clamp(self.cursors.sources, self.scored.candidates.len());
        self.status = if self.scored.stats.total_directories == 0 {
            "No peers answered".to_string()
        } else {
            format!(
                "{} sources ({} of {} directories filtered)",
                self.scored.candidates.len(),
                self.scored.stats.dropped(),
                self.scored.stats.total_directories
            )
        };
    }

    /// Authoritative track count: the details, else the resolved count.
    fn catalog_track_count(&self) -> Option<usize> {
        self.selected_details
            .as_ref()
            .map(|d| d.track_count())
            .filter(|n| *n > 0)
            .or(self.resolved_track_count.map(|n| n as usize))
    }

    fn year(&self) -> Option<&str> {
        self.selected_details
            .as_ref()
            .and_then(|d| d.year())
            .or_else(|| self.selected_release.as_ref().and_then(|r| r.year()))
            .or_else(|| self.selected_release_group.as_ref().and_then(|g| g.year()))
    }

    fn search_text(&self, details: &ReleaseDetails) -> String {
        let artist = self
            .selected_artist
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or(details.artist_credit.as_str());
        let album = self
            .selected_release_group
            .as_ref()
            .map(|g| g.title.as_str())
            .unwrap_or(details.title.as_str());
        format!("{} {}", artist, album)
    }

    // ------------------------------------------------------------------------
    // Clearing downstream state
    // ------------------------------------------------------------------------

    fn clear_source_selection(&mut self) {
        self.selected_source = None;
    }

    fn clear_release_selection(&mut self) {
        self.clear_source_selection();
        self.selected_release = None;
        self.selected_details = None;
        self.raw_responses.clear();
        self.scored = ScoredSources::default();
        self.cursors.sources = 0;
        self.poll = None;
    }

    fn clear_releases(&mut self) {
        self.clear_release_selection();
        self.selected_release_group = None;
        self.raw_releases.clear();
        self.releases.clear();
        self.resolved_track_count = None;
        self.cursors.releases = 0;
    }

    fn clear_release_groups(&mut self) {
        self.clear_releases();
        self.selected_artist = None;
        self.raw_release_groups.clear();
        self.release_groups.clear();
        self.cursors.release_groups = 0;
    }

    fn clear_artists(&mut self) {
        self.clear_release_groups();
        self.artists.clear();
        self.cursors.artists = 0;
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn enter(&mut self, phase: Phase) {
        info!("Phase {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    fn issue(&mut self, build: impl FnOnce(OpId) -> Command) -> Command {
        self.last_op += 1;
        let op = OpId(self.last_op);
        self.pending = Some(op);
        let command = build(op);
        debug!("Dispatching {} as {}", command.name(), op);
        command
    }

    fn list_len(&self) -> usize {
        match self.phase {
            Phase::ArtistResults => self.artists.len(),
            Phase::ReleaseGroupResults => self.release_groups.len(),
            Phase::ReleaseResults => self.releases.len(),
            Phase::SourceResults => self.scored.candidates.len(),
            _ => 0,
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.phase {
            Phase::ArtistResults => &mut self.cursors.artists,
            Phase::ReleaseGroupResults => &mut self.cursors.release_groups,
            Phase::ReleaseResults => &mut self.cursors.releases,
            _ => &mut self.cursors.sources,
        }
    }

    fn list_view(&self) -> (ListView, usize) {
        match self.phase {
            Phase::AwaitingQuery | Phase::ArtistSearching => (ListView::None, 0),
            Phase::ArtistResults | Phase::ReleaseGroupLoading => {
                (ListView::Artists(self.artists.clone()), self.cursors.artists)
            }
            Phase::ReleaseGroupResults | Phase::ReleaseLoading => (
                ListView::ReleaseGroups(self.release_groups.clone()),
                self.cursors.release_groups,
            ),
            Phase::ReleaseResults | Phase::ReleaseDetailsLoading | Phase::SourceSearching => (
                ListView::Releases(self.releases.clone()),
                self.cursors.releases,
            ),
            Phase::SourceResults | Phase::QueuingTransfer | Phase::Completed => (
                ListView::Sources(self.scored.candidates.clone()),
                self.cursors.sources,
            ),
            Phase::Cancelled => (ListView::None, 0),
        }
    }

    /// Read-only view for rendering.
    pub fn snapshot(&self) -> Snapshot {
        let (list, cursor) = self.list_view();
        Snapshot {
            phase: self.phase,
            query: self.query.clone(),
            selected_artist: self.selected_artist.clone(),
            selected_release_group: self.selected_release_group.clone(),
            selected_release: self.selected_release.clone(),
            selected_details: self.selected_details.clone(),
            selected_source: self
                .selected_source
                .and_then(|i| self.scored.candidates.get(i))
                .cloned(),
            list,
            cursor,
            filters: self.filters.clone(),
            stats: self.scored.stats.clone(),
            resolved_track_count: self.resolved_track_count,
            expected_tracks: self.scored.expected_tracks,
            poll: self.poll.clone(),
            status: self.status.clone(),
            error: self.error.clone(),
            record: self.record.clone(),
        }
    }
}

/// Keep a cursor inside a list of `len` items.
fn clamp(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}
