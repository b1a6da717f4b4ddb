//! The record emitted when a transfer has been queued.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Release, ReleaseDetails, ReleaseGroup};
use crate::scoring::CandidateSource;

/// Everything downstream import/tagging needs to know about one acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionRecord {
    pub release_group_id: String,
    pub release_id: String,
    pub artist: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Peer the files were requested from.
    pub username: String,
    pub directory: String,
    pub files: Vec<RecordFile>,
    pub queued_at: DateTime<Utc>,
}

/// One file of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFile {
    pub name: String,
    pub size: u64,
}

impl AcquisitionRecord {
    pub fn new(
        release_group: &ReleaseGroup,
        release: &Release,
        details: &ReleaseDetails,
        year: Option<&str>,
        source: &CandidateSource,
    ) -> Self {
        Self {
            release_group_id: release_group.id.clone(),
            release_id: release.id.clone(),
            artist: details.artist_credit.clone(),
            album: details.title.clone(),
            year: year.map(str::to_string),
            username: source.username.clone(),
            directory: source.directory.clone(),
            files: source
                .files
                .iter()
                .map(|f| RecordFile {
                    name: f.name.clone(),
                    size: f.size,
                })
                .collect(),
            queued_at: Utc::now(),
        }
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}
