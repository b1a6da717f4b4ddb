//! Filter configuration and scored candidate types.

use serde::{Deserialize, Serialize};

/// Which audio family a source must provide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatPreference {
    /// Lossless files only.
    #[default]
    Lossless,
    /// Lossy files only.
    Lossy,
    /// Lossless when a directory has any, otherwise lossy.
    Either,
}

impl FormatPreference {
    /// Next value in the UI cycle.
    pub fn cycle(self) -> Self {
        match self {
            FormatPreference::Lossless => FormatPreference::Lossy,
            FormatPreference::Lossy => FormatPreference::Either,
            FormatPreference::Either => FormatPreference::Lossless,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatPreference::Lossless => "lossless",
            FormatPreference::Lossy => "lossy",
            FormatPreference::Either => "either",
        }
    }
}

/// Live-toggleable filters for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub format: FormatPreference,
    /// Drop directories whose peer has no free upload slot.
    pub require_free_slot: bool,
    /// Drop directories whose file count differs from the expected track count.
    pub require_track_count: bool,
    /// Keep only studio album release groups.
    pub albums_only: bool,
    /// Collapse near-duplicate releases.
    pub dedup_releases: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            format: FormatPreference::Lossless,
            require_free_slot: true,
            require_track_count: true,
            albums_only: true,
            dedup_releases: true,
        }
    }
}

/// Why directories were dropped during the last scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    /// Directories seen after flattening all peer responses.
    pub total_directories: usize,
    pub no_free_slot: usize,
    pub no_audio: usize,
    pub wrong_format: usize,
    pub wrong_track_count: usize,
}

impl FilterStats {
    pub fn dropped(&self) -> usize {
        self.no_free_slot + self.no_audio + self.wrong_format + self.wrong_track_count
    }
}

/// A file retained in a candidate source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Full path on the peer, as the peer reported it.
    pub filename: String,
    /// Base name without the directory.
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u32>,
    /// Lowercased extension.
    pub extension: String,
}

/// One peer directory offering matching audio files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSource {
    pub username: String,
    pub directory: String,
    pub files: Vec<SourceFile>,
    pub upload_speed: u64,
    pub has_free_upload_slot: bool,
    pub queue_length: u64,
    /// Display format, e.g. "FLAC".
    pub format: String,
    pub total_size: u64,
    /// Most common bit rate among the files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u32>,
    /// Directory path contains the release year.
    pub year_match: bool,
    /// Composite ordering key, higher is better.
    pub rank_score: u64,
}

impl CandidateSource {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
