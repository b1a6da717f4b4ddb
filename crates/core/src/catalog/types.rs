//! Catalog value objects.
//!
//! These are immutable once fetched. The only local derivation performed on
//! them is release deduplication, which picks survivors without editing.

use serde::{Deserialize, Serialize};

/// An artist returned by a catalog search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    /// MusicBrainz Artist ID.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Person, Group, Orchestra...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Search relevance (0-100).
    #[serde(default)]
    pub score: u32,
}

/// An abstract album, grouping all its editions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseGroup {
    /// MusicBrainz Release Group ID.
    pub id: String,
    pub title: String,
    /// Album, Single, EP...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,
    /// Compilation, Live, Remix...
    #[serde(default)]
    pub secondary_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_release_date: Option<String>,
}

impl ReleaseGroup {
    /// A studio album: primary type Album with no secondary types.
    pub fn is_album(&self) -> bool {
        self.primary_type.as_deref() == Some("Album") && self.secondary_types.is_empty()
    }

    pub fn year(&self) -> Option<&str> {
        self.first_release_date.as_deref().and_then(year_of)
    }
}

/// One concrete edition of a release group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    /// MusicBrainz Release ID.
    pub id: String,
    pub title: String,
    /// Release date (YYYY-MM-DD or partial).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Official, Promotion, Bootleg...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Total tracks across all media.
    pub track_count: u32,
    /// Media formats, e.g. "CD", "2xVinyl", "CD+DVD".
    #[serde(default)]
    pub format: String,
    /// Primary type of the owning release group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
}

impl Release {
    pub fn year(&self) -> Option<&str> {
        self.date.as_deref().and_then(year_of)
    }
}

/// A release with its artist credit and full track list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseDetails {
    pub id: String,
    pub title: String,
    /// Artist credit (combined artist name).
    pub artist_credit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl ReleaseDetails {
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn year(&self) -> Option<&str> {
        self.date.as_deref().and_then(year_of)
    }
}

/// A track from a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    /// Track position within its medium (1-indexed).
    pub position: u32,
    pub title: String,
    /// Duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,
}

/// The 4-digit year prefix of a catalog date, if present.
pub fn year_of(date: &str) -> Option<&str> {
    let year = date.get(..4)?;
    year.bytes().all(|b| b.is_ascii_digit()).then_some(year)
}
