//! MusicBrainz API client.
//!
//! MusicBrainz requires:
//! - User-Agent header with application name/version and contact info
//! - Rate limiting: 1 request per second

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::{CatalogConfig, RetryConfig};
use crate::counting::tally;

use super::retry::with_retry;
use super::types::{Artist, Release, ReleaseDetails, ReleaseGroup, Track};
use super::{CatalogClient, CatalogError, RateLimiter};

/// Page size for browse requests (MusicBrainz max is 100).
const BROWSE_LIMIT: u32 = 100;

/// MusicBrainz API client.
pub struct MusicBrainzClient {
    client: Client,
    base_url: String,
    search_limit: u32,
    limiter: RateLimiter,
    retry: RetryConfig,
}

impl MusicBrainzClient {
    /// Create a new MusicBrainz client.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_limit: config.search_limit.min(BROWSE_LIMIT),
            limiter: RateLimiter::new(config.min_interval()),
            retry: config.retry.clone(),
        })
    }

    /// GET `path` with rate limiting and retries, decoding the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.base_url, path);
        with_retry(&self.limiter, &self.retry, path, || self.send(&url, query)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        debug!(url = url, "MusicBrainz request");

        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("fmt", "json")])
            .send()
            .await?;

        let status = response.status();
        if status == 404 {
            return Err(CatalogError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl CatalogClient for MusicBrainzClient {
    async fn search_artists(&self, query: &str) -> Result<Vec<Artist>, CatalogError> {
        debug!("MusicBrainz artist search: query='{}'", query);

        let response: MbArtistSearch = self
            .get_json(
                "artist",
                &[
                    ("query", query.to_string()),
                    ("limit", self.search_limit.to_string()),
                ],
            )
            .await?;

        Ok(response.artists.into_iter().map(Artist::from).collect())
    }

    async fn release_groups(&self, artist_id: &str) -> Result<Vec<ReleaseGroup>, CatalogError> {
        debug!("MusicBrainz browse release groups: artist={}", artist_id);

        let response: MbReleaseGroupBrowse = self
            .get_json(
                "release-group",
                &[
                    ("artist", artist_id.to_string()),
                    ("limit", BROWSE_LIMIT.to_string()),
                ],
            )
            .await?;

        let mut groups: Vec<ReleaseGroup> = response
            .release_groups
            .into_iter()
            .map(ReleaseGroup::from)
            .collect();
        sort_by_date(&mut groups, |g| g.first_release_date.as_deref());
        Ok(groups)
    }

    async fn releases(&self, release_group: &ReleaseGroup) -> Result<Vec<Release>, CatalogError> {
        debug!("MusicBrainz browse releases: release_group={}", release_group.id);

        let response: MbReleaseBrowse = self
            .get_json(
                "release",
                &[
                    ("release-group", release_group.id.clone()),
                    ("inc", "media".to_string()),
                    ("limit", BROWSE_LIMIT.to_string()),
                ],
            )
            .await?;

        let mut releases: Vec<Release> = response
            .releases
            .into_iter()
            .map(|r| r.into_release(release_group.primary_type.clone()))
            .collect();
        sort_by_date(&mut releases, |r| r.date.as_deref());
        Ok(releases)
    }

    async fn release_details(&self, release_id: &str) -> Result<ReleaseDetails, CatalogError> {
        debug!("MusicBrainz get release: mbid={}", release_id);

        let release: MbRelease = self
            .get_json(
                &format!("release/{}", release_id),
                &[("inc", "recordings+artist-credits".to_string())],
            )
            .await?;

        Ok(release.into())
    }
}

/// Stable sort by date ascending with undated entries last.
fn sort_by_date<T>(items: &mut [T], date: impl Fn(&T) -> Option<&str>) {
    items.sort_by(|a, b| match (date(a), date(b)) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Summarize media formats: repeats collapse to "2xCD", mixes join with "+".
fn summarize_formats(media: &[MbMedium]) -> String {
    let counts = tally(
        media
            .iter()
            .map(|m| m.format.as_deref().unwrap_or("Unknown")),
    );

    counts
        .into_iter()
        .map(|(format, n)| {
            if n > 1 {
                format!("{}x{}", n, format)
            } else {
                format.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("+")
}

fn join_artist_credit(credit: &[MbArtistCredit]) -> String {
    credit
        .iter()
        .map(|ac| {
            let name = ac.name.clone().unwrap_or_else(|| ac.artist.name.clone());
            let join = ac.joinphrase.clone().unwrap_or_default();
            format!("{}{}", name, join)
        })
        .collect()
}

// ============================================================================
// MusicBrainz API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct MbArtistSearch {
    #[serde(default)]
    artists: Vec<MbArtistEntry>,
}

#[derive(Debug, Deserialize)]
struct MbArtistEntry {
    id: String,
    name: String,
    #[serde(rename = "sort-name", default)]
    sort_name: Option<String>,
    #[serde(default)]
    disambiguation: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    score: u32,
}

impl From<MbArtistEntry> for Artist {
    fn from(mb: MbArtistEntry) -> Self {
        Artist {
            id: mb.id,
            name: mb.name,
            sort_name: mb.sort_name,
            disambiguation: mb.disambiguation.filter(|d| !d.is_empty()),
            country: mb.country,
            kind: mb.kind,
            score: mb.score,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MbReleaseGroupBrowse {
    #[serde(rename = "release-groups", default)]
    release_groups: Vec<MbReleaseGroup>,
}

#[derive(Debug, Deserialize)]
struct MbReleaseGroup {
    id: String,
    title: String,
    #[serde(rename = "primary-type", default)]
    primary_type: Option<String>,
    #[serde(rename = "secondary-types", default)]
    secondary_types: Vec<String>,
    #[serde(rename = "first-release-date", default)]
    first_release_date: Option<String>,
}

impl From<MbReleaseGroup> for ReleaseGroup {
    fn from(mb: MbReleaseGroup) -> Self {
        ReleaseGroup {
            id: mb.id,
            title: mb.title,
            primary_type: mb.primary_type,
            secondary_types: mb.secondary_types,
            first_release_date: mb.first_release_date.filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MbReleaseBrowse {
    #[serde(default)]
    releases: Vec<MbRelease>,
}

#[derive(Debug, Deserialize)]
struct MbRelease {
    id: String,
    title: String,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<MbArtistCredit>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    disambiguation: Option<String>,
    #[serde(default)]
    media: Vec<MbMedium>,
}

impl MbRelease {
    fn into_release(self, release_type: Option<String>) -> Release {
        let track_count = self.media.iter().map(MbMedium::track_count).sum();
        Release {
            format: summarize_formats(&self.media),
            id: self.id,
            title: self.title,
            date: self.date.filter(|d| !d.is_empty()),
            country: self.country,
            status: self.status,
            track_count,
            release_type,
            disambiguation: self.disambiguation.filter(|d| !d.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MbArtistCredit {
    #[serde(default)]
    name: Option<String>,
    artist: MbArtist,
    #[serde(default)]
    joinphrase: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MbArtist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct MbMedium {
    #[serde(default)]
    position: u32,
    #[serde(default)]
    format: Option<String>,
    #[serde(rename = "track-count", default)]
    track_count: Option<u32>,
    #[serde(default)]
    tracks: Vec<MbTrack>,
}

impl MbMedium {
    fn track_count(&self) -> u32 {
        self.track_count.unwrap_or(self.tracks.len() as u32)
    }
}

#[derive(Debug, Deserialize)]
struct MbTrack {
    #[serde(default)]
    position: u32,
    title: String,
    #[serde(default)]
    length: Option<u64>,
}

impl From<MbRelease> for ReleaseDetails {
    fn from(mb: MbRelease) -> Self {
        let artist_credit = join_artist_credit(&mb.artist_credit);

        // Flatten tracks from all media
        let mut tracks = Vec::new();
        for medium in mb.media {
            let disc_number = (medium.position > 0).then_some(medium.position);
            for track in medium.tracks {
                tracks.push(Track {
                    position: track.position,
                    title: track.title,
                    duration_ms: track.length,
                    disc_number,
                });
            }
        }

        ReleaseDetails {
            id: mb.id,
            title: mb.title,
            artist_credit,
            date: mb.date.filter(|d| !d.is_empty()),
            country: mb.country,
            tracks,
        }
    }
}
