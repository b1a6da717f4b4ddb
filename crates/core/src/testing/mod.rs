//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the catalog and source network
//! traits, allowing full session runs without real services.
//!
//! # Example
//!
//! ```rust,ignore
//! use albumhunt_core::testing::{fixtures, MockCatalog, MockSourceNetwork};
//!
//! let catalog = MockCatalog::new();
//! let source = MockSourceNetwork::new();
//!
//! catalog.set_artists(vec![fixtures::artist("a1", "The Beatles")]).await;
//! source.set_responses(vec![fixtures::flac_peer("peer", "Abbey Road", 17)]).await;
//! ```

mod mock_catalog;
mod mock_source;

pub use mock_catalog::{MockCatalog, RecordedCatalogQuery};
pub use mock_source::{MockSourceNetwork, RecordedTransfer};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{Artist, Release, ReleaseDetails, ReleaseGroup, Track};
    use crate::source::{PeerFile, PeerResponse};

    pub fn artist(id: &str, name: &str) -> Artist {
        Artist {
            id: id.to_string(),
            name: name.to_string(),
            sort_name: None,
            disambiguation: None,
            country: Some("GB".to_string()),
            kind: Some("Group".to_string()),
            score: 100,
        }
    }

    /// A studio album release group.
    pub fn release_group(id: &str, title: &str, date: &str) -> ReleaseGroup {
        ReleaseGroup {
            id: id.to_string(),
            title: title.to_string(),
            primary_type: Some("Album".to_string()),
            secondary_types: Vec::new(),
            first_release_date: Some(date.to_string()),
        }
    }

    /// A CD release of an album.
    pub fn release(id: &str, title: &str, date: &str, country: &str, tracks: u32) -> Release {
        Release {
            id: id.to_string(),
            title: title.to_string(),
            date: Some(date.to_string()),
            country: Some(country.to_string()),
            status: Some("Official".to_string()),
            track_count: tracks,
            format: "CD".to_string(),
            release_type: Some("Album".to_string()),
            disambiguation: None,
        }
    }

    pub fn release_details(id: &str, artist: &str, title: &str, date: &str, tracks: u32) -> ReleaseDetails {
        ReleaseDetails {
            id: id.to_string(),
            title: title.to_string(),
            artist_credit: artist.to_string(),
            date: Some(date.to_string()),
            country: Some("GB".to_string()),
            tracks: (1..=tracks)
                .map(|i| Track {
                    position: i,
                    title: format!("Track {}", i),
                    duration_ms: Some(180_000 + (i as u64 * 10_000)),
                    disc_number: Some(1),
                })
                .collect(),
        }
    }

    /// A peer with a free slot sharing `tracks` files of one extension
    /// under `Music\<album>\`.
    pub fn peer(
        username: &str,
        album: &str,
        tracks: u32,
        extension: &str,
        bit_rate: Option<u32>,
    ) -> PeerResponse {
        PeerResponse {
            username: username.to_string(),
            has_free_upload_slot: true,
            upload_speed: 1_000_000,
            queue_length: 0,
            files: (1..=tracks)
                .map(|i| PeerFile {
                    filename: format!("Music\\{}\\{:02} Track {}.{}", album, i, i, extension),
                    size: 30_000_000,
                    bit_rate,
                    extension: extension.to_string(),
                })
                .collect(),
        }
    }

    pub fn flac_peer(username: &str, album: &str, tracks: u32) -> PeerResponse {
        peer(username, album, tracks, "flac", None)
    }

    pub fn mp3_peer(username: &str, album: &str, tracks: u32) -> PeerResponse {
        let mut response = peer(username, album, tracks, "mp3", Some(320));
        for file in &mut response.files {
            file.size = 8_000_000;
        }
        response
    }
}
