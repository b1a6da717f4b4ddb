//! Filtering and ranking of catalog releases and peer sources.
//!
//! Everything here is a pure function of (raw data, filter configuration).
//! Views are rebuilt from scratch on every filter change, so toggles are
//! idempotent and order-independent.

mod dedup;
mod formats;
mod scorer;
mod track_count;
mod types;

pub use dedup::{country_rank, dedup_releases};
pub use formats::{classify_extension, file_extension, AudioClass};
pub use scorer::{score_sources, ScoredSources};
pub use track_count::{expected_tracks_from_counts, resolve_track_count};
pub use types::*;
