//! The acquisition session.
//!
//! A session walks one album from an artist query to a queued transfer:
//!
//! ```text
//! AwaitingQuery -> ArtistSearching -> ArtistResults
//!   -> ReleaseGroupLoading -> ReleaseGroupResults
//!   -> ReleaseLoading -> ReleaseResults -> ReleaseDetailsLoading
//!   -> SourceSearching -> SourceResults -> QueuingTransfer -> Completed
//! ```
//!
//! [`Session`] is the pure state machine. [`SessionRunner`] executes its
//! commands against the catalog and source network and feeds the results back.

mod machine;
mod record;
mod runner;
mod types;

pub use machine::Session;
pub use record::{AcquisitionRecord, RecordFile};
pub use runner::{SessionHandle, SessionRunner};
pub use types::*;
