//! Search polling against the source network.
//!
//! The network flips searches to "complete" before every peer response has
//! streamed in, so completion is only trusted once the response count has
//! stayed put for several consecutive ticks. Each tick is one call to
//! [`PollController::tick`]; the caller owns the [`PollState`] in between.

mod controller;

pub use controller::{PollController, PollOutcome, PollState};
