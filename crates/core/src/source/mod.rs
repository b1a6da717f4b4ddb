//! Peer-to-peer source network (slskd).
//!
//! This module provides a `SourceNetwork` trait for searching peers, reading
//! their responses and queueing transfers.

mod slskd;
mod types;

pub use slskd::SlskdClient;
pub use types::*;
