pub mod catalog;
pub mod config;
pub mod poll;
pub mod scoring;
pub mod session;
pub mod source;
pub mod testing;

mod counting;

pub use catalog::{CatalogClient, CatalogError, MusicBrainzClient};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, FilterDefaults,
    PollConfig,
};
pub use poll::{PollController, PollOutcome, PollState};
pub use scoring::{score_sources, CandidateSource, FilterConfig, FilterStats, FormatPreference};
pub use session::{
    AcquisitionRecord, Command, Intent, OpId, OpResult, Phase, Session, SessionHandle,
    SessionRunner, Snapshot,
};
pub use source::{SlskdClient, SourceError, SourceNetwork};
