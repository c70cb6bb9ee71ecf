//! Video resource repair
//!
//! Verifies that every video link in a structured plan resolves to a live,
//! unique video and swaps out the ones that do not.

pub mod credentials;
pub mod dedup;
pub mod engine;
pub mod probe;
pub mod query;

pub use credentials::{
    strategy_for, Credential, CredentialPool, CredentialStrategy, RandomStrategy,
    RoundRobinStrategy, WeightedStrategy,
};
pub use dedup::DedupCache;
pub use engine::{LinkVerdict, RepairReport, Replacement, ResourceRepairEngine, UnresolvedLink};
pub use probe::{Liveness, ProbeError, ResourceProbe, VideoDuration, VideoStats, YoutubeProbe};
pub use query::{
    base_search_phrase, duration_for_query, search_phrase_for_attempt, ATTEMPT_SUFFIXES,
};
