//! Recommendation session for Vibe
//!
//! Turns the user's seed artists and fine-tune picks into requests for the
//! recommendation service, and tracks what has been shown across repeated
//! "more like this" regenerations.

pub mod client;
pub mod fine_tune;
pub mod request;
pub mod session;

pub use client::RecommendationClient;
pub use fine_tune::FineTuneSelection;
pub use request::{SearchInputs, SearchRequestBuilder};
pub use session::{
    Completion, ExclusionHistory, PendingRequest, RecommendationSession, RegenerateBlocked,
    RequestKind, SessionLimits, SessionState,
};
