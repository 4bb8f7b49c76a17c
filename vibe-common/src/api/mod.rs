//! Recommendation service wire contracts
//!
//! Request and response bodies exchanged with the recommendation service.
//! The ranking itself happens server-side; these types only describe the
//! JSON contract.

pub mod types;

pub use types::{
    ArtistRecommendations, AudioFeatures, HealthStatus, RecommendRequest, RecommendResponse,
    ResponseMeta, Track, Tunables,
};
