//! # Vibe Common Library
//!
//! Shared code for the Vibe recommendation client crates:
//! - Error type and user-facing error rendering
//! - Bootstrap configuration loading
//! - Recommendation service wire contracts
//! - Limits shared by the session and the player

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};

/// Maximum size of the exclusion history before regeneration is disabled.
///
/// The exclusion list travels back to the service on every regenerate call,
/// so it is capped; reaching the cap also means the candidate pool for the
/// current seeds is most likely used up.
pub const HIDDEN_ARTIST_LIMIT: usize = 30;

/// Default number of fine-tune tracks a single artist may hold.
pub const DEFAULT_FINE_TUNE_CAPACITY: usize = 5;
