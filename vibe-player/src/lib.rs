//! # Vibe Playback Coordination (vibe-player)
//!
//! Keeps at most one embedded audio player sounding at a time across an
//! open-ended, dynamically mounted set of players (one per recommendation
//! card plus the shared library player).
//!
//! **Architecture:**
//! - [`PlaybackSurface`] wraps one externally owned [`PlayerController`]
//! - [`ResetBus`] delivers "you are no longer active" signals by surface identity
//! - [`PlaybackCoordinator`] owns the single active track and serializes play requests
//!
//! Everything runs on the caller's event loop: every coordinator method
//! mutates state synchronously and returns before the next callback is
//! handled, so no lock is needed.

pub mod coordinator;
pub mod error;
pub mod reset_bus;
pub mod surface;

pub use coordinator::{ActiveTrack, PlayOutcome, PlaybackCoordinator};
pub use error::{Error, PlayerFault, Result};
pub use reset_bus::{ResetBus, ResetSignal, ResetSubscription};
pub use surface::{
    PendingPlay, PlaybackSurface, PlaybackUpdate, PlayerController, SurfaceId, SurfaceOptions,
    TrackRef,
};
