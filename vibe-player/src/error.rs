//! Error types for vibe-player

use thiserror::Error;

use crate::surface::SurfaceId;

/// Coordinator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A surface with this identity is already mounted
    #[error("Surface already mounted: {0}")]
    AlreadyMounted(SurfaceId),

    /// The surface instance was torn down or replaced by a newer mount
    #[error("Surface not mounted: {0}")]
    NotMounted(SurfaceId),
}

/// Convenience Result type using vibe-player Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failure raised by an embedded player controller
///
/// Never propagated past the surface: the surface logs it and carries on as
/// if the call had succeeded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerFault {
    /// No controller has been created for the surface yet
    #[error("player controller not created")]
    NoController,

    /// The controller rejected or failed the call
    #[error("player {op} failed: {message}")]
    Rejected { op: &'static str, message: String },
}

impl PlayerFault {
    pub fn rejected(op: &'static str, message: impl Into<String>) -> Self {
        PlayerFault::Rejected {
            op,
            message: message.into(),
        }
    }
}
