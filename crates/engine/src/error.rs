//! Engine error types.

use thiserror::Error;
use vkpresent_rhi::RhiError;

/// Errors returned by [`FrameEngine`](crate::FrameEngine).
#[derive(Error, Debug)]
pub enum PresentError {
    /// Building the presentation chain failed; everything the attempt created
    /// has already been released.
    #[error("failed to build presentation chain: {source}")]
    Build {
        #[source]
        source: RhiError,
    },

    /// The frame callback returned `false`; nothing was submitted or presented.
    #[error("frame callback aborted image {frame_index}")]
    Aborted { frame_index: u32 },

    /// No frame callback has been registered.
    #[error("no frame callback registered")]
    NoCallback,

    /// A previous rebuild or submission failed; the engine no longer renders.
    #[error("presentation engine is in a fatal state")]
    Fatal,

    /// A GPU call whose result the cycle depends on failed.
    #[error(transparent)]
    Rhi(#[from] RhiError),
}

impl PresentError {
    /// Returns `true` for errors after which the engine will never render again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal | Self::Build { .. })
    }
}

/// Result type alias for engine operations.
pub type PresentResult<T> = std::result::Result<T, PresentError>;
