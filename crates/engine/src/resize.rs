//! Resize state machine.

use ash::vk;
use tracing::debug;

/// Where the engine stands with respect to its presentation chain.
///
/// ```text
/// Stable --notify(w,h > 0)--> PendingResize --safe point--> Rebuilding
///   ^                              |  ^                       |     |
///   |                              +--+ newer notify           |     |
///   +-------------------- build ok ---------------------------+     |
///                                                 build failed --> Fatal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeState {
    #[default]
    Stable,
    /// A rebuild at `extent` is due at the next safe point.
    PendingResize { extent: vk::Extent2D },
    Rebuilding,
    /// A rebuild failed. No further rendering; no automatic retry.
    Fatal,
}

impl ResizeState {
    /// Records a surface size notification.
    ///
    /// Zero-sized notifications (minimized window) are ignored, as is anything
    /// arriving after the engine went fatal. Returns whether a rebuild is now pending.
    pub fn notify(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            debug!("Ignoring resize to {}x{}", width, height);
            return false;
        }

        match self {
            Self::Stable | Self::PendingResize { .. } => {
                *self = Self::PendingResize {
                    extent: vk::Extent2D { width, height },
                };
                true
            }
            Self::Rebuilding | Self::Fatal => false,
        }
    }

    /// Schedules a rebuild at `extent` unless one is already pending.
    pub fn invalidate(&mut self, extent: vk::Extent2D) {
        if *self == Self::Stable {
            *self = Self::PendingResize { extent };
        }
    }

    /// At a safe point: moves a pending resize to `Rebuilding` and returns its extent.
    pub fn take_pending(&mut self) -> Option<vk::Extent2D> {
        match *self {
            Self::PendingResize { extent } => {
                *self = Self::Rebuilding;
                Some(extent)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        *self == Self::Fatal
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingResize { .. })
    }
}
