//! RHI-specific error types.

use ash::vk;
use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] vk::Result),

    /// A named Vulkan call failed with the given driver code
    #[error("{call} failed: {result}")]
    Call {
        /// Vulkan entry point that failed, e.g. `vkCreateFence`.
        call: &'static str,
        /// Driver-reported result code.
        result: vk::Result,
    },

    /// Failed to load Vulkan
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Surface creation error
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    SwapchainError(String),
}

impl RhiError {
    /// Returns the driver result code, if this error carries one.
    pub fn vk_result(&self) -> Option<vk::Result> {
        match self {
            Self::VulkanError(result) | Self::Call { result, .. } => Some(*result),
            _ => None,
        }
    }

    /// Returns `true` when the driver reported the swapchain out of date.
    pub fn is_out_of_date(&self) -> bool {
        self.vk_result() == Some(vk::Result::ERROR_OUT_OF_DATE_KHR)
    }
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

/// Attaches the failing Vulkan entry point name to a raw `vk::Result`.
pub(crate) trait VkCallExt<T> {
    fn call(self, call: &'static str) -> RhiResult<T>;
}

impl<T> VkCallExt<T> for Result<T, vk::Result> {
    #[inline]
    fn call(self, call: &'static str) -> RhiResult<T> {
        self.map_err(|result| RhiError::Call { call, result })
    }
}
