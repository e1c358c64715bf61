//! Vulkan layer for the presentation engine.
//!
//! This crate wraps `ash` for everything the frame presentation engine needs
//! from the Graphics Context:
//! - Instance, physical device and logical device creation
//! - Window surface creation
//! - Command pool and command buffer management
//! - Swapchain policy (format, image count, extent, present mode)
//! - The shared presentable render pass
//! - The [`PresentDevice`] seam and its Vulkan implementation

mod error;

pub mod backend;
pub mod command;
pub mod device;
pub mod instance;
pub mod physical_device;
pub mod present;
pub mod render_pass;
pub mod surface;
pub mod swapchain;

pub use backend::VulkanPresentDevice;
pub use error::{RhiError, RhiResult};
pub use present::{PresentDevice, SubmitInfo};
pub use swapchain::{SurfaceSupport, SwapchainDesc};

// Re-export ash types that users might need
pub use ash::vk;
