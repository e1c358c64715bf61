//! Swapchain selection policy.
//!
//! This module decides *how* a presentation chain is shaped for a surface:
//! - Surface format (8-bit BGRA preferred)
//! - Image count (one more than the minimum, capped by the maximum)
//! - Extent (explicit window size, current surface extent, or maximum extent)
//! - Present mode (MAILBOX) and composite alpha (pre-multiplied)
//!
//! The result is a [`SwapchainDesc`], which a [`PresentDevice`](crate::PresentDevice)
//! turns into a `VkSwapchainKHR`. The policy itself never touches the GPU so it
//! can be exercised directly in tests.
//!
//! # Example
//!
//! ```
//! use vkpresent_rhi::swapchain::{SurfaceSupport, SwapchainDesc};
//! use vkpresent_rhi::vk;
//!
//! let support = SurfaceSupport {
//!     capabilities: vk::SurfaceCapabilitiesKHR {
//!         min_image_count: 2,
//!         max_image_count: 8,
//!         current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
//!         max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
//!         supported_composite_alpha: vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
//!         ..Default::default()
//!     },
//!     formats: vec![vk::SurfaceFormatKHR {
//!         format: vk::Format::B8G8R8A8_UNORM,
//!         color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
//!     }],
//!     present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
//! };
//!
//! let desc = SwapchainDesc::from_support(&support, vk::Extent2D { width: 1280, height: 720 })
//!     .unwrap();
//! assert_eq!(desc.image_count, 3);
//! assert_eq!(desc.extent.width, 1280);
//! assert_eq!(desc.present_mode, vk::PresentModeKHR::MAILBOX);
//! ```

use ash::vk;
use tracing::{debug, warn};

use crate::error::{RhiError, RhiResult, VkCallExt};

/// Preferred presentable format: 8-bit BGRA.
pub const PREFERRED_FORMAT: vk::Format = vk::Format::B8G8R8A8_UNORM;

/// Low-latency present mode used whenever the surface offers it.
pub const PREFERRED_PRESENT_MODE: vk::PresentModeKHR = vk::PresentModeKHR::MAILBOX;

/// Composite alpha used whenever the surface offers it.
pub const PREFERRED_COMPOSITE_ALPHA: vk::CompositeAlphaFlagsKHR =
    vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED;

/// Swapchain surface support details.
///
/// Contains information about what the surface supports for swapchain creation.
#[derive(Debug, Clone)]
pub struct SurfaceSupport {
    /// Surface capabilities (min/max image count, extents, transforms, etc.)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats (format and color space combinations)
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes (FIFO, MAILBOX, IMMEDIATE, etc.)
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    /// Queries swapchain support details for a physical device and surface.
    ///
    /// # Errors
    ///
    /// Returns an error naming the failing query if any of them fails.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .call("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")?
        };

        let formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .call("vkGetPhysicalDeviceSurfaceFormatsKHR")?
        };

        let present_modes = unsafe {
            surface_loader
                .get_physical_device_surface_present_modes(physical_device, surface)
                .call("vkGetPhysicalDeviceSurfacePresentModesKHR")?
        };

        debug!(
            "Surface support: {} formats, {} present modes, image count: {}-{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            if capabilities.max_image_count == 0 {
                "unlimited".to_string()
            } else {
                capabilities.max_image_count.to_string()
            }
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }
}

/// Everything needed to create one presentation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    /// Requested minimum number of presentable images.
    pub image_count: u32,
    /// Pixel format and color space of the presentable images.
    pub surface_format: vk::SurfaceFormatKHR,
    /// Image size in pixels.
    pub extent: vk::Extent2D,
    /// Transform reported as current by the surface.
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    /// Alpha compositing mode.
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    /// Presentation mode.
    pub present_mode: vk::PresentModeKHR,
}

impl SwapchainDesc {
    /// Applies the selection policy to a surface's reported support.
    ///
    /// `requested` is the owning window's explicit size; a zero width or
    /// height means "use what the surface reports".
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::SwapchainError`] if the surface reports no formats.
    pub fn from_support(support: &SurfaceSupport, requested: vk::Extent2D) -> RhiResult<Self> {
        let surface_format = choose_surface_format(&support.formats).ok_or_else(|| {
            RhiError::SwapchainError("surface reports no supported formats".to_string())
        })?;

        Ok(Self {
            image_count: determine_image_count(&support.capabilities),
            surface_format,
            extent: choose_extent(&support.capabilities, requested),
            pre_transform: support.capabilities.current_transform,
            composite_alpha: choose_composite_alpha(
                support.capabilities.supported_composite_alpha,
            ),
            present_mode: choose_present_mode(&support.present_modes),
        })
    }

    /// Builds the `VkSwapchainCreateInfoKHR` for `surface`.
    ///
    /// The chain is always created without an old swapchain: the previous one
    /// has been destroyed before a rebuild starts.
    pub fn create_info(&self, surface: vk::SurfaceKHR) -> vk::SwapchainCreateInfoKHR<'static> {
        vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(self.image_count)
            .image_format(self.surface_format.format)
            .image_color_space(self.surface_format.color_space)
            .image_extent(self.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(self.pre_transform)
            .composite_alpha(self.composite_alpha)
            .present_mode(self.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null())
    }
}

/// Chooses the surface format.
///
/// Prefers [`PREFERRED_FORMAT`] in any color space and falls back to the first
/// reported format. Returns `None` only when `formats` is empty.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    if let Some(&format) = formats.iter().find(|f| f.format == PREFERRED_FORMAT) {
        debug!("Selected preferred surface format {:?}", format.format);
        return Some(format);
    }

    let first = formats.first().copied()?;
    warn!("Using first available surface format: {:?}", first.format);
    Some(first)
}

/// Chooses the present mode.
///
/// MAILBOX when offered; otherwise FIFO, which every conformant surface supports.
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&PREFERRED_PRESENT_MODE) {
        return PREFERRED_PRESENT_MODE;
    }

    warn!(
        "Surface does not offer {:?} (offers {:?}), falling back to FIFO",
        PREFERRED_PRESENT_MODE, present_modes
    );
    vk::PresentModeKHR::FIFO
}

/// Chooses the composite alpha mode.
///
/// Pre-multiplied when supported, else the lowest supported bit, else OPAQUE.
pub fn choose_composite_alpha(supported: vk::CompositeAlphaFlagsKHR) -> vk::CompositeAlphaFlagsKHR {
    if supported.contains(PREFERRED_COMPOSITE_ALPHA) {
        return PREFERRED_COMPOSITE_ALPHA;
    }

    let raw = supported.as_raw();
    let fallback = if raw == 0 {
        vk::CompositeAlphaFlagsKHR::OPAQUE
    } else {
        vk::CompositeAlphaFlagsKHR::from_raw(raw & raw.wrapping_neg())
    };
    warn!(
        "Surface does not support {:?} composite alpha, using {:?}",
        PREFERRED_COMPOSITE_ALPHA, fallback
    );
    fallback
}

/// Returns the surface's current extent, or `None` when the surface leaves it
/// to the swapchain (reported as `u32::MAX` by the driver).
pub fn defined_extent(capabilities: &vk::SurfaceCapabilitiesKHR) -> Option<vk::Extent2D> {
    let current = capabilities.current_extent;
    if current.width == u32::MAX || current.height == u32::MAX {
        None
    } else {
        Some(current)
    }
}

/// Chooses the swapchain extent.
///
/// A nonzero `requested` size wins, clamped into the surface's limits when the
/// surface reports a maximum. Otherwise the current extent is used when
/// defined, and the maximum extent when it is not.
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, requested: vk::Extent2D) -> vk::Extent2D {
    if requested.width != 0 && requested.height != 0 {
        let max = capabilities.max_image_extent;
        if max.width == 0 || max.height == 0 {
            return requested;
        }

        let min = capabilities.min_image_extent;
        let extent = vk::Extent2D {
            width: requested.width.clamp(min.width.min(max.width), max.width),
            height: requested.height.clamp(min.height.min(max.height), max.height),
        };
        debug!(
            "Using window extent {}x{} (requested {}x{})",
            extent.width, extent.height, requested.width, requested.height
        );
        return extent;
    }

    match defined_extent(capabilities) {
        Some(current) => {
            debug!(
                "Using current surface extent: {}x{}",
                current.width, current.height
            );
            current
        }
        None => {
            debug!(
                "Surface extent undefined, using maximum extent {}x{}",
                capabilities.max_image_extent.width, capabilities.max_image_extent.height
            );
            capabilities.max_image_extent
        }
    }
}

/// Determines the number of swapchain images.
///
/// One more than the minimum, capped by the maximum when one is set
/// (`max_image_count == 0` means unbounded).
pub fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;

    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}
