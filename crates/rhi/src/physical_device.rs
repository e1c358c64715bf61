//! Physical device (GPU) selection.
//!
//! The presentation engine drives a single queue, so a GPU qualifies only when
//! one of its queue families supports both graphics and presentation to the
//! target surface, and it exposes `VK_KHR_swapchain`. Among qualifying GPUs the
//! device type decides (discrete first).
//!
//! # Example
//!
//! ```no_run
//! use vkpresent_rhi::instance::Instance;
//! use vkpresent_rhi::physical_device::select_physical_device;
//! use vkpresent_rhi::vk;
//!
//! # fn example(instance: &Instance, surface: vk::SurfaceKHR) -> vkpresent_rhi::RhiResult<()> {
//! let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());
//! let gpu = select_physical_device(instance.handle(), surface, &surface_loader)?;
//! println!("Selected GPU: {}", gpu.device_name());
//! # Ok(())
//! # }
//! ```

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::{RhiError, RhiResult, VkCallExt};

/// Information about the selected physical device.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version, etc.).
    pub properties: vk::PhysicalDeviceProperties,
    /// Queue family used for both graphics submission and presentation.
    pub queue_family: u32,
}

impl PhysicalDeviceInfo {
    /// Returns the device name as a string.
    pub fn device_name(&self) -> &str {
        self.properties
            .device_name_as_c_str()
            .ok()
            .and_then(|name| name.to_str().ok())
            .unwrap_or("Unknown Device")
    }

    /// Returns a human-readable string for the device type.
    pub fn device_type_name(&self) -> &'static str {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "Other",
        }
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field("queue_family", &self.queue_family)
            .finish()
    }
}

/// Selects the most suitable physical device for presenting to `surface`.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if no GPU qualifies.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> RhiResult<PhysicalDeviceInfo> {
    let devices = unsafe {
        instance
            .enumerate_physical_devices()
            .call("vkEnumeratePhysicalDevices")?
    };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }

    info!("Found {} GPU(s)", devices.len());

    let selected = devices
        .into_iter()
        .filter_map(|device| check_device_suitability(instance, device, surface, surface_loader))
        .inspect(|info| {
            debug!(
                "GPU '{}' ({}) - Score: {}",
                info.device_name(),
                info.device_type_name(),
                rate_device_type(info.properties.device_type)
            );
        })
        .max_by_key(|info| rate_device_type(info.properties.device_type))
        .ok_or_else(|| {
            warn!("No GPU offers a graphics queue that can present to the surface");
            RhiError::NoSuitableGpu
        })?;

    info!(
        "Selected GPU: '{}' ({}), queue family {}",
        selected.device_name(),
        selected.device_type_name(),
        selected.queue_family
    );

    Ok(selected)
}

fn check_device_suitability(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Option<PhysicalDeviceInfo> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let name = properties
        .device_name_as_c_str()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let has_swapchain = unsafe { instance.enumerate_device_extension_properties(device) }
        .map(|extensions| {
            extensions
                .iter()
                .any(|ext| ext.extension_name_as_c_str().ok() == Some(ash::khr::swapchain::NAME))
        })
        .unwrap_or(false);
    if !has_swapchain {
        debug!("GPU '{}' skipped: VK_KHR_swapchain not supported", name);
        return None;
    }

    let families = unsafe { instance.get_physical_device_queue_family_properties(device) };
    let queue_family = find_present_queue_family(&families, |index| unsafe {
        surface_loader
            .get_physical_device_surface_support(device, index, surface)
            .unwrap_or(false)
    });

    let Some(queue_family) = queue_family else {
        debug!(
            "GPU '{}' skipped: no queue family supports graphics and present",
            name
        );
        return None;
    };

    Some(PhysicalDeviceInfo {
        device,
        properties,
        queue_family,
    })
}

/// Finds the first queue family that supports graphics and can present.
pub fn find_present_queue_family(
    families: &[vk::QueueFamilyProperties],
    mut can_present: impl FnMut(u32) -> bool,
) -> Option<u32> {
    families
        .iter()
        .enumerate()
        .filter(|(_, family)| {
            family.queue_count > 0 && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
        })
        .map(|(index, _)| index as u32)
        .find(|&index| can_present(index))
}

/// Rates a device type. Higher is preferred.
pub fn rate_device_type(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 10000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1000,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 100,
        vk::PhysicalDeviceType::CPU => 10,
        _ => 1,
    }
}
