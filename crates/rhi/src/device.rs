//! Vulkan logical device and queue management.
//!
//! The [`Device`] owns the logical device and the single queue the engine
//! uses for both graphics submission and presentation.
//!
//! # Example
//!
//! ```no_run
//! use vkpresent_rhi::device::Device;
//! use vkpresent_rhi::instance::Instance;
//! use vkpresent_rhi::physical_device::PhysicalDeviceInfo;
//!
//! # fn example(instance: &Instance, gpu: &PhysicalDeviceInfo) -> vkpresent_rhi::RhiResult<()> {
//! let device = Device::new(instance, gpu)?;
//! let queue = device.queue();
//! # Ok(())
//! # }
//! ```

use std::ffi::CStr;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info};

use crate::error::{RhiResult, VkCallExt};
use crate::instance::Instance;
use crate::physical_device::PhysicalDeviceInfo;

/// Required device extensions.
const DEVICE_EXTENSIONS: &[&CStr] = &[ash::khr::swapchain::NAME];

/// Vulkan logical device wrapper.
///
/// Shared with `Arc`; every object created from it keeps the device alive.
pub struct Device {
    /// Vulkan logical device handle.
    device: ash::Device,
    /// Physical device handle.
    physical_device: vk::PhysicalDevice,
    /// Graphics + present queue handle.
    queue: vk::Queue,
    /// Family `queue` belongs to.
    queue_family: u32,
}

impl Device {
    /// Creates a new logical device with one graphics + present queue.
    ///
    /// # Errors
    ///
    /// Returns an error if device creation fails.
    pub fn new(instance: &Instance, physical_device_info: &PhysicalDeviceInfo) -> RhiResult<Arc<Self>> {
        let queue_family = physical_device_info.queue_family;
        let queue_priorities = [1.0f32];

        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(queue_family)
            .queue_priorities(&queue_priorities)];

        let extension_names: Vec<*const std::ffi::c_char> =
            DEVICE_EXTENSIONS.iter().map(|ext| ext.as_ptr()).collect();

        let features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .handle()
                .create_device(physical_device_info.device, &create_info, None)
                .call("vkCreateDevice")?
        };

        info!(
            "Logical device created with {} extension(s)",
            DEVICE_EXTENSIONS.len()
        );

        let queue = unsafe { device.get_device_queue(queue_family, 0) };
        debug!("Graphics/present queue retrieved from family {}", queue_family);

        Ok(Arc::new(Self {
            device,
            physical_device: physical_device_info.device,
            queue,
            queue_family,
        }))
    }

    /// Returns the Vulkan logical device handle.
    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Returns the queue used for submission and presentation.
    #[inline]
    pub fn queue(&self) -> vk::Queue {
        self.queue
    }

    /// Returns the queue family index of [`Device::queue`].
    #[inline]
    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    /// Waits for the device to become idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails.
    pub fn wait_idle(&self) -> RhiResult<()> {
        unsafe { self.device.device_wait_idle().call("vkDeviceWaitIdle") }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                error!("vkDeviceWaitIdle failed during drop: {}", e);
            }
            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

// Safety: ash::Device is a function table plus a handle; vk::PhysicalDevice and
// vk::Queue are plain handles. Queue access is externally synchronized by the
// single thread driving the present loop.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}
