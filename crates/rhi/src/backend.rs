//! [`PresentDevice`] implemented on `ash`.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::command::{CommandBuffer, CommandPool};
use crate::device::Device;
use crate::error::{RhiResult, VkCallExt};
use crate::instance::Instance;
use crate::present::{PresentDevice, SubmitInfo};
use crate::render_pass;
use crate::surface::Surface;
use crate::swapchain::{SurfaceSupport, SwapchainDesc};

/// Vulkan implementation of the presentation device seam.
///
/// Owns the window surface, the swapchain loader and the command pool the
/// per-image command buffers are allocated from. The [`Instance`] it was
/// created from must outlive it.
pub struct VulkanPresentDevice {
    command_pool: CommandPool,
    swapchain_loader: ash::khr::swapchain::Device,
    surface: Surface,
    device: Arc<Device>,
}

impl VulkanPresentDevice {
    /// Wraps `device` for presenting to `surface`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command pool cannot be created.
    pub fn new(instance: &Instance, device: Arc<Device>, surface: Surface) -> RhiResult<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let command_pool = CommandPool::new(device.clone(), device.queue_family())?;

        info!("Present device ready on queue family {}", device.queue_family());

        Ok(Self {
            command_pool,
            swapchain_loader,
            surface,
            device,
        })
    }

    /// Returns the logical device, for recording commands in frame callbacks.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Returns the target surface.
    #[inline]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }
}

impl PresentDevice for VulkanPresentDevice {
    fn surface_support(&self) -> RhiResult<SurfaceSupport> {
        SurfaceSupport::query(
            self.device.physical_device(),
            self.surface.handle(),
            self.surface.loader(),
        )
    }

    fn create_swapchain(&self, desc: &SwapchainDesc) -> RhiResult<vk::SwapchainKHR> {
        let create_info = desc.create_info(self.surface.handle());
        let swapchain = unsafe {
            self.swapchain_loader
                .create_swapchain(&create_info, None)
                .call("vkCreateSwapchainKHR")?
        };
        debug!(
            "Swapchain created: {}x{}, {:?}, {:?}",
            desc.extent.width, desc.extent.height, desc.surface_format.format, desc.present_mode
        );
        Ok(swapchain)
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> RhiResult<Vec<vk::Image>> {
        unsafe {
            self.swapchain_loader
                .get_swapchain_images(swapchain)
                .call("vkGetSwapchainImagesKHR")
        }
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe { self.swapchain_loader.destroy_swapchain(swapchain, None) };
        debug!("Swapchain destroyed");
    }

    fn create_render_pass(&self, format: vk::Format) -> RhiResult<vk::RenderPass> {
        render_pass::create_render_pass(self.device.handle(), format)
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        unsafe { self.device.handle().destroy_render_pass(render_pass, None) };
    }

    fn create_image_view(&self, image: vk::Image, format: vk::Format) -> RhiResult<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe {
            self.device
                .handle()
                .create_image_view(&create_info, None)
                .call("vkCreateImageView")
        }
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe { self.device.handle().destroy_image_view(view, None) };
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> RhiResult<vk::Framebuffer> {
        let attachments = [view];
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        unsafe {
            self.device
                .handle()
                .create_framebuffer(&create_info, None)
                .call("vkCreateFramebuffer")
        }
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe { self.device.handle().destroy_framebuffer(framebuffer, None) };
    }

    fn allocate_command_buffer(&self) -> RhiResult<vk::CommandBuffer> {
        self.command_pool.allocate_command_buffer()
    }

    fn free_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        self.command_pool.free_command_buffer(command_buffer);
    }

    fn create_semaphore(&self) -> RhiResult<vk::Semaphore> {
        let create_info = vk::SemaphoreCreateInfo::default();
        unsafe {
            self.device
                .handle()
                .create_semaphore(&create_info, None)
                .call("vkCreateSemaphore")
        }
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.device.handle().destroy_semaphore(semaphore, None) };
    }

    fn create_fence(&self, signaled: bool) -> RhiResult<vk::Fence> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::default().flags(flags);
        unsafe {
            self.device
                .handle()
                .create_fence(&create_info, None)
                .call("vkCreateFence")
        }
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.handle().destroy_fence(fence, None) };
    }

    fn wait_for_fence(&self, fence: vk::Fence) -> RhiResult<()> {
        unsafe {
            self.device
                .handle()
                .wait_for_fences(&[fence], true, u64::MAX)
                .call("vkWaitForFences")
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> RhiResult<()> {
        unsafe {
            self.device
                .handle()
                .reset_fences(&[fence])
                .call("vkResetFences")
        }
    }

    fn wait_idle(&self) -> RhiResult<()> {
        self.device.wait_idle()
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        semaphore: vk::Semaphore,
    ) -> RhiResult<(u32, bool)> {
        unsafe {
            self.swapchain_loader
                .acquire_next_image(swapchain, u64::MAX, semaphore, vk::Fence::null())
                .call("vkAcquireNextImageKHR")
        }
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> RhiResult<()> {
        CommandBuffer::from_handle(self.device.clone(), command_buffer).begin()
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> RhiResult<()> {
        CommandBuffer::from_handle(self.device.clone(), command_buffer).end()
    }

    fn submit(&self, info: &SubmitInfo) -> RhiResult<()> {
        let wait_semaphores = [info.wait_semaphore];
        let wait_stages = [info.wait_stage];
        let command_buffers = [info.command_buffer];
        let signal_semaphores = [info.signal_semaphore];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .handle()
                .queue_submit(self.device.queue(), &[submit_info], info.fence)
                .call("vkQueueSubmit")
        }
    }

    fn queue_present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> RhiResult<bool> {
        let wait_semaphores = [wait_semaphore];
        let swapchains = [swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            self.swapchain_loader
                .queue_present(self.device.queue(), &present_info)
                .call("vkQueuePresentKHR")
        }
    }
}
