//! Per-image resource bundles.

use std::sync::Arc;

use ash::vk;
use tracing::debug;
use vkpresent_rhi::{PresentDevice, RhiResult};

/// Everything needed to render into and present one swapchain image.
///
/// Resources are created in the order command buffer, view, framebuffer,
/// start semaphore, end semaphore, fence, and released in the exact reverse.
/// A bundle that failed halfway releases only what it created.
pub struct FrameResourceBundle<D: PresentDevice> {
    device: Arc<D>,
    /// Owned by the swapchain, never destroyed here.
    image: vk::Image,
    command_buffer: vk::CommandBuffer,
    view: vk::ImageView,
    framebuffer: vk::Framebuffer,
    start_semaphore: vk::Semaphore,
    end_semaphore: vk::Semaphore,
    fence: vk::Fence,
}

impl<D: PresentDevice> FrameResourceBundle<D> {
    /// Creates the bundle for `image`.
    ///
    /// # Errors
    ///
    /// Returns the first failing creation call; earlier resources are released.
    pub fn new(
        device: Arc<D>,
        image: vk::Image,
        format: vk::Format,
        render_pass: vk::RenderPass,
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let mut bundle = Self {
            device,
            image,
            command_buffer: vk::CommandBuffer::null(),
            view: vk::ImageView::null(),
            framebuffer: vk::Framebuffer::null(),
            start_semaphore: vk::Semaphore::null(),
            end_semaphore: vk::Semaphore::null(),
            fence: vk::Fence::null(),
        };

        bundle.command_buffer = bundle.device.allocate_command_buffer()?;
        bundle.view = bundle.device.create_image_view(image, format)?;
        bundle.framebuffer = bundle
            .device
            .create_framebuffer(render_pass, bundle.view, extent)?;
        bundle.start_semaphore = bundle.device.create_semaphore()?;
        bundle.end_semaphore = bundle.device.create_semaphore()?;
        // Signaled so the first wait on this slot returns immediately.
        bundle.fence = bundle.device.create_fence(true)?;

        Ok(bundle)
    }

    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    #[inline]
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    #[inline]
    pub fn framebuffer(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    /// Signaled when the acquired image is ready.
    #[inline]
    pub fn start_semaphore(&self) -> vk::Semaphore {
        self.start_semaphore
    }

    /// Signaled when the submitted work finishes; gates presentation.
    #[inline]
    pub fn end_semaphore(&self) -> vk::Semaphore {
        self.end_semaphore
    }

    /// Guards the last submission made from this bundle's slot.
    #[inline]
    pub fn fence(&self) -> vk::Fence {
        self.fence
    }
}

impl<D: PresentDevice> Drop for FrameResourceBundle<D> {
    fn drop(&mut self) {
        if self.fence != vk::Fence::null() {
            self.device.destroy_fence(self.fence);
        }
        if self.end_semaphore != vk::Semaphore::null() {
            self.device.destroy_semaphore(self.end_semaphore);
        }
        if self.start_semaphore != vk::Semaphore::null() {
            self.device.destroy_semaphore(self.start_semaphore);
        }
        if self.framebuffer != vk::Framebuffer::null() {
            self.device.destroy_framebuffer(self.framebuffer);
        }
        if self.view != vk::ImageView::null() {
            self.device.destroy_image_view(self.view);
        }
        if self.command_buffer != vk::CommandBuffer::null() {
            self.device.free_command_buffer(self.command_buffer);
        }
        debug!("Frame resource bundle released");
    }
}
