//! The device seam used by the presentation engine.
//!
//! [`PresentDevice`] is the narrow set of GPU operations a frame presentation
//! loop needs: surface queries, swapchain and render pass lifetime, per-image
//! view/framebuffer/command buffer/semaphore/fence lifetime, and the
//! wait/acquire/submit/present calls. [`VulkanPresentDevice`](crate::VulkanPresentDevice)
//! implements it on `ash`.
//!
//! Handles are plain `vk` handles. Whoever creates one through this trait is
//! responsible for destroying it through the matching `destroy_*` call.

use ash::vk;

use crate::error::RhiResult;
use crate::swapchain::{SurfaceSupport, SwapchainDesc};

/// One queue submission: a single command buffer, one wait and one signal semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitInfo {
    /// Recorded command buffer to execute.
    pub command_buffer: vk::CommandBuffer,
    /// Semaphore waited on before `wait_stage` (image acquired).
    pub wait_semaphore: vk::Semaphore,
    /// Pipeline stage that waits on `wait_semaphore`.
    pub wait_stage: vk::PipelineStageFlags,
    /// Semaphore signaled when the work completes (ready to present).
    pub signal_semaphore: vk::Semaphore,
    /// Fence signaled when the work completes.
    pub fence: vk::Fence,
}

/// GPU operations needed to build a presentation chain and run a present loop.
///
/// All waits are unbounded. Operations that can report a stale chain
/// (`acquire_next_image`, `queue_present`) return the driver error as
/// [`RhiError::Call`](crate::RhiError::Call) so callers can check
/// [`RhiError::is_out_of_date`](crate::RhiError::is_out_of_date).
pub trait PresentDevice {
    /// Queries capabilities, formats and present modes of the target surface.
    fn surface_support(&self) -> RhiResult<SurfaceSupport>;

    /// Creates a swapchain on the target surface.
    fn create_swapchain(&self, desc: &SwapchainDesc) -> RhiResult<vk::SwapchainKHR>;
    /// Returns the presentable images owned by `swapchain`.
    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> RhiResult<Vec<vk::Image>>;
    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);

    /// Creates the single-subpass, single-color-attachment presentable render pass.
    fn create_render_pass(&self, format: vk::Format) -> RhiResult<vk::RenderPass>;
    fn destroy_render_pass(&self, render_pass: vk::RenderPass);

    /// Creates a 2D color view over `image` with identity component mapping.
    fn create_image_view(&self, image: vk::Image, format: vk::Format) -> RhiResult<vk::ImageView>;
    fn destroy_image_view(&self, view: vk::ImageView);

    /// Creates a framebuffer binding `view` to `render_pass`.
    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> RhiResult<vk::Framebuffer>;
    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    /// Allocates a primary command buffer from a resettable pool.
    fn allocate_command_buffer(&self) -> RhiResult<vk::CommandBuffer>;
    fn free_command_buffer(&self, command_buffer: vk::CommandBuffer);

    fn create_semaphore(&self) -> RhiResult<vk::Semaphore>;
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    fn create_fence(&self, signaled: bool) -> RhiResult<vk::Fence>;
    fn destroy_fence(&self, fence: vk::Fence);

    /// Blocks until `fence` is signaled.
    fn wait_for_fence(&self, fence: vk::Fence) -> RhiResult<()>;
    fn reset_fence(&self, fence: vk::Fence) -> RhiResult<()>;
    /// Blocks until all queued work has finished.
    fn wait_idle(&self) -> RhiResult<()>;

    /// Acquires the next presentable image, signaling `semaphore` when it is ready.
    ///
    /// Returns the image index and whether the swapchain is suboptimal.
    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        semaphore: vk::Semaphore,
    ) -> RhiResult<(u32, bool)>;

    /// Begins recording with `ONE_TIME_SUBMIT`.
    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> RhiResult<()>;
    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> RhiResult<()>;

    fn submit(&self, info: &SubmitInfo) -> RhiResult<()>;

    /// Presents `image_index` once `wait_semaphore` is signaled.
    ///
    /// Returns whether the swapchain is suboptimal.
    fn queue_present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> RhiResult<bool>;
}
