//! What the frame callback sees, and what a present cycle reports.

use ash::vk;

/// Handles for recording one frame, passed to the frame callback.
///
/// The command buffer is open (begun, `ONE_TIME_SUBMIT`) and no render pass is
/// active. The callback begins and ends [`render_pass`](Self::render_pass) on
/// [`framebuffer`](Self::framebuffer) itself; the engine ends the command
/// buffer afterwards.
pub struct FrameContext<'a, D> {
    pub(crate) device: &'a D,
    pub(crate) frame_index: u32,
    pub(crate) slot: usize,
    pub(crate) command_buffer: vk::CommandBuffer,
    pub(crate) framebuffer: vk::Framebuffer,
    pub(crate) render_pass: vk::RenderPass,
    pub(crate) image: vk::Image,
    pub(crate) extent: vk::Extent2D,
    pub(crate) format: vk::Format,
}

impl<D> FrameContext<'_, D> {
    /// The device the frame is recorded on.
    #[inline]
    pub fn device(&self) -> &D {
        self.device
    }

    /// Index of the acquired swapchain image.
    #[inline]
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// In-flight slot whose semaphores and fence guard this submission.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    #[inline]
    pub fn framebuffer(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    #[inline]
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// The presentable image behind the framebuffer.
    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// The whole framebuffer, for `vkCmdBeginRenderPass`.
    pub fn render_area(&self) -> vk::Rect2D {
        vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.extent,
        }
    }
}

/// Outcome of a successful [`FrameEngine::render`](crate::FrameEngine::render).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame was submitted and queued for presentation.
    Presented,
    /// The chain was rebuilt during this call.
    Resized,
}

/// Counters kept across the engine's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Cycles that reached presentation.
    pub frames_presented: u64,
    /// Successful chain rebuilds (not counting the initial build).
    pub rebuilds: u64,
    /// Cycles abandoned because the frame callback returned `false`.
    pub aborted: u64,
}
