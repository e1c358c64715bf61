//! The present loop.
//!
//! One [`FrameEngine::render`] call is one present cycle:
//!
//! ```text
//! 1. wait on the slot fence
//!    (pending resize? rebuild and return Resized)
//! 2. acquire an image, signaling the slot start semaphore
//! 3. wait on the fence of the slot that last wrote that image
//! 4. record the slot as the image's last writer
//! 5. begin the image's command buffer
//! 6. run the frame callback
//! 7. end recording, reset the slot fence, submit
//! 8. present, waiting on the slot end semaphore
//! 9. advance the slot
//! ```
//!
//! An out-of-date or suboptimal swapchain at step 2 or 8 rebuilds the chain in
//! place and the call returns [`FrameStatus::Resized`].

use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info, warn};
use vkpresent_rhi::{PresentDevice, RhiResult, SubmitInfo};

use crate::chain::PresentationChain;
use crate::error::{PresentError, PresentResult};
use crate::frame::{FrameContext, FrameStats, FrameStatus};
use crate::resize::ResizeState;

type FrameCallback<D> = Box<dyn FnMut(&FrameContext<'_, D>) -> bool>;

/// Drives a presentation chain through acquire, record, submit and present.
pub struct FrameEngine<D: PresentDevice> {
    chain: Option<PresentationChain<D>>,
    device: Arc<D>,
    /// Window size the chain is built for; zero means "surface decides".
    requested_extent: vk::Extent2D,
    /// Slot whose fence and semaphores guard the next acquire.
    current_frame: usize,
    state: ResizeState,
    on_present: Option<FrameCallback<D>>,
    stats: FrameStats,
}

impl<D: PresentDevice> FrameEngine<D> {
    /// Builds the initial presentation chain for a surface of `extent`.
    ///
    /// # Errors
    ///
    /// Returns [`PresentError::Build`] if the chain cannot be built.
    pub fn new(device: Arc<D>, extent: vk::Extent2D) -> PresentResult<Self> {
        let chain = PresentationChain::build(device.clone(), extent)
            .map_err(|source| PresentError::Build { source })?;

        Ok(Self {
            chain: Some(chain),
            device,
            requested_extent: extent,
            current_frame: 0,
            state: ResizeState::Stable,
            on_present: None,
            stats: FrameStats::default(),
        })
    }

    /// Sets the per-frame callback. Returning `false` aborts the cycle.
    pub fn set_on_present(&mut self, callback: impl FnMut(&FrameContext<'_, D>) -> bool + 'static) {
        self.on_present = Some(Box::new(callback));
    }

    /// Records a surface size change; the rebuild happens at the next
    /// [`render`](Self::render). Zero sizes are ignored.
    pub fn notify_resize(&mut self, width: u32, height: u32) {
        if self.state.notify(width, height) {
            debug!("Resize to {}x{} pending", width, height);
        }
    }

    /// Rebuilds the chain now, at the pending extent if any, else the current one.
    ///
    /// # Errors
    ///
    /// [`PresentError::Fatal`] if the engine already failed, or
    /// [`PresentError::Build`] if this rebuild fails (the engine is then fatal).
    pub fn resize(&mut self) -> PresentResult<()> {
        if self.state.is_fatal() {
            return Err(PresentError::Fatal);
        }
        let extent = self.state.take_pending().unwrap_or(self.requested_extent);
        self.rebuild(extent)
    }

    /// Runs one present cycle.
    ///
    /// # Errors
    ///
    /// - [`PresentError::Fatal`] after a failed rebuild or submission
    /// - [`PresentError::NoCallback`] if no callback is set
    /// - [`PresentError::Aborted`] if the callback returned `false`
    /// - [`PresentError::Build`] if a rebuild during this call failed
    /// - [`PresentError::Rhi`] if acquire, begin, end or submit failed
    pub fn render(&mut self) -> PresentResult<FrameStatus> {
        if self.state.is_fatal() {
            return Err(PresentError::Fatal);
        }
        if self.on_present.is_none() {
            return Err(PresentError::NoCallback);
        }
        let Some(chain) = self.chain.as_ref() else {
            return Err(PresentError::Fatal);
        };

        let slot = self.current_frame;
        let swapchain = chain.swapchain();
        let slot_bundle = chain.bundle(slot);
        let slot_fence = slot_bundle.fence();
        let start_semaphore = slot_bundle.start_semaphore();
        let end_semaphore = slot_bundle.end_semaphore();

        log_failure(self.device.wait_for_fence(slot_fence));

        if let Some(extent) = self.state.take_pending() {
            self.rebuild(extent)?;
            return Ok(FrameStatus::Resized);
        }

        let image_index = match self.device.acquire_next_image(swapchain, start_semaphore) {
            Ok((index, false)) => index,
            Ok((_, true)) => {
                debug!("Swapchain suboptimal during acquire");
                return self.recover();
            }
            Err(e) if e.is_out_of_date() => {
                debug!("Swapchain out of date during acquire");
                return self.recover();
            }
            Err(e) => {
                error!("{}", e);
                return Err(e.into());
            }
        };
        let image = image_index as usize;

        let Some(chain) = self.chain.as_mut() else {
            return Err(PresentError::Fatal);
        };
        if let Some(writer) = chain.last_writer(image) {
            log_failure(self.device.wait_for_fence(chain.bundle(writer).fence()));
        }
        chain.set_last_writer(image, slot);

        let target = chain.bundle(image);
        let ctx = FrameContext {
            device: &*self.device,
            frame_index: image_index,
            slot,
            command_buffer: target.command_buffer(),
            framebuffer: target.framebuffer(),
            render_pass: chain.render_pass(),
            image: target.image(),
            extent: chain.extent(),
            format: chain.surface_format().format,
        };
        let command_buffer = ctx.command_buffer;

        if let Err(e) = self.device.begin_command_buffer(command_buffer) {
            error!("{}", e);
            self.abandon_cycle();
            return Err(e.into());
        }

        let recorded = match self.on_present.as_mut() {
            Some(on_present) => on_present(&ctx),
            None => false,
        };

        if !recorded {
            log_failure(self.device.end_command_buffer(command_buffer));
            self.stats.aborted += 1;
            self.abandon_cycle();
            warn!("Frame callback aborted image {} (slot {})", image_index, slot);
            return Err(PresentError::Aborted {
                frame_index: image_index,
            });
        }

        if let Err(e) = self.device.end_command_buffer(command_buffer) {
            error!("{}", e);
            self.abandon_cycle();
            return Err(e.into());
        }

        log_failure(self.device.reset_fence(slot_fence));

        let submit = SubmitInfo {
            command_buffer,
            wait_semaphore: start_semaphore,
            wait_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            signal_semaphore: end_semaphore,
            fence: slot_fence,
        };
        if let Err(e) = self.device.submit(&submit) {
            // The slot fence is reset and will never be signaled.
            error!("{}; presentation engine is now fatal", e);
            self.state = ResizeState::Fatal;
            return Err(e.into());
        }

        match self
            .device
            .queue_present(swapchain, image_index, end_semaphore)
        {
            Ok(false) => {}
            Ok(true) => {
                debug!("Swapchain suboptimal during present");
                self.stats.frames_presented += 1;
                return self.recover();
            }
            Err(e) if e.is_out_of_date() => {
                debug!("Swapchain out of date during present");
                return self.recover();
            }
            Err(e) => error!("{}", e),
        }

        self.stats.frames_presented += 1;
        self.current_frame = (slot + 1) % self.frame_count();
        Ok(FrameStatus::Presented)
    }

    /// Slot that guards the next acquire.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Number of images (and bundles) in the live chain; zero when fatal.
    pub fn frame_count(&self) -> usize {
        self.chain.as_ref().map_or(0, PresentationChain::len)
    }

    /// Extent of the live chain.
    pub fn extent(&self) -> Option<vk::Extent2D> {
        self.chain.as_ref().map(PresentationChain::extent)
    }

    /// Pixel format of the live chain.
    pub fn format(&self) -> Option<vk::Format> {
        self.chain.as_ref().map(|chain| chain.surface_format().format)
    }

    #[inline]
    pub fn chain(&self) -> Option<&PresentationChain<D>> {
        self.chain.as_ref()
    }

    #[inline]
    pub fn state(&self) -> ResizeState {
        self.state
    }

    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    #[inline]
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Reactive rebuild after a stale acquire or present.
    fn recover(&mut self) -> PresentResult<FrameStatus> {
        let extent = self.state.take_pending().unwrap_or(self.requested_extent);
        self.rebuild(extent)?;
        Ok(FrameStatus::Resized)
    }

    /// The acquired image was never presented and its start semaphore stays
    /// signaled; only a fresh chain gets back to a consistent state.
    fn abandon_cycle(&mut self) {
        self.state.invalidate(self.requested_extent);
    }

    fn rebuild(&mut self, extent: vk::Extent2D) -> PresentResult<()> {
        self.state = ResizeState::Rebuilding;
        log_failure(self.device.wait_idle());

        self.chain = None;
        match PresentationChain::build(self.device.clone(), extent) {
            Ok(chain) => {
                info!(
                    "Presentation chain rebuilt: {} images, {}x{}",
                    chain.len(),
                    chain.extent().width,
                    chain.extent().height
                );
                self.chain = Some(chain);
                self.requested_extent = extent;
                self.current_frame = 0;
                self.state = ResizeState::Stable;
                self.stats.rebuilds += 1;
                Ok(())
            }
            Err(source) => {
                error!("Presentation chain rebuild failed: {}", source);
                self.state = ResizeState::Fatal;
                Err(PresentError::Build { source })
            }
        }
    }
}

impl<D: PresentDevice> Drop for FrameEngine<D> {
    fn drop(&mut self) {
        if self.chain.is_some() {
            log_failure(self.device.wait_idle());
            self.chain = None;
        }
        debug!(
            "Frame engine dropped after {} frames, {} rebuilds",
            self.stats.frames_presented, self.stats.rebuilds
        );
    }
}

/// Best-effort calls: the failure is logged and the cycle continues.
fn log_failure(result: RhiResult<()>) {
    if let Err(e) = result {
        error!("{}", e);
    }
}
