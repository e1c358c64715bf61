//! Presentation chain: the swapchain, its render pass and one bundle per image.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};
use vkpresent_rhi::{PresentDevice, RhiResult, SwapchainDesc};

use crate::bundle::FrameResourceBundle;

/// A live swapchain with everything the present loop needs per image.
///
/// Dropping the chain releases the bundles (in order), then the render pass,
/// then the swapchain. The device must be idle when that happens.
pub struct PresentationChain<D: PresentDevice> {
    device: Arc<D>,
    swapchain: vk::SwapchainKHR,
    render_pass: vk::RenderPass,
    bundles: Vec<FrameResourceBundle<D>>,
    /// Image index -> slot that last submitted work rendering into that image.
    last_writer: Vec<Option<usize>>,
    desc: SwapchainDesc,
}

impl<D: PresentDevice> PresentationChain<D> {
    /// Builds a chain sized to `requested` (a zero dimension means "use what
    /// the surface reports").
    ///
    /// # Errors
    ///
    /// Fails if the surface reports no formats, the swapchain is rejected, or
    /// any per-image resource cannot be created. Whatever the attempt created
    /// has been released when the error is returned.
    pub fn build(device: Arc<D>, requested: vk::Extent2D) -> RhiResult<Self> {
        let support = device.surface_support()?;
        let desc = SwapchainDesc::from_support(&support, requested)?;

        let swapchain = device.create_swapchain(&desc)?;
        let mut chain = Self {
            device,
            swapchain,
            render_pass: vk::RenderPass::null(),
            bundles: Vec::new(),
            last_writer: Vec::new(),
            desc,
        };

        let images = chain.device.swapchain_images(swapchain)?;
        chain.render_pass = chain
            .device
            .create_render_pass(desc.surface_format.format)?;

        chain.bundles.reserve_exact(images.len());
        for (index, &image) in images.iter().enumerate() {
            let bundle = FrameResourceBundle::new(
                chain.device.clone(),
                image,
                desc.surface_format.format,
                chain.render_pass,
                desc.extent,
            )?;
            debug!("Created resource bundle for image {}", index);
            chain.bundles.push(bundle);
        }
        chain.last_writer = vec![None; images.len()];

        info!(
            "Presentation chain built: {} images, {}x{}, {:?}, {:?}",
            chain.bundles.len(),
            desc.extent.width,
            desc.extent.height,
            desc.surface_format.format,
            desc.present_mode
        );

        Ok(chain)
    }

    #[inline]
    pub fn swapchain(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    #[inline]
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Number of bundles, equal to the number of swapchain images.
    #[inline]
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    #[inline]
    pub fn bundle(&self, index: usize) -> &FrameResourceBundle<D> {
        &self.bundles[index]
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.desc.extent
    }

    #[inline]
    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.desc.surface_format
    }

    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.desc.present_mode
    }

    /// Slot that last rendered into `image_index`, if any since the build.
    #[inline]
    pub fn last_writer(&self, image_index: usize) -> Option<usize> {
        self.last_writer[image_index]
    }

    /// Records `slot` as the last writer of `image_index`, returning the previous one.
    pub(crate) fn set_last_writer(&mut self, image_index: usize, slot: usize) -> Option<usize> {
        self.last_writer[image_index].replace(slot)
    }
}

impl<D: PresentDevice> Drop for PresentationChain<D> {
    fn drop(&mut self) {
        self.bundles.clear();
        if self.render_pass != vk::RenderPass::null() {
            self.device.destroy_render_pass(self.render_pass);
        }
        self.device.destroy_swapchain(self.swapchain);
        debug!("Presentation chain destroyed");
    }
}
