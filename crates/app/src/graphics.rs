//! Vulkan stack for one window plus the demo frame callback.

use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use ash::vk;
use tracing::info;

use vkpresent_core::RenderConfig;
use vkpresent_engine::{FrameContext, FrameEngine};
use vkpresent_platform::Window;
use vkpresent_rhi::VulkanPresentDevice;
use vkpresent_rhi::command::CommandBuffer;
use vkpresent_rhi::device::Device;
use vkpresent_rhi::instance::Instance;
use vkpresent_rhi::physical_device::select_physical_device;
use vkpresent_rhi::surface::Surface;

/// Instance, device and frame engine for a window.
///
/// ManuallyDrop is used to ensure the engine (and with it the surface and
/// device it owns) is destroyed before the instance.
pub struct Graphics {
    engine: ManuallyDrop<FrameEngine<VulkanPresentDevice>>,
    instance: ManuallyDrop<Instance>,
}

impl Graphics {
    pub fn new(window: &Window, config: &RenderConfig) -> Result<Self> {
        let display = window.raw_display_handle()?;
        let instance = Instance::new(Some(display), config.validation)?;
        let surface = Surface::new(&instance, display, window.raw_window_handle()?)?;

        let gpu = select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &gpu)?;
        let present = Arc::new(VulkanPresentDevice::new(&instance, device, surface)?);

        let (width, height) = window.size();
        let mut engine = FrameEngine::new(present, vk::Extent2D { width, height })?;
        engine.set_on_present(clear_screen(config));

        if let Some(chain) = engine.chain() {
            info!(
                "Graphics ready: {} images, {:?}, {:?}, validation {}",
                chain.len(),
                chain.surface_format().format,
                chain.present_mode(),
                instance.has_validation()
            );
        }

        Ok(Self {
            engine: ManuallyDrop::new(engine),
            instance: ManuallyDrop::new(instance),
        })
    }

    pub fn engine(&self) -> &FrameEngine<VulkanPresentDevice> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FrameEngine<VulkanPresentDevice> {
        &mut self.engine
    }
}

impl Drop for Graphics {
    fn drop(&mut self) {
        // SAFETY: each field is dropped exactly once, engine before instance.
        unsafe {
            ManuallyDrop::drop(&mut self.engine);
            ManuallyDrop::drop(&mut self.instance);
        }
    }
}

/// Frame callback that clears the whole framebuffer.
fn clear_screen(
    config: &RenderConfig,
) -> impl FnMut(&FrameContext<'_, VulkanPresentDevice>) -> bool + 'static {
    let base = config.clear_color;
    let animate = config.animate;
    let start = Instant::now();

    move |ctx| {
        let color = if animate {
            pulse(base, start.elapsed().as_secs_f32())
        } else {
            base
        };

        let cmd = CommandBuffer::from_handle(ctx.device().device().clone(), ctx.command_buffer());
        cmd.begin_render_pass(ctx.render_pass(), ctx.framebuffer(), ctx.render_area(), color);
        cmd.end_render_pass();
        true
    }
}

/// Mixes `base` with a color that slowly cycles over time. Components stay in [0, 1].
pub fn pulse(base: [f32; 4], seconds: f32) -> [f32; 4] {
    let phase = seconds * 0.5;
    let wave = |offset: f32| 0.5 + 0.5 * (phase + offset).sin();
    let cycle = [wave(0.0), wave(2.094), wave(4.189)];

    [
        (base[0] * 0.5 + cycle[0] * 0.5).clamp(0.0, 1.0),
        (base[1] * 0.5 + cycle[1] * 0.5).clamp(0.0, 1.0),
        (base[2] * 0.5 + cycle[2] * 0.5).clamp(0.0, 1.0),
        base[3],
    ]
}
