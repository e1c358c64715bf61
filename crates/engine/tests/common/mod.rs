//! Scripted in-memory `PresentDevice` for driving the engine without a GPU.
//!
//! The mock hands out fresh handles, tracks which objects are alive, models
//! fence state (a submitted fence completes when it is waited on or when the
//! device goes idle) and records every call in a trace. Rule breaks that would
//! hang or corrupt a real device are collected as violations.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use ash::vk::{self, Handle};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use vkpresent_engine::FrameEngine;
use vkpresent_rhi::{PresentDevice, RhiError, RhiResult, SubmitInfo, SurfaceSupport, SwapchainDesc};

pub const WIDTH: u32 = 1280;
pub const HEIGHT: u32 = 720;

pub fn extent(width: u32, height: u32) -> vk::Extent2D {
    vk::Extent2D { width, height }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Layer keeping the message of every `ERROR` event.
#[derive(Clone, Default)]
struct ErrorLog(Arc<Mutex<Vec<String>>>);

struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for ErrorLog {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            let mut message = String::new();
            event.record(&mut MessageVisitor(&mut message));
            self.0.lock().unwrap().push(message);
        }
    }
}

/// Runs `f` under a thread-local subscriber and returns the `error!` messages it logged.
pub fn capture_errors<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let log = ErrorLog::default();
    let subscriber = tracing_subscriber::registry().with(log.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    let messages = log.0.lock().unwrap().clone();
    (result, messages)
}

/// Object kinds the mock creates, used for live counts and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Swapchain,
    SwapchainImages,
    RenderPass,
    ImageView,
    Framebuffer,
    CommandBuffer,
    Semaphore,
    Fence,
}

impl Kind {
    /// Vulkan entry point a real device would call to create this kind.
    fn create_call(self) -> &'static str {
        match self {
            Kind::Swapchain => "vkCreateSwapchainKHR",
            Kind::SwapchainImages => "vkGetSwapchainImagesKHR",
            Kind::RenderPass => "vkCreateRenderPass",
            Kind::ImageView => "vkCreateImageView",
            Kind::Framebuffer => "vkCreateFramebuffer",
            Kind::CommandBuffer => "vkAllocateCommandBuffers",
            Kind::Semaphore => "vkCreateSemaphore",
            Kind::Fence => "vkCreateFence",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceState {
    Signaled,
    Unsignaled,
    /// Submitted, GPU work not yet observed complete.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    SurfaceSupport,
    Create(Kind, u64),
    Destroy(Kind, u64),
    WaitFence(u64),
    ResetFence(u64),
    WaitIdle,
    Acquire { semaphore: u64 },
    Begin(u64),
    End(u64),
    Submit { command_buffer: u64, fence: u64 },
    Present { image_index: u32 },
}

/// Scripted result of the next acquire.
#[derive(Debug, Clone, Copy)]
pub enum AcquireScript {
    Image(u32),
    Suboptimal(u32),
    OutOfDate,
    Error(vk::Result),
}

/// Scripted result of the next present.
#[derive(Debug, Clone, Copy)]
pub enum PresentScript {
    Ok,
    Suboptimal,
    OutOfDate,
    Error(vk::Result),
}

struct Inner {
    next_handle: u64,
    support: SurfaceSupport,
    live: HashMap<Kind, HashSet<u64>>,
    fences: HashMap<u64, FenceState>,
    /// Command buffer -> fence of its last submission.
    guards: HashMap<u64, u64>,
    recording: HashSet<u64>,
    swapchain_images: HashMap<u64, u32>,
    swapchain_extents: Vec<vk::Extent2D>,
    next_image: u32,
    acquire_script: VecDeque<AcquireScript>,
    present_script: VecDeque<PresentScript>,
    failures: HashMap<Kind, usize>,
    fail_submit: bool,
    fail_begin: bool,
    fail_end: bool,
    trace: Vec<Call>,
    violations: Vec<String>,
    max_other_pending: usize,
}

pub struct MockDevice {
    inner: RefCell<Inner>,
}

impl MockDevice {
    /// A surface offering BGRA8, MAILBOX and 2..=8 images at 1280x720.
    pub fn new() -> Arc<Self> {
        let support = SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: extent(WIDTH, HEIGHT),
                min_image_extent: extent(1, 1),
                max_image_extent: extent(4096, 4096),
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE
                    | vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
                ..Default::default()
            },
            formats: vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::R8G8B8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        };

        Arc::new(Self {
            inner: RefCell::new(Inner {
                next_handle: 1,
                support,
                live: HashMap::new(),
                fences: HashMap::new(),
                guards: HashMap::new(),
                recording: HashSet::new(),
                swapchain_images: HashMap::new(),
                swapchain_extents: Vec::new(),
                next_image: 0,
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                failures: HashMap::new(),
                fail_submit: false,
                fail_begin: false,
                fail_end: false,
                trace: Vec::new(),
                violations: Vec::new(),
                max_other_pending: 0,
            }),
        })
    }

    /// Builds an engine on `device` for a 1280x720 window with an always-succeeding callback.
    pub fn engine(device: &Arc<Self>) -> FrameEngine<Self> {
        init_tracing();
        let mut engine = match FrameEngine::new(device.clone(), extent(WIDTH, HEIGHT)) {
            Ok(engine) => engine,
            Err(e) => panic!("engine build failed: {e}"),
        };
        engine.set_on_present(|_| true);
        engine
    }

    // ---------------------------------------------------------------------
    // Scripting
    // ---------------------------------------------------------------------

    pub fn set_capabilities(&self, update: impl FnOnce(&mut vk::SurfaceCapabilitiesKHR)) {
        update(&mut self.inner.borrow_mut().support.capabilities);
    }

    pub fn set_formats(&self, formats: Vec<vk::SurfaceFormatKHR>) {
        self.inner.borrow_mut().support.formats = formats;
    }

    pub fn script_acquire(&self, script: impl IntoIterator<Item = AcquireScript>) {
        self.inner.borrow_mut().acquire_script.extend(script);
    }

    pub fn script_present(&self, script: impl IntoIterator<Item = PresentScript>) {
        self.inner.borrow_mut().present_script.extend(script);
    }

    /// Makes the `nth` (0-based) creation of `kind` from now on fail.
    pub fn fail_create(&self, kind: Kind, nth: usize) {
        self.inner.borrow_mut().failures.insert(kind, nth);
    }

    pub fn fail_next_submit(&self) {
        self.inner.borrow_mut().fail_submit = true;
    }

    pub fn fail_next_begin(&self) {
        self.inner.borrow_mut().fail_begin = true;
    }

    pub fn fail_next_end(&self) {
        self.inner.borrow_mut().fail_end = true;
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    pub fn trace(&self) -> Vec<Call> {
        self.inner.borrow().trace.clone()
    }

    pub fn clear_trace(&self) {
        self.inner.borrow_mut().trace.clear();
    }

    pub fn live(&self, kind: Kind) -> usize {
        self.inner.borrow().live.get(&kind).map_or(0, HashSet::len)
    }

    pub fn live_total(&self) -> usize {
        self.inner.borrow().live.values().map(HashSet::len).sum()
    }

    pub fn violations(&self) -> Vec<String> {
        self.inner.borrow().violations.clone()
    }

    pub fn fence_state(&self, fence: vk::Fence) -> Option<FenceState> {
        self.inner.borrow().fences.get(&fence.as_raw()).copied()
    }

    /// Largest number of *other* fences pending at any submission.
    pub fn max_other_pending(&self) -> usize {
        self.inner.borrow().max_other_pending
    }

    /// Extents of every swapchain created so far.
    pub fn swapchain_extents(&self) -> Vec<vk::Extent2D> {
        self.inner.borrow().swapchain_extents.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.inner.borrow().trace.iter().filter(|c| predicate(c)).count()
    }

    pub fn submits(&self) -> usize {
        self.count(|c| matches!(c, Call::Submit { .. }))
    }

    pub fn presents(&self) -> usize {
        self.count(|c| matches!(c, Call::Present { .. }))
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn create(&self, kind: Kind) -> RhiResult<u64> {
        let mut inner = self.inner.borrow_mut();
        if let Some(remaining) = inner.failures.get_mut(&kind) {
            if *remaining == 0 {
                inner.failures.remove(&kind);
                return Err(RhiError::Call {
                    call: kind.create_call(),
                    result: vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
                });
            }
            *remaining -= 1;
        }

        let handle = inner.next_handle;
        inner.next_handle += 1;
        if kind != Kind::SwapchainImages {
            inner.live.entry(kind).or_default().insert(handle);
            inner.trace.push(Call::Create(kind, handle));
        }
        Ok(handle)
    }

    fn destroy(&self, kind: Kind, handle: u64) {
        let mut inner = self.inner.borrow_mut();
        let removed = inner
            .live
            .get_mut(&kind)
            .is_some_and(|set| set.remove(&handle));
        if !removed {
            inner
                .violations
                .push(format!("destroy of unknown {kind:?} {handle}"));
        }
        inner.trace.push(Call::Destroy(kind, handle));
    }
}

impl PresentDevice for MockDevice {
    fn surface_support(&self) -> RhiResult<SurfaceSupport> {
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(Call::SurfaceSupport);
        Ok(inner.support.clone())
    }

    fn create_swapchain(&self, desc: &SwapchainDesc) -> RhiResult<vk::SwapchainKHR> {
        let handle = self.create(Kind::Swapchain)?;
        let mut inner = self.inner.borrow_mut();
        inner.swapchain_images.insert(handle, desc.image_count);
        inner.swapchain_extents.push(desc.extent);
        inner.next_image = 0;
        Ok(vk::SwapchainKHR::from_raw(handle))
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> RhiResult<Vec<vk::Image>> {
        let count = self.inner.borrow().swapchain_images[&swapchain.as_raw()];
        (0..count)
            .map(|_| self.create(Kind::SwapchainImages).map(vk::Image::from_raw))
            .collect()
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        self.destroy(Kind::Swapchain, swapchain.as_raw());
    }

    fn create_render_pass(&self, _format: vk::Format) -> RhiResult<vk::RenderPass> {
        self.create(Kind::RenderPass).map(vk::RenderPass::from_raw)
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.destroy(Kind::RenderPass, render_pass.as_raw());
    }

    fn create_image_view(&self, _image: vk::Image, _format: vk::Format) -> RhiResult<vk::ImageView> {
        self.create(Kind::ImageView).map(vk::ImageView::from_raw)
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        self.destroy(Kind::ImageView, view.as_raw());
    }

    fn create_framebuffer(
        &self,
        _render_pass: vk::RenderPass,
        _view: vk::ImageView,
        _extent: vk::Extent2D,
    ) -> RhiResult<vk::Framebuffer> {
        self.create(Kind::Framebuffer).map(vk::Framebuffer::from_raw)
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.destroy(Kind::Framebuffer, framebuffer.as_raw());
    }

    fn allocate_command_buffer(&self) -> RhiResult<vk::CommandBuffer> {
        self.create(Kind::CommandBuffer).map(vk::CommandBuffer::from_raw)
    }

    fn free_command_buffer(&self, command_buffer: vk::CommandBuffer) {
        let raw = command_buffer.as_raw();
        {
            let mut inner = self.inner.borrow_mut();
            let in_flight = inner
                .guards
                .get(&raw)
                .is_some_and(|fence| inner.fences.get(fence) == Some(&FenceState::Pending));
            if in_flight {
                inner
                    .violations
                    .push(format!("free of command buffer {raw} while in flight"));
            }
        }
        self.destroy(Kind::CommandBuffer, raw);
    }

    fn create_semaphore(&self) -> RhiResult<vk::Semaphore> {
        self.create(Kind::Semaphore).map(vk::Semaphore::from_raw)
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.destroy(Kind::Semaphore, semaphore.as_raw());
    }

    fn create_fence(&self, signaled: bool) -> RhiResult<vk::Fence> {
        let handle = self.create(Kind::Fence)?;
        let state = if signaled {
            FenceState::Signaled
        } else {
            FenceState::Unsignaled
        };
        self.inner.borrow_mut().fences.insert(handle, state);
        Ok(vk::Fence::from_raw(handle))
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        let raw = fence.as_raw();
        let state = self.inner.borrow_mut().fences.remove(&raw);
        if state == Some(FenceState::Pending) {
            self.inner
                .borrow_mut()
                .violations
                .push(format!("destroy of pending fence {raw}"));
        }
        self.destroy(Kind::Fence, raw);
    }

    fn wait_for_fence(&self, fence: vk::Fence) -> RhiResult<()> {
        let raw = fence.as_raw();
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(Call::WaitFence(raw));
        match inner.fences.get(&raw).copied() {
            Some(FenceState::Pending) | Some(FenceState::Signaled) => {
                inner.fences.insert(raw, FenceState::Signaled);
            }
            Some(FenceState::Unsignaled) => inner
                .violations
                .push(format!("wait on fence {raw} that was never submitted")),
            None => inner.violations.push(format!("wait on unknown fence {raw}")),
        }
        Ok(())
    }

    fn reset_fence(&self, fence: vk::Fence) -> RhiResult<()> {
        let raw = fence.as_raw();
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(Call::ResetFence(raw));
        if inner.fences.get(&raw) == Some(&FenceState::Pending) {
            inner.violations.push(format!("reset of pending fence {raw}"));
        }
        inner.fences.insert(raw, FenceState::Unsignaled);
        Ok(())
    }

    fn wait_idle(&self) -> RhiResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(Call::WaitIdle);
        for state in inner.fences.values_mut() {
            if *state == FenceState::Pending {
                *state = FenceState::Signaled;
            }
        }
        Ok(())
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        semaphore: vk::Semaphore,
    ) -> RhiResult<(u32, bool)> {
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(Call::Acquire {
            semaphore: semaphore.as_raw(),
        });

        let stale = |result| RhiError::Call {
            call: "vkAcquireNextImageKHR",
            result,
        };
        match inner.acquire_script.pop_front() {
            Some(AcquireScript::Image(index)) => Ok((index, false)),
            Some(AcquireScript::Suboptimal(index)) => Ok((index, true)),
            Some(AcquireScript::OutOfDate) => Err(stale(vk::Result::ERROR_OUT_OF_DATE_KHR)),
            Some(AcquireScript::Error(result)) => Err(stale(result)),
            None => {
                let count = inner.swapchain_images[&swapchain.as_raw()];
                let index = inner.next_image % count;
                inner.next_image += 1;
                Ok((index, false))
            }
        }
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> RhiResult<()> {
        let raw = command_buffer.as_raw();
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(Call::Begin(raw));
        if std::mem::take(&mut inner.fail_begin) {
            return Err(RhiError::Call {
                call: "vkBeginCommandBuffer",
                result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
            });
        }

        if let Some(&fence) = inner.guards.get(&raw) {
            let state = inner.fences.get(&fence).copied();
            if state != Some(FenceState::Signaled) {
                inner.violations.push(format!(
                    "begin of command buffer {raw} while its fence {fence} is {state:?}"
                ));
            }
        }
        if !inner.recording.insert(raw) {
            inner
                .violations
                .push(format!("begin of command buffer {raw} that is still recording"));
        }
        Ok(())
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> RhiResult<()> {
        let raw = command_buffer.as_raw();
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(Call::End(raw));
        if !inner.recording.remove(&raw) {
            inner
                .violations
                .push(format!("end of command buffer {raw} that is not recording"));
        }
        // A failed end leaves the buffer invalid; it is not recording either way.
        if std::mem::take(&mut inner.fail_end) {
            return Err(RhiError::Call {
                call: "vkEndCommandBuffer",
                result: vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
            });
        }
        Ok(())
    }

    fn submit(&self, info: &SubmitInfo) -> RhiResult<()> {
        let command_buffer = info.command_buffer.as_raw();
        let fence = info.fence.as_raw();
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(Call::Submit {
            command_buffer,
            fence,
        });

        if std::mem::take(&mut inner.fail_submit) {
            return Err(RhiError::Call {
                call: "vkQueueSubmit",
                result: vk::Result::ERROR_DEVICE_LOST,
            });
        }

        if inner.fences.get(&fence) != Some(&FenceState::Unsignaled) {
            inner
                .violations
                .push(format!("submit with fence {fence} not reset"));
        }
        if inner.recording.contains(&command_buffer) {
            inner
                .violations
                .push(format!("submit of command buffer {command_buffer} still recording"));
        }

        let other_pending = inner
            .fences
            .iter()
            .filter(|&(&f, &state)| f != fence && state == FenceState::Pending)
            .count();
        inner.max_other_pending = inner.max_other_pending.max(other_pending);

        inner.fences.insert(fence, FenceState::Pending);
        inner.guards.insert(command_buffer, fence);
        Ok(())
    }

    fn queue_present(
        &self,
        _swapchain: vk::SwapchainKHR,
        image_index: u32,
        _wait_semaphore: vk::Semaphore,
    ) -> RhiResult<bool> {
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(Call::Present { image_index });

        let failed = |result| RhiError::Call {
            call: "vkQueuePresentKHR",
            result,
        };
        match inner.present_script.pop_front() {
            None | Some(PresentScript::Ok) => Ok(false),
            Some(PresentScript::Suboptimal) => Ok(true),
            Some(PresentScript::OutOfDate) => Err(failed(vk::Result::ERROR_OUT_OF_DATE_KHR)),
            Some(PresentScript::Error(result)) => Err(failed(result)),
        }
    }
}
