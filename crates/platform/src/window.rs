//! Window management using winit.
//!
//! [`Window`] is the presentation surface: it owns the winit window, tracks the
//! drawable size, and turns protocol events into [`SurfaceEvent`]s for its
//! listeners.

use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as WinitWindow, WindowAttributes};

use vkpresent_core::{Error, Result, WindowConfig};

use crate::events::{SurfaceEvent, SurfaceEventKind, SurfaceListeners};

/// Drawable size and intents of a surface, independent of the windowing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceState {
    width: u32,
    height: u32,
    pending_resize: Option<(u32, u32)>,
    close_requested: bool,
}

impl SurfaceState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pending_resize: None,
            close_requested: false,
        }
    }

    /// Records `event`. A newer resize replaces an untaken one.
    pub fn apply(&mut self, event: &SurfaceEvent) {
        match *event {
            SurfaceEvent::Resized { width, height } => {
                if (width, height) != (self.width, self.height) || self.pending_resize.is_some() {
                    self.pending_resize = Some((width, height));
                }
                self.width = width;
                self.height = height;
            }
            SurfaceEvent::CloseRequested => self.close_requested = true,
        }
    }

    /// Current drawable size in physical pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Takes the most recent unconsumed resize.
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.pending_resize.take()
    }

    #[inline]
    pub fn is_close_requested(&self) -> bool {
        self.close_requested
    }

    /// Both dimensions nonzero; false while minimized.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.width != 0 && self.height != 0
    }
}

/// A window wrapper that provides the presentation surface for the engine.
pub struct Window {
    window: Arc<WinitWindow>,
    state: SurfaceState,
    listeners: SurfaceListeners,
}

impl Window {
    /// Create a new window from its configuration.
    pub fn new(event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Self> {
        let attrs = WindowAttributes::default()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(true);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::Window(e.to_string()))?;

        // The compositor may not honor the requested size.
        let size = window.inner_size();
        info!(
            "Window created: {}x{} (requested {}x{})",
            size.width, size.height, config.width, config.height
        );

        Ok(Self {
            window: Arc::new(window),
            state: SurfaceState::new(size.width, size.height),
            listeners: SurfaceListeners::new(),
        })
    }

    /// Get a reference to the underlying winit window.
    pub fn inner(&self) -> &WinitWindow {
        &self.window
    }

    /// Current drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.state.size()
    }

    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    /// Takes the most recent resize not yet handed to the engine.
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.state.take_resize()
    }

    pub fn is_close_requested(&self) -> bool {
        self.state.is_close_requested()
    }

    /// Registers a listener for surface events of `kind`.
    pub fn on(&mut self, kind: SurfaceEventKind, listener: impl FnMut(&SurfaceEvent) + 'static) {
        self.listeners.on(kind, listener);
    }

    /// Feeds a winit event through the surface: updates size state and runs
    /// the matching listeners. Returns the surface event, if any.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<SurfaceEvent> {
        let surface_event = SurfaceEvent::from_window_event(event)?;
        debug!("Surface event: {:?}", surface_event);

        self.state.apply(&surface_event);
        self.listeners.dispatch(&surface_event);
        Some(surface_event)
    }

    /// Raw display handle, for instance extension selection and surface creation.
    pub fn raw_display_handle(&self) -> Result<RawDisplayHandle> {
        self.window
            .display_handle()
            .map(|handle| handle.as_raw())
            .map_err(|e| Error::Window(format!("Failed to get display handle: {}", e)))
    }

    /// Raw window handle, for surface creation.
    pub fn raw_window_handle(&self) -> Result<RawWindowHandle> {
        self.window
            .window_handle()
            .map(|handle| handle.as_raw())
            .map_err(|e| Error::Window(format!("Failed to get window handle: {}", e)))
    }

    /// Request a redraw of the window.
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}
