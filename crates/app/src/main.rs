//! vkpresent - presents cleared frames to a window.
//!
//! Opens one window, builds the presentation chain for it and drives the
//! present loop from the winit event loop until the window closes.

mod graphics;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use vkpresent_core::{Config, FrameTimer};
use vkpresent_engine::{FrameStatus, PresentResult};
use vkpresent_platform::{SurfaceEvent, SurfaceEventKind, Window};

use graphics::Graphics;

#[derive(Debug, Parser)]
#[command(version, about = "Presents frames to a window through a Vulkan swapchain")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = Config::FILE_NAME)]
    config: PathBuf,

    /// Exit after this many presented frames
    #[arg(long)]
    frames: Option<u64>,
}

struct App {
    config: Config,
    // Dropped before the window so the surface never outlives it.
    graphics: Option<Graphics>,
    window: Option<Window>,
    timer: FrameTimer,
    frames: u64,
    limit: Option<u64>,
    /// Why the loop stopped early; reported by `main` once the loop returns.
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config, limit: Option<u64>) -> Self {
        Self {
            config,
            graphics: None,
            window: None,
            timer: FrameTimer::new(),
            frames: 0,
            limit,
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut window = Window::new(event_loop, &self.config.window)?;
        window.on(SurfaceEventKind::Resized, |event| {
            if let SurfaceEvent::Resized { width, height } = event {
                debug!("Surface resized to {}x{}", width, height);
            }
        });
        window.on(SurfaceEventKind::CloseRequested, |_| {
            info!("Close requested, shutting down");
        });

        let graphics = Graphics::new(&window, &self.config.render)?;
        self.graphics = Some(graphics);
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(graphics)) = (self.window.as_mut(), self.graphics.as_mut()) else {
            return;
        };

        let engine = graphics.engine_mut();
        if let Some((width, height)) = window.take_resize() {
            engine.notify_resize(width, height);
        }
        if !window.state().is_drawable() {
            return;
        }

        let result = engine.render();
        if !self.after_render(result) {
            event_loop.exit();
        }
    }

    /// Accounts for one `render` result. Returns `false` once the loop must stop:
    /// the frame limit is reached or rendering failed.
    fn after_render(&mut self, result: PresentResult<FrameStatus>) -> bool {
        match result {
            Ok(FrameStatus::Presented) => {
                self.frames += 1;
                if let Some(fps) = self.timer.frame() {
                    debug!("{:.1} fps", fps);
                }
                if self.limit.is_some_and(|limit| self.frames >= limit) {
                    info!("Presented {} frames, exiting", self.frames);
                    return false;
                }
                true
            }
            Ok(FrameStatus::Resized) => {
                debug!("Presentation chain rebuilt");
                true
            }
            Err(e) => {
                error!("Presentation stopped: {}", e);
                self.failure = Some(anyhow::Error::new(e).context("rendering failed"));
                false
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(()) => info!("Initialization complete, entering main loop"),
            Err(e) => {
                error!("Failed to initialize: {:?}", e);
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        window.handle_event(&event);

        if window.is_close_requested() {
            event_loop.exit();
            return;
        }
        if let WindowEvent::RedrawRequested = event {
            self.redraw(event_loop);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref graphics) = self.graphics {
            let stats = graphics.engine().stats();
            info!(
                "Exiting after {:.1}s: {} frames presented, {} rebuilds, {} aborted",
                self.timer.elapsed_secs(),
                stats.frames_presented,
                stats.rebuilds,
                stats.aborted
            );
        }
        self.graphics = None;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load_from_path(&args.config)?;

    vkpresent_core::init_logging(config.log.filter.as_deref());
    info!("Starting vkpresent");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, args.frames);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}
