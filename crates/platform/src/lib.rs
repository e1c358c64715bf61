//! Platform layer for vkpresent.
//!
//! This crate provides the presentation surface side:
//! - Window management via winit
//! - Drawable size tracking and resize/close intents
//! - A registration table of surface event listeners
//! - Raw window handles for Vulkan surface creation

mod events;
mod window;

pub use events::{SurfaceEvent, SurfaceEventKind, SurfaceListeners};
pub use window::{SurfaceState, Window};

// Re-export winit types that users might need
pub use winit::event::WindowEvent;
pub use winit::event_loop::EventLoop;
