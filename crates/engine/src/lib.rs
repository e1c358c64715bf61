//! Frame presentation engine.
//!
//! This crate owns everything between "the window has a surface" and "pixels
//! are queued for the display":
//! - One resource bundle per swapchain image
//! - The presentation chain builder
//! - The present loop and its fence/semaphore discipline
//! - The resize state machine that rebuilds the chain in place
//!
//! It talks to the GPU only through [`vkpresent_rhi::PresentDevice`].

mod bundle;
mod chain;
mod engine;
mod error;
mod frame;
mod resize;

pub use bundle::FrameResourceBundle;
pub use chain::PresentationChain;
pub use engine::FrameEngine;
pub use error::{PresentError, PresentResult};
pub use frame::{FrameContext, FrameStats, FrameStatus};
pub use resize::ResizeState;
