//! Core utilities shared across the vkpresent workspace.
//!
//! This crate provides foundational types used by the other crates:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing
//! - Configuration loading

mod config;
mod error;
mod logging;
mod timer;

pub use config::{Config, LogConfig, RenderConfig, WindowConfig};
pub use error::{Error, Result};
pub use logging::{DEFAULT_LOG_FILTER, init_logging};
pub use timer::FrameTimer;
