//! Configuration loaded from `vkpresent.toml`.
//!
//! Every field has a default, so a partial (or missing) file is fine. A file
//! that exists but does not parse is reported as [`Error::Config`].

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub log: LogConfig,
}

/// Initial window settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "vkpresent".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Settings for the demo frame callback and the Vulkan instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// RGBA clear color used by the demo callback.
    pub clear_color: [f32; 4],
    /// Pulse the clear color over time instead of holding it constant.
    pub animate: bool,
    /// Request `VK_LAYER_KHRONOS_validation`.
    pub validation: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 0.0],
            animate: true,
            validation: cfg!(debug_assertions),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives. `RUST_LOG` takes precedence.
    pub filter: Option<String>,
}

impl Config {
    /// Default configuration file name, looked up in the working directory.
    pub const FILE_NAME: &'static str = "vkpresent.toml";

    /// Loads the configuration from `path`; a missing file yields defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(Error::Config(format!(
                "window size must be nonzero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if let Some(bad) = self
            .render
            .clear_color
            .iter()
            .find(|c| !(0.0..=1.0).contains(*c))
        {
            return Err(Error::Config(format!(
                "clear_color components must be within [0, 1], got {bad}"
            )));
        }
        Ok(())
    }
}
