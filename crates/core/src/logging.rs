//! Logging initialization and configuration.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when neither `RUST_LOG` nor the configuration provide one.
pub const DEFAULT_LOG_FILTER: &str = "info,vkpresent=debug,vkpresent_engine=debug";

/// Initialize the logging system with tracing.
///
/// `RUST_LOG` wins over `filter`; `filter` wins over [`DEFAULT_LOG_FILTER`].
/// An unparsable `filter` falls back to the default with a warning.
///
/// # Example
/// ```
/// vkpresent_core::init_logging(None);
/// tracing::info!("Presentation engine starting");
/// ```
pub fn init_logging(filter: Option<&str>) {
    let mut rejected = None;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match filter {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            rejected = Some(format!("{directives:?}: {e}"));
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }),
        None => EnvFilter::new(DEFAULT_LOG_FILTER),
    });

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();

    if let Some(reason) = rejected {
        tracing::warn!("Ignoring invalid log filter {}", reason);
    }
}
