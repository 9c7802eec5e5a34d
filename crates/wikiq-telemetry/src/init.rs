//! Logging initialisation and configuration.
//!
//! # Design
//! - Single entry point installing an `EnvFilter` plus a fmt or JSON layer.
//! - Logs go to stderr; stdout belongs to command output.
//! - Records the build identifier once so every span reports the same value.

use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when neither `RUST_LOG` nor an explicit level is provided.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level` when set.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be installed (for example,
/// because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    BUILD_SHA
        .set(config.build_sha.to_string())
        .ok()
        .or(Some(()));

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init()
            .map_err(|err| anyhow!("failed to install tracing subscriber: {err}")),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init()
            .map_err(|err| anyhow!("failed to install tracing subscriber: {err}")),
    }
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive (e.g., `warn`, `wikiq_session=debug`).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Build identifier recorded in structured logs.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: build_sha(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable log lines.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Parse a format label; unknown labels fall back to [`LogFormat::infer`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" | "text" => Self::Pretty,
            _ => Self::infer(),
        }
    }
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
