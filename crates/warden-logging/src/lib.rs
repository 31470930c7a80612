//! Log subscriber setup.
//!
//! Routine lines (audit output, warnings, progress) go to stdout and fatal
//! errors to stderr, so a scheduler's mail of the run keeps both.
//! `RUST_LOG` overrides the configured level when set.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Errors setting up logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {directive:?}: {reason}")]
    Filter { directive: String, reason: String },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// How to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `warden_reconcile=debug`
    pub level: String,
    /// One JSON object per line instead of human-readable text
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Pick the filter: `env` (the value of `RUST_LOG`) wins over `level`.
pub fn build_filter(level: &str, env: Option<&str>) -> Result<EnvFilter, LoggingError> {
    let directive = match env {
        Some(env) if !env.trim().is_empty() => env,
        _ => level,
    };
    EnvFilter::try_new(directive).map_err(|e| LoggingError::Filter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber.
pub fn init(settings: &LogSettings) -> Result<(), LoggingError> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(&settings.level, env.as_deref())?;
    let writer = std::io::stderr
        .with_max_level(Level::ERROR)
        .or_else(std::io::stdout);

    if settings.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(writer),
            )
            .try_init()?;
    }
    Ok(())
}
