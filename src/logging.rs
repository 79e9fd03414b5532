//! Structured Logging Setup
//!
//! Installs the global `tracing` subscriber used by the CLI. The level
//! comes from the config file (or `--verbose`) and can be refined per
//! module with `RUST_LOG`.

use anyhow::{bail, Result};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Output format of the subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => bail!("Invalid log format: {}. Must be one of: json, pretty, compact", other),
        }
    }
}

/// Build the env filter: `RUST_LOG` directives on top of `level`
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Install the global subscriber. Logs go to stderr so stdout stays
/// reserved for command output.
pub fn init(level: Level, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr);

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
