//! Logging setup on top of tracing-subscriber

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{VideoForgeError, VideoForgeResult};

/// Levels accepted in configuration and on the command line
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Single-line text format
    #[default]
    Compact,
    /// JSON lines for log shippers
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = VideoForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(VideoForgeError::config(format!(
                "invalid log format '{}', expected pretty, compact or json",
                other
            ))),
        }
    }
}

/// Check a level name against [`LOG_LEVELS`]
pub fn validate_level(level: &str) -> VideoForgeResult<()> {
    if LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(VideoForgeError::config(format!(
            "invalid log level '{}', valid levels: {}",
            level,
            LOG_LEVELS.join(", ")
        )))
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `level`.
///
/// Logs go to stderr so command output on stdout stays machine-readable. Calling this
/// again after a subscriber is installed does nothing.
pub fn init_logging(level: &str, format: LogFormat) -> VideoForgeResult<()> {
    validate_level(level)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .map_err(|e| VideoForgeError::config(format!("invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_ok() {
        tracing::debug!(level, %format, "Logging initialized");
    }
    Ok(())
}

/// Log version and platform once at startup
pub fn log_system_info() {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "VideoForge starting");
    tracing::debug!(
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        cpus = num_cpus::get(),
        "Platform"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_validate_level() {
        assert!(validate_level("DEBUG").is_ok());
        assert!(validate_level("verbose").is_err());
    }

    #[test]
    fn test_repeated_init_is_a_noop() {
        init_logging("info", LogFormat::Compact).unwrap();
        init_logging("debug", LogFormat::Json).unwrap();
    }
}
