//! Configuration initialization and hierarchy management

use std::path::PathBuf;

use crate::adapters::{AppConfig, TomlConfigAdapter};
use crate::cli::Cli;
use crate::error::{VideoForgeError, VideoForgeResult};

/// Environment variables recognized as configuration overrides
pub const ENV_OVERRIDES: [&str; 7] = [
    "VIDEOFORGE_FFMPEG",
    "VIDEOFORGE_FFPROBE",
    "VIDEOFORGE_STORAGE_DIR",
    "VIDEOFORGE_ENGINE_SLOTS",
    "VIDEOFORGE_THREADS",
    "VIDEOFORGE_LOG_LEVEL",
    "VIDEOFORGE_LOG_FORMAT",
];

/// Resolve configuration with precedence: CLI > Env > File > Defaults
///
/// Returns the configuration and the number of environment overrides applied.
pub fn initialize_configuration(cli: &Cli) -> VideoForgeResult<(AppConfig, usize)> {
    let adapter = TomlConfigAdapter::new();
    let mut config = match &cli.config {
        Some(path) => adapter.load(path)?,
        None => adapter.load_default()?,
    };

    let applied = apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    apply_cli_overrides(&mut config, cli);
    config.validate()?;

    Ok((config, applied))
}

/// Apply `VIDEOFORGE_*` overrides read through `lookup`
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> VideoForgeResult<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;
    for key in ENV_OVERRIDES {
        let Some(value) = lookup(key) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key {
            "VIDEOFORGE_FFMPEG" => config.ffmpeg_path = PathBuf::from(value),
            "VIDEOFORGE_FFPROBE" => config.ffprobe_path = PathBuf::from(value),
            "VIDEOFORGE_STORAGE_DIR" => config.storage_dir = PathBuf::from(value),
            "VIDEOFORGE_ENGINE_SLOTS" => config.engine_slots = parse_count(key, value)?,
            "VIDEOFORGE_THREADS" => config.threads = parse_count(key, value)?,
            "VIDEOFORGE_LOG_LEVEL" => config.log_level = value.to_lowercase(),
            "VIDEOFORGE_LOG_FORMAT" => config.log_format = value.parse()?,
            _ => continue,
        }
        applied += 1;
    }
    Ok(applied)
}

/// Apply global command-line flags
pub fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.log_level = level.to_lowercase();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
}

fn parse_count(key: &str, value: &str) -> VideoForgeResult<usize> {
    value
        .parse()
        .map_err(|_| VideoForgeError::config(format!("{} must be a number, got '{}'", key, value)))
}
