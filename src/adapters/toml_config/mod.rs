// TOML config adapter - Application configuration from the [videoforge] table

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::fs_storage::FsStorageAdapter;
use crate::domain::model::OutputOptions;
use crate::error::{VideoForgeError, VideoForgeResult};
use crate::utils::logging::{validate_level, LogFormat};

/// Resolved application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Root of staged artifacts
    pub storage_dir: PathBuf,
    /// Concurrent engine invocations
    pub engine_slots: usize,
    /// Encoder threads per invocation
    pub threads: usize,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Default export options
    pub output: OutputOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            storage_dir: FsStorageAdapter::default_root(),
            engine_slots: 1,
            threads: num_cpus::get(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            output: OutputOptions::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> VideoForgeResult<()> {
        if self.engine_slots == 0 {
            return Err(VideoForgeError::config("engine_slots must be at least 1"));
        }
        if self.threads == 0 {
            return Err(VideoForgeError::config("threads must be at least 1"));
        }
        validate_level(&self.log_level)?;
        self.output
            .validate()
            .map_err(|e| VideoForgeError::config(e.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    videoforge: AppConfig,
}

/// TOML configuration adapter
#[derive(Debug, Clone, Default)]
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Candidate config file locations, most specific first
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("videoforge.toml")];
        if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(config_home).join("videoforge").join("config.toml"));
        } else if let Some(home) = std::env::var_os("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("videoforge")
                    .join("config.toml"),
            );
        }
        if let Some(appdata) = std::env::var_os("APPDATA") {
            paths.push(PathBuf::from(appdata).join("VideoForge").join("config.toml"));
        }
        paths
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn parse(&self, content: &str) -> VideoForgeResult<AppConfig> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.videoforge)
    }

    /// Load and parse `path`
    pub fn load(&self, path: &Path) -> VideoForgeResult<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VideoForgeError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = self.parse(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load the first existing default location, or defaults when none exists
    pub fn load_default(&self) -> VideoForgeResult<AppConfig> {
        for path in Self::default_config_paths() {
            if path.is_file() {
                return self.load(&path);
            }
        }
        debug!("No configuration file found, using defaults");
        Ok(AppConfig::default())
    }

    /// Serialize `config` under the [videoforge] table
    pub fn render(&self, config: &AppConfig) -> VideoForgeResult<String> {
        Ok(toml::to_string_pretty(&ConfigFile {
            videoforge: config.clone(),
        })?)
    }

    pub fn save(&self, config: &AppConfig, path: &Path) -> VideoForgeResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render(config)?)?;
        Ok(())
    }
}
