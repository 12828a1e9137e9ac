// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_storage;
pub mod probe_ffprobe;
#[cfg(feature = "libav")]
pub mod probe_libav;
pub mod toml_config;

// Re-export adapters
pub use exec_ffmpeg::FfmpegCliAdapter;
pub use fs_storage::FsStorageAdapter;
pub use probe_ffprobe::FfprobeAdapter;
#[cfg(feature = "libav")]
pub use probe_libav::ProbeLibavAdapter;
pub use toml_config::{AppConfig, TomlConfigAdapter};
