//! CLI module for VideoForge
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::logging::LogFormat;

pub mod args;
pub mod commands;

/// VideoForge - compile editor operations into ffmpeg filter graphs and run them
#[derive(Parser, Debug)]
#[command(name = "videoforge")]
#[command(about = "VideoForge - Operation lists in, encoded video out")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Configuration file
    #[arg(long, global = true, env = "VIDEOFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile an operation file and print the filter graph
    Compile(args::CompileArgs),
    /// Apply an operation file to a video
    Process(args::ProcessArgs),
    /// Apply one operation file to many videos
    Batch(args::BatchArgs),
    /// Print video dimensions and duration
    Probe(args::ProbeArgs),
    /// List the built-in presets
    Presets(args::PresetsArgs),
    /// Save or inspect project files
    Project(args::ProjectArgs),
}
