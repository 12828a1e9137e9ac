//! VideoForge CLI
//!
//! Command-line front end for compiling and running editor operation lists.
//!
//! # Usage
//!
//! ```bash
//! videoforge compile --ops edits.json --width 1920 --height 1080
//! videoforge process --input clip.mov --ops edits.yaml --output out.mp4
//! videoforge batch --ops edits.json --out-dir exports a.mp4 b.mp4
//! videoforge probe --input clip.mov
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use videoforge::app::DefaultAppContainer;
use videoforge::cli::{commands, Cli, Commands};
use videoforge::config_initialization::initialize_configuration;
use videoforge::utils::logging::{init_logging, log_system_info};

/// Main entry point for the VideoForge CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, env_overrides) =
        initialize_configuration(&cli).context("Failed to load configuration")?;
    init_logging(&config.log_level, config.log_format)?;
    log_system_info();
    debug!(env_overrides, ?config, "Configuration resolved");

    let container = DefaultAppContainer::new(config).context("Failed to initialize")?;

    match cli.command {
        Commands::Compile(args) => {
            info!("Executing compile command");
            commands::execute_compile(&container, args).await?;
        }
        Commands::Process(args) => {
            info!("Executing process command");
            commands::execute_process(&container, args).await?;
        }
        Commands::Batch(args) => {
            info!("Executing batch command");
            commands::execute_batch(&container, args).await?;
        }
        Commands::Probe(args) => {
            info!("Executing probe command");
            commands::execute_probe(&container, args).await?;
        }
        Commands::Presets(args) => commands::execute_presets(args)?,
        Commands::Project(args) => commands::execute_project(args)?,
    }

    Ok(())
}
