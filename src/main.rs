mod cli;

use crate::cli::{Cli, Commands};
use clap::Parser;
use tracing::{error, info};

use triposr_service::application::use_cases::{RunApplicationUseCase, ShowRuntimeInfoUseCase};
use triposr_service::debug::debug_helpers::log_system_info;
use triposr_service::debug::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if let Err(e) = init_logging(&cli.log_config()) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    log_system_info();

    match cli.command {
        Commands::Serve(args) => {
            let config = match args.into_config() {
                Ok(config) => config,
                Err(e) => {
                    error!("Invalid configuration: {}", e);
                    eprintln!("❌ Invalid configuration: {}", e);
                    std::process::exit(1);
                }
            };

            info!("Starting application...");
            match RunApplicationUseCase::new(config).execute().await {
                Ok(_) => {
                    info!("Application terminated normally");
                }
                Err(e) => {
                    error!("Application failed: {:#}", e);
                    eprintln!("❌ Application failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Info { runtime } => {
            let use_case = ShowRuntimeInfoUseCase::new(runtime.into());
            if !use_case.execute().await {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
