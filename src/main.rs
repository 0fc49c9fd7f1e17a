use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use navscope::cli::commands::{config_command, run_command};
use navscope::cli::{Cli, Commands};
use navscope::config::NavConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(path) = &cli.log_file {
        // Truncate on each run
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {:?}", path))?;
        logger.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    logger.init();

    info!("Starting navscope");

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => NavConfig::get_config_path()?,
    };
    let config = NavConfig::load_from(&config_path)?;
    debug!("Effective config: {:?}", config);

    match cli.command {
        Commands::Run(cmd) => run_command(cmd, config),
        Commands::Config(cmd) => config_command(cmd, &config, &config_path),
    }
}
