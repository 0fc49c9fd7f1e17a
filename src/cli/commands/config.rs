use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;
use std::path::Path;

use crate::config::NavConfig;

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show the effective configuration
    Show,
    /// Print where the config file is read from
    Path,
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

pub fn config_command(cmd: ConfigCommands, config: &NavConfig, path: &Path) -> Result<()> {
    match cmd.command {
        ConfigSubcommands::Show => {
            let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
            println!("{} {}", "Config:".bright_white().bold(), path.display().to_string().dimmed());
            println!("{}", rendered);
        }
        ConfigSubcommands::Path => {
            println!("{}", path.display());
        }
        ConfigSubcommands::Init { force } => {
            if path.exists() && !force {
                println!(
                    "{} {} already exists, use --force to overwrite",
                    "⚠️".bright_yellow().bold(),
                    path.display()
                );
                return Ok(());
            }
            config.save_to(path)?;
            println!(
                "{} Wrote {}",
                "✓".bright_green().bold(),
                path.display().to_string().bright_green()
            );
        }
    }
    Ok(())
}
