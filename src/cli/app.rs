use super::commands::config::ConfigCommands;
use super::commands::run::RunCommand;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "navscope")]
#[command(about = "Replay scripted sessions against a hierarchical screen navigator")]
pub struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario file and print each step's outcome
    Run(RunCommand),
    /// Inspect the navigator configuration
    Config(ConfigCommands),
}
