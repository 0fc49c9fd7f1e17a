pub mod config;
pub mod run;

pub use config::{ConfigCommands, config_command};
pub use run::{RunCommand, run_command};
