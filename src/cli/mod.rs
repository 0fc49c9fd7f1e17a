pub mod app;
pub mod commands;
pub mod scenario;

pub use app::{Cli, Commands};
