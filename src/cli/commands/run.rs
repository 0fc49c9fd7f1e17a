use anyhow::Result;
use clap::Args;
use colored::*;
use log::info;
use std::path::PathBuf;

use crate::cli::scenario::{Scenario, ScenarioRunner};
use crate::config::NavConfig;

#[derive(Args)]
pub struct RunCommand {
    /// Path to the scenario TOML file
    pub scenario: PathBuf,

    /// Stop at the first step the navigator refuses
    #[arg(long)]
    pub strict: bool,
}

pub fn run_command(cmd: RunCommand, config: NavConfig) -> Result<()> {
    let scenario = Scenario::load(&cmd.scenario)?;
    info!("Running {} step(s) from {:?}", scenario.steps.len(), cmd.scenario);

    let mut runner = ScenarioRunner::new(config);
    let mut refused = 0;

    for (index, step) in scenario.steps.iter().enumerate() {
        let report = runner.run(step)?;
        let marker = if report.ok {
            "✓".bright_green().bold()
        } else {
            "✗".bright_red().bold()
        };
        println!("{} {:>3}  {}", marker, index + 1, report.action.bright_white());
        for line in &report.lines {
            println!("        {}", line.dimmed());
        }

        if !report.ok {
            refused += 1;
            if cmd.strict {
                anyhow::bail!("Step {} ({}) was refused", index + 1, report.action);
            }
        }
    }

    if refused > 0 {
        println!("{} {} step(s) refused", "⚠️".bright_yellow().bold(), refused);
    } else {
        println!("{} All steps applied", "✓".bright_green().bold());
    }
    Ok(())
}
