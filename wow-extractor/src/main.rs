//! Main entry point for the extractor

use anyhow::Result;
use clap::Parser;

use wow_extractor::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level().as_str())).init();

    let config = cli.resolve_config()?;
    wow_extractor::run(&config)?;
    Ok(())
}
