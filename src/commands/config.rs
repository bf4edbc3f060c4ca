use anyhow::{Context, Result};
use colored::Colorize;

use crate::core::Config;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("set", sub_matches)) => handle_set(sub_matches),
        Some(("path", _)) => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
        _ => handle_show(),
    }
}

fn handle_show() -> Result<()> {
    let config = Config::load()?;
    println!("{}", format!("Configuration ({})", Config::get_config_path()?.display()).white());
    for (key, value) in config.entries() {
        println!("  {:<24} {}", key.cyan(), value);
    }
    Ok(())
}

fn handle_set(matches: &clap::ArgMatches) -> Result<()> {
    let key = matches.get_one::<String>("key").context("Key argument is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    println!("{} {}", format!("✓ {} set to:", key).green(), value);
    Ok(())
}
