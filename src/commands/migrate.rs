use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::core::{migrations, Config};
use crate::ui;

pub fn execute(matches: &clap::ArgMatches, dry_run: bool) -> Result<()> {
    let version = *matches
        .get_one::<u32>("number")
        .context("Migration number is required")?;

    let mut config = Config::load()?;
    if let Some(destination) = matches.get_one::<String>("destination") {
        config.destination = super::absolute(destination.as_ref())?;
    }

    let report = migrations::run(&config.destination, version, dry_run)?;

    for (ledger, plan) in &report.migrated {
        let verb = if dry_run { "Would migrate" } else { "✓ Migrated" };
        println!("{} {}", verb.green(), ledger.display());
        for line in ui::format_plan(plan) {
            ui::dimmed(&format!("  {}", line));
        }
    }
    if !report.skipped.is_empty() {
        ui::dimmed(&format!("{} program(s) already at version {}", report.skipped.len(), version));
    }
    for (ledger, reason) in &report.failed {
        ui::error(&format!("✗ {}: {}", ledger.display(), reason));
    }
    if !report.is_success() {
        bail!("Migration {} failed for {} program(s)", version, report.failed.len());
    }
    Ok(())
}
