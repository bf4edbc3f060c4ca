use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::core::mover::{MoveKind, Mover};
use crate::ui;

pub fn execute(matches: &clap::ArgMatches, dry_run: bool) -> Result<()> {
    let src = matches.get_one::<String>("src").context("Source path is required")?;
    let dst = matches.get_one::<String>("dst").context("Destination path is required")?;
    let src = super::absolute(&PathBuf::from(src))?;
    let dst = super::absolute(&PathBuf::from(dst))?;

    let mut mover = Mover::new(&src, &dst, dry_run)?;
    let report = mover
        .run()
        .with_context(|| format!("Could not move {}", src.display()))?;

    let what = match report.kind {
        MoveKind::Episode => "episode",
        MoveKind::Season => "season",
    };
    if report.dry_run {
        ui::warn(&format!("Dryrun. Would move {} {} to {}", what, src.display(), dst.display()));
        for line in ui::format_plan(&report.plan) {
            ui::dimmed(&format!("  {}", line));
        }
        return Ok(());
    }

    println!(
        "{} {}",
        format!("✓ Moved {}:", what).green(),
        format!("{} -> {}", src.display(), dst.display()).cyan()
    );
    if report.kind == MoveKind::Season {
        for line in ui::format_plan(&report.plan) {
            ui::dimmed(&format!("  {}", line));
        }
    }
    ui::dimmed(&format!("Updated {}", report.ledger.display()));
    Ok(())
}
