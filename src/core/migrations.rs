//! Ledger schema migrations
//!
//! Each migration brings the files of every program under the destination
//! from schema version `n - 1` to `n`. The organizer refuses to queue
//! downloads for a ledger that is behind [`LATEST_VERSION`].

use std::path::{Path, PathBuf};

use crate::core::data::{episode_basename, season_folder};
use crate::core::program_info::ProgramLedger;
use crate::core::programs::all_program_infos;
use crate::core::relocate::MovePlan;
use crate::error::{Result, RuvError};

/// Schema version written by this release
pub const LATEST_VERSION: u32 = 1;

pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    plan: fn(&ProgramLedger, &Path) -> Result<MovePlan>,
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "move old locations",
    plan: move_old_locations,
}];

pub fn get(version: u32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

/// Migrations a ledger at `version` still needs, in order
pub fn pending(version: u32) -> Vec<u32> {
    (version.saturating_add(1)..=LATEST_VERSION).collect()
}

/// Outcome of one migration over all programs
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Ledger path and the moves planned (and, unless dry-run, done) for it
    pub migrated: Vec<(PathBuf, MovePlan)>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl MigrationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run migration `version` against every ledger in `destination`.
///
/// A failure in one program is recorded in the report and does not stop the
/// others. With `dry_run` nothing on disk changes.
pub fn run(destination: &Path, version: u32, dry_run: bool) -> Result<MigrationReport> {
    let migration = get(version).ok_or_else(|| {
        let known: Vec<String> = MIGRATIONS.iter().map(|m| m.version.to_string()).collect();
        RuvError::not_found(format!(
            "Unknown migration {}. Known migrations: {}",
            version,
            known.join(", ")
        ))
    })?;
    log::info!("Running migration {} ({})", migration.version, migration.name);
    if dry_run {
        log::warn!("Running with dryrun, no change to filesystem");
    }

    let mut report = MigrationReport::default();
    for mut ledger in all_program_infos(destination)? {
        if ledger.version() >= migration.version {
            log::info!("Skipping {}", ledger);
            report.skipped.push(ledger.path().to_path_buf());
            continue;
        }

        match apply(migration, &mut ledger, destination, dry_run) {
            Ok(plan) => report.migrated.push((ledger.path().to_path_buf(), plan)),
            Err(e) => {
                log::error!("Migration {} failed for {}: {}", migration.version, ledger, e);
                report.failed.push((ledger.path().to_path_buf(), e.to_string()));
            }
        }
    }
    Ok(report)
}

fn apply(migration: &Migration, ledger: &mut ProgramLedger, destination: &Path, dry_run: bool) -> Result<MovePlan> {
    let plan = (migration.plan)(ledger, destination)?;
    if dry_run {
        for planned in plan.moves() {
            log::info!("Would move {} to {}", planned.src.display(), planned.dst.display());
        }
        return Ok(plan);
    }

    plan.execute()?;
    ledger.set_version(migration.version);
    ledger.write()?;
    Ok(plan)
}

/// Version 1: files used to be numbered by their sorted position within the
/// season. Rename them to the episode number recorded in the ledger.
fn move_old_locations(ledger: &ProgramLedger, destination: &Path) -> Result<MovePlan> {
    let title = ledger
        .program()
        .map(|p| p.title.clone())
        .ok_or_else(|| RuvError::program_info(format!("No program in {}", ledger.path().display())))?;
    log::info!("Targeting {}", title);

    let mut plan = MovePlan::new();
    for (season, entries) in ledger.seasons() {
        let folder = season_folder(destination, &title, *season);
        for (i, entry) in entries.sorted().into_iter().enumerate() {
            let number = entry.episode.number.ok_or_else(|| {
                RuvError::program_info("You need to attempt sync for this program once before running this migration.")
            })?;
            let position = u32::try_from(i + 1).map_err(|_| RuvError::other("Season too large"))?;

            let src = folder.join(episode_basename(&title, *season, position, entry.extension()));
            let dst = folder.join(episode_basename(&title, *season, number, entry.extension()));
            if src.is_file() {
                plan.push(src, dst);
            }
        }
    }
    plan.validate()?;
    Ok(plan)
}
