// Migration 1: files named by sorted position move to their recorded episode number

use super::common::{date, entry};
use ruvdl::core::data::EntrySet;
use ruvdl::core::migrations::{self, LATEST_VERSION};
use ruvdl::core::program_info::{ProgramLedger, Seasons};
use ruvdl::core::programs::Program;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Old layout: season 1 has episodes numbered 2, 3, 4 in the ledger but the
/// files are still called E01, E02, E03.
fn old_library(destination: &Path) {
    let program_dir = destination.join("Program");
    let mut ledger = ProgramLedger::new_empty(&program_dir);
    ledger.set_program(&Program::new("1", "Program"));
    let entries: EntrySet = vec![
        entry("a", date(2020, 1, 1), Some(2)),
        entry("b", date(2020, 1, 8), Some(3)),
        entry("c", date(2020, 1, 15), Some(4)),
    ]
    .into_iter()
    .collect();
    let mut seasons = Seasons::new();
    seasons.insert(1, entries);
    ledger.set_seasons(seasons);
    ledger.set_version(0);
    ledger.write().unwrap();

    let season_dir = program_dir.join("Season 1");
    fs::create_dir_all(&season_dir).unwrap();
    for (n, contents) in [(1, "a"), (2, "b"), (3, "c")] {
        fs::write(season_dir.join(format!("Program - S01E{:02}.mp4", n)), contents).unwrap();
    }
}

fn read(destination: &Path, episode: u32) -> Option<String> {
    fs::read_to_string(destination.join(format!("Program/Season 1/Program - S01E{:02}.mp4", episode))).ok()
}

#[test]
fn test_move_old_locations() {
    let tmp = TempDir::new().unwrap();
    old_library(tmp.path());

    let report = migrations::run(tmp.path(), 1, false).unwrap();
    assert!(report.is_success());
    assert_eq!(report.migrated.len(), 1);
    assert_eq!(report.migrated[0].1.len(), 3);

    assert_eq!(read(tmp.path(), 1), None);
    assert_eq!(read(tmp.path(), 2).as_deref(), Some("a"));
    assert_eq!(read(tmp.path(), 3).as_deref(), Some("b"));
    assert_eq!(read(tmp.path(), 4).as_deref(), Some("c"));

    let ledger = ProgramLedger::load(&tmp.path().join("Program")).unwrap();
    assert_eq!(ledger.version(), LATEST_VERSION);

    // Already migrated programs are skipped
    let again = migrations::run(tmp.path(), 1, false).unwrap();
    assert!(again.migrated.is_empty());
    assert_eq!(again.skipped.len(), 1);
}

#[test]
fn test_dry_run_only_plans() {
    let tmp = TempDir::new().unwrap();
    old_library(tmp.path());

    let report = migrations::run(tmp.path(), 1, true).unwrap();
    assert_eq!(report.migrated[0].1.len(), 3);
    assert_eq!(read(tmp.path(), 1).as_deref(), Some("a"));
    assert_eq!(read(tmp.path(), 4), None);
    assert_eq!(ProgramLedger::load(&tmp.path().join("Program")).unwrap().version(), 0);
}

#[test]
fn test_unnumbered_entry_aborts_that_program() {
    let tmp = TempDir::new().unwrap();
    let program_dir = tmp.path().join("Program");
    let mut ledger = ProgramLedger::new_empty(&program_dir);
    ledger.set_program(&Program::new("1", "Program"));
    let mut seasons = Seasons::new();
    seasons.insert(1, std::iter::once(entry("a", date(2020, 1, 1), None)).collect());
    ledger.set_seasons(seasons);
    ledger.set_version(0);
    ledger.write().unwrap();

    let report = migrations::run(tmp.path(), 1, false).unwrap();
    assert!(!report.is_success());
    assert!(report.failed[0].1.contains("attempt sync"));
    assert_eq!(ProgramLedger::load(&program_dir).unwrap().version(), 0);
}
