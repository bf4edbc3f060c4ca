// Mover tests: path validation, episode moves, season moves and dry-run

use super::common::create_program_info;
use ruvdl::core::mover::{MoveKind, Mover};
use ruvdl::core::program_info::ProgramLedger;
use ruvdl::RuvError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// `<tmp>/tv/Program` with the given seasons in its ledger
fn library(seasons: &[(u32, &[u32])]) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let program = tmp.path().join("tv/Program");
    fs::create_dir_all(&program).unwrap();
    create_program_info(&program, seasons, 1);
    (tmp, program)
}

fn touch(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn numbers(program: &Path, season: u32) -> Vec<Option<u32>> {
    let ledger = ProgramLedger::load(program).unwrap();
    ledger.seasons()[&season].iter().map(|e| e.episode.number).collect()
}

#[test]
fn test_src_must_have_a_ledger() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("tv/Program/Source");
    fs::create_dir_all(&src).unwrap();

    let err = Mover::new(&src, tmp.path().join("tv/Program/Destination"), false).unwrap_err();
    assert!(err.to_string().starts_with("Could not find program info related to"));
}

#[test]
fn test_cannot_move_onto_existing_path() {
    let tmp = TempDir::new().unwrap();
    let (src, dst) = (tmp.path().join("src"), tmp.path().join("dst"));
    touch(&src, "contents");
    touch(&dst, "contents2");

    assert!(matches!(Mover::new(&src, &dst, false), Err(RuvError::AlreadyExists(_))));
    // Same path on both sides is covered by the same check
    assert!(matches!(Mover::new(&src, &src, false), Err(RuvError::AlreadyExists(_))));
}

#[test]
fn test_move_season_requires_correct_naming_schema() {
    let (_tmp, program) = library(&[]);
    fs::create_dir_all(program.join("Season")).unwrap();

    let err = Mover::new(program.join("Season"), program.join("Season 2"), false)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, RuvError::NamingSchema(_)));
    assert_eq!(
        err.to_string(),
        format!("Season number not determined from {}", program.join("Season").display())
    );

    fs::create_dir_all(program.join("Season 1")).unwrap();
    let err = Mover::new(program.join("Season 1"), program.join("Season something"), false)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, RuvError::NamingSchema(_)));

    let err = Mover::new(program.join("Season 1"), program.join("Season 2"), false)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, RuvError::ProgramInfo(_)));
    assert!(err.to_string().starts_with("Source season number 1 not found in info file"));
}

#[test]
fn test_move_season_fails_if_any_episode_has_wrong_name() {
    let (_tmp, program) = library(&[(1, &[1])]);
    let wrong = program.join("Season 1/Program - S02E01.mp4");
    touch(&wrong, "S02E01");

    let err = Mover::new(program.join("Season 1"), program.join("Season 2"), false)
        .unwrap()
        .run()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Season number in folder and filename differ in \"{}\"", wrong.display())
    );
    assert!(wrong.exists());
}

#[test]
fn test_move_season() {
    let (_tmp, program) = library(&[(1, &[1, 2])]);
    touch(&program.join("Season 1/Program - S01E01.mp4"), "S01E01");
    touch(&program.join("Season 1/Program - S01E02.mp4"), "S01E02");

    let report = Mover::new(program.join("Season 1"), program.join("Season 2"), false)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.kind, MoveKind::Season);
    assert_eq!(report.plan.len(), 2);

    assert!(!program.join("Season 1").exists());
    assert_eq!(fs::read_dir(program.join("Season 2")).unwrap().count(), 2);
    assert_eq!(
        fs::read_to_string(program.join("Season 2/Program - S02E01.mp4")).unwrap(),
        "S01E01"
    );
    assert!(program.join("Season 2/Program - S02E02.mp4").exists());

    let ledger = ProgramLedger::load(&program).unwrap();
    assert!(!ledger.seasons().contains_key(&1));
    assert_eq!(ledger.seasons()[&2].len(), 2);
    assert_eq!(numbers(&program, 2), vec![Some(1), Some(2)]);
}

#[test]
fn test_move_season_onto_known_season_is_rejected() {
    let (_tmp, program) = library(&[(1, &[1]), (2, &[1])]);
    touch(&program.join("Season 1/Program - S01E01.mp4"), "S01E01");

    let err = Mover::new(program.join("Season 1"), program.join("Season 2"), false)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, RuvError::ProgramInfo(_)));
    assert!(program.join("Season 1/Program - S01E01.mp4").exists());
}

#[test]
fn test_move_episode_between_seasons_is_unsupported() {
    let (_tmp, program) = library(&[(1, &[1])]);
    fs::create_dir_all(program.join("Season 2")).unwrap();
    touch(&program.join("Season 1/Program - S01E01.mp4"), "S01E01");

    let err = Mover::new(
        program.join("Season 1/Program - S01E01.mp4"),
        program.join("Season 2/Program - S02E01.mp4"),
        false,
    )
    .unwrap()
    .run()
    .unwrap_err();
    assert!(matches!(err, RuvError::UnsupportedMove(_)));
    assert!(err.to_string().contains("Moving episodes between seasons is not supported"));
}

#[test]
fn test_move_episode_fails_if_src_episode_not_in_ledger() {
    let (_tmp, program) = library(&[(1, &[])]);
    touch(&program.join("Season 1/Program - S01E01.mp4"), "S01E01");

    let err = Mover::new(
        program.join("Season 1/Program - S01E01.mp4"),
        program.join("Season 1/Program - S01E02.mp4"),
        false,
    )
    .unwrap()
    .run()
    .unwrap_err();
    assert!(matches!(err, RuvError::ProgramInfo(_)));
    assert!(err.to_string().contains("Source episode not found in program info file"));
}

#[test]
fn test_move_episode_fails_if_dst_episode_in_ledger() {
    let (_tmp, program) = library(&[(1, &[1, 2])]);
    let src = program.join("Season 1/Program - S01E01.mp4");
    touch(&src, "S01E01");

    Mover::new(&src, program.join("Season 1/Program - S01E03.mp4"), false)
        .unwrap()
        .run()
        .unwrap();

    let src = program.join("Season 1/Program - S01E03.mp4");
    let err = Mover::new(&src, program.join("Season 1/Program - S01E02.mp4"), false)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, RuvError::ProgramInfo(_)));
    assert!(err.to_string().contains("Destination episode found in program info file"));
    assert!(src.exists());
    assert_eq!(numbers(&program, 1), vec![Some(3), Some(2)]);
}

#[test]
fn test_move_episode_requires_correct_naming_schema() {
    let (_tmp, program) = library(&[(1, &[1])]);
    for name in ["S01E01.mp4", "Program 1x1.mp4", "NotProgram 1x1.mp4"] {
        let src = program.join("Season 1").join(name);
        touch(&src, "incorrect name");
        let err = Mover::new(&src, program.join("Season 1/Program - S01E02.mp4"), false)
            .unwrap()
            .run()
            .unwrap_err();
        assert!(matches!(err, RuvError::NamingSchema(_)));
        assert!(err.to_string().contains("Episode/season number not determined from"));
    }
}

#[test]
fn test_move_episode() {
    let (_tmp, program) = library(&[(1, &[1])]);
    let src = program.join("Season 1/Program - S01E01.mp4");
    let dst = program.join("Season 1/Program - S01E02.mp4");
    touch(&src, "S01E01");

    let report = Mover::new(&src, &dst, false).unwrap().run().unwrap();
    assert_eq!(report.kind, MoveKind::Episode);
    assert!(!src.exists());
    assert_eq!(fs::read_to_string(&dst).unwrap(), "S01E01");
    assert_eq!(numbers(&program, 1), vec![Some(2)]);
}

#[test]
fn test_relative_paths_are_rejected() {
    let err = Mover::new("relative/path/here.mp4", "/absolute/path", false).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Must pass in absolute path - \"relative/path/here.mp4\" is relative."
    );
}

#[test]
fn test_dry_run_changes_nothing() {
    let (_tmp, program) = library(&[(1, &[1])]);
    let src = program.join("Season 1/Program - S01E01.mp4");
    touch(&src, "S01E01");
    let ledger_before = fs::read_to_string(program.join("program_info.json")).unwrap();

    let report = Mover::new(&src, program.join("Season 1/Program - S01E02.mp4"), true)
        .unwrap()
        .run()
        .unwrap();
    assert!(report.dry_run);
    assert_eq!(report.plan.len(), 1);

    let report = Mover::new(program.join("Season 1"), program.join("Season 3"), true)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.plan.len(), 1);

    assert!(src.exists());
    assert!(!program.join("Season 3").exists());
    assert_eq!(fs::read_to_string(program.join("program_info.json")).unwrap(), ledger_before);
}

#[test]
fn test_dry_run_still_validates() {
    let (_tmp, program) = library(&[(1, &[1, 2])]);
    let src = program.join("Season 1/Program - S01E01.mp4");
    touch(&src, "S01E01");

    let err = Mover::new(&src, program.join("Season 1/Program - S01E02.mp4"), true)
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, RuvError::ProgramInfo(_)));
}
