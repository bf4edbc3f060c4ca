// End-to-end runs: crawl, organize and download against the in-memory server

use super::common::{api_episode, program_with, FakeServer};
use ruvdl::core::crawler::CrawlSettings;
use ruvdl::core::program_info::ProgramLedger;
use ruvdl::core::runner::{RunOptions, Runner};
use std::fs;
use tempfile::TempDir;

fn server() -> FakeServer {
    FakeServer::new()
        .publish("opid", "2020/01/08", "0001T1")
        .publish("opid", "2020/01/15", "0002T1")
        .publish("opid", "2020/01/22", "0003T1")
        .publish("opid", "2020/02/05", "0004T1")
        .publish("opid", "2020/02/12", "0005T1")
}

fn options(tmp: &TempDir, sequential: bool, dry_run: bool) -> RunOptions {
    RunOptions {
        destination: tmp.path().join("tv"),
        cache_dir: tmp.path().join("cache"),
        crawl: CrawlSettings::default(),
        workers: 2,
        sequential,
        dry_run,
    }
}

fn programs() -> Vec<ruvdl::core::programs::Program> {
    vec![program_with(vec![api_episode("opid", "2020/01/15", "0002T1", 2, "2099-01-01")])]
}

#[test]
fn test_dry_run_organizes_without_downloading() {
    let tmp = TempDir::new().unwrap();
    let server = server();

    let summary = Runner::new(options(&tmp, false, true), &server).run(programs()).unwrap();
    assert_eq!(summary.programs.len(), 1);
    assert_eq!(summary.programs[0].found, 5);
    assert_eq!(summary.missing_count(), 5);
    assert!(summary.downloaded.is_empty());
    assert_eq!(summary.failed_programs().count(), 0);

    let program_dir = tmp.path().join("tv/Program");
    let ledger = ProgramLedger::load(&program_dir).unwrap();
    // Two week break before episode 4 opens a second season
    assert_eq!(ledger.seasons().keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert!(!program_dir.join("Season 1/Program - S01E01.mp4").exists());
    assert!(tmp.path().join("cache/29150.json").is_file());
}

#[test]
fn test_downloads_missing_files_once() {
    for sequential in [true, false] {
        let tmp = TempDir::new().unwrap();
        let server = server();
        let runner = Runner::new(options(&tmp, sequential, false), &server);

        let summary = runner.run(programs()).unwrap();
        assert_eq!(summary.downloaded.len(), 5);
        assert!(summary.download_errors.is_empty());

        let program_dir = tmp.path().join("tv/Program");
        for name in [
            "Season 1/Program - S01E01.mp4",
            "Season 1/Program - S01E02.mp4",
            "Season 1/Program - S01E03.mp4",
            "Season 2/Program - S02E01.mp4",
            "Season 2/Program - S02E02.mp4",
        ] {
            assert_eq!(fs::read(program_dir.join(name)).unwrap(), b"data");
        }

        let again = runner.run(programs()).unwrap();
        assert_eq!(again.missing_count(), 0);
        assert!(again.downloaded.is_empty());
    }
}
