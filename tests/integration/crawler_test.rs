// Crawler tests against an in-memory server: cadence walking, cache reuse,
// eviction of stale negative results and failure modes

use super::common::{api_episode, at, date, program_with, FakeServer};
use chrono::NaiveDateTime;
use ruvdl::core::cache::{ProbeCache, ProbeRecord};
use ruvdl::core::crawler::{CrawlSettings, Crawler};
use ruvdl::RuvError;
use tempfile::TempDir;

fn march_first() -> NaiveDateTime {
    at(2020, 3, 1, 12, 0)
}

/// Episodes 1-5 aired weekly, except a two week break before episode 4
fn weekly_server() -> FakeServer {
    FakeServer::new()
        .publish("opid", "2020/01/08", "0001T1")
        .publish("opid", "2020/01/15", "0002T1")
        .publish("opid", "2020/01/22", "0003T1")
        .publish("opid", "2020/02/05", "0004T1")
        .publish("opid", "2020/02/12", "0005T1")
}

fn crawl(server: &FakeServer, cache_dir: &TempDir) -> ruvdl::Result<Vec<String>> {
    let program = program_with(vec![api_episode("opid", "2020/01/15", "0002T1", 2, "2099-01-01")]);
    let cache = ProbeCache::open(cache_dir.path(), &program.id);
    let mut crawler = Crawler::new(program, CrawlSettings::default(), cache, server).with_clock(march_first);
    let found = crawler.search_for_episodes()?;
    let mut filenames: Vec<String> = found.iter().map(|e| e.filename.clone()).collect();
    filenames.sort();
    Ok(filenames)
}

#[test]
fn test_walks_both_directions_and_follows_cadence_changes() {
    let server = weekly_server();
    let cache_dir = TempDir::new().unwrap();

    let found = crawl(&server, &cache_dir).unwrap();
    assert_eq!(found, ["0001T1", "0002T1", "0003T1", "0004T1", "0005T1"]);

    // 1 for the known episode, 2 + 5 backwards, 2 + 3 + 2 + 5 forwards
    assert_eq!(server.head_count(), 20);
    assert!(server.heads().iter().all(|url| url.contains("/opid/")));
}

#[test]
fn test_second_run_is_served_from_cache() {
    let server = weekly_server();
    let cache_dir = TempDir::new().unwrap();

    let first = crawl(&server, &cache_dir).unwrap();
    assert!(cache_dir.path().join("29150.json").is_file());

    let offline = FakeServer::new();
    let second = crawl(&offline, &cache_dir).unwrap();
    assert_eq!(first, second);
    assert_eq!(offline.head_count(), 0);
}

#[test]
fn test_restricted_access_is_learned_from_manifest() {
    let server = FakeServer::new().publish("lokad", "2020/01/15", "0002T1");
    let cache_dir = TempDir::new().unwrap();
    let program = program_with(vec![api_episode("lokad", "2020/01/15", "0002T1", 2, "2099-01-01")]);
    let cache = ProbeCache::open(cache_dir.path(), &program.id);
    let mut crawler = Crawler::new(program, CrawlSettings::default(), cache, &server).with_clock(march_first);

    let found = crawler.search_for_episodes().unwrap();
    assert_eq!(found.len(), 1);
    assert!(server.heads().iter().all(|url| url.contains("/lokad/")));
}

fn jan_20_at_six() -> NaiveDateTime {
    at(2020, 1, 20, 6, 10)
}

fn jan_23() -> NaiveDateTime {
    at(2020, 1, 23, 12, 0)
}

#[test]
fn test_stale_negative_result_is_probed_again() {
    let server = FakeServer::new().publish("opid", "2020/01/20", "0007T1");
    let cache_dir = TempDir::new().unwrap();
    let mut cache = ProbeCache::open(cache_dir.path(), "1");
    // Checked on the morning of the air date, before the file was up
    cache.set(
        ProbeCache::key(date(2020, 1, 20), "0007T1"),
        ProbeRecord::missing(404, at(2020, 1, 20, 6, 0)),
    );

    let mut crawler = Crawler::new(program_with(vec![]), CrawlSettings::default(), cache, &server).with_clock(jan_23);
    let entry = crawler.get_entry(date(2020, 1, 20), "0007T1", None).unwrap();

    assert_eq!(entry.unwrap().etag, "etag-0007T1");
    assert_eq!(server.head_count(), 1);
    assert!(crawler.cache().get(&ProbeCache::key(date(2020, 1, 20), "0007T1")).unwrap().is_success());
}

#[test]
fn test_recent_negative_result_is_kept() {
    let server = FakeServer::new().publish("opid", "2020/01/20", "0007T1");
    let cache_dir = TempDir::new().unwrap();
    let mut cache = ProbeCache::open(cache_dir.path(), "1");
    // Checked ten minutes ago
    cache.set(
        ProbeCache::key(date(2020, 1, 20), "0007T1"),
        ProbeRecord::missing(404, at(2020, 1, 20, 6, 0)),
    );

    let mut crawler =
        Crawler::new(program_with(vec![]), CrawlSettings::default(), cache, &server).with_clock(jan_20_at_six);
    let entry = crawler.get_entry(date(2020, 1, 20), "0007T1", None).unwrap();

    assert!(entry.is_none());
    assert_eq!(server.head_count(), 0);
}

#[test]
fn test_unresolvable_known_episode_is_fatal_and_cache_is_flushed() {
    let server = FakeServer::new();
    let cache_dir = TempDir::new().unwrap();
    let program = program_with(vec![api_episode("opid", "2020/01/15", "0002T1", 2, "2099-01-01")]);
    let cache = ProbeCache::open(cache_dir.path(), &program.id);
    let mut crawler = Crawler::new(program, CrawlSettings::default(), cache, &server).with_clock(march_first);

    let err = crawler.search_for_episodes().unwrap_err();
    assert!(matches!(err, RuvError::UnresolvableEpisode(_)));
    assert!(cache_dir.path().join("29150.json").is_file());
}

#[test]
fn test_expired_known_episode_is_skipped() {
    let server = FakeServer::new();
    let cache_dir = TempDir::new().unwrap();
    let program = program_with(vec![api_episode("opid", "2020/01/15", "0002T1", 2, "2020-02-01")]);
    let cache = ProbeCache::open(cache_dir.path(), &program.id);
    let mut crawler = Crawler::new(program, CrawlSettings::default(), cache, &server).with_clock(march_first);

    assert!(crawler.search_for_episodes().unwrap().is_empty());
    assert_eq!(server.head_count(), 1);
}

#[test]
fn test_unknown_filename_encoding_aborts_the_crawl() {
    let server = FakeServer::new().publish("opid", "2020/01/15", "episode");
    let cache_dir = TempDir::new().unwrap();
    let program = program_with(vec![api_episode("opid", "2020/01/15", "episode", 1, "2099-01-01")]);
    let cache = ProbeCache::open(cache_dir.path(), &program.id);
    let mut crawler = Crawler::new(program, CrawlSettings::default(), cache, &server).with_clock(march_first);

    let err = crawler.search_for_episodes().unwrap_err();
    assert!(matches!(err, RuvError::UnknownFilenameEncoding { .. }));
}

#[test]
fn test_unparseable_manifest_is_skipped() {
    let server = FakeServer::new();
    let cache_dir = TempDir::new().unwrap();
    let mut episode = api_episode("opid", "2020/01/15", "0002T1", 2, "2099-01-01");
    episode.file = Some("https://ruv-vod.example/opid/x.m3u8".to_string());
    let program = program_with(vec![episode]);
    let cache = ProbeCache::open(cache_dir.path(), &program.id);
    let mut crawler = Crawler::new(program, CrawlSettings::default(), cache, &server).with_clock(march_first);

    assert!(crawler.search_for_episodes().unwrap().is_empty());
    assert_eq!(server.head_count(), 0);
}

#[test]
fn test_cadence_beyond_calendar_range_ends_walk() {
    let server = weekly_server();
    let cache_dir = TempDir::new().unwrap();
    let program = program_with(vec![api_episode("opid", "2020/01/15", "0002T1", 2, "2099-01-01")]);
    let cache = ProbeCache::open(cache_dir.path(), &program.id);
    let settings = CrawlSettings {
        iteration_count: 5,
        days_between_episodes: i64::MAX,
    };
    let mut crawler = Crawler::new(program, settings, cache, &server).with_clock(march_first);

    let found = crawler.search_for_episodes().unwrap();
    let filenames: Vec<&str> = found.iter().map(|e| e.filename.as_str()).collect();
    assert_eq!(filenames, ["0002T1"]);
    // The known episode, then one same-day candidate in each direction
    assert_eq!(server.head_count(), 3);
}
