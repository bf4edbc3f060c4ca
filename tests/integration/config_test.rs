// Config persistence tests

use ruvdl::core::crawler::CrawlSettings;
use ruvdl::Config;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_save_and_load_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ruv-dl/config.json");

    let mut config = Config::default();
    config.set("destination", "/srv/tv").unwrap();
    config.set("iteration_count", "9").unwrap();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.destination, PathBuf::from("/srv/tv"));
    assert_eq!(
        loaded.crawl_settings(),
        CrawlSettings {
            iteration_count: 9,
            days_between_episodes: 7
        }
    );
}

#[test]
fn test_corrupted_config_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.json");
    fs::write(&path, "{not json").unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());

    fs::write(&path, "").unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_entries_cover_every_key() {
    let config = Config::default();
    let keys: Vec<&str> = config.entries().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ruvdl::core::config::KEYS);
}
