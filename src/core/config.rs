use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::crawler::CrawlSettings;
use crate::error::RuvError;

/// Keys accepted by `config set`
pub const KEYS: &[&str] = &[
    "destination",
    "cache_dir",
    "days_between_episodes",
    "iteration_count",
    "workers",
    "sequential",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root folder of the library (`<destination>/<title>/Season N/...`)
    pub destination: PathBuf,
    /// One probe cache file per program lives here
    pub cache_dir: PathBuf,
    pub days_between_episodes: i64,
    pub iteration_count: usize,
    pub workers: usize,
    /// Download one file at a time instead of on a worker pool
    pub sequential: bool,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let destination = dirs::video_dir()
            .unwrap_or_else(|| home.join("Videos"))
            .join("ruv");
        let crawl = CrawlSettings::default();
        Self {
            destination,
            cache_dir: home.join(".ruvdlcache"),
            days_between_episodes: crawl.days_between_episodes,
            iteration_count: crawl.iteration_count,
            workers: 8,
            sequential: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Read the config at `path`. A missing, empty or corrupted file gives defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(path).with_context(|| format!("Failed to read config file: {:?}", path))?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_json::from_str(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable config {:?}: {}", path, e);
            Config::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let data = serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;
        fs::write(path, data).with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().with_context(|| "Could not determine config directory")?;
        Ok(config_dir.join("ruv-dl").join("config.json"))
    }

    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            iteration_count: self.iteration_count,
            days_between_episodes: self.days_between_episodes,
        }
    }

    /// Update one field from its textual form
    pub fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        match key {
            "destination" => self.destination = PathBuf::from(value),
            "cache_dir" => self.cache_dir = PathBuf::from(value),
            "days_between_episodes" => self.days_between_episodes = parse_positive(key, value)?,
            "iteration_count" => self.iteration_count = parse_positive(key, value)?,
            "workers" => self.workers = parse_positive(key, value)?,
            "sequential" => {
                self.sequential = value
                    .parse()
                    .map_err(|_| RuvError::config(format!("{} must be true or false, got {:?}", key, value)))?;
            }
            _ => {
                return Err(RuvError::config(format!(
                    "Unknown config key {:?}. Known keys: {}",
                    key,
                    KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    /// `(key, value)` pairs for display
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("destination", self.destination.display().to_string()),
            ("cache_dir", self.cache_dir.display().to_string()),
            ("days_between_episodes", self.days_between_episodes.to_string()),
            ("iteration_count", self.iteration_count.to_string()),
            ("workers", self.workers.to_string()),
            ("sequential", self.sequential.to_string()),
        ]
    }
}

fn parse_positive<N>(key: &str, value: &str) -> crate::Result<N>
where
    N: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<N>() {
        Ok(n) if n > N::default() => Ok(n),
        _ => Err(RuvError::config(format!("{} must be a positive number, got {:?}", key, value))),
    }
}
