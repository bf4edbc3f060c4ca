//! Persistent probe cache
//!
//! One JSON document per program, mapping `<YYYY/MM/DD>-<filename>` to the
//! outcome of the last HEAD check. The document carries a format version;
//! a missing or different version discards the whole cache.
//!
//! Nothing is written until [`ProbeCache::write`] is called.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::constants::{CACHE_VERSION, CACHE_VERSION_KEY};
use crate::core::date_utils::{format_date, format_datetime, parse_datetime};
use crate::error::Result;

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found { url: String, etag: String },
    Missing { status_code: u16 },
}

/// A cached probe and when it was made
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredProbe", into = "StoredProbe")]
pub struct ProbeRecord {
    pub outcome: ProbeOutcome,
    pub checked_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize)]
struct StoredProbe {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    checked_at: String,
}

impl TryFrom<StoredProbe> for ProbeRecord {
    type Error = String;

    fn try_from(stored: StoredProbe) -> std::result::Result<Self, Self::Error> {
        let checked_at = parse_datetime(&stored.checked_at).map_err(|e| e.to_string())?;
        let outcome = if stored.success {
            match (stored.url, stored.etag) {
                (Some(url), Some(etag)) if !etag.is_empty() => ProbeOutcome::Found { url, etag },
                _ => return Err("successful probe without url/etag".to_string()),
            }
        } else {
            ProbeOutcome::Missing {
                status_code: stored.status_code.unwrap_or_default(),
            }
        };
        Ok(ProbeRecord {
            outcome,
            checked_at,
        })
    }
}

impl From<ProbeRecord> for StoredProbe {
    fn from(record: ProbeRecord) -> Self {
        let checked_at = format_datetime(record.checked_at);
        match record.outcome {
            ProbeOutcome::Found { url, etag } => StoredProbe {
                success: true,
                url: Some(url),
                etag: Some(etag),
                status_code: None,
                checked_at,
            },
            ProbeOutcome::Missing { status_code } => StoredProbe {
                success: false,
                url: None,
                etag: None,
                status_code: Some(status_code),
                checked_at,
            },
        }
    }
}

impl ProbeRecord {
    pub fn found<U: Into<String>, E: Into<String>>(url: U, etag: E, checked_at: NaiveDateTime) -> Self {
        Self {
            outcome: ProbeOutcome::Found {
                url: url.into(),
                etag: etag.into(),
            },
            checked_at,
        }
    }

    pub fn missing(status_code: u16, checked_at: NaiveDateTime) -> Self {
        Self {
            outcome: ProbeOutcome::Missing { status_code },
            checked_at,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Found { .. })
    }

    /// Whether a negative result for an asset aired on `air_date` should be
    /// dropped and probed again.
    ///
    /// All of these must hold: the asset should exist by now (air date no
    /// later than tomorrow), the check was made before the day after airing,
    /// and the check is more than an hour old. Positive results never expire.
    pub fn is_stale(&self, air_date: NaiveDate, now: NaiveDateTime) -> bool {
        if self.is_success() {
            return false;
        }
        let aired = air_date.and_time(chrono::NaiveTime::MIN);
        let should_have_aired = aired <= now + Duration::days(1);
        let checked_too_early = self.checked_at <= aired + Duration::days(1);
        let checked_long_ago = (now - self.checked_at).abs() > Duration::hours(1);
        should_have_aired && checked_too_early && checked_long_ago
    }
}

/// Probe cache for a single program
#[derive(Debug)]
pub struct ProbeCache {
    location: PathBuf,
    entries: BTreeMap<String, ProbeRecord>,
}

impl ProbeCache {
    /// Open the cache of `program_id` inside `cache_dir`
    pub fn open(cache_dir: &Path, program_id: &str) -> Self {
        Self::load(cache_dir.join(format!("{}.json", program_id)))
    }

    /// Load a cache document. Missing, unreadable or outdated caches start empty.
    pub fn load<P: Into<PathBuf>>(location: P) -> Self {
        let location = location.into();
        let entries = match fs::read_to_string(&location) {
            Ok(data) => Self::parse(&location, &data).unwrap_or_default(),
            Err(_) => BTreeMap::new(),
        };
        Self { location, entries }
    }

    fn parse(location: &Path, data: &str) -> Option<BTreeMap<String, ProbeRecord>> {
        let mut document: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(data) {
            Ok(document) => document,
            Err(e) => {
                log::info!("Could not parse cache {:?} ({}). Starting with empty cache.", location, e);
                return None;
            }
        };

        let saved_version = document.remove(CACHE_VERSION_KEY);
        if saved_version.as_ref().and_then(|v| v.as_str()) != Some(CACHE_VERSION) {
            log::info!(
                "Have cache version {:?} but want \"{}\". Starting with empty cache.",
                saved_version,
                CACHE_VERSION
            );
            return None;
        }
        log::debug!("Cache version OK.");

        let mut entries = BTreeMap::new();
        for (key, value) in document {
            match serde_json::from_value::<ProbeRecord>(value) {
                Ok(record) => {
                    entries.insert(key, record);
                }
                Err(e) => {
                    log::info!("Cache entry {} in {:?} is malformed ({}). Discarding cache.", key, location, e);
                    return None;
                }
            }
        }
        Some(entries)
    }

    /// Cache key for a date/filename pair
    pub fn key(date: NaiveDate, filename: &str) -> String {
        format!("{}-{}", format_date(date), filename)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ProbeRecord> {
        self.entries.get(key)
    }

    pub fn set<K: Into<String>>(&mut self, key: K, record: ProbeRecord) {
        self.entries.insert(key.into(), record);
    }

    pub fn remove(&mut self, key: &str) -> Option<ProbeRecord> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flush the whole document, tagged with the current cache version
    pub fn write(&self) -> Result<()> {
        let mut document = serde_json::Map::new();
        document.insert(
            CACHE_VERSION_KEY.to_string(),
            serde_json::Value::String(CACHE_VERSION.to_string()),
        );
        for (key, record) in &self.entries {
            document.insert(key.clone(), serde_json::to_value(record)?);
        }

        if let Some(parent) = self.location.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.location.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(&document)?)?;
        fs::rename(&tmp, &self.location)?;
        log::debug!("Wrote {} cache entries to {:?}", self.entries.len(), self.location);
        Ok(())
    }
}
