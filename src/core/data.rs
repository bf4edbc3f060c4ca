//! Entry data model
//!
//! An [`Entry`] is one resolved media asset. Identity is the transport
//! etag: the same content is often reachable under several date/filename
//! guesses, so two entries with the same etag are the same episode no matter
//! what else differs.
//!
//! [`EntrySet`] deduplicates entries by that identity and knows how to infer
//! missing episode numbers from neighbours that carry real API metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::core::constants::MEDIA_EXTENSION;
use crate::core::date_utils::serde_date;
use crate::error::{Result, RuvError};

/// Episode metadata, either from the program API or generated locally.
///
/// Only `id` and `number` are interpreted; everything else the API sends is
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(
        default,
        deserialize_with = "deserialize_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,

    /// Manifest URL of the episode (API episodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_expires: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Episode {
    pub fn with_number(number: u32) -> Self {
        Self {
            number: Some(number),
            ..Default::default()
        }
    }

    /// True when the episode carries an id handed out by the program API
    pub fn has_identity(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    // API id > recorded number > nothing
    fn rank(&self) -> u8 {
        if self.has_identity() {
            2
        } else if self.number.is_some_and(|n| n > 0) {
            1
        } else {
            0
        }
    }
}

// The API hands out ids both as strings and as numbers.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// Older ledgers store `"episode": null`.
fn deserialize_episode<'de, D>(deserializer: D) -> std::result::Result<Episode, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Episode>::deserialize(deserializer)?.unwrap_or_default())
}

/// One resolved media asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "fn")]
    pub filename: String,
    pub url: String,
    #[serde(with = "serde_date")]
    pub date: NaiveDate,
    pub etag: String,
    #[serde(default, deserialize_with = "deserialize_episode")]
    pub episode: Episode,
    #[serde(skip)]
    target_path: Option<PathBuf>,
}

impl Entry {
    pub fn new<F, U, E>(filename: F, url: U, date: NaiveDate, etag: E, episode: Option<Episode>) -> Self
    where
        F: Into<String>,
        U: Into<String>,
        E: Into<String>,
    {
        Self {
            filename: filename.into(),
            url: url.into(),
            date,
            etag: etag.into(),
            episode: episode.unwrap_or_default(),
            target_path: None,
        }
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.target_path.as_deref()
    }

    pub fn set_target_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.target_path = Some(path.into());
    }

    /// Whether the organized file is already present.
    ///
    /// Fails when called before the organizer assigned a target path.
    pub fn exists_on_disk(&self) -> Result<bool> {
        match &self.target_path {
            Some(path) => Ok(path.exists()),
            None => Err(RuvError::MissingTargetPath(format!(
                "{} ({})",
                self.filename, self.etag
            ))),
        }
    }

    /// File extension of the asset, taken from its URL
    pub fn extension(&self) -> &str {
        self.url
            .rsplit('/')
            .next()
            .and_then(|name| name.split('?').next())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(MEDIA_EXTENSION)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.etag == other.etag
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.etag.hash(state);
    }
}

/// Name of a season folder: `<destination>/<title>/Season <n>`
pub fn season_folder(destination: &Path, title: &str, season: u32) -> PathBuf {
    destination.join(title).join(format!("Season {}", season))
}

/// Basename of an episode file: `<title> - SxxEyy.<ext>`
pub fn episode_basename(title: &str, season: u32, episode: u32, extension: &str) -> String {
    format!("{} - S{:02}E{:02}.{}", title, season, episode, extension)
}

/// Deduplicating collection of entries, keyed by etag.
///
/// Insertion order is kept; it breaks ties between entries aired on the same
/// date in [`EntrySet::sorted`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntrySet {
    items: Vec<Entry>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, merging with an existing member of the same etag.
    ///
    /// Merge policy: an entry with an API episode id beats one with only a
    /// number, which beats one with an empty episode. On equal footing the
    /// incoming entry replaces the member (last write wins). The merged entry
    /// keeps the member's insertion slot.
    pub fn add(&mut self, item: Entry) {
        match self.items.iter().position(|e| *e == item) {
            Some(pos) => {
                if Self::incoming_wins(&self.items[pos], &item) {
                    self.items[pos] = item;
                }
            }
            None => self.items.push(item),
        }
    }

    fn incoming_wins(existing: &Entry, incoming: &Entry) -> bool {
        incoming.episode.rank() >= existing.episode.rank()
    }

    /// Remove the member equal to `item`, returning it
    pub fn remove(&mut self, item: &Entry) -> Option<Entry> {
        let pos = self.items.iter().position(|e| e == item)?;
        Some(self.items.remove(pos))
    }

    pub fn contains(&self, item: &Entry) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entry> {
        self.items.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.items.get_mut(index)
    }

    /// Entries sorted by air date, stable with respect to insertion order
    pub fn sorted(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.items.iter().collect();
        entries.sort_by_key(|e| e.date);
        entries
    }

    /// Reorder the set in place into its sorted view
    pub fn sort(&mut self) {
        self.items.sort_by_key(|e| e.date);
    }

    /// Infer the episode number for sorted position `index`.
    ///
    /// Uses the nearest entry (ties go to the earlier one) that carries both
    /// an API id and a number: `number[k] + (index - k)`. `None` when no entry
    /// carries API metadata. An anchor late in the season can push the
    /// result to zero or below; that is reported as `None` as well.
    pub fn find_target_number(&self, index: usize) -> Option<u32> {
        let sorted = self.sorted();
        let (k, anchor) = sorted
            .iter()
            .enumerate()
            .filter(|(_, e)| e.episode.has_identity())
            .filter_map(|(k, e)| e.episode.number.map(|n| (k, n)))
            .min_by_key(|(k, _)| k.abs_diff(index))?;

        let target = i64::from(anchor) + index as i64 - k as i64;
        u32::try_from(target).ok().filter(|n| *n > 0)
    }
}

impl FromIterator<Entry> for EntrySet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut set = EntrySet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Entry> for EntrySet {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        for entry in iter {
            self.add(entry);
        }
    }
}

impl IntoIterator for EntrySet {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntrySet {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl std::ops::Index<usize> for EntrySet {
    type Output = Entry;

    fn index(&self, index: usize) -> &Entry {
        &self.items[index]
    }
}
