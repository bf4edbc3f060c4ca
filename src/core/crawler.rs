//! Episode crawler
//!
//! RÚV serves episodes as `<host>/<access>/<YYYY/MM/DD>/2400kbps/<fn>.mp4`
//! where `<fn>` is `<episode id><delimiter><remainder>`, e.g. `4986T1`.
//! Starting from the episodes the program API still lists, the crawler
//! guesses neighbours by stepping the numeric id and the air date, and
//! confirms each guess with a HEAD request. Results are remembered in the
//! program's [`ProbeCache`].

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use std::fmt;

use crate::core::cache::{ProbeCache, ProbeOutcome, ProbeRecord};
use crate::core::constants::{probe_url, DATE_PART_LENGTH, FILENAME_DELIMITERS, OPEN_ACCESS};
use crate::core::data::{Entry, EntrySet, Episode};
use crate::core::date_utils::{format_date, parse_date};
use crate::core::programs::Program;
use crate::core::transport::Transport;
use crate::error::{Result, RuvError};

/// Filename split into its numeric episode id and the rest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameCode {
    pub id: u64,
    width: usize,
    pub delimiter: char,
    pub remainder: String,
}

impl FilenameCode {
    /// Parse with the known delimiters, in order. The first one that splits the
    /// filename into exactly a numeric id and a remainder wins.
    pub fn parse(filename: &str) -> Result<Self> {
        FILENAME_DELIMITERS
            .iter()
            .find_map(|&delimiter| Self::parse_with(filename, delimiter))
            .ok_or_else(|| RuvError::UnknownFilenameEncoding {
                filename: filename.to_string(),
                delimiters: FILENAME_DELIMITERS.iter().collect(),
            })
    }

    fn parse_with(filename: &str, delimiter: char) -> Option<Self> {
        let mut parts = filename.split(delimiter);
        let id_part = parts.next()?;
        let remainder = parts.next()?;
        if parts.next().is_some() || id_part.is_empty() || !id_part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            id: id_part.parse().ok()?,
            width: id_part.len(),
            delimiter,
            remainder: remainder.to_string(),
        })
    }

    /// The neighbouring filename `direction` steps away, `None` below zero
    pub fn step(&self, direction: i64) -> Option<Self> {
        let id = self.id.checked_add_signed(direction)?;
        Some(Self { id, ..self.clone() })
    }
}

impl fmt::Display for FilenameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}{}{}", self.id, self.delimiter, self.remainder, width = self.width)
    }
}

/// Filename of the neighbouring episode. `Ok(None)` when the id would go negative.
pub fn next_filename(filename: &str, direction: i64) -> Result<Option<String>> {
    Ok(FilenameCode::parse(filename)?.step(direction).map(|code| code.to_string()))
}

/// Where a known episode lives, extracted from its manifest URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRef {
    pub date: NaiveDate,
    pub filename: String,
    pub prefer_open: bool,
}

impl StreamRef {
    /// Parse `...?streams=YYYY/MM/DD/2400kbps/<fn>.mp4.tmp,...`
    pub fn from_manifest(manifest_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(manifest_url)
            .map_err(|e| RuvError::other(format!("Invalid manifest url {}: {}", manifest_url, e)))?;
        let streams = parsed
            .query_pairs()
            .find(|(key, _)| key == "streams")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| RuvError::other(format!("No streams parameter in {}", manifest_url)))?;
        let wanted_stream = streams.split(',').next().unwrap_or_default();

        let date_str = wanted_stream.get(..DATE_PART_LENGTH).unwrap_or(wanted_stream);
        let date = parse_date(date_str).map_err(|_| {
            RuvError::other(format!("Could not parse date {} from {}", date_str, wanted_stream))
        })?;

        let filename = wanted_stream
            .rsplit('/')
            .next()
            .and_then(|name| name.split('.').next())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RuvError::other(format!("No filename in {}", wanted_stream)))?;

        Ok(Self {
            date,
            filename: filename.to_string(),
            prefer_open: manifest_url.contains(OPEN_ACCESS),
        })
    }
}

/// Search horizon of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Dates tried per step before a direction is given up
    pub iteration_count: usize,
    /// Expected release cadence
    pub days_between_episodes: i64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            iteration_count: 5,
            days_between_episodes: 7,
        }
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct Crawler<'t, T: Transport + ?Sized> {
    program: Program,
    settings: CrawlSettings,
    prefer_open: bool,
    cache: ProbeCache,
    transport: &'t T,
    clock: fn() -> NaiveDateTime,
}

impl<'t, T: Transport + ?Sized> Crawler<'t, T> {
    pub fn new(program: Program, settings: CrawlSettings, cache: ProbeCache, transport: &'t T) -> Self {
        log::debug!(
            "Initializing crawler for {} with iteration count {} and {} days between episodes",
            program.title,
            settings.iteration_count,
            settings.days_between_episodes
        );
        Self {
            program,
            settings,
            prefer_open: true,
            cache,
            transport,
            clock: local_now,
        }
    }

    /// Replace the wall clock, for deterministic eviction
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &ProbeCache {
        &self.cache
    }

    /// Resolve a date/filename pair to an entry, probing on cache miss.
    ///
    /// A stale negative result is evicted and probed once more.
    pub fn get_entry(&mut self, date: NaiveDate, filename: &str, episode: Option<Episode>) -> Result<Option<Entry>> {
        self.resolve(date, filename, episode, true)
    }

    fn resolve(
        &mut self,
        date: NaiveDate,
        filename: &str,
        episode: Option<Episode>,
        allow_retry: bool,
    ) -> Result<Option<Entry>> {
        let key = ProbeCache::key(date, filename);
        if !self.cache.has(&key) {
            let record = self.probe(date, filename)?;
            self.cache.set(key.clone(), record);
        }

        let Some(record) = self.cache.get(&key).cloned() else {
            return Ok(None);
        };
        let stale = record.is_stale(date, (self.clock)());
        match record.outcome {
            ProbeOutcome::Found { url, etag } => Ok(Some(Entry::new(filename, url, date, etag, episode))),
            ProbeOutcome::Missing { .. } => {
                if allow_retry && stale {
                    log::debug!("Evicting stale negative result for {}", key);
                    self.cache.remove(&key);
                    return self.resolve(date, filename, episode, false);
                }
                Ok(None)
            }
        }
    }

    fn probe(&self, date: NaiveDate, filename: &str) -> Result<ProbeRecord> {
        let date_str = format_date(date);
        let url = probe_url(&date_str, filename, self.prefer_open);
        let response = self.transport.head(&url)?;
        log::info!(
            "Checking {} - {} - {} (is_open: {})",
            date_str,
            filename,
            response.ok,
            self.prefer_open
        );

        let now = (self.clock)();
        Ok(match (response.ok, response.etag) {
            (true, Some(etag)) => ProbeRecord::found(response.final_url, etag, now),
            (true, None) => {
                log::warn!("{} answered without an ETag, treating as missing", url);
                ProbeRecord::missing(response.status_code, now)
            }
            (false, _) => ProbeRecord::missing(response.status_code, now),
        })
    }

    /// Lazily walk away from a resolved episode in one direction of time
    pub fn walk(&mut self, date: NaiveDate, filename: &str, direction: i64) -> Walk<'_, 't, T> {
        Walk {
            crawler: self,
            cursor: Some((date, filename.to_string())),
            direction,
        }
    }

    /// Find every episode reachable from the program's known episodes.
    ///
    /// The probe cache is flushed once at the end, also when the search failed.
    pub fn search_for_episodes(&mut self) -> Result<EntrySet> {
        let mut files = EntrySet::new();
        let outcome = self.collect(&mut files);
        self.cache.write()?;
        outcome?;
        Ok(files)
    }

    fn collect(&mut self, files: &mut EntrySet) -> Result<()> {
        let episodes = self.program.episodes.clone();
        if episodes.is_empty() {
            log::info!("No episodes found for {}", self.program.title);
        }

        for episode in episodes {
            let Some(manifest_url) = episode.file.clone() else {
                log::info!("Episode {:?} has no manifest url", episode.id);
                continue;
            };
            let stream = match StreamRef::from_manifest(&manifest_url) {
                Ok(stream) => stream,
                Err(e) => {
                    log::info!("{}", e);
                    continue;
                }
            };
            self.prefer_open = stream.prefer_open;

            match self.get_entry(stream.date, &stream.filename, Some(episode.clone()))? {
                Some(first_entry) => files.add(first_entry),
                None => {
                    if self.is_expired(&episode) {
                        log::warn!(
                            "File {} expired at {}",
                            stream.filename,
                            episode.file_expires.as_deref().unwrap_or_default()
                        );
                        continue;
                    }
                    return Err(RuvError::UnresolvableEpisode(format!(
                        "{} ({})",
                        stream.filename,
                        format_date(stream.date)
                    )));
                }
            }

            log::debug!("Searching backwards in time...");
            for entry in self.walk(stream.date, &stream.filename, -1) {
                files.add(entry?);
            }
            log::debug!("Searching forward in time...");
            for entry in self.walk(stream.date, &stream.filename, 1) {
                files.add(entry?);
            }
        }
        Ok(())
    }

    fn is_expired(&self, episode: &Episode) -> bool {
        let today = (self.clock)().date();
        match episode.file_expires.as_deref().map(parse_date) {
            Some(Ok(expires)) => expires <= today,
            Some(Err(e)) => {
                log::info!("Could not parse expiry date: {}", e);
                false
            }
            None => false,
        }
    }
}

/// One direction of a crawl.
///
/// Each item is the next episode found; the walk continues from that
/// episode's date so the cadence corrects itself. It ends at the first step
/// where none of the candidate dates resolve.
pub struct Walk<'c, 't, T: Transport + ?Sized> {
    crawler: &'c mut Crawler<'t, T>,
    cursor: Option<(NaiveDate, String)>,
    direction: i64,
}

impl<T: Transport + ?Sized> Iterator for Walk<'_, '_, T> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let (date, filename) = self.cursor.take()?;
        let candidate_fn = match next_filename(&filename, self.direction) {
            Ok(Some(candidate_fn)) => candidate_fn,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };

        // A step past the calendar's range ends the walk
        let step = self.direction.checked_mul(self.crawler.settings.days_between_episodes)?;
        for i in 0..self.crawler.settings.iteration_count {
            let days = i64::try_from(i).ok().and_then(|i| i.checked_mul(step))?;
            let candidate_date = date.checked_add_signed(Duration::try_days(days)?)?;
            match self.crawler.get_entry(candidate_date, &candidate_fn, None) {
                Ok(Some(entry)) => {
                    self.cursor = Some((candidate_date, candidate_fn));
                    return Some(Ok(entry));
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
