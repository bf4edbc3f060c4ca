//! Season grouping, numbering and target paths for crawled entries

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;

use crate::core::constants::SEASON_GAP_DAYS;
use crate::core::data::{episode_basename, season_folder, Entry, EntrySet};
use crate::core::migrations;
use crate::core::program_info::{ProgramLedger, Seasons};
use crate::core::programs::Program;
use crate::error::Result;

/// Result of organizing one program
#[derive(Debug)]
pub struct Organized {
    pub ledger: ProgramLedger,
    /// Entries whose target file does not exist yet. Empty while migrations are pending.
    pub missing: Vec<Entry>,
    pub pending_migrations: Vec<u32>,
}

pub struct Organizer<'p> {
    destination: PathBuf,
    program: &'p Program,
}

impl<'p> Organizer<'p> {
    pub fn new<P: Into<PathBuf>>(destination: P, program: &'p Program) -> Self {
        Self {
            destination: destination.into(),
            program,
        }
    }

    /// Folder holding the program's seasons and ledger
    pub fn program_dir(&self) -> PathBuf {
        self.destination.join(&self.program.title)
    }

    /// Load this program's ledger from disk (empty when absent) and organize into it
    pub fn organize_on_disk(&self, fresh: EntrySet) -> Result<Organized> {
        let program_dir = self.program_dir();
        fs::create_dir_all(&program_dir)?;
        let ledger = ProgramLedger::load_or_empty(&program_dir)?;
        self.organize(ledger, fresh)
    }

    /// Merge `fresh` into the ledger's seasons, number and place every entry,
    /// persist the ledger and report which entries still need downloading.
    pub fn organize(&self, mut ledger: ProgramLedger, fresh: EntrySet) -> Result<Organized> {
        log::info!("Organizing {}", self.program.title);

        let mut seasons = ledger.take_seasons();
        assign_seasons(&mut seasons, fresh);
        self.place(&mut seasons)?;
        dedup_etags(&mut seasons);

        ledger.set_seasons(seasons);
        ledger.set_program(self.program);
        ledger.write()?;

        let pending_migrations = migrations::pending(ledger.version());
        if !pending_migrations.is_empty() {
            for n in &pending_migrations {
                log::error!(
                    "Missing migration {n}. Run `ruv-dl migrate {n}`. You can supply `--dryrun` \
                     (e.g. `ruv-dl --dryrun migrate ...`) to see what will be done."
                );
            }
            return Ok(Organized {
                ledger,
                missing: Vec::new(),
                pending_migrations,
            });
        }

        let mut missing = Vec::new();
        for entry in ledger.seasons().values().flat_map(|entries| entries.iter()) {
            if !entry.exists_on_disk()? {
                missing.push(entry.clone());
            }
        }
        Ok(Organized {
            ledger,
            missing,
            pending_migrations,
        })
    }

    /// Number every entry and assign its target path, creating season folders.
    ///
    /// An inferred number already used in the season is replaced by the
    /// next number after the highest one in use.
    fn place(&self, seasons: &mut Seasons) -> Result<()> {
        for (season, entries) in seasons.iter_mut() {
            let folder = season_folder(&self.destination, &self.program.title, *season);
            fs::create_dir_all(&folder)?;

            entries.sort();
            let mut taken: BTreeSet<u32> = entries
                .iter()
                .filter_map(|e| e.episode.number)
                .filter(|n| *n != 0)
                .collect();
            for i in 0..entries.len() {
                if entries[i].episode.number.unwrap_or(0) != 0 {
                    continue;
                }
                let mut number = entries
                    .find_target_number(i)
                    .unwrap_or_else(|| u32::try_from(i + 1).unwrap_or(u32::MAX));
                if taken.contains(&number) {
                    let next = taken.last().map_or(1, |max| max.saturating_add(1));
                    log::debug!("Episode {} already taken in season {}, using {}", number, season, next);
                    number = next;
                }
                taken.insert(number);
                if let Some(entry) = entries.get_mut(i) {
                    log::debug!("{} gets episode number {} in season {}", entry.filename, number, season);
                    entry.episode.number = Some(number);
                }
            }
            for entry in entries.iter_mut() {
                let number = entry.episode.number.unwrap_or_default();
                let basename = episode_basename(&self.program.title, *season, number, entry.extension());
                entry.set_target_path(folder.join(basename));
            }
        }
        Ok(())
    }
}

/// Put each fresh entry, oldest first, into the first season that has a
/// member aired less than [`SEASON_GAP_DAYS`] apart, or open a new season.
pub fn assign_seasons(seasons: &mut Seasons, fresh: EntrySet) {
    let mut fresh: Vec<Entry> = fresh.into_iter().collect();
    fresh.sort_by_key(|e| e.date);

    for entry in fresh {
        let near = seasons
            .iter()
            .find(|(_, members)| {
                members
                    .iter()
                    .any(|m| (m.date - entry.date).num_days().abs() < SEASON_GAP_DAYS)
            })
            .map(|(season, _)| *season);

        match near {
            Some(season) => {
                if let Some(members) = seasons.get_mut(&season) {
                    members.add(entry);
                }
            }
            None => {
                let season = seasons.keys().next_back().map_or(1, |max| max + 1);
                seasons.insert(season, std::iter::once(entry).collect());
            }
        }
    }
}

/// Keep the first occurrence of each etag, walking seasons in ascending order
pub fn dedup_etags(seasons: &mut Seasons) {
    let mut seen: HashSet<String> = HashSet::new();
    for entries in seasons.values_mut() {
        let duplicates: Vec<Entry> = entries.iter().filter(|e| seen.contains(&e.etag)).cloned().collect();
        for duplicate in &duplicates {
            log::debug!("Dropping duplicate {} ({})", duplicate.filename, duplicate.etag);
            entries.remove(duplicate);
        }
        seen.extend(entries.iter().map(|e| e.etag.clone()));
    }
}
