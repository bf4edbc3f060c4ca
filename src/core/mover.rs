//! Renaming episodes and seasons while keeping the ledger in sync
//!
//! Paths follow `Season <N>/<title> - S<NN>E<NN>.<ext>`. A file source is an
//! episode move within one season; a directory source is a season move.
//! Everything is validated and planned before the first file is touched,
//! and in dry-run mode nothing is touched at all.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};
use std::sync::LazyLock;

use crate::core::data::episode_basename;
use crate::core::program_info::ProgramLedger;
use crate::core::relocate::{move_path, MovePlan};
use crate::error::{Result, RuvError};

static SEASON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Season (\d+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Episode,
    Season,
}

/// What a move did, or would do in dry-run mode
#[derive(Debug, Clone)]
pub struct MoveReport {
    pub kind: MoveKind,
    pub src: PathBuf,
    pub dst: PathBuf,
    /// File moves, in execution order
    pub plan: MovePlan,
    pub ledger: PathBuf,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct Mover {
    src: PathBuf,
    dst: PathBuf,
    dry_run: bool,
    ledger: ProgramLedger,
}

impl Mover {
    /// Validate both paths and locate the ledger governing `src` by walking
    /// up its parent directories.
    pub fn new<S: Into<PathBuf>, D: Into<PathBuf>>(src: S, dst: D, dry_run: bool) -> Result<Self> {
        let (src, dst) = (src.into(), dst.into());
        for path in [&src, &dst] {
            if !path.is_absolute() {
                return Err(RuvError::NotAbsolute(path.clone()));
            }
        }
        if dst.exists() {
            return Err(RuvError::AlreadyExists(dst));
        }

        let ledger = find_ledger(&src)?;
        log::debug!("Using {} for {}", ledger.path().display(), src.display());
        Ok(Self {
            src,
            dst,
            dry_run,
            ledger,
        })
    }

    pub fn run(&mut self) -> Result<MoveReport> {
        if self.src.is_dir() {
            self.move_season()
        } else {
            self.move_episode()
        }
    }

    fn report(&self, kind: MoveKind, plan: MovePlan) -> MoveReport {
        MoveReport {
            kind,
            src: self.src.clone(),
            dst: self.dst.clone(),
            plan,
            ledger: self.ledger.path().to_path_buf(),
            dry_run: self.dry_run,
        }
    }

    fn title(&self) -> Result<String> {
        self.ledger
            .program()
            .map(|p| p.title.clone())
            .ok_or_else(|| RuvError::program_info(format!("No program in {}", self.ledger.path().display())))
    }

    fn move_episode(&mut self) -> Result<MoveReport> {
        let title = self.title()?;
        let (src_season, src_episode) = episode_season_and_number(&title, &self.src)?;
        let (dst_season, dst_episode) = episode_season_and_number(&title, &self.dst)?;
        if src_season != dst_season {
            return Err(RuvError::unsupported_move("Moving episodes between seasons is not supported"));
        }

        let season_number = season_number(self.src.parent().unwrap_or(&self.src))?;
        let entries = self.ledger.seasons().get(&season_number).ok_or_else(|| {
            RuvError::program_info(format!(
                "Source season number {} not found in info file {}",
                season_number,
                self.ledger.path().display()
            ))
        })?;

        let mut src_index = None;
        for (i, entry) in entries.iter().enumerate() {
            if entry.episode.number == Some(src_episode) {
                if src_index.is_some() {
                    return Err(RuvError::program_info("Found two entries with same number in program info."));
                }
                src_index = Some(i);
            }
            if entry.episode.number == Some(dst_episode) {
                return Err(RuvError::program_info("Destination episode found in program info file."));
            }
        }
        let src_index =
            src_index.ok_or_else(|| RuvError::program_info("Source episode not found in program info file"))?;

        let mut plan = MovePlan::new();
        plan.push(&self.src, &self.dst);
        plan.validate()?;

        if self.dry_run {
            log::warn!("Dryrun. Would move {} to {}.", self.src.display(), self.dst.display());
            return Ok(self.report(MoveKind::Episode, plan));
        }

        move_path(&self.src, &self.dst)?;
        if let Some(entry) = self
            .ledger
            .seasons_mut()
            .get_mut(&season_number)
            .and_then(|entries| entries.get_mut(src_index))
        {
            entry.episode.number = Some(dst_episode);
        }
        self.ledger.write()?;
        Ok(self.report(MoveKind::Episode, plan))
    }

    fn move_season(&mut self) -> Result<MoveReport> {
        let src_season = season_number(&self.src)?;
        let dst_season = season_number(&self.dst)?;
        if !self.ledger.seasons().contains_key(&src_season) {
            return Err(RuvError::program_info(format!(
                "Source season number {} not found in info file {}",
                src_season,
                self.ledger.path().display()
            )));
        }
        if self.ledger.seasons().contains_key(&dst_season) {
            return Err(RuvError::program_info(format!(
                "Destination season number {} already in info file {}",
                dst_season,
                self.ledger.path().display()
            )));
        }

        let title = self.title()?;
        let mut files: Vec<PathBuf> = fs::read_dir(&self.src)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        files.sort();

        let mut plan = MovePlan::new();
        for src in files {
            let (_, episode) = episode_season_and_number(&title, &src)?;
            let extension = src.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default();
            plan.push(&src, self.dst.join(episode_basename(&title, dst_season, episode, &extension)));
        }
        plan.validate()?;

        if self.dry_run {
            log::warn!("Dryrun. Would move {} to {}.", self.src.display(), self.dst.display());
            for planned in plan.moves() {
                log::warn!("Would also move {} prior to moving season", planned);
            }
            return Ok(self.report(MoveKind::Season, plan));
        }

        fs::create_dir_all(&self.dst)?;
        plan.execute()?;
        fs::remove_dir(&self.src)?;

        let seasons = self.ledger.seasons_mut();
        if let Some(entries) = seasons.remove(&src_season) {
            seasons.insert(dst_season, entries);
        }
        self.ledger.write()?;
        Ok(self.report(MoveKind::Season, plan))
    }
}

/// Nearest ledger in the ancestors of `src`
fn find_ledger(src: &Path) -> Result<ProgramLedger> {
    for dir in src.ancestors().skip(1) {
        match ProgramLedger::load(dir) {
            Ok(ledger) => return Ok(ledger),
            Err(RuvError::LedgerNotFound(_)) => continue,
            Err(e @ RuvError::LedgerUnparseable { .. }) => {
                log::warn!("{}", e);
                continue;
            }
            Err(e) => return Err(e),
        }
    }
    Err(RuvError::not_found(format!(
        "Could not find program info related to {}",
        src.display()
    )))
}

/// Season number from a `Season <N>` directory name
pub fn season_number(path: &Path) -> Result<u32> {
    path.file_name()
        .and_then(|name| SEASON_RE.captures(&name.to_string_lossy()).and_then(|c| c[1].parse().ok()))
        .ok_or_else(|| RuvError::naming_schema(format!("Season number not determined from {}", path.display())))
}

/// Season and episode number from `.../Season <N>/<title> - S<NN>E<NN>.<ext>`
pub fn episode_season_and_number(title: &str, path: &Path) -> Result<(u32, u32)> {
    let pattern = format!(
        r"Season (\d+){}{} - S(\d+)E(\d+)\.[^./]+$",
        regex::escape(MAIN_SEPARATOR_STR),
        regex::escape(title)
    );
    let re = Regex::new(&pattern).map_err(|e| RuvError::other(e.to_string()))?;
    let text = path.to_string_lossy();

    let caps = re.captures(&text).ok_or_else(|| {
        RuvError::naming_schema(format!("Episode/season number not determined from {}", path.display()))
    })?;
    let number = |i: usize| -> Result<u32> {
        caps[i]
            .parse()
            .map_err(|_| RuvError::naming_schema(format!("Bad number in {}", path.display())))
    };
    let (folder_season, file_season, episode) = (number(1)?, number(2)?, number(3)?);
    if folder_season != file_season {
        return Err(RuvError::naming_schema(format!(
            "Season number in folder and filename differ in \"{}\"",
            path.display()
        )));
    }
    Ok((folder_season, episode))
}
