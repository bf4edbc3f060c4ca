//! Planned file moves
//!
//! Multi-file renames (season moves, migrations) are collected into a
//! [`MovePlan`] and validated as a whole before anything touches the disk.
//! When one planned destination is the source of another move (E01 → E02
//! while E02 → E03) every source is first staged under a temporary sibling
//! name, then moved into place.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, RuvError};

const STAGING_SUFFIX: &str = "ruvdl-staging";

/// One rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub src: PathBuf,
    pub dst: PathBuf,
}

impl fmt::Display for PlannedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src.display(), self.dst.display())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovePlan {
    moves: Vec<PlannedMove>,
}

impl MovePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<S: Into<PathBuf>, D: Into<PathBuf>>(&mut self, src: S, dst: D) {
        let (src, dst) = (src.into(), dst.into());
        if src != dst {
            self.moves.push(PlannedMove { src, dst });
        }
    }

    pub fn moves(&self) -> &[PlannedMove] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Check the whole plan against the filesystem without changing anything
    pub fn validate(&self) -> Result<()> {
        let sources: HashSet<&Path> = self.moves.iter().map(|m| m.src.as_path()).collect();
        let mut destinations = HashSet::new();

        for planned in &self.moves {
            if !planned.src.exists() {
                return Err(RuvError::not_found(format!("{} does not exist", planned.src.display())));
            }
            if !destinations.insert(planned.dst.as_path()) {
                return Err(RuvError::AlreadyExists(planned.dst.clone()));
            }
            if planned.dst.exists() && !sources.contains(planned.dst.as_path()) {
                return Err(RuvError::AlreadyExists(planned.dst.clone()));
            }
        }
        Ok(())
    }

    fn needs_staging(&self) -> bool {
        self.moves.iter().any(|m| m.dst.exists())
    }

    /// Validate, then carry out every move
    pub fn execute(&self) -> Result<()> {
        self.validate()?;

        if !self.needs_staging() {
            for planned in &self.moves {
                log::info!("Moving {}", planned);
                move_path(&planned.src, &planned.dst)?;
            }
            return Ok(());
        }

        let mut staged = Vec::with_capacity(self.moves.len());
        for planned in &self.moves {
            let staging = staging_path(&planned.src)?;
            log::debug!("Staging {} as {}", planned.src.display(), staging.display());
            move_path(&planned.src, &staging)?;
            staged.push((staging, &planned.dst));
        }
        for (staging, dst) in staged {
            log::info!("Moving {} -> {}", staging.display(), dst.display());
            move_path(&staging, dst)?;
        }
        Ok(())
    }
}

impl fmt::Display for MovePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for planned in &self.moves {
            writeln!(f, "{}", planned)?;
        }
        Ok(())
    }
}

fn staging_path(src: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| RuvError::other(format!("Cannot stage {}", src.display())))?;
    let staging = src.with_file_name(format!(".{}.{}", name.to_string_lossy(), STAGING_SUFFIX));
    if staging.exists() {
        return Err(RuvError::AlreadyExists(staging));
    }
    Ok(staging)
}

/// Rename `src` to `dst`, creating missing parents. Files fall back to
/// copy + remove when a plain rename is impossible (other filesystem).
pub fn move_path(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if src.is_file() => {
            log::debug!("rename {} failed ({}), copying instead", src.display(), e);
            fs::copy(src, dst)?;
            fs::remove_file(src)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
