//! Per-program ledger (`program_info.json`)
//!
//! The document is a flat JSON object: numeric keys map season numbers to
//! entry lists, `program` holds the program metadata and `__version__` the
//! schema version the files on disk were last migrated to.
//!
//! ```json
//! {
//!   "__version__": 1,
//!   "program": {"id": "29150", "title": "Krakkafréttir"},
//!   "1": [{"fn": "4986T1", "url": "...", "date": "2020/01/10", "etag": "...", "episode": {}}]
//! }
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::constants::{PROGRAM_INFO_FN, PROGRAM_KEY, VERSION_KEY};
use crate::core::data::{Entry, EntrySet};
use crate::core::migrations::LATEST_VERSION;
use crate::core::programs::Program;
use crate::error::{Result, RuvError};

/// Season number → entries of that season
pub type Seasons = BTreeMap<u32, EntrySet>;

#[derive(Debug, Clone)]
pub struct ProgramLedger {
    path: PathBuf,
    version: u32,
    program: Option<Program>,
    seasons: Seasons,
}

impl ProgramLedger {
    /// Ledger file for `path`, which is either a program directory or the ledger file itself
    pub fn location(path: &Path) -> PathBuf {
        if path.file_name().is_some_and(|name| name == PROGRAM_INFO_FN) {
            path.to_path_buf()
        } else {
            path.join(PROGRAM_INFO_FN)
        }
    }

    /// A fresh ledger at `path`. Nothing needs migrating, so it starts at the
    /// latest schema version.
    pub fn new_empty(path: &Path) -> Self {
        Self {
            path: Self::location(path),
            version: LATEST_VERSION,
            program: None,
            seasons: Seasons::new(),
        }
    }

    /// Load the ledger at `path` (a program directory or the ledger file).
    ///
    /// Fails with [`RuvError::LedgerNotFound`] when there is no file and with
    /// [`RuvError::LedgerUnparseable`] when it is not a valid ledger, including
    /// a ledger whose program has no id.
    pub fn load(path: &Path) -> Result<Self> {
        let path = Self::location(path);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(RuvError::LedgerNotFound(path)),
            Err(e) => return Err(e.into()),
        };

        let document: Map<String, Value> =
            serde_json::from_str(&data).map_err(|e| RuvError::unparseable(&path, e.to_string()))?;
        Self::from_document(path, document)
    }

    fn from_document(path: PathBuf, mut document: Map<String, Value>) -> Result<Self> {
        let version = match document.remove(VERSION_KEY) {
            None | Some(Value::Null) => 0,
            Some(value) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| RuvError::unparseable(&path, format!("bad {}: {}", VERSION_KEY, value)))?,
        };

        let program = match document.remove(PROGRAM_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<Program>(value)
                    .map_err(|e| RuvError::unparseable(&path, format!("could not get program id: {}", e)))?,
            ),
        };

        let mut seasons = Seasons::new();
        for (key, value) in document {
            let season: u32 = key
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| RuvError::unparseable(&path, format!("unexpected key {:?}", key)))?;
            let entries: Vec<Entry> = serde_json::from_value(value)
                .map_err(|e| RuvError::unparseable(&path, format!("season {}: {}", season, e)))?;
            seasons.insert(season, entries.into_iter().collect());
        }

        Ok(Self {
            path,
            version,
            program,
            seasons,
        })
    }

    /// Load the ledger, or start an empty one when there is none or it cannot be read
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(ledger) => Ok(ledger),
            Err(RuvError::LedgerNotFound(_)) => Ok(Self::new_empty(path)),
            Err(e @ RuvError::LedgerUnparseable { .. }) => {
                log::warn!("{}. Starting with an empty program info.", e);
                Ok(Self::new_empty(path))
            }
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Store program metadata (the episode list is not kept)
    pub fn set_program(&mut self, program: &Program) {
        self.program = Some(program.metadata());
    }

    pub fn seasons(&self) -> &Seasons {
        &self.seasons
    }

    pub fn seasons_mut(&mut self) -> &mut Seasons {
        &mut self.seasons
    }

    pub fn set_seasons(&mut self, seasons: Seasons) {
        self.seasons = seasons;
    }

    pub fn take_seasons(&mut self) -> Seasons {
        std::mem::take(&mut self.seasons)
    }

    /// The document as written to disk: version, program, then seasons in
    /// ascending order with entries sorted by date.
    pub fn to_document(&self) -> Result<Map<String, Value>> {
        let mut document = Map::new();
        document.insert(VERSION_KEY.to_string(), Value::from(self.version));
        if let Some(program) = &self.program {
            document.insert(PROGRAM_KEY.to_string(), serde_json::to_value(program)?);
        }
        for (season, entries) in &self.seasons {
            document.insert(season.to_string(), serde_json::to_value(entries.sorted())?);
        }
        Ok(document)
    }

    /// Replace the document on disk as a whole
    pub fn write(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.to_document()?)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!("Wrote {:?}", self.path);
        Ok(())
    }
}

impl std::fmt::Display for ProgramLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.program {
            Some(program) => write!(f, "{} [{}] ({})", program.title, program.id, self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}
