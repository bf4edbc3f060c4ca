// Program lookup against the RÚV API, and discovery of programs already on disk

use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

use crate::core::constants::{API_BASE, PROGRAM_INFO_FN};
use crate::core::data::Episode;
use crate::core::program_info::ProgramLedger;
use crate::error::{Result, RuvError};

/// Program metadata as served by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(deserialize_with = "deserialize_program_id")]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<Episode>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Program {
    pub fn new<I: Into<String>, T: Into<String>>(id: I, title: T) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// The program without its episode list, as stored in the ledger
    pub fn metadata(&self) -> Program {
        Program {
            episodes: Vec::new(),
            ..self.clone()
        }
    }
}

fn deserialize_program_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid program id: {}", other))),
    }
}

/// A search hit
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramSummary {
    #[serde(deserialize_with = "deserialize_program_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    programs: Vec<ProgramSummary>,
}

/// Client for the program API
#[derive(Debug, Clone)]
pub struct ProgramFetcher {
    client: Client,
    base_url: String,
}

impl ProgramFetcher {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, API_BASE)
    }

    pub fn with_base_url<S: Into<String>>(client: Client, base_url: S) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch a program with its full episode list.
    ///
    /// A non-success status is logged and yields `Ok(None)`.
    pub fn get_program(&self, program_id: &str) -> Result<Option<Program>> {
        let url = self.endpoint(&["program", program_id, "all"])?;
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            log::warn!(
                "Request for program {} failed with status code {}.",
                program_id,
                response.status().as_u16()
            );
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// Search TV programs by free text
    pub fn search(&self, query: &str) -> Result<Vec<ProgramSummary>> {
        let url = self.endpoint(&["search", "tv", query])?;
        let response = self.client.get(url).send()?.error_for_status()?;
        let body: SearchResponse = response.json()?;
        Ok(body.programs)
    }

    /// API url with `segments` appended to the base path, each one escaped
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RuvError::other(format!("Invalid API base url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| RuvError::other(format!("API base url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Resolve a query to a program id. Digits are taken as an id; otherwise the
    /// API is searched and `choose` picks among several hits.
    pub fn resolve_program_id<F>(&self, query: &str, choose: F) -> Result<Option<String>>
    where
        F: FnOnce(&[ProgramSummary]) -> Result<Option<usize>>,
    {
        if !query.is_empty() && query.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Some(query.to_string()));
        }

        let programs = self.search(query)?;
        match programs.len() {
            0 => Err(RuvError::not_found(format!("No programs found matching {}", query))),
            1 => Ok(Some(programs[0].id.clone())),
            _ => Ok(choose(&programs)?.and_then(|i| programs.get(i)).map(|p| p.id.clone())),
        }
    }
}

/// Ids of every program with a readable ledger under `destination`
pub fn programs_to_update(destination: &Path) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for ledger in all_program_infos(destination)? {
        match ledger.program() {
            Some(program) => ids.push(program.id.clone()),
            None => log::info!("Could not get program from {:?}", ledger.path()),
        }
    }
    Ok(ids)
}

/// Load every `<destination>/*/program_info.json`, skipping unreadable ones
pub fn all_program_infos(destination: &Path) -> Result<Vec<ProgramLedger>> {
    let mut ledgers = Vec::new();
    if !destination.is_dir() {
        return Ok(ledgers);
    }

    let mut dirs: Vec<_> = fs::read_dir(destination)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.join(PROGRAM_INFO_FN).is_file())
        .collect();
    dirs.sort();

    for dir in dirs {
        match ProgramLedger::load(&dir) {
            Ok(ledger) => ledgers.push(ledger),
            Err(e) => log::info!("Skipping {:?}: {}", dir, e),
        }
    }
    Ok(ledgers)
}
