//! Two-phase download run
//!
//! Phase 1 crawls every program on a bounded worker pool. Each task owns
//! its program's probe cache, so nothing is shared between workers. Phase 2
//! organizes programs one after another and then downloads what is missing,
//! either sequentially or on a second pool.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::PathBuf;

use crate::core::cache::ProbeCache;
use crate::core::config::Config;
use crate::core::crawler::{CrawlSettings, Crawler};
use crate::core::data::{Entry, EntrySet};
use crate::core::downloader::Downloader;
use crate::core::organizer::Organizer;
use crate::core::programs::Program;
use crate::core::transport::Transport;
use crate::error::{Result, RuvError};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub destination: PathBuf,
    pub cache_dir: PathBuf,
    pub crawl: CrawlSettings,
    pub workers: usize,
    pub sequential: bool,
    pub dry_run: bool,
}

impl RunOptions {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            destination: config.destination.clone(),
            cache_dir: config.cache_dir.clone(),
            crawl: config.crawl_settings(),
            workers: config.workers,
            sequential: config.sequential,
            dry_run,
        }
    }
}

/// Per-program outcome of a run
#[derive(Debug, Default)]
pub struct ProgramReport {
    pub program_id: String,
    pub title: String,
    pub found: usize,
    pub missing: Vec<Entry>,
    pub pending_migrations: Vec<u32>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub programs: Vec<ProgramReport>,
    pub downloaded: Vec<PathBuf>,
    pub download_errors: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn missing_count(&self) -> usize {
        self.programs.iter().map(|p| p.missing.len()).sum()
    }

    pub fn failed_programs(&self) -> impl Iterator<Item = &ProgramReport> {
        self.programs.iter().filter(|p| p.error.is_some())
    }
}

pub struct Runner<'t, T: Transport + ?Sized> {
    options: RunOptions,
    transport: &'t T,
}

impl<'t, T: Transport + ?Sized> Runner<'t, T> {
    pub fn new(options: RunOptions, transport: &'t T) -> Self {
        Self { options, transport }
    }

    fn pool(&self, name: &'static str) -> Result<ThreadPool> {
        ThreadPoolBuilder::new()
            .num_threads(self.options.workers.max(1))
            .thread_name(move |idx| format!("{name}-{idx}"))
            .build()
            .map_err(|e| RuvError::other(format!("failed to build {name} pool: {e}")))
    }

    /// Crawl one program, flushing its probe cache when done
    pub fn crawl(&self, program: Program) -> Result<EntrySet> {
        log::info!("Crawling {} [{}]", program.title, program.id);
        let cache = ProbeCache::open(&self.options.cache_dir, &program.id);
        let mut crawler = Crawler::new(program, self.options.crawl, cache, self.transport);
        crawler.search_for_episodes()
    }

    /// Phase 1: crawl every program concurrently. Results keep program order.
    pub fn crawl_all(&self, programs: Vec<Program>) -> Result<Vec<(Program, Result<EntrySet>)>> {
        let pool = self.pool("crawl")?;
        Ok(pool.install(|| {
            programs
                .into_par_iter()
                .map(|program| {
                    let found = self.crawl(program.clone());
                    if let Err(e) = &found {
                        log::error!("Crawling {} failed: {}", program.title, e);
                    }
                    (program, found)
                })
                .collect()
        }))
    }

    /// Crawl, organize and download `programs`
    pub fn run(&self, programs: Vec<Program>) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (program, found) in self.crawl_all(programs)? {
            let mut report = ProgramReport {
                program_id: program.id.clone(),
                title: program.title.clone(),
                ..Default::default()
            };
            let outcome = found.and_then(|entries| {
                report.found = entries.len();
                Organizer::new(&self.options.destination, &program).organize_on_disk(entries)
            });
            match outcome {
                Ok(organized) => {
                    report.missing = organized.missing;
                    report.pending_migrations = organized.pending_migrations;
                }
                Err(e) => {
                    log::error!("{}: {}", program.title, e);
                    report.error = Some(e.to_string());
                }
            }
            summary.programs.push(report);
        }

        let queue: Vec<&Entry> = summary.programs.iter().flat_map(|p| p.missing.iter()).collect();
        if queue.is_empty() {
            log::info!("No entries to download");
            return Ok(summary);
        }
        log::warn!("Downloading {} files...", queue.len());
        if self.options.dry_run {
            log::warn!("Dryrun, not downloading anything");
            for entry in &queue {
                log::warn!(
                    "Dryrun. Would download {} to {}",
                    entry.url,
                    entry.target_path().map(|p| p.display().to_string()).unwrap_or_default()
                );
            }
            return Ok(summary);
        }

        let results = self.download_all(&queue)?;
        for (entry, result) in queue.iter().zip(results) {
            let target = entry.target_path().map(PathBuf::from).unwrap_or_default();
            match result {
                Ok(true) => summary.downloaded.push(target),
                Ok(false) => {}
                Err(e) => {
                    log::error!("Download of {} failed: {}", entry.url, e);
                    summary.download_errors.push((target, e.to_string()));
                }
            }
        }
        Ok(summary)
    }

    /// Phase 2 downloads, in queue order when sequential
    fn download_all(&self, queue: &[&Entry]) -> Result<Vec<Result<bool>>> {
        let downloader = Downloader::new(self.transport);
        if self.options.sequential {
            return Ok(queue.iter().map(|entry| downloader.download(entry)).collect());
        }
        let pool = self.pool("download")?;
        Ok(pool.install(|| queue.par_iter().map(|entry| downloader.download(entry)).collect()))
    }
}
