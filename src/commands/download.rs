use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs;

use crate::core::programs::{programs_to_update, Program, ProgramFetcher};
use crate::core::{Config, HttpTransport, RunOptions, Runner};
use crate::ui;

pub fn execute(matches: &clap::ArgMatches, dry_run: bool) -> Result<()> {
    let config = effective_config(matches)?;
    log::debug!("Using configuration {:?}", config);

    if matches.get_flag("empty-cache") && config.cache_dir.exists() {
        log::info!("Emptying cache {:?}", config.cache_dir);
        fs::remove_dir_all(&config.cache_dir)
            .with_context(|| format!("Failed to empty cache {:?}", config.cache_dir))?;
    }

    let transport = HttpTransport::new()?;
    let fetcher = ProgramFetcher::new(transport.client().clone());

    let ids = if matches.get_flag("update") {
        programs_to_update(&config.destination)?
    } else {
        let queries: Vec<&String> = matches.get_many::<String>("query").into_iter().flatten().collect();
        resolve_queries(&fetcher, &queries)
    };
    if ids.is_empty() {
        bail!("No programs to download");
    }

    let programs = fetch_programs(&fetcher, &ids);
    ui::info(&format!("Searching {} program(s) in {}", programs.len(), config.destination.display()));
    let runner = Runner::new(RunOptions::from_config(&config, dry_run), &transport);
    let summary = runner.run(programs)?;

    println!();
    for program in &summary.programs {
        let status = match (&program.error, program.pending_migrations.is_empty()) {
            (Some(e), _) => format!("failed: {}", e).red(),
            (None, false) => format!(
                "blocked, run `ruv-dl migrate {}` first",
                program.pending_migrations[0]
            )
            .yellow(),
            (None, true) => format!("{} found, {} missing", program.found, program.missing.len()).normal(),
        };
        println!("{} [{}] {}", program.title.cyan().bold(), program.program_id, status);
        if dry_run {
            for entry in &program.missing {
                ui::dimmed(&format!("  would download {}", ui::format_entry(entry)));
            }
        }
    }

    if !dry_run {
        ui::success(&format!("{} files downloaded", summary.downloaded.len()));
    }
    for (target, reason) in &summary.download_errors {
        ui::error(&format!("✗ {}: {}", target.display(), reason));
    }
    if summary.failed_programs().next().is_some() || !summary.download_errors.is_empty() {
        bail!("Some programs or downloads failed");
    }
    Ok(())
}

/// Saved config with this invocation's flags applied
fn effective_config(matches: &clap::ArgMatches) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(destination) = matches.get_one::<String>("destination") {
        config.destination = super::absolute(destination.as_ref())?;
    }
    if let Some(days) = matches.get_one::<i64>("days-between-episodes") {
        config.days_between_episodes = *days;
    }
    if let Some(count) = matches.get_one::<usize>("iteration-count") {
        config.iteration_count = *count;
    }
    if let Some(workers) = matches.get_one::<usize>("workers") {
        config.workers = *workers;
    }
    if matches.get_flag("sequential") {
        config.sequential = true;
    }
    Ok(config)
}

/// Program ids for the queries. A query that cannot be resolved is reported and skipped.
fn resolve_queries(fetcher: &ProgramFetcher, queries: &[&String]) -> Vec<String> {
    let mut ids = Vec::new();
    for query in queries {
        match fetcher.resolve_program_id(query, ui::select_program) {
            Ok(Some(id)) => ids.push(id),
            Ok(None) => ui::warn(&format!("No program selected for {:?}", query)),
            Err(e) => ui::error(&format!("✗ {}: {}", query, e)),
        }
    }
    ids
}

fn fetch_programs(fetcher: &ProgramFetcher, ids: &[String]) -> Vec<Program> {
    let mut programs = Vec::new();
    for id in ids {
        match fetcher.get_program(id) {
            Ok(Some(program)) => {
                log::info!("------ {} [{}] ------", program.title, program.id);
                programs.push(program);
            }
            Ok(None) => {}
            Err(e) => log::error!("Could not fetch program {}: {}", id, e),
        }
    }
    programs
}
