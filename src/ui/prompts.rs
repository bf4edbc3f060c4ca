// UI prompts and user-facing messages

use colored::Colorize;
use dialoguer::Select;

use crate::core::programs::ProgramSummary;
use crate::error::{Result, RuvError};

/// Let the user pick one of several search hits. `None` when cancelled.
pub fn select_program(programs: &[ProgramSummary]) -> Result<Option<usize>> {
    let items: Vec<String> = programs
        .iter()
        .map(|p| format!("{} [{}]", p.title, p.id))
        .collect();
    Select::new()
        .with_prompt("Several programs match, pick one (Esc to skip)")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(|e| RuvError::other(format!("Selection failed: {}", e)))
}

/// Display a warning message
pub fn warn(message: &str) {
    println!("{}", format!("⚠️  Warning: {}", message).yellow().bold());
}

/// Display an info message
pub fn info(message: &str) {
    println!("{}", message.cyan());
}

/// Display a success message
pub fn success(message: &str) {
    println!("{}", message.green().bold());
}

/// Display an error message
pub fn error(message: &str) {
    eprintln!("{}", message.red().bold());
}

pub fn dimmed(message: &str) {
    println!("{}", message.dimmed());
}
