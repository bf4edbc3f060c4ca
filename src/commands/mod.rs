// Command handlers module
pub mod config;
pub mod download;
pub mod migrate;
pub mod mv;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

// Re-exports for cleaner imports
pub use download::execute as download;
pub use migrate::execute as migrate;
pub use mv::execute as mv;

/// Resolve `path` against the current directory
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    Ok(cwd.join(path))
}
