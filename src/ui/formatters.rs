use humansize::{format_size as human_format_size, DECIMAL};
use std::path::Path;

use crate::core::data::Entry;
use crate::core::relocate::MovePlan;

/// Format a byte count for humans (kB, MB, GB)
pub fn format_size(size: u64) -> String {
    human_format_size(size, DECIMAL)
}

/// `S01E02 2020/01/10 <target>` line for an entry
pub fn format_entry(entry: &Entry) -> String {
    let target = entry
        .target_path()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.filename.clone());
    format!("{} {}", entry.date.format("%Y/%m/%d"), target)
}

/// One `src -> dst` line per planned move, with paths shortened to file names
/// when both ends share a directory
pub fn format_plan(plan: &MovePlan) -> Vec<String> {
    plan.moves()
        .iter()
        .map(|m| {
            if m.src.parent() == m.dst.parent() {
                let name = |p: &Path| p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                format!("{} -> {}", name(&m.src), name(&m.dst))
            } else {
                m.to_string()
            }
        })
        .collect()
}
