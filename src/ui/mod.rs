// UI and formatting module

pub mod formatters;
pub mod prompts;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_entry, format_plan, format_size};
pub use prompts::{dimmed, error, info, select_program, success, warn};
