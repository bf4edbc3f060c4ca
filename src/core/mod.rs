// Core business logic module

pub mod cache;
pub mod config;
pub mod constants;
pub mod crawler;
pub mod data;
pub mod date_utils;
pub mod downloader;
pub mod migrations;
pub mod mover;
pub mod organizer;
pub mod program_info;
pub mod programs;
pub mod relocate;
pub mod runner;
pub mod transport;

// Re-export commonly used items
pub use cache::ProbeCache;
pub use config::Config;
pub use crawler::{CrawlSettings, Crawler};
pub use mover::Mover;
pub use organizer::Organizer;
pub use program_info::ProgramLedger;
pub use programs::{Program, ProgramFetcher};
pub use runner::{RunOptions, Runner};
pub use transport::{HttpTransport, Transport};
