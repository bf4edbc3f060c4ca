use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for ruv-dl
#[derive(Error, Debug)]
pub enum RuvError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Must pass in absolute path - \"{0}\" is relative.")]
    NotAbsolute(PathBuf),

    #[error("{0} exists")]
    AlreadyExists(PathBuf),

    #[error("{0}")]
    NotFound(String),

    #[error("No program info at {0}")]
    LedgerNotFound(PathBuf),

    #[error("Could not parse program info {path}: {reason}")]
    LedgerUnparseable { path: PathBuf, reason: String },

    #[error("{0}")]
    NamingSchema(String),

    #[error("{0}")]
    ProgramInfo(String),

    #[error("{0}")]
    UnsupportedMove(String),

    #[error("No known delimiters [{delimiters}] found in {filename}")]
    UnknownFilenameEncoding { filename: String, delimiters: String },

    #[error("Could not get url for episode {0} which has not expired")]
    UnresolvableEpisode(String),

    #[error("Missing target path for entry {0}")]
    MissingTargetPath(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ruv-dl
pub type Result<T> = std::result::Result<T, RuvError>;

impl RuvError {
    /// Create a naming-schema error (path does not match the on-disk grammar)
    pub fn naming_schema<S: Into<String>>(msg: S) -> Self {
        RuvError::NamingSchema(msg.into())
    }

    /// Create a ledger-consistency error
    pub fn program_info<S: Into<String>>(msg: S) -> Self {
        RuvError::ProgramInfo(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        RuvError::NotFound(msg.into())
    }

    pub fn unsupported_move<S: Into<String>>(msg: S) -> Self {
        RuvError::UnsupportedMove(msg.into())
    }

    pub fn unparseable<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        RuvError::LedgerUnparseable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RuvError::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RuvError::Other(msg.into())
    }
}
