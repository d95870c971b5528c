use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SlistError>;

/// Conditions that abort a run before any prompting happens
#[derive(Error, Debug)]
pub enum SlistError {
    #[error("Could not read local list '{path}': {source}")]
    LocalUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not read live cache '{path}': {source}")]
    LiveCacheUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error fetching live URL: {0}")]
    LiveFetch(#[from] reqwest::Error),

    #[error("Invalid config '{name}': {reason}")]
    Config { name: String, reason: String },

    #[error("Venue registry error: {0}")]
    Registry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
