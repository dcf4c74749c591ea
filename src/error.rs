use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a single download or rotation
///
/// None of them is fatal to the daemon, the scheduler logs them and waits for the next tick
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },

    #[error("Failed to parse feed response: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid wallpapers directory pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to apply wallpaper {}: {reason}", path.display())]
    Wallpaper { path: PathBuf, reason: String },
}
