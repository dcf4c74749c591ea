use lazy_static::lazy_static;
use std::path::PathBuf;
use std::time::Duration;

/// Host serving both the image-of-the-day feed and the images themselves
pub const FEED_HOST: &str = "https://www.bing.com";

/// Market the feed is queried for
pub const DEFAULT_MARKET: &str = "en-US";

/// Extension of every stored wallpaper
pub const IMAGE_EXTENSION: &str = "jpg";

/// Directory name used when no wallpapers directory is provided
pub const WALLPAPERS_DIR_NAME: &str = "Wallpapers";

/// How often the pipe is polled when no client wrote to it
pub const PIPE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Capacity of the channel between the pipe reader and the scheduler
pub const SIGNAL_CHANNEL_CAPACITY: usize = 16;

/// Name of the package
const PKG_NAME: &str = env!("CARGO_PKG_NAME");

lazy_static! {
    /// Unix pipe file name
    pub static ref UNIX_PIPE_FILE_NAME: PathBuf = PathBuf::from(&format!("/tmp/{}", PKG_NAME));

    /// Log file used when the daemon is detached from the terminal
    pub static ref LOG_FILE_NAME: PathBuf = PathBuf::from(&format!("/tmp/{}.log", PKG_NAME));
}
