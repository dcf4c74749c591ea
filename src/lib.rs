pub mod client;
pub mod config;
pub mod daemon;
pub mod error;
pub mod feed;
pub mod image_store;
pub mod rotator;
pub mod scheduler;
pub mod setter;
pub mod signals;
mod consts;
mod shutdown;

pub use consts::{DEFAULT_MARKET, FEED_HOST, LOG_FILE_NAME, WALLPAPERS_DIR_NAME};
pub use error::{Error, Result};
