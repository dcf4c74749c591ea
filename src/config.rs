use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bincode::{Decode, Encode};
use clap::ValueEnum;

use crate::setter::SetterKind;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// How often the desktop background is rotated
#[derive(ValueEnum, Encode, Decode, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshPeriod {
    #[value(name = "30m")]
    ThirtyMinutes,

    #[value(name = "1h")]
    OneHour,

    #[default]
    #[value(name = "4h")]
    FourHours,

    #[value(name = "12h")]
    TwelveHours,
}

impl RefreshPeriod {
    pub fn duration(self) -> Duration {
        let secs = match self {
            RefreshPeriod::ThirtyMinutes => 30 * MINUTE,
            RefreshPeriod::OneHour => HOUR,
            RefreshPeriod::FourHours => 4 * HOUR,
            RefreshPeriod::TwelveHours => 12 * HOUR,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for RefreshPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minutes", self.duration().as_secs() / MINUTE)
    }
}

/// How often a new wallpaper is downloaded from the feed
#[derive(ValueEnum, Encode, Decode, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DownloadPeriod {
    #[default]
    #[value(name = "1d")]
    OneDay,

    #[value(name = "2d")]
    TwoDays,

    #[value(name = "3d")]
    ThreeDays,

    #[value(name = "5d")]
    FiveDays,
}

impl DownloadPeriod {
    pub fn duration(self) -> Duration {
        let days = match self {
            DownloadPeriod::OneDay => 1,
            DownloadPeriod::TwoDays => 2,
            DownloadPeriod::ThreeDays => 3,
            DownloadPeriod::FiveDays => 5,
        };
        Duration::from_secs(days * DAY)
    }
}

impl fmt::Display for DownloadPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.duration().as_secs() / DAY)
    }
}

/// Periods the scheduler arms its timers with
///
/// Changing it has no effect until the scheduler is restarted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub refresh: RefreshPeriod,
    pub download: DownloadPeriod,
}

impl ScheduleConfig {
    pub fn new(refresh: RefreshPeriod, download: DownloadPeriod) -> Self {
        Self { refresh, download }
    }

    /// Replaces the selections which were provided, keeps the rest
    pub fn merge(&mut self, refresh: Option<RefreshPeriod>, download: Option<DownloadPeriod>) {
        if let Some(refresh) = refresh {
            self.refresh = refresh;
        }
        if let Some(download) = download {
            self.download = download;
        }
    }
}

/// Settings built once at startup and shared read-only by the components
#[derive(Clone, Debug)]
pub struct Config {
    /// Absolute path of the directory holding downloaded wallpapers
    pub wallpapers_dir: PathBuf,

    /// Scheme and host of the feed, without a trailing slash
    pub feed_host: String,

    /// Market the feed is queried for, e.g. `en-US`
    pub market: String,

    /// Tool used to apply wallpapers
    pub setter: SetterKind,
}

impl Config {
    pub fn new(wallpapers_dir: &Path, feed_host: &str, market: &str, setter: SetterKind) -> std::io::Result<Self> {
        let wallpapers_dir = if wallpapers_dir.is_absolute() {
            wallpapers_dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(wallpapers_dir)
        };

        Ok(Self {
            wallpapers_dir,
            feed_host: feed_host.trim_end_matches('/').to_string(),
            market: market.to_string(),
            setter,
        })
    }

    /// Feed endpoint returning the single latest image for the market
    pub fn feed_url(&self) -> String {
        format!(
            "{}/HPImageArchive.aspx?format=js&idx=0&n=1&mkt={}",
            self.feed_host, self.market
        )
    }

    /// Resolves an image URL from the feed against the feed host
    pub fn image_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.feed_host, url)
        } else {
            format!("{}/{}", self.feed_host, url)
        }
    }
}
