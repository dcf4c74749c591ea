use bincode::{Decode, Encode};
use clap::ValueEnum;

use crate::config::{DownloadPeriod, RefreshPeriod};

/// Command sent by the client to the daemon through the pipe
#[derive(Encode, Decode, Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    /// Apply a random stored wallpaper right away
    Refresh,

    /// Download the image of the day right away
    Download,

    /// Rearm both timers, a missing period keeps the daemon's current one
    Restart {
        refresh: Option<RefreshPeriod>,
        download: Option<DownloadPeriod>,
    },
}

/// Operations the user can trigger by hand
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Action {
    /// Change the wallpaper now
    Refresh,

    /// Download the wallpaper of the day now
    Download,
}

impl From<Action> for Signal {
    fn from(action: Action) -> Self {
        match action {
            Action::Refresh => Signal::Refresh,
            Action::Download => Signal::Download,
        }
    }
}
