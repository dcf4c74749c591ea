use std::path::Path;
use std::process::Command;

use clap::ValueEnum;
use log::debug;

use crate::error::{Error, Result};

/// Applies an image as the desktop background and makes the choice survive a re-login
#[cfg_attr(test, mockall::automock)]
pub trait WallpaperSetter {
    fn apply(&self, path: &Path) -> Result<()>;
}

/// External tool used to set the background
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetterKind {
    /// `feh --bg-scale`, stores the choice in ~/.fehbg (X11 window managers)
    Feh,

    /// `gsettings` on org.gnome.desktop.background
    Gnome,

    /// `osascript` asking System Events to change every desktop
    Macos,
}

impl Default for SetterKind {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            SetterKind::Macos
        } else {
            SetterKind::Feh
        }
    }
}

/// [WallpaperSetter] spawning one of the supported tools
pub struct CommandSetter {
    kind: SetterKind,
}

impl CommandSetter {
    pub fn new(kind: SetterKind) -> Self {
        Self { kind }
    }

    fn commands(&self, path: &Path) -> Vec<Command> {
        let path = path.display().to_string();
        match self.kind {
            SetterKind::Feh => {
                let mut cmd = Command::new("feh");
                cmd.args(["--bg-scale", &path]);
                vec![cmd]
            }
            SetterKind::Gnome => {
                let uri = format!("file://{path}");
                ["picture-uri", "picture-uri-dark"]
                    .into_iter()
                    .map(|key| {
                        let mut cmd = Command::new("gsettings");
                        cmd.args(["set", "org.gnome.desktop.background", key, &uri]);
                        cmd
                    })
                    .collect()
            }
            SetterKind::Macos => {
                let script = format!(
                    "tell application \"System Events\" to tell every desktop to set picture to \"{}\"",
                    path.replace('"', "\\\"")
                );
                let mut cmd = Command::new("osascript");
                cmd.args(["-e", &script]);
                vec![cmd]
            }
        }
    }
}

/// Runs the commands in order, stopping at the first one which fails
fn run_all(path: &Path, commands: Vec<Command>) -> Result<()> {
    let failed = |reason: String| Error::Wallpaper {
        path: path.to_path_buf(),
        reason,
    };

    for mut cmd in commands {
        debug!("Running {:?}", cmd);
        let output = cmd
            .output()
            .map_err(|why| failed(format!("unable to run {:?}: {why}", cmd.get_program())))?;

        if !output.status.success() {
            return Err(failed(format!(
                "{:?} exited with {}: {}",
                cmd.get_program(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
    }

    Ok(())
}

impl WallpaperSetter for CommandSetter {
    fn apply(&self, path: &Path) -> Result<()> {
        run_all(path, self.commands(path))
    }
}
