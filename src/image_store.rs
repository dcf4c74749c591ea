use std::fs;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use log::debug;

use crate::consts::IMAGE_EXTENSION;
use crate::error::Result;

/// Downloaded wallpaper living in the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallpaperFile {
    pub path: PathBuf,
    pub name: String,
}

impl WallpaperFile {
    fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        Some(Self { path, name })
    }
}

/// Directory of downloaded wallpapers
///
/// Files are never deduplicated nor expired. The scheduler dispatches one operation at a time,
/// so the single writer (feed client) and the single reader (rotator) never overlap.
#[derive(Clone, Debug)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the backing directory if it does not exist yet
    pub fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Lists every wallpaper in the directory, an absent directory is just empty
    pub fn list_images(&self) -> Result<Vec<WallpaperFile>> {
        let pattern = format!(
            "{}/*.{}",
            Pattern::escape(&self.dir.to_string_lossy()),
            IMAGE_EXTENSION
        );

        let images = glob(&pattern)?
            .filter_map(|f| {
                debug!("File: {:?}", f);
                f.ok()
            })
            .filter(|f| f.is_file())
            .filter_map(WallpaperFile::from_path)
            .collect();

        Ok(images)
    }

    /// Final location of a wallpaper named `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Location a download is written to before it is moved to [ImageStore::path_for]
    ///
    /// It is hidden and does not carry the image extension, so listing never returns it
    pub fn staging_path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{name}.part"))
    }
}
