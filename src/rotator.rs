use log::debug;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::image_store::{ImageStore, WallpaperFile};
use crate::setter::WallpaperSetter;

/// Outcome of a rotation which did not fail
#[derive(Debug, PartialEq, Eq)]
pub enum Rotation {
    /// The file is now the desktop background
    Applied(WallpaperFile),

    /// Store is empty, nothing was applied
    NoImagesAvailable,
}

/// Something able to change the desktop background on demand
pub trait Rotate {
    fn rotate(&self) -> Result<Rotation>;
}

/// Picks a random stored wallpaper and applies it
pub struct Rotator<S> {
    store: ImageStore,
    setter: S,
}

impl<S: WallpaperSetter> Rotator<S> {
    pub fn new(store: ImageStore, setter: S) -> Self {
        Self { store, setter }
    }

    pub fn rotate(&self) -> Result<Rotation> {
        let images = self.store.list_images()?;
        debug!("Choosing among {} wallpapers", images.len());

        let Some(chosen) = images.choose(&mut rand::thread_rng()) else {
            return Ok(Rotation::NoImagesAvailable);
        };

        self.setter.apply(&chosen.path)?;
        Ok(Rotation::Applied(chosen.clone()))
    }
}

impl<S: WallpaperSetter> Rotate for Rotator<S> {
    fn rotate(&self) -> Result<Rotation> {
        Rotator::rotate(self)
    }
}
