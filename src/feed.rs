use std::future::Future;
use std::path::Path;

use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::config::Config;
use crate::consts::IMAGE_EXTENSION;
use crate::error::{Error, Result};
use crate::image_store::{ImageStore, WallpaperFile};

#[derive(Debug, Deserialize)]
struct FeedResponse {
    images: Vec<FeedDescriptor>,
}

/// Image of the day as described by the feed
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedDescriptor {
    pub url: String,
    pub title: String,
}

impl FeedDescriptor {
    /// Name the image is stored under: title with spaces replaced by underscores
    pub fn file_name(&self) -> String {
        let stem: String = self
            .title
            .chars()
            .map(|c| match c {
                ' ' | '/' | '\\' => '_',
                c => c,
            })
            .collect();
        format!("{stem}.{IMAGE_EXTENSION}")
    }
}

/// Parses the first entry of a feed response
pub fn parse_descriptor(body: &str) -> Result<FeedDescriptor> {
    let response: FeedResponse =
        serde_json::from_str(body).map_err(|why| Error::Parse(why.to_string()))?;

    let descriptor = response
        .images
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("feed contains no images".to_string()))?;

    if descriptor.title.trim().is_empty() {
        return Err(Error::Parse("image title is empty".to_string()));
    }

    Ok(descriptor)
}

/// Something able to bring a new wallpaper into the store
pub trait Fetch {
    fn fetch_and_store(&self) -> impl Future<Output = Result<WallpaperFile>> + Send;
}

/// Downloads the image of the day into the [ImageStore]
pub struct FeedClient {
    http: Client,
    config: Config,
    store: ImageStore,
}

impl FeedClient {
    pub fn new(config: Config, store: ImageStore) -> Self {
        Self::with_client(Client::new(), config, store)
    }

    pub fn with_client(http: Client, config: Config, store: ImageStore) -> Self {
        Self { http, config, store }
    }

    async fn get(&self, url: &str) -> Result<Response> {
        debug!("GET {url}");
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(Error::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    pub async fn fetch_descriptor(&self) -> Result<FeedDescriptor> {
        let body = self.get(&self.config.feed_url()).await?.text().await?;
        parse_descriptor(&body)
    }

    /// Streams the body into the staging file, the caller renames it once complete
    async fn download(&self, url: &str, staging: &Path) -> Result<()> {
        let mut response = self.get(url).await?;
        let mut file = File::create(staging).await?;

        let mut written = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        file.sync_all().await?;

        debug!("Wrote {written} bytes to {}", staging.display());
        Ok(())
    }

    pub async fn fetch_and_store(&self) -> Result<WallpaperFile> {
        let descriptor = self.fetch_descriptor().await?;
        let url = self.config.image_url(&descriptor.url);
        let name = descriptor.file_name();

        fs::create_dir_all(self.store.dir()).await?;
        let staging = self.store.staging_path_for(&name);
        let path = self.store.path_for(&name);

        let stored = match self.download(&url, &staging).await {
            Ok(()) => fs::rename(&staging, &path).await.map_err(Error::from),
            Err(why) => Err(why),
        };

        if let Err(why) = stored {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {cleanup}", staging.display());
                }
            }
            return Err(why);
        }

        Ok(WallpaperFile { path, name })
    }
}

impl Fetch for FeedClient {
    async fn fetch_and_store(&self) -> Result<WallpaperFile> {
        FeedClient::fetch_and_store(self).await
    }
}
