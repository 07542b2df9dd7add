// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Remote image texture cache.
//!
//! Loads weather icons and overlay tiles from URLs into egui textures. Images
//! are cached on disk under SHA-256 file names, downloaded in the background
//! on the shared tokio runtime, and never requested twice concurrently.
//! Failed downloads are remembered so the UI can show a placeholder.
//!
//! Each cache has its own maximum age. Icons never change and keep for a
//! week; overlay tiles are live weather data and expire after an hour.

use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::runtime::Handle;

/// Weather condition icons are static artwork
pub const ICON_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Overlay tiles are re-rendered by the service every few minutes
pub const OVERLAY_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Load state of one image
enum ImageState {
    Loading,
    Loaded(egui::TextureHandle),
    Failed,
}

/// Result of an image lookup
pub enum ImageLookup {
    Ready(egui::TextureHandle),
    Pending,
    Unavailable,
}

pub struct ImageCache {
    name: String,
    cache_dir: PathBuf,
    max_age: Duration,
    images: Arc<Mutex<HashMap<String, ImageState>>>,
    http: reqwest::Client,
    runtime: Handle,
}

impl ImageCache {
    /// Create a cache stored under `<cache dir>/skyglass/<name>`
    pub fn new(name: &str, max_age: Duration, runtime: Handle) -> Result<Self, Box<dyn std::error::Error>> {
        let cache_dir = dirs::cache_dir()
            .ok_or("Could not determine cache directory")?
            .join(crate::config::APP_NAME)
            .join(name);
        Self::with_dir(name, cache_dir, max_age, runtime)
    }

    pub fn with_dir(
        name: &str,
        cache_dir: PathBuf,
        max_age: Duration,
        runtime: Handle,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        fs::create_dir_all(&cache_dir)?;
        let removed = cleanup_old_files(&cache_dir, max_age);
        if removed > 0 {
            info!("Removed {} expired {} images", removed, name);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("skyglass/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            name: name.to_string(),
            cache_dir,
            max_age,
            images: Arc::new(Mutex::new(HashMap::new())),
            http,
            runtime,
        })
    }

    /// Get the texture for `url`, starting a download if needed.
    ///
    /// `cache_key` identifies the image on disk and in memory; callers pass
    /// the URL with credentials removed so a key change keeps the cache.
    pub fn get(&self, ctx: &egui::Context, url: &str, cache_key: &str) -> ImageLookup {
        if let Some(lookup) = self.lookup_memory(cache_key) {
            return lookup;
        }

        // Disk read and decode happen without holding the lock
        let path = self.cache_dir.join(cache_file_name(cache_key));
        if let Some(image) = self.read_disk(&path) {
            let texture = ctx.load_texture(cache_key, image, egui::TextureOptions::LINEAR);
            self.images
                .lock()
                .unwrap()
                .insert(cache_key.to_string(), ImageState::Loaded(texture.clone()));
            return ImageLookup::Ready(texture);
        }

        {
            let mut images = self.images.lock().unwrap();
            if images.contains_key(cache_key) {
                drop(images);
                return self.lookup_memory(cache_key).unwrap_or(ImageLookup::Pending);
            }
            images.insert(cache_key.to_string(), ImageState::Loading);
        }
        self.spawn_download(ctx.clone(), url.to_string(), cache_key.to_string(), path);
        ImageLookup::Pending
    }

    fn lookup_memory(&self, cache_key: &str) -> Option<ImageLookup> {
        match self.images.lock().unwrap().get(cache_key)? {
            ImageState::Loaded(texture) => Some(ImageLookup::Ready(texture.clone())),
            ImageState::Loading => Some(ImageLookup::Pending),
            ImageState::Failed => Some(ImageLookup::Unavailable),
        }
    }

    /// Decode a cached file if it is younger than the cache's max age.
    /// Expired and unreadable files are deleted.
    fn read_disk(&self, path: &Path) -> Option<egui::ColorImage> {
        let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now().duration_since(modified).unwrap_or_default();
        if age > self.max_age {
            debug!("Cached {} image {:?} expired ({}s old)", self.name, path, age.as_secs());
            let _ = fs::remove_file(path);
            return None;
        }

        let bytes = fs::read(path).ok()?;
        match decode_image(&bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Discarding unreadable cached image {:?}: {}", path, e);
                let _ = fs::remove_file(path);
                None
            }
        }
    }

    /// Drop every finished entry from memory so the next lookup goes back
    /// to disk, and past it once the file has expired. Downloads in
    /// flight are kept.
    pub fn invalidate(&self) {
        let mut images = self.images.lock().unwrap();
        let before = images.len();
        images.retain(|_, state| matches!(state, ImageState::Loading));
        debug!("Invalidated {} {} images", before - images.len(), self.name);
    }

    /// Forget failed downloads so they are retried on the next lookup
    pub fn retry_failed(&self) {
        self.images
            .lock()
            .unwrap()
            .retain(|_, state| !matches!(state, ImageState::Failed));
    }

    pub fn is_loading(&self) -> bool {
        self.images
            .lock()
            .unwrap()
            .values()
            .any(|state| matches!(state, ImageState::Loading))
    }

    fn spawn_download(&self, ctx: egui::Context, url: String, cache_key: String, path: PathBuf) {
        let http = self.http.clone();
        let images = Arc::clone(&self.images);
        let name = self.name.clone();

        self.runtime.spawn(async move {
            debug!("Downloading {} image {}", name, cache_key);
            let state = match download(&http, &url).await {
                Ok(bytes) => {
                    if let Err(e) = fs::write(&path, &bytes) {
                        warn!("Failed to save {} image to cache: {}", name, e);
                    }
                    match decode_image(&bytes) {
                        Ok(image) => ImageState::Loaded(ctx.load_texture(
                            cache_key.as_str(),
                            image,
                            egui::TextureOptions::LINEAR,
                        )),
                        Err(e) => {
                            warn!("Failed to decode {} image {}: {}", name, cache_key, e);
                            ImageState::Failed
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to download {} image {}: {}", name, cache_key, e);
                    ImageState::Failed
                }
            };

            images.lock().unwrap().insert(cache_key, state);
            ctx.request_repaint();
        });
    }
}

async fn download(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
    let response = http.get(url).send().await.map_err(reqwest::Error::without_url)?;

    if !response.status().is_success() {
        return Err(format!("HTTP error: {}", response.status()).into());
    }

    let bytes = response.bytes().await.map_err(reqwest::Error::without_url)?;
    Ok(bytes.to_vec())
}

/// Disk file name for a cache key: hex SHA-256 plus `.png`
pub fn cache_file_name(cache_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cache_key.as_bytes());
    format!("{:x}.png", hasher.finalize())
}

/// Decode PNG/JPEG bytes into an egui image
pub fn decode_image(bytes: &[u8]) -> Result<egui::ColorImage, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// Delete files in `dir` older than `max_age`; returns how many were removed
pub fn cleanup_old_files(dir: &Path, max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > max_age);

            if expired && fs::remove_file(entry.path()).is_ok() {
                removed += 1;
            }
        }
    }

    removed
}
