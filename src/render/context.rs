//! Render context — shared resources available to the rendering pipeline.
//!
//! Holds the HTTP client and the asset caches so that the renderer itself
//! stays unaware of where bitmaps come from. Constructed once per editing
//! session (or per CLI invocation) and shared by every render in it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use image::{DynamicImage, RgbaImage};
use tokio::sync::RwLock;

use crate::error::SelloError;

use super::cache::{AssetCache, QrAssetKey};

/// A decoded source image kept for reuse across renders.
struct CachedImage {
    image: DynamicImage,
    last_accessed: Instant,
}

impl CachedImage {
    fn new(image: DynamicImage) -> Self {
        Self {
            image,
            last_accessed: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Shared resources for rendering: HTTP client, QR bitmap cache, and the
/// decoded-image cache.
///
/// Cloning is cheap — caches are behind `Arc`, so clones share state. The
/// locks exist only because the HTTP server shares one context across
/// requests; within a single export rows run strictly sequentially and the
/// locks are uncontended.
#[derive(Clone)]
pub struct RenderContext {
    http_client: reqwest::Client,
    qr_cache: Arc<RwLock<AssetCache>>,
    image_cache: Arc<RwLock<HashMap<String, CachedImage>>>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .user_agent(concat!("sello/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            qr_cache: Arc::new(RwLock::new(AssetCache::new())),
            image_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Look up a cached QR bitmap, or generate and cache it.
    pub async fn qr_bitmap<F>(&self, key: QrAssetKey, generate: F) -> Result<RgbaImage, SelloError>
    where
        F: FnOnce() -> Result<RgbaImage, SelloError>,
    {
        let mut cache = self.qr_cache.write().await;
        cache.get_or_encode(key, generate)
    }

    /// Load and decode an image source, using the cache when possible.
    ///
    /// Supported sources: `data:` URIs (base64 payload), `http(s)://` URLs,
    /// and local file paths.
    pub async fn load_image(&self, source: &str) -> Result<DynamicImage, SelloError> {
        {
            let mut cache = self.image_cache.write().await;
            if let Some(entry) = cache.get_mut(source) {
                entry.touch();
                return Ok(entry.image.clone());
            }
        }

        let bytes = self.fetch_source_bytes(source).await?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| SelloError::Image(format!("failed to decode image: {}", e)))?;

        {
            let mut cache = self.image_cache.write().await;
            cache.insert(source.to_string(), CachedImage::new(image.clone()));
        }

        Ok(image)
    }

    /// Resolve a source string to raw image bytes.
    async fn fetch_source_bytes(&self, source: &str) -> Result<Vec<u8>, SelloError> {
        if let Some(rest) = source.strip_prefix("data:") {
            let comma = rest
                .find(',')
                .ok_or_else(|| SelloError::Image("invalid data URI: missing comma".to_string()))?;
            return base64::engine::general_purpose::STANDARD
                .decode(&rest[comma + 1..])
                .map_err(|e| SelloError::Image(format!("invalid data URI payload: {}", e)));
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self
                .http_client
                .get(source)
                .send()
                .await
                .map_err(|e| SelloError::Image(format!("failed to download {}: {}", source, e)))?;
            if !response.status().is_success() {
                return Err(SelloError::Image(format!(
                    "failed to download {}: HTTP {}",
                    source,
                    response.status()
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| SelloError::Image(format!("failed to read image data: {}", e)))?;
            return Ok(bytes.to_vec());
        }

        tokio::fs::read(source)
            .await
            .map_err(|e| SelloError::Image(format!("failed to read {}: {}", source, e)))
    }

    /// Drop cache entries not touched within `max_age`.
    ///
    /// Returns `(qr_entries_removed, image_entries_removed)`.
    pub async fn evict_stale(&self, max_age: Duration) -> (usize, usize) {
        let qr_removed = self.qr_cache.write().await.evict_older_than(max_age);

        let now = Instant::now();
        let mut images = self.image_cache.write().await;
        let before = images.len();
        images.retain(|_, entry| now.duration_since(entry.last_accessed) < max_age);
        let image_removed = before - images.len();

        (qr_removed, image_removed)
    }

    /// Number of cached QR bitmaps (diagnostics).
    pub async fn qr_cache_len(&self) -> usize {
        self.qr_cache.read().await.len()
    }
}
