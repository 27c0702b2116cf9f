//! Asset cache: memoizes generated QR bitmaps.
//!
//! QR encoding is the most expensive step of the pipeline and the same
//! payload is re-rendered constantly during interactive editing, so bitmaps
//! are memoized on the full tuple of inputs that determine the output.
//! Keys are structured tuples, not concatenated strings.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::error::SelloError;
use crate::template::{EcLevel, QrConfig};

use super::color;

/// Everything that determines a generated QR bitmap.
///
/// Colors are stored pre-parsed so equivalent spellings (`#000` / `#000000`)
/// share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QrAssetKey {
    pub content: String,
    pub width: u32,
    pub ec_level: EcLevel,
    pub margin: u32,
    pub version: Option<u8>,
    pub dark: [u8; 4],
    pub light: [u8; 4],
}

impl QrAssetKey {
    pub fn new(content: &str, width: u32, config: &QrConfig) -> Self {
        Self {
            content: content.to_string(),
            width,
            ec_level: config.error_correction,
            margin: config.margin,
            version: config.version,
            dark: color::parse_or(&config.dark_color, color::BLACK).0,
            light: color::parse_or(&config.light_color, color::WHITE).0,
        }
    }
}

struct CachedAsset {
    image: RgbaImage,
    last_accessed: Instant,
}

impl CachedAsset {
    fn new(image: RgbaImage) -> Self {
        Self {
            image,
            last_accessed: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Unbounded memoization of QR bitmaps, scoped to one rendering session.
///
/// The working set is bounded by distinct qrcode elements × distinct content
/// values, so no eviction policy is required; long-lived holders (the HTTP
/// server) prune stale entries with [`AssetCache::evict_older_than`].
#[derive(Default)]
pub struct AssetCache {
    entries: HashMap<QrAssetKey, CachedAsset>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached bitmap for `key`, or invoke `generate`, store the
    /// result, and return it. Errors are returned as-is and never cached.
    pub fn get_or_encode<F>(&mut self, key: QrAssetKey, generate: F) -> Result<RgbaImage, SelloError>
    where
        F: FnOnce() -> Result<RgbaImage, SelloError>,
    {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.touch();
            return Ok(entry.image.clone());
        }

        let image = generate()?;
        self.entries.insert(key, CachedAsset::new(image.clone()));
        Ok(image)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries not touched within `max_age`. Returns how many were
    /// removed.
    pub fn evict_older_than(&mut self, max_age: Duration) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_accessed) < max_age);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::QrConfig;
    use image::Rgba;

    fn bitmap(shade: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([shade, shade, shade, 255]))
    }

    #[test]
    fn test_generator_invoked_once_per_key() {
        let mut cache = AssetCache::new();
        let config = QrConfig::default();
        let key = QrAssetKey::new("A1", 150, &config);
        let mut calls = 0;

        for _ in 0..3 {
            let result = cache
                .get_or_encode(key.clone(), || {
                    calls += 1;
                    Ok(bitmap(7))
                })
                .unwrap();
            assert_eq!(*result.get_pixel(0, 0), Rgba([7, 7, 7, 255]));
        }

        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_any_key_field_change_regenerates() {
        let mut cache = AssetCache::new();
        let config = QrConfig::default();
        let base = QrAssetKey::new("A1", 150, &config);

        let variants = vec![
            QrAssetKey::new("B2", 150, &config),
            QrAssetKey::new("A1", 151, &config),
            QrAssetKey {
                margin: 0,
                ..base.clone()
            },
            QrAssetKey {
                ec_level: EcLevel::H,
                ..base.clone()
            },
            QrAssetKey {
                version: Some(5),
                ..base.clone()
            },
            QrAssetKey {
                dark: [1, 2, 3, 255],
                ..base.clone()
            },
        ];

        let mut calls = 0;
        cache
            .get_or_encode(base, || {
                calls += 1;
                Ok(bitmap(0))
            })
            .unwrap();
        for key in variants {
            cache
                .get_or_encode(key, || {
                    calls += 1;
                    Ok(bitmap(0))
                })
                .unwrap();
        }
        assert_eq!(calls, 7);
    }

    #[test]
    fn test_equivalent_color_spellings_share_entry() {
        let config_long = QrConfig::default();
        let config_short = QrConfig {
            dark_color: "#000".into(),
            light_color: "#fff".into(),
            ..Default::default()
        };
        let a = QrAssetKey::new("A1", 150, &config_long);
        let b = QrAssetKey::new("A1", 150, &config_short);
        assert_eq!(a, b);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let mut cache = AssetCache::new();
        let config = QrConfig::default();
        let key = QrAssetKey::new("A1", 150, &config);

        let err = cache.get_or_encode(key.clone(), || {
            Err(SelloError::QrEncode("boom".into()))
        });
        assert!(err.is_err());
        assert!(cache.is_empty());

        // A later successful generate fills the entry.
        cache.get_or_encode(key, || Ok(bitmap(1))).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evict_older_than() {
        let mut cache = AssetCache::new();
        let config = QrConfig::default();
        cache
            .get_or_encode(QrAssetKey::new("A1", 150, &config), || Ok(bitmap(1)))
            .unwrap();

        assert_eq!(cache.evict_older_than(Duration::from_secs(600)), 0);
        assert_eq!(cache.evict_older_than(Duration::ZERO), 1);
        assert!(cache.is_empty());
    }
}
