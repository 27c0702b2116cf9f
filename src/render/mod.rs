//! # Layered Renderer
//!
//! Composites a template's elements onto a fixed-size RGBA surface for one
//! data row, bottom to top in element order.
//!
//! ## Architecture
//!
//! ```text
//! Template + data row → resolve content per element
//!                     → text: Spleen bitmap glyphs
//!                     → qrcode: AssetCache → qrcode crate → stretch to box
//!                     → image: image cache → decode → contain-fit to box
//!                     → RgbaImage (opaque white background)
//! ```
//!
//! Two draw rules intentionally differ: QR bitmaps are *stretched* to the
//! exact element box (the encoder always returns a square, so distortion
//! only appears on non-square boxes), while images are *contained* (aspect
//! preserved, centered, never cropped).
//!
//! Rendering is deterministic: identical inputs produce byte-identical
//! surfaces.

mod cache;
pub mod color;
mod context;
pub mod qr;
mod resolve;
mod text;

pub use cache::{AssetCache, QrAssetKey};
pub use context::RenderContext;
pub use resolve::resolve_content;

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage, imageops};

use crate::dataset::Dataset;
use crate::error::SelloError;
use crate::template::{Element, ElementKind, QrConfig, Template};

/// Renders template rows against shared session resources.
///
/// Cloning shares the underlying caches (see [`RenderContext`]).
#[derive(Clone, Default)]
pub struct Renderer {
    ctx: RenderContext,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            ctx: RenderContext::new(),
        }
    }

    pub fn with_context(ctx: RenderContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Render one data row of the template to an RGBA surface.
    ///
    /// The template, dataset and QR config are read-only snapshots for the
    /// duration of the call. Image-load failures skip the element (logged);
    /// QR encode failures propagate.
    pub async fn render_row(
        &self,
        template: &Template,
        dataset: Option<&Dataset>,
        row_index: usize,
        qr_config: &QrConfig,
    ) -> Result<RgbaImage, SelloError> {
        let canvas = template.canvas;
        let mut surface = RgbaImage::from_pixel(
            canvas.width.max(1),
            canvas.height.max(1),
            Rgba([255, 255, 255, 255]),
        );

        for element in &template.elements {
            match &element.kind {
                ElementKind::Text(style) => {
                    let content = resolve_content(element, dataset, row_index);
                    text::draw_text(&mut surface, &content, element, style);
                }
                ElementKind::Qrcode(_) => {
                    let content = resolve_content(element, dataset, row_index);
                    if content.is_empty() || element.width == 0 || element.height == 0 {
                        continue;
                    }
                    let key = QrAssetKey::new(&content, element.width, qr_config);
                    let bitmap = self
                        .ctx
                        .qr_bitmap(key, || qr::encode_qr(&content, element.width, qr_config))
                        .await?;
                    blit_stretched(&mut surface, &bitmap, element);
                }
                ElementKind::Image(img) => {
                    if img.image_url.is_empty() || element.width == 0 || element.height == 0 {
                        continue;
                    }
                    match self.ctx.load_image(&img.image_url).await {
                        Ok(decoded) => blit_contained(&mut surface, &decoded, element),
                        Err(e) => {
                            log::warn!("skipping image element '{}': {}", element.name, e);
                        }
                    }
                }
            }
        }

        Ok(surface)
    }

    /// Render one row and encode it as PNG bytes.
    pub async fn render_row_png(
        &self,
        template: &Template,
        dataset: Option<&Dataset>,
        row_index: usize,
        qr_config: &QrConfig,
    ) -> Result<Vec<u8>, SelloError> {
        let surface = self
            .render_row(template, dataset, row_index, qr_config)
            .await?;
        encode_png(&surface)
    }
}

/// Encode an RGBA surface as PNG bytes.
pub fn encode_png(surface: &RgbaImage) -> Result<Vec<u8>, SelloError> {
    let mut bytes = Vec::new();
    surface
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| SelloError::Image(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}

/// Stretch a bitmap to exactly fill the element box (QR draw rule).
fn blit_stretched(surface: &mut RgbaImage, bitmap: &RgbaImage, element: &Element) {
    let resized;
    let bitmap = if bitmap.dimensions() == (element.width, element.height) {
        bitmap
    } else {
        resized = imageops::resize(bitmap, element.width, element.height, FilterType::Nearest);
        &resized
    };
    imageops::overlay(surface, bitmap, element.x as i64, element.y as i64);
}

/// Fit an image inside the element box preserving aspect ratio, centered
/// (image draw rule, "contain" semantics).
fn blit_contained(surface: &mut RgbaImage, source: &DynamicImage, element: &Element) {
    let fitted = source.resize(element.width, element.height, FilterType::Lanczos3);
    let dx = element.x as i64 + (element.width.saturating_sub(fitted.width()) / 2) as i64;
    let dy = element.y as i64 + (element.height.saturating_sub(fitted.height()) / 2) as i64;
    imageops::overlay(surface, &fitted.to_rgba8(), dx, dy);
}
