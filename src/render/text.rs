//! Bitmap text rendering with the Spleen font family.
//!
//! Glyphs come from the Spleen PSF2 fonts at three base sizes; arbitrary
//! font sizes map to the closest base and an integer nearest-neighbor scale.

use image::{Rgba, RgbaImage};
use spleen_font::{FONT_6X12, FONT_8X16, FONT_12X24, PSF2Font};

use crate::template::{Element, FontWeight, TextAlign, TextElement};

use super::color;

/// Fixed horizontal inset for left/right aligned text.
const TEXT_INSET: i64 = 4;

/// Available base glyph sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Small,  // 6x12
    Medium, // 8x16
    Large,  // 12x24
}

impl Face {
    fn dims(self) -> (usize, usize) {
        match self {
            Face::Small => (6, 12),
            Face::Medium => (8, 16),
            Face::Large => (12, 24),
        }
    }
}

/// Pick a base face and integer scale for a requested pixel height.
///
/// Exact multiples of a base height win (largest base first), otherwise the
/// largest base that fits. `24` → Large×1, `32` → Medium×2, `20` → Medium×1.
fn face_for_size(font_size: u32) -> (Face, usize) {
    let size = font_size.max(1) as usize;
    for face in [Face::Large, Face::Medium, Face::Small] {
        let (_, h) = face.dims();
        if size >= h && size % h == 0 {
            return (face, size / h);
        }
    }
    for face in [Face::Large, Face::Medium] {
        let (_, h) = face.dims();
        if size >= h {
            return (face, size / h);
        }
    }
    (Face::Small, 1)
}

/// Render a glyph bitmap (row-major, 1 = inked) for a character.
/// Returns `None` when the font has no glyph for it.
fn rasterize(face: Face, ch: char) -> Option<Vec<u8>> {
    let (w, h) = face.dims();
    let utf8 = ch.to_string();
    match face {
        Face::Small => {
            let mut font = PSF2Font::new(FONT_6X12).ok()?;
            font.glyph_for_utf8(utf8.as_bytes())
                .map(|g| collect_glyph(g, w, h))
        }
        Face::Medium => {
            let mut font = PSF2Font::new(FONT_8X16).ok()?;
            font.glyph_for_utf8(utf8.as_bytes())
                .map(|g| collect_glyph(g, w, h))
        }
        Face::Large => {
            let mut font = PSF2Font::new(FONT_12X24).ok()?;
            font.glyph_for_utf8(utf8.as_bytes())
                .map(|g| collect_glyph(g, w, h))
        }
    }
}

fn collect_glyph<G, R>(glyph: G, width: usize, height: usize) -> Vec<u8>
where
    G: Iterator<Item = R>,
    R: Iterator<Item = bool>,
{
    let mut bitmap = vec![0u8; width * height];
    for (gy, row) in glyph.enumerate() {
        for (gx, on) in row.enumerate() {
            if on && gx < width && gy < height {
                bitmap[gy * width + gx] = 1;
            }
        }
    }
    bitmap
}

/// Box outline for characters the font doesn't cover.
fn box_glyph(width: usize, height: usize) -> Vec<u8> {
    let mut glyph = vec![0u8; width * height];
    for x in 0..width {
        glyph[x] = 1;
        glyph[(height - 1) * width + x] = 1;
    }
    for y in 0..height {
        glyph[y * width] = 1;
        glyph[y * width + width - 1] = 1;
    }
    glyph
}

/// Draw a single-line text run into its element box.
///
/// Horizontal placement follows `text_align` (left/right keep a fixed inset,
/// center uses the box midpoint); vertical placement centers the glyph line
/// in the box. Pixels clip to the surface, not the box — matching the
/// source-canvas behavior where long strings overflow their box.
pub(crate) fn draw_text(
    surface: &mut RgbaImage,
    content: &str,
    element: &Element,
    style: &TextElement,
) {
    if content.is_empty() {
        return;
    }

    let color = color::parse_or(&style.font_color, color::BLACK);
    let (face, scale) = face_for_size(style.font_size);
    let (cw, chh) = face.dims();
    let glyph_w = (cw * scale) as i64;
    let glyph_h = (chh * scale) as i64;

    let chars: Vec<char> = content.chars().collect();
    let text_width = glyph_w * chars.len() as i64;

    let box_x = element.x as i64;
    let box_y = element.y as i64;
    let box_w = element.width as i64;
    let box_h = element.height as i64;

    let start_x = match style.text_align {
        TextAlign::Left => box_x + TEXT_INSET,
        TextAlign::Center => box_x + (box_w - text_width) / 2,
        TextAlign::Right => box_x + box_w - TEXT_INSET - text_width,
    };
    let start_y = box_y + (box_h - glyph_h) / 2;

    let bold = style.font_weight == FontWeight::Bold;
    let mut pen_x = start_x;
    for ch in chars {
        draw_char(surface, ch, face, scale, pen_x, start_y, color, bold);
        pen_x += glyph_w;
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_char(
    surface: &mut RgbaImage,
    ch: char,
    face: Face,
    scale: usize,
    origin_x: i64,
    origin_y: i64,
    color: Rgba<u8>,
    bold: bool,
) {
    let (w, h) = face.dims();
    let bitmap = rasterize(face, ch).unwrap_or_else(|| box_glyph(w, h));

    for gy in 0..h {
        for gx in 0..w {
            if bitmap[gy * w + gx] == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    let px = origin_x + (gx * scale + sx) as i64;
                    let py = origin_y + (gy * scale + sy) as i64;
                    put_pixel_clipped(surface, px, py, color);
                    if bold {
                        // Double-strike offset by 1px.
                        put_pixel_clipped(surface, px + 1, py, color);
                    }
                }
            }
        }
    }
}

fn put_pixel_clipped(surface: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < surface.width() && (y as u32) < surface.height() {
        surface.put_pixel(x as u32, y as u32, color);
    }
}
