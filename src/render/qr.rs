//! QR bitmap generation.
//!
//! Wraps the `qrcode` crate: encode the payload to a module matrix, then
//! rasterize modules plus quiet-zone margin into an exact square RGBA bitmap
//! in the configured colors. The renderer stretches that square to the
//! element box, so distortion only occurs when an element is non-square.

use image::{Rgba, RgbaImage};
use qrcode::{QrCode, Version};

use crate::error::SelloError;
use crate::template::{EcLevel, QrConfig};

use super::color;

/// Encode `content` as a `width`×`width` RGBA bitmap.
///
/// A fixed `version` in the config fails if the payload does not fit — that
/// is a configuration defect and propagates, unlike image-load failures.
pub fn encode_qr(content: &str, width: u32, config: &QrConfig) -> Result<RgbaImage, SelloError> {
    let ec = match config.error_correction {
        EcLevel::L => qrcode::EcLevel::L,
        EcLevel::M => qrcode::EcLevel::M,
        EcLevel::Q => qrcode::EcLevel::Q,
        EcLevel::H => qrcode::EcLevel::H,
    };

    let code = match config.version {
        Some(v) => {
            if !(1..=40).contains(&v) {
                return Err(SelloError::QrEncode(format!(
                    "version must be 1-40, got {}",
                    v
                )));
            }
            QrCode::with_version(content, Version::Normal(v as i16), ec)
        }
        None => QrCode::with_error_correction_level(content, ec),
    }
    .map_err(|e| SelloError::QrEncode(format!("QR encoding failed: {}", e)))?;

    let dark = color::parse_or(&config.dark_color, color::BLACK);
    let light = color::parse_or(&config.light_color, color::WHITE);

    Ok(rasterize(&code, width.max(1), config.margin, dark, light))
}

/// Paint the module matrix into a square bitmap of exactly `width` pixels.
///
/// Each output pixel maps back to a module index (nearest-neighbor), so the
/// result is deterministic at any size, including non-integer module sizes.
fn rasterize(code: &QrCode, width: u32, margin: u32, dark: Rgba<u8>, light: Rgba<u8>) -> RgbaImage {
    let modules = code.width();
    let total = modules + 2 * margin as usize;
    let mut image = RgbaImage::from_pixel(width, width, light);

    for py in 0..width {
        let my = (py as usize * total) / width as usize;
        for px in 0..width {
            let mx = (px as usize * total) / width as usize;
            let qx = mx.wrapping_sub(margin as usize);
            let qy = my.wrapping_sub(margin as usize);
            if qx < modules && qy < modules && code[(qx, qy)] == qrcode::Color::Dark {
                image.put_pixel(px, py, dark);
            }
        }
    }

    image
}
