use anyhow::{Context, Result};
use image::Luma;
use qrcode::render::unicode::Dense1x2;
use qrcode::{EcLevel, QrCode};
use std::path::{Path, PathBuf};

pub const DEFAULT_QR_FILE: &str = "qrcode.png";

/// Pixels per QR module in saved images.
pub const MODULE_PIXELS: u32 = 10;

/// Resolves a user-supplied file name for a QR image. Blank names use the
/// default, and a `.png` suffix is appended when missing.
pub fn png_path(name: &str) -> PathBuf {
    let name = name.trim();
    if name.is_empty() {
        return PathBuf::from(DEFAULT_QR_FILE);
    }
    if name.ends_with(".png") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}.png", name))
    }
}

fn encode(text: &str) -> Result<QrCode> {
    QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)
        .context("Failed to encode text as a QR code")
}

/// Writes `text` as a black-on-white PNG QR code with a standard quiet zone.
pub fn save_png(text: &str, path: &Path) -> Result<PathBuf> {
    let code = encode(text)?;

    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .quiet_zone(true)
        .build();

    image
        .save(path)
        .with_context(|| format!("Failed to save QR code to '{}'", path.display()))?;

    log::info!(
        "saved {}x{} QR code to {}",
        image.width(),
        image.height(),
        path.display()
    );

    Ok(path.to_path_buf())
}

/// Renders `text` as a QR code drawn with Unicode half blocks.
pub fn render_terminal(text: &str) -> Result<String> {
    let code = encode(text)?;

    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}
