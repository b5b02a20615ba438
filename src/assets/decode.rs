use std::fmt;
use std::sync::Arc;

use anyhow::{Context, anyhow};

use crate::foundation::error::{CrError, CrResult, FieldPath};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Largest side accepted for decoded and rasterized images.
pub const MAX_IMAGE_DIM: u32 = 16_384;

/// Decoded image asset: tightly packed premultiplied RGBA8.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, premultiplied alpha.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RasterImage {
    /// Wrap straight-alpha RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, mut rgba8: Vec<u8>) -> CrResult<Self> {
        check_len(width, height, rgba8.len()).map_err(asset_error)?;
        premultiply_rgba8_in_place(&mut rgba8);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8),
        })
    }

    /// Wrap pixels that are already premultiplied.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> CrResult<Self> {
        check_len(width, height, rgba8_premul.len()).map_err(asset_error)?;
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Solid single-color image.
    pub fn solid(width: u32, height: u32, rgba8: [u8; 4]) -> CrResult<Self> {
        let n = (width as usize) * (height as usize);
        Self::from_rgba8(width, height, rgba8.repeat(n))
    }

    /// Premultiplied pixel at `(x, y)`; callers keep coordinates in range.
    pub(crate) fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[i..i + 4];
        [p[0], p[1], p[2], p[3]]
    }
}

fn check_len(width: u32, height: u32, len: usize) -> Result<(), String> {
    if width == 0 || height == 0 || width > MAX_IMAGE_DIM || height > MAX_IMAGE_DIM {
        return Err(format!(
            "image size {width}x{height} out of range (1..={MAX_IMAGE_DIM})"
        ));
    }
    let expected = (width as usize) * (height as usize) * 4;
    if len != expected {
        return Err(format!(
            "pixel buffer has {len} bytes, expected {expected} for {width}x{height}"
        ));
    }
    Ok(())
}

fn asset_error(message: String) -> CrError {
    CrError::Asset {
        at: FieldPath::record("image"),
        message,
    }
}

/// Decode encoded image bytes (PNG, JPEG, WebP, GIF, BMP, ... or SVG) into premultiplied RGBA8.
///
/// SVG documents are rasterized at their intrinsic size.
pub fn decode_image(bytes: &[u8]) -> CrResult<RasterImage> {
    let decoded = if looks_like_svg(bytes) {
        decode_svg(bytes)
    } else {
        decode_raster(bytes)
    };
    decoded.map_err(|e| asset_error(format!("{e:#}")))
}

fn decode_raster(bytes: &[u8]) -> anyhow::Result<RasterImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgba8_premul = rgba.into_raw();
    check_len(width, height, rgba8_premul.len()).map_err(anyhow::Error::msg)?;
    premultiply_rgba8_in_place(&mut rgba8_premul);
    Ok(RasterImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn decode_svg(bytes: &[u8]) -> anyhow::Result<RasterImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let size = tree.size();
    let to_px = |v: f32| -> anyhow::Result<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(anyhow!("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    };
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;
    if width > MAX_IMAGE_DIM || height > MAX_IMAGE_DIM {
        return Err(anyhow!(
            "svg raster size too large: {width}x{height} (max {MAX_IMAGE_DIM}x{MAX_IMAGE_DIM})"
        ));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );
    Ok(RasterImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.take()),
    })
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    let t = head.trim_start_matches('\u{feff}').trim_start();
    t.starts_with("<svg") || (t.starts_with("<?xml") && t.contains("<svg"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
