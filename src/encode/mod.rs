//! Canvas serialization.

use std::io::Cursor;

use image::ImageEncoder;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{CrError, CrResult};
use crate::render::canvas::Canvas;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Output image format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Lossless RGBA PNG.
    #[default]
    Png,
    /// Baseline JPEG; alpha is flattened onto white.
    Jpeg {
        /// Quality in `1..=100`; out-of-range values are clamped.
        quality: u8,
    },
    /// Lossless RGBA WebP.
    #[serde(rename = "webp")]
    WebP,
}

impl OutputFormat {
    /// JPEG at [`DEFAULT_JPEG_QUALITY`].
    pub fn jpeg() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
            Self::WebP => "webp",
        }
    }
}

/// Serialize a canvas.
pub fn encode_canvas(canvas: &Canvas, format: OutputFormat) -> CrResult<Vec<u8>> {
    let (width, height) = (canvas.width(), canvas.height());
    if canvas.rgba8_premul.len() != canvas.size.rgba8_len() {
        return Err(CrError::encode(format!(
            "canvas buffer has {} bytes, expected {} for {width}x{height}",
            canvas.rgba8_premul.len(),
            canvas.size.rgba8_len()
        )));
    }

    let mut out = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Png => image::codecs::png::PngEncoder::new(&mut out).write_image(
            &canvas.to_rgba8(),
            width,
            height,
            image::ExtendedColorType::Rgba8,
        ),
        OutputFormat::Jpeg { quality } => {
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                .write_image(
                    &flatten_on_white(&canvas.rgba8_premul),
                    width,
                    height,
                    image::ExtendedColorType::Rgb8,
                )
        }
        OutputFormat::WebP => image::codecs::webp::WebPEncoder::new_lossless(&mut out).write_image(
            &canvas.to_rgba8(),
            width,
            height,
            image::ExtendedColorType::Rgba8,
        ),
    };
    result.map_err(|e| CrError::encode(format!("{}: {e}", format.extension())))?;
    Ok(out.into_inner())
}

/// Premultiplied RGBA over opaque white, as packed RGB.
fn flatten_on_white(rgba8_premul: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba8_premul.len() / 4 * 3);
    for px in rgba8_premul.chunks_exact(4) {
        let white = 255 - px[3];
        rgb.extend(px[..3].iter().map(|&c| c.saturating_add(white)));
    }
    rgb
}

#[cfg(test)]
#[path = "../../tests/unit/encode/mod.rs"]
mod tests;
