use crate::foundation::core::{PixelSize, Rgba8};
use crate::foundation::error::{CrError, CrResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// Output surface of one render call: tightly packed premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    /// Canvas size in pixels.
    pub size: PixelSize,
    /// `width * height * 4` bytes, premultiplied alpha.
    pub rgba8_premul: Vec<u8>,
}

impl Canvas {
    /// Canvas filled with `background`.
    pub fn new(size: PixelSize, background: Rgba8) -> Self {
        let px = background.premultiply().to_array();
        Self {
            size,
            rgba8_premul: px.repeat(size.rgba8_len() / 4),
        }
    }

    /// Wrap an existing premultiplied buffer.
    pub fn from_premul_rgba8(size: PixelSize, rgba8_premul: Vec<u8>) -> CrResult<Self> {
        if rgba8_premul.len() != size.rgba8_len() {
            return Err(CrError::encode(format!(
                "canvas buffer has {} bytes, expected {} for {}x{}",
                rgba8_premul.len(),
                size.rgba8_len(),
                size.width,
                size.height
            )));
        }
        Ok(Self { size, rgba8_premul })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Premultiplied pixel at `(x, y)`, `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = ((y as usize) * (self.size.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[i..i + 4];
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Straight-alpha copy of the pixels.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    /// Mutable row `y`, restricted to columns `x0..x1`.
    pub(crate) fn row_mut(&mut self, y: u32, x0: u32, x1: u32) -> &mut [u8] {
        let stride = (self.size.width as usize) * 4;
        let start = (y as usize) * stride + (x0 as usize) * 4;
        let end = (y as usize) * stride + (x1 as usize) * 4;
        &mut self.rgba8_premul[start..end]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
