//! Layer compositing onto the canvas.
//!
//! Placement is `translate(x, y) * rotate_about(center)`; axis-aligned layers are copied row by
//! row, rotated ones are inverse-mapped and resampled.

use crate::foundation::core::{Affine, Point, Rect, Vec2};
use crate::foundation::math::{add_sat_u8, mul_div255_u8, unit_to_u8};
use crate::render::canvas::Canvas;
use crate::render::raster::Layer;
use crate::scene::model::{BlendMode, Geometry};

/// How a layer is placed and blended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Element box in canvas pixels, rotation in degrees.
    pub geometry: Geometry,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f64,
    /// Blend mode.
    pub blend: BlendMode,
    /// Bilinear resampling for rotated layers; nearest neighbour otherwise.
    pub antialias: bool,
}

impl Placement {
    /// Layer pixel space to canvas space.
    pub fn transform(&self, layer: &Layer) -> Affine {
        element_to_canvas(&self.geometry) * Affine::translate(layer.origin)
    }
}

/// Element-box space to canvas space.
pub(crate) fn element_to_canvas(g: &Geometry) -> Affine {
    let center = Point::new(g.width / 2.0, g.height / 2.0);
    Affine::translate(Vec2::new(g.x, g.y)) * Affine::rotate_about(g.rotation.to_radians(), center)
}

/// Composite `layer` onto `canvas`, clipped to the canvas bounds.
pub fn composite_layer(canvas: &mut Canvas, layer: &Layer, placement: &Placement) {
    let opacity = placement.opacity.clamp(0.0, 1.0) as f32;
    if opacity <= 0.0 || layer.width == 0 || layer.height == 0 {
        return;
    }
    let transform = placement.transform(layer);
    match pixel_offset(transform) {
        Some((dx, dy)) => composite_aligned(canvas, layer, dx, dy, opacity, placement.blend),
        None => composite_mapped(canvas, layer, transform, opacity, placement),
    }
}

/// Integer translation when the transform is a pure whole-pixel shift.
fn pixel_offset(t: Affine) -> Option<(i64, i64)> {
    const EPS: f64 = 1e-6;
    let [a, b, c, d, e, f] = t.as_coeffs();
    let aligned = (a - 1.0).abs() < EPS
        && b.abs() < EPS
        && c.abs() < EPS
        && (d - 1.0).abs() < EPS
        && (e - e.round()).abs() < EPS
        && (f - f.round()).abs() < EPS;
    aligned.then(|| (e.round() as i64, f.round() as i64))
}

fn composite_aligned(
    canvas: &mut Canvas,
    layer: &Layer,
    dx: i64,
    dy: i64,
    opacity: f32,
    blend: BlendMode,
) {
    let cw = i64::from(canvas.width());
    let ch = i64::from(canvas.height());
    let x0 = dx.max(0);
    let x1 = (dx + i64::from(layer.width)).min(cw);
    let y0 = dy.max(0);
    let y1 = (dy + i64::from(layer.height)).min(ch);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let stride = (layer.width as usize) * 4;
    let sx0 = ((x0 - dx) as usize) * 4;
    let sx1 = ((x1 - dx) as usize) * 4;
    for y in y0..y1 {
        let sy = (y - dy) as usize;
        let src = &layer.rgba8_premul[sy * stride + sx0..sy * stride + sx1];
        let dst = canvas.row_mut(y as u32, x0 as u32, x1 as u32);
        blend_row(dst, src, opacity, blend);
    }
}

fn composite_mapped(
    canvas: &mut Canvas,
    layer: &Layer,
    transform: Affine,
    opacity: f32,
    placement: &Placement,
) {
    let det = transform.determinant();
    if !det.is_finite() || det.abs() < 1e-12 {
        return;
    }
    let inverse = transform.inverse();
    let bounds = transform.transform_rect_bbox(Rect::new(
        0.0,
        0.0,
        f64::from(layer.width),
        f64::from(layer.height),
    ));
    let x0 = bounds.x0.floor().max(0.0) as u32;
    let y0 = bounds.y0.floor().max(0.0) as u32;
    let x1 = (bounds.x1.ceil().max(0.0) as u32).min(canvas.width());
    let y1 = (bounds.y1.ceil().max(0.0) as u32).min(canvas.height());
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let mut row = vec![0u8; ((x1 - x0) as usize) * 4];
    for y in y0..y1 {
        for (i, x) in (x0..x1).enumerate() {
            let p = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let px = if placement.antialias {
                sample_bilinear(layer, p.x - 0.5, p.y - 0.5)
            } else {
                sample_nearest(layer, p.x.floor(), p.y.floor())
            };
            row[i * 4..i * 4 + 4].copy_from_slice(&px);
        }
        let dst = canvas.row_mut(y, x0, x1);
        blend_row(dst, &row, opacity, placement.blend);
    }
}

fn sample_px(layer: &Layer, x: i64, y: i64) -> [u8; 4] {
    if x < 0 || y < 0 || x >= i64::from(layer.width) || y >= i64::from(layer.height) {
        return [0, 0, 0, 0];
    }
    let idx = ((y as usize) * (layer.width as usize) + (x as usize)) * 4;
    let p = &layer.rgba8_premul[idx..idx + 4];
    [p[0], p[1], p[2], p[3]]
}

fn sample_nearest(layer: &Layer, x: f64, y: f64) -> [u8; 4] {
    sample_px(layer, x as i64, y as i64)
}

/// Bilinear sample of premultiplied pixels; outside the layer counts as transparent.
fn sample_bilinear(layer: &Layer, x: f64, y: f64) -> [u8; 4] {
    let fx = x.floor();
    let fy = y.floor();
    let tx = (x - fx) as f32;
    let ty = (y - fy) as f32;
    let (ix, iy) = (fx as i64, fy as i64);
    let p00 = sample_px(layer, ix, iy);
    let p10 = sample_px(layer, ix + 1, iy);
    let p01 = sample_px(layer, ix, iy + 1);
    let p11 = sample_px(layer, ix + 1, iy + 1);
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = f32::from(p00[c]) * (1.0 - tx) + f32::from(p10[c]) * tx;
        let bottom = f32::from(p01[c]) * (1.0 - tx) + f32::from(p11[c]) * tx;
        out[c] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    // Keep the premultiplied invariant after rounding.
    let a = out[3];
    for c in &mut out[..3] {
        *c = (*c).min(a);
    }
    out
}

/// Blend a premultiplied source row over a destination row of the same length.
pub(crate) fn blend_row(dst: &mut [u8], src: &[u8], opacity: f32, blend: BlendMode) {
    debug_assert_eq!(dst.len(), src.len());
    // Blend dispatch happens once per row; each arm monomorphizes its own kernel.
    match blend {
        BlendMode::Normal => over_row(dst, src, opacity),
        BlendMode::Multiply => blend_row_with(dst, src, opacity, |s, d| s * d),
        BlendMode::Screen => blend_row_with(dst, src, opacity, |s, d| s + d - s * d),
        BlendMode::Overlay => blend_row_with(dst, src, opacity, |s, d| {
            if d <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }),
        BlendMode::Darken => blend_row_with(dst, src, opacity, |s, d| s.min(d)),
        BlendMode::Lighten => blend_row_with(dst, src, opacity, |s, d| s.max(d)),
        BlendMode::ColorDodge => blend_row_with(dst, src, opacity, |s, d| {
            if d <= 0.0 {
                0.0
            } else if s >= 1.0 {
                1.0
            } else {
                (d / (1.0 - s)).min(1.0)
            }
        }),
        BlendMode::ColorBurn => blend_row_with(dst, src, opacity, |s, d| {
            if d >= 1.0 {
                1.0
            } else if s <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - d) / s).min(1.0)
            }
        }),
        BlendMode::HardLight => blend_row_with(dst, src, opacity, |s, d| {
            if s <= 0.5 {
                2.0 * s * d
            } else {
                1.0 - 2.0 * (1.0 - s) * (1.0 - d)
            }
        }),
        BlendMode::SoftLight => blend_row_with(dst, src, opacity, |s, d| {
            if s <= 0.5 {
                d - (1.0 - 2.0 * s) * d * (1.0 - d)
            } else {
                let g = if d <= 0.25 {
                    ((16.0 * d - 12.0) * d + 4.0) * d
                } else {
                    d.sqrt()
                };
                d + (2.0 * s - 1.0) * (g - d)
            }
        }),
        BlendMode::Difference => blend_row_with(dst, src, opacity, |s, d| (d - s).abs()),
        BlendMode::Exclusion => blend_row_with(dst, src, opacity, |s, d| d + s - 2.0 * d * s),
    }
}

/// Integer premultiplied source-over.
fn over_row(dst: &mut [u8], src: &[u8], opacity: f32) {
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);
        d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = add_sat_u8(sc, dc);
        }
    }
}

/// Source-over with a separable blend function on un-premultiplied colors:
/// `out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da`.
#[inline(always)]
fn blend_row_with<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F)
where
    F: Fn(f32, f32) -> f32,
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = (f32::from(s[3]) / 255.0) * opacity;
        if sa <= 0.0 {
            continue;
        }
        let da = f32::from(d[3]) / 255.0;
        let inv_sa = 1.0 - sa;
        let out_a = (sa + da * inv_sa).clamp(0.0, 1.0);

        for c in 0..3 {
            let sp = (f32::from(s[c]) / 255.0) * opacity;
            let dp = f32::from(d[c]) / 255.0;
            let sc = (sp / sa).clamp(0.0, 1.0);
            let dc = if da > 0.0 {
                (dp / da).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let b = blend_fn(sc, dc).clamp(0.0, 1.0);
            let out_p = (sp * (1.0 - da) + dp * inv_sa + b * sa * da).clamp(0.0, out_a);
            d[c] = unit_to_u8(out_p);
        }
        d[3] = unit_to_u8(out_a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
