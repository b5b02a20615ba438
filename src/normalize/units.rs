use serde::{Deserialize, Serialize};

use crate::assets::decode::MAX_IMAGE_DIM;
use crate::foundation::core::{PixelSize, Vec2};
use crate::foundation::error::{CrError, CrResult, FieldPath};
use crate::scene::model::{AngleUnit, Document, Element, ElementKind, GeometryUnits};

/// Output canvas size policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasSize {
    /// Declared canvas size of the record.
    #[default]
    Native,
    /// Uniform downscale so the longer side is at most `n` pixels; never upscales.
    MaxSide(u32),
    /// Explicit output size; the content is scaled per axis.
    Exact {
        /// Output width.
        width: u32,
        /// Output height.
        height: u32,
    },
}

/// Rewrite all geometry into absolute pixels of the target canvas.
///
/// Rotation ends up in degrees within `[0, 360)`, opacity in `[0, 1]`, and
/// [`Document::content_scale`] holds the output-to-design pixel ratio. Values outside the canvas
/// are kept; the compositor clips them.
pub fn resolve_units(mut doc: Document, size: CanvasSize) -> CrResult<Document> {
    let declared = doc.canvas;
    for (field, side) in [("canvas_width", declared.width), ("canvas_height", declared.height)] {
        if side == 0 {
            return Err(CrError::geometry(
                FieldPath::record(field),
                "declared canvas side is zero",
            ));
        }
    }

    let (scale, target) = target_scale(declared, size)?;
    let design = Vec2::new(f64::from(declared.width), f64::from(declared.height));

    for el in &mut doc.elements {
        resolve_element(el, design, scale)?;
    }
    doc.canvas = target;
    doc.content_scale = scale;
    Ok(doc)
}

/// Scale factors and output size for a declared canvas.
///
/// Mirrors the dataset's reference thumbnails: a side that would round to zero pixels is forced
/// to one pixel.
pub(crate) fn target_scale(declared: PixelSize, size: CanvasSize) -> CrResult<(Vec2, PixelSize)> {
    let w = f64::from(declared.width);
    let h = f64::from(declared.height);
    let (mut sx, mut sy) = match size {
        CanvasSize::Native => (1.0, 1.0),
        CanvasSize::MaxSide(max) => {
            let s = (f64::from(max) / w.max(h)).min(1.0);
            (s, s)
        }
        CanvasSize::Exact { width, height } => (f64::from(width) / w, f64::from(height) / h),
    };
    if (w * sx).round() <= 0.0 {
        sx = 1.0 / w;
    }
    if (h * sy).round() <= 0.0 {
        sy = 1.0 / h;
    }

    let out_w = (w * sx).round() as u32;
    let out_h = (h * sy).round() as u32;
    if out_w > MAX_IMAGE_DIM || out_h > MAX_IMAGE_DIM {
        return Err(CrError::geometry(
            FieldPath::record("canvas"),
            format!("output canvas {out_w}x{out_h} exceeds {MAX_IMAGE_DIM} pixels per side"),
        ));
    }
    Ok((Vec2::new(sx, sy), PixelSize::new(out_w, out_h)?))
}

fn resolve_element(el: &mut Element, design: Vec2, scale: Vec2) -> CrResult<()> {
    let i = el.index;
    let g = &mut el.geometry;
    for (field, v) in [
        ("left", g.x),
        ("top", g.y),
        ("width", g.width),
        ("height", g.height),
        ("angle", g.rotation),
    ] {
        finite(i, field, v)?;
    }
    for (field, v) in [("width", g.width), ("height", g.height)] {
        if v < 0.0 {
            return Err(CrError::geometry(
                FieldPath::element(i, field),
                format!("negative size {v}"),
            ));
        }
    }
    finite(i, "opacity", el.opacity)?;

    let (unit_x, unit_y) = match g.units {
        GeometryUnits::Pixels => (1.0, 1.0),
        GeometryUnits::CanvasFraction => (design.x, design.y),
    };
    g.x *= unit_x * scale.x;
    g.width *= unit_x * scale.x;
    g.y *= unit_y * scale.y;
    g.height *= unit_y * scale.y;
    g.units = GeometryUnits::Pixels;

    let degrees = match g.angle_unit {
        AngleUnit::Degrees => g.rotation,
        AngleUnit::Radians => g.rotation.to_degrees(),
    };
    g.rotation = normalize_degrees(degrees);
    g.angle_unit = AngleUnit::Degrees;
    el.opacity = el.opacity.clamp(0.0, 1.0);

    match &el.kind {
        ElementKind::Text(t) => {
            for (field, v) in [("font_size", t.font_size), ("line_height", t.line_height)] {
                if !(v.is_finite() && v > 0.0) {
                    return Err(CrError::geometry(
                        FieldPath::element(i, field),
                        format!("must be positive and finite, got {v}"),
                    ));
                }
            }
            finite(i, "letter_spacing", t.letter_spacing)?;
            if let Some(w) = t.wrap_width {
                finite(i, "wrap_width", w)?;
            }
        }
        ElementKind::Shape(s) => {
            if let Some(stroke) = &s.stroke {
                finite(i, "stroke_width", stroke.width)?;
            }
        }
        ElementKind::Image(_) => {}
    }
    Ok(())
}

fn finite(element: usize, field: &str, v: f64) -> CrResult<()> {
    if v.is_finite() {
        return Ok(());
    }
    Err(CrError::geometry(
        FieldPath::element(element, field),
        format!("non-finite value {v}"),
    ))
}

/// Map any finite angle into `[0, 360)`.
pub(crate) fn normalize_degrees(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= 360.0 { 0.0 } else { r }
}

#[cfg(test)]
#[path = "../../tests/unit/normalize/units.rs"]
mod tests;
