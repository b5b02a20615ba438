//! Element rasterization into isolated layers.
//!
//! Every element is drawn into its own premultiplied buffer with `vello_cpu`. Shapes and text are
//! drawn in design pixels under the content-scale transform; images are resampled straight into
//! the output-pixel box.

use std::sync::Arc;

use crate::assets::decode::RasterImage;
use crate::foundation::core::{Affine, PixelSize, Rect, Rgba8, Vec2};
use crate::foundation::error::{CrError, CrResult, FieldPath};
use crate::render::composite::element_to_canvas;
use crate::scene::model::{
    Element, ElementKind, FitMode, Geometry, ShapeKind, ShapeProps, TextProps,
};
use crate::schema::record::Record;
use crate::text::layout::{TextLayout, layout_text};
use crate::text::resolve::FontSet;

/// Horizontal ink allowance beyond the advance box, in ems.
const OVERHANG_EM: f64 = 0.25;

/// Margin kept around the visible window for edge coverage and bilinear taps.
const WINDOW_MARGIN: f64 = 2.0;

/// Rasterized element.
#[derive(Clone, PartialEq)]
pub struct Layer {
    /// Position of the buffer's top-left corner relative to the element box, in canvas pixels.
    pub origin: Vec2,
    /// Buffer width in pixels.
    pub width: u32,
    /// Buffer height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, premultiplied alpha.
    pub rgba8_premul: Vec<u8>,
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("origin", &self.origin)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Layer {
    /// Premultiplied pixel at `(x, y)`; callers keep coordinates in range.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[i..i + 4];
        [p[0], p[1], p[2], p[3]]
    }
}

/// Shared inputs of the rasterizer for one render call.
#[derive(Clone, Copy, Debug)]
pub struct RasterCtx<'a> {
    /// Output canvas size; layers are cut to the part of the element that can land on it.
    pub canvas: PixelSize,
    /// Output-to-design pixel ratio.
    pub content_scale: Vec2,
    /// Anti-aliased coverage; `false` thresholds shape and glyph coverage at 50%.
    pub antialias: bool,
    /// Draw glyphs for text elements; otherwise their pre-rendered image is used.
    pub render_text: bool,
    /// Faces resolved for the document.
    pub fonts: &'a FontSet,
    /// Decoded assets of the record.
    pub assets: &'a Record,
}

/// Rasterize one element.
///
/// `subpixel` is the offset in `[0, 1)` of the element box inside the layer's pixel grid, so an
/// unrotated layer lands on whole canvas pixels. Only the part of the element that can reach the
/// canvas is rasterized; `Layer::origin` locates that window. Returns `None` for text elements
/// that are neither drawn as glyphs nor backed by an image.
pub fn rasterize(el: &Element, ctx: &RasterCtx<'_>, subpixel: Vec2) -> CrResult<Option<Layer>> {
    let g = &el.geometry;
    let frame = Frame {
        element: el.index,
        box_rect: Rect::new(0.0, 0.0, g.width, g.height),
        window: visible_window(g, ctx.canvas),
        subpixel,
    };
    match &el.kind {
        ElementKind::Image(props) => {
            let image = lookup_asset(ctx.assets, el.index, props.asset.as_deref())?;
            image_layer(&frame, image, props.fit).map(Some)
        }
        ElementKind::Shape(props) => shape_layer(&frame, props, ctx).map(Some),
        ElementKind::Text(props) if ctx.render_text => text_layer(&frame, props, ctx).map(Some),
        ElementKind::Text(props) => match props.image.as_deref() {
            None => Ok(None),
            Some(id) => {
                let image = lookup_asset(ctx.assets, el.index, Some(id))?;
                image_layer(&frame, image, FitMode::Stretch).map(Some)
            }
        },
    }
}

/// Canvas rectangle in element-box coordinates, with a small margin.
fn visible_window(g: &Geometry, canvas: PixelSize) -> Rect {
    let canvas_rect = Rect::new(0.0, 0.0, f64::from(canvas.width), f64::from(canvas.height));
    element_to_canvas(g)
        .inverse()
        .transform_rect_bbox(canvas_rect)
        .inflate(WINDOW_MARGIN, WINDOW_MARGIN)
}

fn lookup_asset<'r>(
    record: &'r Record,
    element: usize,
    id: Option<&str>,
) -> CrResult<&'r RasterImage> {
    let id = id.ok_or_else(|| CrError::asset(element, "image", "element has no image asset"))?;
    record.asset(id).ok_or_else(|| {
        CrError::asset(element, "image", format!("asset `{id}` not found in record"))
    })
}

/// Where one element is drawn: its box, the visible window and the subpixel shift.
struct Frame {
    element: usize,
    box_rect: Rect,
    window: Rect,
    subpixel: Vec2,
}

impl Frame {
    /// Grid over `bounds` cut to the visible window.
    fn grid(&self, bounds: Rect) -> CrResult<Grid> {
        Grid::new(self.element, bounds.intersect(self.window), self.subpixel)
    }
}

/// Pixel grid covering `bounds` (element-box coordinates) shifted by `subpixel`.
struct Grid {
    origin: Vec2,
    width: u16,
    height: u16,
}

impl Grid {
    fn new(element: usize, bounds: Rect, subpixel: Vec2) -> CrResult<Self> {
        let left = (bounds.x0 + subpixel.x).floor();
        let top = (bounds.y0 + subpixel.y).floor();
        let right = (bounds.x1 + subpixel.x).ceil().max(left + 1.0);
        let bottom = (bounds.y1 + subpixel.y).ceil().max(top + 1.0);
        let side = |field: &str, v: f64| -> CrResult<u16> {
            if !v.is_finite() || v > f64::from(u16::MAX) {
                return Err(CrError::geometry(
                    FieldPath::element(element, field),
                    format!("layer side {v} is not a valid pixel count"),
                ));
            }
            Ok(v as u16)
        };
        Ok(Self {
            origin: Vec2::new(left - subpixel.x, top - subpixel.y),
            width: side("width", right - left)?,
            height: side("height", bottom - top)?,
        })
    }

    /// Element-box coordinates to buffer coordinates.
    fn to_buffer(&self) -> Affine {
        Affine::translate(-self.origin)
    }

    fn context(&self) -> vello_cpu::RenderContext {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx
    }

    fn finish(&self, mut ctx: vello_cpu::RenderContext) -> Layer {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        Layer {
            origin: self.origin,
            width: u32::from(self.width),
            height: u32::from(self.height),
            rgba8_premul: pixmap.data_as_u8_slice().to_vec(),
        }
    }
}

fn image_layer(frame: &Frame, image: &RasterImage, fit: FitMode) -> CrResult<Layer> {
    let box_rect = frame.box_rect;
    let grid = frame.grid(box_rect)?;
    let paint = image_paint(image)?;
    let (iw, ih) = (f64::from(image.width), f64::from(image.height));
    let (bw, bh) = (box_rect.width(), box_rect.height());

    // `placement` maps image pixels into the box; `src` is the visible part of the image.
    let (placement, src) = match fit {
        FitMode::Stretch => (
            Affine::scale_non_uniform(bw / iw, bh / ih),
            Rect::new(0.0, 0.0, iw, ih),
        ),
        FitMode::Contain => {
            let s = (bw / iw).min(bh / ih);
            let offset = Vec2::new((bw - iw * s) / 2.0, (bh - ih * s) / 2.0);
            (
                Affine::translate(offset) * Affine::scale(s),
                Rect::new(0.0, 0.0, iw, ih),
            )
        }
        FitMode::Cover => {
            let s = (bw / iw).max(bh / ih);
            let (vw, vh) = (bw / s, bh / s);
            let crop = Vec2::new((iw - vw) / 2.0, (ih - vh) / 2.0);
            (
                Affine::scale(s) * Affine::translate(-crop),
                Rect::new(crop.x, crop.y, crop.x + vw, crop.y + vh),
            )
        }
    };

    let mut ctx = grid.context();
    if bw > 0.0 && bh > 0.0 {
        ctx.set_transform(affine_to_cpu(grid.to_buffer() * placement));
        ctx.set_paint(paint);
        ctx.fill_rect(&rect_to_cpu(src));
    }
    Ok(grid.finish(ctx))
}

fn image_paint(image: &RasterImage) -> CrResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn shape_layer(frame: &Frame, props: &ShapeProps, rc: &RasterCtx<'_>) -> CrResult<Layer> {
    use vello_cpu::kurbo::Shape;

    let box_rect = frame.box_rect;
    let grid = frame.grid(box_rect)?;
    let scale = rc.content_scale;
    // Shapes are drawn in design pixels.
    let design = vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        box_rect.width() / scale.x,
        box_rect.height() / scale.y,
    );

    let mut ctx = grid.context();
    ctx.set_transform(affine_to_cpu(
        grid.to_buffer() * Affine::scale_non_uniform(scale.x, scale.y),
    ));
    let mut paint_alpha = 0u8;

    match props.kind {
        ShapeKind::Rect | ShapeKind::Ellipse => {
            if props.fill.a > 0 {
                ctx.set_paint(color_to_cpu(props.fill));
                match props.kind {
                    ShapeKind::Ellipse => {
                        ctx.fill_path(&vello_cpu::kurbo::Ellipse::from_rect(design).to_path(0.1));
                    }
                    _ => ctx.fill_rect(&design),
                }
                paint_alpha = paint_alpha.max(props.fill.a);
            }
            if let Some(stroke) = props.stroke.filter(|s| s.width > 0.0 && s.color.a > 0) {
                // Inset so the outline stays inside the box.
                let half = (stroke.width / 2.0)
                    .min(design.width() / 2.0)
                    .min(design.height() / 2.0);
                let inset = design.inset(-half);
                let path = match props.kind {
                    ShapeKind::Ellipse => vello_cpu::kurbo::Ellipse::from_rect(inset).to_path(0.1),
                    _ => inset.to_path(0.1),
                };
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(stroke.width));
                ctx.set_paint(color_to_cpu(stroke.color));
                ctx.stroke_path(&path);
                paint_alpha = paint_alpha.max(stroke.color.a);
            }
        }
        ShapeKind::Line => {
            let (color, width) = match props.stroke {
                Some(s) if s.width > 0.0 => (s.color, s.width),
                _ => (props.fill, 1.0),
            };
            if color.a > 0 {
                let y = design.height() / 2.0;
                let mut path = vello_cpu::kurbo::BezPath::new();
                path.move_to((0.0, y));
                path.line_to((design.width(), y));
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
                ctx.set_paint(color_to_cpu(color));
                ctx.stroke_path(&path);
                paint_alpha = color.a;
            }
        }
    }

    let mut layer = grid.finish(ctx);
    if !rc.antialias {
        threshold_coverage(&mut layer.rgba8_premul, paint_alpha);
    }
    Ok(layer)
}

fn text_layer(frame: &Frame, props: &TextProps, rc: &RasterCtx<'_>) -> CrResult<Layer> {
    let box_rect = frame.box_rect;
    let scale = rc.content_scale;
    let design_box = Vec2::new(box_rect.width() / scale.x, box_rect.height() / scale.y);
    let layout = layout_text(props, design_box, rc.fonts, frame.element)?;

    let bounds = match ink_bounds(&layout, rc.fonts) {
        Some(ink) => box_rect.union(Rect::new(
            ink.x0 * scale.x,
            ink.y0 * scale.y,
            ink.x1 * scale.x,
            ink.y1 * scale.y,
        )),
        None => box_rect,
    };
    let grid = frame.grid(bounds)?;
    let mut ctx = grid.context();
    ctx.set_transform(affine_to_cpu(
        grid.to_buffer() * Affine::scale_non_uniform(scale.x, scale.y),
    ));

    let font_size = layout.font_size as f32;
    let mut paint_alpha = 0u8;
    for line in &layout.lines {
        for run in line.glyphs.chunk_by(|a, b| a.style == b.style) {
            let style = &layout.styles[run[0].style];
            if style.color.a == 0 {
                continue;
            }
            paint_alpha = paint_alpha.max(style.color.a);
            let font = rc.fonts.get(&style.typography);
            ctx.set_paint(color_to_cpu(style.color));
            let glyphs = run.iter().map(|g| vello_cpu::Glyph {
                id: g.glyph_id,
                x: (line.x + g.offset.x) as f32,
                y: (line.baseline + g.offset.y) as f32,
            });
            ctx.glyph_run(font.font_data())
                .font_size(font_size)
                .fill_glyphs(glyphs);
        }
    }

    let mut layer = grid.finish(ctx);
    if !rc.antialias {
        threshold_coverage(&mut layer.rgba8_premul, paint_alpha);
    }
    Ok(layer)
}

/// Ink rectangle of a layout in design pixels, widened for glyph overhang.
fn ink_bounds(layout: &TextLayout, fonts: &FontSet) -> Option<Rect> {
    let (ascent, descent) = layout
        .styles
        .iter()
        .map(|s| fonts.get(&s.typography).metrics())
        .fold((0.0f64, 0.0f64), |(a, d), m| {
            (a.max(f64::from(m.ascent)), d.min(f64::from(m.descent)))
        });
    let pad = layout.font_size * OVERHANG_EM;
    layout
        .ink_bounds(ascent, descent)
        .map(|r| Rect::new(r.x0 - pad, r.y0 - pad, r.x1 + pad, r.y1 + pad))
}

/// Turn anti-aliased coverage into hard edges at 50% of `paint_alpha`.
///
/// Covered pixels are restored to the full paint alpha with their own color.
fn threshold_coverage(rgba8_premul: &mut [u8], paint_alpha: u8) {
    if paint_alpha == 0 {
        rgba8_premul.fill(0);
        return;
    }
    let cut = u16::from(paint_alpha).div_ceil(2);
    for px in rgba8_premul.chunks_exact_mut(4) {
        let a = px[3];
        if u16::from(a) < cut {
            px.fill(0);
            continue;
        }
        if a >= paint_alpha {
            continue;
        }
        let target = u32::from(paint_alpha);
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * target + u32::from(a) / 2) / u32::from(a)).min(target) as u8;
        }
        px[3] = paint_alpha;
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> CrResult<vello_cpu::Pixmap> {
    let side = |v: u32| -> CrResult<u16> {
        u16::try_from(v).map_err(|_| {
            CrError::Asset {
                at: FieldPath::record("image"),
                message: format!("image side {v} exceeds {}", u16::MAX),
            }
        })
    };
    let (w, h) = (side(width)?, side(height)?);
    let mut may_have_opacities = false;
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
