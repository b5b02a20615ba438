//! Record-to-image orchestration.
//!
//! Pipeline per call:
//! 1. [`adapt`](crate::adapt) the record into a [`Document`]
//! 2. [`resolve_units`](crate::resolve_units) to output-canvas pixels
//! 3. resolve one face per typography key of the visible text elements
//! 4. [`rasterize`](crate::rasterize) every visible element into its own [`Layer`]
//! 5. [`composite_layer`](crate::composite_layer) the layers in document order
//! 6. [`encode_canvas`](crate::encode_canvas)

use std::sync::Arc;

use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::encode::{OutputFormat, encode_canvas};
use crate::foundation::core::{PixelSize, Vec2};
use crate::foundation::error::{CrError, CrResult};
use crate::normalize::{CanvasSize, resolve_units};
use crate::render::canvas::Canvas;
use crate::render::composite::{Placement, composite_layer};
use crate::render::raster::{Layer, RasterCtx, rasterize};
use crate::scene::model::{Document, Element, ElementKind};
use crate::schema::{Record, SchemaDescriptor, SchemaRevision, adapt};
use crate::text::font::{FontLibrary, FontSupplier, TypographyKey};
use crate::text::layout::style_keys;
use crate::text::resolve::{FallbackStep, FontResolver, FontSet, SharedFontCache};

/// Per-renderer options. Every field has a default, so a partial JSON object is enough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOpts {
    /// Output encoding.
    pub format: OutputFormat,
    /// Output canvas size policy.
    pub canvas_size: CanvasSize,
    /// Anti-aliased edges and bilinear resampling of rotated layers.
    pub antialias: bool,
    /// Draw text elements from glyphs; when `false` their pre-rendered image is used, if any.
    pub render_text: bool,
    /// Rasterize elements on the rayon thread pool. Compositing stays sequential.
    pub parallel: bool,
    /// Font fallback chain, evaluated in order.
    pub font_fallback: Vec<FallbackStep>,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            canvas_size: CanvasSize::Native,
            antialias: true,
            render_text: true,
            parallel: false,
            font_fallback: FallbackStep::default_chain(),
        }
    }
}

impl RenderOpts {
    /// Parse options from a JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> CrResult<Self> {
        Ok(serde_json::from_str(json).context("parse render options")?)
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the canvas size policy.
    pub fn with_canvas_size(mut self, canvas_size: CanvasSize) -> Self {
        self.canvas_size = canvas_size;
        self
    }

    /// Toggle anti-aliasing.
    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    /// Toggle glyph rendering of text elements.
    pub fn with_render_text(mut self, render_text: bool) -> Self {
        self.render_text = render_text;
        self
    }

    /// Toggle parallel rasterization.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Replace the font fallback chain.
    pub fn with_font_fallback(mut self, chain: Vec<FallbackStep>) -> Self {
        self.font_fallback = chain;
        self
    }
}

/// Non-fatal events of one render call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A text style was drawn with a face other than the requested one.
    FontFallback {
        /// Element that first requested the face.
        element: usize,
        /// Requested typography.
        requested: TypographyKey,
        /// Fallback step that produced the face.
        matched: FallbackStep,
        /// Family of the face actually used.
        resolved_family: String,
    },
    /// A text element was left out: glyph rendering is off and it has no image.
    TextSkipped {
        /// Element index.
        element: usize,
    },
}

/// Encoded image plus what happened while producing it.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    /// Encoded bytes in the configured format.
    pub bytes: Vec<u8>,
    /// Output canvas size.
    pub size: PixelSize,
    /// Non-fatal events, in the order they occurred.
    pub diagnostics: Vec<Diagnostic>,
}

/// Renders records of one schema revision.
///
/// A renderer holds no mutable state; it is `Send + Sync` and may be shared between threads.
#[derive(Clone, Debug)]
pub struct Renderer {
    descriptor: SchemaDescriptor,
    fonts: Option<FontLibrary>,
    opts: RenderOpts,
    font_cache: Option<Arc<SharedFontCache>>,
}

impl Renderer {
    /// Renderer for `descriptor`.
    ///
    /// Schema v5 names fonts per element and requires a font library. Schema v4 has no font
    /// resource; a library passed for it is ignored.
    pub fn new(descriptor: SchemaDescriptor, fonts: Option<FontLibrary>) -> CrResult<Self> {
        let fonts = match (descriptor.revision, fonts) {
            (SchemaRevision::V5, None) => {
                return Err(CrError::schema(
                    "font_resource",
                    "schema v5 requires a font library",
                ));
            }
            (SchemaRevision::V4, Some(_)) => {
                tracing::warn!("font library ignored for schema v4 records");
                None
            }
            (_, fonts) => fonts,
        };
        Ok(Self {
            descriptor,
            fonts,
            opts: RenderOpts::default(),
            font_cache: None,
        })
    }

    /// Replace the options.
    pub fn with_opts(mut self, opts: RenderOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Resolve fonts through a cache shared with other renderers using the same library and
    /// fallback chain.
    pub fn with_font_cache(mut self, cache: Arc<SharedFontCache>) -> Self {
        self.font_cache = Some(cache);
        self
    }

    /// Current options.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Schema descriptor of the records this renderer accepts.
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Render a record to encoded bytes.
    pub fn render(&self, record: &Record) -> CrResult<Vec<u8>> {
        self.render_report(record).map(|report| report.bytes)
    }

    /// Render a record and report the canvas size and diagnostics alongside the bytes.
    pub fn render_report(&self, record: &Record) -> CrResult<RenderReport> {
        let (canvas, diagnostics) = self.render_with_diagnostics(record)?;
        let bytes = encode_canvas(&canvas, self.opts.format)?;
        Ok(RenderReport {
            bytes,
            size: canvas.size,
            diagnostics,
        })
    }

    /// Render a record to the composited canvas, before encoding.
    pub fn render_canvas(&self, record: &Record) -> CrResult<Canvas> {
        self.render_with_diagnostics(record).map(|(canvas, _)| canvas)
    }

    /// Adapt a record and resolve its units, without drawing anything.
    pub fn normalize(&self, record: &Record) -> CrResult<Document> {
        resolve_units(adapt(&self.descriptor, record)?, self.opts.canvas_size)
    }

    #[tracing::instrument(
        name = "render",
        skip_all,
        fields(revision = ?self.descriptor.revision, elements = tracing::field::Empty)
    )]
    fn render_with_diagnostics(&self, record: &Record) -> CrResult<(Canvas, Vec<Diagnostic>)> {
        let doc = self.normalize(record)?;
        tracing::Span::current().record("elements", doc.elements.len());

        let mut diagnostics = Vec::new();
        let fonts = self.resolve_fonts(&doc, &mut diagnostics)?;
        let ctx = RasterCtx {
            canvas: doc.canvas,
            content_scale: doc.content_scale,
            antialias: self.opts.antialias,
            render_text: self.opts.render_text,
            fonts: &fonts,
            assets: record,
        };

        let visible: Vec<&Element> = doc.elements.iter().filter(|e| e.is_drawn()).collect();
        let mut canvas = Canvas::new(doc.canvas, doc.background);
        if self.opts.parallel {
            let layers: Vec<CrResult<Option<Layer>>> = visible
                .par_iter()
                .map(|el| rasterize(el, &ctx, subpixel_offset(el)))
                .collect();
            // Errors surface in document order regardless of scheduling.
            for (el, layer) in visible.iter().zip(layers) {
                self.composite(&mut canvas, el, layer?, &mut diagnostics);
            }
        } else {
            for el in &visible {
                let layer = rasterize(el, &ctx, subpixel_offset(el))?;
                self.composite(&mut canvas, el, layer, &mut diagnostics);
            }
        }
        Ok((canvas, diagnostics))
    }

    fn resolve_fonts(
        &self,
        doc: &Document,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> CrResult<FontSet> {
        let mut set = FontSet::new()?;
        if !self.opts.render_text {
            return Ok(set);
        }
        let supplier = self.fonts.as_ref().map(|f| f as &dyn FontSupplier);
        let mut resolver = FontResolver::new(supplier, &self.opts.font_fallback);
        if let Some(cache) = &self.font_cache {
            resolver = resolver.with_cache(cache);
        }

        for el in doc.elements.iter().filter(|e| e.is_drawn()) {
            let ElementKind::Text(props) = &el.kind else {
                continue;
            };
            for key in style_keys(props) {
                if let Some(resolution) = set.resolve_into(&resolver, &key)?
                    && !resolution.is_exact()
                {
                    diagnostics.push(Diagnostic::FontFallback {
                        element: el.index,
                        requested: key,
                        matched: resolution.matched,
                        resolved_family: resolution.handle.family().to_owned(),
                    });
                }
            }
        }
        Ok(set)
    }

    fn composite(
        &self,
        canvas: &mut Canvas,
        el: &Element,
        layer: Option<Layer>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let Some(layer) = layer else {
            tracing::debug!(element = el.index, "text skipped");
            diagnostics.push(Diagnostic::TextSkipped { element: el.index });
            return;
        };
        tracing::debug!(
            element = el.index,
            kind = el.kind.name(),
            width = layer.width,
            height = layer.height,
            blend = ?el.blend,
            "composite"
        );
        let placement = Placement {
            geometry: el.geometry,
            opacity: el.opacity,
            blend: el.blend,
            antialias: self.opts.antialias,
        };
        composite_layer(canvas, &layer, &placement);
    }
}

/// Fractional part of an unrotated element's position, so its layer lands on whole pixels.
fn subpixel_offset(el: &Element) -> Vec2 {
    let g = &el.geometry;
    if g.rotation != 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(g.x - g.x.floor(), g.y - g.y.floor())
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
