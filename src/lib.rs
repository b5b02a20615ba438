//! cr-render turns design-template dataset records into raster images.
//!
//! A record is a columnar description of one template: canvas size plus parallel per-element
//! arrays (type, geometry, colors, text styling, image references). Two field layouts are
//! supported, schema v4 and schema v5.
//!
//! # Pipeline overview
//!
//! 1. **Adapt**: `Record -> Document` through the revision's field mapping
//! 2. **Resolve units**: fractions, radians and the output size policy become canvas pixels
//! 3. **Resolve fonts**: every text style maps to a face through an explicit fallback chain
//! 4. **Rasterize**: each visible element is drawn into its own premultiplied [`Layer`]
//! 5. **Composite**: layers are placed, rotated and blended onto the [`Canvas`] in document order
//! 6. **Encode**: PNG (default), JPEG or WebP
//!
//! [`Renderer`] runs all six steps; every step is also exported on its own.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: the same record, fonts and options give the same bytes.
//! - **No IO**: fonts and images are handed in as bytes or decoded pixels.
//! - **Premultiplied RGBA8** between rasterization and encoding.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod encode;
mod foundation;
mod normalize;
mod render;
mod scene;
mod schema;
mod text;

pub use assets::decode::{MAX_IMAGE_DIM, RasterImage, decode_image};
pub use encode::{DEFAULT_JPEG_QUALITY, OutputFormat, encode_canvas};
pub use foundation::core::{Affine, PixelSize, Point, Rect, Rgba8, Rgba8Premul, Vec2};
pub use foundation::error::{CrError, CrResult, FieldPath};
pub use normalize::{CanvasSize, resolve_units};
pub use render::canvas::Canvas;
pub use render::composite::{Placement, composite_layer};
pub use render::pipeline::{Diagnostic, RenderOpts, RenderReport, Renderer};
pub use render::raster::{Layer, RasterCtx, rasterize};
pub use scene::model::{
    AngleUnit, BlendMode, Document, Element, ElementKind, FitMode, Geometry, GeometryUnits, HAlign,
    ImageProps, ShapeKind, ShapeProps, StrokeProps, TextProps, TextSpan, VAlign,
};
pub use schema::{Record, SchemaDescriptor, SchemaRevision, adapt};
pub use text::family::normalize_family;
pub use text::font::{
    BUNDLED_FAMILY, FaceMetrics, FontFace, FontHandle, FontLibrary, FontSupplier, FontWeight,
    TypographyKey,
};
pub use text::layout::{GlyphRun, PositionedGlyph, TextLayout, TextStyle, layout_text, style_keys};
pub use text::resolve::{FallbackStep, FontResolution, FontResolver, FontSet, SharedFontCache};
