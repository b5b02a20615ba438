use super::*;
use serde_json::json;

use crate::foundation::core::Rgba8;
use crate::scene::model::{BlendMode, Geometry};
use crate::text::font::BUNDLED_FAMILY;

fn v5_renderer() -> Renderer {
    Renderer::new(SchemaDescriptor::new(SchemaRevision::V5), Some(FontLibrary::new())).unwrap()
}

fn text_record(render_image: Option<&str>) -> Record {
    let mut fields = json!({
        "canvas_width": 40, "canvas_height": 20, "length": 2,
        "type": ["ColoredBackground", "TextElement"],
        "left": [0, 2], "top": [0, 2], "width": [40, 36], "height": [20, 16],
        "fill_color": ["#00ff00", null],
        "text": [null, "Hey"],
        "font": [null, "Lobster_Bold"],
        "font_size": [null, 12], "line_height": [null, 1.2],
    });
    if let Some(id) = render_image {
        fields["image"] = json!([null, id]);
    }
    Record::from_json(fields).unwrap()
}

#[test]
fn v5_needs_a_font_library() {
    let err = Renderer::new(SchemaDescriptor::new(SchemaRevision::V5), None).unwrap_err();
    assert!(matches!(err, CrError::Schema { .. }));
    assert_eq!(err.field_path().unwrap().field, "font_resource");

    let r = Renderer::new(SchemaDescriptor::new(SchemaRevision::V4), Some(FontLibrary::new()))
        .unwrap();
    assert!(r.fonts.is_none());
}

#[test]
fn opts_load_from_partial_json() {
    let opts = RenderOpts::from_json(
        r#"{"antialias": false, "canvas_size": {"max_side": 64}, "format": "webp"}"#,
    )
    .unwrap();
    assert!(!opts.antialias);
    assert!(opts.render_text);
    assert_eq!(opts.canvas_size, CanvasSize::MaxSide(64));
    assert_eq!(opts.format, OutputFormat::WebP);
    assert_eq!(opts.font_fallback, FallbackStep::default_chain());

    assert!(RenderOpts::from_json("[1, 2]").is_err());
    assert_eq!(RenderOpts::from_json("{}").unwrap(), RenderOpts::default());
}

#[test]
fn unrotated_elements_snap_to_the_pixel_grid() {
    let mut el = Element {
        index: 0,
        geometry: Geometry::pixels(10.25, -3.5, 4.0, 4.0, 0.0),
        opacity: 1.0,
        blend: BlendMode::Normal,
        visible: true,
        kind: ElementKind::Shape(crate::scene::model::ShapeProps {
            kind: crate::scene::model::ShapeKind::Rect,
            fill: Rgba8::BLACK,
            stroke: None,
        }),
    };
    assert_eq!(subpixel_offset(&el), Vec2::new(0.25, 0.5));
    el.geometry.rotation = 10.0;
    assert_eq!(subpixel_offset(&el), Vec2::ZERO);
}

#[test]
fn missing_faces_are_reported_as_fallbacks() {
    let report = v5_renderer().render_report(&text_record(None)).unwrap();
    assert_eq!(report.size, PixelSize::new(40, 20).unwrap());
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::FontFallback {
            element: 1,
            requested: TypographyKey::new("Lobster", crate::text::font::FontWeight::Bold, false),
            matched: FallbackStep::Bundled,
            resolved_family: BUNDLED_FAMILY.to_owned(),
        }]
    );
}

#[test]
fn disabled_text_uses_the_image_or_is_skipped() {
    let r = v5_renderer().with_opts(RenderOpts::default().with_render_text(false));
    let report = r.render_report(&text_record(None)).unwrap();
    assert_eq!(report.diagnostics, vec![Diagnostic::TextSkipped { element: 1 }]);
    let canvas = r.render_canvas(&text_record(None)).unwrap();
    assert!(canvas.rgba8_premul.chunks_exact(4).all(|p| p == [0, 255, 0, 255]));

    let blue = crate::assets::decode::RasterImage::solid(1, 1, [0, 0, 255, 255]).unwrap();
    let record = text_record(Some("txt")).with_asset("txt", blue);
    let canvas = r.render_canvas(&record).unwrap();
    assert_eq!(canvas.pixel(20, 10), Some([0, 0, 255, 255]));
    assert_eq!(canvas.pixel(0, 0), Some([0, 255, 0, 255]));
}

#[test]
fn parallel_rasterization_matches_sequential() {
    let record = text_record(None);
    let sequential = v5_renderer().render_canvas(&record).unwrap();
    let parallel = v5_renderer()
        .with_opts(RenderOpts::default().with_parallel(true))
        .render_canvas(&record)
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn shared_cache_is_populated() {
    let cache = Arc::new(SharedFontCache::new());
    let r = v5_renderer().with_font_cache(Arc::clone(&cache));
    r.render(&text_record(None)).unwrap();
    assert_eq!(cache.len(), 1);
    // A cached fallback is still reported.
    let report = r.render_report(&text_record(None)).unwrap();
    assert_eq!(report.diagnostics.len(), 1);
}
