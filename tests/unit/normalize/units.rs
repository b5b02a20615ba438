use super::*;
use crate::foundation::core::Rgba8;
use crate::scene::model::{
    BlendMode, Geometry, ImageProps, FitMode, ShapeKind, ShapeProps, TextProps,
};
use crate::text::font::{FontWeight, TypographyKey};

fn doc(width: u32, height: u32, elements: Vec<Element>) -> Document {
    Document {
        canvas: PixelSize { width, height },
        background: Rgba8::WHITE,
        elements,
        content_scale: Vec2::new(1.0, 1.0),
    }
}

fn element(index: usize, geometry: Geometry, kind: ElementKind) -> Element {
    Element {
        index,
        geometry,
        opacity: 1.0,
        blend: BlendMode::Normal,
        visible: true,
        kind,
    }
}

fn image() -> ElementKind {
    ElementKind::Image(ImageProps {
        asset: None,
        fit: FitMode::Stretch,
    })
}

fn fraction(x: f64, y: f64, w: f64, h: f64, rad: f64) -> Geometry {
    Geometry {
        x,
        y,
        width: w,
        height: h,
        rotation: rad,
        units: GeometryUnits::CanvasFraction,
        angle_unit: AngleUnit::Radians,
    }
}

#[test]
fn fractions_and_radians_become_pixels_and_degrees() {
    let d = doc(
        200,
        100,
        vec![element(0, fraction(0.25, 0.5, 0.5, 0.25, std::f64::consts::PI), image())],
    );
    let out = resolve_units(d, CanvasSize::Native).unwrap();
    let g = out.elements[0].geometry;
    assert_eq!((g.x, g.y, g.width, g.height), (50.0, 50.0, 100.0, 25.0));
    assert!((g.rotation - 180.0).abs() < 1e-9);
    assert_eq!(g.units, GeometryUnits::Pixels);
    assert_eq!(g.angle_unit, AngleUnit::Degrees);
    assert_eq!(out.canvas, PixelSize { width: 200, height: 100 });
    assert_eq!(out.content_scale, Vec2::new(1.0, 1.0));
}

#[test]
fn rotation_wraps_and_opacity_clamps() {
    let mut el = element(0, Geometry::pixels(-10.0, 500.0, 5.0, 5.0, -90.0), image());
    el.opacity = 1.7;
    let out = resolve_units(doc(100, 100, vec![el]), CanvasSize::Native).unwrap();
    let e = &out.elements[0];
    assert_eq!(e.geometry.rotation, 270.0);
    assert_eq!(e.opacity, 1.0);
    // Off-canvas placement is kept.
    assert_eq!(e.geometry.x, -10.0);
    assert_eq!(e.geometry.y, 500.0);

    assert_eq!(normalize_degrees(720.0), 0.0);
    assert_eq!(normalize_degrees(-1e-20), 0.0);
}

#[test]
fn max_side_scales_down_but_never_up() {
    let el = element(0, Geometry::pixels(100.0, 50.0, 400.0, 200.0, 0.0), image());
    let out = resolve_units(doc(800, 400, vec![el.clone()]), CanvasSize::MaxSide(360)).unwrap();
    assert_eq!(out.canvas, PixelSize { width: 360, height: 180 });
    assert_eq!(out.content_scale, Vec2::new(0.45, 0.45));
    let g = out.elements[0].geometry;
    assert!((g.x - 45.0).abs() < 1e-9);
    assert!((g.width - 180.0).abs() < 1e-9);

    let out = resolve_units(doc(100, 50, vec![el]), CanvasSize::MaxSide(360)).unwrap();
    assert_eq!(out.canvas, PixelSize { width: 100, height: 50 });
}

#[test]
fn thin_canvases_keep_one_pixel() {
    let (scale, size) =
        target_scale(PixelSize { width: 10_000, height: 2 }, CanvasSize::MaxSide(100)).unwrap();
    assert_eq!(size, PixelSize { width: 100, height: 1 });
    assert_eq!(scale.y, 0.5);
}

#[test]
fn exact_size_scales_per_axis() {
    let (scale, size) = target_scale(
        PixelSize { width: 100, height: 50 },
        CanvasSize::Exact { width: 50, height: 100 },
    )
    .unwrap();
    assert_eq!(size, PixelSize { width: 50, height: 100 });
    assert_eq!(scale, Vec2::new(0.5, 2.0));

    let err = target_scale(
        PixelSize { width: 10, height: 10 },
        CanvasSize::Exact { width: 20_000, height: 10 },
    )
    .unwrap_err();
    assert!(matches!(err, CrError::Geometry { .. }));
}

#[test]
fn rejects_degenerate_input() {
    let err = resolve_units(doc(0, 10, vec![]), CanvasSize::Native).unwrap_err();
    assert_eq!(err.field_path().unwrap(), &FieldPath::record("canvas_width"));

    let el = element(3, Geometry::pixels(f64::NAN, 0.0, 1.0, 1.0, 0.0), image());
    let err = resolve_units(doc(10, 10, vec![el]), CanvasSize::Native).unwrap_err();
    assert_eq!(err.field_path().unwrap(), &FieldPath::element(3, "left"));

    let el = element(1, Geometry::pixels(0.0, 0.0, 1.0, -1.0, 0.0), image());
    let err = resolve_units(doc(10, 10, vec![el]), CanvasSize::Native).unwrap_err();
    assert_eq!(err.field_path().unwrap(), &FieldPath::element(1, "height"));

    let text = TextProps::plain("x", TypographyKey::new("A", FontWeight::Regular, false), 0.0);
    let el = element(2, Geometry::pixels(0.0, 0.0, 1.0, 1.0, 0.0), ElementKind::Text(text));
    let err = resolve_units(doc(10, 10, vec![el]), CanvasSize::Native).unwrap_err();
    assert_eq!(err.field_path().unwrap(), &FieldPath::element(2, "font_size"));

    let shape = ShapeProps {
        kind: ShapeKind::Rect,
        fill: Rgba8::BLACK,
        stroke: Some(crate::scene::model::StrokeProps {
            color: Rgba8::BLACK,
            width: f64::INFINITY,
        }),
    };
    let el = element(0, Geometry::pixels(0.0, 0.0, 1.0, 1.0, 0.0), ElementKind::Shape(shape));
    assert!(resolve_units(doc(10, 10, vec![el]), CanvasSize::Native).is_err());
}
