use super::*;

#[test]
fn blend_mode_parse_accepts_css_and_camel_case() {
    assert_eq!(BlendMode::parse("multiply"), Some(BlendMode::Multiply));
    assert_eq!(BlendMode::parse("color-dodge"), Some(BlendMode::ColorDodge));
    assert_eq!(BlendMode::parse("colorBurn"), Some(BlendMode::ColorBurn));
    assert_eq!(BlendMode::parse("SOFT_LIGHT"), Some(BlendMode::SoftLight));
    assert_eq!(BlendMode::parse("hue"), None);
    assert_eq!(BlendMode::default(), BlendMode::Normal);
}

#[test]
fn enum_parsers_cover_aliases() {
    assert_eq!(FitMode::parse("Cover"), Some(FitMode::Cover));
    assert_eq!(FitMode::parse("fill"), Some(FitMode::Stretch));
    assert_eq!(ShapeKind::parse("circle"), Some(ShapeKind::Ellipse));
    assert_eq!(HAlign::parse("justify"), Some(HAlign::Justify));
    assert_eq!(VAlign::parse("center"), Some(VAlign::Middle));
    assert_eq!(VAlign::parse("baseline"), None);
}

#[test]
fn element_kind_serializes_with_type_tag() {
    let kind = ElementKind::Shape(ShapeProps {
        kind: ShapeKind::Ellipse,
        fill: Rgba8::new(1, 2, 3, 4),
        stroke: None,
    });
    let v = serde_json::to_value(&kind).unwrap();
    assert_eq!(v["type"], "shape");
    assert_eq!(v["kind"], "ellipse");
    assert_eq!(kind.name(), "shape");
}

#[test]
fn hidden_or_transparent_elements_are_not_drawn() {
    let mut el = Element {
        index: 0,
        geometry: Geometry::pixels(0.0, 0.0, 4.0, 4.0, 0.0),
        opacity: 0.2,
        blend: BlendMode::Normal,
        visible: true,
        kind: ElementKind::Image(ImageProps {
            asset: None,
            fit: FitMode::Cover,
        }),
    };
    assert!(el.is_drawn());
    el.opacity = 0.0;
    assert!(!el.is_drawn());
    el.opacity = 1.0;
    el.visible = false;
    assert!(!el.is_drawn());
}
