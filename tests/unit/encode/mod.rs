use super::*;
use crate::foundation::core::{PixelSize, Rgba8};

fn canvas() -> Canvas {
    let mut c = Canvas::new(PixelSize::new(3, 2).unwrap(), Rgba8::new(10, 20, 30, 255));
    c.rgba8_premul[4..8].copy_from_slice(&[200, 0, 0, 255]);
    c
}

#[test]
fn png_round_trips_exactly() {
    let c = canvas();
    let bytes = encode_canvas(&c, OutputFormat::Png).unwrap();
    let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (3, 2));
    assert_eq!(img.into_raw(), c.to_rgba8());
}

#[test]
fn png_keeps_alpha() {
    let c = Canvas::new(PixelSize::new(1, 1).unwrap(), Rgba8::new(255, 0, 0, 128));
    let bytes = encode_canvas(&c, OutputFormat::Png).unwrap();
    let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 128]);
}

#[test]
fn webp_is_lossless() {
    let c = canvas();
    let bytes = encode_canvas(&c, OutputFormat::WebP).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(img.into_raw(), c.to_rgba8());
}

#[test]
fn jpeg_is_opaque_rgb() {
    let c = Canvas::new(PixelSize::new(8, 8).unwrap(), Rgba8::TRANSPARENT);
    let bytes = encode_canvas(&c, OutputFormat::jpeg()).unwrap();
    assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    let img = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (8, 8));
    assert!(img.pixels().all(|p| p.0.iter().all(|&c| c >= 250)));
}

#[test]
fn flatten_composites_premultiplied_pixels_on_white() {
    assert_eq!(
        flatten_on_white(&[100, 0, 50, 128, 0, 0, 0, 0]),
        vec![227, 127, 177, 255, 255, 255]
    );
}

#[test]
fn corrupt_buffers_are_encode_errors() {
    let mut c = canvas();
    c.rgba8_premul.pop();
    let err = encode_canvas(&c, OutputFormat::Png).unwrap_err();
    assert!(matches!(err, CrError::Encode(_)));
    assert!(err.to_string().starts_with("encode error"));
}

#[test]
fn formats_deserialize_from_snake_case() {
    let f: OutputFormat = serde_json::from_str("\"webp\"").unwrap();
    assert_eq!(f, OutputFormat::WebP);
    let f: OutputFormat = serde_json::from_str(r#"{"jpeg":{"quality":75}}"#).unwrap();
    assert_eq!(f, OutputFormat::Jpeg { quality: 75 });
    assert_eq!(OutputFormat::default().extension(), "png");
}
