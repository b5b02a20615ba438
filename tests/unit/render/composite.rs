use super::*;
use crate::foundation::core::{PixelSize, Rgba8};

fn layer(width: u32, height: u32, pixels: &[[u8; 4]]) -> Layer {
    Layer {
        origin: Vec2::ZERO,
        width,
        height,
        rgba8_premul: pixels.concat(),
    }
}

fn placement(x: f64, y: f64, w: f64, h: f64, rotation: f64) -> Placement {
    Placement {
        geometry: Geometry::pixels(x, y, w, h, rotation),
        opacity: 1.0,
        blend: BlendMode::Normal,
        antialias: false,
    }
}

fn canvas(w: u32, h: u32, bg: Rgba8) -> Canvas {
    Canvas::new(PixelSize::new(w, h).unwrap(), bg)
}

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

#[test]
fn normal_blend_is_source_over() {
    let mut c = canvas(1, 1, Rgba8::WHITE);
    composite_layer(&mut c, &layer(1, 1, &[[128, 0, 0, 128]]), &placement(0.0, 0.0, 1.0, 1.0, 0.0));
    assert_eq!(c.pixel(0, 0), Some([255, 127, 127, 255]));

    let mut c = canvas(1, 1, Rgba8::TRANSPARENT);
    let mut p = placement(0.0, 0.0, 1.0, 1.0, 0.0);
    p.opacity = 0.5;
    composite_layer(&mut c, &layer(1, 1, &[RED]), &p);
    assert_eq!(c.pixel(0, 0), Some([128, 0, 0, 128]));
}

#[test]
fn zero_opacity_leaves_the_canvas_untouched() {
    let mut c = canvas(2, 2, Rgba8::WHITE);
    let before = c.clone();
    let mut p = placement(0.0, 0.0, 2.0, 2.0, 30.0);
    p.opacity = 0.0;
    composite_layer(&mut c, &layer(2, 2, &[RED; 4]), &p);
    assert_eq!(c, before);
}

#[test]
fn offscreen_parts_are_clipped() {
    let pixels: Vec<[u8; 4]> = (0..9u8).map(|i| [i, i, i, 255]).collect();
    let mut c = canvas(2, 2, Rgba8::TRANSPARENT);
    composite_layer(&mut c, &layer(3, 3, &pixels), &placement(-1.0, -1.0, 3.0, 3.0, 0.0));
    assert_eq!(c.pixel(0, 0), Some([4, 4, 4, 255]));
    assert_eq!(c.pixel(1, 0), Some([5, 5, 5, 255]));
    assert_eq!(c.pixel(0, 1), Some([7, 7, 7, 255]));
    assert_eq!(c.pixel(1, 1), Some([8, 8, 8, 255]));

    let mut c = canvas(2, 2, Rgba8::TRANSPARENT);
    let before = c.clone();
    composite_layer(&mut c, &layer(3, 3, &pixels), &placement(5.0, 0.0, 3.0, 3.0, 0.0));
    assert_eq!(c, before);
}

#[test]
fn layer_origin_shifts_the_buffer() {
    let mut l = layer(1, 1, &[GREEN]);
    l.origin = Vec2::new(1.0, 0.0);
    let mut c = canvas(3, 1, Rgba8::TRANSPARENT);
    composite_layer(&mut c, &l, &placement(1.0, 0.0, 1.0, 1.0, 0.0));
    assert_eq!(c.pixel(1, 0), Some([0, 0, 0, 0]));
    assert_eq!(c.pixel(2, 0), Some(GREEN));
}

#[test]
fn multiply_darkens() {
    let mut c = canvas(1, 1, Rgba8::new(128, 128, 128, 255));
    let mut p = placement(0.0, 0.0, 1.0, 1.0, 0.0);
    p.blend = BlendMode::Multiply;
    composite_layer(&mut c, &layer(1, 1, &[RED]), &p);
    assert_eq!(c.pixel(0, 0), Some([128, 0, 0, 255]));
}

#[test]
fn blend_modes_over_transparent_match_normal() {
    for blend in [BlendMode::Screen, BlendMode::Difference, BlendMode::ColorBurn] {
        let mut c = canvas(1, 1, Rgba8::TRANSPARENT);
        let mut p = placement(0.0, 0.0, 1.0, 1.0, 0.0);
        p.blend = blend;
        composite_layer(&mut c, &layer(1, 1, &[[0, 100, 200, 200]]), &p);
        assert_eq!(c.pixel(0, 0), Some([0, 100, 200, 200]), "{blend:?}");
    }
}

#[test]
fn quarter_turn_rotates_clockwise() {
    let l = layer(2, 2, &[RED, GREEN, BLUE, WHITE]);
    for antialias in [false, true] {
        let mut c = canvas(2, 2, Rgba8::TRANSPARENT);
        let mut p = placement(0.0, 0.0, 2.0, 2.0, 90.0);
        p.antialias = antialias;
        composite_layer(&mut c, &l, &p);
        assert_eq!(c.pixel(0, 0), Some(BLUE));
        assert_eq!(c.pixel(1, 0), Some(RED));
        assert_eq!(c.pixel(1, 1), Some(GREEN));
        assert_eq!(c.pixel(0, 1), Some(WHITE));
    }
}

#[test]
fn whole_pixel_translations_take_the_aligned_path() {
    let l = layer(1, 1, &[RED]);
    let p = placement(3.0, 2.0, 1.0, 1.0, 0.0);
    assert_eq!(pixel_offset(p.transform(&l)), Some((3, 2)));
    let p = placement(0.5, 0.0, 1.0, 1.0, 0.0);
    assert_eq!(pixel_offset(p.transform(&l)), None);
    let p = placement(0.0, 0.0, 1.0, 1.0, 45.0);
    assert_eq!(pixel_offset(p.transform(&l)), None);
}
