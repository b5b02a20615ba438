use super::*;

#[test]
fn pixel_size_rejects_zero_sides() {
    assert!(PixelSize::new(0, 10).is_err());
    assert!(PixelSize::new(10, 0).is_err());
    let s = PixelSize::new(3, 2).unwrap();
    assert_eq!(s.rgba8_len(), 24);
}

#[test]
fn premultiply_rounds_to_nearest() {
    let p = Rgba8::new(255, 128, 0, 128).premultiply();
    assert_eq!(p.to_array(), [128, 64, 0, 128]);
    assert_eq!(Rgba8::WHITE.premultiply().to_array(), [255, 255, 255, 255]);
    assert_eq!(Rgba8::TRANSPARENT.premultiply(), Rgba8Premul::transparent());
}

#[test]
fn unit_channels_are_clamped() {
    let c = Rgba8::from_unit(1.5, -0.2, f64::NAN, 0.5);
    assert_eq!(c, Rgba8::new(255, 0, 0, 128));
}

#[test]
fn alpha_multiplier_is_clamped() {
    let c = Rgba8::new(10, 20, 30, 200);
    assert_eq!(c.with_alpha_mul(0.5).a, 100);
    assert_eq!(c.with_alpha_mul(2.0).a, 200);
    assert_eq!(c.with_alpha_mul(-1.0).a, 0);
}
