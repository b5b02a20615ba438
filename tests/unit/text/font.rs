use super::*;

#[test]
fn weight_values_and_parsing() {
    assert_eq!(FontWeight::Thin.value(), 100);
    assert_eq!(FontWeight::Black.value(), 900);
    assert_eq!(FontWeight::from_value(420.0), FontWeight::Regular);
    assert_eq!(FontWeight::from_value(f32::NAN), FontWeight::Regular);
    assert_eq!(FontWeight::from_value(950.0), FontWeight::Black);
    assert_eq!(FontWeight::parse("Semi-Bold"), Some(FontWeight::SemiBold));
    assert_eq!(FontWeight::parse("heavy"), Some(FontWeight::Black));
    assert_eq!(FontWeight::parse("italic"), None);
}

#[test]
fn typography_key_normalizes_family() {
    let key = TypographyKey::new("open_sans", FontWeight::Bold, false);
    assert_eq!(key.family, "Open Sans");
    let italic = key.with_style(FontWeight::Regular, true);
    assert_eq!(italic.family, "Open Sans");
    assert!(italic.italic);
}

#[test]
fn bundled_font_parses_with_sane_metrics() {
    let handle = FontHandle::bundled().unwrap();
    let m = handle.metrics();
    assert!(m.units_per_em > 0);
    assert!(m.ascent > 0.0);
    assert!(m.descent < 0.0);
    assert_eq!(handle.family(), BUNDLED_FAMILY);
    assert_eq!(handle.weight(), FontWeight::Regular);
    assert!(!handle.italic());
}

#[test]
fn scaled_font_maps_characters_and_advances() {
    let handle = FontHandle::bundled().unwrap();
    let scaled = handle.scaled(100.0).unwrap();
    let a = scaled.glyph_id('A');
    assert_ne!(a, 0);
    assert_eq!(scaled.glyph_id('\u{10FFFD}'), 0);
    let adv = scaled.advance(a);
    assert!(adv > 10.0 && adv < 100.0, "advance {adv}");
}

#[test]
fn invalid_blob_is_a_font_load_error() {
    let face = FontFace {
        weight: FontWeight::Regular,
        italic: false,
        data: Blob::from(b"not a font".to_vec()),
    };
    let err = FontHandle::from_face("Broken", &face).unwrap_err();
    assert!(matches!(err, CrError::FontLoad { ref family, .. } if family == "Broken"));
    assert!(err.to_string().starts_with("font load error"));
}

#[test]
fn library_registers_faces_under_normalized_names() {
    let mut lib = FontLibrary::new();
    lib.add_face("roboto_bold", FontWeight::Bold, false, BUNDLED_FONT.to_vec());
    lib.add_face_detect("Roboto", BUNDLED_FONT.to_vec()).unwrap();
    assert_eq!(lib.family_count(), 1);
    let faces = lib.family("Roboto").unwrap();
    assert_eq!(faces.len(), 2);
    assert_eq!(faces[1].weight, FontWeight::Regular);
    assert!(!faces[1].italic);
    assert!(lib.add_face_detect("Bad", vec![0u8; 8]).is_err());
}
