use super::*;

#[test]
fn normalize_family_title_cases_and_drops_style_words() {
    assert_eq!(normalize_family("roboto_light"), "Roboto");
    assert_eq!(normalize_family("Open Sans Bold Italic"), "Open Sans");
    assert_eq!(normalize_family("montserrat"), "Montserrat");
    assert_eq!(normalize_family("Light"), "Light");
}

#[test]
fn normalize_family_applies_aliases_after_cleanup() {
    assert_eq!(normalize_family("v_t323"), "Vt323");
    assert_eq!(normalize_family("six"), "Six Caps");
    assert_eq!(normalize_family("Sunday"), "Montserrat");
    assert_eq!(normalize_family("Blogger Bold"), "Blogger Sans");
}

#[test]
fn style_suffixes_are_read_from_the_last_word() {
    assert_eq!(weight_from_name("Roboto_Light"), Some(FontWeight::Light));
    assert_eq!(weight_from_name("Roboto ExtraBold"), Some(FontWeight::ExtraBold));
    assert_eq!(weight_from_name("Bold"), None);
    assert_eq!(weight_from_name("Roboto"), None);
    assert!(italic_from_name("lora_italic"));
    assert!(!italic_from_name("Lora"));
}
