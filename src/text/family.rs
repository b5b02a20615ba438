//! Family-name normalization for dataset font references.

use crate::text::font::FontWeight;

/// Style words dropped from family names before lookup.
const STYLE_WORDS: &[&str] = &["Bold", "Regular", "Light", "Italic", "Medium"];

/// Dataset family names that ship under a different name in the font resource.
const FAMILY_ALIASES: &[(&str, &str)] = &[
    ("Arkana Script", "Arkana"),
    ("Blogger", "Blogger Sans"),
    ("Delius Swash", "Delius Swash Caps"),
    ("Elsie Swash", "Elsie Swash Caps"),
    ("Gluk Glametrix", "Gluk Foglihtenno06"),
    ("Gluk Znikomitno25", "Gluk Foglihtenno06"),
    ("Im Fell", "Im Fell Dw Pica Sc"),
    ("Medieval Sharp", "Medievalsharp"),
    ("Playlist Caps", "Playlist"),
    ("Rissa Typeface", "Rissatypeface"),
    ("Selima", "Selima Script"),
    ("Six", "Six Caps"),
    ("V T323", "Vt323"),
    // Families without a known face.
    ("Different Summer", "Montserrat"),
    ("Dukomdesign Constantine", "Montserrat"),
    ("Sunday", "Montserrat"),
];

/// Canonical lookup name for a dataset family reference.
///
/// `"roboto_light"` and `"Roboto Light"` both normalize to `"Roboto"`.
pub fn normalize_family(name: &str) -> String {
    let titled = title_case(&name.replace('_', " "));
    // The first word is the family itself, even when it reads like a style word.
    let joined = titled
        .split(' ')
        .filter(|w| !w.is_empty())
        .enumerate()
        .filter(|(i, w)| *i == 0 || !STYLE_WORDS.contains(w))
        .map(|(_, w)| w)
        .collect::<Vec<_>>()
        .join(" ");
    FAMILY_ALIASES
        .iter()
        .find(|(from, _)| *from == joined)
        .map(|(_, to)| (*to).to_owned())
        .unwrap_or(joined)
}

/// Weight encoded as the last word of a family reference (`"Roboto_Light"`).
pub fn weight_from_name(name: &str) -> Option<FontWeight> {
    let spaced = name.replace('_', " ");
    let words: Vec<&str> = spaced.split(' ').filter(|w| !w.is_empty()).collect();
    match words.as_slice() {
        [_, .., last] => FontWeight::parse(last),
        _ => None,
    }
}

/// Italic flag encoded as the last word of a family reference (`"Lora_Italic"`).
pub fn italic_from_name(name: &str) -> bool {
    name.replace('_', " ")
        .split(' ')
        .filter(|w| !w.is_empty())
        .next_back()
        .is_some_and(|w| w.eq_ignore_ascii_case("italic") || w.eq_ignore_ascii_case("bolditalic"))
}

/// Upper-case the first cased character of every word, lower-case the rest.
///
/// Digits and punctuation end a word, so `"vt323"` becomes `"Vt323"` and `"o'neil"` becomes
/// `"O'Neil"`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_cased {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(ch);
            prev_cased = false;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/text/family.rs"]
mod tests;
