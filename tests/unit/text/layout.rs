use super::*;
use crate::scene::model::TextSpan;
use crate::text::font::FontHandle;

const SIZE: f64 = 20.0;

fn props(content: &str) -> TextProps {
    TextProps::plain(
        content,
        TypographyKey::new("Anything", FontWeight::Regular, false),
        SIZE,
    )
}

fn fonts() -> FontSet {
    FontSet::new().unwrap()
}

fn advance(ch: char) -> f64 {
    let handle = FontHandle::bundled().unwrap();
    let scaled = handle.scaled(SIZE as f32).unwrap();
    f64::from(scaled.advance(scaled.glyph_id(ch)))
}

fn width_of(s: &str) -> f64 {
    s.chars().map(advance).sum()
}

fn lay(p: &TextProps, w: f64, h: f64) -> TextLayout {
    layout_text(p, Vec2::new(w, h), &fonts(), 0).unwrap()
}

#[test]
fn empty_content_produces_no_runs() {
    let layout = lay(&props(""), 100.0, 100.0);
    assert!(layout.lines.is_empty());
    assert!(layout.ink_bounds(1.0, -0.3).is_none());
}

#[test]
fn greedy_wrap_fills_lines_and_never_splits_words() {
    let fit = width_of("aaaa aaaa") + 0.5;
    let layout = lay(&props("aaaa aaaa aaaa"), fit, 200.0);
    let counts: Vec<usize> = layout.lines.iter().map(|l| l.glyphs.len()).collect();
    assert_eq!(counts, vec![9, 4]);

    let layout = lay(&props("abcdefgh ij"), 1.0, 200.0);
    let counts: Vec<usize> = layout.lines.iter().map(|l| l.glyphs.len()).collect();
    assert_eq!(counts, vec![8, 2]);
    assert!(layout.lines[0].width > 1.0);
}

#[test]
fn newlines_and_line_starts_force_breaks() {
    let layout = lay(&props("ab\n\ncd"), 1000.0, 200.0);
    assert_eq!(layout.lines.len(), 3);
    assert!(layout.lines[1].glyphs.is_empty());

    let mut p = props("hello world");
    p.line_starts = vec![0, 6];
    let layout = lay(&p, 1000.0, 200.0);
    let counts: Vec<usize> = layout.lines.iter().map(|l| l.glyphs.len()).collect();
    assert_eq!(counts, vec![5, 5]);
}

#[test]
fn baselines_follow_line_height() {
    let metrics = FontHandle::bundled().unwrap().metrics();
    let ascent = f64::from(metrics.ascent) * SIZE;
    let descent = f64::from(metrics.descent) * SIZE;
    let mut p = props("a\nb");
    p.line_height = 1.5;
    let layout = lay(&p, 100.0, 100.0);
    let half_leading = (1.5 * SIZE - (ascent - descent)) / 2.0;
    assert!((layout.lines[0].baseline - (half_leading + ascent)).abs() < 1e-9);
    assert!((layout.lines[1].baseline - layout.lines[0].baseline - 1.5 * SIZE).abs() < 1e-9);

    p.valign = VAlign::Bottom;
    let bottom = lay(&p, 100.0, 100.0);
    let shift = 100.0 - 2.0 * 1.5 * SIZE;
    assert!((bottom.lines[0].baseline - layout.lines[0].baseline - shift).abs() < 1e-9);
}

#[test]
fn horizontal_alignment_positions_lines() {
    let mut p = props("ab");
    p.align = HAlign::Right;
    let right = lay(&p, 100.0, 50.0);
    let run = &right.lines[0];
    assert!((run.x + run.width - 100.0).abs() < 1e-9);

    p.align = HAlign::Center;
    let center = lay(&p, 100.0, 50.0);
    assert!((center.lines[0].x - (100.0 - run.width) / 2.0).abs() < 1e-9);
}

#[test]
fn justify_stretches_all_but_the_paragraph_final_line() {
    let mut p = props("aa bb cc dd");
    p.align = HAlign::Justify;
    let wrap = width_of("aa bb cc") + 1.0;
    let layout = lay(&p, wrap, 100.0);
    assert_eq!(layout.lines.len(), 2);
    assert!((layout.lines[0].width - wrap).abs() < 1e-6);
    let last = &layout.lines[0].glyphs.last().unwrap();
    assert!((last.offset.x + f64::from(last.advance) - wrap).abs() < 1e-3);
    assert!(layout.lines[1].width < wrap);
}

#[test]
fn letter_spacing_sits_between_glyphs_only() {
    let mut p = props("ab");
    p.letter_spacing = 3.0;
    let layout = lay(&p, 1000.0, 100.0);
    let run = &layout.lines[0];
    assert!((run.width - (width_of("ab") + 3.0)).abs() < 1e-6);
    assert!((run.glyphs[1].offset.x - (advance('a') + 3.0)).abs() < 1e-6);
}

#[test]
fn capitalize_and_missing_glyphs() {
    let handle = FontHandle::bundled().unwrap();
    let scaled = handle.scaled(SIZE as f32).unwrap();
    let mut p = props("ab\u{10FFFD}");
    p.capitalize = true;
    let layout = lay(&p, 1000.0, 100.0);
    let ids: Vec<u32> = layout.lines[0].glyphs.iter().map(|g| g.glyph_id).collect();
    assert_eq!(ids, vec![scaled.glyph_id('A'), scaled.glyph_id('B'), 0]);
}

#[test]
fn spans_become_styles_with_bold_and_italic_keys() {
    let mut p = props("abc");
    p.spans = vec![TextSpan {
        range: 1..2,
        color: Rgba8::new(255, 0, 0, 255),
        bold: true,
        italic: true,
    }];
    let layout = lay(&p, 1000.0, 100.0);
    assert_eq!(layout.styles.len(), 2);
    assert_eq!(layout.styles[1].typography.weight, FontWeight::Bold);
    assert!(layout.styles[1].typography.italic);
    let styles: Vec<usize> = layout.lines[0].glyphs.iter().map(|g| g.style).collect();
    assert_eq!(styles, vec![0, 1, 0]);
    assert_eq!(style_keys(&p).len(), 2);
}

#[test]
fn non_positive_font_size_is_a_geometry_error() {
    let mut p = props("a");
    p.font_size = 0.0;
    let err = layout_text(&p, Vec2::new(10.0, 10.0), &fonts(), 3).unwrap_err();
    assert!(err.to_string().contains("element 3"));
}
