//! Greedy line breaking and glyph positioning for text elements.
//!
//! Everything here works in design pixels; the rasterizer scales the result to the output canvas
//! so that line breaks never depend on the output size.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::foundation::core::{Rgba8, Vec2};
use crate::foundation::error::{CrError, CrResult, FieldPath};
use crate::scene::model::{HAlign, TextProps, VAlign};
use crate::text::font::{FontWeight, TypographyKey};
use crate::text::resolve::FontSet;

const FIT_EPSILON: f64 = 1e-3;

/// Color and face of a group of characters.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Fill color.
    pub color: Rgba8,
    /// Face request.
    pub typography: TypographyKey,
}

/// One glyph placed on a line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionedGlyph {
    /// Glyph id in the style's face (`0` when the face lacks the character).
    pub glyph_id: u32,
    /// Font advance in design pixels.
    pub advance: f32,
    /// Pen position relative to the run origin.
    pub offset: Vec2,
    /// Index into [`TextLayout::styles`].
    pub style: usize,
}

/// Positioned glyphs of one visual line.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun {
    /// Glyphs in logical order.
    pub glyphs: Vec<PositionedGlyph>,
    /// Baseline y inside the element box.
    pub baseline: f64,
    /// Left edge of the line inside the element box.
    pub x: f64,
    /// Line width after alignment.
    pub width: f64,
}

/// Laid-out text element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLayout {
    /// Styles referenced by glyphs.
    pub styles: Vec<TextStyle>,
    /// One run per visual line, top to bottom.
    pub lines: Vec<GlyphRun>,
    /// Font size in design pixels.
    pub font_size: f64,
}

impl TextLayout {
    /// Union of the line boxes in element coordinates, `None` when there is nothing to draw.
    pub fn ink_bounds(&self, ascent: f64, descent: f64) -> Option<kurbo::Rect> {
        self.lines
            .iter()
            .filter(|l| !l.glyphs.is_empty())
            .map(|l| {
                kurbo::Rect::new(
                    l.x,
                    l.baseline - ascent * self.font_size,
                    l.x + l.width,
                    l.baseline - descent * self.font_size,
                )
            })
            .reduce(|a, b| a.union(b))
    }
}

#[derive(Clone, Copy, Debug)]
struct StyledChar {
    ch: char,
    style: usize,
    source: usize,
}

/// Split content into display characters and deduplicated styles.
///
/// Style `0` is always the element's base style.
fn styled_chars(props: &TextProps) -> (Vec<TextStyle>, Vec<StyledChar>) {
    let base = TextStyle {
        color: props.color,
        typography: props.typography.clone(),
    };
    let mut styles = vec![base];
    let mut chars = Vec::with_capacity(props.content.len());

    for (source, ch) in props.content.chars().enumerate() {
        if ch == '\r' {
            continue;
        }
        let span = props.spans.iter().find(|s| s.range.contains(&source));
        let style = match span {
            None => 0,
            Some(span) => {
                let weight = if span.bold {
                    props.typography.weight.max(FontWeight::Bold)
                } else {
                    props.typography.weight
                };
                let style = TextStyle {
                    color: span.color,
                    typography: props
                        .typography
                        .with_style(weight, props.typography.italic || span.italic),
                };
                match styles.iter().position(|s| *s == style) {
                    Some(i) => i,
                    None => {
                        styles.push(style);
                        styles.len() - 1
                    }
                }
            }
        };
        if props.capitalize {
            chars.extend(ch.to_uppercase().map(|ch| StyledChar { ch, style, source }));
        } else {
            chars.push(StyledChar { ch, style, source });
        }
    }
    (styles, chars)
}

/// Typography keys a text element needs, base style first.
pub fn style_keys(props: &TextProps) -> SmallVec<[TypographyKey; 4]> {
    let (styles, _) = styled_chars(props);
    let mut keys: SmallVec<[TypographyKey; 4]> = SmallVec::new();
    for s in styles {
        if !keys.contains(&s.typography) {
            keys.push(s.typography);
        }
    }
    keys
}

#[derive(Clone, Copy, Debug)]
struct Shaped {
    glyph_id: u32,
    advance: f32,
    style: usize,
    space: bool,
}

struct Line {
    glyphs: Vec<Shaped>,
    justify: bool,
}

/// Characters between two forced breaks.
#[derive(Default)]
struct Segment {
    glyphs: Vec<Shaped>,
    /// Opened by an explicit line start rather than a newline.
    soft_start: bool,
    /// Closed by an explicit line start; its last line is not the end of a paragraph.
    soft_end: bool,
}

/// Lay out a text element inside a box of `box_size` design pixels.
///
/// `element` is only used to locate errors.
pub fn layout_text(
    props: &TextProps,
    box_size: Vec2,
    fonts: &FontSet,
    element: usize,
) -> CrResult<TextLayout> {
    if !(props.font_size.is_finite() && props.font_size > 0.0) {
        return Err(CrError::geometry(
            FieldPath::element(element, "font_size"),
            format!("font size must be positive, got {}", props.font_size),
        ));
    }
    if !(props.line_height.is_finite() && props.line_height > 0.0) {
        return Err(CrError::geometry(
            FieldPath::element(element, "line_height"),
            format!("line height must be positive, got {}", props.line_height),
        ));
    }

    let (styles, chars) = styled_chars(props);
    let font_size = props.font_size;
    if chars.is_empty() {
        return Ok(TextLayout {
            styles,
            lines: Vec::new(),
            font_size,
        });
    }

    let scaled = styles
        .iter()
        .map(|s| fonts.get(&s.typography).scaled(font_size as f32))
        .collect::<CrResult<Vec<_>>>()?;

    let letter_spacing = if props.letter_spacing.is_finite() {
        props.letter_spacing
    } else {
        0.0
    };
    let wrap_width = props
        .wrap_width
        .filter(|w| w.is_finite())
        .unwrap_or(box_size.x);
    let line_starts: HashSet<usize> = props.line_starts.iter().copied().collect();

    let mut segments: Vec<Segment> = Vec::new();
    let mut current = Segment::default();
    let mut prev_source: Option<usize> = None;
    for c in &chars {
        if c.ch == '\n' {
            segments.push(std::mem::take(&mut current));
            prev_source = Some(c.source);
            continue;
        }
        let new_source = prev_source != Some(c.source);
        if new_source && line_starts.contains(&c.source) && !current.glyphs.is_empty() {
            current.soft_end = true;
            segments.push(std::mem::replace(
                &mut current,
                Segment {
                    soft_start: true,
                    ..Segment::default()
                },
            ));
        }
        prev_source = Some(c.source);
        let font = &scaled[c.style];
        let glyph_id = font.glyph_id(c.ch);
        current.glyphs.push(Shaped {
            glyph_id,
            advance: font.advance(glyph_id),
            style: c.style,
            space: c.ch.is_whitespace(),
        });
    }
    segments.push(current);

    let mut lines: Vec<Line> = Vec::new();
    for segment in segments {
        let start = lines.len();
        wrap_segment(&segment, wrap_width, letter_spacing, &mut lines);
        if lines.len() == start {
            lines.push(Line {
                glyphs: Vec::new(),
                justify: false,
            });
        }
        if let Some(last) = lines.last_mut() {
            last.justify = segment.soft_end;
        }
    }

    let metrics = fonts.get(&props.typography).metrics();
    let ascent = f64::from(metrics.ascent) * font_size;
    let descent = f64::from(metrics.descent) * font_size;
    let line_advance = props.line_height * font_size;
    let half_leading = (line_advance - (ascent - descent)) / 2.0;
    let block_height = line_advance * lines.len() as f64;
    let top = match props.valign {
        VAlign::Top => 0.0,
        VAlign::Middle => (box_size.y - block_height) / 2.0,
        VAlign::Bottom => box_size.y - block_height,
    };

    let runs = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let baseline = top + line_advance * i as f64 + half_leading + ascent;
            position_line(line, baseline, wrap_width, letter_spacing, props.align)
        })
        .collect();

    Ok(TextLayout {
        styles,
        lines: runs,
        font_size,
    })
}

/// Width of a glyph sequence with letter spacing between glyphs.
fn measure(glyphs: &[Shaped], letter_spacing: f64) -> f64 {
    if glyphs.is_empty() {
        return 0.0;
    }
    let advances: f64 = glyphs.iter().map(|g| f64::from(g.advance)).sum();
    advances + letter_spacing * (glyphs.len() - 1) as f64
}

/// Greedy word wrap. A word wider than `wrap_width` gets a line of its own and overflows.
fn wrap_segment(segment: &Segment, wrap_width: f64, letter_spacing: f64, out: &mut Vec<Line>) {
    let mut line: Vec<Shaped> = Vec::new();
    let mut line_width = 0.0;
    let mut wrapped = segment.soft_start;
    let mut pending: Vec<Shaped> = Vec::new();

    for token in segment.glyphs.chunk_by(|a, b| a.space == b.space) {
        if token[0].space {
            pending.extend_from_slice(token);
            continue;
        }
        if line.is_empty() {
            // Leading whitespace survives only at the start of a paragraph.
            if !wrapped {
                line.append(&mut pending);
            }
            pending.clear();
            line.extend_from_slice(token);
            line_width = measure(&line, letter_spacing);
            continue;
        }
        let extra = letter_spacing
            + measure(&pending, letter_spacing)
            + if pending.is_empty() { 0.0 } else { letter_spacing }
            + measure(token, letter_spacing);
        if line_width + extra <= wrap_width + FIT_EPSILON {
            line.append(&mut pending);
            line.extend_from_slice(token);
            line_width += extra;
        } else {
            out.push(Line {
                glyphs: std::mem::take(&mut line),
                justify: true,
            });
            wrapped = true;
            pending.clear();
            line.extend_from_slice(token);
            line_width = measure(&line, letter_spacing);
        }
    }
    if !line.is_empty() {
        out.push(Line {
            glyphs: line,
            justify: false,
        });
    }
}

fn position_line(
    line: Line,
    baseline: f64,
    wrap_width: f64,
    letter_spacing: f64,
    align: HAlign,
) -> GlyphRun {
    let natural = measure(&line.glyphs, letter_spacing);
    let slack = wrap_width - natural;

    // Gaps are whitespace runs that follow a visible glyph.
    let gaps = line
        .glyphs
        .chunk_by(|a, b| a.space == b.space)
        .skip_while(|t| t[0].space)
        .filter(|t| t[0].space)
        .count();

    let (x, gap_extra) = match align {
        HAlign::Left => (0.0, 0.0),
        HAlign::Center => (slack / 2.0, 0.0),
        HAlign::Right => (slack, 0.0),
        HAlign::Justify if line.justify && gaps > 0 && slack > 0.0 => (0.0, slack / gaps as f64),
        HAlign::Justify => (0.0, 0.0),
    };

    let mut glyphs = Vec::with_capacity(line.glyphs.len());
    let mut pen = 0.0;
    let mut seen_visible = false;
    let mut prev_space = false;
    for g in &line.glyphs {
        if g.space && !prev_space && seen_visible {
            pen += gap_extra;
        }
        seen_visible |= !g.space;
        prev_space = g.space;
        glyphs.push(PositionedGlyph {
            glyph_id: g.glyph_id,
            advance: g.advance,
            offset: Vec2::new(pen, 0.0),
            style: g.style,
        });
        pen += f64::from(g.advance) + letter_spacing;
    }

    GlyphRun {
        glyphs,
        baseline,
        x,
        width: natural + gap_extra * gaps as f64,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
