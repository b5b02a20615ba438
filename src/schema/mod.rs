//! Record schema adapters.
//!
//! A [`SchemaDescriptor`] selects one of two pure mapping functions (v4 or v5 field layout) that
//! turn a columnar [`Record`] into a [`Document`]. Geometry is left in the record's own units;
//! the unit resolver converts it to canvas pixels.

pub(crate) mod color;
pub mod descriptor;
pub mod record;
mod v4;
mod v5;

use std::borrow::Cow;

use crate::foundation::core::{PixelSize, Rgba8};
use crate::foundation::error::{CrError, CrResult, FieldPath};
use crate::scene::model::{Document, HAlign, TextProps, TextSpan, VAlign};
use crate::text::family::{italic_from_name, weight_from_name};
use crate::text::font::{FontWeight, TypographyKey};
use record::Columns;

pub use descriptor::{SchemaDescriptor, SchemaRevision};
pub use record::Record;

/// Normalize a record into a [`Document`] according to the descriptor's revision.
///
/// Class-label integers are decoded first. Missing or wrongly typed required fields fail with
/// [`CrError::Schema`] naming the field and element.
#[tracing::instrument(skip_all, fields(revision = ?descriptor.revision))]
pub fn adapt(descriptor: &SchemaDescriptor, record: &Record) -> CrResult<Document> {
    let mut fields = record.fields().clone();
    descriptor.decode_class_labels(&mut fields)?;
    match descriptor.revision {
        SchemaRevision::V4 => v4::adapt(&fields),
        SchemaRevision::V5 => v5::adapt(&fields),
    }
}

/// Element variant selected by a record `type` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TypeClass {
    Text,
    Shape,
    ColoredBackground,
    Image,
}

impl TypeClass {
    /// Classify a v5 type name (`TextElement`, `ImageElement`, ...).
    fn of(type_name: &str) -> Self {
        match type_name {
            "TextElement" => Self::Text,
            "ShapeElement" => Self::Shape,
            "ColoredBackground" => Self::ColoredBackground,
            _ => Self::Image,
        }
    }
}

/// Text attributes of one element in revision-independent form.
struct TextInput<'a> {
    text: Cow<'a, str>,
    font: &'a str,
    font_size: f64,
    line_height: f64,
    align: HAlign,
    valign: VAlign,
    capitalize: bool,
    letter_spacing: f64,
    color: Rgba8,
    char_colors: Vec<Option<Rgba8>>,
    char_bold: Vec<bool>,
    char_italic: Vec<bool>,
    char_lines: Vec<i64>,
    image: Option<String>,
}

impl TextInput<'_> {
    fn into_props(self) -> TextProps {
        let content = htmlize::unescape(self.text.as_ref()).into_owned();
        let weight = weight_from_name(self.font).unwrap_or(FontWeight::Regular);
        let typography = TypographyKey::new(self.font, weight, italic_from_name(self.font));

        let chars: Vec<char> = content.chars().collect();
        let style_at = |i: usize| {
            let color = self
                .char_colors
                .get(i)
                .copied()
                .flatten()
                .unwrap_or(self.color);
            let bold = self.char_bold.get(i).copied().unwrap_or(false);
            let italic = self.char_italic.get(i).copied().unwrap_or(false);
            (color, bold, italic)
        };

        let mut spans: Vec<TextSpan> = Vec::new();
        for i in 0..chars.len() {
            let (color, bold, italic) = style_at(i);
            if color == self.color && !bold && !italic {
                continue;
            }
            match spans.last_mut() {
                Some(last)
                    if last.range.end == i
                        && last.color == color
                        && last.bold == bold
                        && last.italic == italic =>
                {
                    last.range.end = i + 1;
                }
                _ => spans.push(TextSpan {
                    range: i..i + 1,
                    color,
                    bold,
                    italic,
                }),
            }
        }

        // A line index change starts a new line, unless a newline already breaks there.
        let line_starts = (1..chars.len().min(self.char_lines.len()))
            .filter(|&i| {
                self.char_lines[i] != self.char_lines[i - 1]
                    && chars[i - 1] != '\n'
                    && chars[i] != '\n'
            })
            .collect();

        TextProps {
            content,
            typography,
            font_size: self.font_size,
            line_height: self.line_height,
            color: self.color,
            align: self.align,
            valign: self.valign,
            wrap_width: None,
            letter_spacing: self.letter_spacing,
            capitalize: self.capitalize,
            spans,
            line_starts,
            image: self.image,
        }
    }
}

/// Declared canvas size, truncated to whole pixels.
///
/// Zero sides pass through; the unit resolver rejects them when it divides by the canvas.
fn declared_canvas(cols: &Columns<'_>) -> CrResult<PixelSize> {
    let side = |name: &str| -> CrResult<u32> {
        let v = cols.scalar(name)?;
        if !v.is_finite() || v < 0.0 || v > f64::from(u32::MAX) {
            return Err(CrError::geometry(
                FieldPath::record(name),
                format!("expected a finite non-negative canvas size, got {v}"),
            ));
        }
        Ok(v.trunc() as u32)
    };
    Ok(PixelSize {
        width: side("canvas_width")?,
        height: side("canvas_height")?,
    })
}

fn parse_align(s: Option<&str>, element: usize) -> CrResult<HAlign> {
    match s.map(str::trim) {
        None | Some("") => Ok(HAlign::Left),
        Some(v) => HAlign::parse(v).ok_or_else(|| {
            CrError::schema_at(element, "text_align", format!("unknown alignment \"{v}\""))
        }),
    }
}

fn parse_valign(s: Option<&str>, element: usize) -> CrResult<VAlign> {
    match s.map(str::trim) {
        None | Some("") => Ok(VAlign::Top),
        Some(v) => VAlign::parse(v).ok_or_else(|| {
            CrError::schema_at(
                element,
                "vertical_align",
                format!("unknown vertical alignment \"{v}\""),
            )
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/mod.rs"]
mod tests;
