use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::foundation::core::{Rgba8, Vec2};
use crate::foundation::error::{CrError, CrResult};
use crate::scene::model::{
    AngleUnit, BlendMode, Document, Element, ElementKind, FitMode, Geometry, GeometryUnits,
    ImageProps,
};
use crate::schema::color::parse_color;
use crate::schema::record::{
    Columns, boolean, image_id, num, opt_string, opt_value, string,
};
use crate::schema::{TextInput, TypeClass, declared_canvas, parse_align, parse_valign};

pub(super) fn adapt(fields: &Map<String, Value>) -> CrResult<Document> {
    let cols = Columns::new(fields)?;
    let canvas = declared_canvas(&cols)?;

    let types = cols.column("type")?;
    let left = cols.column("left")?;
    let top = cols.column("top")?;
    let width = cols.column("width")?;
    let height = cols.column("height")?;
    let angle = cols.opt_column("angle")?;
    let opacity = cols.opt_column("opacity")?;
    let image = cols.opt_column("image")?;

    let mut elements = Vec::with_capacity(cols.length());
    for i in 0..cols.length() {
        let type_name = capitalize_first(string(&types[i], i, "type")?);
        let geometry = Geometry {
            x: num(&left[i], i, "left")?,
            y: num(&top[i], i, "top")?,
            width: num(&width[i], i, "width")?,
            height: num(&height[i], i, "height")?,
            rotation: opt_value(angle, i, "angle")?.unwrap_or(0.0),
            units: GeometryUnits::CanvasFraction,
            angle_unit: AngleUnit::Radians,
        };

        // v4 has no shape or fill columns, so backgrounds are always image assets.
        let kind = match TypeClass::of(&type_name) {
            TypeClass::Text => ElementKind::Text(text_input(&cols, i)?.into_props()),
            TypeClass::Shape | TypeClass::ColoredBackground | TypeClass::Image => {
                ElementKind::Image(ImageProps {
                    asset: image_id(image, i)?,
                    fit: FitMode::Stretch,
                })
            }
        };

        elements.push(Element {
            index: i,
            geometry,
            opacity: opt_value(opacity, i, "opacity")?.unwrap_or(1.0),
            blend: BlendMode::Normal,
            visible: true,
            kind,
        });
    }

    Ok(Document {
        canvas,
        background: Rgba8::WHITE,
        elements,
        content_scale: Vec2::new(1.0, 1.0),
    })
}

/// `"textElement"` becomes `"TextElement"`.
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collapse runs of newlines into a single line break.
fn collapse_newlines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '\n' && out.ends_with('\n') {
            continue;
        }
        out.push(ch);
    }
    out
}

fn text_input<'a>(cols: &Columns<'a>, i: usize) -> CrResult<TextInput<'a>> {
    let text = string(&cols.column("text")?[i], i, "text")?;
    let font = string(&cols.column("font")?[i], i, "font")?;
    let font_size = num(&cols.column("font_size")?[i], i, "font_size")?;
    let line_height = num(&cols.column("line_height")?[i], i, "line_height")?;

    let align = match cols.opt_column("text_align")? {
        Some(c) => parse_align(opt_string(&c[i], i, "text_align")?, i)?,
        None => parse_align(None, i)?,
    };
    let capitalize = match cols.opt_column("capitalize")?.map(|c| &c[i]) {
        None | Some(Value::Null) => false,
        Some(v) => boolean(v, i, "capitalize")?,
    };
    let letter_spacing =
        opt_value(cols.opt_column("letter_spacing")?, i, "letter_spacing")?.unwrap_or(0.0);

    // Text opacity comes from the element opacity, so the color itself stays opaque.
    let color = match cols.opt_column("color")?.map(|c| &c[i]) {
        None | Some(Value::Null) => Rgba8::BLACK,
        Some(v) => {
            let c = parse_color(v).map_err(|m| CrError::schema_at(i, "color", m))?;
            Rgba8 { a: 255, ..c }
        }
    };

    Ok(TextInput {
        text: Cow::Owned(collapse_newlines(text)),
        font,
        font_size,
        line_height,
        align,
        valign: parse_valign(None, i)?,
        capitalize,
        letter_spacing,
        color,
        char_colors: Vec::new(),
        char_bold: Vec::new(),
        char_italic: Vec::new(),
        char_lines: Vec::new(),
        image: image_id(cols.opt_column("image")?, i)?,
    })
}
