use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::foundation::core::{Rgba8, Vec2};
use crate::foundation::error::{CrError, CrResult};
use crate::scene::model::{
    BlendMode, Document, Element, ElementKind, FitMode, Geometry, ImageProps, ShapeKind,
    ShapeProps, StrokeProps,
};
use crate::schema::color::parse_color;
use crate::schema::record::{
    Columns, boolean, image_id, num, opt_string, opt_value, per_char, string,
};
use crate::schema::{TextInput, TypeClass, declared_canvas, parse_align, parse_valign};

/// Optional per-element columns; absent columns default every element.
struct Optional<'a> {
    angle: Option<&'a [Value]>,
    opacity: Option<&'a [Value]>,
    blend_mode: Option<&'a [Value]>,
    visible: Option<&'a [Value]>,
    fit: Option<&'a [Value]>,
    shape: Option<&'a [Value]>,
    fill_color: Option<&'a [Value]>,
    stroke_color: Option<&'a [Value]>,
    stroke_width: Option<&'a [Value]>,
    image: Option<&'a [Value]>,
}

pub(super) fn adapt(fields: &Map<String, Value>) -> CrResult<Document> {
    let cols = Columns::new(fields)?;
    let canvas = declared_canvas(&cols)?;
    let background = match cols.opt_scalar("background_color") {
        Some(v) => parse_color(v).map_err(|m| CrError::schema("background_color", m))?,
        None => Rgba8::WHITE,
    };

    let types = cols.column("type")?;
    let left = cols.column("left")?;
    let top = cols.column("top")?;
    let width = cols.column("width")?;
    let height = cols.column("height")?;
    let opt = Optional {
        angle: cols.opt_column("angle")?,
        opacity: cols.opt_column("opacity")?,
        blend_mode: cols.opt_column("blend_mode")?,
        visible: cols.opt_column("visible")?,
        fit: cols.opt_column("fit")?,
        shape: cols.opt_column("shape")?,
        fill_color: cols.opt_column("fill_color")?,
        stroke_color: cols.opt_column("stroke_color")?,
        stroke_width: cols.opt_column("stroke_width")?,
        image: cols.opt_column("image")?,
    };

    let mut elements = Vec::with_capacity(cols.length());
    for i in 0..cols.length() {
        let type_name = string(&types[i], i, "type")?;
        let geometry = Geometry::pixels(
            num(&left[i], i, "left")?,
            num(&top[i], i, "top")?,
            num(&width[i], i, "width")?,
            num(&height[i], i, "height")?,
            opt_value(opt.angle, i, "angle")?.unwrap_or(0.0),
        );
        let opacity = opt_value(opt.opacity, i, "opacity")?.unwrap_or(1.0);
        let blend = match opt.blend_mode.map(|c| &c[i]) {
            None | Some(Value::Null) => BlendMode::Normal,
            Some(v) => {
                let s = string(v, i, "blend_mode")?;
                BlendMode::parse(s).ok_or_else(|| {
                    CrError::schema_at(i, "blend_mode", format!("unknown blend mode \"{s}\""))
                })?
            }
        };
        let visible = match opt.visible.map(|c| &c[i]) {
            None | Some(Value::Null) => true,
            Some(v) => boolean(v, i, "visible")?,
        };

        let kind = match TypeClass::of(type_name) {
            TypeClass::Text => ElementKind::Text(text_input(&cols, &opt, i)?.into_props()),
            TypeClass::Shape => ElementKind::Shape(shape_props(&opt, i)?),
            TypeClass::ColoredBackground if has_value(opt.fill_color, i) => {
                ElementKind::Shape(ShapeProps {
                    kind: ShapeKind::Rect,
                    fill: color_at(opt.fill_color, i, "fill_color")?.unwrap_or(Rgba8::BLACK),
                    stroke: None,
                })
            }
            TypeClass::ColoredBackground | TypeClass::Image => {
                ElementKind::Image(image_props(&opt, i)?)
            }
        };

        elements.push(Element {
            index: i,
            geometry,
            opacity,
            blend,
            visible,
            kind,
        });
    }

    Ok(Document {
        canvas,
        background,
        elements,
        content_scale: Vec2::new(1.0, 1.0),
    })
}

fn has_value(column: Option<&[Value]>, i: usize) -> bool {
    column.is_some_and(|c| !c[i].is_null())
}

fn color_at(column: Option<&[Value]>, i: usize, field: &str) -> CrResult<Option<Rgba8>> {
    match column.map(|c| &c[i]) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => parse_color(v)
            .map(Some)
            .map_err(|m| CrError::schema_at(i, field, m)),
    }
}

fn image_props(opt: &Optional<'_>, i: usize) -> CrResult<ImageProps> {
    let fit = match opt.fit.map(|c| &c[i]) {
        None | Some(Value::Null) => FitMode::default(),
        Some(v) => {
            let s = string(v, i, "fit")?;
            FitMode::parse(s)
                .ok_or_else(|| CrError::schema_at(i, "fit", format!("unknown fit mode \"{s}\"")))?
        }
    };
    Ok(ImageProps {
        asset: image_id(opt.image, i)?,
        fit,
    })
}

fn shape_props(opt: &Optional<'_>, i: usize) -> CrResult<ShapeProps> {
    let kind = match opt.shape.map(|c| &c[i]) {
        None | Some(Value::Null) => ShapeKind::default(),
        Some(v) => {
            let s = string(v, i, "shape")?;
            ShapeKind::parse(s)
                .ok_or_else(|| CrError::schema_at(i, "shape", format!("unknown shape \"{s}\"")))?
        }
    };
    let fill = color_at(opt.fill_color, i, "fill_color")?.unwrap_or(Rgba8::BLACK);
    let stroke = match color_at(opt.stroke_color, i, "stroke_color")? {
        None => None,
        Some(color) => {
            let width = opt_value(opt.stroke_width, i, "stroke_width")?.unwrap_or(1.0);
            (width > 0.0).then_some(StrokeProps { color, width })
        }
    };
    Ok(ShapeProps { kind, fill, stroke })
}

fn text_input<'a>(cols: &Columns<'a>, opt: &Optional<'a>, i: usize) -> CrResult<TextInput<'a>> {
    let text = string(&cols.column("text")?[i], i, "text")?;
    let font = string(&cols.column("font")?[i], i, "font")?;
    let font_size = num(&cols.column("font_size")?[i], i, "font_size")?;
    let line_height = num(&cols.column("line_height")?[i], i, "line_height")?;

    let align = match cols.opt_column("text_align")? {
        Some(c) => parse_align(opt_string(&c[i], i, "text_align")?, i)?,
        None => parse_align(None, i)?,
    };
    let valign = match cols.opt_column("vertical_align")? {
        Some(c) => parse_valign(opt_string(&c[i], i, "vertical_align")?, i)?,
        None => parse_valign(None, i)?,
    };
    let capitalize = match cols.opt_column("capitalize")?.map(|c| &c[i]) {
        None | Some(Value::Null) => false,
        Some(v) => boolean(v, i, "capitalize")?,
    };
    let letter_spacing = opt_value(cols.opt_column("letter_spacing")?, i, "letter_spacing")?
        .unwrap_or(0.0);

    let char_colors = per_char(cols.opt_column("text_color")?, i, "text_color")?
        .iter()
        .map(|v| match v {
            Value::Null => Ok(None),
            v => parse_color(v)
                .map(Some)
                .map_err(|m| CrError::schema_at(i, "text_color", m)),
        })
        .collect::<CrResult<Vec<_>>>()?;
    let char_bold = per_char(cols.opt_column("font_bold")?, i, "font_bold")?
        .iter()
        .map(|v| boolean(v, i, "font_bold"))
        .collect::<CrResult<Vec<_>>>()?;
    let char_italic = per_char(cols.opt_column("font_italic")?, i, "font_italic")?
        .iter()
        .map(|v| boolean(v, i, "font_italic"))
        .collect::<CrResult<Vec<_>>>()?;
    let char_lines = per_char(cols.opt_column("text_line")?, i, "text_line")?
        .iter()
        .map(|v| num(v, i, "text_line").map(|x| x as i64))
        .collect::<CrResult<Vec<_>>>()?;

    let color = char_colors
        .first()
        .copied()
        .flatten()
        .unwrap_or(Rgba8::BLACK);

    Ok(TextInput {
        text: Cow::Borrowed(text),
        font,
        font_size,
        line_height,
        align,
        valign,
        capitalize,
        letter_spacing,
        color,
        char_colors,
        char_bold,
        char_italic,
        char_lines,
        image: image_id(opt.image, i)?,
    })
}
