use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{PixelSize, Rgba8, Vec2};
use crate::text::font::TypographyKey;

/// Normalized in-memory representation of one design template record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Canvas size in pixels.
    pub canvas: PixelSize,
    /// Canvas background, straight alpha.
    pub background: Rgba8,
    /// Elements in z-order (index 0 is the bottom-most).
    pub elements: Vec<Element>,
    /// Ratio between canvas pixels and the record's declared design pixels.
    ///
    /// `(1, 1)` until the unit resolver picks a target canvas size.
    pub content_scale: Vec2,
}

/// How an element's position and size are expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryUnits {
    /// Absolute canvas pixels.
    #[default]
    Pixels,
    /// Fractions of the declared canvas width (x, width) and height (y, height).
    CanvasFraction,
}

/// Unit of [`Geometry::rotation`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    /// Degrees, clockwise on screen.
    #[default]
    Degrees,
    /// Radians, clockwise on screen.
    Radians,
}

/// Element placement before rotation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width of the element box.
    pub width: f64,
    /// Height of the element box.
    pub height: f64,
    /// Rotation about the box center.
    pub rotation: f64,
    /// Unit of `x`, `y`, `width`, `height`.
    pub units: GeometryUnits,
    /// Unit of `rotation`.
    pub angle_unit: AngleUnit,
}

impl Geometry {
    /// Pixel geometry with rotation in degrees.
    pub fn pixels(x: f64, y: f64, width: f64, height: f64, rotation_deg: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: rotation_deg,
            units: GeometryUnits::Pixels,
            angle_unit: AngleUnit::Degrees,
        }
    }
}

/// Separable blend modes applied when compositing an element onto the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// `s * d`.
    Multiply,
    /// `s + d - s * d`.
    Screen,
    /// Hard light with swapped operands.
    Overlay,
    /// `min(s, d)`.
    Darken,
    /// `max(s, d)`.
    Lighten,
    /// Brightens the backdrop to reflect the source.
    ColorDodge,
    /// Darkens the backdrop to reflect the source.
    ColorBurn,
    /// Multiply or screen depending on the source.
    HardLight,
    /// Soft version of hard light.
    SoftLight,
    /// `|d - s|`.
    Difference,
    /// `d + s - 2 * d * s`.
    Exclusion,
}

impl BlendMode {
    /// Parse a record value (`"multiply"`, `"color-dodge"`, `"colorDodge"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Some(match key.as_str() {
            "normal" | "sourceover" => Self::Normal,
            "multiply" => Self::Multiply,
            "screen" => Self::Screen,
            "overlay" => Self::Overlay,
            "darken" => Self::Darken,
            "lighten" => Self::Lighten,
            "colordodge" => Self::ColorDodge,
            "colorburn" => Self::ColorBurn,
            "hardlight" => Self::HardLight,
            "softlight" => Self::SoftLight,
            "difference" => Self::Difference,
            "exclusion" => Self::Exclusion,
            _ => return None,
        })
    }
}

/// One visual item of a [`Document`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Position of the element in the source record.
    pub index: usize,
    /// Placement of the element box.
    pub geometry: Geometry,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: f64,
    /// Blend mode used when compositing.
    pub blend: BlendMode,
    /// Invisible elements are neither rasterized nor composited.
    pub visible: bool,
    /// Variant payload.
    pub kind: ElementKind,
}

impl Element {
    /// Whether the element can change the canvas. Hidden and fully transparent elements are
    /// skipped before rasterization.
    pub fn is_drawn(&self) -> bool {
        self.visible && self.opacity > 0.0
    }
}

/// Variant-specific element payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    /// Raster image asset.
    Image(ImageProps),
    /// Geometric shape.
    Shape(ShapeProps),
    /// Text box.
    Text(TextProps),
}

impl ElementKind {
    /// Short variant name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Shape(_) => "shape",
            Self::Text(_) => "text",
        }
    }
}

/// How an image is fitted into its element box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Scale to fill the box and crop the overflow.
    Cover,
    /// Scale to fit inside the box, leaving transparent bars.
    Contain,
    /// Scale each axis independently.
    #[default]
    Stretch,
}

impl FitMode {
    /// Parse a record value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cover" => Some(Self::Cover),
            "contain" => Some(Self::Contain),
            "stretch" | "fill" => Some(Self::Stretch),
            _ => None,
        }
    }
}

/// Image element payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageProps {
    /// Asset id in the record's image table; `None` when the record has no image.
    pub asset: Option<String>,
    /// Fit policy.
    pub fit: FitMode,
}

/// Geometric shape kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Box-filling rectangle.
    #[default]
    Rect,
    /// Ellipse inscribed in the box.
    Ellipse,
    /// Horizontal segment through the box center.
    Line,
}

impl ShapeKind {
    /// Parse a record value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rect" | "rectangle" => Some(Self::Rect),
            "ellipse" | "circle" => Some(Self::Ellipse),
            "line" => Some(Self::Line),
            _ => None,
        }
    }
}

/// Shape element payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeProps {
    /// Shape kind.
    pub kind: ShapeKind,
    /// Fill color.
    pub fill: Rgba8,
    /// Optional outline.
    pub stroke: Option<StrokeProps>,
}

/// Outline of a shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeProps {
    /// Stroke color.
    pub color: Rgba8,
    /// Stroke width in design pixels.
    pub width: f64,
}

/// Horizontal placement of each line inside the text box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
    /// Stretch inter-word gaps on non-final lines.
    Justify,
}

impl HAlign {
    /// Parse a record value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "centre" | "middle" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "justify" | "justified" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// Vertical placement of the line block inside the text box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VAlign {
    /// Block starts at the box top.
    #[default]
    Top,
    /// Block is centered.
    Middle,
    /// Block ends at the box bottom.
    Bottom,
}

impl VAlign {
    /// Parse a record value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "middle" | "center" | "centre" => Some(Self::Middle),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Per-character style overrides; `range` is in `char` indices of [`TextProps::content`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Half-open character range.
    pub range: Range<usize>,
    /// Fill color.
    pub color: Rgba8,
    /// Use the bold face.
    pub bold: bool,
    /// Use the italic face.
    pub italic: bool,
}

/// Text element payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    /// Text content; `\n` forces a line break.
    pub content: String,
    /// Base typography.
    pub typography: TypographyKey,
    /// Font size in design pixels (the record's declared canvas pixels).
    pub font_size: f64,
    /// Line advance as a multiple of the font size.
    pub line_height: f64,
    /// Color of characters not covered by a span.
    pub color: Rgba8,
    /// Horizontal alignment.
    pub align: HAlign,
    /// Vertical alignment.
    pub valign: VAlign,
    /// Wrap width in design pixels; `None` wraps at the element width.
    pub wrap_width: Option<f64>,
    /// Extra advance after each glyph in design pixels.
    pub letter_spacing: f64,
    /// Render all characters upper-cased.
    pub capitalize: bool,
    /// Style runs, sorted and non-overlapping.
    pub spans: Vec<TextSpan>,
    /// Character indices that start a new visual line.
    pub line_starts: Vec<usize>,
    /// Pre-rendered image of the text, drawn instead when text rendering is disabled.
    #[serde(default)]
    pub image: Option<String>,
}

impl TextProps {
    /// Plain text with a single style.
    pub fn plain(content: impl Into<String>, typography: TypographyKey, font_size: f64) -> Self {
        Self {
            content: content.into(),
            typography,
            font_size,
            line_height: 1.2,
            color: Rgba8::BLACK,
            align: HAlign::Left,
            valign: VAlign::Top,
            wrap_width: None,
            letter_spacing: 0.0,
            capitalize: false,
            spans: Vec::new(),
            line_starts: Vec::new(),
            image: None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
