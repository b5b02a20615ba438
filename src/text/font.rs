use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skrifa::instance::{LocationRef, Size};
use skrifa::{FontRef, MetadataProvider};
use vello_cpu::peniko::{Blob, FontData};

use crate::foundation::error::{CrError, CrResult};
use crate::text::family::normalize_family;

/// DejaVu Sans, the fallback face that is always available.
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Family name of the bundled fallback face.
pub const BUNDLED_FAMILY: &str = "DejaVu Sans";

/// Font weight classes used by the dataset.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    /// 100.
    Thin,
    /// 200.
    ExtraLight,
    /// 300.
    Light,
    /// 400.
    #[default]
    Regular,
    /// 500.
    Medium,
    /// 600.
    SemiBold,
    /// 700.
    Bold,
    /// 800.
    ExtraBold,
    /// 900.
    Black,
}

impl FontWeight {
    /// All weights, lightest first.
    pub const ALL: [Self; 9] = [
        Self::Thin,
        Self::ExtraLight,
        Self::Light,
        Self::Regular,
        Self::Medium,
        Self::SemiBold,
        Self::Bold,
        Self::ExtraBold,
        Self::Black,
    ];

    /// CSS numeric weight.
    pub fn value(self) -> u16 {
        match self {
            Self::Thin => 100,
            Self::ExtraLight => 200,
            Self::Light => 300,
            Self::Regular => 400,
            Self::Medium => 500,
            Self::SemiBold => 600,
            Self::Bold => 700,
            Self::ExtraBold => 800,
            Self::Black => 900,
        }
    }

    /// Closest weight class for a numeric weight.
    pub fn from_value(v: f32) -> Self {
        let v = if v.is_finite() { v } else { 400.0 };
        Self::ALL
            .into_iter()
            .min_by(|a, b| {
                let da = (f32::from(a.value()) - v).abs();
                let db = (f32::from(b.value()) - v).abs();
                da.total_cmp(&db)
            })
            .unwrap_or_default()
    }

    /// Parse a dataset weight name (`"bold"`, `"semibold"`, `"extra-light"`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Some(match key.as_str() {
            "thin" | "hairline" => Self::Thin,
            "extralight" | "ultralight" => Self::ExtraLight,
            "light" => Self::Light,
            "regular" | "normal" | "book" => Self::Regular,
            "medium" => Self::Medium,
            "semibold" | "demibold" => Self::SemiBold,
            "bold" => Self::Bold,
            "extrabold" | "ultrabold" => Self::ExtraBold,
            "black" | "heavy" => Self::Black,
            _ => return None,
        })
    }
}

/// Typography request of a text run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypographyKey {
    /// Family name, normalized with [`normalize_family`].
    pub family: String,
    /// Weight class.
    pub weight: FontWeight,
    /// Italic flag.
    pub italic: bool,
}

impl TypographyKey {
    /// Build a key; the family name is normalized.
    pub fn new(family: &str, weight: FontWeight, italic: bool) -> Self {
        Self {
            family: normalize_family(family),
            weight,
            italic,
        }
    }

    /// Same family with a different weight/style.
    pub fn with_style(&self, weight: FontWeight, italic: bool) -> Self {
        Self {
            family: self.family.clone(),
            weight,
            italic,
        }
    }
}

/// One face supplied by a caller.
#[derive(Clone)]
pub struct FontFace {
    /// Weight class of the face.
    pub weight: FontWeight,
    /// Italic flag of the face.
    pub italic: bool,
    /// Font file bytes (TrueType/OpenType).
    pub data: Blob<u8>,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("weight", &self.weight)
            .field("italic", &self.italic)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Supplier of font byte blobs keyed by family/weight/style.
///
/// Implementations must be safe to read concurrently; the renderer never mutates them.
pub trait FontSupplier: Send + Sync + fmt::Debug {
    /// Faces registered under a normalized family name.
    fn family(&self, family: &str) -> Option<&[FontFace]>;
}

/// In-memory font resource for a render batch.
#[derive(Clone, Debug, Default)]
pub struct FontLibrary {
    families: BTreeMap<String, Vec<FontFace>>,
}

impl FontLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face; the family name is normalized.
    pub fn add_face(
        &mut self,
        family: &str,
        weight: FontWeight,
        italic: bool,
        bytes: impl Into<Vec<u8>>,
    ) -> &mut Self {
        let face = FontFace {
            weight,
            italic,
            data: Blob::from(bytes.into()),
        };
        self.families
            .entry(normalize_family(family))
            .or_default()
            .push(face);
        self
    }

    /// Builder variant of [`FontLibrary::add_face`].
    pub fn with_face(
        mut self,
        family: &str,
        weight: FontWeight,
        italic: bool,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.add_face(family, weight, italic, bytes);
        self
    }

    /// Register a face and read weight/italic from the font's own metadata.
    pub fn add_face_detect(&mut self, family: &str, bytes: impl Into<Vec<u8>>) -> CrResult<()> {
        let bytes = bytes.into();
        let font = FontRef::new(&bytes)
            .map_err(|e| CrError::font_load(family, format!("unreadable font: {e}")))?;
        let attrs = font.attributes();
        let weight = FontWeight::from_value(attrs.weight.value());
        let italic = !matches!(attrs.style, skrifa::attribute::Style::Normal);
        self.add_face(family, weight, italic, bytes);
        Ok(())
    }

    /// Number of registered families.
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Registered (normalized) family names.
    pub fn family_names(&self) -> impl Iterator<Item = &str> {
        self.families.keys().map(String::as_str)
    }
}

impl FontSupplier for FontLibrary {
    fn family(&self, family: &str) -> Option<&[FontFace]> {
        self.families.get(family).map(Vec::as_slice)
    }
}

/// Face-wide vertical metrics, in ems.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceMetrics {
    /// Design units per em.
    pub units_per_em: u16,
    /// Baseline to top of the alignment box (positive).
    pub ascent: f32,
    /// Baseline to bottom of the alignment box (negative below the baseline).
    pub descent: f32,
    /// Recommended extra line gap.
    pub leading: f32,
}

/// Resolved, parsed font usable for layout and rasterization.
#[derive(Clone)]
pub struct FontHandle {
    family: String,
    weight: FontWeight,
    italic: bool,
    font: FontData,
    metrics: FaceMetrics,
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("family", &self.family)
            .field("weight", &self.weight)
            .field("italic", &self.italic)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl FontHandle {
    /// Parse a face; fails with [`CrError::FontLoad`] when the blob is not a usable font.
    pub fn from_face(family: &str, face: &FontFace) -> CrResult<Self> {
        let font = FontRef::new(face.data.data())
            .map_err(|e| CrError::font_load(family, format!("unreadable font: {e}")))?;
        let m = font.metrics(Size::unscaled(), LocationRef::default());
        if m.units_per_em == 0 || m.glyph_count == 0 {
            return Err(CrError::font_load(
                family,
                "font has no glyphs or a zero units-per-em",
            ));
        }
        if font.charmap().map(' ').is_none() && font.charmap().map('A').is_none() {
            return Err(CrError::font_load(family, "font has no usable character map"));
        }
        let upem = f32::from(m.units_per_em);
        let metrics = FaceMetrics {
            units_per_em: m.units_per_em,
            ascent: m.ascent / upem,
            descent: m.descent / upem,
            leading: m.leading / upem,
        };
        Ok(Self {
            family: family.to_owned(),
            weight: face.weight,
            italic: face.italic,
            font: FontData::new(face.data.clone(), 0),
            metrics,
        })
    }

    /// The fallback face compiled into the crate.
    pub fn bundled() -> CrResult<Self> {
        Self::from_face(BUNDLED_FAMILY, &bundled_face())
    }

    /// Family the face was registered under.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Weight class of the face.
    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    /// Italic flag of the face.
    pub fn italic(&self) -> bool {
        self.italic
    }

    /// Face metrics in ems.
    pub fn metrics(&self) -> FaceMetrics {
        self.metrics
    }

    /// Font data for `vello_cpu` glyph runs.
    pub(crate) fn font_data(&self) -> &FontData {
        &self.font
    }

    /// Font file bytes.
    pub fn bytes(&self) -> &[u8] {
        self.font.data.data()
    }

    /// Parsed view of the face at a pixel size.
    pub(crate) fn scaled(&self, size_px: f32) -> CrResult<ScaledFont<'_>> {
        let font = FontRef::new(self.bytes())
            .map_err(|e| CrError::font_load(&self.family, format!("unreadable font: {e}")))?;
        let size = Size::new(size_px);
        Ok(ScaledFont {
            charmap: font.charmap(),
            glyphs: font.glyph_metrics(size, LocationRef::default()),
            size_px,
        })
    }
}

/// Character map and advances of a face at one size.
pub(crate) struct ScaledFont<'a> {
    charmap: skrifa::charmap::Charmap<'a>,
    glyphs: skrifa::metrics::GlyphMetrics<'a>,
    size_px: f32,
}

impl ScaledFont<'_> {
    /// Glyph id for a character, `0` (notdef) when the face lacks it.
    pub(crate) fn glyph_id(&self, ch: char) -> u32 {
        self.charmap.map(ch).map(|g| g.to_u32()).unwrap_or(0)
    }

    /// Horizontal advance of a glyph in pixels.
    pub(crate) fn advance(&self, glyph_id: u32) -> f32 {
        self.glyphs
            .advance_width(skrifa::GlyphId::new(glyph_id))
            .unwrap_or(self.size_px * 0.5)
    }
}

pub(crate) fn bundled_face() -> FontFace {
    FontFace {
        weight: FontWeight::Regular,
        italic: false,
        data: Blob::new(Arc::new(BUNDLED_FONT)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/font.rs"]
mod tests;
