use std::fmt;

/// Convenience result type used across the renderer.
pub type CrResult<T> = Result<T, CrError>;

/// Location of an offending value inside a record or document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath {
    /// Element index (document order) when the field is per-element.
    pub element: Option<usize>,
    /// Field name as declared by the record schema.
    pub field: String,
}

impl FieldPath {
    /// Path to a record-level field.
    pub fn record(field: impl Into<String>) -> Self {
        Self {
            element: None,
            field: field.into(),
        }
    }

    /// Path to a per-element field.
    pub fn element(element: usize, field: impl Into<String>) -> Self {
        Self {
            element: Some(element),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.element {
            Some(i) => write!(f, "element {i}, field `{}`", self.field),
            None => write!(f, "field `{}`", self.field),
        }
    }
}

/// Error taxonomy of the rendering pipeline.
#[derive(thiserror::Error, Debug)]
pub enum CrError {
    /// Malformed or missing required record fields.
    #[error("schema error ({at}): {message}")]
    Schema {
        /// Offending field.
        at: FieldPath,
        /// Human readable reason.
        message: String,
    },

    /// Non-finite or degenerate geometry.
    #[error("geometry error ({at}): {message}")]
    Geometry {
        /// Offending field.
        at: FieldPath,
        /// Human readable reason.
        message: String,
    },

    /// Referenced image asset could not be resolved or decoded.
    #[error("asset error ({at}): {message}")]
    Asset {
        /// Offending field.
        at: FieldPath,
        /// Human readable reason.
        message: String,
    },

    /// A supplied font blob is structurally invalid.
    #[error("font load error (family `{family}`): {message}")]
    FontLoad {
        /// Family the blob was registered under.
        family: String,
        /// Human readable reason.
        message: String,
    },

    /// Final serialization failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CrError {
    /// Build a [`CrError::Schema`] for a record-level field.
    pub fn schema(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Schema {
            at: FieldPath::record(field),
            message: msg.into(),
        }
    }

    /// Build a [`CrError::Schema`] for a per-element field.
    pub fn schema_at(element: usize, field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Schema {
            at: FieldPath::element(element, field),
            message: msg.into(),
        }
    }

    /// Build a [`CrError::Geometry`] value.
    pub fn geometry(at: FieldPath, msg: impl Into<String>) -> Self {
        Self::Geometry {
            at,
            message: msg.into(),
        }
    }

    /// Build a [`CrError::Asset`] for an element.
    pub fn asset(element: usize, field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Asset {
            at: FieldPath::element(element, field),
            message: msg.into(),
        }
    }

    /// Build a [`CrError::FontLoad`] value.
    pub fn font_load(family: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::FontLoad {
            family: family.into(),
            message: msg.into(),
        }
    }

    /// Build a [`CrError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Location carried by the error, if any.
    pub fn field_path(&self) -> Option<&FieldPath> {
        match self {
            Self::Schema { at, .. } | Self::Geometry { at, .. } | Self::Asset { at, .. } => {
                Some(at)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
