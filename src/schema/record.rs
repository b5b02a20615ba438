use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::assets::decode::{RasterImage, decode_image};
use crate::foundation::error::{CrError, CrResult};

/// One dataset example: columnar fields plus the decoded image assets they reference.
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: Map<String, Value>,
    assets: HashMap<String, RasterImage>,
}

impl Record {
    /// Record over already-parsed fields.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            assets: HashMap::new(),
        }
    }

    /// Record from a JSON object.
    pub fn from_json(value: Value) -> CrResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(CrError::schema(
                "record",
                format!("expected a JSON object, got {}", json_kind(&other)),
            )),
        }
    }

    /// Builder variant of [`Record::insert_asset`].
    pub fn with_asset(mut self, id: impl Into<String>, image: RasterImage) -> Self {
        self.insert_asset(id, image);
        self
    }

    /// Register a decoded image under the id used in the `image` column.
    pub fn insert_asset(&mut self, id: impl Into<String>, image: RasterImage) {
        self.assets.insert(id.into(), image);
    }

    /// Decode encoded bytes with [`decode_image`] and register the result.
    pub fn insert_encoded_asset(&mut self, id: impl Into<String>, bytes: &[u8]) -> CrResult<()> {
        let image = decode_image(bytes)?;
        self.insert_asset(id, image);
        Ok(())
    }

    /// Decoded asset by id.
    pub fn asset(&self, id: &str) -> Option<&RasterImage> {
        self.assets.get(id)
    }

    /// Raw fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Mutable raw fields.
    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "an object",
    }
}

/// Typed, error-reporting view over columnar record fields.
pub(crate) struct Columns<'a> {
    fields: &'a Map<String, Value>,
    length: usize,
}

impl<'a> Columns<'a> {
    /// Reads `length` and prepares per-element access.
    pub(crate) fn new(fields: &'a Map<String, Value>) -> CrResult<Self> {
        let length = scalar_f64(fields, "length")?;
        if length < 0.0 || length.fract() != 0.0 || length > u32::MAX as f64 {
            return Err(CrError::schema(
                "length",
                format!("expected a non-negative integer, got {length}"),
            ));
        }
        Ok(Self {
            fields,
            length: length as usize,
        })
    }

    pub(crate) fn length(&self) -> usize {
        self.length
    }

    pub(crate) fn scalar(&self, name: &str) -> CrResult<f64> {
        scalar_f64(self.fields, name)
    }

    pub(crate) fn opt_scalar(&self, name: &str) -> Option<&'a Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Required per-element column.
    pub(crate) fn column(&self, name: &str) -> CrResult<&'a [Value]> {
        self.opt_column(name)?.ok_or_else(|| {
            CrError::schema(name, "missing required per-element field")
        })
    }

    /// Optional per-element column; `null` counts as absent.
    pub(crate) fn opt_column(&self, name: &str) -> CrResult<Option<&'a [Value]>> {
        let Some(v) = self.fields.get(name).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let items = v.as_array().ok_or_else(|| {
            CrError::schema(name, format!("expected a sequence, got {}", json_kind(v)))
        })?;
        if items.len() < self.length {
            return Err(CrError::schema(
                name,
                format!(
                    "sequence has {} entries, expected {}",
                    items.len(),
                    self.length
                ),
            ));
        }
        Ok(Some(items.as_slice()))
    }
}

fn scalar_f64(fields: &Map<String, Value>, name: &str) -> CrResult<f64> {
    let v = fields
        .get(name)
        .ok_or_else(|| CrError::schema(name, "missing required field"))?;
    number_value(v).ok_or_else(|| {
        CrError::schema(name, format!("expected a number, got {}", json_kind(v)))
    })
}

/// Numbers, and numeric strings as some dataset exports carry them.
fn number_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub(crate) fn num(v: &Value, element: usize, field: &str) -> CrResult<f64> {
    number_value(v).ok_or_else(|| {
        CrError::schema_at(
            element,
            field,
            format!("expected a number, got {}", json_kind(v)),
        )
    })
}

pub(crate) fn opt_num(v: &Value, element: usize, field: &str) -> CrResult<Option<f64>> {
    if v.is_null() {
        return Ok(None);
    }
    num(v, element, field).map(Some)
}

pub(crate) fn string<'v>(v: &'v Value, element: usize, field: &str) -> CrResult<&'v str> {
    v.as_str().ok_or_else(|| {
        CrError::schema_at(
            element,
            field,
            format!("expected a string, got {}", json_kind(v)),
        )
    })
}

pub(crate) fn opt_string<'v>(
    v: &'v Value,
    element: usize,
    field: &str,
) -> CrResult<Option<&'v str>> {
    if v.is_null() {
        return Ok(None);
    }
    string(v, element, field).map(Some)
}

/// Booleans, `"true"`/`"false"` strings and `0`/`1` numbers.
pub(crate) fn boolean(v: &Value, element: usize, field: &str) -> CrResult<bool> {
    let parsed = match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|x| x != 0.0),
        _ => None,
    };
    parsed.ok_or_else(|| {
        CrError::schema_at(
            element,
            field,
            format!("expected a boolean, got {}", json_kind(v)),
        )
    })
}

/// Optional numeric column value of element `i`.
pub(crate) fn opt_value(column: Option<&[Value]>, i: usize, field: &str) -> CrResult<Option<f64>> {
    match column {
        None => Ok(None),
        Some(c) => opt_num(&c[i], i, field),
    }
}

/// Asset id of element `i`; datasets store either strings or integer ids.
pub(crate) fn image_id(column: Option<&[Value]>, i: usize) -> CrResult<Option<String>> {
    match column.map(|c| &c[i]) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(CrError::schema_at(
            i,
            "image",
            format!("expected an asset id, got {}", json_kind(other)),
        )),
    }
}

/// Per-character sequence of element `i`; absent or `null` yields an empty slice.
pub(crate) fn per_char<'v>(
    column: Option<&'v [Value]>,
    element: usize,
    field: &str,
) -> CrResult<&'v [Value]> {
    match column.map(|c| &c[element]) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(CrError::schema_at(
            element,
            field,
            format!("expected a per-character sequence, got {}", json_kind(other)),
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/record.rs"]
mod tests;
