use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::foundation::error::{CrError, CrResult};

/// Dataset field layout revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaRevision {
    /// Fractional geometry, radians, lowerCamel type names.
    V4,
    /// Pixel geometry, degrees, per-character text styling.
    V5,
}

/// Revision tag plus the dataset's class-label tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Field layout.
    pub revision: SchemaRevision,
    /// `field -> label names`; integers in these fields are decoded to names before adaptation.
    #[serde(default)]
    pub class_labels: BTreeMap<String, Vec<String>>,
}

impl SchemaDescriptor {
    /// Descriptor without class labels.
    pub fn new(revision: SchemaRevision) -> Self {
        Self {
            revision,
            class_labels: BTreeMap::new(),
        }
    }

    /// Register the label names of a class-label field.
    pub fn with_class_labels(
        mut self,
        field: impl Into<String>,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.class_labels
            .insert(field.into(), names.into_iter().map(Into::into).collect());
        self
    }

    /// Build from a Hugging Face `Features` description.
    ///
    /// Every field whose feature (possibly nested in `Sequence`/list wrappers) is a `ClassLabel`
    /// contributes its `names`.
    pub fn from_features_json(revision: SchemaRevision, features: &Value) -> CrResult<Self> {
        let fields = features
            .as_object()
            .ok_or_else(|| CrError::schema("features", "expected a JSON object of features"))?;
        let mut out = Self::new(revision);
        for (field, feature) in fields {
            if let Some(names) = class_label_names(feature) {
                let names = names
                    .iter()
                    .map(|n| {
                        n.as_str().map(str::to_owned).ok_or_else(|| {
                            CrError::schema(field.as_str(), "class label names must be strings")
                        })
                    })
                    .collect::<CrResult<Vec<_>>>()?;
                out.class_labels.insert(field.clone(), names);
            }
        }
        Ok(out)
    }

    /// Replace class-label integers with their names, recursing into nested sequences.
    pub(crate) fn decode_class_labels(&self, fields: &mut Map<String, Value>) -> CrResult<()> {
        for (field, names) in &self.class_labels {
            if let Some(v) = fields.get_mut(field) {
                decode_value(v, names, field)?;
            }
        }
        Ok(())
    }
}

fn class_label_names(feature: &Value) -> Option<&Vec<Value>> {
    match feature {
        Value::Object(obj) => match obj.get("_type").and_then(Value::as_str) {
            Some("ClassLabel") => obj.get("names").and_then(Value::as_array),
            Some("Sequence") | Some("List") | Some("LargeList") => {
                obj.get("feature").and_then(class_label_names)
            }
            _ => None,
        },
        // `datasets` also serializes plain lists as `[feature]`.
        Value::Array(items) if items.len() == 1 => class_label_names(&items[0]),
        _ => None,
    }
}

fn decode_value(v: &mut Value, names: &[String], field: &str) -> CrResult<()> {
    match v {
        Value::Array(items) => items
            .iter_mut()
            .try_for_each(|item| decode_value(item, names, field)),
        Value::Number(n) => {
            let idx = n
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .filter(|&i| i < names.len())
                .ok_or_else(|| {
                    CrError::schema(
                        field,
                        format!("class label {n} out of range (0..{})", names.len()),
                    )
                })?;
            *v = Value::String(names[idx].clone());
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/descriptor.rs"]
mod tests;
