//! Record normalization: `StructuredRecord` → `NormalizedFeatureMap`.
//!
//! Every key produced here, at inference time and when fitting the encoder
//! from the reference dataset, goes through [`feature_key`] and
//! [`indicator_key`]. Keeping one construction path is what stops fit-time and
//! serve-time keys from drifting apart.

use crate::record::{
    CATEGORICAL_FIELDS, MULTI_SELECT_FIELDS, MultiSelectField, NONE_OPTION, NUMERIC_FIELDS,
    Selection, StructuredRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single normalized feature value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Category(String),
    Number(f64),
    Indicator(bool),
}

impl FeatureValue {
    /// Numeric contribution of this value to its encoder column.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Category(_) => 1.0,
            Self::Number(x) => *x,
            Self::Indicator(true) => 1.0,
            Self::Indicator(false) => 0.0,
        }
    }
}

/// Flat, key-ordered feature mapping for one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedFeatureMap(BTreeMap<String, FeatureValue>);

impl NormalizedFeatureMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FeatureValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Indicator keys of one multi-select field (`<field>_<option>`).
    pub fn field_keys<'a>(&'a self, field: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        let prefix = format!("{field}_");
        self.keys().filter(move |k| k.starts_with(&prefix))
    }
}

/// Convert a raw column or field name into feature-key form.
///
/// Lowercases and replaces every non-alphanumeric character with `_`, so
/// `"Vehicle Type"` becomes `vehicle_type`.
pub fn feature_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Key of the indicator for `option` in multi-select `field`.
pub fn indicator_key(field: &str, option: &str) -> String {
    feature_key(&format!("{field}_{option}"))
}

/// Normalize a record into its flat feature map.
///
/// Pure and deterministic. Does not validate: values outside an enumeration
/// pass through trimmed and are later dropped by the encoder if unseen.
pub fn normalize(record: &StructuredRecord) -> NormalizedFeatureMap {
    let mut map = NormalizedFeatureMap::new();

    for field in &CATEGORICAL_FIELDS {
        let raw = record.categorical(field.name).unwrap_or_default().trim();
        let value = if raw.is_empty() {
            NONE_OPTION.to_string()
        } else {
            field
                .canonical(raw)
                .map(str::to_string)
                .unwrap_or_else(|| raw.to_string())
        };
        map.insert(feature_key(field.name), FeatureValue::Category(value));
    }

    for field in &NUMERIC_FIELDS {
        let value = record.numeric(field.name).unwrap_or_default();
        map.insert(feature_key(field.name), FeatureValue::Number(value));
    }

    for field in &MULTI_SELECT_FIELDS {
        let empty = Selection::default();
        let selection = record.selection(field.name).unwrap_or(&empty);
        for (key, selected) in expand_selection(field, selection) {
            map.insert(key, FeatureValue::Indicator(selected));
        }
    }

    map
}

/// Expand a multi-select value into one `(key, selected)` pair per option.
///
/// Always yields exactly `field.options.len()` pairs. The `None` sentinel is
/// set only when no real option is selected; alongside real options it is
/// ignored.
pub fn expand_selection(field: &MultiSelectField, selection: &Selection) -> Vec<(String, bool)> {
    let chosen: Vec<&'static str> = selection
        .items()
        .iter()
        .filter_map(|item| field.canonical(item))
        .filter(|opt| *opt != NONE_OPTION)
        .collect();

    field
        .options
        .iter()
        .map(|option| {
            let selected = if *option == NONE_OPTION {
                chosen.is_empty()
            } else {
                chosen.contains(option)
            };
            (indicator_key(field.name, option), selected)
        })
        .collect()
}
