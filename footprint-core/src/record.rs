//! The structured lifestyle record accepted by the service, its field tables,
//! and schema validation.
//!
//! The field tables here are the single source of truth for enumerations,
//! numeric bounds, and multi-select option universes. Both validation and
//! feature normalization read them, as does the reference dataset loader.

use crate::error::{FieldError, FieldErrorKind};
use serde::{Deserialize, Serialize, Serializer};

/// Sentinel multi-select option meaning "nothing selected".
pub const NONE_OPTION: &str = "None";

/// Name of the regression target column in the reference dataset.
pub const TARGET_COLUMN: &str = "carbon_emission";

/// Canonical feature column order, as the reference dataset lays it out.
pub const FIELD_ORDER: [&str; 19] = [
    "body_type",
    "sex",
    "diet",
    "shower",
    "heating",
    "transport",
    "vehicle_type",
    "social_activity",
    "monthly_grocery_bill",
    "flight",
    "vehicle_distance",
    "waste_bag_size",
    "waste_weekly",
    "tv_daily_hour",
    "clothes_monthly",
    "internet_daily",
    "energy_efficiency",
    "recycling",
    "cooking",
];

/// A categorical field and its enumeration.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoricalField {
    pub name: &'static str,
    pub options: &'static [&'static str],
}

impl CategoricalField {
    /// Canonical spelling of `raw`, matched case-insensitively after trimming.
    pub fn canonical(&self, raw: &str) -> Option<&'static str> {
        canonical_option(self.options, raw)
    }
}

/// A numeric field and its bounds.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NumericField {
    pub name: &'static str,
    pub min: f64,
    pub max: Option<f64>,
    pub integer: bool,
}

/// A multi-select field and its option universe.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MultiSelectField {
    pub name: &'static str,
    pub options: &'static [&'static str],
}

impl MultiSelectField {
    pub fn canonical(&self, raw: &str) -> Option<&'static str> {
        canonical_option(self.options, raw)
    }
}

fn canonical_option(options: &'static [&'static str], raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    options
        .iter()
        .copied()
        .find(|opt| opt.eq_ignore_ascii_case(raw))
}

pub const CATEGORICAL_FIELDS: [CategoricalField; 11] = [
    CategoricalField {
        name: "body_type",
        options: &["underweight", "normal", "overweight", "obese"],
    },
    CategoricalField {
        name: "sex",
        options: &["male", "female", "other"],
    },
    CategoricalField {
        name: "diet",
        options: &["vegan", "vegetarian", "pescatarian", "omnivore"],
    },
    CategoricalField {
        name: "shower",
        options: &["less frequently", "more frequently", "daily", "twice a day"],
    },
    CategoricalField {
        name: "heating",
        options: &[
            "coal",
            "natural gas",
            "gas",
            "wood",
            "electricity",
            "electric",
            "none",
        ],
    },
    CategoricalField {
        name: "transport",
        options: &["public", "walk/bicycle", "walking/bicycling", "private"],
    },
    CategoricalField {
        name: "vehicle_type",
        options: &[
            NONE_OPTION,
            "petrol",
            "diesel",
            "hybrid",
            "lpg",
            "electric",
            "gasoline",
        ],
    },
    CategoricalField {
        name: "social_activity",
        options: &["never", "sometimes", "often"],
    },
    CategoricalField {
        name: "flight",
        options: &[
            "never",
            "rarely",
            "occasionally",
            "frequently",
            "very frequently",
        ],
    },
    CategoricalField {
        name: "waste_bag_size",
        options: &["small", "medium", "large", "extra large"],
    },
    CategoricalField {
        name: "energy_efficiency",
        options: &["No", "Sometimes", "Yes"],
    },
];

pub const NUMERIC_FIELDS: [NumericField; 6] = [
    NumericField {
        name: "monthly_grocery_bill",
        min: 0.0,
        max: None,
        integer: false,
    },
    NumericField {
        name: "vehicle_distance",
        min: 0.0,
        max: None,
        integer: false,
    },
    NumericField {
        name: "waste_weekly",
        min: 0.0,
        max: None,
        integer: true,
    },
    NumericField {
        name: "tv_daily_hour",
        min: 0.0,
        max: Some(24.0),
        integer: false,
    },
    NumericField {
        name: "clothes_monthly",
        min: 0.0,
        max: None,
        integer: true,
    },
    NumericField {
        name: "internet_daily",
        min: 0.0,
        max: Some(24.0),
        integer: false,
    },
];

pub const MULTI_SELECT_FIELDS: [MultiSelectField; 2] = [
    MultiSelectField {
        name: "recycling",
        options: &["Metal", "Plastic", "Paper", "Glass", NONE_OPTION],
    },
    MultiSelectField {
        name: "cooking",
        options: &["Stove", "Oven", "Microwave", "Grill", "Airfryer", NONE_OPTION],
    },
];

/// Serializable view of all field tables, served to UI clients.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSchema {
    pub categorical: &'static [CategoricalField],
    pub numeric: &'static [NumericField],
    pub multi_select: &'static [MultiSelectField],
}

pub fn record_schema() -> RecordSchema {
    RecordSchema {
        categorical: &CATEGORICAL_FIELDS,
        numeric: &NUMERIC_FIELDS,
        multi_select: &MULTI_SELECT_FIELDS,
    }
}

/// A multi-select value as sent on the wire.
///
/// Clients may send a JSON array, or a single string in the dataset's list
/// notation (`"['Metal', 'Paper']"`) or comma form (`"Metal,Paper"`). The
/// original shape is kept so responses echo exactly what was submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    List(Vec<String>),
    Text(String),
}

impl Selection {
    /// Selected option strings, trimmed and unquoted, empties removed.
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::List(values) => values
                .iter()
                .map(|v| clean_item(v))
                .filter(|v| !v.is_empty())
                .collect(),
            Self::Text(text) => {
                let mut s = text.trim();
                if s.starts_with('[') && s.ends_with(']') && s.len() >= 2 {
                    s = &s[1..s.len() - 1];
                }
                s.split(',')
                    .map(clean_item)
                    .filter(|v| !v.is_empty())
                    .collect()
            }
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

fn clean_item(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '\'' || c == '"').trim().to_string()
}

/// Counts accept `2` and `2.0` alike; whole values are written back as integers.
fn serialize_count<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// One lifestyle record: the request payload of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub body_type: String,
    pub sex: String,
    pub diet: String,
    pub shower: String,
    pub heating: String,
    pub transport: String,
    pub vehicle_type: String,
    pub social_activity: String,
    pub monthly_grocery_bill: f64,
    pub flight: String,
    pub vehicle_distance: f64,
    pub waste_bag_size: String,
    #[serde(serialize_with = "serialize_count")]
    pub waste_weekly: f64,
    pub tv_daily_hour: f64,
    #[serde(serialize_with = "serialize_count")]
    pub clothes_monthly: f64,
    pub internet_daily: f64,
    pub energy_efficiency: String,
    pub recycling: Selection,
    pub cooking: Selection,
}

impl StructuredRecord {
    /// Value of a categorical field by name.
    pub fn categorical(&self, field: &str) -> Option<&str> {
        let value = match field {
            "body_type" => &self.body_type,
            "sex" => &self.sex,
            "diet" => &self.diet,
            "shower" => &self.shower,
            "heating" => &self.heating,
            "transport" => &self.transport,
            "vehicle_type" => &self.vehicle_type,
            "social_activity" => &self.social_activity,
            "flight" => &self.flight,
            "waste_bag_size" => &self.waste_bag_size,
            "energy_efficiency" => &self.energy_efficiency,
            _ => return None,
        };
        Some(value)
    }

    /// Value of a numeric field by name, widened to f64.
    pub fn numeric(&self, field: &str) -> Option<f64> {
        match field {
            "monthly_grocery_bill" => Some(self.monthly_grocery_bill),
            "vehicle_distance" => Some(self.vehicle_distance),
            "waste_weekly" => Some(self.waste_weekly),
            "tv_daily_hour" => Some(self.tv_daily_hour),
            "clothes_monthly" => Some(self.clothes_monthly),
            "internet_daily" => Some(self.internet_daily),
            _ => None,
        }
    }

    /// Value of a multi-select field by name.
    pub fn selection(&self, field: &str) -> Option<&Selection> {
        match field {
            "recycling" => Some(&self.recycling),
            "cooking" => Some(&self.cooking),
            _ => None,
        }
    }

    /// Check every field against its table entry.
    ///
    /// All violations are collected (not just the first), ordered by the
    /// canonical field order.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        for field in &CATEGORICAL_FIELDS {
            let value = self.categorical(field.name).unwrap_or_default();
            if field.canonical(value).is_none() {
                errors.push(FieldError::new(
                    field.name,
                    FieldErrorKind::Enum,
                    format!(
                        "value '{}' is not one of: {}",
                        value,
                        quoted_list(field.options)
                    ),
                ));
            }
        }

        for field in &NUMERIC_FIELDS {
            let value = self.numeric(field.name).unwrap_or_default();
            if !value.is_finite() {
                errors.push(FieldError::new(
                    field.name,
                    FieldErrorKind::NotFinite,
                    "value must be a finite number",
                ));
            } else if value < field.min {
                errors.push(FieldError::new(
                    field.name,
                    FieldErrorKind::Range,
                    format!("value {} must be greater than or equal to {}", value, field.min),
                ));
            } else if let Some(max) = field.max.filter(|max| value > *max) {
                errors.push(FieldError::new(
                    field.name,
                    FieldErrorKind::Range,
                    format!("value {} must be less than or equal to {}", value, max),
                ));
            } else if field.integer && value.fract() != 0.0 {
                errors.push(FieldError::new(
                    field.name,
                    FieldErrorKind::NotInteger,
                    format!("value {} must be a whole number", value),
                ));
            }
        }

        for field in &MULTI_SELECT_FIELDS {
            let items = self
                .selection(field.name)
                .map(Selection::items)
                .unwrap_or_default();
            let unknown: Vec<_> = items
                .iter()
                .filter(|item| field.canonical(item).is_none())
                .cloned()
                .collect();
            if !unknown.is_empty() {
                errors.push(FieldError::new(
                    field.name,
                    FieldErrorKind::Option,
                    format!(
                        "unknown option(s) {}; allowed: {}",
                        unknown
                            .iter()
                            .map(|u| format!("'{u}'"))
                            .collect::<Vec<_>>()
                            .join(", "),
                        quoted_list(field.options)
                    ),
                ));
            }
        }

        if errors.is_empty() {
            return Ok(());
        }
        errors.sort_by_key(|e| field_position(&e.field));
        Err(errors)
    }
}

/// Position of a field in [`FIELD_ORDER`]; unknown names sort last.
pub fn field_position(name: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|f| *f == name)
        .unwrap_or(FIELD_ORDER.len())
}

fn quoted_list(options: &[&str]) -> String {
    options
        .iter()
        .map(|o| format!("'{o}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
