//! Reference dataset: historical rows used to fit the encoder vocabulary.
//!
//! Rows are turned back into [`StructuredRecord`]s so the encoder is fit
//! through exactly the same normalizer that serves requests.

use crate::data::source::{DataBatch, DataSource};
use crate::error::MlError;
use crate::features::normalize::feature_key;
use crate::record::{FIELD_ORDER, NONE_OPTION, Selection, StructuredRecord, TARGET_COLUMN};

/// Parsed reference dataset.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataset {
    pub records: Vec<StructuredRecord>,
}

impl ReferenceDataset {
    /// Load and parse every row from `source`.
    pub async fn load(source: &dyn DataSource) -> Result<Self, MlError> {
        let batch = source.load().await?;
        let dataset = Self::from_batch(&batch)?;
        let info = source.source_info();
        tracing::info!(
            source = %info.location,
            rows = dataset.len(),
            "Loaded reference dataset"
        );
        Ok(dataset)
    }

    pub fn from_batch(batch: &DataBatch) -> Result<Self, MlError> {
        let columns = normalize_columns(&batch.columns);
        let index_of = |name: &str| columns.iter().position(|c| c == name);

        let mut field_index = Vec::with_capacity(FIELD_ORDER.len());
        let mut missing = Vec::new();
        for field in FIELD_ORDER {
            match index_of(field) {
                Some(i) => field_index.push(i),
                None => missing.push(field),
            }
        }
        if !missing.is_empty() {
            return Err(MlError::dataset(format!(
                "reference dataset is missing column(s): {}",
                missing.join(", ")
            )));
        }

        let mut dataset = Self::default();
        for (row_no, row) in batch.rows.iter().enumerate() {
            let cells: Vec<&str> = field_index.iter().map(|&i| row[i].as_str()).collect();
            let record = parse_row(&cells)
                .map_err(|e| MlError::dataset(format!("row {}: {}", row_no + 2, e)))?;
            dataset.records.push(record);
        }

        if dataset.records.is_empty() {
            return Err(MlError::dataset("reference dataset has no rows"));
        }
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Map raw header names onto feature keys.
///
/// Names are converted with [`feature_key`] first. Only when they fail to
/// resolve every feature, and the header has exactly the canonical column
/// count (features plus target), is it assigned positionally: the published
/// dataset uses long survey headers ("How Often Shower") that carry no key
/// information.
pub fn normalize_columns(raw: &[String]) -> Vec<String> {
    let named: Vec<String> = raw.iter().map(|c| feature_key(c)).collect();
    let resolves_all = FIELD_ORDER.iter().all(|f| named.iter().any(|c| c == f));
    if resolves_all || raw.len() != FIELD_ORDER.len() + 1 {
        return named;
    }
    FIELD_ORDER
        .iter()
        .map(|f| f.to_string())
        .chain(std::iter::once(TARGET_COLUMN.to_string()))
        .collect()
}

/// Build a record from cells laid out in [`FIELD_ORDER`].
fn parse_row(cells: &[&str]) -> Result<StructuredRecord, String> {
    let text = |pos: usize| {
        let value = cells[pos].trim();
        if value.is_empty() || value.eq_ignore_ascii_case("nan") {
            NONE_OPTION.to_string()
        } else {
            value.to_string()
        }
    };
    let number = |pos: usize| -> Result<f64, String> {
        let raw = cells[pos].trim();
        raw.parse::<f64>()
            .map_err(|_| format!("column '{}' has non-numeric value '{}'", FIELD_ORDER[pos], raw))
    };
    let selection = |pos: usize| {
        let raw = cells[pos].trim();
        if raw.eq_ignore_ascii_case("nan") {
            Selection::default()
        } else {
            Selection::Text(raw.to_string())
        }
    };

    Ok(StructuredRecord {
        body_type: text(0),
        sex: text(1),
        diet: text(2),
        shower: text(3),
        heating: text(4),
        transport: text(5),
        vehicle_type: text(6),
        social_activity: text(7),
        monthly_grocery_bill: number(8)?,
        flight: text(9),
        vehicle_distance: number(10)?,
        waste_bag_size: text(11),
        waste_weekly: number(12)?,
        tv_daily_hour: number(13)?,
        clothes_monthly: number(14)?,
        internet_daily: number(15)?,
        energy_efficiency: text(16),
        recycling: selection(17),
        cooking: selection(18),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(columns: &[&str], rows: &[&[&str]]) -> DataBatch {
        DataBatch {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    const SURVEY_HEADER: [&str; 20] = [
        "Body Type",
        "Sex",
        "Diet",
        "How Often Shower",
        "Heating Energy Source",
        "Transport",
        "Vehicle Type",
        "Social Activity",
        "Monthly Grocery Bill",
        "Frequency of Traveling by Air",
        "Vehicle Monthly Distance Km",
        "Waste Bag Size",
        "Waste Bag Weekly Count",
        "How Long TV PC Daily Hour",
        "How Many New Clothes Monthly",
        "How Long Internet Daily Hour",
        "Energy efficiency",
        "Recycling",
        "Cooking_With",
        "CarbonEmission",
    ];

    const ROW: [&str; 20] = [
        "overweight",
        "female",
        "pescatarian",
        "daily",
        "coal",
        "public",
        "",
        "often",
        "230",
        "frequently",
        "210",
        "large",
        "4",
        "7",
        "26",
        "1",
        "No",
        "['Metal']",
        "['Stove', 'Oven']",
        "2238",
    ];

    #[test]
    fn test_survey_header_assigned_positionally() {
        let dataset = ReferenceDataset::from_batch(&batch(&SURVEY_HEADER, &[&ROW])).unwrap();
        assert_eq!(dataset.len(), 1);
        let record = &dataset.records[0];
        assert_eq!(record.shower, "daily");
        assert_eq!(record.vehicle_type, "None");
        assert_eq!(record.waste_weekly, 4.0);
        assert_eq!(record.cooking.items(), vec!["Stove", "Oven"]);
    }

    #[test]
    fn test_named_header_in_any_order() {
        let mut header: Vec<String> = FIELD_ORDER.iter().map(|f| f.to_string()).collect();
        header.reverse();
        let mut row: Vec<&str> = ROW[..19].to_vec();
        row.reverse();
        let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
        let rows = [row.as_slice()];
        let dataset = ReferenceDataset::from_batch(&batch(&header_refs, &rows)).unwrap();
        assert_eq!(dataset.records[0].diet, "pescatarian");
    }

    #[test]
    fn test_named_canonical_width_header_not_positional() {
        let mut header: Vec<String> = FIELD_ORDER.iter().map(|f| f.to_string()).collect();
        header.swap(0, 1);
        header.push("carbon_emission".to_string());
        let mut row: Vec<&str> = ROW.to_vec();
        row.swap(0, 1);
        let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();

        let rows = [row.as_slice()];
        let dataset = ReferenceDataset::from_batch(&batch(&header_refs, &rows)).unwrap();
        let record = &dataset.records[0];
        assert_eq!(record.body_type, "overweight");
        assert_eq!(record.sex, "female");
        assert_eq!(record.cooking.items(), vec!["Stove", "Oven"]);
    }

    #[test]
    fn test_survey_header_mapping() {
        let header: Vec<String> = SURVEY_HEADER.iter().map(|h| h.to_string()).collect();
        let columns = normalize_columns(&header);
        assert_eq!(columns[3], "shower");
        assert_eq!(columns[19], "carbon_emission");
    }

    #[test]
    fn test_missing_columns_reported() {
        let header = batch(&["Body Type", "Sex"], &[&["normal", "male"]]);
        let err = ReferenceDataset::from_batch(&header).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("diet"));
        assert!(msg.contains("cooking"));
    }

    #[test]
    fn test_bad_number_names_row_and_column() {
        let mut row = ROW;
        row[8] = "lots";
        let err = ReferenceDataset::from_batch(&batch(&SURVEY_HEADER, &[&row])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 2"), "{msg}");
        assert!(msg.contains("monthly_grocery_bill"), "{msg}");
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(ReferenceDataset::from_batch(&batch(&SURVEY_HEADER, &[])).is_err());
    }
}
