//! Data source abstraction for loading the reference dataset.

use crate::error::MlError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A batch of raw tabular rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Where a batch came from, for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceInfo {
    pub source_type: String,
    pub location: String,
    pub accessed_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for loading tabular data from a source.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Load every row from this source.
    async fn load(&self) -> Result<DataBatch, MlError>;

    /// Return metadata about this source.
    fn source_info(&self) -> DataSourceInfo;
}

/// CSV file data source.
///
/// Quote-aware: list-valued cells such as `"['Paper', 'Plastic']"` contain
/// the delimiter and must not be split.
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: char,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: ',',
        }
    }
}

#[async_trait]
impl DataSource for CsvSource {
    async fn load(&self) -> Result<DataBatch, MlError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MlError::DatasetNotFound(self.path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = parse_csv(&content, self.delimiter).into_iter();
        let columns = records
            .next()
            .ok_or_else(|| MlError::dataset("Empty CSV file"))?
            .into_iter()
            .map(|c| c.trim().trim_start_matches('\u{feff}').to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for (index, row) in records.enumerate() {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            if row.len() != columns.len() {
                return Err(MlError::dataset(format!(
                    "row {} has {} cells, header has {}",
                    index + 2,
                    row.len(),
                    columns.len()
                )));
            }
            rows.push(row);
        }

        Ok(DataBatch { columns, rows })
    }

    fn source_info(&self) -> DataSourceInfo {
        DataSourceInfo {
            source_type: "csv".to_string(),
            location: self.path.display().to_string(),
            accessed_at: chrono::Utc::now(),
        }
    }
}

/// Split CSV text into records of cells.
///
/// Handles quoted cells, doubled quotes inside them, and both `\n` and
/// `\r\n` line endings. Newlines inside quotes are kept as cell content.
pub fn parse_csv(content: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut cell));
                records.push(std::mem::take(&mut record));
            }
            c if c == delimiter => record.push(std::mem::take(&mut cell)),
            c => cell.push(c),
        }
    }

    if !cell.is_empty() || !record.is_empty() {
        record.push(cell);
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_csv_quoted_lists() {
        let text = "a,b,c\nx,\"['Paper', 'Plastic']\",3\r\ny,\"[]\",4\n";
        let records = parse_csv(text, ',');
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], vec!["x", "['Paper', 'Plastic']", "3"]);
        assert_eq!(records[2], vec!["y", "[]", "4"]);
    }

    #[test]
    fn test_parse_csv_escaped_quotes_and_no_trailing_newline() {
        let records = parse_csv("name\n\"say \"\"hi\"\"\"", ',');
        assert_eq!(records, vec![vec!["name"], vec!["say \"hi\""]]);
    }

    #[test]
    fn test_parse_csv_empty_cells() {
        let records = parse_csv("a,b,c\n,,x\n", ',');
        assert_eq!(records[1], vec!["", "", "x"]);
    }

    #[tokio::test]
    async fn test_csv_source_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Body Type,Cooking").unwrap();
        writeln!(file, "normal,\"['Stove', 'Oven']\"").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "obese,\"['Grill']\"").unwrap();

        let source = CsvSource::new(file.path());
        let batch = source.load().await.unwrap();
        assert_eq!(batch.columns, vec!["Body Type", "Cooking"]);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[0][1], "['Stove', 'Oven']");
        assert_eq!(batch.rows[1][0], "obese");
    }

    #[tokio::test]
    async fn test_csv_source_missing_file() {
        let source = CsvSource::new("/nonexistent/reference.csv");
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, MlError::DatasetNotFound(_)));
    }

    #[tokio::test]
    async fn test_csv_source_ragged_row_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        writeln!(file, "1,2,3").unwrap();
        let err = CsvSource::new(file.path()).load().await.unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_source_info() {
        let info = CsvSource::new("data/reference.csv").source_info();
        assert_eq!(info.source_type, "csv");
        assert!(info.location.ends_with("reference.csv"));
    }
}
