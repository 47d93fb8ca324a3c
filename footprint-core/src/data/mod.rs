//! Reference data loading for encoder fitting.

pub mod reference;
pub mod source;

pub use reference::ReferenceDataset;
pub use source::{CsvSource, DataBatch, DataSource, DataSourceInfo};
