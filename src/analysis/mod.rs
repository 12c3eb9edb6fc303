// src/analysis/mod.rs
//! Turning canonical tables into something a chart (or a model) can use.

pub mod classify;
pub mod compact;
pub mod date_parser;
pub mod numeric;

pub use classify::{classify, Classification, DatasetKind};
pub use compact::{compact, CompactRecord};
pub use date_parser::parse_fecha;
pub use numeric::parse_value;

use serde::Serialize;

use crate::junar::DataTable;

/// A table's chartability together with its compacted records.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub title: Option<String>,
    pub classification: Classification,
    pub records: Vec<CompactRecord>,
}

pub fn report(table: &DataTable) -> TableReport {
    TableReport {
        title: table.title.clone(),
        classification: classify(table),
        records: compact(&table.rows),
    }
}
