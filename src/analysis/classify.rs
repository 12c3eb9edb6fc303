// src/analysis/classify.rs
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use super::numeric::parse_value;
use crate::junar::DataTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Quantitative,
    Mixed,
    Qualitative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    #[serde(rename = "type")]
    pub kind: DatasetKind,
    pub chartable: bool,
    pub numeric_columns: BTreeSet<String>,
}

/// Decide whether a table can feed a chart.
///
/// A column is numeric as soon as one of its cells parses with
/// [`parse_value`]. No numeric column makes the table qualitative; numeric
/// columns covering at least half of the first row's columns make it
/// quantitative; anything in between is mixed.
pub fn classify(table: &DataTable) -> Classification {
    let mut numeric_columns = BTreeSet::new();
    for row in &table.rows {
        for (col, value) in row {
            if !numeric_columns.contains(col) && parse_value(value).is_some() {
                numeric_columns.insert(col.clone());
            }
        }
    }

    let total = table.rows.first().map_or(0, |r| r.len());
    let kind = if numeric_columns.is_empty() {
        DatasetKind::Qualitative
    } else if numeric_columns.len() * 2 >= total {
        DatasetKind::Quantitative
    } else {
        DatasetKind::Mixed
    };

    debug!(
        title = ?table.title,
        ?kind,
        numeric = numeric_columns.len(),
        columns = total,
        "classified table"
    );

    Classification {
        kind,
        chartable: kind != DatasetKind::Qualitative,
        numeric_columns,
    }
}
