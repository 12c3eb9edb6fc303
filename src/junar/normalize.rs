// src/junar/normalize.rs
use std::collections::HashSet;

use tracing::{debug, trace};

use super::{DataTable, RawCell, RawTableResponse, Row};

/// How the header/data split of a flattened `fArray` is recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The first `fCols` cells are the headers.
    Positional,
    /// Cells flagged with `fHeader: true` are the headers, wherever they sit.
    Flagged,
}

/// A payload follows the flagged convention as soon as one cell is flagged
/// as a header; `fHeader: false` everywhere carries no information.
pub fn detect_strategy(cells: &[RawCell]) -> Strategy {
    if cells.iter().any(|c| c.is_header == Some(true)) {
        Strategy::Flagged
    } else {
        Strategy::Positional
    }
}

/// Rebuild a [`DataTable`] from the flattened cell array.
///
/// - Empty or degenerate payloads (`fCols <= 0`, `fRows <= 0`, no cells)
///   yield a table with only title/description.
/// - Data cells are chunked by `fCols`; only the first `fRows` chunks are
///   kept, so a payload longer than its declared row count is truncated.
/// - Every row carries every header; absent trailing cells become `""`.
pub fn normalize(raw: RawTableResponse) -> DataTable {
    let RawTableResponse {
        title,
        description,
        result,
    } = raw;

    let Some(result) = result else {
        debug!(?title, "datastream has no result");
        return DataTable::empty(title, description);
    };

    if result.col_count <= 0 || result.row_count <= 0 || result.cells.is_empty() {
        debug!(
            ?title,
            cols = result.col_count,
            rows = result.row_count,
            cells = result.cells.len(),
            "empty datastream"
        );
        return DataTable::empty(title, description);
    }

    let cols = result.col_count as usize;
    let max_rows = result.row_count as usize;
    let strategy = detect_strategy(&result.cells);

    let (header_cells, data_cells): (Vec<&RawCell>, Vec<&RawCell>) = match strategy {
        Strategy::Flagged => result
            .cells
            .iter()
            .partition(|c| c.is_header == Some(true)),
        Strategy::Positional => {
            let split = cols.min(result.cells.len());
            (
                result.cells[..split].iter().collect(),
                result.cells[split..].iter().collect(),
            )
        }
    };

    let headers = unique_headers(header_cells.iter().map(|c| c.text()));

    let rows: Vec<Row> = data_cells
        .chunks(cols)
        .take(max_rows)
        .map(|chunk| {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), chunk.get(i).map(|c| c.text()).unwrap_or_default()))
                .collect()
        })
        .collect();

    trace!(
        ?strategy,
        headers = headers.len(),
        rows = rows.len(),
        dropped_chunks = data_cells.chunks(cols).count().saturating_sub(rows.len()),
        "normalized datastream"
    );

    DataTable {
        title,
        description,
        headers,
        rows,
    }
}

/// Blank names become `column_{n}`; repeats get a `_{k}` suffix.
fn unique_headers(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for (idx, name) in names.enumerate() {
        let base = if name.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut k = 2;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, k);
            k += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}
