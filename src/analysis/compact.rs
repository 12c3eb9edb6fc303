// src/analysis/compact.rs
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{date_parser::parse_fecha, numeric::parse_value};
use crate::junar::Row;

/// Column names that identify what was measured or observed, by priority.
const PARAMETER_COLUMNS: &[&str] = &[
    "Especie",
    "Nombre común",
    "Taxon",
    "Parámetro",
    "Parametro",
    "Componente ambiental",
];
const VALUE_COLUMNS: &[&str] = &["Valor", "Abundancia", "Resultado", "Individuos"];
const DATE_COLUMNS: &[&str] = &["Fecha"];

const DEFAULT_PARAMETER_COLUMN: &str = "Especie";
const DEFAULT_DATE_COLUMN: &str = "Fecha";
const DEFAULT_UNIT_COLUMN: &str = "Unidad de medida";
const UNIT_MARKER: &str = "unidad";

/// Unit given to sighting-log rows, each counting as one observation.
pub const PRESENCE_UNIT: &str = "Avistamientos";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactRecord {
    #[serde(rename = "parametro")]
    pub parameter: String,
    #[serde(rename = "valor")]
    pub value: Option<f64>,
    #[serde(rename = "unidad")]
    pub unit: Option<String>,
    #[serde(rename = "fecha")]
    pub date: Option<String>,
}

#[derive(Debug)]
struct Roles {
    parameter: String,
    /// `None` for presence-only datasets.
    value: Option<String>,
    unit: String,
    date: String,
}

impl Roles {
    fn detect(columns: &[&String]) -> Self {
        let unit = columns
            .iter()
            .find(|c| c.to_lowercase().contains(UNIT_MARKER))
            .map(|c| c.to_string())
            .unwrap_or_else(|| DEFAULT_UNIT_COLUMN.to_string());

        Self {
            parameter: first_match(columns, PARAMETER_COLUMNS)
                .unwrap_or_else(|| DEFAULT_PARAMETER_COLUMN.to_string()),
            value: first_match(columns, VALUE_COLUMNS),
            unit,
            date: first_match(columns, DATE_COLUMNS)
                .unwrap_or_else(|| DEFAULT_DATE_COLUMN.to_string()),
        }
    }
}

/// Candidates are tried in order; each one is compared case-insensitively
/// against every column.
fn first_match(columns: &[&String], candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|cand| {
        let cand = cand.to_lowercase();
        columns
            .iter()
            .find(|c| c.trim().to_lowercase() == cand)
            .map(|c| c.to_string())
    })
}

fn non_blank(row: &Row, column: &str) -> Option<String> {
    row.get(column)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reduce rows to parameter / value / unit / date records.
///
/// Rows without a parameter are dropped, and so are rows whose value does
/// not parse. When the table has no value column at all every row is a
/// sighting worth `1.0` [`PRESENCE_UNIT`]. Dates that do not parse are kept
/// as `None`.
pub fn compact(rows: &[Row]) -> Vec<CompactRecord> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let columns: Vec<&String> = first.keys().collect();
    let roles = Roles::detect(&columns);
    debug!(?roles, rows = rows.len(), "compacting rows");

    rows.iter()
        .filter_map(|row| {
            let parameter = non_blank(row, &roles.parameter)?;
            let (value, unit) = match &roles.value {
                Some(col) => {
                    let value = row.get(col).and_then(|v| parse_value(v))?;
                    (value, non_blank(row, &roles.unit))
                }
                None => (1.0, Some(PRESENCE_UNIT.to_string())),
            };
            Some(CompactRecord {
                parameter,
                value: Some(value),
                unit,
                date: row.get(&roles.date).and_then(|d| parse_fecha(d)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn measurement_rows() {
        let rows = vec![
            row(&[("Parámetro", "Plomo"), ("Valor", "<0.005"), ("Unidad de medida", "mg/L"), ("Fecha", "3/15/23")]),
            row(&[("Parámetro", "pH"), ("Valor", "7,36"), ("Unidad de medida", ""), ("Fecha", "sin fecha")]),
            row(&[("Parámetro", "Cadmio"), ("Valor", "n.d."), ("Unidad de medida", "mg/L"), ("Fecha", "3/15/23")]),
            row(&[("Parámetro", " "), ("Valor", "1"), ("Unidad de medida", "mg/L"), ("Fecha", "3/15/23")]),
        ];
        let out = compact(&rows);
        assert_eq!(
            out,
            vec![
                CompactRecord {
                    parameter: "Plomo".into(),
                    value: Some(0.005),
                    unit: Some("mg/L".into()),
                    date: Some("2023-03-15".into()),
                },
                CompactRecord {
                    parameter: "pH".into(),
                    value: Some(7.36),
                    unit: None,
                    date: None,
                },
            ]
        );
    }

    #[test]
    fn presence_dataset_counts_sightings() {
        let rows = vec![
            row(&[("Nombre común", "Garza blanca"), ("Zona", "Humedal"), ("Fecha", "1/9/22")]),
            row(&[("Nombre común", "Cormorán"), ("Zona", "Playa"), ("Fecha", "")]),
            row(&[("Nombre común", ""), ("Zona", "Playa"), ("Fecha", "")]),
        ];
        let out = compact(&rows);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.value == Some(1.0)));
        assert!(out.iter().all(|r| r.unit.as_deref() == Some(PRESENCE_UNIT)));
        assert_eq!(out[0].date.as_deref(), Some("2022-01-09"));
        assert_eq!(out[1].date, None);
    }

    #[test]
    fn role_names_match_case_insensitively_and_by_priority() {
        // "ESPECIE" outranks "Taxon"; "abundancia" outranks "Individuos"
        let rows = vec![row(&[
            ("Taxon", "Siluriformes"),
            ("ESPECIE", "Bagre"),
            ("Individuos", "3"),
            ("abundancia", "12"),
            ("Unidades", "ind/m2"),
            ("FECHA", "2/1/24"),
        ])];
        let out = compact(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].parameter, "Bagre");
        assert_eq!(out[0].value, Some(12.0));
        assert_eq!(out[0].unit.as_deref(), Some("ind/m2"));
        assert_eq!(out[0].date.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn without_a_parameter_column_nothing_survives() {
        let rows = vec![row(&[("Zona", "Norte"), ("Valor", "3")])];
        assert!(compact(&rows).is_empty());
        assert!(compact(&[]).is_empty());
    }

    #[test]
    fn records_serialize_with_spanish_keys() {
        let r = CompactRecord {
            parameter: "pH".into(),
            value: Some(7.0),
            unit: None,
            date: None,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["parametro"], "pH");
        assert_eq!(v["valor"], 7.0);
        assert!(v["fecha"].is_null());
    }
}
