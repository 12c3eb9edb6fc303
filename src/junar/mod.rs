// src/junar/mod.rs
//! Wire model of the Junar `datastreams/{guid}/data.json` payload and the
//! canonical table every fetch is reshaped into.

pub mod normalize;

pub use normalize::normalize;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// One column → value mapping, in column order.
pub type Row = IndexMap<String, String>;

/// A single flattened cell of the `fArray`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCell {
    #[serde(rename = "fStr", default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
    /// Only some providers set this; absent means the split is positional.
    #[serde(rename = "fHeader", default, deserialize_with = "lenient_bool")]
    pub is_header: Option<bool>,
    #[serde(rename = "fType", default, deserialize_with = "lenient_string")]
    pub cell_type: Option<String>,
}

impl RawCell {
    pub fn text(&self) -> String {
        self.value.as_deref().map(str::trim).unwrap_or("").to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawResult {
    #[serde(rename = "fLength", default, deserialize_with = "lenient_i64")]
    pub total_length: Option<i64>,
    #[serde(rename = "fType", default, deserialize_with = "lenient_string")]
    pub cell_type: Option<String>,
    #[serde(rename = "fTimestamp", default, deserialize_with = "lenient_i64")]
    pub timestamp: Option<i64>,
    #[serde(rename = "fArray", default, deserialize_with = "lenient_cells")]
    pub cells: Vec<RawCell>,
    #[serde(rename = "fRows", default, deserialize_with = "lenient_count")]
    pub row_count: i64,
    #[serde(rename = "fCols", default, deserialize_with = "lenient_count")]
    pub col_count: i64,
}

/// Top level of the provider response. Every field may be missing: an
/// unknown guid usually answers 200 with no `result` at all.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTableResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_result")]
    pub result: Option<RawResult>,
}

impl RawTableResponse {
    /// Decode a response body. A body of the wrong shape decodes to an
    /// empty response instead of failing.
    pub fn from_slice(body: &[u8]) -> Self {
        let decoded = match serde_json::from_slice::<Value>(body) {
            Ok(obj @ Value::Object(_)) => serde_json::from_value::<Self>(obj),
            Ok(_) => {
                warn!(bytes = body.len(), "datastream payload is not a JSON object, treating as empty");
                return Self::default();
            }
            Err(e) => Err(e),
        };
        decoded.unwrap_or_else(|e| {
            warn!(error = %e, bytes = body.len(), "unreadable datastream payload, treating as empty");
            Self::default()
        })
    }
}

/// Canonical table: ordered unique headers and one [`Row`] per record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub title: Option<String>,
    pub description: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl DataTable {
    pub fn empty(title: Option<String>, description: Option<String>) -> Self {
        Self {
            title,
            description,
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Stand-in returned when a dataset could not be fetched.
    pub fn unavailable(dataset_id: &str, reason: impl std::fmt::Display) -> Self {
        Self::empty(Some(dataset_id.to_string()), Some(format!("Error: {}", reason)))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_bool<'de, D>(d: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => n.as_i64().map(|v| v != 0),
        _ => None,
    })
}

fn value_to_i64(v: Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_i64<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(d)?.and_then(value_to_i64))
}

fn lenient_count<'de, D>(d: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_i64(d)?.unwrap_or(0))
}

fn lenient_cells<'de, D>(d: D) -> Result<Vec<RawCell>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(d)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .map(|item| match item {
            obj @ Value::Object(_) => serde_json::from_value(obj).unwrap_or_default(),
            Value::Null => RawCell::default(),
            Value::String(s) => RawCell {
                value: Some(s),
                ..RawCell::default()
            },
            other => RawCell {
                value: Some(other.to_string()),
                ..RawCell::default()
            },
        })
        .collect())
}

fn lenient_result<'de, D>(d: D) -> Result<Option<RawResult>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(obj @ Value::Object(_)) => serde_json::from_value(obj).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_provider_payload() {
        let body = br#"{
            "title": "Monitoreo de agua",
            "description": "EAT",
            "result": {
                "fLength": 4, "fType": "ARRAY", "fTimestamp": 1700000000000,
                "fRows": 2, "fCols": 2,
                "fArray": [
                    {"fStr": "Parametro", "fHeader": true, "fType": "TEXT"},
                    {"fStr": "Valor", "fHeader": true, "fType": "TEXT"},
                    {"fStr": "pH", "fType": "TEXT"},
                    {"fNum": 7.1, "fStr": 7.1, "fType": "NUMBER"}
                ]
            }
        }"#;

        let raw = RawTableResponse::from_slice(body);
        assert_eq!(raw.title.as_deref(), Some("Monitoreo de agua"));
        let result = raw.result.expect("result present");
        assert_eq!(result.col_count, 2);
        assert_eq!(result.row_count, 2);
        assert_eq!(result.timestamp, Some(1_700_000_000_000));
        assert_eq!(result.cells.len(), 4);
        assert_eq!(result.cells[0].is_header, Some(true));
        assert_eq!(result.cells[2].is_header, None);
        assert_eq!(result.cells[3].value.as_deref(), Some("7.1"));
    }

    #[test]
    fn counts_given_as_strings_are_accepted() {
        let raw = RawTableResponse::from_slice(
            br#"{"result": {"fRows": "3", "fCols": " 2 ", "fArray": ["a", null, 5]}}"#,
        );
        let result = raw.result.unwrap();
        assert_eq!(result.row_count, 3);
        assert_eq!(result.col_count, 2);
        assert_eq!(result.cells[0].text(), "a");
        assert_eq!(result.cells[1], RawCell::default());
        assert_eq!(result.cells[2].text(), "5");
    }

    #[test]
    fn malformed_bodies_degrade_to_empty() {
        assert_eq!(RawTableResponse::from_slice(b"<html>oops</html>"), RawTableResponse::default());
        assert_eq!(RawTableResponse::from_slice(b"[1,2,3]"), RawTableResponse::default());

        let raw = RawTableResponse::from_slice(br#"{"title": "x", "result": "not available"}"#);
        assert_eq!(raw.title.as_deref(), Some("x"));
        assert!(raw.result.is_none());

        let raw = RawTableResponse::from_slice(br#"{"result": {"fArray": {"oops": 1}, "fCols": 3}}"#);
        assert!(raw.result.unwrap().cells.is_empty());
    }

    #[test]
    fn unavailable_table_carries_reason() {
        let t = DataTable::unavailable("EAC-RUIDO", "timed out");
        assert_eq!(t.title.as_deref(), Some("EAC-RUIDO"));
        assert_eq!(t.description.as_deref(), Some("Error: timed out"));
        assert!(t.headers.is_empty());
        assert!(t.is_empty());
    }
}
