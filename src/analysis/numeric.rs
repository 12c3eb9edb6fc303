// src/analysis/numeric.rs

/// Read a measurement as written in the OEFA sheets.
///
/// Detection-limit markers are dropped (`"<0.005"` → `0.005`, `">50"` →
/// `50`) and a decimal comma is accepted (`"7,36"` → `7.36`).
pub fn parse_value(raw: &str) -> Option<f64> {
    let v = raw
        .trim()
        .trim_start_matches(|c| c == '<' || c == '>' || c == '=' || c == '≤' || c == '≥')
        .trim_start()
        .replace(',', ".");
    if v.is_empty() {
        return None;
    }
    v.parse::<f64>().ok().filter(|n| n.is_finite())
}
