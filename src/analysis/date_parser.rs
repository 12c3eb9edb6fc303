use chrono::{Datelike, Months, NaiveDate};

/// Sample dates come as `M/D/YY` (`"3/15/23"`). Returns `YYYY-MM-DD`.
///
/// A day past the end of its month (`"2/30/23"`) lands on the month's last
/// day; days above 31 are rejected.
pub fn parse_fecha(raw: &str) -> Option<String> {
    let s = raw.trim();
    let mut parts = s.split('/');
    let (m, d, y) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || y.len() != 2 {
        return None;
    }
    let month: u32 = m.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    let yy: i32 = y.parse().ok()?;
    if !(1..=31).contains(&day) {
        return None;
    }
    // two-digit years pivot at 2000
    let first = NaiveDate::from_ymd_opt(2000 + yy, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    let date = first.with_day(day.min(last.day()))?;
    Some(date.format("%Y-%m-%d").to_string())
}
