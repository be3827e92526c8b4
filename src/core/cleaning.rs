use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

static CURRENCY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[₹$,]").expect("currency pattern is valid"));

// 長的放前面，避免 "kms" 只剝掉 "km"
const UNIT_SUFFIXES: [&str; 4] = ["kms", "km", "inr", "rs"];

/// Removes currency symbols and thousands separators: `"₹1,250 "` -> `"1250"`.
pub fn strip_currency(raw: &str) -> String {
    CURRENCY_CHARS.replace_all(raw, "").trim().to_string()
}

/// Coerces a cell to a number. Anything that does not parse to a finite
/// value is treated as missing.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let stripped = strip_currency(raw);
    let lowered = stripped.to_lowercase();

    let mut value = lowered.as_str();
    for suffix in UNIT_SUFFIXES {
        if let Some(rest) = value.strip_suffix(suffix) {
            value = rest.trim_end();
            break;
        }
    }

    if value.is_empty() {
        return None;
    }

    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_pickup_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = raw.strip_suffix("UTC").map(str::trim_end).unwrap_or(raw);
    if let Ok(dt) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Forward-fills then back-fills blank cells in the given columns.
pub fn fill_missing(rows: &mut [Vec<String>], columns: &[usize]) {
    for &col in columns {
        let mut last: Option<String> = None;
        for row in rows.iter_mut() {
            let Some(cell) = row.get_mut(col) else { continue };
            if cell.trim().is_empty() {
                if let Some(prev) = &last {
                    *cell = prev.clone();
                }
            } else {
                last = Some(cell.clone());
            }
        }

        let mut next: Option<String> = None;
        for row in rows.iter_mut().rev() {
            let Some(cell) = row.get_mut(col) else { continue };
            if cell.trim().is_empty() {
                if let Some(following) = &next {
                    *cell = following.clone();
                }
            } else {
                next = Some(cell.clone());
            }
        }
    }
}
