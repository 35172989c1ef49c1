//! Converts raw cell values into the string form stored in the target table.
//!
//! Coercion never fails: malformed input falls back to the plain string form
//! of the cell, because a single bad cell must not abort a whole table sync.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::FieldType;
use crate::model::Cell;

/// Date-only and date-time layouts attempted when coercing text to a date.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Applies the declared logical type to a raw cell value.
///
/// Missing values normalise to the empty string regardless of the declared
/// type. Values that cannot be parsed under the declared type keep their
/// plain string form.
pub fn coerce(cell: &Cell, field_type: FieldType) -> String {
    if cell.is_empty() {
        return String::new();
    }

    match field_type {
        FieldType::Number => match cell {
            Cell::Number(value) => format_number(*value),
            Cell::Text(text) => match text.trim().parse::<f64>() {
                Ok(value) => format_number(value),
                Err(_) => text.clone(),
            },
            other => other.plain(),
        },
        FieldType::Date => match cell {
            Cell::DateTime(value) => value.date().format("%Y-%m-%d").to_string(),
            Cell::Text(text) => match parse_date(text.trim()) {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => text.clone(),
            },
            other => other.plain(),
        },
        FieldType::Plain => cell.plain(),
    }
}

/// Formats a number with thousands separators and exactly two fractional
/// digits, e.g. `1234.5` → `"1,234.50"`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let unsigned = format!("{:.2}", value.abs());
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some(parts) => parts,
        None => (unsigned.as_str(), "00"),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (offset, digit) in int_part.chars().enumerate() {
        if offset > 0 && (int_part.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
            return Some(value.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(value) = NaiveDate::parse_from_str(text, format) {
            return Some(value);
        }
    }
    None
}
