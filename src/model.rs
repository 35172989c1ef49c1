use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Deserialize;

/// A single spreadsheet cell as read from the source workbook, before any
/// type coercion is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value: an empty cell, or a column absent from the row.
    Empty,
    /// Plain text content.
    Text(String),
    /// Numeric content. Excel stores integers as floats as well.
    Number(f64),
    /// Native date/time content.
    DateTime(NaiveDateTime),
    /// Boolean content.
    Bool(bool),
}

impl Cell {
    /// Returns the plain string form of the cell, used whenever no coercion
    /// applies or a coercion falls back.
    pub fn plain(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.clone(),
            Cell::Number(value) => {
                if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            }
            Cell::DateTime(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            Cell::Bool(value) => value.to_string(),
        }
    }

    /// True when the cell carries no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// One source row: column name → cell content.
pub type RawRow = BTreeMap<String, Cell>;

/// One transformed row ready for upload: target field name → formatted value.
pub type OutputRecord = BTreeMap<String, String>;

/// A row that already exists in a remote table. Only the identity is needed,
/// since remote rows are read solely to delete them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRow {
    /// Opaque row identifier assigned by the table store.
    #[serde(rename = "_id")]
    pub id: String,
}
