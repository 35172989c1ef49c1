//! Applies a table's field mappings across a full row set.

use std::collections::BTreeMap;

use crate::coerce::coerce;
use crate::config::FieldType;
use crate::model::{OutputRecord, RawRow};

/// Transforms raw rows into output records keyed by target field name.
///
/// Produces exactly one record per input row. A source column absent from a
/// given row is treated as a missing value for that field.
pub fn transform_rows(
    rows: &[RawRow],
    field_mappings: &BTreeMap<String, String>,
    data_types: &BTreeMap<String, FieldType>,
) -> Vec<OutputRecord> {
    rows.iter()
        .map(|row| transform_row(row, field_mappings, data_types))
        .collect()
}

fn transform_row(
    row: &RawRow,
    field_mappings: &BTreeMap<String, String>,
    data_types: &BTreeMap<String, FieldType>,
) -> OutputRecord {
    let mut record = OutputRecord::new();
    for (source_column, target_field) in field_mappings {
        let field_type = data_types.get(target_field).copied().unwrap_or_default();
        let value = match row.get(source_column) {
            Some(cell) => coerce(cell, field_type),
            None => String::new(),
        };
        record.insert(target_field.clone(), value);
    }
    record
}
