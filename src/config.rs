use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SyncError};

/// A fully loaded sync profile: one source workbook and the set of tables it
/// feeds. Loaded once per run and read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncProfile {
    /// Maximum number of rows submitted in a single remote call.
    pub chunk_size: usize,
    /// Location of the source workbook.
    #[serde(rename = "excel_config")]
    pub excel: ExcelSource,
    /// Tables to synchronise, processed in declaration order.
    pub tables: Vec<TableSpec>,
}

/// Reference to the source workbook file.
#[derive(Debug, Clone, Deserialize)]
pub struct ExcelSource {
    pub file_path: String,
}

/// Describes one sheet → table sync: where to read, where to write, and how
/// columns map onto target fields.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSpec {
    /// Target table in the SeaTable base.
    pub seatable: TargetTable,
    /// Name of the source sheet inside the workbook.
    pub excel_sheet: String,
    /// 1-based row the data starts at; rows above are header or skipped.
    pub start_row: u32,
    /// Source column name → target field name.
    pub field_mappings: BTreeMap<String, String>,
    /// Target field name → logical type. Absent fields are treated as plain
    /// strings.
    #[serde(default)]
    pub data_types: BTreeMap<String, FieldType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetTable {
    pub table_name: String,
}

/// Logical type declared for a target field, driving coercion of the raw
/// cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Format as a grouped decimal with two fractional digits.
    Number,
    /// Format as `YYYY-MM-DD`.
    Date,
    /// Pass the value through as its plain string form. Unknown type names
    /// deserialise here as well.
    #[default]
    #[serde(other)]
    Plain,
}

/// Loads and validates a sync profile from a JSON file.
///
/// Missing required keys surface as JSON errors; values that parse but are
/// out of range (a zero chunk size, a zero start row) are rejected
/// explicitly.
pub fn load_profile(path: &Path) -> Result<SyncProfile> {
    let raw = fs::read_to_string(path)?;
    let profile: SyncProfile = serde_json::from_str(&raw)?;

    if profile.chunk_size == 0 {
        return Err(SyncError::Config(format!(
            "chunk_size must be positive in {}",
            path.display()
        )));
    }
    for spec in &profile.tables {
        if spec.start_row == 0 {
            return Err(SyncError::Config(format!(
                "start_row must be positive for table '{}' in {}",
                spec.seatable.table_name,
                path.display()
            )));
        }
    }

    Ok(profile)
}
