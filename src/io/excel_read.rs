use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::model::{Cell, RawRow};

/// Reads one sheet of a workbook, skipping the rows above `start_row`
/// (1-based). The first remaining row is taken as the header; every row below
/// it becomes a [`RawRow`] keyed by the header names.
pub fn read_sheet(path: &Path, sheet_name: &str, start_row: u32) -> Result<Vec<RawRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = read_required_sheet(&mut workbook, sheet_name)?;

    let skip = start_row.saturating_sub(1) as usize;
    let mut sheet_rows = range.rows().skip(skip);

    let headers: Vec<String> = match sheet_rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| convert_cell(cell).plain())
            .collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for sheet_row in sheet_rows {
        let mut row = RawRow::new();
        for (col_idx, cell) in sheet_row.iter().enumerate() {
            let Some(header) = headers.get(col_idx) else {
                continue;
            };
            if header.is_empty() {
                continue;
            }
            row.insert(header.clone(), convert_cell(cell));
        }
        rows.push(row);
    }

    debug!(sheet = sheet_name, rows = rows.len(), "sheet read");
    Ok(rows)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| SyncError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(SyncError::from)?;
    Ok(range)
}

fn convert_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty => Cell::Empty,
        DataType::String(value) => {
            if value.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(value.clone())
            }
        }
        DataType::Float(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Bool(*value),
        DataType::DateTime(_) | DataType::DateTimeIso(_) => match cell.as_datetime() {
            Some(value) => Cell::DateTime(value),
            None => Cell::Empty,
        },
        other => Cell::Text(other.to_string()),
    }
}
