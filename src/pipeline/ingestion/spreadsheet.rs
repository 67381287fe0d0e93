use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, info};

use super::RawRow;
use crate::error::{Result, TmsError};

/// Read the first sheet of a workbook, treating its first row as headers.
/// Empty and error cells are left out of the row.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names.first().cloned().ok_or_else(|| TmsError::EmptyWorkbook {
        path: path.display().to_string(),
    })?;
    info!(
        "Reading sheet '{}' (first of {}) from {}",
        sheet_name,
        sheet_names.len(),
        path.display()
    );

    let range = workbook.worksheet_range(&sheet_name)?;
    let (row_count, col_count) = range.get_size();
    debug!("Sheet size: {} rows x {} columns", row_count, col_count);

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_text).collect(),
        None => return Ok(Vec::new()),
    };

    let data_rows = rows
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, cell)| (header.clone(), cell_text(cell)))
                .filter(|(_, value)| !value.is_empty())
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(data_rows)
}

/// Render a cell as the text a partner would have typed.
///
/// Whole floats lose their fraction (`42.0` → `42`) so identifiers survive;
/// date cells become ISO date-times for the date normalizer.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}
