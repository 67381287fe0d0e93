use std::fs;
use std::path::Path;

use tracing::debug;

use super::RawRow;
use crate::constants::FIELD_SEPARATOR;
use crate::error::Result;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read a `;`-delimited export with a header row.
///
/// Short rows keep only the cells they have. Any malformed record or invalid
/// UTF-8 fails the whole file.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let bytes = fs::read(path)?;
    parse_rows(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes.as_slice()))
}

pub fn parse_rows(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(FIELD_SEPARATOR)
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    debug!("Delimited source columns: {:?}", headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
