// Pipeline ingestion: source format detection and tabular readers

pub mod delimited;
pub mod spreadsheet;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TmsError};

/// One source row as `(header, cell text)` pairs, in column order
pub type RawRow = Vec<(String, String)>;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Tabular encodings a partner export can arrive in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `;`-separated text with a header row
    Delimited,
    /// Workbook; only the first sheet is read
    Spreadsheet,
}

impl SourceFormat {
    /// Detect the format from the extension, sniffing magic bytes when the
    /// extension is missing or unknown.
    pub fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") | Some("txt") => return Ok(SourceFormat::Delimited),
            Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
                return Ok(SourceFormat::Spreadsheet)
            }
            _ => {}
        }

        let mut header = [0u8; 8];
        let read = File::open(path)?.read(&mut header)?;
        let header = &header[..read];
        debug!("Sniffing {} ({} header bytes)", path.display(), read);

        if header.starts_with(ZIP_MAGIC) || header.starts_with(OLE_MAGIC) {
            Ok(SourceFormat::Spreadsheet)
        } else {
            Err(TmsError::UnsupportedFormat {
                path: path.display().to_string(),
            })
        }
    }
}

/// Read every data row of a partner source file
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    match SourceFormat::detect(path)? {
        SourceFormat::Delimited => delimited::read_rows(path),
        SourceFormat::Spreadsheet => spreadsheet::read_rows(path),
    }
}
