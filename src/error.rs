use thiserror::Error;

#[derive(Error, Debug)]
pub enum TmsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimited text error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file format: {path}")]
    UnsupportedFormat { path: String },

    #[error("Spreadsheet has no sheets: {path}")]
    EmptyWorkbook { path: String },

    #[error("No source data found in {tables_dir}")]
    NoSourceData { tables_dir: String },

    #[error("Invalid report name: {0}")]
    InvalidReportName(String),

    #[error("Background task failed: {0}")]
    JoinFailure(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, TmsError>;
