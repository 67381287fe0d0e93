use crate::constants::UNIFIED_TABLE_FILE;
use crate::error::{Result, TmsError};
use crate::pipeline::processing::table::{decode_canonical, encode_canonical};
use crate::pipeline::reports::ReportFile;
use crate::types::CanonicalRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Storage trait for pipeline artifacts
#[async_trait]
pub trait Storage: Send + Sync {
    /// Replace the unified table. Returns where it was written.
    async fn save_unified(&self, records: &[CanonicalRecord]) -> Result<String>;

    /// Read the last unified table back, if a run has produced one
    async fn load_unified(&self) -> Result<Option<Vec<CanonicalRecord>>>;

    /// Raw bytes of the unified table as persisted
    async fn unified_bytes(&self) -> Result<Option<Vec<u8>>>;

    async fn save_report(&self, report: &ReportFile) -> Result<String>;

    /// Locate a generated artifact by file name
    async fn locate_report(&self, name: &str) -> Result<Option<String>>;
}

/// Reject names that could escape the reports directory
pub fn validate_report_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains("..")
    {
        return Err(TmsError::InvalidReportName(name.to_string()));
    }
    Ok(())
}

/// Filesystem storage rooted at the reports directory
pub struct FileStorage {
    reports_dir: PathBuf,
}

impl FileStorage {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Write to a sibling temp file then rename, so readers never observe a
    /// half-written artifact.
    async fn write_atomic(&self, name: &str, contents: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.reports_dir).await?;

        let target = self.reports_dir.join(name);
        let staging = self.reports_dir.join(format!(".{}.tmp", name));
        tokio::fs::write(&staging, contents).await?;
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                warn!("Could not remove staging file {}: {}", staging.display(), cleanup);
            }
            return Err(e.into());
        }

        debug!("Wrote {} bytes to {}", contents.len(), target.display());
        Ok(target.to_string_lossy().to_string())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn save_unified(&self, records: &[CanonicalRecord]) -> Result<String> {
        let contents = encode_canonical(records)?;
        self.write_atomic(UNIFIED_TABLE_FILE, &contents).await
    }

    async fn load_unified(&self) -> Result<Option<Vec<CanonicalRecord>>> {
        match self.unified_bytes().await? {
            Some(bytes) => Ok(Some(decode_canonical(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn unified_bytes(&self) -> Result<Option<Vec<u8>>> {
        let path = self.reports_dir.join(UNIFIED_TABLE_FILE);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_report(&self, report: &ReportFile) -> Result<String> {
        self.write_atomic(report.name, &report.contents).await
    }

    async fn locate_report(&self, name: &str) -> Result<Option<String>> {
        validate_report_name(name)?;
        let path = self.reports_dir.join(name.trim());
        if tokio::fs::try_exists(&path).await? {
            Ok(Some(path.to_string_lossy().to_string()))
        } else {
            Ok(None)
        }
    }
}

/// In-memory storage implementation for development/testing
#[derive(Default)]
pub struct InMemoryStorage {
    unified: Mutex<Option<Vec<u8>>>,
    reports: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, name: &str) -> Option<Vec<u8>> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_unified(&self, records: &[CanonicalRecord]) -> Result<String> {
        let contents = encode_canonical(records)?;
        *self.unified.lock().unwrap_or_else(|p| p.into_inner()) = Some(contents);
        debug!("Stored unified table with {} records", records.len());
        Ok(format!("memory://{}", UNIFIED_TABLE_FILE))
    }

    async fn load_unified(&self) -> Result<Option<Vec<CanonicalRecord>>> {
        match self.unified_bytes().await? {
            Some(bytes) => Ok(Some(decode_canonical(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn unified_bytes(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.unified.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    async fn save_report(&self, report: &ReportFile) -> Result<String> {
        self.reports
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(report.name.to_string(), report.contents.clone());
        Ok(format!("memory://{}", report.name))
    }

    async fn locate_report(&self, name: &str) -> Result<Option<String>> {
        validate_report_name(name)?;
        let name = name.trim();
        let found = name == UNIFIED_TABLE_FILE && self.unified_bytes().await?.is_some()
            || self.report(name).is_some();
        Ok(found.then(|| format!("memory://{}", name)))
    }
}
