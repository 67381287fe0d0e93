use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use super::loader::{LoadStatus, PartnerLoad, RecordLoader};
use crate::error::{Result, TmsError};
use crate::metrics::{LoaderMetrics, UnifyMetrics};
use crate::storage::Storage;
use crate::types::CanonicalRecord;

/// A configured partner and where its export is expected
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerSource {
    pub name: String,
    pub path: PathBuf,
}

/// Deduplicated canonical table of one run
#[derive(Debug, Clone)]
pub struct UnifiedTable {
    pub records: Vec<CanonicalRecord>,
    pub partner_loads: Vec<PartnerLoad>,
    pub total_rows: usize,
    pub duplicates_discarded: usize,
    pub location: String,
}

/// Loads every configured partner, concatenates and deduplicates the rows,
/// then persists the result.
pub struct Unifier {
    sources: Vec<PartnerSource>,
    loader: RecordLoader,
    storage: Arc<dyn Storage>,
    tables_dir: String,
}

impl Unifier {
    pub fn new(
        sources: Vec<PartnerSource>,
        loader: RecordLoader,
        storage: Arc<dyn Storage>,
        tables_dir: impl Into<String>,
    ) -> Self {
        Self {
            sources,
            loader,
            storage,
            tables_dir: tables_dir.into(),
        }
    }

    /// Run the loads, wait for all of them, dedup and persist.
    ///
    /// Fails only when no partner produced a single row.
    #[instrument(skip(self))]
    pub async fn unify(&self) -> Result<UnifiedTable> {
        let partner_loads = self.load_all().await;

        let rows: Vec<CanonicalRecord> = partner_loads
            .iter()
            .flat_map(|load| load.records.iter().cloned())
            .collect();
        let total_rows = rows.len();

        let records = deduplicate(rows);
        let duplicates_discarded = total_rows - records.len();
        UnifyMetrics::record_unify(total_rows, records.len());

        if records.is_empty() {
            error!("No canonical rows produced by any partner");
            UnifyMetrics::record_empty_result();
            return Err(TmsError::NoSourceData {
                tables_dir: self.tables_dir.clone(),
            });
        }

        info!(
            "Unified {} rows into {} records ({} duplicates discarded)",
            total_rows,
            records.len(),
            duplicates_discarded
        );

        let location = self.storage.save_unified(&records).await?;
        info!("💾 Saved unified table to {}", location);

        Ok(UnifiedTable {
            records,
            partner_loads,
            total_rows,
            duplicates_discarded,
            location,
        })
    }

    /// Load partners concurrently on the blocking pool. Results come back in
    /// configuration order so "first seen" stays deterministic.
    async fn load_all(&self) -> Vec<PartnerLoad> {
        let mut pending = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            if !tokio::fs::try_exists(&source.path).await.unwrap_or(false) {
                warn!(
                    "File {} for partner {} not found. Skipping.",
                    source.path.display(),
                    source.name
                );
                LoaderMetrics::record_partner_missing(&source.name);
                pending.push(PendingLoad::Missing(PartnerLoad::missing(&source.name, &source.path)));
                continue;
            }

            let loader = self.loader.clone();
            let source = source.clone();
            let handle =
                tokio::task::spawn_blocking(move || loader.load(&source.name, &source.path));
            pending.push(PendingLoad::Running(handle));
        }

        let mut loads = Vec::with_capacity(pending.len());
        for (source, entry) in self.sources.iter().zip(pending) {
            let load = match entry {
                PendingLoad::Missing(missing) => missing,
                PendingLoad::Running(handle) => match handle.await {
                    Ok(load) => load,
                    Err(join_error) => {
                        let e = TmsError::from(join_error);
                        error!("Load task for {} did not complete: {}", source.name, e);
                        LoaderMetrics::record_load_failure(&source.name);
                        PartnerLoad {
                            status: LoadStatus::Failed(e.to_string()),
                            ..PartnerLoad::missing(&source.name, &source.path)
                        }
                    }
                },
            };
            loads.push(load);
        }

        loads
    }
}

enum PendingLoad {
    Missing(PartnerLoad),
    Running(JoinHandle<PartnerLoad>),
}

/// Keep the first record seen for each (order id, partner); drop the rest.
pub fn deduplicate(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| {
            let (order_id, partner) = record.dedup_key();
            seen.insert((order_id.to_string(), partner.to_string()))
        })
        .collect()
}
