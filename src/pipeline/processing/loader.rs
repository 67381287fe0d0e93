use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::mapping::{MappedRow, SchemaMapping};
use super::normalize::{normalize_date, parse_decimal, parse_quantity, StatusTaxonomy};
use crate::constants::AWAITING_DRIVER;
use crate::error::Result;
use crate::metrics::LoaderMetrics;
use crate::pipeline::ingestion::{self, RawRow};
use crate::types::{CanonicalField, CanonicalRecord};

/// Outcome of one partner's load attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum LoadStatus {
    Loaded,
    Missing,
    Failed(String),
}

/// Rows contributed by one partner in a run
#[derive(Debug, Clone)]
pub struct PartnerLoad {
    pub partner: String,
    pub path: PathBuf,
    pub records: Vec<CanonicalRecord>,
    pub rejected_rows: usize,
    pub status: LoadStatus,
}

impl PartnerLoad {
    pub fn missing(partner: &str, path: &Path) -> Self {
        Self {
            partner: partner.to_string(),
            path: path.to_path_buf(),
            records: Vec::new(),
            rejected_rows: 0,
            status: LoadStatus::Missing,
        }
    }
}

/// Reads one partner export and turns each row into a `CanonicalRecord`.
///
/// Cheap to clone; the mapping and taxonomy are shared.
#[derive(Debug, Clone)]
pub struct RecordLoader {
    mapping: Arc<SchemaMapping>,
    taxonomy: Arc<StatusTaxonomy>,
}

impl RecordLoader {
    pub fn new(mapping: Arc<SchemaMapping>, taxonomy: Arc<StatusTaxonomy>) -> Self {
        Self { mapping, taxonomy }
    }

    /// Best-effort load: any read or parse failure is logged and the partner
    /// contributes no rows.
    #[instrument(skip(self, path), fields(partner = %partner))]
    pub fn load(&self, partner: &str, path: &Path) -> PartnerLoad {
        let started = Instant::now();
        info!("Loading {}", path.display());

        match self.try_load(partner, path) {
            Ok((records, rejected_rows)) => {
                info!(
                    "Loaded {} records from {} ({} rows rejected)",
                    records.len(),
                    path.display(),
                    rejected_rows
                );
                LoaderMetrics::record_load_success(
                    partner,
                    records.len(),
                    rejected_rows,
                    started.elapsed().as_secs_f64(),
                );
                PartnerLoad {
                    partner: partner.to_string(),
                    path: path.to_path_buf(),
                    records,
                    rejected_rows,
                    status: LoadStatus::Loaded,
                }
            }
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                LoaderMetrics::record_load_failure(partner);
                PartnerLoad {
                    partner: partner.to_string(),
                    path: path.to_path_buf(),
                    records: Vec::new(),
                    rejected_rows: 0,
                    status: LoadStatus::Failed(e.to_string()),
                }
            }
        }
    }

    /// Read and normalize every row, returning the records and the number of
    /// rows rejected for lacking an order id.
    pub fn try_load(&self, partner: &str, path: &Path) -> Result<(Vec<CanonicalRecord>, usize)> {
        let rows = ingestion::read_rows(path)?;
        debug!("Read {} raw rows", rows.len());
        Ok(self.build_records(partner, &rows))
    }

    pub fn build_records(&self, partner: &str, rows: &[RawRow]) -> (Vec<CanonicalRecord>, usize) {
        let mut records = Vec::with_capacity(rows.len());
        let mut rejected = 0;

        for (i, row) in rows.iter().enumerate() {
            let mapped = self.mapping.map_row(partner, row);
            match build_record(partner, &mapped, &self.taxonomy) {
                Some(record) => records.push(record),
                None => {
                    // +2: one-based, after the header row
                    warn!("Rejecting row {} of {}: no order id", i + 2, partner);
                    rejected += 1;
                }
            }
        }

        (records, rejected)
    }
}

/// Single normalization pass over a mapped row.
///
/// Returns `None` when the row has no order id, since it could never be
/// deduplicated.
pub fn build_record(
    partner: &str,
    mapped: &MappedRow,
    taxonomy: &StatusTaxonomy,
) -> Option<CanonicalRecord> {
    let text = |field: CanonicalField| mapped.get(&field).cloned();
    let raw = |field: CanonicalField| mapped.get(&field).map(String::as_str);

    let order_id = text(CanonicalField::OrderId)?;

    Some(CanonicalRecord {
        order_id,
        partner: partner.to_string(),
        order_date: normalize_date(raw(CanonicalField::OrderDate)),
        status: taxonomy.normalize(raw(CanonicalField::Status)),
        status_date: normalize_date(raw(CanonicalField::StatusDate)),
        recipient: text(CanonicalField::Recipient),
        address: text(CanonicalField::Address),
        neighborhood: text(CanonicalField::Neighborhood),
        city: text(CanonicalField::City),
        state: text(CanonicalField::State),
        postal_code: text(CanonicalField::PostalCode),
        driver: text(CanonicalField::Driver).unwrap_or_else(|| AWAITING_DRIVER.to_string()),
        promised_date: normalize_date(raw(CanonicalField::PromisedDate)),
        dispatch_date: normalize_date(raw(CanonicalField::DispatchDate)),
        weight: parse_decimal(raw(CanonicalField::Weight)),
        item_quantity: parse_quantity(raw(CanonicalField::ItemQuantity)),
        volume_quantity: parse_quantity(raw(CanonicalField::VolumeQuantity)),
        merchandise_value: parse_decimal(raw(CanonicalField::MerchandiseValue)),
    })
}
