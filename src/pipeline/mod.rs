// Batch pipeline: partner ingestion, canonical processing and derived reports

pub mod ingestion;
pub mod processing;
pub mod reports;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::metrics::ReportMetrics;
use crate::storage::Storage;
use processing::{LoadStatus, RecordLoader, Unifier};
use reports::ReportSet;

/// How one partner fared in a run
#[derive(Debug, Clone, Serialize)]
pub struct PartnerOutcome {
    pub partner: String,
    pub path: String,
    pub records: usize,
    pub rejected_rows: usize,
    pub status: LoadStatus,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub generated_at: NaiveDateTime,
    pub total_rows: usize,
    pub unified_rows: usize,
    pub rejected_rows: usize,
    pub duplicates_discarded: usize,
    pub partners: Vec<PartnerOutcome>,
    pub unified_file: String,
    pub unified_sha256: String,
    pub reports: Vec<String>,
    pub blacklisted_customers: usize,
    pub scored_couriers: usize,
    pub expiring_today: usize,
}

impl PipelineResult {
    /// Partners that contributed nothing, with the reason
    pub fn degraded_partners(&self) -> impl Iterator<Item = &PartnerOutcome> {
        self.partners
            .iter()
            .filter(|outcome| outcome.status != LoadStatus::Loaded)
    }
}

pub struct Pipeline {
    config: Config,
    storage: Arc<dyn Storage>,
}

impl Pipeline {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        Self { config, storage }
    }

    /// Run against the local wall clock
    pub async fn run(&self, only: Option<&[String]>) -> Result<PipelineResult> {
        self.run_at(Local::now().naive_local(), only).await
    }

    /// Run the complete pipeline with `now` as the reference instant for the
    /// date-relative reports.
    pub async fn run_at(&self, now: NaiveDateTime, only: Option<&[String]>) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", run_id = %run_id);
        self.execute(run_id, now, only).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        now: NaiveDateTime,
        only: Option<&[String]>,
    ) -> Result<PipelineResult> {
        let started = Instant::now();
        info!("🚀 Starting pipeline run");

        let mapping = Arc::new(self.config.schema_mapping()?);
        let taxonomy = Arc::new(self.config.status_taxonomy()?);
        let loader = RecordLoader::new(mapping, taxonomy);

        let sources = self.config.partner_sources(only)?;
        let unifier = Unifier::new(
            sources,
            loader,
            self.storage.clone(),
            self.config.tables_dir.to_string_lossy(),
        );
        let unified = unifier.unify().await?;

        let unified_sha256 = match self.storage.unified_bytes().await? {
            Some(bytes) => hex::encode(Sha256::digest(&bytes)),
            None => String::new(),
        };

        let report_set = ReportSet::build(&unified.records, now);
        let mut reports = Vec::new();
        for file in report_set.render()? {
            let location = self.storage.save_report(&file).await?;
            info!("📄 Wrote {} ({} rows)", location, file.rows);
            reports.push(location);
        }

        let partners: Vec<PartnerOutcome> = unified
            .partner_loads
            .iter()
            .map(|load| PartnerOutcome {
                partner: load.partner.clone(),
                path: load.path.to_string_lossy().to_string(),
                records: load.records.len(),
                rejected_rows: load.rejected_rows,
                status: load.status.clone(),
            })
            .collect();

        let result = PipelineResult {
            run_id,
            generated_at: now,
            total_rows: unified.total_rows,
            unified_rows: unified.records.len(),
            rejected_rows: partners.iter().map(|p| p.rejected_rows).sum(),
            duplicates_discarded: unified.duplicates_discarded,
            partners,
            unified_file: unified.location,
            unified_sha256,
            reports,
            blacklisted_customers: report_set.blacklist.len(),
            scored_couriers: report_set.couriers.len(),
            expiring_today: report_set.expiring.len(),
        };

        for outcome in result.degraded_partners() {
            warn!("Partner {} contributed no rows: {:?}", outcome.partner, outcome.status);
        }

        let duration = started.elapsed().as_secs_f64();
        ReportMetrics::record_run(duration);
        info!(
            "✅ Pipeline run finished in {:.2}s: {} unified rows",
            duration, result.unified_rows
        );

        Ok(result)
    }
}
