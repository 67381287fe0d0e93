//! Pipeline metrics
//!
//! Each phase records through its own zero-sized struct so metric names stay
//! owned by one place. Recording goes through the `metrics` facade and is a
//! no-op until a recorder is installed.

macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("harlem_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("harlem_", $phase, "_", $name)
    };
}

/// Metrics for per-partner record loading
pub struct LoaderMetrics;

impl LoaderMetrics {
    pub fn record_load_success(partner: &str, records: usize, rejected: usize, duration_secs: f64) {
        let partner = partner.to_string();
        ::metrics::counter!(phase_metric!(counter, "loader", "files_loaded"), "partner" => partner.clone())
            .increment(1);
        ::metrics::counter!(phase_metric!(counter, "loader", "records"), "partner" => partner.clone())
            .increment(records as u64);
        ::metrics::counter!(phase_metric!(counter, "loader", "rows_rejected"), "partner" => partner.clone())
            .increment(rejected as u64);
        ::metrics::histogram!(phase_metric!(histogram, "loader", "duration_seconds"), "partner" => partner)
            .record(duration_secs);
    }

    pub fn record_load_failure(partner: &str) {
        ::metrics::counter!(phase_metric!(counter, "loader", "failures"), "partner" => partner.to_string())
            .increment(1);
    }

    pub fn record_partner_missing(partner: &str) {
        ::metrics::counter!(phase_metric!(counter, "loader", "files_missing"), "partner" => partner.to_string())
            .increment(1);
    }
}

/// Metrics for unification and deduplication
pub struct UnifyMetrics;

impl UnifyMetrics {
    pub fn record_unify(total_rows: usize, unique_rows: usize) {
        ::metrics::counter!(phase_metric!(counter, "unify", "rows_in")).increment(total_rows as u64);
        ::metrics::counter!(phase_metric!(counter, "unify", "duplicates_discarded"))
            .increment(total_rows.saturating_sub(unique_rows) as u64);
        ::metrics::histogram!(phase_metric!(histogram, "unify", "unified_rows")).record(unique_rows as f64);
    }

    pub fn record_empty_result() {
        ::metrics::counter!(phase_metric!(counter, "unify", "empty_results")).increment(1);
    }
}

/// Metrics for report generation and whole runs
pub struct ReportMetrics;

impl ReportMetrics {
    pub fn record_report(report: &'static str, rows: usize) {
        ::metrics::histogram!(phase_metric!(histogram, "report", "rows"), "report" => report)
            .record(rows as f64);
    }

    pub fn record_run(duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "pipeline", "runs")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "pipeline", "duration_seconds")).record(duration_secs);
    }
}
