//! Read-only aggregations over the unified table.
//!
//! Each reducer is a pure function of the canonical records; rendering to
//! files happens here so the reducers stay free of I/O.

pub mod blacklist;
pub mod couriers;
pub mod expiring;
pub mod summary;

use chrono::NaiveDateTime;
use tracing::info;

use crate::constants::{BLACKLIST_FILE, COURIER_SCORES_FILE, EXPIRING_TODAY_FILE, SUMMARY_FILE};
use crate::error::Result;
use crate::metrics::ReportMetrics;
use crate::pipeline::processing::table::render_table;
use crate::types::CanonicalRecord;

pub use blacklist::{build_blacklist, BlacklistEntry};
pub use couriers::{score_couriers, CourierScore, Tier};
pub use expiring::expiring_on;
pub use summary::{summarize, DashboardSummary};

/// A rendered report ready to hand to storage
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFile {
    pub name: &'static str,
    pub contents: Vec<u8>,
    pub rows: usize,
}

/// Every derived report of one run
#[derive(Debug, Clone)]
pub struct ReportSet {
    pub blacklist: Vec<BlacklistEntry>,
    pub couriers: Vec<CourierScore>,
    pub expiring: Vec<CanonicalRecord>,
    pub summary: DashboardSummary,
}

impl ReportSet {
    /// Run all aggregators against the table as of `now`
    pub fn build(records: &[CanonicalRecord], now: NaiveDateTime) -> Self {
        let report_set = Self {
            blacklist: build_blacklist(records),
            couriers: score_couriers(records),
            expiring: expiring_on(records, now.date()),
            summary: summarize(records, now),
        };
        info!(
            "Built reports: {} blacklisted, {} couriers, {} expiring today",
            report_set.blacklist.len(),
            report_set.couriers.len(),
            report_set.expiring.len()
        );
        report_set
    }

    pub fn render(&self) -> Result<Vec<ReportFile>> {
        let files = vec![
            ReportFile {
                name: BLACKLIST_FILE,
                contents: render_table(
                    &blacklist::HEADERS,
                    self.blacklist.iter().map(BlacklistEntry::to_row),
                )?,
                rows: self.blacklist.len(),
            },
            ReportFile {
                name: COURIER_SCORES_FILE,
                contents: render_table(
                    &couriers::HEADERS,
                    self.couriers.iter().map(CourierScore::to_row),
                )?,
                rows: self.couriers.len(),
            },
            ReportFile {
                name: EXPIRING_TODAY_FILE,
                contents: render_table(&expiring::HEADERS, self.expiring.iter().map(expiring::to_row))?,
                rows: self.expiring.len(),
            },
            ReportFile {
                name: SUMMARY_FILE,
                contents: serde_json::to_vec_pretty(&self.summary)?,
                rows: 1,
            },
        ];

        for file in &files {
            ReportMetrics::record_report(file.name, file.rows);
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::normalize::normalize_date;
    use crate::types::DeliveryStatus;

    #[test]
    fn test_render_all_reports() {
        let now = normalize_date(Some("2024-05-10T08:00:00")).unwrap();
        let records: Vec<_> = (0..3)
            .map(|i| CanonicalRecord {
                status: DeliveryStatus::Ausente,
                recipient: Some("Lia".to_string()),
                promised_date: normalize_date(Some("10/05/2024")),
                ..CanonicalRecord::new(format!("{i}"), "Pichau")
            })
            .collect();

        let files = ReportSet::build(&records, now).render().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![BLACKLIST_FILE, COURIER_SCORES_FILE, EXPIRING_TODAY_FILE, SUMMARY_FILE]
        );

        let blacklist = String::from_utf8(files[0].contents.clone()).unwrap();
        let mut lines = blacklist.lines();
        assert_eq!(
            lines.next(),
            Some("NOME_DESTINATARIO;CEP;CIDADE;Total_Insucessos;Ultimo_Insucesso;Motivos")
        );
        assert_eq!(lines.next(), Some("Lia;;;3;;AUSENTE"));

        assert_eq!(files[2].rows, 3);
    }
}
