use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::Serialize;

use super::expiring::day_window;
use crate::constants::AWAITING_DRIVER;
use crate::types::{CanonicalRecord, DeliveryStatus};

/// Headline figures for the unified table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub generated_at: NaiveDateTime,
    pub total_orders: usize,
    pub due_today: usize,
    pub overdue: usize,
    pub active_drivers: usize,
    pub by_status: BTreeMap<DeliveryStatus, usize>,
    pub by_partner: BTreeMap<String, usize>,
}

/// Summarize the table as seen at `now` (local wall-clock time)
pub fn summarize(records: &[CanonicalRecord], now: NaiveDateTime) -> DashboardSummary {
    let (start, end) = day_window(now.date());

    let mut by_status = BTreeMap::new();
    let mut by_partner = BTreeMap::new();
    let mut drivers = BTreeSet::new();
    let mut due_today = 0;
    let mut overdue = 0;

    for record in records {
        *by_status.entry(record.status).or_insert(0) += 1;
        *by_partner.entry(record.partner.clone()).or_insert(0) += 1;

        if record.driver != AWAITING_DRIVER {
            drivers.insert(record.driver.as_str());
        }

        if let Some(promised) = record.promised_date {
            if promised >= start && end.map_or(true, |end| promised < end) {
                due_today += 1;
            }
            if promised < now && record.status != DeliveryStatus::Finalizado {
                overdue += 1;
            }
        }
    }

    DashboardSummary {
        generated_at: now,
        total_orders: records.len(),
        due_today,
        overdue,
        active_drivers: drivers.len(),
        by_status,
        by_partner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::normalize::normalize_date;

    fn order(id: &str, partner: &str, driver: &str, promised: &str, status: DeliveryStatus) -> CanonicalRecord {
        CanonicalRecord {
            status,
            driver: driver.to_string(),
            promised_date: normalize_date(Some(promised)),
            ..CanonicalRecord::new(id, partner)
        }
    }

    #[test]
    fn test_summary_counts() {
        let now = normalize_date(Some("2024-05-10T12:00:00")).unwrap();
        let records = vec![
            order("1", "Pichau", "Ana", "10/05/2024", DeliveryStatus::Rota),
            order("2", "Pichau", "Ana", "2024-05-10T18:00:00", DeliveryStatus::Rota),
            order("3", "PetLove", AWAITING_DRIVER, "01/05/2024", DeliveryStatus::Ausente),
            order("4", "PetLove", "Beto", "01/05/2024", DeliveryStatus::Finalizado),
            order("5", "PetLove", "Beto", "sem data", DeliveryStatus::Desconhecido),
        ];

        let summary = summarize(&records, now);
        assert_eq!(summary.total_orders, 5);
        assert_eq!(summary.due_today, 2);
        // Midnight today is before noon; the 18:00 promise is still ahead
        assert_eq!(summary.overdue, 2);
        assert_eq!(summary.active_drivers, 2);
        assert_eq!(summary.by_status[&DeliveryStatus::Rota], 2);
        assert_eq!(summary.by_partner["PetLove"], 3);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["by_status"]["ROTA"], 2);
    }
}
