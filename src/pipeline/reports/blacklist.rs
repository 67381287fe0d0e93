use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::pipeline::processing::normalize::format_date;
use crate::types::{CanonicalRecord, DeliveryStatus};

/// Customers with more failed deliveries than this are blacklisted
pub const MAX_TOLERATED_FAILURES: usize = 2;

pub const HEADERS: [&str; 6] = [
    "NOME_DESTINATARIO",
    "CEP",
    "CIDADE",
    "Total_Insucessos",
    "Ultimo_Insucesso",
    "Motivos",
];

/// One customer with repeated delivery failures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlacklistEntry {
    pub recipient: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub total_failures: usize,
    pub last_failure: Option<NaiveDateTime>,
    /// Distinct failure statuses in the order first observed
    pub reasons: Vec<DeliveryStatus>,
}

impl BlacklistEntry {
    pub fn reasons_joined(&self) -> String {
        self.reasons
            .iter()
            .map(DeliveryStatus::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.recipient.clone().unwrap_or_default(),
            self.postal_code.clone().unwrap_or_default(),
            self.city.clone().unwrap_or_default(),
            self.total_failures.to_string(),
            format_date(self.last_failure),
            self.reasons_joined(),
        ]
    }
}

/// Group failed deliveries by (recipient, postal code, city) and keep the
/// customers above the tolerance, most failures first.
pub fn build_blacklist(records: &[CanonicalRecord]) -> Vec<BlacklistEntry> {
    let mut index: HashMap<(Option<&str>, Option<&str>, Option<&str>), usize> = HashMap::new();
    let mut groups: Vec<BlacklistEntry> = Vec::new();

    for record in records.iter().filter(|r| r.status.is_failure()) {
        let key = (
            record.recipient.as_deref(),
            record.postal_code.as_deref(),
            record.city.as_deref(),
        );
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(BlacklistEntry {
                recipient: record.recipient.clone(),
                postal_code: record.postal_code.clone(),
                city: record.city.clone(),
                total_failures: 0,
                last_failure: None,
                reasons: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.total_failures += 1;
        if let Some(date) = record.status_date {
            if group.last_failure.map_or(true, |last| date > last) {
                group.last_failure = Some(date);
            }
        }
        if !group.reasons.contains(&record.status) {
            group.reasons.push(record.status);
        }
    }

    let mut blacklist: Vec<BlacklistEntry> = groups
        .into_iter()
        .filter(|g| g.total_failures > MAX_TOLERATED_FAILURES)
        .collect();
    blacklist.sort_by(|a, b| b.total_failures.cmp(&a.total_failures));
    blacklist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::normalize::normalize_date;

    fn failure(id: &str, recipient: &str, status: DeliveryStatus, date: Option<&str>) -> CanonicalRecord {
        CanonicalRecord {
            status,
            status_date: normalize_date(date),
            recipient: Some(recipient.to_string()),
            postal_code: Some("50000-000".to_string()),
            city: Some("Recife".to_string()),
            ..CanonicalRecord::new(id, "Pichau")
        }
    }

    #[test]
    fn test_repeated_failures_are_grouped() {
        let records = vec![
            failure("1", "Ana", DeliveryStatus::Ausente, Some("01/02/2024")),
            failure("2", "Ana", DeliveryStatus::Ausente, Some("10/02/2024")),
            failure("3", "Ana", DeliveryStatus::Ausente, None),
            failure("4", "Ana", DeliveryStatus::Devolvido, Some("05/02/2024")),
            failure("5", "Ana", DeliveryStatus::Finalizado, Some("20/02/2024")),
        ];

        let blacklist = build_blacklist(&records);
        assert_eq!(blacklist.len(), 1);

        let entry = &blacklist[0];
        assert_eq!(entry.total_failures, 4);
        assert_eq!(entry.last_failure, normalize_date(Some("2024-02-10")));
        assert_eq!(entry.reasons_joined(), "AUSENTE, DEVOLVIDO");
        assert_eq!(entry.to_row()[4], "2024-02-10");
    }

    #[test]
    fn test_two_failures_are_tolerated() {
        let records = vec![
            failure("1", "Bruno", DeliveryStatus::Insucesso, None),
            failure("2", "Bruno", DeliveryStatus::Ausente, None),
        ];
        assert!(build_blacklist(&records).is_empty());
    }

    #[test]
    fn test_absent_dates_never_count_as_latest() {
        let records = vec![
            failure("1", "Caio", DeliveryStatus::Ausente, None),
            failure("2", "Caio", DeliveryStatus::Ausente, None),
            failure("3", "Caio", DeliveryStatus::Ausente, None),
        ];
        let blacklist = build_blacklist(&records);
        assert_eq!(blacklist[0].last_failure, None);
        assert_eq!(blacklist[0].to_row()[4], "");
    }

    #[test]
    fn test_sorted_by_failure_count() {
        let mut records = Vec::new();
        for i in 0..3 {
            records.push(failure(&format!("d{i}"), "Davi", DeliveryStatus::Ausente, None));
        }
        for i in 0..5 {
            records.push(failure(&format!("e{i}"), "Eva", DeliveryStatus::Insucesso, None));
        }

        let blacklist = build_blacklist(&records);
        let names: Vec<_> = blacklist.iter().map(|e| e.recipient.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["Eva", "Davi"]);
    }

    #[test]
    fn test_cancelled_and_unknown_are_not_failures() {
        let records = vec![
            failure("1", "Fabio", DeliveryStatus::Cancelado, None),
            failure("2", "Fabio", DeliveryStatus::Cancelado, None),
            failure("3", "Fabio", DeliveryStatus::Desconhecido, None),
        ];
        assert!(build_blacklist(&records).is_empty());
    }
}
