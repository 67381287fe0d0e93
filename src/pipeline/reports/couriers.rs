use std::collections::HashMap;

use serde::Serialize;

use crate::types::{CanonicalRecord, DeliveryStatus};

/// Success rate a courier must exceed to be rated high
pub const HIGH_TIER_THRESHOLD: f64 = 0.97;

pub const HEADERS: [&str; 5] = [
    "NOME_ENTREGADOR",
    "Total_Pedidos",
    "Sucessos",
    "Taxa_Sucesso",
    "Pontuacao",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    High,
    Normal,
}

impl Tier {
    pub fn for_rate(rate: f64) -> Self {
        if rate > HIGH_TIER_THRESHOLD {
            Tier::High
        } else {
            Tier::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourierScore {
    pub driver: String,
    pub total_orders: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub tier: Tier,
}

impl CourierScore {
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.driver.clone(),
            self.total_orders.to_string(),
            self.successes.to_string(),
            format!("{:.4}", self.success_rate),
            self.tier.as_str().to_string(),
        ]
    }
}

/// Score every driver that appears in the table, best success rate first.
/// The awaiting-driver placeholder is scored like any other name.
pub fn score_couriers(records: &[CanonicalRecord]) -> Vec<CourierScore> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<(&str, usize, usize)> = Vec::new();

    for record in records {
        let slot = *index.entry(record.driver.as_str()).or_insert_with(|| {
            tallies.push((record.driver.as_str(), 0, 0));
            tallies.len() - 1
        });
        let tally = &mut tallies[slot];
        tally.1 += 1;
        if record.status == DeliveryStatus::Finalizado {
            tally.2 += 1;
        }
    }

    let mut scores: Vec<CourierScore> = tallies
        .into_iter()
        .map(|(driver, total, successes)| {
            let success_rate = if total > 0 {
                successes as f64 / total as f64
            } else {
                0.0
            };
            CourierScore {
                driver: driver.to_string(),
                total_orders: total,
                successes,
                success_rate,
                tier: Tier::for_rate(success_rate),
            }
        })
        .collect();

    scores.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AWAITING_DRIVER;

    fn delivery(id: usize, driver: &str, status: DeliveryStatus) -> CanonicalRecord {
        CanonicalRecord {
            status,
            driver: driver.to_string(),
            ..CanonicalRecord::new(id.to_string(), "PetLove")
        }
    }

    #[test]
    fn test_perfect_driver_is_high_tier() {
        let records: Vec<_> = (0..10)
            .map(|i| delivery(i, "Gabi", DeliveryStatus::Finalizado))
            .collect();

        let scores = score_couriers(&records);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].total_orders, 10);
        assert_eq!(scores[0].successes, 10);
        assert_eq!(scores[0].success_rate, 1.0);
        assert_eq!(scores[0].tier, Tier::High);
    }

    #[test]
    fn test_rates_sorted_and_tiered() {
        let mut records = Vec::new();
        for i in 0..4 {
            let status = if i < 3 { DeliveryStatus::Finalizado } else { DeliveryStatus::Ausente };
            records.push(delivery(i, "Hugo", status));
        }
        records.push(delivery(10, AWAITING_DRIVER, DeliveryStatus::Rota));
        records.push(delivery(11, "Iris", DeliveryStatus::Finalizado));

        let scores = score_couriers(&records);
        let order: Vec<_> = scores.iter().map(|s| s.driver.as_str()).collect();
        assert_eq!(order, vec!["Iris", "Hugo", AWAITING_DRIVER]);

        assert_eq!(scores[1].success_rate, 0.75);
        assert_eq!(scores[1].tier, Tier::Normal);
        assert_eq!(scores[2].success_rate, 0.0);
        assert_eq!(scores[1].to_row(), vec!["Hugo", "4", "3", "0.7500", "normal"]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(Tier::for_rate(0.97), Tier::Normal);
        assert_eq!(Tier::for_rate(0.971), Tier::High);
    }

    #[test]
    fn test_unseen_driver_is_not_emitted() {
        let records = vec![delivery(1, "Joana", DeliveryStatus::Rota)];
        let scores = score_couriers(&records);
        assert!(scores.iter().all(|s| s.driver != "Ghost"));
        assert!(score_couriers(&[]).is_empty());
    }
}
