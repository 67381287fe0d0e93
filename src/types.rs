use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::AWAITING_DRIVER;

/// Closed set of delivery outcomes every partner status is folded into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Finalizado,
    Devolvido,
    Ausente,
    Insucesso,
    Rota,
    Cancelado,
    Desconhecido,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 7] = [
        DeliveryStatus::Finalizado,
        DeliveryStatus::Devolvido,
        DeliveryStatus::Ausente,
        DeliveryStatus::Insucesso,
        DeliveryStatus::Rota,
        DeliveryStatus::Cancelado,
        DeliveryStatus::Desconhecido,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Finalizado => "FINALIZADO",
            DeliveryStatus::Devolvido => "DEVOLVIDO",
            DeliveryStatus::Ausente => "AUSENTE",
            DeliveryStatus::Insucesso => "INSUCESSO",
            DeliveryStatus::Rota => "ROTA",
            DeliveryStatus::Cancelado => "CANCELADO",
            DeliveryStatus::Desconhecido => "DESCONHECIDO",
        }
    }

    /// Failed delivery attempts that count towards the customer blacklist
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Ausente | DeliveryStatus::Insucesso | DeliveryStatus::Devolvido
        )
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    /// Parses a canonical status name exactly (case-insensitive). Free text
    /// goes through the status taxonomy instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        DeliveryStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| format!("unknown delivery status '{}'", s.trim()))
    }
}

/// Canonical fields a partner column can be mapped onto.
/// The partner itself is not mappable: it comes from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    OrderId,
    OrderDate,
    Status,
    StatusDate,
    Recipient,
    Address,
    Neighborhood,
    City,
    State,
    PostalCode,
    Driver,
    PromisedDate,
    DispatchDate,
    Weight,
    ItemQuantity,
    VolumeQuantity,
    MerchandiseValue,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 17] = [
        CanonicalField::OrderId,
        CanonicalField::OrderDate,
        CanonicalField::Status,
        CanonicalField::StatusDate,
        CanonicalField::Recipient,
        CanonicalField::Address,
        CanonicalField::Neighborhood,
        CanonicalField::City,
        CanonicalField::State,
        CanonicalField::PostalCode,
        CanonicalField::Driver,
        CanonicalField::PromisedDate,
        CanonicalField::DispatchDate,
        CanonicalField::Weight,
        CanonicalField::ItemQuantity,
        CanonicalField::VolumeQuantity,
        CanonicalField::MerchandiseValue,
    ];

    /// Column header used in the persisted canonical table
    pub fn header(&self) -> &'static str {
        match self {
            CanonicalField::OrderId => "ID_PEDIDO",
            CanonicalField::OrderDate => "DATA_PEDIDO",
            CanonicalField::Status => "STATUS_ENTREGA",
            CanonicalField::StatusDate => "DATA_STATUS",
            CanonicalField::Recipient => "NOME_DESTINATARIO",
            CanonicalField::Address => "ENDERECO",
            CanonicalField::Neighborhood => "BAIRRO",
            CanonicalField::City => "CIDADE",
            CanonicalField::State => "ESTADO",
            CanonicalField::PostalCode => "CEP",
            CanonicalField::Driver => "NOME_ENTREGADOR",
            CanonicalField::PromisedDate => "DATA_PREVISAO",
            CanonicalField::DispatchDate => "DATA_DISTRIBUICAO",
            CanonicalField::Weight => "PESO",
            CanonicalField::ItemQuantity => "QUANTIDADE_ITENS",
            CanonicalField::VolumeQuantity => "QUANTIDADE_VOLUMES",
            CanonicalField::MerchandiseValue => "VALOR_MERCADORIA",
        }
    }

    /// Key used for this field in configuration files
    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::OrderId => "order_id",
            CanonicalField::OrderDate => "order_date",
            CanonicalField::Status => "status",
            CanonicalField::StatusDate => "status_date",
            CanonicalField::Recipient => "recipient",
            CanonicalField::Address => "address",
            CanonicalField::Neighborhood => "neighborhood",
            CanonicalField::City => "city",
            CanonicalField::State => "state",
            CanonicalField::PostalCode => "postal_code",
            CanonicalField::Driver => "driver",
            CanonicalField::PromisedDate => "promised_date",
            CanonicalField::DispatchDate => "dispatch_date",
            CanonicalField::Weight => "weight",
            CanonicalField::ItemQuantity => "item_quantity",
            CanonicalField::VolumeQuantity => "volume_quantity",
            CanonicalField::MerchandiseValue => "merchandise_value",
        }
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    /// Accepts either the configuration key or the table header, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CanonicalField::ALL
            .iter()
            .copied()
            .find(|field| {
                field.key().eq_ignore_ascii_case(wanted) || field.header().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| format!("unknown canonical field '{}'", wanted))
    }
}

/// Header of the partner column in the canonical table
pub const PARTNER_HEADER: &str = "EMPRESA";

/// One normalized shipment observation, partner-agnostic.
///
/// Built once per source row by the record loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    #[serde(rename = "ID_PEDIDO")]
    pub order_id: String,
    #[serde(rename = "EMPRESA")]
    pub partner: String,
    #[serde(rename = "DATA_PEDIDO")]
    pub order_date: Option<NaiveDateTime>,
    #[serde(rename = "STATUS_ENTREGA")]
    pub status: DeliveryStatus,
    #[serde(rename = "DATA_STATUS")]
    pub status_date: Option<NaiveDateTime>,
    #[serde(rename = "NOME_DESTINATARIO")]
    pub recipient: Option<String>,
    #[serde(rename = "ENDERECO")]
    pub address: Option<String>,
    #[serde(rename = "BAIRRO")]
    pub neighborhood: Option<String>,
    #[serde(rename = "CIDADE")]
    pub city: Option<String>,
    #[serde(rename = "ESTADO")]
    pub state: Option<String>,
    #[serde(rename = "CEP")]
    pub postal_code: Option<String>,
    #[serde(rename = "NOME_ENTREGADOR")]
    pub driver: String,
    #[serde(rename = "DATA_PREVISAO")]
    pub promised_date: Option<NaiveDateTime>,
    #[serde(rename = "DATA_DISTRIBUICAO")]
    pub dispatch_date: Option<NaiveDateTime>,
    #[serde(rename = "PESO")]
    pub weight: Option<f64>,
    #[serde(rename = "QUANTIDADE_ITENS")]
    pub item_quantity: Option<u32>,
    #[serde(rename = "QUANTIDADE_VOLUMES")]
    pub volume_quantity: Option<u32>,
    #[serde(rename = "VALOR_MERCADORIA")]
    pub merchandise_value: Option<f64>,
}

impl CanonicalRecord {
    /// A record carrying only its key; everything else absent, status unknown
    /// and the driver awaiting assignment.
    pub fn new(order_id: impl Into<String>, partner: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            partner: partner.into(),
            order_date: None,
            status: DeliveryStatus::Desconhecido,
            status_date: None,
            recipient: None,
            address: None,
            neighborhood: None,
            city: None,
            state: None,
            postal_code: None,
            driver: AWAITING_DRIVER.to_string(),
            promised_date: None,
            dispatch_date: None,
            weight: None,
            item_quantity: None,
            volume_quantity: None,
            merchandise_value: None,
        }
    }

    /// Key under which at most one record survives unification
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.order_id, &self.partner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_name() {
        for status in DeliveryStatus::ALL {
            assert_eq!(status.as_str().parse::<DeliveryStatus>().unwrap(), status);
        }
        assert!("entregue".parse::<DeliveryStatus>().is_err());
    }

    #[test]
    fn test_failure_statuses() {
        let failures: Vec<_> = DeliveryStatus::ALL
            .iter()
            .filter(|s| s.is_failure())
            .collect();
        assert_eq!(
            failures,
            vec![
                &DeliveryStatus::Devolvido,
                &DeliveryStatus::Ausente,
                &DeliveryStatus::Insucesso
            ]
        );
    }

    #[test]
    fn test_field_parses_from_key_or_header() {
        assert_eq!("order_id".parse::<CanonicalField>().unwrap(), CanonicalField::OrderId);
        assert_eq!("Data_Previsao".parse::<CanonicalField>().unwrap(), CanonicalField::PromisedDate);
        assert!("EMPRESA".parse::<CanonicalField>().is_err());
    }
}
