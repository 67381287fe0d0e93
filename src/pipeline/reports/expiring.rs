use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::pipeline::processing::table::cell;
use crate::types::{CanonicalRecord, DeliveryStatus};

/// Canonical columns carried into the expiring-today report
pub const HEADERS: [&str; 10] = [
    "ID_PEDIDO",
    "EMPRESA",
    "NOME_DESTINATARIO",
    "STATUS_ENTREGA",
    "NOME_ENTREGADOR",
    "DATA_PREVISAO",
    "ENDERECO",
    "CIDADE",
    "ESTADO",
    "CEP",
];

/// Half-open `[start, end)` window covering one calendar day
pub fn day_window(day: NaiveDate) -> (NaiveDateTime, Option<NaiveDateTime>) {
    let start = day.and_time(NaiveTime::MIN);
    (start, start.checked_add_days(Days::new(1)))
}

/// Undelivered orders whose promised date falls on `today`.
/// Records without a promised date are never selected.
pub fn expiring_on(records: &[CanonicalRecord], today: NaiveDate) -> Vec<CanonicalRecord> {
    let (start, end) = day_window(today);

    records
        .iter()
        .filter(|record| record.status != DeliveryStatus::Finalizado)
        .filter(|record| match record.promised_date {
            Some(promised) => promised >= start && end.map_or(true, |end| promised < end),
            None => false,
        })
        .cloned()
        .collect()
}

pub fn to_row(record: &CanonicalRecord) -> Vec<String> {
    HEADERS.iter().map(|header| cell(record, header)).collect()
}
