use std::collections::HashMap;

use crate::constants::{AWAITING_DRIVER, FIELD_SEPARATOR};
use crate::error::Result;
use crate::types::{CanonicalField, CanonicalRecord, DeliveryStatus, PARTNER_HEADER};

use super::normalize::{format_date, normalize_date, parse_decimal, parse_quantity};

/// Column order of the persisted canonical table
pub fn canonical_headers() -> Vec<&'static str> {
    let mut headers = vec![CanonicalField::OrderId.header(), PARTNER_HEADER];
    headers.extend(
        CanonicalField::ALL
            .iter()
            .filter(|f| **f != CanonicalField::OrderId)
            .map(CanonicalField::header),
    );
    headers
}

/// Text of one canonical column for a record. Absent values are empty.
pub fn cell(record: &CanonicalRecord, header: &str) -> String {
    if header == PARTNER_HEADER {
        return record.partner.clone();
    }
    let Ok(field) = header.parse::<CanonicalField>() else {
        return String::new();
    };

    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let number = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
    let quantity = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();

    match field {
        CanonicalField::OrderId => record.order_id.clone(),
        CanonicalField::OrderDate => format_date(record.order_date),
        CanonicalField::Status => record.status.to_string(),
        CanonicalField::StatusDate => format_date(record.status_date),
        CanonicalField::Recipient => text(&record.recipient),
        CanonicalField::Address => text(&record.address),
        CanonicalField::Neighborhood => text(&record.neighborhood),
        CanonicalField::City => text(&record.city),
        CanonicalField::State => text(&record.state),
        CanonicalField::PostalCode => text(&record.postal_code),
        CanonicalField::Driver => record.driver.clone(),
        CanonicalField::PromisedDate => format_date(record.promised_date),
        CanonicalField::DispatchDate => format_date(record.dispatch_date),
        CanonicalField::Weight => number(record.weight),
        CanonicalField::ItemQuantity => quantity(record.item_quantity),
        CanonicalField::VolumeQuantity => quantity(record.volume_quantity),
        CanonicalField::MerchandiseValue => number(record.merchandise_value),
    }
}

/// Render rows as `;`-delimited text with a header line
pub fn render_table<R>(headers: &[&str], rows: R) -> Result<Vec<u8>>
where
    R: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(FIELD_SEPARATOR)
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;

    writer.into_inner().map_err(|e| e.into_error().into())
}

/// Serialize records in canonical column order
pub fn encode_canonical(records: &[CanonicalRecord]) -> Result<Vec<u8>> {
    let headers = canonical_headers();
    render_table(
        &headers,
        records
            .iter()
            .map(|record| headers.iter().map(|h| cell(record, h)).collect()),
    )
}

/// Read a persisted canonical table back into records.
///
/// Rows missing the order id or partner cannot have come from a run and are
/// skipped.
pub fn decode_canonical(bytes: &[u8]) -> Result<Vec<CanonicalRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(FIELD_SEPARATOR)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let values: HashMap<&str, &str> = headers
            .iter()
            .map(String::as_str)
            .zip(row.iter())
            .filter(|(_, v)| !v.is_empty())
            .collect();

        let get = |field: CanonicalField| values.get(field.header()).copied();
        let text = |field: CanonicalField| get(field).map(str::to_string);

        let (Some(order_id), Some(partner)) = (get(CanonicalField::OrderId), values.get(PARTNER_HEADER))
        else {
            continue;
        };

        records.push(CanonicalRecord {
            order_id: order_id.to_string(),
            partner: partner.to_string(),
            order_date: normalize_date(get(CanonicalField::OrderDate)),
            status: get(CanonicalField::Status)
                .and_then(|s| s.parse().ok())
                .unwrap_or(DeliveryStatus::Desconhecido),
            status_date: normalize_date(get(CanonicalField::StatusDate)),
            recipient: text(CanonicalField::Recipient),
            address: text(CanonicalField::Address),
            neighborhood: text(CanonicalField::Neighborhood),
            city: text(CanonicalField::City),
            state: text(CanonicalField::State),
            postal_code: text(CanonicalField::PostalCode),
            driver: text(CanonicalField::Driver).unwrap_or_else(|| AWAITING_DRIVER.to_string()),
            promised_date: normalize_date(get(CanonicalField::PromisedDate)),
            dispatch_date: normalize_date(get(CanonicalField::DispatchDate)),
            weight: parse_decimal(get(CanonicalField::Weight)),
            item_quantity: parse_quantity(get(CanonicalField::ItemQuantity)),
            volume_quantity: parse_quantity(get(CanonicalField::VolumeQuantity)),
            merchandise_value: parse_decimal(get(CanonicalField::MerchandiseValue)),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_order() {
        let headers = canonical_headers();
        assert_eq!(headers.len(), 18);
        assert_eq!(&headers[..4], &["ID_PEDIDO", "EMPRESA", "DATA_PEDIDO", "STATUS_ENTREGA"]);
        assert_eq!(headers.last(), Some(&"VALOR_MERCADORIA"));
    }

    #[test]
    fn test_persisted_table_reads_back() {
        let record = CanonicalRecord {
            status: DeliveryStatus::Rota,
            status_date: normalize_date(Some("2024-03-02T09:45:00")),
            promised_date: normalize_date(Some("03/03/2024")),
            recipient: Some("Maria; da Silva".to_string()),
            city: Some("Recife".to_string()),
            driver: "Carlos".to_string(),
            weight: Some(2.5),
            item_quantity: Some(3),
            ..CanonicalRecord::new("P-1", "Pichau")
        };
        let unknown = CanonicalRecord::new("P-2", "Pichau");

        let bytes = encode_canonical(&[record.clone(), unknown.clone()]).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("ID_PEDIDO;EMPRESA;"));
        assert!(text.contains("2024-03-02 09:45:00"));

        let decoded = decode_canonical(&bytes).unwrap();
        assert_eq!(decoded, vec![record, unknown]);
    }

    #[test]
    fn test_rows_without_key_are_skipped() {
        let bytes = b"ID_PEDIDO;EMPRESA;STATUS_ENTREGA\n;Pichau;ROTA\n9;Pichau;ROTA\n";
        let decoded = decode_canonical(bytes).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].status, DeliveryStatus::Rota);
    }
}
