use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::pipeline::ingestion::RawRow;
use crate::types::CanonicalField;

/// Canonical field slots filled from one raw row
pub type MappedRow = BTreeMap<CanonicalField, String>;

/// Uppercase and trim a column header so partner spelling and padding don't matter
pub fn normalize_header(header: &str) -> String {
    header.trim().to_uppercase()
}

/// Static dictionary of canonical field → partner → source column header.
///
/// Built once per run from configuration and shared read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMapping {
    columns: BTreeMap<CanonicalField, BTreeMap<String, String>>,
}

impl SchemaMapping {
    /// Build the table from per-partner column lists. Headers are stored normalized.
    pub fn from_partners<P, C, H>(partners: P) -> Self
    where
        P: IntoIterator<Item = (String, C)>,
        C: IntoIterator<Item = (CanonicalField, H)>,
        H: AsRef<str>,
    {
        let mut columns: BTreeMap<CanonicalField, BTreeMap<String, String>> = BTreeMap::new();
        for (partner, partner_columns) in partners {
            for (field, header) in partner_columns {
                columns
                    .entry(field)
                    .or_default()
                    .insert(partner.clone(), normalize_header(header.as_ref()));
            }
        }
        Self { columns }
    }

    /// Partners with at least one mapped column
    pub fn partners(&self) -> BTreeSet<&str> {
        self.columns
            .values()
            .flat_map(|by_partner| by_partner.keys().map(String::as_str))
            .collect()
    }

    /// Normalized source header for a field, if the partner maps it
    pub fn source_header(&self, field: CanonicalField, partner: &str) -> Option<&str> {
        self.columns
            .get(&field)
            .and_then(|by_partner| by_partner.get(partner))
            .map(String::as_str)
    }

    /// Translate one raw row into canonical slots.
    ///
    /// Unmapped fields, missing columns and blank cells are simply left out.
    pub fn map_row(&self, partner: &str, row: &RawRow) -> MappedRow {
        let observed: HashMap<String, &str> = row
            .iter()
            .map(|(header, value)| (normalize_header(header), value.as_str()))
            .collect();

        let mut mapped = MappedRow::new();
        for (field, by_partner) in &self.columns {
            let Some(source) = by_partner.get(partner) else {
                continue;
            };
            if let Some(value) = observed.get(source).map(|v| v.trim()) {
                if !value.is_empty() {
                    mapped.insert(*field, value.to_string());
                }
            }
        }
        mapped
    }
}
