use crate::error::{Result, TmsError};
use crate::types::DeliveryStatus;

/// Ordered mapping from canonical status to the free-text aliases partners use.
///
/// Matching is substring containment, so the order of entries is a precedence
/// rule: the first status with an alias contained in the input wins.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTaxonomy {
    entries: Vec<(DeliveryStatus, Vec<String>)>,
}

impl StatusTaxonomy {
    /// Build a taxonomy from ordered `(status, aliases)` pairs.
    ///
    /// Aliases are uppercased and trimmed once here. Empty aliases are rejected
    /// because they would match every input.
    pub fn new<I, A, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DeliveryStatus, A)>,
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut built: Vec<(DeliveryStatus, Vec<String>)> = Vec::new();

        for (status, aliases) in entries {
            if status == DeliveryStatus::Desconhecido {
                return Err(TmsError::Config(
                    "DESCONHECIDO is the fallback status and cannot carry aliases".to_string(),
                ));
            }
            if built.iter().any(|(existing, _)| *existing == status) {
                return Err(TmsError::Config(format!(
                    "status {} appears more than once in the taxonomy",
                    status
                )));
            }

            let mut normalized = Vec::new();
            for alias in aliases {
                let alias = alias.as_ref().trim().to_uppercase();
                if alias.is_empty() {
                    return Err(TmsError::Config(format!(
                        "status {} has an empty alias",
                        status
                    )));
                }
                normalized.push(alias);
            }
            if normalized.is_empty() {
                return Err(TmsError::Config(format!("status {} has no aliases", status)));
            }

            built.push((status, normalized));
        }

        Ok(Self { entries: built })
    }

    /// Fold a partner status into the canonical set
    pub fn normalize(&self, raw: Option<&str>) -> DeliveryStatus {
        let value = match raw.map(|s| s.trim().to_uppercase()) {
            Some(v) if !v.is_empty() => v,
            _ => return DeliveryStatus::Desconhecido,
        };

        self.entries
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|alias| value.contains(alias.as_str())))
            .map(|(status, _)| *status)
            .unwrap_or(DeliveryStatus::Desconhecido)
    }
}

impl Default for StatusTaxonomy {
    fn default() -> Self {
        Self {
            entries: default_entries()
                .into_iter()
                .map(|(status, aliases)| {
                    (status, aliases.iter().map(|a| a.to_uppercase()).collect())
                })
                .collect(),
        }
    }
}

/// Built-in alias table. Reordering it changes how ambiguous inputs classify.
pub fn default_entries() -> Vec<(DeliveryStatus, Vec<&'static str>)> {
    vec![
        (DeliveryStatus::Finalizado, vec!["Entregue", "Finalizado"]),
        (DeliveryStatus::Devolvido, vec!["Devolucao", "Devolvido"]),
        (DeliveryStatus::Ausente, vec!["Ausente"]),
        (DeliveryStatus::Insucesso, vec!["Insucesso", "Attempt_fail"]),
        (DeliveryStatus::Rota, vec!["Em Rota", "Em Rota para Entrega"]),
        (DeliveryStatus::Cancelado, vec!["Cancelado"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_aliases() {
        let taxonomy = StatusTaxonomy::default();
        assert_eq!(taxonomy.normalize(Some("Entregue")), DeliveryStatus::Finalizado);
        assert_eq!(taxonomy.normalize(Some("PEDIDO ENTREGUE AO CLIENTE")), DeliveryStatus::Finalizado);
        assert_eq!(taxonomy.normalize(Some("  em rota para entrega ")), DeliveryStatus::Rota);
        assert_eq!(taxonomy.normalize(Some("Destinatário ausente")), DeliveryStatus::Ausente);
        assert_eq!(taxonomy.normalize(Some("attempt_fail")), DeliveryStatus::Insucesso);
        assert_eq!(taxonomy.normalize(Some("Cancelado pelo cliente")), DeliveryStatus::Cancelado);
    }

    #[test]
    fn test_unknown_and_absent_inputs() {
        let taxonomy = StatusTaxonomy::default();
        assert_eq!(taxonomy.normalize(Some("Aguardando coleta")), DeliveryStatus::Desconhecido);
        assert_eq!(taxonomy.normalize(Some("")), DeliveryStatus::Desconhecido);
        assert_eq!(taxonomy.normalize(Some("   ")), DeliveryStatus::Desconhecido);
        assert_eq!(taxonomy.normalize(None), DeliveryStatus::Desconhecido);
    }

    #[test]
    fn test_declared_order_is_precedence() {
        let taxonomy = StatusTaxonomy::default();
        // Matches both FINALIZADO and DEVOLVIDO aliases; FINALIZADO is checked first
        assert_eq!(
            taxonomy.normalize(Some("Devolvido apos tentativa, entregue depois")),
            DeliveryStatus::Finalizado
        );

        let reversed = StatusTaxonomy::new(vec![
            (DeliveryStatus::Devolvido, vec!["Devolvido"]),
            (DeliveryStatus::Finalizado, vec!["Entregue"]),
        ])
        .unwrap();
        assert_eq!(
            reversed.normalize(Some("Devolvido apos tentativa, entregue depois")),
            DeliveryStatus::Devolvido
        );
    }

    #[test]
    fn test_default_matches_built_entries() {
        let built = StatusTaxonomy::new(default_entries()).unwrap();
        assert_eq!(built, StatusTaxonomy::default());
    }

    #[test]
    fn test_rejects_invalid_tables() {
        assert!(StatusTaxonomy::new(vec![(DeliveryStatus::Rota, vec![" "])]).is_err());
        assert!(StatusTaxonomy::new(vec![(DeliveryStatus::Rota, Vec::<&str>::new())]).is_err());
        assert!(StatusTaxonomy::new(vec![(DeliveryStatus::Desconhecido, vec!["x"])]).is_err());
        assert!(StatusTaxonomy::new(vec![
            (DeliveryStatus::Rota, vec!["a"]),
            (DeliveryStatus::Rota, vec!["b"]),
        ])
        .is_err());
    }
}
