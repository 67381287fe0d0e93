use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_REPORTS_DIR, DEFAULT_TABLES_DIR, MAGAZINE_LUIZA, MAGAZINE_LUIZA_FILE,
    PETLOVE, PETLOVE_FILE, PICHAU, PICHAU_FILE, REPORTS_DIR_ENV, TABLES_DIR_ENV,
};
use crate::error::{Result, TmsError};
use crate::pipeline::processing::normalize::status::default_entries;
use crate::pipeline::processing::{PartnerSource, SchemaMapping, StatusTaxonomy};
use crate::types::{CanonicalField, DeliveryStatus};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tables_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub partners: Vec<PartnerConfig>,
    pub status_aliases: Vec<StatusAliasConfig>,
}

/// One partner export: where it lives and which column feeds each canonical field
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PartnerConfig {
    pub name: String,
    pub file: PathBuf,
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StatusAliasConfig {
    pub status: String,
    pub aliases: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tables_dir: PathBuf::from(DEFAULT_TABLES_DIR),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            partners: default_partners(),
            status_aliases: default_entries()
                .into_iter()
                .map(|(status, aliases)| StatusAliasConfig {
                    status: status.as_str().to_string(),
                    aliases: aliases.into_iter().map(str::to_string).collect(),
                })
                .collect(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `harlem_tms.toml` when no path is given.
    ///
    /// An explicit path must exist. A missing default file falls back to the
    /// built-in tables. Directory env vars override whatever the file says.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No {} found, using built-in configuration", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        info!(
            "Configuration loaded: {} partners, tables in {}, reports in {}",
            config.partners.len(),
            config.tables_dir.display(),
            config.reports_dir.display()
        );
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TmsError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a TOML document. Sections left out keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(dir) = env_dir(TABLES_DIR_ENV) {
            self.tables_dir = dir;
        }
        if let Some(dir) = env_dir(REPORTS_DIR_ENV) {
            self.reports_dir = dir;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.partners.is_empty() {
            return Err(TmsError::Config("at least one partner must be configured".to_string()));
        }

        let mut seen = BTreeSet::new();
        for partner in &self.partners {
            let name = partner.name.trim();
            if name.is_empty() {
                return Err(TmsError::Config("partner name cannot be empty".to_string()));
            }
            // Partner filters match names ignoring ASCII case
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(TmsError::Config(format!("partner '{}' is configured twice", name)));
            }
            partner.canonical_columns()?;
        }

        self.status_taxonomy()?;
        Ok(())
    }

    pub fn schema_mapping(&self) -> Result<SchemaMapping> {
        let mut partners = Vec::with_capacity(self.partners.len());
        for partner in &self.partners {
            partners.push((partner.name.trim().to_string(), partner.canonical_columns()?));
        }
        Ok(SchemaMapping::from_partners(partners))
    }

    pub fn status_taxonomy(&self) -> Result<StatusTaxonomy> {
        let mut entries = Vec::with_capacity(self.status_aliases.len());
        for entry in &self.status_aliases {
            let status: DeliveryStatus = entry.status.parse().map_err(TmsError::Config)?;
            entries.push((status, entry.aliases.clone()));
        }
        StatusTaxonomy::new(entries)
    }

    /// Partner sources in configuration order, optionally restricted to `only`.
    /// Names in the filter match case-insensitively; unknown names are an error.
    pub fn partner_sources(&self, only: Option<&[String]>) -> Result<Vec<PartnerSource>> {
        if let Some(names) = only {
            for name in names {
                if self.find_partner(name).is_none() {
                    return Err(TmsError::Config(format!("unknown partner '{}'", name)));
                }
            }
        }

        Ok(self
            .partners
            .iter()
            .filter(|partner| match only {
                Some(names) => names.iter().any(|n| n.trim().eq_ignore_ascii_case(partner.name.trim())),
                None => true,
            })
            .map(|partner| PartnerSource {
                name: partner.name.trim().to_string(),
                path: self.tables_dir.join(&partner.file),
            })
            .collect())
    }

    fn find_partner(&self, name: &str) -> Option<&PartnerConfig> {
        self.partners
            .iter()
            .find(|p| p.name.trim().eq_ignore_ascii_case(name.trim()))
    }
}

impl PartnerConfig {
    /// Column table keyed by canonical field instead of free text
    pub fn canonical_columns(&self) -> Result<Vec<(CanonicalField, String)>> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for (key, header) in &self.columns {
            let field: CanonicalField = key.parse().map_err(|_| {
                TmsError::Config(format!(
                    "partner '{}' maps unknown field '{}'",
                    self.name, key
                ))
            })?;
            if header.trim().is_empty() {
                return Err(TmsError::Config(format!(
                    "partner '{}' maps field '{}' to an empty column",
                    self.name, key
                )));
            }
            columns.push((field, header.clone()));
        }
        Ok(columns)
    }
}

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| PathBuf::from(v.trim()))
}

fn partner(name: &str, file: &str, columns: &[(CanonicalField, &str)]) -> PartnerConfig {
    PartnerConfig {
        name: name.to_string(),
        file: PathBuf::from(file),
        columns: columns
            .iter()
            .map(|(field, header)| (field.key().to_string(), header.to_string()))
            .collect(),
    }
}

fn default_partners() -> Vec<PartnerConfig> {
    use CanonicalField::*;

    vec![
        partner(
            MAGAZINE_LUIZA,
            MAGAZINE_LUIZA_FILE,
            &[
                (OrderId, "Referencia"),
                (OrderDate, "Data"),
                (Status, "Descricao do Status"),
                (StatusDate, "Data Mobile"),
                (Recipient, "Destinatario"),
                (Address, "Endereco"),
                (Neighborhood, "Bairro"),
                (City, "Cidade"),
                (State, "Estado"),
                (PostalCode, "Cep"),
                (Driver, "Condutor"),
                (PromisedDate, "Data Previsao"),
                (DispatchDate, "Data Distribuicao"),
                (ItemQuantity, "Quantidade"),
                (MerchandiseValue, "Valor da Nota"),
            ],
        ),
        partner(
            PICHAU,
            PICHAU_FILE,
            &[
                (OrderId, "N.º pedido"),
                (OrderDate, "Data pedido"),
                (Status, "Situação"),
                (StatusDate, "Data última ocorrência"),
                (Recipient, "Destinatário"),
                (Address, "Endereço"),
                (Neighborhood, "Bairro"),
                (City, "Cidade"),
                (State, "Estado"),
                (PostalCode, "CEP"),
                (Driver, "Último motorista"),
                (PromisedDate, "Data prevista"),
                (DispatchDate, "Data expedicao"),
                (Weight, "Peso real"),
                (ItemQuantity, "Qtde. itens"),
                (VolumeQuantity, "Qtde. volumes"),
                (MerchandiseValue, "Valor pedido"),
            ],
        ),
        partner(
            PETLOVE,
            PETLOVE_FILE,
            &[
                (OrderId, "Pedido"),
                (OrderDate, "Data_Cadastro"),
                (Status, "Ultima_Ocorrencia"),
                (StatusDate, "Data_Ultima_Ocorrencia"),
                (Recipient, "Cliente"),
                (Address, "Endereco_Destinatario"),
                (Neighborhood, "Bairro_Destinatario"),
                (City, "Cidade_Destinatario"),
                (State, "Estado_Destinatario"),
                (PostalCode, "Cep_Destinatario"),
                (Driver, "Motorista_Lista"),
                (PromisedDate, "Data_do_Carregamento_Lista"),
                (DispatchDate, "Data_do_Carregamento_Lista"),
                (Weight, "Peso_Total_do_Pedido"),
                (MerchandiseValue, "Total_Mercadoria"),
            ],
        ),
    ]
}
