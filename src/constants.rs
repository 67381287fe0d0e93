/// Partner and artifact name constants shared across the codebase.
/// Partner names are the values written to the `EMPRESA` column.

// Built-in partners
pub const MAGAZINE_LUIZA: &str = "Magazine Luiza";
pub const PICHAU: &str = "Pichau";
pub const PETLOVE: &str = "PetLove";

// Expected source file for each built-in partner, relative to the tables directory
pub const MAGAZINE_LUIZA_FILE: &str = "MagazineLuiza.csv";
pub const PICHAU_FILE: &str = "Pichau.xlsx";
pub const PETLOVE_FILE: &str = "PetLoveRelatorioTMS.xlsx";

pub const DEFAULT_TABLES_DIR: &str = "Tabelas";
pub const DEFAULT_REPORTS_DIR: &str = "Relatorios";
pub const DEFAULT_CONFIG_FILE: &str = "harlem_tms.toml";

pub const TABLES_DIR_ENV: &str = "HARLEM_TABLES_DIR";
pub const REPORTS_DIR_ENV: &str = "HARLEM_REPORTS_DIR";

/// Driver value used when a partner export does not name one
pub const AWAITING_DRIVER: &str = "esperando motorista";

/// Field separator for every delimited file read or written
pub const FIELD_SEPARATOR: u8 = b';';

// Output artifacts
pub const UNIFIED_TABLE_FILE: &str = "tabela_unificada.csv";
pub const BLACKLIST_FILE: &str = "blacklist_clientes.csv";
pub const COURIER_SCORES_FILE: &str = "pontuacao_entregadores.csv";
pub const EXPIRING_TODAY_FILE: &str = "pedidos_vencendo_hoje.csv";
pub const SUMMARY_FILE: &str = "resumo.json";

/// Get all built-in partner names in their default processing order
pub fn get_default_partners() -> Vec<&'static str> {
    vec![MAGAZINE_LUIZA, PICHAU, PETLOVE]
}

/// Get every report file a pipeline run produces, unified table included
pub fn get_report_files() -> Vec<&'static str> {
    vec![
        UNIFIED_TABLE_FILE,
        BLACKLIST_FILE,
        COURIER_SCORES_FILE,
        EXPIRING_TODAY_FILE,
        SUMMARY_FILE,
    ]
}
