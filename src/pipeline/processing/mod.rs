// Pipeline processing: schema mapping, value normalization, loading and unification

pub mod loader;
pub mod mapping;
pub mod normalize;
pub mod table;
pub mod unify;

pub use loader::{LoadStatus, PartnerLoad, RecordLoader};
pub use mapping::SchemaMapping;
pub use normalize::StatusTaxonomy;
pub use unify::{PartnerSource, UnifiedTable, Unifier};
