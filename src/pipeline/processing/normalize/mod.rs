//! Value normalizers applied to every mapped partner row.
//!
//! Status text is folded into the closed `DeliveryStatus` set through an
//! ordered alias taxonomy; dates go through a day-first then ISO fallback;
//! numeric cells accept both dot and comma decimal notation.

pub mod date;
pub mod numeric;
pub mod status;

pub use date::{format_date, normalize_date};
pub use numeric::{parse_decimal, parse_quantity};
pub use status::StatusTaxonomy;
