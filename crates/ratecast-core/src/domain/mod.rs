//! # Domain Models
//!
//! Canonical domain types for ratecast exchange-rate reports.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CurrencyCode`] | Validated 3-letter currency code |
//! | [`InterestSet`] | Ordered currencies retained in each report |
//! | [`ReportDate`] | Calendar day in `DD.MM.YYYY` form |
//! | [`Quote`] | Sale/purchase rates for one currency |
//! | [`DailyRates`] | Everything a rate source returned for one date |
//! | [`DailyReport`] | Interest-set quotes for one date |
//!
//! All types enforce their invariants at construction time:
//!
//! ```rust,ignore
//! use ratecast_core::{CurrencyCode, Quote, ValidationError};
//!
//! let eur = CurrencyCode::parse("eur")?;
//! let quote = Quote::new(eur, 42.25, 41.6)?;
//! println!("{quote}"); // EUR: {sale: 42.25, purchase: 41.6}
//! ```

mod currency;
mod date;
mod models;

pub use currency::{CurrencyCode, InterestSet};
pub use date::ReportDate;
pub use models::{DailyRates, DailyReport, Quote};
