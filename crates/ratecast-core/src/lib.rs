//! # Ratecast Core
//!
//! Domain types and the exchange-rate pipeline behind the ratecast chat hub.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregator`] | Day-window clamp, concurrent per-date fetches, report rendering |
//! | [`command`] | Chat vs. `exchange <N>` classification |
//! | [`domain`] | Currency codes, dates, quotes, daily reports |
//! | [`error`] | Validation errors |
//! | [`http_client`] | HTTP transport seam (reqwest) |
//! | [`rate_source`] | Rate source trait and the PrivatBank archive client |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Hub / caller   │
//! └────────┬────────┘
//!          │ exchange <N>
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Aggregator    │────▶│   InterestSet    │
//! └────────┬────────┘     └──────────────────┘
//!          │ one fetch per date (≤ 10)
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │   RateSource    │────▶│   HttpClient     │
//! │ (PrivatBank)    │     │   (reqwest)      │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Failure handling
//!
//! A single day's failure never fails an aggregation: the day is logged and
//! omitted. [`SourceError::code`] gives a stable identifier for log fields.

pub mod aggregator;
pub mod command;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod rate_source;

pub use aggregator::{render, AggregationWindow, Aggregator, MAX_WINDOW_DAYS};
pub use command::{classify, Command};
pub use domain::{CurrencyCode, DailyRates, DailyReport, InterestSet, Quote, ReportDate};
pub use error::ValidationError;
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use rate_source::{
    PrivatBankSource, RateSource, SourceError, SourceErrorKind, PRIVATBANK_ARCHIVE_URL,
};
