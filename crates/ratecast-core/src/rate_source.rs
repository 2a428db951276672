//! Rate source contract and the PrivatBank archive client.
//!
//! A [`RateSource`] answers one question: what were the exchange rates on a
//! given calendar day. Each call maps to exactly one upstream request; the
//! [`Aggregator`](crate::Aggregator) decides which days to ask for and what
//! to do when a day fails.
//!
//! # Wire format
//!
//! [`PrivatBankSource`] issues `GET {base_url}?date=DD.MM.YYYY` and expects:
//!
//! ```json
//! {
//!   "date": "01.12.2014",
//!   "exchangeRate": [
//!     {"currency": "EUR", "saleRate": 19.2, "purchaseRate": 15.5,
//!      "saleRateNB": 18.79, "purchaseRateNB": 18.79}
//!   ]
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{CurrencyCode, DailyRates, Quote, ReportDate};

pub const PRIVATBANK_ARCHIVE_URL: &str = "https://api.privatbank.ua/p24api/exchange_rates";

/// Source-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Transport failure or a status other than 200.
    Unavailable,
    /// The request did not finish within its time budget.
    Timeout,
    /// The upstream answered but the body could not be understood.
    InvalidResponse,
}

/// Structured error for a single rate-source fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidResponse,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Daily exchange-rate provider.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// connection on the hub.
pub trait RateSource: Send + Sync {
    /// Fetch every currency record published for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the upstream is unreachable, answers
    /// with a non-success status, times out, or returns a body that does
    /// not parse.
    fn daily_rates<'a>(
        &'a self,
        date: ReportDate,
    ) -> Pin<Box<dyn Future<Output = Result<DailyRates, SourceError>> + Send + 'a>>;
}

/// PrivatBank public archive client.
#[derive(Clone)]
pub struct PrivatBankSource {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for PrivatBankSource {
    fn default() -> Self {
        Self {
            http_client: Arc::new(ReqwestHttpClient::default()),
            base_url: String::from(PRIVATBANK_ARCHIVE_URL),
            timeout_ms: 5_000,
        }
    }
}

impl PrivatBankSource {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn endpoint(&self, date: ReportDate) -> String {
        format!(
            "{}?date={}",
            self.base_url,
            urlencoding::encode(&date.to_string())
        )
    }

    async fn fetch(&self, date: ReportDate) -> Result<DailyRates, SourceError> {
        let request = HttpRequest::get(self.endpoint(date))
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.timed_out() {
                SourceError::timeout(format!("privatbank request for {date}: {}", error.message()))
            } else {
                SourceError::unavailable(format!(
                    "privatbank transport error for {date}: {}",
                    error.message()
                ))
            }
        })?;

        if !response.is_ok() {
            return Err(SourceError::unavailable(format!(
                "privatbank returned status {} for {date}",
                response.status
            )));
        }

        parse_archive_response(&response.body)
    }
}

impl RateSource for PrivatBankSource {
    fn daily_rates<'a>(
        &'a self,
        date: ReportDate,
    ) -> Pin<Box<dyn Future<Output = Result<DailyRates, SourceError>> + Send + 'a>> {
        Box::pin(self.fetch(date))
    }
}

/// Parse a PrivatBank archive body into [`DailyRates`].
///
/// Records without a currency code are skipped. Records without commercial
/// rates fall back to the national bank rates; records with neither are
/// skipped.
pub fn parse_archive_response(body: &str) -> Result<DailyRates, SourceError> {
    let payload: ArchivePayload = serde_json::from_str(body).map_err(|e| {
        SourceError::invalid_response(format!("failed to parse privatbank response: {e}"))
    })?;

    let date = ReportDate::parse(&payload.date)
        .map_err(|e| SourceError::invalid_response(e.to_string()))?;

    let quotes = payload
        .exchange_rate
        .into_iter()
        .filter_map(|record| {
            let raw_code = record.currency?;
            let currency = match CurrencyCode::parse(&raw_code) {
                Ok(code) => code,
                Err(error) => {
                    debug!(%date, %error, "skipping record with unusable currency code");
                    return None;
                }
            };
            let sale = record.sale_rate.or(record.sale_rate_nb)?;
            let purchase = record.purchase_rate.or(record.purchase_rate_nb)?;
            Quote::new(currency, sale, purchase).ok()
        })
        .collect();

    Ok(DailyRates { date, quotes })
}

#[derive(Debug, Deserialize)]
struct ArchivePayload {
    date: String,
    #[serde(rename = "exchangeRate", default)]
    exchange_rate: Vec<ArchiveRecord>,
}

#[derive(Debug, Deserialize)]
struct ArchiveRecord {
    #[serde(default)]
    currency: Option<String>,
    #[serde(rename = "saleRate", default)]
    sale_rate: Option<f64>,
    #[serde(rename = "purchaseRate", default)]
    purchase_rate: Option<f64>,
    #[serde(rename = "saleRateNB", default)]
    sale_rate_nb: Option<f64>,
    #[serde(rename = "purchaseRateNB", default)]
    purchase_rate_nb: Option<f64>,
}
