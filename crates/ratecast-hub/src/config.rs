//! Hub configuration assembled before the server starts.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use ratecast_core::{Aggregator, InterestSet, PrivatBankSource, PRIVATBANK_ARCHIVE_URL};

use crate::error::HubError;
use crate::hub::Hub;

pub const DEFAULT_PORT: u16 = 5501;
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Runtime settings for one hub instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub bind: SocketAddr,
    pub rate_source_url: String,
    /// Budget for each per-date upstream request.
    pub request_timeout_ms: u64,
    /// Currency codes tracked in addition to EUR and USD.
    pub extra_currencies: Vec<String>,
    /// Messages queued per peer before broadcasts wait on that peer.
    pub outbound_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            rate_source_url: String::from(PRIVATBANK_ARCHIVE_URL),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            extra_currencies: Vec::new(),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}

impl HubConfig {
    pub fn validate(&self) -> Result<(), HubError> {
        if self.rate_source_url.trim().is_empty() {
            return Err(HubError::Config(String::from(
                "rate source url must not be empty",
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(HubError::Config(String::from(
                "request timeout must be greater than zero",
            )));
        }
        if self.outbound_buffer == 0 {
            return Err(HubError::Config(String::from(
                "outbound buffer must be greater than zero",
            )));
        }
        self.interest_set()?;
        Ok(())
    }

    /// Default interest set extended with the configured codes.
    pub fn interest_set(&self) -> Result<InterestSet, HubError> {
        Ok(InterestSet::with_extra(&self.extra_currencies)?)
    }

    /// Build a hub backed by the PrivatBank archive client.
    pub fn build_hub(&self) -> Result<Hub, HubError> {
        self.validate()?;

        let source = PrivatBankSource::default()
            .with_base_url(self.rate_source_url.trim())
            .with_timeout_ms(self.request_timeout_ms);
        let aggregator = Aggregator::new(Arc::new(source), self.interest_set()?)
            .with_fetch_timeout(Duration::from_millis(self.request_timeout_ms));

        Ok(Hub::new(aggregator).with_outbound_buffer(self.outbound_buffer))
    }
}
