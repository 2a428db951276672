//! Command-line arguments for the `ratecast` hub binary.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--bind` | `127.0.0.1:5501` | Listen address |
//! | `--rate-source-url` | PrivatBank archive | Upstream base URL |
//! | `--timeout-ms` | `5000` | Per-date request budget |
//! | `--currency`, `-c` | none | Extra tracked currency (repeatable) |
//! | `--outbound-buffer` | `64` | Queued messages per peer |
//! | `--log-level` | `info` | Filter when `RUST_LOG` is unset |

use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;
use ratecast_hub::config::{DEFAULT_OUTBOUND_BUFFER, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_MS};
use ratecast_hub::HubConfig;

/// Chat hub that answers `exchange <days>` with recent exchange rates.
#[derive(Debug, Parser)]
#[command(name = "ratecast", author, version, about)]
pub struct Cli {
    /// Address to accept WebSocket connections on.
    #[arg(long, default_value_t = SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)))]
    pub bind: SocketAddr,

    /// Base URL of the daily exchange-rate archive.
    #[arg(long, default_value = ratecast_core::PRIVATBANK_ARCHIVE_URL)]
    pub rate_source_url: String,

    /// Time budget for each per-date upstream request, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Additional currency to track besides EUR and USD.
    #[arg(long = "currency", short = 'c')]
    pub currencies: Vec<String>,

    /// Messages buffered per peer before broadcasts wait for it.
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_BUFFER)]
    pub outbound_buffer: usize,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn to_config(&self) -> HubConfig {
        HubConfig {
            bind: self.bind,
            rate_source_url: self.rate_source_url.clone(),
            request_timeout_ms: self.timeout_ms,
            extra_currencies: self.currencies.clone(),
            outbound_buffer: self.outbound_buffer,
        }
    }
}
