//! # Ratecast Hub
//!
//! WebSocket chat room where any peer can ask for recent exchange rates and
//! the answer is broadcast to everyone.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`HubConfig`] and hub construction |
//! | [`error`] | [`HubError`] with process exit codes |
//! | [`hub`] | Upgrade handler, per-connection loop, dispatch |
//! | [`registry`] | Live peer set and broadcast |
//!
//! ## Protocol
//!
//! Every text frame is either chat, reflected to the room as
//! `"<name>: <text>"`, or `exchange <N>`, answered with a report covering the
//! last `N` days (at most 10), newest first.
//!
//! ```rust,ignore
//! use ratecast_hub::HubConfig;
//!
//! let config = HubConfig::default();
//! let hub = config.build_hub()?;
//! let listener = tokio::net::TcpListener::bind(config.bind).await?;
//! hub.serve(listener, std::future::pending()).await?;
//! ```

pub mod config;
pub mod error;
pub mod hub;
pub mod registry;

pub use config::HubConfig;
pub use error::HubError;
pub use hub::{Hub, EMPTY_REPORT_NOTICE};
pub use registry::{Outbound, Peer, PeerId, PeerState, Registry};
