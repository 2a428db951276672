use std::net::SocketAddr;

use thiserror::Error;

/// Hub-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Validation(#[from] ratecast_core::ValidationError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

impl HubError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Bind { .. } => 10,
            Self::Serve(_) => 11,
        }
    }
}
