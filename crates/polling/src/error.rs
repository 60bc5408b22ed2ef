use std::{error::Error as StdError, time::Duration};

/// Crate-wide result type for polling operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote fetch failed (network, remote-side or decoding error).
    #[error("fetch failed: {context}: {source}")]
    Fetch {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The remote API asked the client to slow down.
    #[error("rate limited by remote api, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// The fetch was abandoned because shutdown was requested.
    #[error("fetch cancelled")]
    Cancelled,

    /// An application handler returned an error.
    #[error("handler failed: {0:#}")]
    Handler(#[source] anyhow::Error),

    /// The start-up handshake with the remote API failed.
    #[error("startup handshake failed: {context}: {source}")]
    Startup {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("invalid polling config: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    #[must_use]
    pub fn fetch(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Fetch {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn startup(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Startup {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn invalid_config(message: impl std::fmt::Display) -> Self {
        Self::InvalidConfig {
            message: message.to_string(),
        }
    }

    /// Whether the poller should retry after this error.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::RateLimited { .. } | Self::Cancelled
        )
    }

    /// Short, stable name of the error kind, used as a metric label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::RateLimited { .. } => "rate_limited",
            Self::Cancelled => "cancelled",
            Self::Handler(_) => "handler",
            Self::Startup { .. } => "startup",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }
}
