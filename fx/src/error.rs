//! Rate engine error types.

use std::sync::Arc;

use dashrates_common::Currency;
use thiserror::Error;

/// Why a single upstream call did not produce a usable rate.
///
/// Cheap to clone, so one failed fetch can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, Error)]
pub enum UpstreamCause {
    /// Connection, TLS, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    /// Upstream answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    /// Body could not be parsed or held a degenerate value.
    #[error("unusable payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for UpstreamCause {
    fn from(err: reqwest::Error) -> Self {
        UpstreamCause::Transport(Arc::new(err))
    }
}

/// Errors that can occur while fetching or deriving rates.
#[derive(Debug, Clone, Error)]
pub enum FxError {
    /// An upstream provider call failed.
    #[error("Failed to fetch rate from {provider}: {cause}")]
    Upstream {
        provider: &'static str,
        #[source]
        cause: UpstreamCause,
    },

    /// A provider quoted a non-positive rate where a price is required.
    #[error("{provider} returned a non-positive rate {rate}")]
    DegenerateRate { provider: String, rate: f64 },

    /// The BTC rate table has no entry for the requested currency.
    #[error("Rate not available for {0}")]
    RateNotAvailable(Currency),
}

impl FxError {
    /// Build an upstream error for the given provider.
    pub fn upstream(provider: &'static str, cause: impl Into<UpstreamCause>) -> Self {
        FxError::Upstream {
            provider,
            cause: cause.into(),
        }
    }

    /// Build a payload error for the given provider.
    pub fn payload(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::upstream(provider, UpstreamCause::Payload(reason.into()))
    }

    /// Name of the provider that failed, if the error came from one.
    pub fn provider(&self) -> Option<&str> {
        match self {
            FxError::Upstream { provider, .. } => Some(*provider),
            FxError::DegenerateRate { provider, .. } => Some(provider.as_str()),
            FxError::RateNotAvailable(_) => None,
        }
    }

    /// Get error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::Upstream {
                cause: UpstreamCause::Transport(_),
                ..
            } => "UPSTREAM_TRANSPORT",
            FxError::Upstream {
                cause: UpstreamCause::Status(_),
                ..
            } => "UPSTREAM_STATUS",
            FxError::Upstream {
                cause: UpstreamCause::Payload(_),
                ..
            } => "UPSTREAM_PAYLOAD",
            FxError::DegenerateRate { .. } => "DEGENERATE_RATE",
            FxError::RateNotAvailable(_) => "RATE_NOT_AVAILABLE",
        }
    }
}

/// Result type for rate operations.
pub type FxResult<T> = Result<T, FxError>;
