//! Upstream provider clients.
//!
//! Every client follows the same pattern: check the cache, call upstream on a
//! miss, parse the provider-specific payload, cache on success. Failures are
//! reported to the [`FailureNotifier`] and never cached.

pub mod bitcoinaverage;
pub mod cryptocompare;
pub mod dashcasa;
pub mod poloniex;

pub use bitcoinaverage::{BitcoinaverageGlobalTicker, BitcoinaverageTicker};
pub use cryptocompare::CryptocompareAverage;
pub use dashcasa::DashCasaRate;
pub use poloniex::PoloniexTradeAverage;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, info};

use crate::cache::{SharedRateCaches, TtlCache};
use crate::error::{FxError, FxResult, UpstreamCause};
use crate::notifier::FailureNotifier;
use crate::upstream::UpstreamClient;

/// URLs of the upstream APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoints {
    pub cryptocompare_average: String,
    pub poloniex_trade_history: String,
    pub bitcoinaverage_ticker: String,
    pub bitcoinaverage_global_ticker: String,
    pub dashcasa_ves: String,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            cryptocompare_average: cryptocompare::DEFAULT_URL.to_string(),
            poloniex_trade_history: poloniex::DEFAULT_URL.to_string(),
            bitcoinaverage_ticker: bitcoinaverage::TICKER_URL.to_string(),
            bitcoinaverage_global_ticker: bitcoinaverage::GLOBAL_TICKER_URL.to_string(),
            dashcasa_ves: dashcasa::DEFAULT_URL.to_string(),
        }
    }
}

impl UpstreamEndpoints {
    /// Point every provider at paths under one base URL, e.g. a local mirror.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            cryptocompare_average: format!("{base}{}", cryptocompare::PATH_AND_QUERY),
            poloniex_trade_history: format!("{base}{}", poloniex::PATH_AND_QUERY),
            bitcoinaverage_ticker: format!("{base}{}", bitcoinaverage::TICKER_PATH),
            bitcoinaverage_global_ticker: format!(
                "{base}{}",
                bitcoinaverage::GLOBAL_TICKER_PATH_AND_QUERY
            ),
            dashcasa_ves: format!("{base}{}", dashcasa::PATH_AND_QUERY),
        }
    }
}

/// Shared plumbing handed to every provider client.
#[derive(Clone)]
pub struct ProviderContext {
    upstream: UpstreamClient,
    caches: SharedRateCaches,
    notifier: Arc<dyn FailureNotifier>,
}

impl ProviderContext {
    pub fn new(
        upstream: UpstreamClient,
        caches: SharedRateCaches,
        notifier: Arc<dyn FailureNotifier>,
    ) -> Self {
        Self {
            upstream,
            caches,
            notifier,
        }
    }

    pub fn caches(&self) -> &SharedRateCaches {
        &self.caches
    }

    /// Serve `url` from `cache`, fetching and parsing it with `extract` on a miss.
    pub(crate) async fn fetch_through<V, T, F>(
        &self,
        cache: &TtlCache<V>,
        provider: &'static str,
        url: &str,
        extract: F,
    ) -> FxResult<V>
    where
        V: Clone,
        T: DeserializeOwned,
        F: FnOnce(T) -> Result<V, UpstreamCause>,
    {
        cache
            .get_or_fetch(url, || async {
                info!(provider, url, "Recaching");
                let result = match self.upstream.get_json::<T>(url).await {
                    Ok(body) => extract(body),
                    Err(cause) => Err(cause),
                };
                result.map_err(|cause| {
                    let err = FxError::upstream(provider, cause);
                    error!(provider, error = %err, "Upstream fetch failed");
                    self.notifier.notify(&err);
                    err
                })
            })
            .await
    }
}

/// A numeric field some APIs send as a JSON number and others as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    pub(crate) fn to_f64(&self) -> Result<f64, UpstreamCause> {
        match self {
            RawNumber::Number(value) => Ok(*value),
            RawNumber::Text(text) => parse_decimal(text),
        }
    }
}

pub(crate) fn parse_decimal(text: &str) -> Result<f64, UpstreamCause> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| UpstreamCause::Payload(format!("not a number: {text:?}")))
}

/// Reject values that cannot be a market price. Zero passes; callers decide.
pub(crate) fn checked_rate(rate: f64) -> Result<f64, UpstreamCause> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(UpstreamCause::Payload(format!("degenerate rate {rate}")));
    }
    Ok(rate)
}
