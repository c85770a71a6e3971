//! DASH/BTC average over recent Poloniex trades.

use async_trait::async_trait;
use serde::Deserialize;

use super::{checked_rate, ProviderContext, RawNumber};
use crate::error::{FxResult, UpstreamCause};
use crate::provider::ScalarRateSource;

pub const PROVIDER: &str = "poloniex";

pub const DEFAULT_URL: &str =
    "https://poloniex.com/public?command=returnTradeHistory&currencyPair=BTC_DASH";

pub const PATH_AND_QUERY: &str = "/public?command=returnTradeHistory&currencyPair=BTC_DASH";

#[derive(Debug, Deserialize)]
struct Trade {
    #[serde(default)]
    rate: Option<RawNumber>,
}

/// Mean trade rate over the records the trade-history endpoint returns.
///
/// The endpoint decides how many recent trades it sends; all of them count.
pub struct PoloniexTradeAverage {
    ctx: ProviderContext,
    url: String,
}

impl PoloniexTradeAverage {
    pub fn new(ctx: ProviderContext, url: impl Into<String>) -> Self {
        Self {
            ctx,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ScalarRateSource for PoloniexTradeAverage {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_rate(&self) -> FxResult<f64> {
        self.ctx
            .fetch_through(&self.ctx.caches().scalars, PROVIDER, &self.url, average_rate)
            .await
    }
}

fn average_rate(trades: Vec<Trade>) -> Result<f64, UpstreamCause> {
    let rates = trades
        .iter()
        .filter_map(|trade| trade.rate.as_ref())
        .map(RawNumber::to_f64)
        .collect::<Result<Vec<_>, _>>()?;

    if rates.is_empty() {
        return Err(UpstreamCause::Payload("no trades returned".to_string()));
    }

    checked_rate(rates.iter().sum::<f64>() / rates.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<f64, UpstreamCause> {
        average_rate(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_average_of_string_rates() {
        let json = r#"[
            {"globalTradeID": 1, "type": "buy", "rate": "0.010", "amount": "1.0"},
            {"globalTradeID": 2, "type": "sell", "rate": "0.020", "amount": "2.0"},
            {"globalTradeID": 3, "type": "buy", "rate": "0.030", "amount": "0.5"}
        ]"#;
        let rate = parse(json).unwrap();
        assert!((rate - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_numeric_rates_and_records_without_rate() {
        let rate = parse(r#"[{"rate": 0.01}, {"amount": "3"}, {"rate": 0.03}]"#).unwrap();
        assert!((rate - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_no_trades_is_an_error_not_zero() {
        assert!(matches!(parse("[]"), Err(UpstreamCause::Payload(_))));
    }

    #[test]
    fn test_unparseable_rate_is_rejected() {
        assert!(parse(r#"[{"rate": "abc"}]"#).is_err());
    }
}
