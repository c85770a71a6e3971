//! Cross-exchange DASH/BTC average from CryptoCompare.

use async_trait::async_trait;
use serde::Deserialize;

use super::{checked_rate, parse_decimal, ProviderContext};
use crate::error::{FxResult, UpstreamCause};
use crate::provider::ScalarRateSource;

pub const PROVIDER: &str = "cryptocompare";

pub const DEFAULT_URL: &str = "https://min-api.cryptocompare.com/data/generateAvg?fsym=DASH&tsym=BTC&e=Binance,Kraken,Poloniex,Bitfinex";

pub const PATH_AND_QUERY: &str =
    "/data/generateAvg?fsym=DASH&tsym=BTC&e=Binance,Kraken,Poloniex,Bitfinex";

#[derive(Debug, Deserialize)]
struct AverageResponse {
    #[serde(rename = "RAW")]
    raw: RawAverage,
}

#[derive(Debug, Deserialize)]
struct RawAverage {
    #[serde(rename = "PRICE")]
    price: PriceField,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceField {
    Number(f64),
    /// Display form with a leading currency symbol, e.g. `"Ƀ 0.01234"`.
    Symbol(String),
}

/// Average DASH price in BTC across Binance, Kraken, Poloniex and Bitfinex.
pub struct CryptocompareAverage {
    ctx: ProviderContext,
    url: String,
}

impl CryptocompareAverage {
    pub fn new(ctx: ProviderContext, url: impl Into<String>) -> Self {
        Self {
            ctx,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ScalarRateSource for CryptocompareAverage {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_rate(&self) -> FxResult<f64> {
        self.ctx
            .fetch_through(&self.ctx.caches().scalars, PROVIDER, &self.url, parse_average)
            .await
    }
}

fn parse_average(body: AverageResponse) -> Result<f64, UpstreamCause> {
    let rate = match body.raw.price {
        PriceField::Number(value) => value,
        PriceField::Symbol(text) => parse_decimal(strip_symbol(&text))?,
    };
    checked_rate(rate)
}

/// Drop the currency symbol in front of the number, keeping any sign.
fn strip_symbol(text: &str) -> &str {
    text.trim_start_matches(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
}
