//! BitcoinAverage tickers: the DASH/BTC index and the global BTC table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashrates_common::Currency;
use serde::Deserialize;

use super::{checked_rate, ProviderContext, RawNumber};
use crate::error::{FxResult, UpstreamCause};
use crate::provider::{RateTable, RateTableSource, ScalarRateSource};

pub const TICKER_PROVIDER: &str = "bitcoinaverage";

pub const GLOBAL_TICKER_PROVIDER: &str = "bitcoinaverage-global";

pub const TICKER_URL: &str = "https://apiv2.bitcoinaverage.com/indices/crypto/ticker/DASHBTC";

pub const TICKER_PATH: &str = "/indices/crypto/ticker/DASHBTC";

pub const GLOBAL_TICKER_URL: &str =
    "https://apiv2.bitcoinaverage.com/indices/global/ticker/short?crypto=BTC";

pub const GLOBAL_TICKER_PATH_AND_QUERY: &str = "/indices/global/ticker/short?crypto=BTC";

/// Length of the base-asset prefix on global ticker symbols (`BTC` in `BTCUSD`).
const SYMBOL_PREFIX_LEN: usize = 3;

#[derive(Debug, Deserialize)]
struct Ticker {
    #[serde(default)]
    last: Option<RawNumber>,
}

/// Current DASH price in BTC.
pub struct BitcoinaverageTicker {
    ctx: ProviderContext,
    url: String,
}

impl BitcoinaverageTicker {
    pub fn new(ctx: ProviderContext, url: impl Into<String>) -> Self {
        Self {
            ctx,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ScalarRateSource for BitcoinaverageTicker {
    fn name(&self) -> &str {
        TICKER_PROVIDER
    }

    async fn fetch_rate(&self) -> FxResult<f64> {
        self.ctx
            .fetch_through(&self.ctx.caches().scalars, TICKER_PROVIDER, &self.url, parse_last)
            .await
    }
}

/// Price of 1 BTC in every currency BitcoinAverage indexes.
pub struct BitcoinaverageGlobalTicker {
    ctx: ProviderContext,
    url: String,
}

impl BitcoinaverageGlobalTicker {
    pub fn new(ctx: ProviderContext, url: impl Into<String>) -> Self {
        Self {
            ctx,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateTableSource for BitcoinaverageGlobalTicker {
    fn name(&self) -> &str {
        GLOBAL_TICKER_PROVIDER
    }

    async fn fetch_table(&self) -> FxResult<Arc<RateTable>> {
        self.ctx
            .fetch_through(
                &self.ctx.caches().tables,
                GLOBAL_TICKER_PROVIDER,
                &self.url,
                |body: HashMap<String, Ticker>| parse_table(body).map(Arc::new),
            )
            .await
    }
}

fn parse_last(ticker: Ticker) -> Result<f64, UpstreamCause> {
    let last = ticker
        .last
        .ok_or_else(|| UpstreamCause::Payload("ticker has no last price".to_string()))?;
    checked_rate(last.to_f64()?)
}

fn parse_table(symbols: HashMap<String, Ticker>) -> Result<RateTable, UpstreamCause> {
    let mut table = RateTable::with_capacity(symbols.len());

    for (symbol, ticker) in symbols {
        let Some(code) = symbol.get(SYMBOL_PREFIX_LEN..).filter(|code| !code.is_empty()) else {
            continue;
        };
        let Some(last) = ticker.last else {
            continue;
        };
        table.insert(Currency::new(code), checked_rate(last.to_f64()?)?);
    }

    if table.is_empty() {
        return Err(UpstreamCause::Payload("global ticker returned no symbols".to_string()));
    }

    Ok(table)
}
