//! Derivation of DASH prices from BTC-denominated quotes.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashrates_common::{Currency, CurrencySelection};
use tracing::{debug, info, instrument, warn};

use crate::error::{FxError, FxResult};
use crate::provider::{RateTableSource, ScalarRateSource};

/// Price of 1 DASH in each requested currency.
pub type ConvertedPrices = BTreeMap<Currency, f64>;

/// Configuration for the aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Currency priced by its own provider instead of through BTC.
    pub direct_currency: Currency,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            direct_currency: Currency::ves(),
        }
    }
}

/// Outcome of the primary DASH/BTC quote.
#[derive(Debug)]
enum PrimaryQuote {
    Quoted(f64),
    /// Upstream answered, but with a zero price.
    Zero,
    Failed(FxError),
}

impl From<FxResult<f64>> for PrimaryQuote {
    fn from(result: FxResult<f64>) -> Self {
        match result {
            Ok(rate) if rate > 0.0 => PrimaryQuote::Quoted(rate),
            Ok(_) => PrimaryQuote::Zero,
            Err(e) => PrimaryQuote::Failed(e),
        }
    }
}

/// Combines the BTC rate table with the DASH/BTC rate.
pub struct RateAggregator {
    btc_rates: Arc<dyn RateTableSource>,
    primary: Arc<dyn ScalarRateSource>,
    fallback: Arc<dyn ScalarRateSource>,
    direct: Arc<dyn ScalarRateSource>,
    config: AggregatorConfig,
}

impl RateAggregator {
    /// Create a new aggregator.
    ///
    /// `primary` and `fallback` quote DASH in BTC; `direct` quotes DASH in
    /// `config.direct_currency`.
    pub fn new(
        btc_rates: Arc<dyn RateTableSource>,
        primary: Arc<dyn ScalarRateSource>,
        fallback: Arc<dyn ScalarRateSource>,
        direct: Arc<dyn ScalarRateSource>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            btc_rates,
            primary,
            fallback,
            direct,
            config,
        }
    }

    /// Price 1 DASH in every selected currency.
    ///
    /// Any failed dependency fails the whole conversion. This includes a
    /// currency absent from the BTC rate table: a `LIST` selection fails
    /// with [`FxError::RateNotAvailable`] when the table lacks even one
    /// supported code, rather than reporting that code at zero.
    #[instrument(skip(self, selection), fields(currencies = selection.len(), all = selection.is_all()))]
    pub async fn convert(&self, selection: &CurrencySelection) -> FxResult<ConvertedPrices> {
        let (btc_rates, dash_btc) =
            tokio::try_join!(self.btc_rates.fetch_table(), self.dash_btc_rate())?;

        let mut prices = ConvertedPrices::new();
        let mut direct_rate = None;

        for currency in selection.currencies() {
            let price = if *currency == self.config.direct_currency {
                match direct_rate {
                    Some(rate) => rate,
                    None => {
                        let rate = self.direct_rate().await?;
                        direct_rate = Some(rate);
                        rate
                    }
                }
            } else {
                let btc_price = btc_rates
                    .get(currency)
                    .copied()
                    .ok_or_else(|| FxError::RateNotAvailable(currency.clone()))?;
                btc_price * dash_btc
            };
            prices.insert(currency.clone(), price);
        }

        info!(count = prices.len(), dash_btc, "Converted rates");
        Ok(prices)
    }

    /// DASH price in BTC, falling back when the primary is zero or failing.
    #[instrument(skip(self))]
    pub async fn dash_btc_rate(&self) -> FxResult<f64> {
        match PrimaryQuote::from(self.primary.fetch_rate().await) {
            PrimaryQuote::Quoted(rate) => {
                debug!(provider = self.primary.name(), rate, "Using primary quote");
                return Ok(rate);
            }
            PrimaryQuote::Zero => warn!(
                primary = self.primary.name(),
                fallback = self.fallback.name(),
                "Primary quote is zero, using fallback"
            ),
            PrimaryQuote::Failed(e) => warn!(
                primary = self.primary.name(),
                fallback = self.fallback.name(),
                error = %e,
                "Primary quote failed, using fallback"
            ),
        }

        let rate = self.fallback.fetch_rate().await?;
        positive(self.fallback.as_ref(), rate)
    }

    async fn direct_rate(&self) -> FxResult<f64> {
        let rate = self.direct.fetch_rate().await?;
        positive(self.direct.as_ref(), rate)
    }
}

fn positive(source: &dyn ScalarRateSource, rate: f64) -> FxResult<f64> {
    if rate > 0.0 {
        Ok(rate)
    } else {
        Err(FxError::DegenerateRate {
            provider: source.name().to_string(),
            rate,
        })
    }
}
