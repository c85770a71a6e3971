//! Shared application state.

use std::sync::Arc;

use dashrates_fx::providers::{
    BitcoinaverageGlobalTicker, BitcoinaverageTicker, CryptocompareAverage, DashCasaRate,
    PoloniexTradeAverage,
};
use dashrates_fx::{
    notifier_for, AggregatorConfig, ProviderContext, RateAggregator, RateCaches, RateTableSource,
    ScalarRateSource, SharedRateCaches, UpstreamClient, UpstreamEndpoints,
};
use tracing::info;

use crate::config::ServerConfig;

/// Everything the route handlers need, built once at startup.
pub struct AppState {
    /// Host advertised by the index route.
    pub host: String,
    pub caches: SharedRateCaches,
    pub cryptocompare: Arc<dyn ScalarRateSource>,
    pub poloniex: Arc<dyn ScalarRateSource>,
    pub bitcoinaverage: Arc<dyn ScalarRateSource>,
    pub aggregator: RateAggregator,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build the providers against the public upstream APIs.
    pub fn new(config: &ServerConfig) -> Result<Self, reqwest::Error> {
        Self::with_endpoints(config, UpstreamEndpoints::default())
    }

    /// Build the providers against the given upstream URLs.
    pub fn with_endpoints(
        config: &ServerConfig,
        endpoints: UpstreamEndpoints,
    ) -> Result<Self, reqwest::Error> {
        let upstream = UpstreamClient::new(&config.upstream_config())?;
        let notifier = notifier_for(upstream.http(), config.webhook_url.as_deref());
        let caches: SharedRateCaches = Arc::new(RateCaches::new(config.cache_ttl_chrono()));
        let ctx = ProviderContext::new(upstream, caches.clone(), notifier);

        info!(
            webhook = config.webhook_url.is_some(),
            ttl_secs = config.cache_ttl.as_secs(),
            "Providers configured"
        );

        let cryptocompare: Arc<dyn ScalarRateSource> = Arc::new(CryptocompareAverage::new(
            ctx.clone(),
            endpoints.cryptocompare_average,
        ));
        let poloniex: Arc<dyn ScalarRateSource> = Arc::new(PoloniexTradeAverage::new(
            ctx.clone(),
            endpoints.poloniex_trade_history,
        ));
        let bitcoinaverage: Arc<dyn ScalarRateSource> = Arc::new(BitcoinaverageTicker::new(
            ctx.clone(),
            endpoints.bitcoinaverage_ticker,
        ));
        let btc_rates: Arc<dyn RateTableSource> = Arc::new(BitcoinaverageGlobalTicker::new(
            ctx.clone(),
            endpoints.bitcoinaverage_global_ticker,
        ));
        let dashcasa: Arc<dyn ScalarRateSource> =
            Arc::new(DashCasaRate::new(ctx, endpoints.dashcasa_ves));

        Ok(Self::from_sources(
            config.host.clone(),
            caches,
            cryptocompare,
            poloniex,
            bitcoinaverage,
            btc_rates,
            dashcasa,
        ))
    }

    /// Assemble state from already built sources.
    ///
    /// The primary DASH/BTC quote is `cryptocompare`, with `bitcoinaverage`
    /// as its fallback.
    pub fn from_sources(
        host: String,
        caches: SharedRateCaches,
        cryptocompare: Arc<dyn ScalarRateSource>,
        poloniex: Arc<dyn ScalarRateSource>,
        bitcoinaverage: Arc<dyn ScalarRateSource>,
        btc_rates: Arc<dyn RateTableSource>,
        dashcasa: Arc<dyn ScalarRateSource>,
    ) -> Self {
        let aggregator = RateAggregator::new(
            btc_rates,
            cryptocompare.clone(),
            bitcoinaverage.clone(),
            dashcasa,
            AggregatorConfig::default(),
        );

        Self {
            host,
            caches,
            cryptocompare,
            poloniex,
            bitcoinaverage,
            aggregator,
        }
    }
}
