//! Dash Rates FX Engine
//!
//! Upstream rate providers and the derivation of DASH prices from them.
//!
//! # Features
//!
//! - Clients for CryptoCompare, Poloniex, BitcoinAverage and dash.casa
//! - Shared TTL caching of upstream responses, with per-key request coalescing
//! - DASH/BTC quote with automatic fallback when the primary source is down
//! - Best-effort failure reporting to a chat webhook
//!
//! # Example
//!
//! ```rust,ignore
//! use dashrates_common::CurrencySelection;
//! use dashrates_fx::RateAggregator;
//!
//! let selection = CurrencySelection::parse("/USD/EUR")?;
//! let prices = aggregator.convert(&selection).await?;
//! println!("1 DASH = {} USD", prices[&Currency::usd()]);
//! ```

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod notifier;
pub mod provider;
pub mod providers;
pub mod upstream;

pub use aggregator::{AggregatorConfig, ConvertedPrices, RateAggregator};
pub use cache::{CacheConfig, CacheStats, RateCaches, SharedRateCaches, TtlCache};
pub use error::{FxError, FxResult, UpstreamCause};
pub use notifier::{notifier_for, FailureNotifier, NoopNotifier, WebhookNotifier};
pub use provider::{RateTable, RateTableSource, ScalarRateSource};
pub use providers::{ProviderContext, UpstreamEndpoints};
pub use upstream::{UpstreamClient, UpstreamConfig};

#[cfg(any(test, feature = "test-utils"))]
pub use notifier::RecordingNotifier;
#[cfg(any(test, feature = "test-utils"))]
pub use provider::{MockScalarSource, MockTableSource};
