//! Rate source traits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashrates_common::Currency;

use crate::error::FxResult;

/// Price of 1 BTC in each currency.
pub type RateTable = HashMap<Currency, f64>;

/// A source of a single rate, such as the DASH price in BTC.
#[async_trait]
pub trait ScalarRateSource: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Get the current rate.
    async fn fetch_rate(&self) -> FxResult<f64>;
}

/// A source of BTC prices for many currencies at once.
#[async_trait]
pub trait RateTableSource: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Get the current table.
    async fn fetch_table(&self) -> FxResult<Arc<RateTable>>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockScalarSource, MockTableSource};

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use crate::error::FxError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock scalar source for testing.
    pub struct MockScalarSource {
        name: &'static str,
        rate: Mutex<Option<f64>>,
        calls: AtomicUsize,
    }

    impl MockScalarSource {
        /// A source that always returns `rate`.
        pub fn new(name: &'static str, rate: f64) -> Self {
            Self {
                name,
                rate: Mutex::new(Some(rate)),
                calls: AtomicUsize::new(0),
            }
        }

        /// A source whose every fetch fails.
        pub fn failing(name: &'static str) -> Self {
            Self {
                name,
                rate: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        /// Change the rate returned by later fetches. `None` makes them fail.
        pub fn set_rate(&self, rate: Option<f64>) {
            *self.rate.lock().unwrap_or_else(|e| e.into_inner()) = rate;
        }

        /// Number of fetches so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScalarRateSource for MockScalarSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_rate(&self) -> FxResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rate = *self.rate.lock().unwrap_or_else(|e| e.into_inner());
            rate.ok_or_else(|| FxError::payload(self.name, "mock failure"))
        }
    }

    /// Mock table source for testing.
    pub struct MockTableSource {
        name: &'static str,
        table: Option<Arc<RateTable>>,
        calls: AtomicUsize,
    }

    impl MockTableSource {
        /// A source that always returns the given `(code, btc_price)` pairs.
        pub fn new(name: &'static str, rates: &[(&str, f64)]) -> Self {
            let table = rates
                .iter()
                .map(|(code, rate)| (Currency::new(*code), *rate))
                .collect();
            Self {
                name,
                table: Some(Arc::new(table)),
                calls: AtomicUsize::new(0),
            }
        }

        /// A source whose every fetch fails.
        pub fn failing(name: &'static str) -> Self {
            Self {
                name,
                table: None,
                calls: AtomicUsize::new(0),
            }
        }

        /// Number of fetches so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateTableSource for MockTableSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_table(&self) -> FxResult<Arc<RateTable>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .clone()
                .ok_or_else(|| FxError::payload(self.name, "mock failure"))
        }
    }
}
