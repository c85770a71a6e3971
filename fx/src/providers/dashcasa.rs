//! Direct DASH/VES quote from dash.casa.
//!
//! General providers lack a reliable bolivar quote, so VES is priced here
//! instead of being derived through BTC.

use async_trait::async_trait;
use serde::Deserialize;

use super::{checked_rate, ProviderContext, RawNumber};
use crate::error::{FxResult, UpstreamCause};
use crate::provider::ScalarRateSource;

pub const PROVIDER: &str = "dashcasa";

pub const DEFAULT_URL: &str = "http://dash.casa/api/?cur=VES";

pub const PATH_AND_QUERY: &str = "/api/?cur=VES";

#[derive(Debug, Deserialize)]
struct DashCasaResponse {
    dashrate: RawNumber,
}

/// Price of 1 DASH in VES.
pub struct DashCasaRate {
    ctx: ProviderContext,
    url: String,
}

impl DashCasaRate {
    pub fn new(ctx: ProviderContext, url: impl Into<String>) -> Self {
        Self {
            ctx,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ScalarRateSource for DashCasaRate {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_rate(&self) -> FxResult<f64> {
        self.ctx
            .fetch_through(&self.ctx.caches().scalars, PROVIDER, &self.url, parse_rate)
            .await
    }
}

fn parse_rate(body: DashCasaResponse) -> Result<f64, UpstreamCause> {
    checked_rate(body.dashrate.to_f64()?)
}
