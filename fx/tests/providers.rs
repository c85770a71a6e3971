//! Provider clients against a mocked upstream.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use dashrates_common::Currency;
use dashrates_fx::providers::{
    BitcoinaverageGlobalTicker, BitcoinaverageTicker, CryptocompareAverage, DashCasaRate,
    PoloniexTradeAverage,
};
use dashrates_fx::{
    FailureNotifier, FxError, NoopNotifier, ProviderContext, RateCaches, RateTableSource,
    RecordingNotifier, ScalarRateSource, SharedRateCaches, UpstreamCause, UpstreamClient,
    UpstreamEndpoints, WebhookNotifier,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn context(caches: SharedRateCaches, notifier: Arc<dyn FailureNotifier>) -> ProviderContext {
    ProviderContext::new(
        UpstreamClient::from_client(reqwest::Client::new()),
        caches,
        notifier,
    )
}

fn default_context() -> ProviderContext {
    context(Arc::new(RateCaches::default()), Arc::new(NoopNotifier))
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cryptocompare_is_cached_within_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/generateAvg"))
        .and(query_param("fsym", "DASH"))
        .and(query_param("tsym", "BTC"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"RAW": {"PRICE": 0.0123}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let endpoints = UpstreamEndpoints::with_base_url(&server.uri());
    let provider = CryptocompareAverage::new(default_context(), endpoints.cryptocompare_average);

    assert_eq!(provider.fetch_rate().await.unwrap(), 0.0123);
    assert_eq!(provider.fetch_rate().await.unwrap(), 0.0123);
}

#[tokio::test]
async fn test_poloniex_averages_trades() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/public",
        json!([
            {"rate": "0.010", "amount": "1"},
            {"rate": "0.030", "amount": "2"}
        ]),
        1,
    )
    .await;

    let endpoints = UpstreamEndpoints::with_base_url(&server.uri());
    let provider = PoloniexTradeAverage::new(default_context(), endpoints.poloniex_trade_history);

    let rate = provider.fetch_rate().await.unwrap();
    assert!((rate - 0.02).abs() < 1e-12);
}

#[tokio::test]
async fn test_poloniex_empty_history_fails_and_notifies() {
    let server = MockServer::start().await;
    // Failures are not cached, so both calls reach upstream.
    mount_json(&server, "/public", json!([]), 2).await;

    let caches: SharedRateCaches = Arc::new(RateCaches::default());
    let notifier = Arc::new(RecordingNotifier::new());
    let endpoints = UpstreamEndpoints::with_base_url(&server.uri());
    let provider = PoloniexTradeAverage::new(
        context(caches.clone(), notifier.clone()),
        endpoints.poloniex_trade_history,
    );

    for _ in 0..2 {
        let err = provider.fetch_rate().await.unwrap_err();
        assert!(matches!(
            err,
            FxError::Upstream {
                provider: "poloniex",
                cause: UpstreamCause::Payload(_)
            }
        ));
    }

    assert!(caches.scalars.is_empty());
    assert_eq!(notifier.messages().len(), 2);
    assert!(notifier.messages()[0].contains("poloniex"));
}

#[tokio::test]
async fn test_error_status_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_json(&server, "/api/", json!({"dashrate": 5000000.0}), 1).await;

    let notifier = Arc::new(RecordingNotifier::new());
    let endpoints = UpstreamEndpoints::with_base_url(&server.uri());
    let provider = DashCasaRate::new(
        context(Arc::new(RateCaches::default()), notifier.clone()),
        endpoints.dashcasa_ves,
    );

    let err = provider.fetch_rate().await.unwrap_err();
    assert!(matches!(
        err,
        FxError::Upstream {
            cause: UpstreamCause::Status(status),
            ..
        } if status.as_u16() == 500
    ));
    assert_eq!(notifier.messages().len(), 1);

    assert_eq!(provider.fetch_rate().await.unwrap(), 5000000.0);
}

#[tokio::test]
async fn test_malformed_body_is_a_payload_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indices/crypto/ticker/DASHBTC"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let endpoints = UpstreamEndpoints::with_base_url(&server.uri());
    let provider = BitcoinaverageTicker::new(default_context(), endpoints.bitcoinaverage_ticker);

    assert!(matches!(
        provider.fetch_rate().await,
        Err(FxError::Upstream {
            cause: UpstreamCause::Payload(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_global_ticker_table() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/indices/global/ticker/short",
        json!({
            "BTCUSD": {"last": 50000.0},
            "BTCEUR": {"last": 46000.0}
        }),
        1,
    )
    .await;

    let endpoints = UpstreamEndpoints::with_base_url(&server.uri());
    let provider =
        BitcoinaverageGlobalTicker::new(default_context(), endpoints.bitcoinaverage_global_ticker);

    let first = provider.fetch_table().await.unwrap();
    let second = provider.fetch_table().await.unwrap();

    assert_eq!(first.get(&Currency::usd()), Some(&50000.0));
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_entry_refreshes_after_ttl() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/indices/crypto/ticker/DASHBTC",
        json!({"last": 0.0123}),
        2,
    )
    .await;

    let caches: SharedRateCaches = Arc::new(RateCaches::new(Duration::milliseconds(50)));
    let endpoints = UpstreamEndpoints::with_base_url(&server.uri());
    let provider = BitcoinaverageTicker::new(
        context(caches, Arc::new(NoopNotifier)),
        endpoints.bitcoinaverage_ticker,
    );

    provider.fetch_rate().await.unwrap();
    provider.fetch_rate().await.unwrap();
    tokio::time::sleep(StdDuration::from_millis(80)).await;
    provider.fetch_rate().await.unwrap();
}

#[tokio::test]
async fn test_providers_sharing_a_cache_keep_separate_keys() {
    let server = MockServer::start().await;
    mount_json(&server, "/indices/crypto/ticker/DASHBTC", json!({"last": 0.02}), 1).await;
    mount_json(&server, "/api/", json!({"dashrate": "7000000"}), 1).await;

    let ctx = default_context();
    let endpoints = UpstreamEndpoints::with_base_url(&server.uri());
    let ticker = BitcoinaverageTicker::new(ctx.clone(), endpoints.bitcoinaverage_ticker);
    let casa = DashCasaRate::new(ctx.clone(), endpoints.dashcasa_ves);

    assert_eq!(ticker.fetch_rate().await.unwrap(), 0.02);
    assert_eq!(casa.fetch_rate().await.unwrap(), 7000000.0);
    assert_eq!(ctx.caches().scalars.len(), 2);
}

#[tokio::test]
async fn test_webhook_send_posts_embed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_json(json!({
            "username": "Dash Rates API",
            "embeds": [{"title": "ERROR", "description": "boom", "color": 15340307}]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(reqwest::Client::new(), format!("{}/hook", server.uri()));
    notifier.send("boom").await.unwrap();
}

#[tokio::test]
async fn test_webhook_notify_delivers_in_background() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(reqwest::Client::new(), format!("{}/hook", server.uri()));
    notifier.notify(&FxError::payload("poloniex", "no trades returned"));

    let mut delivered = Vec::new();
    for _ in 0..50 {
        delivered = server.received_requests().await.unwrap_or_default();
        if !delivered.is_empty() {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }

    assert_eq!(delivered.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&delivered[0].body).unwrap();
    assert_eq!(body["username"], "Dash Rates API");
    assert!(body["embeds"][0]["description"]
        .as_str()
        .unwrap()
        .contains("poloniex"));
}

#[tokio::test]
async fn test_webhook_failure_does_not_surface() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(reqwest::Client::new(), format!("{}/hook", server.uri()));
    assert!(notifier.send("boom").await.is_err());

    // Fire-and-forget path returns immediately regardless.
    notifier.notify(&FxError::payload("dashcasa", "boom"));
}
