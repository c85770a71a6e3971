//! HTTP routes.

use axum::extract::State;
use axum::http::{Method, Uri};
use axum::routing::get;
use axum::{Json, Router};
use dashrates_common::CurrencySelection;
use dashrates_fx::ConvertedPrices;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::SharedState;

/// Service name reported by the index route.
pub const SERVICE_NAME: &str = "Dash Rates API";

const ROUTES: &[&str] = &["/avg", "/poloniex", "/btcaverage", "/{code}[/{code}...]", "/LIST"];

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub host: String,
    pub routes: Vec<String>,
}

/// Build the router with all routes and middleware.
pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/", get(index))
        .route("/avg", get(average))
        .route("/poloniex", get(poloniex))
        .route("/btcaverage", get(btcaverage))
        .route("/*codes", get(convert))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<SharedState>) -> Json<IndexResponse> {
    Json(IndexResponse {
        service: SERVICE_NAME,
        host: state.host.clone(),
        routes: ROUTES
            .iter()
            .map(|route| format!("{}{}", state.host, route))
            .collect(),
    })
}

async fn average(State(state): State<SharedState>) -> Result<Json<f64>, ApiError> {
    Ok(Json(state.cryptocompare.fetch_rate().await?))
}

async fn poloniex(State(state): State<SharedState>) -> Result<Json<f64>, ApiError> {
    Ok(Json(state.poloniex.fetch_rate().await?))
}

async fn btcaverage(State(state): State<SharedState>) -> Result<Json<f64>, ApiError> {
    Ok(Json(state.bitcoinaverage.fetch_rate().await?))
}

/// Price 1 DASH in every currency named by the path.
async fn convert(
    State(state): State<SharedState>,
    uri: Uri,
) -> Result<Json<ConvertedPrices>, ApiError> {
    let selection = CurrencySelection::parse(uri.path())?;
    Ok(Json(state.aggregator.convert(&selection).await?))
}
