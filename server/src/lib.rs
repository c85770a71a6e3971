//! Dash Rates Server
//!
//! HTTP API pricing 1 DASH in fiat and crypto currencies, derived from
//! cached upstream exchange rates.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, SharedState};
