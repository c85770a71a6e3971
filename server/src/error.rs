//! Mapping of request failures to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dashrates_common::ValidationError;
use dashrates_fx::FxError;
use thiserror::Error;
use tracing::warn;

/// Any failure a route handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad currency selection in the request path.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Rates could not be fetched or derived.
    #[error(transparent)]
    Fx(#[from] FxError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Fx(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(e) => e.error_code(),
            ApiError::Fx(e) => e.error_code(),
        }
    }

    /// Upstream provider behind the failure, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            ApiError::Validation(_) => None,
            ApiError::Fx(e) => e.provider(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(
            status = status.as_u16(),
            code = self.error_code(),
            provider = self.provider().unwrap_or("-"),
            error = %self,
            "Request failed"
        );
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(ValidationError::Malformed).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FxError::payload("poloniex", "no trades returned")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_is_passed_through() {
        let err = ApiError::from(ValidationError::Unsupported("XYZ".to_string()));
        assert_eq!(err.to_string(), "Unsupported currency selection in url");
        assert_eq!(err.error_code(), "UNSUPPORTED_CURRENCY");
        assert_eq!(err.provider(), None);
    }

    #[test]
    fn test_provider_of_upstream_failure() {
        let err = ApiError::from(FxError::payload("poloniex", "no trades returned"));
        assert_eq!(err.provider(), Some("poloniex"));

        let err = ApiError::from(FxError::DegenerateRate {
            provider: "dashcasa".to_string(),
            rate: 0.0,
        });
        assert_eq!(err.provider(), Some("dashcasa"));
    }
}
