//! Best-effort notification of upstream failures.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::FxError;

/// Name the webhook messages are posted under.
pub const WEBHOOK_USERNAME: &str = "Dash Rates API";

/// Embed colour for error messages.
pub const ERROR_COLOR: u32 = 15340307;

/// Receives provider failures. Implementations must not block or fail the caller.
pub trait FailureNotifier: Send + Sync {
    fn notify(&self, error: &FxError);
}

/// Notifier used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl FailureNotifier for NoopNotifier {
    fn notify(&self, _error: &FxError) {}
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WebhookMessage {
    pub username: String,
    pub embeds: Vec<WebhookEmbed>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct WebhookEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
}

/// Posts failures to a chat webhook.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Build the message posted for `description`.
    pub fn message(description: &str) -> WebhookMessage {
        WebhookMessage {
            username: WEBHOOK_USERNAME.to_string(),
            embeds: vec![WebhookEmbed {
                title: "ERROR".to_string(),
                description: description.to_string(),
                color: ERROR_COLOR,
            }],
        }
    }

    /// Post one message and wait for the webhook to answer.
    pub async fn send(&self, description: &str) -> Result<(), reqwest::Error> {
        self.http
            .post(&self.url)
            .json(&Self::message(description))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl FailureNotifier for WebhookNotifier {
    fn notify(&self, error: &FxError) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(error = %error, "No runtime available, dropping failure notification");
            return;
        };

        let request = self
            .http
            .post(&self.url)
            .json(&Self::message(&error.to_string()));

        runtime.spawn(async move {
            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(_) => debug!("Failure notification delivered"),
                Err(e) => warn!(error = %e, "Failure notification not delivered"),
            }
        });
    }
}

/// Pick the notifier for an optional webhook URL. Empty counts as unset.
pub fn notifier_for(http: &reqwest::Client, webhook_url: Option<&str>) -> Arc<dyn FailureNotifier> {
    match webhook_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => Arc::new(WebhookNotifier::new(http.clone(), url)),
        None => Arc::new(NoopNotifier),
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use recording::RecordingNotifier;

#[cfg(any(test, feature = "test-utils"))]
mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every notified error message, for assertions in tests.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn messages(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }
    }

    impl FailureNotifier for RecordingNotifier {
        fn notify(&self, error: &FxError) {
            self.messages
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(error.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shape() {
        let json = serde_json::to_value(WebhookNotifier::message("boom \"quoted\"")).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "username": "Dash Rates API",
                "embeds": [{
                    "title": "ERROR",
                    "description": "boom \"quoted\"",
                    "color": 15340307
                }]
            })
        );
    }

    #[test]
    fn test_notify_without_runtime_is_silent() {
        let notifier = WebhookNotifier::new(reqwest::Client::new(), "http://127.0.0.1:9/hook");
        notifier.notify(&FxError::payload("test", "boom"));
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify(&FxError::payload("poloniex", "no trades returned"));

        assert_eq!(notifier.messages().len(), 1);
        assert!(notifier.messages()[0].contains("poloniex"));
    }
}
