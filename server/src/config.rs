//! Server configuration.

use std::time::Duration;

use dashrates_fx::UpstreamConfig;

/// Host advertised by the index route when `HOST` is unset.
pub const DEFAULT_HOST: &str = "https://rates.dash-retail.com";

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Public host of this deployment.
    pub host: String,
    /// Chat webhook receiving upstream failures. `None` disables it.
    pub webhook_url: Option<String>,
    /// How long upstream responses are reused.
    pub cache_ttl: Duration,
    /// Timeout for each upstream request.
    pub upstream_timeout: Duration,
    /// Log level, used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 3000,
            host: DEFAULT_HOST.to_string(),
            webhook_url: None,
            cache_ttl: Duration::from_secs(60),
            upstream_timeout: Duration::from_secs(10),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// missing or unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("RATES_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("RATES_LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Some(host) = lookup("HOST").filter(|h| !h.is_empty()) {
            config.host = host;
        }

        config.webhook_url = lookup("DISCORD_WEBHOOK_URL").filter(|url| !url.trim().is_empty());

        if let Some(secs) = lookup("RATES_CACHE_TTL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.cache_ttl = Duration::from_secs(secs);
            }
        }

        if let Some(secs) = lookup("RATES_UPSTREAM_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.upstream_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.cache_ttl.is_zero() {
            return Err("Cache TTL cannot be 0".to_string());
        }

        if self.upstream_timeout.is_zero() {
            return Err("Upstream timeout cannot be 0".to_string());
        }

        if let Some(url) = &self.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("Webhook URL must be http(s): {url}"));
            }
        }

        Ok(())
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    /// Cache TTL as the duration type the cache uses.
    pub fn cache_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.cache_ttl).unwrap_or_else(|_| chrono::Duration::minutes(1))
    }

    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            timeout: self.upstream_timeout,
            ..UpstreamConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("RATES_LISTEN_PORT", "8080"),
            ("HOST", "http://localhost:8080"),
            ("DISCORD_WEBHOOK_URL", "https://discord.example/api/webhooks/1/x"),
            ("RATES_CACHE_TTL_SECS", "30"),
            ("RATES_UPSTREAM_TIMEOUT_SECS", "5"),
            ("LOG_LEVEL", "debug"),
        ]);

        assert!(config.validate().is_ok());
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.host, "http://localhost:8080");
        assert!(config.webhook_url.is_some());
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.cache_ttl_chrono(), chrono::Duration::seconds(30));
        assert_eq!(config.upstream_config().timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_unparseable_values_keep_defaults() {
        let config = from_pairs(&[("RATES_LISTEN_PORT", "http"), ("RATES_CACHE_TTL_SECS", "-1")]);
        assert_eq!(config.listen_port, 3000);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_empty_webhook_disables_notifier() {
        let config = from_pairs(&[("DISCORD_WEBHOOK_URL", "  ")]);
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ServerConfig::default();
        config.listen_port = 0;
        assert!(config.validate().is_err());

        let config = from_pairs(&[("RATES_CACHE_TTL_SECS", "0")]);
        assert!(config.validate().is_err());

        let config = from_pairs(&[("RATES_UPSTREAM_TIMEOUT_SECS", "0")]);
        assert!(config.validate().is_err());

        let config = from_pairs(&[("DISCORD_WEBHOOK_URL", "ftp://hook")]);
        assert!(config.validate().is_err());
    }
}
