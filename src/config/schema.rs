//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the asset proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Object store connection settings.
    pub upstream: UpstreamConfig,

    /// Bucket layout and SPA fallback.
    pub assets: AssetsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Object store connection settings.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// S3/MinIO endpoint. Only scheme, host and port are used.
    pub endpoint_url: String,

    pub region: String,

    /// Attempts per fetch, including SDK-level retries.
    pub max_attempts: u32,

    pub access_key_id: Option<String>,

    pub secret_access_key: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://minio:9000".to_string(),
            region: "us-east-1".to_string(),
            max_attempts: 3,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("region", &self.region)
            .field("max_attempts", &self.max_attempts)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Bucket layout and SPA fallback settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AssetsConfig {
    /// Leading object path: the bucket plus any fixed key prefix.
    pub bucket_path_prefix: String,

    /// Entry document served for missing paths. Empty disables the fallback.
    pub spa_entrypoint_path: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            bucket_path_prefix: "/frontend-assets".to_string(),
            spa_entrypoint_path: "/index.html".to_string(),
        }
    }
}

impl AssetsConfig {
    pub fn spa_entrypoint(&self) -> Option<&str> {
        Some(self.spa_entrypoint_path.as_str()).filter(|p| !p.is_empty())
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for one upstream fetch, including streaming its body.
    pub fetch_secs: u64,

    /// Time a client has to send the request head. Also bounds how long a
    /// kept-alive connection may wait for its next request.
    pub read_header_secs: u64,

    /// Time the proxy has to produce response headers for one request.
    pub request_secs: u64,

    /// Keep-alive between requests; 0 closes the connection after each response.
    pub idle_secs: u64,

    /// Maximum time to drain in-flight requests on shutdown.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_secs: 60,
            read_header_secs: 5,
            request_secs: 60,
            idle_secs: 60,
            shutdown_secs: 10,
        }
    }
}

impl TimeoutConfig {
    pub fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }

    pub fn read_header(&self) -> Duration {
        Duration::from_secs(self.read_header_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn keep_alive(&self) -> bool {
        self.idle_secs > 0
    }

    pub fn shutdown(&self) -> Duration {
        Duration::from_secs(self.shutdown_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("text" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "error".to_string(),
            log_format: "text".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config, ProxyConfig::default());
        assert_eq!(config.assets.spa_entrypoint(), Some("/index.html"));
        assert_eq!(config.timeouts.fetch(), Duration::from_secs(60));
        assert_eq!(config.timeouts.read_header(), Duration::from_secs(5));
        assert_eq!(config.timeouts.request(), Duration::from_secs(60));
        assert!(config.timeouts.keep_alive());
    }

    #[test]
    fn test_partial_toml() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [assets]
            spa_entrypoint_path = ""

            [listener]
            bind_address = "127.0.0.1:9000"
            tls = { cert_path = "/tls/cert.pem", key_path = "/tls/key.pem" }
            "#,
        )
        .unwrap();
        assert_eq!(config.assets.spa_entrypoint(), None);
        assert_eq!(config.assets.bucket_path_prefix, "/frontend-assets");
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.listener.tls.unwrap().key_path, "/tls/key.pem");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let upstream = UpstreamConfig {
            secret_access_key: Some("hunter2".into()),
            ..UpstreamConfig::default()
        };
        assert!(!format!("{upstream:?}").contains("hunter2"));
    }

    #[test]
    fn test_zero_idle_disables_keep_alive() {
        let config: ProxyConfig = toml::from_str("[timeouts]\nidle_secs = 0\nread_header_secs = 2").unwrap();
        assert!(!config.timeouts.keep_alive());
        assert_eq!(config.timeouts.read_header(), Duration::from_secs(2));
        assert_eq!(config.timeouts.request_secs, 60);
    }
}
