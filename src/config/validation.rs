//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check paired settings (TLS cert + key, access key + secret)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::store::s3::base_endpoint;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path must both be set",
            ));
        }
    }

    if base_endpoint(&config.upstream.endpoint_url).is_none() {
        errors.push(ValidationError::new(
            "upstream.endpoint_url",
            format!("'{}' needs a scheme and host", config.upstream.endpoint_url),
        ));
    }

    if config.upstream.max_attempts == 0 {
        errors.push(ValidationError::new("upstream.max_attempts", "must be at least 1"));
    }

    if config.upstream.access_key_id.is_some() != config.upstream.secret_access_key.is_some() {
        errors.push(ValidationError::new(
            "upstream.access_key_id",
            "access key id and secret access key must be set together",
        ));
    }

    if !config.assets.bucket_path_prefix.starts_with('/') {
        errors.push(ValidationError::new(
            "assets.bucket_path_prefix",
            "must start with '/'",
        ));
    }

    if let Some(spa) = config.assets.spa_entrypoint() {
        if !spa.starts_with('/') {
            errors.push(ValidationError::new(
                "assets.spa_entrypoint_path",
                "must be empty or start with '/'",
            ));
        }
    }

    for (field, secs) in [
        ("timeouts.fetch_secs", config.timeouts.fetch_secs),
        ("timeouts.read_header_secs", config.timeouts.read_header_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if !matches!(config.observability.log_format.as_str(), "text" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", config.observability.log_format),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
