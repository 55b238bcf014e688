//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{ProxyConfig, TlsConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A validated configuration plus the environment values that were ignored.
///
/// Logging is not initialized while configuration loads, so problems with
/// individual overrides are handed back to the caller to report.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ProxyConfig,
    pub warnings: Vec<String>,
}

/// Load configuration: optional TOML file, then process environment, then
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<LoadedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    let warnings = apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(LoadedConfig { config, warnings })
}

/// Apply the deployment environment variables on top of `config`.
///
/// Empty values count as unset. Values that fail to parse leave the current
/// setting untouched and produce a warning.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let mut warnings = Vec::new();

    if let Some(port) = get("SERVER_PORT") {
        match port.parse::<u16>() {
            Ok(port) => config.listener.bind_address = format!("0.0.0.0:{port}"),
            Err(_) => warnings.push(format!("SERVER_PORT='{port}' is not a port; ignored")),
        }
    }

    if let (Some(cert_path), Some(key_path)) = (get("TLS_CERT_FILE"), get("TLS_KEY_FILE")) {
        config.listener.tls = Some(TlsConfig {
            cert_path,
            key_path,
        });
    }

    if let Some(v) = get("MINIO_UPSTREAM_URL") {
        config.upstream.endpoint_url = v;
    }
    if let Some(v) = get("AWS_REGION") {
        config.upstream.region = v;
    }
    if let Some(v) = get("S3_MAX_ATTEMPTS") {
        match v.parse() {
            Ok(n) => config.upstream.max_attempts = n,
            Err(_) => warnings.push(format!("S3_MAX_ATTEMPTS='{v}' is not a number; ignored")),
        }
    }
    if let Some(v) = get("PUSHCACHE_AWS_ACCESS_KEY_ID") {
        config.upstream.access_key_id = Some(v);
    }
    if let Some(v) = get("PUSHCACHE_AWS_SECRET_ACCESS_KEY") {
        config.upstream.secret_access_key = Some(v);
    }

    if let Some(v) = get("BUCKET_PATH_PREFIX") {
        config.assets.bucket_path_prefix = v;
    }
    if let Some(v) = get("SPA_ENTRYPOINT_PATH") {
        config.assets.spa_entrypoint_path = v;
    }

    for (key, slot) in [
        ("S3_GET_TIMEOUT", &mut config.timeouts.fetch_secs),
        ("READ_HEADER_TIMEOUT", &mut config.timeouts.read_header_secs),
        ("WRITE_TIMEOUT", &mut config.timeouts.request_secs),
        ("IDLE_TIMEOUT", &mut config.timeouts.idle_secs),
        ("SHUTDOWN_TIMEOUT", &mut config.timeouts.shutdown_secs),
    ] {
        if let Some(v) = get(key) {
            match parse_duration_secs(&v) {
                Some(secs) => *slot = secs,
                None => warnings.push(format!("{key}='{v}' is not a duration; ignored")),
            }
        }
    }

    if let Some(v) = get("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = get("LOG_FORMAT") {
        config.observability.log_format = v;
    }

    warnings
}

/// Parse `"30"`, `"30s"`, `"5m"` or `"1h"` into whole seconds.
pub fn parse_duration_secs(value: &str) -> Option<u64> {
    let value = value.trim();
    let (digits, multiplier) = match value.char_indices().last()? {
        (idx, 's') => (&value[..idx], 1),
        (idx, 'm') => (&value[..idx], 60),
        (idx, 'h') => (&value[..idx], 3600),
        _ => (value, 1),
    };
    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("60s"), Some(60));
        assert_eq!(parse_duration_secs("45"), Some(45));
        assert_eq!(parse_duration_secs("2m"), Some(120));
        assert_eq!(parse_duration_secs("1h"), Some(3600));
        assert_eq!(parse_duration_secs("500ms"), None);
        assert_eq!(parse_duration_secs("soon"), None);
        assert_eq!(parse_duration_secs(""), None);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ProxyConfig::default();
        let warnings = apply_env_overrides(
            &mut config,
            env(&[
                ("SERVER_PORT", "9443"),
                ("TLS_CERT_FILE", "/tls/cert.pem"),
                ("TLS_KEY_FILE", "/tls/key.pem"),
                ("MINIO_UPSTREAM_URL", "https://s3.internal:9000"),
                ("BUCKET_PATH_PREFIX", "/assets"),
                ("SPA_ENTRYPOINT_PATH", "/app.html"),
                ("S3_GET_TIMEOUT", "15s"),
                ("READ_HEADER_TIMEOUT", "3s"),
                ("WRITE_TIMEOUT", "2m"),
                ("IDLE_TIMEOUT", "0"),
                ("S3_MAX_ATTEMPTS", "5"),
                ("LOG_LEVEL", "debug"),
            ]),
        );

        assert!(warnings.is_empty());
        assert_eq!(config.listener.bind_address, "0.0.0.0:9443");
        assert_eq!(config.listener.tls.as_ref().unwrap().cert_path, "/tls/cert.pem");
        assert_eq!(config.upstream.endpoint_url, "https://s3.internal:9000");
        assert_eq!(config.upstream.max_attempts, 5);
        assert_eq!(config.assets.bucket_path_prefix, "/assets");
        assert_eq!(config.assets.spa_entrypoint_path, "/app.html");
        assert_eq!(config.timeouts.fetch_secs, 15);
        assert_eq!(config.timeouts.read_header_secs, 3);
        assert_eq!(config.timeouts.request_secs, 120);
        assert_eq!(config.timeouts.idle_secs, 0);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_empty_and_malformed_env_values() {
        let mut config = ProxyConfig::default();
        let warnings = apply_env_overrides(
            &mut config,
            env(&[
                ("SPA_ENTRYPOINT_PATH", ""),
                ("S3_GET_TIMEOUT", "forever"),
                ("SERVER_PORT", "http"),
                ("TLS_CERT_FILE", "/tls/cert.pem"),
            ]),
        );

        assert_eq!(warnings.len(), 2);
        assert_eq!(config.assets.spa_entrypoint_path, "/index.html");
        assert_eq!(config.timeouts.fetch_secs, 60);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        // A certificate without a key does not enable TLS.
        assert!(config.listener.tls.is_none());
    }

    #[test]
    fn test_load_file_then_env() {
        let path = std::env::temp_dir().join(format!("fap-config-{}.toml", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[assets]\nbucket_path_prefix = \"/from-file\"\n[timeouts]\nfetch_secs = 5").unwrap();

        let loaded = load_config_with(Some(&path), env(&[("S3_GET_TIMEOUT", "7")])).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded.config.assets.bucket_path_prefix, "/from-file");
        assert_eq!(loaded.config.timeouts.fetch_secs, 7);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let err = load_config_with(None, env(&[("BUCKET_PATH_PREFIX", "no-slash")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("assets.bucket_path_prefix"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config_with(Some(Path::new("/nonexistent/proxy.toml")), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
