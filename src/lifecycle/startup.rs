//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, metrics and the object store client in order
//! - Bind the listener and begin accepting traffic
//! - Hand the server a shutdown signal wired to OS signals
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use crate::config::{load_config, ProxyConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::listener;
use crate::observability::{logging, metrics};
use crate::store::{ObjectStore, S3ObjectStore};

const REDACTED: &str = "<redacted>";

/// Run the proxy until a termination signal has been handled.
///
/// With `print_config` the effective configuration is written to stdout
/// instead and nothing is started.
pub async fn run(config_path: Option<&Path>, print_config: bool) -> Result<(), Box<dyn Error>> {
    let loaded = load_config(config_path)?;

    if print_config {
        print!("{}", render_config(&loaded.config)?);
        return Ok(());
    }

    let config = loaded.config;
    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "frontend-asset-proxy starting");
    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.endpoint_url,
        prefix = %config.assets.bucket_path_prefix,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::from_config(&config.upstream).await);

    let listener = listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new(config.timeouts.shutdown());
    let server = HttpServer::new(config, store);
    let serve = server.run(listener, shutdown.subscribe());
    tokio::pin!(serve);

    tokio::select! {
        result = &mut serve => return Ok(result?),
        _ = signals::trigger_on_signal(&shutdown) => {}
    }
    serve.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// The effective configuration as TOML, with secrets replaced.
pub fn render_config(config: &ProxyConfig) -> Result<String, toml::ser::Error> {
    let mut config = config.clone();
    if config.upstream.secret_access_key.is_some() {
        config.upstream.secret_access_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&config)
}
