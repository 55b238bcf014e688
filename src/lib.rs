//! Frontend asset proxy library.
//!
//! Serves a single-page application and its assets out of an S3-compatible
//! bucket, falling back to the SPA entry document for unknown paths.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod proxy;
pub mod routing;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
