//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request layer and proxy core produce:
//!     → logging.rs (structured log events, request spans, access log)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through the span into every event
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
