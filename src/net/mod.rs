//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (bind configured address)
//!     → tls.rs (optional PEM certificate + key)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bind failures are fatal at startup
//! - TLS is optional and handled transparently by the server

pub mod listener;
pub mod tls;

pub use listener::ListenerError;
