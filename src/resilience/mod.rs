//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Fetch attempt:
//!     → timeouts.rs (deadline = now + fetch timeout)
//!     → bounded upstream call
//!     → bounded body stream (same deadline)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - The only retry is the SPA fallback (see `proxy::fallback`); transport
//!   retries are left to the object-store client

pub mod timeouts;
