//! Request core: fetch, translate, fall back, write.
//!
//! # Data Flow
//! ```text
//! resolved object path + conditional headers
//!     → fallback.rs (primary fetch, at most one SPA retry)
//!         → fetcher.rs (split bucket/key, bounded store call)
//!         → status.rs (failure category → HTTP status)
//!     → writer.rs (headers + streamed body, or status text)
//! ```
//!
//! # Design Decisions
//! - Every failure ends as a written response; nothing here panics per request
//! - The store handle is the only shared state

pub mod error;
pub mod fallback;
pub mod fetcher;
pub mod status;
pub mod writer;

pub use error::FetchError;
pub use fallback::{Attempt, FallbackController, Resolution};
pub use fetcher::{conditions_from_headers, Fetcher, ObjectPath};
pub use writer::{method_not_allowed, write_failure, write_object};
