//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered rule lookup, first match wins)
//!     → matcher.rs (prefix match + rewrite template)
//!     → Return: full object path "<prefix>/<suffix>"
//!
//! Route table (at startup):
//!     /manifests/   → <prefix><path>
//!     /apps/<app>/  → <prefix>/data/<rest>
//!     catch-all     → <prefix>/data<path>
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Rules are evaluated in declared order, never sorted
//! - Exactly one catch-all rule, always last
//! - Resolution is a pure function: no I/O, no normalization

pub mod matcher;
pub mod router;

pub use matcher::{Rewrite, RouteRule};
pub use router::{join_path, RouteTable};
