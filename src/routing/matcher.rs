//! Route rule matching and rewriting.
//!
//! # Responsibilities
//! - Match the request path against a literal prefix (case-sensitive)
//! - Rewrite a matched path into an object path suffix
//!
//! # Design Decisions
//! - No regex to guarantee O(n) matching
//! - An empty prefix is the catch-all and matches every path

/// Rewrite template applied to a matched request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// Keep the original path: `/manifests/x` → `/manifests/x`.
    Identity,
    /// Drop the matched prefix and the next segment, then insert the data
    /// subpath: `/apps/chrome/nav.json` → `/data/nav.json`.
    StripSegmentIntoData,
    /// Insert the data subpath in front of the path: `/x` → `/data/x`.
    IntoData,
}

/// Subpath under the bucket prefix that holds application assets.
pub const DATA_SUBPATH: &str = "/data";

impl Rewrite {
    /// Apply this template to `path`, which is known to start with `prefix`.
    pub fn apply(&self, prefix: &str, path: &str) -> String {
        match self {
            Rewrite::Identity => path.to_string(),
            Rewrite::IntoData => format!("{DATA_SUBPATH}{path}"),
            Rewrite::StripSegmentIntoData => {
                let after_prefix = &path[prefix.len()..];
                let rest = match after_prefix.find('/') {
                    Some(idx) => &after_prefix[idx..],
                    None => "",
                };
                format!("{DATA_SUBPATH}{rest}")
            }
        }
    }
}

/// An ordered routing rule: a path-prefix matcher plus a rewrite template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    name: &'static str,
    prefix: String,
    rewrite: Rewrite,
}

impl RouteRule {
    /// Create a rule matching paths that start with `prefix`.
    pub fn new(name: &'static str, prefix: impl Into<String>, rewrite: Rewrite) -> Self {
        Self {
            name,
            prefix: prefix.into(),
            rewrite,
        }
    }

    /// Create the catch-all rule. It matches every path.
    pub fn catch_all(name: &'static str, rewrite: Rewrite) -> Self {
        Self::new(name, "", rewrite)
    }

    /// Rule identifier for logging/metrics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_catch_all(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Returns true if `path` is handled by this rule.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Rewrite a matched path into the object path suffix.
    pub fn rewrite(&self, path: &str) -> String {
        self.rewrite.apply(&self.prefix, path)
    }
}
