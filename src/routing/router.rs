//! Route lookup and object path resolution.
//!
//! # Responsibilities
//! - Store the ordered rule set
//! - Resolve a request path to a full object path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (three rules in practice)
//! - The catch-all guarantees every path resolves

use super::matcher::{Rewrite, RouteRule};

/// Ordered, immutable set of routing rules bound to a bucket path prefix.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    prefix: String,
}

impl RouteTable {
    /// Build the asset proxy's route table:
    ///
    /// | order | pattern        | object path                   |
    /// |-------|----------------|-------------------------------|
    /// | 1     | `/manifests/*` | `<prefix><path>`              |
    /// | 2     | `/apps/<app>/*`| `<prefix>/data/<rest>`        |
    /// | 3     | `*`            | `<prefix>/data<path>`         |
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_rules(
            prefix,
            vec![
                RouteRule::new("manifests", "/manifests/", Rewrite::Identity),
                RouteRule::new("apps", "/apps/", Rewrite::StripSegmentIntoData),
                RouteRule::catch_all("default", Rewrite::IntoData),
            ],
        )
    }

    /// Build a table from explicit rules.
    ///
    /// # Panics
    /// Panics unless exactly one catch-all rule exists and it is the last
    /// rule. Rule sets are fixed at compile time, so this is a programming
    /// error rather than a runtime condition.
    pub fn with_rules(prefix: impl Into<String>, rules: Vec<RouteRule>) -> Self {
        let catch_alls = rules.iter().filter(|r| r.is_catch_all()).count();
        assert!(
            catch_alls == 1 && rules.last().is_some_and(RouteRule::is_catch_all),
            "route table needs exactly one catch-all rule in last position"
        );
        Self {
            rules,
            prefix: prefix.into(),
        }
    }

    /// The bucket path prefix every object path starts with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Find the first rule matching `path`.
    pub fn match_path(&self, path: &str) -> &RouteRule {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .unwrap_or_else(|| self.catch_all())
    }

    /// Resolve a request path to `<prefix>/<rewritten-suffix>`.
    pub fn resolve(&self, path: &str) -> String {
        let rule = self.match_path(path);
        join_path(&self.prefix, &rule.rewrite(path))
    }

    /// Object path of an entry served through the catch-all rule, regardless
    /// of what more specific rules would do with it.
    pub fn resolve_via_catch_all(&self, path: &str) -> String {
        join_path(&self.prefix, &self.catch_all().rewrite(path))
    }

    fn catch_all(&self) -> &RouteRule {
        // Construction guarantees the last rule is the catch-all.
        &self.rules[self.rules.len() - 1]
    }
}

/// Join two path fragments with exactly one `/` between them.
pub fn join_path(a: &str, b: &str) -> String {
    match (a.ends_with('/'), b.starts_with('/')) {
        (true, true) => format!("{a}{}", &b[1..]),
        (false, false) => format!("{a}/{b}"),
        _ => format!("{a}{b}"),
    }
}
