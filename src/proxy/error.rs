//! Proxy error taxonomy.

use axum::http::StatusCode;

use crate::proxy::status;
use crate::store::{UpstreamError, UpstreamErrorKind};

/// Why a single fetch attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The object path has no bucket or no key. Never reaches the store.
    #[error("invalid object path '{0}'")]
    InvalidPath(String),

    /// The store answered with (or failed with) a categorized error.
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] UpstreamError),
}

impl FetchError {
    /// Upstream category, if the store was reached.
    pub fn kind(&self) -> Option<UpstreamErrorKind> {
        match self {
            FetchError::InvalidPath(_) => None,
            FetchError::Upstream(err) => Some(err.kind),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == Some(UpstreamErrorKind::Timeout)
    }

    /// HTTP status this failure is reported with.
    pub fn status(&self) -> StatusCode {
        status::status_for(self)
    }
}
