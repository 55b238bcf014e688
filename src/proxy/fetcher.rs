//! Single-attempt object fetch.
//!
//! # Responsibilities
//! - Split a full object path into bucket and key
//! - Percent-decode the key (falling back to the raw key)
//! - Extract conditional and range headers from the inbound request
//! - Bound the store call and the body by the attempt's deadline

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Instant as StdInstant, SystemTime};

use axum::http::{header, HeaderMap, HeaderName};
use percent_encoding::percent_decode_str;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::proxy::error::FetchError;
use crate::resilience::timeouts::{deadline_stream, with_deadline};
use crate::store::{Conditions, FetchRequest, ObjectDescriptor, ObjectStore, UpstreamError, UpstreamErrorKind};

/// A full object path split into its bucket and decoded key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    pub bucket: String,
    pub key: String,
}

impl ObjectPath {
    /// Parse `/<bucket>/<key>`. Both parts must be non-empty.
    pub fn parse(full: &str) -> Result<Self, FetchError> {
        let path = full.strip_prefix('/').unwrap_or(full);
        match path.find('/') {
            Some(idx) if idx > 0 && idx < path.len() - 1 => Ok(Self {
                bucket: path[..idx].to_string(),
                key: decode_key(&path[idx + 1..]),
            }),
            _ => Err(FetchError::InvalidPath(full.to_string())),
        }
    }
}

/// Percent-decode a key. Keys with malformed escapes or that decode to
/// invalid UTF-8 are used as-is.
fn decode_key(raw: &str) -> String {
    if has_malformed_escape(raw) {
        return raw.to_string();
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

fn has_malformed_escape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    })
}

/// Collect the conditional and range headers the store understands.
///
/// Text headers pass through verbatim; date headers that are not valid
/// HTTP-dates are dropped.
pub fn conditions_from_headers(headers: &HeaderMap) -> Conditions {
    Conditions {
        range: text_header(headers, header::RANGE),
        if_none_match: text_header(headers, header::IF_NONE_MATCH),
        if_match: text_header(headers, header::IF_MATCH),
        if_modified_since: date_header(headers, header::IF_MODIFIED_SINCE),
        if_unmodified_since: date_header(headers, header::IF_UNMODIFIED_SINCE),
    }
}

fn text_header(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn date_header(headers: &HeaderMap, name: HeaderName) -> Option<SystemTime> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
}

/// Performs one bounded fetch against the shared object store.
#[derive(Debug, Clone)]
pub struct Fetcher {
    store: Arc<dyn ObjectStore>,
}

impl Fetcher {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Fetch `object_path`, giving up at `deadline`.
    ///
    /// On success the descriptor's body is bounded by the same deadline.
    pub async fn fetch(
        &self,
        object_path: &str,
        conditions: Conditions,
        deadline: Instant,
    ) -> Result<ObjectDescriptor, FetchError> {
        let ObjectPath { bucket, key } = ObjectPath::parse(object_path)?;

        tracing::debug!(bucket = %bucket, key = %key, conditional = !conditions.is_empty(), "Fetching object");

        let request = FetchRequest {
            bucket: bucket.clone(),
            key: key.clone(),
            conditions,
        };
        let started = StdInstant::now();
        let result = match with_deadline(deadline, self.store.get_object(request)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::new(
                UpstreamErrorKind::Timeout,
                "fetch deadline exceeded",
            )),
        };

        match result {
            Ok(mut descriptor) => {
                metrics::record_upstream_fetch("ok", started.elapsed());
                descriptor.body = deadline_stream(descriptor.body, deadline);
                Ok(descriptor)
            }
            Err(err) => {
                metrics::record_upstream_fetch(err.kind.as_str(), started.elapsed());
                if err.kind == UpstreamErrorKind::Timeout {
                    tracing::debug!(bucket = %bucket, key = %key, "Upstream fetch timed out");
                } else {
                    tracing::debug!(bucket = %bucket, key = %key, kind = %err.kind, error = %err.message, "Upstream fetch failed");
                }
                Err(err.into())
            }
        }
    }
}
