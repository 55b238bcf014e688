//! Upstream failure → HTTP status translation.
//!
//! | category            | status |
//! |---------------------|--------|
//! | deadline exceeded   | 504    |
//! | not found           | 404    |
//! | forbidden           | 403    |
//! | precondition failed | 412    |
//! | not modified        | 304    |
//! | invalid range       | 416    |
//! | malformed request   | 400    |
//! | request timeout     | 408    |
//! | slow down / unavailable | 503 |
//! | internal            | 500    |
//! | anything else       | 502    |
//!
//! `InvalidPath` is decided before any upstream call and is always 400.

use axum::http::StatusCode;

use crate::proxy::error::FetchError;
use crate::store::UpstreamErrorKind;

/// Status for an upstream failure category.
pub fn status_for_kind(kind: UpstreamErrorKind) -> StatusCode {
    match kind {
        UpstreamErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        UpstreamErrorKind::NotFound => StatusCode::NOT_FOUND,
        UpstreamErrorKind::Forbidden => StatusCode::FORBIDDEN,
        UpstreamErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
        UpstreamErrorKind::NotModified => StatusCode::NOT_MODIFIED,
        UpstreamErrorKind::InvalidRange => StatusCode::RANGE_NOT_SATISFIABLE,
        UpstreamErrorKind::MalformedRequest => StatusCode::BAD_REQUEST,
        UpstreamErrorKind::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
        UpstreamErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        UpstreamErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        UpstreamErrorKind::Unknown => StatusCode::BAD_GATEWAY,
    }
}

/// Status for a failed fetch attempt.
pub fn status_for(error: &FetchError) -> StatusCode {
    match error {
        FetchError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        FetchError::Upstream(err) => status_for_kind(err.kind),
    }
}

/// Statuses that make a missing asset eligible for the SPA entry fallback.
pub fn allows_spa_fallback(status: StatusCode) -> bool {
    matches!(status, StatusCode::NOT_FOUND | StatusCode::FORBIDDEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UpstreamError;
    use std::collections::HashMap;

    #[test]
    fn test_table_is_total_and_stable() {
        let first: HashMap<_, _> = UpstreamErrorKind::ALL
            .iter()
            .map(|kind| (*kind, status_for_kind(*kind)))
            .collect();
        assert_eq!(first.len(), UpstreamErrorKind::ALL.len());

        for kind in UpstreamErrorKind::ALL {
            assert_eq!(status_for_kind(kind), first[&kind]);
        }
    }

    #[test]
    fn test_known_mappings() {
        let cases = [
            ("NoSuchKey", 404),
            ("NoSuchBucket", 404),
            ("AccessDenied", 403),
            ("ExpiredToken", 403),
            ("PreconditionFailed", 412),
            ("InvalidRange", 416),
            ("InvalidArgument", 400),
            ("RequestTimeout", 408),
            ("SlowDown", 503),
            ("ServiceUnavailable", 503),
            ("InternalError", 500),
        ];
        for (code, expected) in cases {
            let kind = UpstreamErrorKind::from_code(code).unwrap();
            assert_eq!(status_for_kind(kind).as_u16(), expected, "code {code}");
        }
    }

    #[test]
    fn test_timeout_and_unknown() {
        assert_eq!(status_for_kind(UpstreamErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for_kind(UpstreamErrorKind::Unknown), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_path_is_bad_request() {
        let err = FetchError::InvalidPath("/nobucket".into());
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);

        let err = FetchError::from(UpstreamError::new(UpstreamErrorKind::MalformedRequest, "bad"));
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_fallback_eligibility() {
        assert!(allows_spa_fallback(StatusCode::NOT_FOUND));
        assert!(allows_spa_fallback(StatusCode::FORBIDDEN));
        assert!(!allows_spa_fallback(StatusCode::GATEWAY_TIMEOUT));
        assert!(!allows_spa_fallback(StatusCode::BAD_REQUEST));
    }
}
