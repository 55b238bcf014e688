//! SPA entry fallback.
//!
//! ```text
//!            ok
//! Initial ───────────────────────────────▶ Fetched
//!    │ err
//!    ▼        403/404, SPA configured,
//! FetchFailed  resolved path ≠ SPA path
//!    │ ─────────────────────▶ Retrying ──ok──▶ Fetched
//!    │ otherwise                 │ err
//!    ▼                           ▼
//! FinalFailure ◀─────────────────┘
//! ```
//!
//! `Retrying` only leads to a terminal state, so a request costs at most two
//! upstream fetches. The retry is a fresh unconditional GET; the client's
//! conditional and range headers only apply to the primary fetch.

use std::time::Duration;

use axum::http::StatusCode;

use crate::observability::metrics;
use crate::proxy::error::FetchError;
use crate::proxy::fetcher::Fetcher;
use crate::proxy::status::allows_spa_fallback;
use crate::resilience::timeouts::deadline_after;
use crate::store::{Conditions, ObjectDescriptor};

/// Which fetch produced the served object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Primary,
    SpaFallback,
}

/// Terminal outcome of a proxied request.
#[derive(Debug)]
pub enum Resolution {
    Fetched {
        descriptor: ObjectDescriptor,
        attempt: Attempt,
    },
    FinalFailure {
        status: StatusCode,
        error: FetchError,
    },
}

impl Resolution {
    fn failed(error: FetchError) -> Self {
        Resolution::FinalFailure {
            status: error.status(),
            error,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Resolution::Fetched { .. } => StatusCode::OK,
            Resolution::FinalFailure { status, .. } => *status,
        }
    }
}

/// Non-terminal states of one request.
#[derive(Debug)]
enum FallbackState {
    Initial { conditions: Conditions },
    FetchFailed { error: FetchError },
    Retrying { original_path: String, spa_path: String },
}

/// Runs the primary fetch and, when eligible, the single SPA fallback.
#[derive(Debug, Clone)]
pub struct FallbackController {
    fetcher: Fetcher,
    spa_object_path: Option<String>,
    fetch_timeout: Duration,
}

impl FallbackController {
    /// `spa_object_path` is the full object path of the SPA entry document;
    /// `None` disables the fallback.
    pub fn new(fetcher: Fetcher, spa_object_path: Option<String>, fetch_timeout: Duration) -> Self {
        Self {
            fetcher,
            spa_object_path,
            fetch_timeout,
        }
    }

    pub fn spa_object_path(&self) -> Option<&str> {
        self.spa_object_path.as_deref()
    }

    /// Serve `resolved_path`, falling back to the SPA entry at most once.
    pub async fn run(&self, resolved_path: &str, conditions: Conditions) -> Resolution {
        let mut state = FallbackState::Initial { conditions };
        loop {
            state = match state {
                FallbackState::Initial { conditions } => {
                    let deadline = deadline_after(self.fetch_timeout);
                    match self.fetcher.fetch(resolved_path, conditions, deadline).await {
                        Ok(descriptor) => {
                            return Resolution::Fetched {
                                descriptor,
                                attempt: Attempt::Primary,
                            }
                        }
                        Err(error) => FallbackState::FetchFailed { error },
                    }
                }
                FallbackState::FetchFailed { error } => match self.fallback_target(resolved_path, &error) {
                    Some(spa_path) => FallbackState::Retrying {
                        original_path: resolved_path.to_string(),
                        spa_path: spa_path.to_string(),
                    },
                    None => return Resolution::failed(error),
                },
                FallbackState::Retrying {
                    original_path,
                    spa_path,
                } => {
                    tracing::debug!(
                        original = %original_path,
                        spa = %spa_path,
                        "Falling back to SPA entrypoint"
                    );
                    let deadline = deadline_after(self.fetch_timeout);
                    return match self.fetcher.fetch(&spa_path, Conditions::none(), deadline).await {
                        Ok(descriptor) => {
                            metrics::record_spa_fallback("served");
                            Resolution::Fetched {
                                descriptor,
                                attempt: Attempt::SpaFallback,
                            }
                        }
                        Err(error) => {
                            metrics::record_spa_fallback("failed");
                            tracing::warn!(spa = %spa_path, error = %error, "SPA entrypoint fetch failed");
                            Resolution::failed(error)
                        }
                    };
                }
            };
        }
    }

    /// The SPA path to retry against, if this failure qualifies.
    fn fallback_target(&self, resolved_path: &str, error: &FetchError) -> Option<&str> {
        if !allows_spa_fallback(error.status()) {
            return None;
        }
        let spa_path = self.spa_object_path.as_deref()?;
        if spa_path == resolved_path {
            tracing::debug!(path = %resolved_path, "SPA entrypoint itself is unavailable");
            metrics::record_spa_fallback("skipped");
            return None;
        }
        Some(spa_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FetchRequest, ObjectStore, UpstreamError, UpstreamErrorKind};
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::stream::{self, StreamExt};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const SPA: &str = "/frontend-assets/data/index.html";

    #[derive(Debug, Default)]
    struct ScriptedStore {
        objects: HashMap<&'static str, Result<&'static str, UpstreamErrorKind>>,
        calls: Mutex<Vec<FetchRequest>>,
    }

    impl ScriptedStore {
        fn with(objects: &[(&'static str, Result<&'static str, UpstreamErrorKind>)]) -> Arc<Self> {
            Arc::new(Self {
                objects: objects.iter().cloned().collect(),
                calls: Mutex::default(),
            })
        }

        fn calls(&self) -> Vec<FetchRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for ScriptedStore {
        async fn get_object(&self, request: FetchRequest) -> Result<ObjectDescriptor, UpstreamError> {
            let id = format!("{}/{}", request.bucket, request.key);
            if id == "slow/object" {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.calls.lock().unwrap().push(request);
            match self.objects.get(id.as_str()).copied() {
                Some(Ok(body)) => Ok(ObjectDescriptor::new(
                    stream::once(async move { Ok(Bytes::from_static(body.as_bytes())) }).boxed(),
                )),
                Some(Err(kind)) => Err(UpstreamError::new(kind, "scripted failure")),
                None => Err(UpstreamError::new(UpstreamErrorKind::NotFound, "NoSuchKey")),
            }
        }
    }

    fn controller(store: Arc<ScriptedStore>, spa: Option<&str>) -> FallbackController {
        FallbackController::new(
            Fetcher::new(store),
            spa.map(str::to_string),
            Duration::from_millis(200),
        )
    }

    fn conditional() -> Conditions {
        Conditions {
            if_none_match: Some("\"stale\"".into()),
            range: Some("bytes=0-10".into()),
            ..Conditions::default()
        }
    }

    #[tokio::test]
    async fn test_primary_success() {
        let store = ScriptedStore::with(&[("frontend-assets/data/app.js", Ok("js"))]);
        let resolution = controller(store.clone(), Some(SPA))
            .run("/frontend-assets/data/app.js", Conditions::none())
            .await;

        assert!(matches!(resolution, Resolution::Fetched { attempt: Attempt::Primary, .. }));
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_object_serves_spa_without_conditions() {
        let store = ScriptedStore::with(&[("frontend-assets/data/index.html", Ok("<html>"))]);
        let resolution = controller(store.clone(), Some(SPA))
            .run("/frontend-assets/data/unknown/path", conditional())
            .await;

        assert!(matches!(resolution, Resolution::Fetched { attempt: Attempt::SpaFallback, .. }));
        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].key, "data/unknown/path");
        assert_eq!(calls[0].conditions, conditional());
        assert_eq!(calls[1].key, "data/index.html");
        assert!(calls[1].conditions.is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_also_falls_back() {
        let store = ScriptedStore::with(&[
            ("frontend-assets/data/private", Err(UpstreamErrorKind::Forbidden)),
            ("frontend-assets/data/index.html", Ok("<html>")),
        ]);
        let resolution = controller(store.clone(), Some(SPA))
            .run("/frontend-assets/data/private", Conditions::none())
            .await;

        assert_eq!(resolution.status(), StatusCode::OK);
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_spa_stops_after_two_fetches() {
        let store = ScriptedStore::with(&[]);
        let resolution = controller(store.clone(), Some(SPA))
            .run("/frontend-assets/data/unknown/path", Conditions::none())
            .await;

        assert_eq!(resolution.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_spa_path_itself_is_not_retried() {
        let store = ScriptedStore::with(&[]);
        let resolution = controller(store.clone(), Some(SPA)).run(SPA, Conditions::none()).await;

        assert_eq!(resolution.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_disabled() {
        let store = ScriptedStore::with(&[("frontend-assets/data/index.html", Ok("<html>"))]);
        let resolution = controller(store.clone(), None)
            .run("/frontend-assets/data/missing", Conditions::none())
            .await;

        assert_eq!(resolution.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_other_failures_do_not_fall_back() {
        let store = ScriptedStore::with(&[
            ("frontend-assets/data/app.js", Err(UpstreamErrorKind::Internal)),
            ("frontend-assets/data/index.html", Ok("<html>")),
        ]);
        let resolution = controller(store.clone(), Some(SPA))
            .run("/frontend-assets/data/app.js", Conditions::none())
            .await;

        assert_eq!(resolution.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_path_never_reaches_store() {
        let store = ScriptedStore::with(&[]);
        let resolution = controller(store.clone(), Some(SPA)).run("/nobucket", Conditions::none()).await;

        match resolution {
            Resolution::FinalFailure { status, error } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(error, FetchError::InvalidPath("/nobucket".into()));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_gateway_timeout_without_fallback() {
        let store = ScriptedStore::with(&[("frontend-assets/data/index.html", Ok("<html>"))]);
        let resolution = controller(store.clone(), Some(SPA)).run("/slow/object", Conditions::none()).await;

        match resolution {
            Resolution::FinalFailure { status, error } => {
                assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
                assert!(error.is_timeout());
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        // The slow call was cancelled before recording itself.
        assert!(store.calls().is_empty());
    }
}
