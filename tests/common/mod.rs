//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use frontend_asset_proxy::config::ProxyConfig;
use frontend_asset_proxy::store::{
    FetchRequest, ObjectDescriptor, ObjectStore, UpstreamError, UpstreamErrorKind,
};
use frontend_asset_proxy::HttpServer;
use futures_util::stream::{self, StreamExt};

/// What the scripted store answers for one `bucket/key`.
#[derive(Debug, Clone)]
pub enum Scripted {
    Object {
        content_type: &'static str,
        body: &'static str,
    },
    /// Yields `first_chunk`, then never finishes. `released` flips once the
    /// body stream is dropped.
    Streaming {
        first_chunk: &'static str,
        released: Arc<AtomicBool>,
    },
    Fail(UpstreamErrorKind),
    Hang,
    Panic,
}

struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// In-memory object store that records every request it receives.
///
/// Unknown keys answer `NotFound`.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    objects: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, object: &str, content_type: &'static str, body: &'static str) {
        self.script(object, Scripted::Object { content_type, body });
    }

    /// Script an open-ended body and return its release flag.
    pub fn put_streaming(&self, object: &str, first_chunk: &'static str) -> Arc<AtomicBool> {
        let released = Arc::new(AtomicBool::new(false));
        self.script(
            object,
            Scripted::Streaming {
                first_chunk,
                released: released.clone(),
            },
        );
        released
    }

    pub fn script(&self, object: &str, answer: Scripted) {
        self.objects.lock().unwrap().insert(object.to_string(), answer);
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for ScriptedStore {
    async fn get_object(&self, request: FetchRequest) -> Result<ObjectDescriptor, UpstreamError> {
        let id = format!("{}/{}", request.bucket, request.key);
        self.calls.lock().unwrap().push(request);
        let answer = self.objects.lock().unwrap().get(&id).cloned();

        match answer {
            Some(Scripted::Object { content_type, body }) => {
                let mut descriptor = ObjectDescriptor::new(
                    stream::once(async move { Ok(Bytes::from_static(body.as_bytes())) }).boxed(),
                );
                descriptor.content_type = Some(content_type.to_string());
                descriptor.content_length = Some(body.len() as u64);
                descriptor.etag = Some(format!("\"{:x}\"", body.len()));
                descriptor.last_modified = Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_445_412_480));
                Ok(descriptor)
            }
            Some(Scripted::Streaming { first_chunk, released }) => {
                let guard = ReleaseFlag(released);
                let body = stream::once(async move { Ok(Bytes::from_static(first_chunk.as_bytes())) })
                    .chain(stream::pending())
                    .map(move |chunk| {
                        let _held = &guard;
                        chunk
                    });
                let mut descriptor = ObjectDescriptor::new(body.boxed());
                descriptor.content_type = Some("application/octet-stream".to_string());
                Ok(descriptor)
            }
            Some(Scripted::Fail(kind)) => Err(UpstreamError::new(kind, "scripted failure")),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(UpstreamError::new(UpstreamErrorKind::Unknown, "hang elapsed"))
            }
            Some(Scripted::Panic) => panic!("scripted store panic for {id}"),
            None => Err(UpstreamError::new(UpstreamErrorKind::NotFound, "The specified key does not exist.")),
        }
    }
}

/// Default configuration with a short fetch deadline.
pub fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.fetch_secs = 1;
    config
}

pub fn server_with(store: Arc<ScriptedStore>, config: ProxyConfig) -> HttpServer {
    HttpServer::new(config, store)
}
