//! Object-store collaborator.
//!
//! # Data Flow
//! ```text
//! Fetcher
//!     → ObjectStore::get_object(FetchRequest)
//!     → s3.rs (aws-sdk-s3 GetObject)
//!     → ObjectDescriptor (metadata + byte stream)
//!       or UpstreamError (closed category + cause)
//! ```
//!
//! # Design Decisions
//! - One capability only: fetch an object with preconditions
//! - Failures are a closed enum so the status translation never inspects
//!   SDK error types
//! - The client handle is built once and shared read-only via `Arc`

pub mod s3;

use std::fmt;
use std::io;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

pub use s3::S3ObjectStore;

/// Streaming object body.
pub type ByteStream = BoxStream<'static, Result<Bytes, io::Error>>;

/// Conditional and range fields forwarded to the object store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    pub range: Option<String>,
    pub if_none_match: Option<String>,
    pub if_match: Option<String>,
    pub if_modified_since: Option<SystemTime>,
    pub if_unmodified_since: Option<SystemTime>,
}

impl Conditions {
    /// An unconditional, full-object fetch.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single fetch of `key` in `bucket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub bucket: String,
    pub key: String,
    pub conditions: Conditions,
}

/// Metadata and body of a fetched object.
///
/// The body stream is owned by whoever holds the descriptor; dropping the
/// descriptor releases the upstream connection.
pub struct ObjectDescriptor {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub etag: Option<String>,
    pub cache_control: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub content_language: Option<String>,
    pub expires: Option<String>,
    pub accept_ranges: Option<String>,
    pub last_modified: Option<SystemTime>,
    pub body: ByteStream,
}

impl ObjectDescriptor {
    /// A descriptor with no metadata around `body`.
    pub fn new(body: ByteStream) -> Self {
        Self {
            content_type: None,
            content_length: None,
            etag: None,
            cache_control: None,
            content_encoding: None,
            content_disposition: None,
            content_language: None,
            expires: None,
            accept_ranges: None,
            last_modified: None,
            body,
        }
    }
}

impl fmt::Debug for ObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDescriptor")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("etag", &self.etag)
            .field("last_modified", &self.last_modified)
            .finish_non_exhaustive()
    }
}

/// Failure categories an object store can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamErrorKind {
    NotFound,
    Forbidden,
    PreconditionFailed,
    NotModified,
    InvalidRange,
    MalformedRequest,
    RequestTimeout,
    Unavailable,
    Internal,
    /// The fetch deadline elapsed before the store answered.
    Timeout,
    /// Anything else, including transport failures.
    Unknown,
}

impl UpstreamErrorKind {
    /// Every category, in status-translation priority order.
    pub const ALL: [UpstreamErrorKind; 11] = [
        UpstreamErrorKind::Timeout,
        UpstreamErrorKind::NotFound,
        UpstreamErrorKind::Forbidden,
        UpstreamErrorKind::PreconditionFailed,
        UpstreamErrorKind::NotModified,
        UpstreamErrorKind::InvalidRange,
        UpstreamErrorKind::MalformedRequest,
        UpstreamErrorKind::RequestTimeout,
        UpstreamErrorKind::Unavailable,
        UpstreamErrorKind::Internal,
        UpstreamErrorKind::Unknown,
    ];

    /// Classify an S3 error code. Returns `None` for unrecognized codes.
    pub fn from_code(code: &str) -> Option<Self> {
        let kind = match code {
            "NoSuchBucket" | "NoSuchKey" | "NotFound" | "NoSuchVersion" => Self::NotFound,
            "AccessDenied"
            | "Forbidden"
            | "SignatureDoesNotMatch"
            | "InvalidAccessKeyId"
            | "ExpiredToken"
            | "RequestTimeTooSkewed"
            | "InvalidObjectState" => Self::Forbidden,
            "PreconditionFailed" => Self::PreconditionFailed,
            "NotModified" => Self::NotModified,
            "InvalidRange" => Self::InvalidRange,
            "AuthorizationHeaderMalformed" | "InvalidRequest" | "InvalidArgument" | "MalformedXML" => {
                Self::MalformedRequest
            }
            "RequestTimeout" => Self::RequestTimeout,
            "SlowDown" | "ServiceUnavailable" => Self::Unavailable,
            "InternalError" => Self::Internal,
            _ => return None,
        };
        Some(kind)
    }

    /// Classify a raw upstream HTTP status when no error code is available.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            304 => Self::NotModified,
            400 => Self::MalformedRequest,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            408 => Self::RequestTimeout,
            412 => Self::PreconditionFailed,
            416 => Self::InvalidRange,
            429 | 503 => Self::Unavailable,
            500 => Self::Internal,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::PreconditionFailed => "precondition_failed",
            Self::NotModified => "not_modified",
            Self::InvalidRange => "invalid_range",
            Self::MalformedRequest => "malformed_request",
            Self::RequestTimeout => "request_timeout",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A categorized object-store failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The single capability the proxy needs from an object store.
///
/// Implementations must be safe to call concurrently from many requests.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Fetch one object, honoring the request's preconditions.
    async fn get_object(&self, request: FetchRequest) -> Result<ObjectDescriptor, UpstreamError>;
}
