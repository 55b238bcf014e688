//! S3-compatible object store backed by `aws-sdk-s3`.

use std::io;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
use aws_sdk_s3::primitives::{ByteStream as SdkByteStream, DateTime};
use futures_util::stream::{self, StreamExt};

use super::{ByteStream, FetchRequest, ObjectDescriptor, ObjectStore, UpstreamError, UpstreamErrorKind};
use crate::config::UpstreamConfig;

/// Object store talking to S3 or MinIO over the AWS SDK.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Build the shared client from configuration.
    ///
    /// Uses static credentials when both keys are configured. Against an
    /// explicit endpoint without keys, requests are sent unsigned.
    pub async fn from_config(config: &UpstreamConfig) -> Self {
        let endpoint = base_endpoint(&config.endpoint_url);

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts));

        match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key), Some(secret_key)) => {
                loader = loader.credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "frontend-asset-proxy",
                ));
            }
            _ if endpoint.is_some() => {
                loader = loader.no_credentials();
            }
            _ => {}
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = endpoint {
            tracing::info!(endpoint = %endpoint, "Using path-style S3 endpoint");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::from_client(aws_sdk_s3::Client::from_conf(builder.build()))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, request: FetchRequest) -> Result<ObjectDescriptor, UpstreamError> {
        let FetchRequest {
            bucket,
            key,
            conditions,
        } = request;

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_range(conditions.range)
            .set_if_none_match(conditions.if_none_match)
            .set_if_match(conditions.if_match)
            .set_if_modified_since(conditions.if_modified_since.map(DateTime::from))
            .set_if_unmodified_since(conditions.if_unmodified_since.map(DateTime::from))
            .send()
            .await
            .map_err(|err| UpstreamError::new(classify(&err), DisplayErrorContext(&err).to_string()))?;

        Ok(descriptor_from(output))
    }
}

/// Reduce an endpoint URL to `scheme://host[:port]`. Returns `None` when the
/// URL is empty or lacks a scheme or host.
pub fn base_endpoint(endpoint_url: &str) -> Option<String> {
    let url = url::Url::parse(endpoint_url).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

fn classify(err: &SdkError<GetObjectError>) -> UpstreamErrorKind {
    match err {
        SdkError::TimeoutError(_) => UpstreamErrorKind::Timeout,
        SdkError::ServiceError(ctx) => ctx
            .err()
            .code()
            .and_then(UpstreamErrorKind::from_code)
            .unwrap_or_else(|| UpstreamErrorKind::from_http_status(ctx.raw().status().as_u16())),
        SdkError::ResponseError(ctx) => UpstreamErrorKind::from_http_status(ctx.raw().status().as_u16()),
        _ => UpstreamErrorKind::Unknown,
    }
}

fn descriptor_from(output: GetObjectOutput) -> ObjectDescriptor {
    ObjectDescriptor {
        content_type: output.content_type,
        content_length: output.content_length.and_then(|len| u64::try_from(len).ok()),
        etag: output.e_tag,
        cache_control: output.cache_control,
        content_encoding: output.content_encoding,
        content_disposition: output.content_disposition,
        content_language: output.content_language,
        expires: output.expires_string,
        accept_ranges: output.accept_ranges,
        last_modified: output.last_modified.and_then(|dt| SystemTime::try_from(dt).ok()),
        body: into_stream(output.body),
    }
}

fn into_stream(body: SdkByteStream) -> ByteStream {
    stream::unfold(body, |mut body| async move {
        body.next()
            .await
            .map(|chunk| (chunk.map_err(io::Error::other), body))
    })
    .boxed()
}
