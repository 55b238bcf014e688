//! Response writing.
//!
//! # Responsibilities
//! - Copy object metadata onto the client response
//! - Stream the object body (GET) or release it unread (HEAD)
//! - Render terminal failures as a plain-text status line
//!
//! # Design Decisions
//! - Optional headers are only set when the store returned them
//! - Header values the HTTP layer rejects are skipped, never fatal
//! - Successful fetches are always answered with 200

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::store::ObjectDescriptor;

/// Methods the proxy serves, as advertised in `Allow`.
pub const ALLOWED_METHODS: &str = "GET, HEAD";

/// Write a fetched object to the client.
pub fn write_object(descriptor: ObjectDescriptor, method: &Method) -> Response {
    let ObjectDescriptor {
        content_type,
        content_length,
        etag,
        cache_control,
        content_encoding,
        content_disposition,
        content_language,
        expires,
        accept_ranges,
        last_modified,
        body,
    } = descriptor;

    let mut headers = HeaderMap::new();
    headers.insert(header::VARY, HeaderValue::from_static("Accept-Encoding"));

    set_optional(&mut headers, header::CONTENT_TYPE, content_type.as_deref());
    set_optional(&mut headers, header::ETAG, etag.as_deref());
    set_optional(&mut headers, header::CACHE_CONTROL, cache_control.as_deref());
    set_optional(&mut headers, header::CONTENT_ENCODING, content_encoding.as_deref());
    set_optional(&mut headers, header::CONTENT_DISPOSITION, content_disposition.as_deref());
    set_optional(&mut headers, header::CONTENT_LANGUAGE, content_language.as_deref());
    set_optional(&mut headers, header::EXPIRES, expires.as_deref());
    set_optional(&mut headers, header::ACCEPT_RANGES, accept_ranges.as_deref());

    if let Some(length) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    if let Some(modified) = last_modified {
        let formatted = httpdate::fmt_http_date(modified);
        set_optional(&mut headers, header::LAST_MODIFIED, Some(&formatted));
    }

    let body = if *method == Method::HEAD {
        drop(body);
        Body::empty()
    } else {
        Body::from_stream(body)
    };

    (StatusCode::OK, headers, body).into_response()
}

fn set_optional(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>) {
    let Some(value) = value else { return };
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::debug!(header = %name, "Skipping unrepresentable header value"),
    }
}

/// Write a terminal failure as `"<code> <reason>"`.
pub fn write_failure(status: StatusCode) -> Response {
    if status == StatusCode::NOT_MODIFIED {
        return status.into_response();
    }
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        status.to_string(),
    )
        .into_response()
}

/// 405 for anything other than GET and HEAD.
pub fn method_not_allowed() -> Response {
    let status = StatusCode::METHOD_NOT_ALLOWED;
    (
        status,
        [
            (header::ALLOW, ALLOWED_METHODS),
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        ],
        status.to_string(),
    )
        .into_response()
}
