//! Timeout enforcement.
//!
//! # Responsibilities
//! - Derive per-attempt deadlines from the configured fetch timeout
//! - Bound the upstream call and the body copy by the same deadline
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - A body that outlives its deadline ends with a `TimedOut` I/O error

use std::future::Future;
use std::io;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::time::{error::Elapsed, Instant};

use crate::store::ByteStream;

/// Deadline `timeout` from now.
pub fn deadline_after(timeout: Duration) -> Instant {
    Instant::now() + timeout
}

/// Run `future`, giving up at `deadline`.
pub async fn with_deadline<F: Future>(deadline: Instant, future: F) -> Result<F::Output, Elapsed> {
    tokio::time::timeout_at(deadline, future).await
}

/// Bound every chunk of `body` by `deadline`.
///
/// When the deadline passes the stream yields one `TimedOut` error and ends,
/// dropping (and so releasing) the inner stream.
pub fn deadline_stream(body: ByteStream, deadline: Instant) -> ByteStream {
    stream::unfold(Some(body), move |state| async move {
        let mut body = state?;
        match tokio::time::timeout_at(deadline, body.next()).await {
            Ok(Some(chunk)) => Some((chunk, Some(body))),
            Ok(None) => None,
            Err(_) => Some((
                Err(io::Error::new(io::ErrorKind::TimedOut, "object body deadline exceeded")),
                None,
            )),
        }
    })
    .boxed()
}
