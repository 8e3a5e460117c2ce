pub mod sse;

use crate::error::{AppError, AppResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::time::Duration;

/// Largest slice handed downstream from a raw (non-SSE) body
pub const AUDIO_READ_SIZE: usize = 8192;

/// Build the shared HTTP client. `timeout` bounds each request end to end,
/// body read included.
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Re-slice a raw body into non-empty pieces of at most [`AUDIO_READ_SIZE`]
/// bytes, preserving order. The first transport error ends the stream.
pub fn chunked_body<S, E>(body: S) -> impl Stream<Item = AppResult<Bytes>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    async_stream::stream! {
        let mut body = Box::pin(body);

        while let Some(raw) = body.next().await {
            let mut raw = match raw {
                Ok(raw) => raw,
                Err(e) => {
                    yield Err::<Bytes, AppError>(e.into());
                    return;
                }
            };
            while !raw.is_empty() {
                let take = raw.len().min(AUDIO_READ_SIZE);
                yield Ok(raw.split_to(take));
            }
        }
    }
}
