use crate::domain::tts::SpeechRequest;
use crate::error::AppResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// Ordered, non-restartable sequence of audio chunks
pub type AudioByteStream = Pin<Box<dyn Stream<Item = AppResult<Bytes>> + Send>>;

/// Transport for speech synthesis requests.
///
/// Implementations are responsible for:
/// - Issuing exactly one request per call
/// - Turning a rejected request into `AppError::Upstream` with a redacted message
/// - Yielding decoded audio chunks in arrival order, whatever the wire framing
#[async_trait]
pub trait SpeechRepository: Send + Sync {
    /// Send `request` and return its audio body as a chunk stream
    ///
    /// # Errors
    /// Returns error if the request cannot be sent or the provider rejects it.
    /// Failures while reading the body surface as `Err` items in the stream.
    async fn stream_speech(&self, request: &SpeechRequest) -> AppResult<AudioByteStream>;
}
