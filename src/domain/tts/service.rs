use super::dto::{CallOptions, SpeechRequest, SynthesizedAudio};
use super::format::AudioFormat;
use super::gain::sanitize_volume_gain;
use super::payload::extract_audio_bytes;
use super::settings::{clamp_playback_speed, ClientConfig, DEFAULT_MODEL, DEFAULT_VOICE};
use super::volume::{apply_volume_gain, AudioTranscoder};
use crate::domain::shared::redact;
use crate::error::{AppError, AppResult};
use crate::infrastructure::http::build_http_client;
use crate::infrastructure::repositories::{AudioByteStream, OpenAiSpeechRepository, SpeechRepository};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

/// Audio forwarded chunk by chunk as it arrives
pub struct AudioStreamHandle {
    pub format: AudioFormat,
    pub stream: Pin<Box<dyn Stream<Item = Bytes> + Send>>,
}

impl std::fmt::Debug for AudioStreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStreamHandle")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait TtsServiceApi: Send + Sync {
    /// Synthesize `text` and return the whole, post-processed payload
    ///
    /// This operation:
    /// - Merges `options` over the configured settings
    /// - Drains the response within the request timeout
    /// - Unwraps wrapped payloads and applies the resolved volume gain
    ///
    /// Every failure is logged and reported as `None`.
    async fn synthesize(&self, text: &str, options: &CallOptions) -> Option<SynthesizedAudio>;

    /// Start a synthesis and hand back its chunks without buffering them.
    ///
    /// Returns `None` when the request cannot be sent or is rejected.
    async fn synthesize_handle(
        &self,
        text: &str,
        options: &CallOptions,
    ) -> Option<AudioStreamHandle>;
}

pub struct TtsService {
    config: Arc<ClientConfig>,
    speech_repo: Arc<dyn SpeechRepository>,
    transcoder: Option<Arc<dyn AudioTranscoder>>,
}

impl TtsService {
    pub fn new(config: ClientConfig, speech_repo: Arc<dyn SpeechRepository>) -> Self {
        Self {
            config: Arc::new(config),
            speech_repo,
            transcoder: None,
        }
    }

    /// Wire the HTTP repository for `config`
    pub fn from_config(config: ClientConfig) -> AppResult<Self> {
        let client = build_http_client(config.request_timeout)?;
        let speech_repo = Arc::new(OpenAiSpeechRepository::new(client, &config)?);
        Ok(Self::new(config, speech_repo))
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn AudioTranscoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    pub fn transcoder(&self) -> Option<Arc<dyn AudioTranscoder>> {
        self.transcoder.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Effective request for one call: call override, then configuration,
    /// then built-in default, field by field
    pub fn resolve(&self, text: &str, options: &CallOptions) -> SpeechRequest {
        let config = &self.config;

        let model = pick(options.model.as_deref(), &config.model, DEFAULT_MODEL);
        let voice = pick(options.voice.as_deref(), &config.voice, DEFAULT_VOICE);
        let instructions = pick(options.instructions.as_deref(), &config.instructions, "");
        let instructions = if model_accepts_instructions(&model) && !instructions.is_empty() {
            Some(instructions)
        } else {
            None
        };

        let response_format =
            parse_override(options.audio_output.as_deref(), "audio_output", config.audio_output);
        let stream_format =
            parse_override(options.stream_format.as_deref(), "stream_format", config.stream_format);

        let speed = options
            .playback_speed
            .filter(|speed| speed.is_finite())
            .map(clamp_playback_speed)
            .unwrap_or(config.playback_speed);

        SpeechRequest {
            model,
            voice,
            input: text.to_string(),
            instructions,
            response_format,
            speed,
            stream_format,
        }
    }

    /// Call-level gain wins over the configured one
    pub fn resolve_gain(&self, options: &CallOptions) -> f64 {
        match &options.volume_gain {
            Some(gain) => sanitize_volume_gain(gain, true),
            None => self.config.volume_gain,
        }
    }

    /// Lazily issue one request and yield its audio chunks in order.
    ///
    /// A rejected request yields nothing. Transport failures surface as `Err`
    /// items. Nothing is sent until the stream is first polled.
    pub fn synthesize_stream(&self, text: &str, options: &CallOptions) -> (AudioFormat, AudioByteStream) {
        let request = self.resolve(text, options);
        let format = request.response_format;
        let speech_repo = self.speech_repo.clone();

        if request.input.trim().is_empty() {
            return (format, Box::pin(futures::stream::empty()));
        }

        let stream: AudioByteStream = Box::pin(async_stream::stream! {
            let mut body = match speech_repo.stream_speech(&request).await {
                Ok(body) => body,
                // Logged by the repository with the redacted message
                Err(AppError::Upstream { .. }) => return,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            while let Some(chunk) = body.next().await {
                yield chunk;
            }
        });
        (format, stream)
    }

    fn log_failure(&self, err: &AppError) {
        let provider = self.config.provider;
        match err {
            AppError::Timeout => tracing::error!(
                provider = %provider,
                timeout_secs = self.config.request_timeout.as_secs_f64(),
                "Speech request timed out"
            ),
            AppError::Upstream { status, .. } => tracing::debug!(
                provider = %provider,
                status = status,
                "Speech request rejected"
            ),
            AppError::Transport(_) => tracing::error!(
                provider = %provider,
                error = %redact(&err.to_string()),
                "Speech request failed"
            ),
            other => tracing::error!(
                provider = %provider,
                kind = other.kind(),
                error = %redact(&other.to_string()),
                "Unexpected error during speech synthesis"
            ),
        }
    }
}

#[async_trait]
impl TtsServiceApi for TtsService {
    async fn synthesize(&self, text: &str, options: &CallOptions) -> Option<SynthesizedAudio> {
        if text.trim().is_empty() {
            tracing::warn!("Empty text; nothing to synthesize");
            return None;
        }

        let start_time = std::time::Instant::now();
        let (format, stream) = self.synthesize_stream(text, options);

        let drained = match tokio::time::timeout(self.config.request_timeout, drain(stream)).await {
            Ok(drained) => drained,
            Err(elapsed) => Err(elapsed.into()),
        };
        let (audio, chunks) = match drained {
            Ok(drained) => drained,
            Err(e) => {
                self.log_failure(&e);
                return None;
            }
        };

        if audio.is_empty() {
            tracing::warn!(
                provider = %self.config.provider,
                format = %format,
                "No audio received from speech API"
            );
            return None;
        }

        let gain = self.resolve_gain(options);
        let transcoder = self.transcoder.clone();
        let processed = tokio::task::spawn_blocking(move || {
            let audio = extract_audio_bytes(format, audio);
            apply_volume_gain(format, audio, gain, transcoder.as_deref())
        })
        .await;

        let audio = match processed {
            Ok(audio) => audio,
            Err(e) => {
                self.log_failure(&AppError::Internal(format!("audio post-processing failed: {}", e)));
                return None;
            }
        };

        let result = SynthesizedAudio::new(format, audio)?;
        tracing::info!(
            provider = %self.config.provider,
            format = %format,
            chunks = chunks,
            audio_size_bytes = result.data().len(),
            characters_count = text.chars().count(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "TTS synthesis completed"
        );
        Some(result)
    }

    async fn synthesize_handle(
        &self,
        text: &str,
        options: &CallOptions,
    ) -> Option<AudioStreamHandle> {
        if text.trim().is_empty() {
            tracing::warn!("Empty text; nothing to synthesize");
            return None;
        }

        let request = self.resolve(text, options);
        let format = request.response_format;

        let started = tokio::time::timeout(
            self.config.request_timeout,
            self.speech_repo.stream_speech(&request),
        )
        .await;
        let mut body = match started {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                self.log_failure(&e);
                return None;
            }
            Err(elapsed) => {
                self.log_failure(&AppError::from(elapsed));
                return None;
            }
        };

        let provider = self.config.provider;
        let stream = async_stream::stream! {
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(chunk) => yield chunk,
                    Err(e) => {
                        tracing::error!(
                            provider = %provider,
                            error = %redact(&e.to_string()),
                            "Audio stream interrupted"
                        );
                        return;
                    }
                }
            }
        };

        Some(AudioStreamHandle {
            format,
            stream: Box::pin(stream),
        })
    }
}

async fn drain(mut stream: AudioByteStream) -> AppResult<(Vec<u8>, usize)> {
    let mut audio = Vec::new();
    let mut chunks = 0;
    while let Some(chunk) = stream.next().await {
        audio.extend_from_slice(&chunk?);
        chunks += 1;
    }
    Ok((audio, chunks))
}

fn pick(call: Option<&str>, configured: &str, default: &str) -> String {
    [call, Some(configured)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn parse_override<T>(call: Option<&str>, field: &'static str, configured: T) -> T
where
    T: FromStr<Err = AppError>,
{
    let Some(value) = call.map(str::trim).filter(|v| !v.is_empty()) else {
        return configured;
    };
    match value.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(field = field, error = %e, "Ignoring invalid call option");
            configured
        }
    }
}

/// `tts-1` and `tts-1-hd` reject the `instructions` field
pub fn model_accepts_instructions(model: &str) -> bool {
    !model.trim().to_ascii_lowercase().starts_with("tts-1")
}
