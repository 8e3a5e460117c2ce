use super::speech_repository::{AudioByteStream, SpeechRepository};
use crate::domain::shared::error_dto::error_message_from_body;
use crate::domain::shared::redact;
use crate::domain::tts::{ClientConfig, Provider, SpeechRequest, StreamFormat};
use crate::error::{AppError, AppResult};
use crate::infrastructure::http::{chunked_body, sse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

/// Public OpenAI speech endpoint
pub const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

const AZURE_KEY_HEADER: &str = "api-key";

/// Where and how a provider expects speech requests
#[derive(Debug, Clone)]
pub struct ProviderRoute {
    pub url: String,
    pub headers: HeaderMap,
}

/// Map a provider to its endpoint and headers.
///
/// OpenAI authenticates with a bearer token against the public endpoint unless
/// `endpoint` overrides it. Azure authenticates with an `api-key` header and
/// has no public endpoint, so one must be configured.
pub fn provider_route(
    provider: Provider,
    api_key: &str,
    endpoint: Option<&str>,
) -> AppResult<ProviderRoute> {
    let endpoint = endpoint.map(str::trim).filter(|e| !e.is_empty());

    let (url, key_header, key_value) = match provider {
        Provider::OpenAi => (
            endpoint.unwrap_or(OPENAI_SPEECH_URL).to_string(),
            AUTHORIZATION,
            format!("Bearer {}", api_key),
        ),
        Provider::Azure => {
            let url = endpoint.ok_or_else(|| {
                AppError::InvalidConfig("Azure provider requires an endpoint".to_string())
            })?;
            (
                url.to_string(),
                HeaderName::from_static(AZURE_KEY_HEADER),
                api_key.to_string(),
            )
        }
    };

    let mut key_value = HeaderValue::from_str(&key_value).map_err(|_| {
        AppError::InvalidConfig("API key contains characters not allowed in a header".to_string())
    })?;
    key_value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(key_header, key_value);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(ProviderRoute { url, headers })
}

/// Speech repository for the OpenAI and Azure OpenAI speech endpoints
pub struct OpenAiSpeechRepository {
    client: reqwest::Client,
    provider: Provider,
    route: ProviderRoute,
}

impl OpenAiSpeechRepository {
    pub fn new(client: reqwest::Client, config: &ClientConfig) -> AppResult<Self> {
        let route = provider_route(config.provider, &config.api_key, config.endpoint.as_deref())?;
        Ok(Self {
            client,
            provider: config.provider,
            route,
        })
    }
}

#[async_trait]
impl SpeechRepository for OpenAiSpeechRepository {
    async fn stream_speech(&self, request: &SpeechRequest) -> AppResult<AudioByteStream> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            provider = %self.provider,
            model = %request.model,
            voice = %request.voice,
            text_length = request.input.chars().count(),
            response_format = %request.response_format,
            stream_format = %request.stream_format,
            "Calling speech API"
        );

        let response = self
            .client
            .post(&self.route.url)
            .headers(self.route.headers.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            // Partial bodies of rejected requests are never treated as audio
            let body = response.text().await.unwrap_or_default();
            let message = redact(&error_message_from_body(&body));
            tracing::error!(
                provider = %self.provider,
                status = status.as_u16(),
                error = %message,
                "Speech API rejected request"
            );
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(
            provider = %self.provider,
            status = status.as_u16(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Speech API responded"
        );

        let body = response.bytes_stream();
        let stream: AudioByteStream = match request.stream_format {
            StreamFormat::Sse => Box::pin(sse::audio_deltas(body)),
            StreamFormat::Audio => Box::pin(chunked_body(body)),
        };
        Ok(stream)
    }
}
