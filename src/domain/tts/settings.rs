use super::format::{AudioFormat, Provider, StreamFormat};
use super::gain::{sanitize_volume_gain, GainInput, DEFAULT_VOLUME_GAIN};
use std::time::Duration;

pub const DEFAULT_VOICE: &str = "sage";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-tts";
pub const DEFAULT_PLAYBACK_SPEED: f64 = 1.0;
pub const PLAYBACK_SPEED_MIN: f64 = 0.25;
pub const PLAYBACK_SPEED_MAX: f64 = 4.0;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one client instance.
///
/// Treated as immutable once built: a settings change produces a new value and
/// a new client (see [`super::reload::ReloadableTtsService`]).
#[derive(Clone)]
pub struct ClientConfig {
    pub provider: Provider,
    pub api_key: String,
    /// Required for Azure; replaces the public endpoint for OpenAI
    pub endpoint: Option<String>,
    pub voice: String,
    pub instructions: String,
    pub playback_speed: f64,
    pub model: String,
    pub audio_output: AudioFormat,
    pub stream_format: StreamFormat,
    /// Always within the safe gain band
    pub volume_gain: f64,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            endpoint: None,
            voice: DEFAULT_VOICE.to_string(),
            instructions: String::new(),
            playback_speed: DEFAULT_PLAYBACK_SPEED,
            model: DEFAULT_MODEL.to_string(),
            audio_output: AudioFormat::default(),
            stream_format: StreamFormat::default(),
            volume_gain: DEFAULT_VOLUME_GAIN,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = if endpoint.trim().is_empty() {
            None
        } else {
            Some(endpoint)
        };
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_playback_speed(mut self, speed: f64) -> Self {
        self.playback_speed = clamp_playback_speed(speed);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_audio_output(mut self, format: AudioFormat) -> Self {
        self.audio_output = format;
        self
    }

    pub fn with_stream_format(mut self, stream_format: StreamFormat) -> Self {
        self.stream_format = stream_format;
        self
    }

    /// Stored gain is sanitized silently; call-level overrides are the ones
    /// that get diagnostics
    pub fn with_volume_gain(mut self, gain: impl Into<GainInput>) -> Self {
        self.volume_gain = sanitize_volume_gain(&gain.into(), false);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("voice", &self.voice)
            .field("instructions", &self.instructions)
            .field("playback_speed", &self.playback_speed)
            .field("model", &self.model)
            .field("audio_output", &self.audio_output)
            .field("stream_format", &self.stream_format)
            .field("volume_gain", &self.volume_gain)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Clamp into [PLAYBACK_SPEED_MIN, PLAYBACK_SPEED_MAX]; non-finite means default
pub fn clamp_playback_speed(speed: f64) -> f64 {
    if !speed.is_finite() {
        return DEFAULT_PLAYBACK_SPEED;
    }
    speed.clamp(PLAYBACK_SPEED_MIN, PLAYBACK_SPEED_MAX)
}

/// Structured voice direction, flattened into the free-text instructions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionProfile {
    pub affect: String,
    pub tone: String,
    pub pronunciation: String,
    pub pause: String,
    pub emotion: String,
}

impl InstructionProfile {
    /// One `Label: value` line per non-empty field
    pub fn compose(&self) -> String {
        [
            ("Affect/personality", &self.affect),
            ("Tone", &self.tone),
            ("Pronunciation", &self.pronunciation),
            ("Pause", &self.pause),
            ("Emotion", &self.emotion),
        ]
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| format!("{}: {}", label, value.trim()))
        .collect::<Vec<_>>()
        .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.compose().is_empty()
    }
}
