use super::format::{AudioFormat, StreamFormat};
use super::gain::GainInput;
use serde::{Deserialize, Serialize};

/// Per-call overrides supplied by the host.
///
/// A field only overrides the configured value when it is present and
/// non-blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_gain: Option<GainInput>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_audio_output(mut self, format: impl Into<String>) -> Self {
        self.audio_output = Some(format.into());
        self
    }

    pub fn with_stream_format(mut self, stream_format: impl Into<String>) -> Self {
        self.stream_format = Some(stream_format.into());
        self
    }

    pub fn with_playback_speed(mut self, speed: f64) -> Self {
        self.playback_speed = Some(speed);
        self
    }

    pub fn with_volume_gain(mut self, gain: impl Into<GainInput>) -> Self {
        self.volume_gain = Some(gain.into());
        self
    }
}

/// JSON body posted to the speech endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: String,
    pub input: String,
    /// Omitted for models that do not accept instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub response_format: AudioFormat,
    pub speed: f64,
    pub stream_format: StreamFormat,
}

/// Synthesized audio. Construction guarantees a non-empty payload, so a
/// format is never handed out without audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    format: AudioFormat,
    data: Vec<u8>,
}

impl SynthesizedAudio {
    pub fn new(format: AudioFormat, data: Vec<u8>) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        Some(Self { format, data })
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
