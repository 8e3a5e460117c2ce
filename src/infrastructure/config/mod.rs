use crate::domain::tts::{
    AudioFormat, ClientConfig, GainInput, InstructionProfile, Provider, StreamFormat,
};
use crate::infrastructure::ffmpeg::DEFAULT_FFMPEG_BINARY;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    pub log_format: LogFormat,
    /// Where the command-line host writes synthesized audio
    pub output_path: PathBuf,
    pub ffmpeg_path: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;

        let provider = match var("TTS_PROVIDER") {
            Some(value) => value.parse::<Provider>().context("Invalid TTS_PROVIDER")?,
            None => Provider::OpenAi,
        };
        let audio_output = match var("TTS_AUDIO_OUTPUT") {
            Some(value) => value.parse::<AudioFormat>().context("Invalid TTS_AUDIO_OUTPUT")?,
            None => AudioFormat::default(),
        };
        let stream_format = match var("TTS_STREAM_FORMAT") {
            Some(value) => value
                .parse::<StreamFormat>()
                .context("Invalid TTS_STREAM_FORMAT")?,
            None => StreamFormat::default(),
        };

        let mut client = ClientConfig::new(provider, api_key)
            .with_audio_output(audio_output)
            .with_stream_format(stream_format);

        if let Some(endpoint) = var("TTS_ENDPOINT").or_else(|| var("AZURE_OPENAI_ENDPOINT")) {
            client = client.with_endpoint(endpoint);
        }
        if let Some(voice) = var("TTS_VOICE") {
            client = client.with_voice(voice.trim());
        }
        if let Some(model) = var("TTS_MODEL") {
            client = client.with_model(model.trim());
        }

        let instructions = var("TTS_INSTRUCTIONS").unwrap_or_else(|| {
            InstructionProfile {
                affect: var("TTS_AFFECT").unwrap_or_default(),
                tone: var("TTS_TONE").unwrap_or_default(),
                pronunciation: var("TTS_PRONUNCIATION").unwrap_or_default(),
                pause: var("TTS_PAUSE").unwrap_or_default(),
                emotion: var("TTS_EMOTION").unwrap_or_default(),
            }
            .compose()
        });
        client = client.with_instructions(instructions);

        if let Some(speed) = var("TTS_PLAYBACK_SPEED") {
            let speed: f64 = speed
                .trim()
                .parse()
                .context("TTS_PLAYBACK_SPEED must be a number")?;
            client = client.with_playback_speed(speed);
        }
        if let Some(gain) = var("TTS_VOLUME_GAIN") {
            client = client.with_volume_gain(GainInput::Text(gain));
        }
        if let Some(secs) = var("TTS_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .context("TTS_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
            anyhow::ensure!(secs > 0, "TTS_REQUEST_TIMEOUT_SECS must be greater than zero");
            client = client.with_request_timeout(Duration::from_secs(secs));
        }

        let log_format = match var("LOG_FORMAT").as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let output_path = var("TTS_OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("speech.{}", audio_output)));

        Ok(Config {
            client,
            log_format,
            output_path,
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or_else(|| DEFAULT_FFMPEG_BINARY.to_string()),
        })
    }
}
