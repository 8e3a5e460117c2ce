pub mod dto;
pub mod error;
pub mod format;
pub mod gain;
pub mod payload;
pub mod reload;
pub mod service;
pub mod settings;
pub mod volume;

pub use dto::{CallOptions, SpeechRequest, SynthesizedAudio};
pub use error::AudioError;
pub use format::{AudioFormat, Provider, StreamFormat};
pub use gain::{sanitize_volume_gain, GainInput};
pub use payload::extract_audio_bytes;
pub use reload::ReloadableTtsService;
pub use service::{AudioStreamHandle, TtsService, TtsServiceApi};
pub use settings::{ClientConfig, InstructionProfile};
pub use volume::{apply_volume_gain, AudioTranscoder};
