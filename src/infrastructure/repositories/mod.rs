pub mod openai_speech_repository;
pub mod speech_repository;

pub use openai_speech_repository::{provider_route, OpenAiSpeechRepository, ProviderRoute};
pub use speech_repository::{AudioByteStream, SpeechRepository};
