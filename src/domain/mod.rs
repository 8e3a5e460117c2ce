pub mod shared;
pub mod tts;
