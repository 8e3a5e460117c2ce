/// Failures while post-processing audio. Never surfaced to callers: the
/// post-processor logs them and hands back the untouched audio.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
    #[error("unsupported sample width: {0} bits")]
    UnsupportedSampleWidth(u16),
    #[error("pcm payload is not a whole number of frames ({0} bytes)")]
    PartialFrame(usize),
    #[error("unsupported format for transcoding: {0}")]
    UnsupportedFormat(String),
    #[error("transcoder failed: {0}")]
    Transcoder(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
