use crate::domain::tts::{AudioError, AudioFormat, AudioTranscoder};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";

/// Applies gain to compressed audio by piping it through an `ffmpeg` process
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Return a transcoder only when `binary -version` runs successfully
    pub fn detect(binary: impl AsRef<Path>) -> Option<Self> {
        let binary = binary.as_ref();
        let probe = Command::new(binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match probe {
            Ok(status) if status.success() => {
                tracing::debug!(binary = %binary.display(), "FFmpeg detected");
                Some(Self::new(binary))
            }
            Ok(status) => {
                tracing::debug!(binary = %binary.display(), status = %status, "FFmpeg probe failed");
                None
            }
            Err(e) => {
                tracing::debug!(binary = %binary.display(), error = %e, "FFmpeg not available");
                None
            }
        }
    }
}

/// How ffmpeg reads and writes one compressed speech format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfmpegCodec {
    pub demuxer: &'static str,
    pub encoder: &'static str,
    pub muxer: &'static str,
}

/// Codec settings for a compressed speech format
pub fn codec_for(format: AudioFormat) -> Option<FfmpegCodec> {
    let (demuxer, encoder, muxer) = match format {
        AudioFormat::Mp3 => ("mp3", "libmp3lame", "mp3"),
        // Ogg is read generically but written with the Opus muxer so the
        // ogg default encoder (Vorbis) is never picked
        AudioFormat::Opus => ("ogg", "libopus", "opus"),
        AudioFormat::Aac => ("aac", "aac", "adts"),
        AudioFormat::Flac => ("flac", "flac", "flac"),
        AudioFormat::Wav | AudioFormat::Pcm => return None,
    };
    Some(FfmpegCodec {
        demuxer,
        encoder,
        muxer,
    })
}

/// Arguments that pipe `format` audio through a `volume` filter and
/// re-encode it to the same format
pub fn gain_args(format: AudioFormat, gain_db: f64) -> Result<Vec<String>, AudioError> {
    let codec = codec_for(format).ok_or_else(|| AudioError::UnsupportedFormat(format.to_string()))?;

    Ok([
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        codec.demuxer,
        "-i",
        "pipe:0",
        "-af",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(format!("volume={:.4}dB", gain_db)))
    .chain(
        ["-c:a", codec.encoder, "-f", codec.muxer, "pipe:1"]
            .iter()
            .map(|s| s.to_string()),
    )
    .collect())
}

impl AudioTranscoder for FfmpegTranscoder {
    fn apply_gain_db(
        &self,
        format: AudioFormat,
        audio: &[u8],
        gain_db: f64,
    ) -> Result<Vec<u8>, AudioError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(gain_args(format, gain_db)?)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(command = ?cmd, input_size = audio.len(), "Running ffmpeg");
        let mut child = cmd.spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AudioError::Transcoder("ffmpeg stdin unavailable".to_string()))?;

        // Feed stdin from a second thread so a full stdout pipe cannot stall us
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(audio));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("ffmpeg stdin writer panicked")));
            (output, written)
        });

        let output = output?;
        if !output.status.success() {
            return Err(AudioError::Transcoder(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        // ffmpeg may close stdin early once it has what it needs
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }

        Ok(output.stdout)
    }
}
