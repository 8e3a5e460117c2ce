use super::error::AudioError;
use super::format::AudioFormat;
use super::gain::{is_unity, sanitize_volume_gain, GainInput};
use std::borrow::Cow;
use std::io::Cursor;

/// Sample width of raw `pcm` output from the speech API
const PCM_SAMPLE_BYTES: usize = 2;

/// External codec capability used to apply gain to compressed audio.
///
/// Implementations decode `audio`, apply `gain_db` decibels and re-encode to
/// the same format.
pub trait AudioTranscoder: Send + Sync {
    fn apply_gain_db(
        &self,
        format: AudioFormat,
        audio: &[u8],
        gain_db: f64,
    ) -> Result<Vec<u8>, AudioError>;
}

/// Linear multiplier to decibels
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.log10()
}

/// Scale `audio` by `gain`, best effort.
///
/// WAV and PCM are scaled exactly with saturation; other formats go through
/// `transcoder` when one is available. On any failure the input is returned
/// unchanged.
pub fn apply_volume_gain(
    format: AudioFormat,
    audio: Vec<u8>,
    gain: f64,
    transcoder: Option<&dyn AudioTranscoder>,
) -> Vec<u8> {
    if audio.is_empty() {
        return audio;
    }

    let gain = sanitize_volume_gain(&GainInput::Number(gain), true);
    if is_unity(gain) {
        return audio;
    }

    let scaled = if format.is_uncompressed() {
        match format {
            AudioFormat::Wav => scale_wav(&audio, gain),
            _ => scale_pcm16(&audio, gain),
        }
    } else {
        match transcoder {
            Some(transcoder) => transcoder.apply_gain_db(format, &audio, gain_to_db(gain)),
            None => {
                tracing::warn!(
                    format = %format,
                    "Install FFmpeg to enable volume scaling for compressed audio"
                );
                return audio;
            }
        }
    };

    match scaled {
        Ok(scaled) if !scaled.is_empty() => {
            tracing::debug!(
                format = %format,
                gain = gain,
                input_size = audio.len(),
                output_size = scaled.len(),
                "Volume gain applied"
            );
            scaled
        }
        Ok(_) => {
            tracing::warn!(format = %format, "Volume gain produced no audio; keeping original");
            audio
        }
        Err(e) => {
            tracing::warn!(
                format = %format,
                error = %e,
                "Unable to apply volume gain; keeping original audio"
            );
            audio
        }
    }
}

/// Scale 16-bit signed little-endian samples with saturation
pub fn scale_pcm16(frames: &[u8], gain: f64) -> Result<Vec<u8>, AudioError> {
    if frames.len() % PCM_SAMPLE_BYTES != 0 {
        return Err(AudioError::PartialFrame(frames.len()));
    }

    Ok(frames
        .chunks_exact(PCM_SAMPLE_BYTES)
        .flat_map(|pair| {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            let scaled = scale_int_sample(sample as i32, gain, i16::MIN as i32, i16::MAX as i32);
            (scaled as i16).to_le_bytes()
        })
        .collect())
}

fn scale_int_sample(sample: i32, gain: f64, min: i32, max: i32) -> i32 {
    (sample as f64 * gain).clamp(min as f64, max as f64).floor() as i32
}

/// Clamp the `data` chunk length to the bytes actually present, in whole
/// frames, and fix the RIFF length to match.
///
/// Streamed WAV declares unknown sizes (`0xFFFFFFFF`) and a truncated body
/// declares more than it carries; both would make the decoder stop at EOF.
fn clamp_wav_data_chunk(audio: &[u8]) -> Cow<'_, [u8]> {
    if audio.len() < 12 || &audio[0..4] != b"RIFF" || &audio[8..12] != b"WAVE" {
        return Cow::Borrowed(audio);
    }

    let mut block_align = 1usize;
    let mut pos = 12usize;
    while pos + 8 <= audio.len() {
        let id = &audio[pos..pos + 4];
        let size = u32::from_le_bytes([audio[pos + 4], audio[pos + 5], audio[pos + 6], audio[pos + 7]]);
        let body = pos + 8;

        if id == b"fmt " && body + 14 <= audio.len() {
            block_align = u16::from_le_bytes([audio[body + 12], audio[body + 13]]).max(1) as usize;
        }

        if id == b"data" {
            let available = audio.len() - body;
            if size as usize <= available {
                return Cow::Borrowed(audio);
            }
            let data_len = available - available % block_align;
            let mut fixed = audio[..body + data_len].to_vec();
            fixed[pos + 4..pos + 8].copy_from_slice(&(data_len as u32).to_le_bytes());
            let riff_len = (fixed.len() - 8) as u32;
            fixed[4..8].copy_from_slice(&riff_len.to_le_bytes());
            tracing::debug!(
                declared = size,
                data_len = data_len,
                "WAV data length clamped to payload"
            );
            return Cow::Owned(fixed);
        }

        // Chunks are word aligned
        pos = body
            .saturating_add(size as usize)
            .saturating_add((size & 1) as usize);
    }
    Cow::Borrowed(audio)
}

fn scale_wav(audio: &[u8], gain: f64) -> Result<Vec<u8>, AudioError> {
    let audio = clamp_wav_data_chunk(audio);
    let mut reader = hound::WavReader::new(Cursor::new(audio.as_ref()))?;
    let spec = reader.spec();

    let mut out = Vec::with_capacity(audio.len());
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut out), spec)?;
        match spec.sample_format {
            hound::SampleFormat::Int => {
                let bits = spec.bits_per_sample;
                if !matches!(bits, 8 | 16 | 24 | 32) {
                    return Err(AudioError::UnsupportedSampleWidth(bits));
                }
                let max = ((1i64 << (bits - 1)) - 1) as i32;
                let min = (-(1i64 << (bits - 1))) as i32;
                for sample in reader.samples::<i32>() {
                    writer.write_sample(scale_int_sample(sample?, gain, min, max))?;
                }
            }
            hound::SampleFormat::Float => {
                if spec.bits_per_sample != 32 {
                    return Err(AudioError::UnsupportedSampleWidth(spec.bits_per_sample));
                }
                for sample in reader.samples::<f32>() {
                    let scaled = (sample? as f64 * gain).clamp(-1.0, 1.0) as f32;
                    writer.write_sample(scaled)?;
                }
            }
        }
        writer.finalize()?;
    }
    Ok(out)
}
