use super::format::AudioFormat;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Anything shorter cannot be meaningful audio
const MIN_BASE64_LEN: usize = 8;

/// Keys checked, in order, when a provider wraps audio in a JSON object
const JSON_AUDIO_KEYS: [&str; 3] = ["audio", "data", "value"];

// Real binary audio almost always contains bytes outside this set (NUL in
// particular), which is what keeps raw PCM from being mistaken for text.
static BASE64_BYTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/=\r\n]+$").expect("valid base64 pattern"));

/// Decode `data` when it looks like a base64 encoding of binary audio.
///
/// Requires the base64 alphabet only, a minimal length, a strict decode and a
/// decoded payload strictly shorter than the input.
pub fn maybe_decode_base64(data: &[u8]) -> Option<Vec<u8>> {
    let sample = data.trim_ascii();
    if sample.len() < MIN_BASE64_LEN || !BASE64_BYTES_RE.is_match(sample) {
        return None;
    }

    let compact: Vec<u8> = sample
        .iter()
        .copied()
        .filter(|b| *b != b'\r' && *b != b'\n')
        .collect();
    let decoded = BASE64.decode(compact).ok()?;

    if decoded.is_empty() || decoded.len() >= sample.len() {
        return None;
    }
    Some(decoded)
}

/// Return raw binary audio, unwrapping base64 or JSON-wrapped payloads.
///
/// Anything that does not positively look wrapped is returned unchanged.
pub fn extract_audio_bytes(format: AudioFormat, audio: Vec<u8>) -> Vec<u8> {
    if audio.is_empty() {
        return audio;
    }

    if format == AudioFormat::Pcm {
        if let Some(decoded) = maybe_decode_base64(&audio) {
            tracing::debug!(
                encoded_size = audio.len(),
                decoded_size = decoded.len(),
                "Decoded base64-wrapped PCM payload"
            );
            return decoded;
        }
    }

    let Ok(text) = std::str::from_utf8(&audio) else {
        return audio;
    };
    let Ok(serde_json::Value::Object(object)) = serde_json::from_str::<serde_json::Value>(text)
    else {
        return audio;
    };

    for key in JSON_AUDIO_KEYS {
        if let Some(serde_json::Value::String(candidate)) = object.get(key) {
            if let Some(decoded) = maybe_decode_base64(candidate.as_bytes()) {
                tracing::debug!(
                    field = key,
                    decoded_size = decoded.len(),
                    "Decoded JSON-wrapped audio payload"
                );
                return decoded;
            }
        }
    }

    audio
}
