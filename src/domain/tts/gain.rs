use serde::{Deserialize, Serialize};

/// Quietest allowed multiplier; never fully mute
pub const VOLUME_GAIN_MIN: f64 = 0.1;
/// Loudest allowed multiplier; beyond this clipping becomes destructive
pub const VOLUME_GAIN_MAX: f64 = 3.0;
pub const DEFAULT_VOLUME_GAIN: f64 = 1.0;

/// A gain value as supplied by a host: a number, a string, or anything else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GainInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl GainInput {
    /// Numeric coercion. Non-finite values are returned as-is.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GainInput::Number(n) => Some(*n),
            GainInput::Text(s) => s.trim().parse::<f64>().ok(),
            GainInput::Other(_) => None,
        }
    }
}

impl From<f64> for GainInput {
    fn from(value: f64) -> Self {
        GainInput::Number(value)
    }
}

impl From<&str> for GainInput {
    fn from(value: &str) -> Self {
        GainInput::Text(value.to_string())
    }
}

impl std::fmt::Display for GainInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GainInput::Number(n) => write!(f, "{n}"),
            GainInput::Text(s) => write!(f, "{s:?}"),
            GainInput::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Float comparison used for both "did clamping change it" and "is this unity"
pub fn is_close(a: f64, b: f64) -> bool {
    let tolerance = (1e-3 * a.abs().max(b.abs())).max(1e-3);
    (a - b).abs() <= tolerance
}

pub fn is_unity(gain: f64) -> bool {
    is_close(gain, 1.0)
}

/// Normalize a user-provided gain into [VOLUME_GAIN_MIN, VOLUME_GAIN_MAX].
///
/// Invalid or non-finite input resolves to [`DEFAULT_VOLUME_GAIN`]. With
/// `log_on_change` a warning is emitted for invalid input and for values that
/// had to be clamped.
pub fn sanitize_volume_gain(value: &GainInput, log_on_change: bool) -> f64 {
    let Some(gain) = value.as_f64() else {
        if log_on_change {
            tracing::warn!(
                value = %value,
                fallback = DEFAULT_VOLUME_GAIN,
                "Invalid volume gain; using default"
            );
        }
        return DEFAULT_VOLUME_GAIN;
    };

    if !gain.is_finite() {
        if log_on_change {
            tracing::warn!(
                value = %value,
                fallback = DEFAULT_VOLUME_GAIN,
                "Non-finite volume gain; using default"
            );
        }
        return DEFAULT_VOLUME_GAIN;
    }

    let clamped = gain.clamp(VOLUME_GAIN_MIN, VOLUME_GAIN_MAX);
    if log_on_change && !is_close(clamped, gain) {
        tracing::warn!(
            requested = gain,
            applied = clamped,
            min = VOLUME_GAIN_MIN,
            max = VOLUME_GAIN_MAX,
            "Volume gain adjusted into safe range"
        );
    }
    clamped
}
