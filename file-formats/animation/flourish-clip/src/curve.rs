//! Scalar keyframe curves with boundary-clamped Hermite evaluation

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Curve values at or above this are treated as `true` by boolean channels
pub const FLAG_THRESHOLD: f32 = 0.5;

/// A single curve key.
///
/// Tangents are slopes (value per second). An infinite tangent on either
/// side of a segment turns that segment into a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    #[serde(serialize_with = "lenient_f32_out", deserialize_with = "lenient_f32")]
    pub time: f32,
    #[serde(serialize_with = "lenient_f32_out", deserialize_with = "lenient_f32")]
    pub value: f32,
    #[serde(
        default,
        serialize_with = "lenient_f32_out",
        deserialize_with = "lenient_f32"
    )]
    pub in_tangent: f32,
    #[serde(
        default,
        serialize_with = "lenient_f32_out",
        deserialize_with = "lenient_f32"
    )]
    pub out_tangent: f32,
}

impl Keyframe {
    /// Key with flat tangents
    pub const fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    /// Key with explicit tangents
    pub const fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Reasons a key list cannot form a curve
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("curve has no keyframes")]
    Empty,
    #[error("keyframe {0} has a non-finite time")]
    NonFiniteTime(usize),
}

/// A time-keyed scalar function.
///
/// Before the first key and after the last key the curve holds the
/// boundary value; it never extrapolates.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    /// Build a curve from keyframes, sorting them by time
    pub fn from_keyframes(mut keys: Vec<Keyframe>) -> Result<Self, CurveError> {
        if keys.is_empty() {
            return Err(CurveError::Empty);
        }
        if let Some(i) = keys.iter().position(|k| !k.time.is_finite()) {
            return Err(CurveError::NonFiniteTime(i));
        }

        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self { keys })
    }

    /// One-key curve that evaluates to `value` everywhere
    pub fn constant(value: f32) -> Self {
        Self {
            keys: vec![Keyframe::new(0.0, value)],
        }
    }

    /// Keys sorted by time
    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// True when the curve has a single key
    pub fn is_constant(&self) -> bool {
        self.keys.len() == 1
    }

    /// Time of the first and last key
    pub fn time_range(&self) -> (f32, f32) {
        match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first.time, last.time),
            _ => (0.0, 0.0),
        }
    }

    /// Evaluate the curve at `time`.
    ///
    /// Safe for any input time, including negative times and times past
    /// the clip duration.
    pub fn evaluate(&self, time: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };

        if self.keys.len() == 1 || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        let Some(index) = find_key_index(&self.keys, time) else {
            return first.value;
        };
        match self.keys.get(index + 1) {
            Some(next) => hermite(&self.keys[index], next, time),
            None => self.keys[index].value,
        }
    }
}

/// Evaluate an optional channel, falling back when it is absent
pub fn evaluate_or(curve: Option<&Curve>, time: f32, fallback: f32) -> f32 {
    curve.map_or(fallback, |c| c.evaluate(time))
}

/// Evaluate an optional boolean channel (`value >= 0.5`)
pub fn evaluate_flag(curve: Option<&Curve>, time: f32) -> bool {
    evaluate_or(curve, time, 0.0) >= FLAG_THRESHOLD
}

/// Find the index of the keyframe at or before the given time
///
/// Returns None if there are no keyframes. For interpolation this is the
/// earlier key of the bracketing pair.
pub fn find_key_index(keys: &[Keyframe], time: f32) -> Option<usize> {
    if keys.is_empty() {
        return None;
    }

    let last_index = keys.len() - 1;
    if time >= keys[last_index].time {
        return Some(last_index);
    }

    // Largest index where keys[index].time <= time
    let mut low = 0;
    let mut high = last_index;

    while low < high {
        let mid = (low + high).div_ceil(2);
        if keys[mid].time <= time {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Some(low)
}

fn hermite(a: &Keyframe, b: &Keyframe, time: f32) -> f32 {
    let dt = b.time - a.time;
    if dt <= 0.0 {
        return b.value;
    }
    if !a.out_tangent.is_finite() || !b.in_tangent.is_finite() {
        return a.value;
    }

    let t = ((time - a.time) / dt).clamp(0.0, 1.0);
    let t2 = t * t;
    let t3 = t2 * t;

    let m0 = a.out_tangent * dt;
    let m1 = b.in_tangent * dt;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * a.value + h10 * m0 + h01 * b.value + h11 * m1
}

/// Accepts plain numbers as well as the `"Infinity"`, `"-Infinity"` and
/// `"NaN"` strings the exporter writes for stepped tangents.
fn lenient_f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n as f32),
        NumberOrString::Text(s) => match s.trim() {
            "Infinity" | "inf" => Ok(f32::INFINITY),
            "-Infinity" | "-inf" => Ok(f32::NEG_INFINITY),
            "NaN" => Ok(f32::NAN),
            other => other.parse::<f32>().map_err(serde::de::Error::custom),
        },
    }
}

/// Writes non-finite values as the strings [`lenient_f32`] reads back,
/// since JSON numbers cannot hold them.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn lenient_f32_out<S>(value: &f32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        serializer.serialize_f32(*value)
    }
}
