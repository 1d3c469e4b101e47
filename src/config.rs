//! Benchmark configuration and the coercion of untrusted input into it.
//!
//! Nothing past [`BenchConfig::from_raw`] re-validates: the engine assumes
//! every field is inside its [`FieldBounds`].

use std::borrow::Cow;
use std::num::IntErrorKind;

use serde::Serialize;
use serde_json::{Map, Value};

/// Inclusive range and fallback for one configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBounds {
    pub name: &'static str,
    pub lo: i64,
    pub hi: i64,
    pub default: i64,
}

impl FieldBounds {
    /// Coerces the field named `self.name` out of `raw`. Missing fields take the default.
    pub fn extract(&self, raw: &Map<String, Value>) -> usize {
        let value = raw
            .get(self.name)
            .map_or(self.default, |v| clamp_int(v, self.lo, self.hi, self.default));
        // lo >= 1 for every field, so the clamped value is positive
        value as usize
    }
}

pub const THREAD_COUNT: FieldBounds = FieldBounds {
    name: "thread_count",
    lo: 1,
    hi: 64,
    default: 4,
};

pub const CHUNK_SIZE: FieldBounds = FieldBounds {
    name: "chunk_size",
    lo: 1,
    hi: 4096,
    default: 128,
};

pub const MATRIX_SIZE: FieldBounds = FieldBounds {
    name: "matrix_size",
    lo: 128,
    hi: 4096,
    default: 1024,
};

pub const REPEATS: FieldBounds = FieldBounds {
    name: "repeats",
    lo: 1,
    hi: 15,
    default: 5,
};

/// Validated parameters of one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchConfig {
    /// Workers requested for the pooled path.
    pub thread_count: usize,
    /// Rows per chunk task.
    pub chunk_size: usize,
    /// Square matrix dimension.
    pub matrix_size: usize,
    /// Timed passes after the warm-up.
    pub repeats: usize,
}

impl BenchConfig {
    /// Applies the field bounds to a raw request body.
    ///
    /// # Examples
    ///
    /// ```
    /// use parscale::config::BenchConfig;
    /// use serde_json::json;
    ///
    /// let raw = json!({"thread_count": "8", "matrix_size": 50, "repeats": "lots"});
    /// let config = BenchConfig::from_raw(raw.as_object().unwrap());
    ///
    /// assert_eq!(config.thread_count, 8);
    /// assert_eq!(config.chunk_size, 128);
    /// assert_eq!(config.matrix_size, 128);
    /// assert_eq!(config.repeats, 5);
    /// ```
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        Self {
            thread_count: THREAD_COUNT.extract(raw),
            chunk_size: CHUNK_SIZE.extract(raw),
            matrix_size: MATRIX_SIZE.extract(raw),
            repeats: REPEATS.extract(raw),
        }
    }

    /// The same configuration with a different worker count.
    pub fn with_thread_count(self, thread_count: usize) -> Self {
        Self {
            thread_count,
            ..self
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::from_raw(&Map::new())
    }
}

/// Interprets `raw` as an integer bounded into `[lo, hi]`, or returns `default`.
///
/// Integers are taken as-is, finite floats are truncated toward zero, strings
/// are trimmed and parsed with optional `_` digit separators, and booleans
/// count as `1` and `0`. Out-of-range integers saturate before clamping.
/// Everything else yields `default`.
pub fn clamp_int(raw: &Value, lo: i64, hi: i64, default: i64) -> i64 {
    match interpret_int(raw) {
        Some(v) => num::clamp(v, lo, hi),
        None => default,
    }
}

fn interpret_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|_| i64::MAX))
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }),
        Value::String(text) => parse_int_text(text.trim()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_int_text(text: &str) -> Option<i64> {
    let digits: Cow<'_, str> = if text.contains('_') {
        Cow::Owned(strip_digit_separators(text)?)
    } else {
        Cow::Borrowed(text)
    };

    match digits.parse::<i64>() {
        Ok(v) => Some(v),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

/// Drops `_` digit separators such as `1_000`. Each one must sit between two digits.
fn strip_digit_separators(text: &str) -> Option<String> {
    let unsigned = text.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(text);
    let bytes = unsigned.as_bytes();
    let well_placed = bytes.iter().enumerate().all(|(i, &byte)| {
        byte != b'_'
            || (i > 0
                && bytes[i - 1].is_ascii_digit()
                && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
    });

    well_placed.then(|| text.replace('_', ""))
}
