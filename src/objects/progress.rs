use super::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

/// A telemetry value that arrives either as a number or as a preformatted
/// string such as `"45.3%"` or `"1.20MiB/s"`. Any other JSON is kept as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
    Missing,
    Other(Value),
}

/// Leading `[+-]digits[.digits]` of `text`, ignoring whatever follows.
fn numeric_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = match bytes.first() {
        Some(b'+') | Some(b'-') => 1,
        _ => 0,
    };
    let digits_start = end;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    text[..end].parse::<f64>().ok()
}

impl Default for Reading {
    fn default() -> Self {
        Reading::Missing
    }
}

impl Reading {
    /// Numeric value of a number, or of the numeric prefix of a string
    /// (`"45.3%"`, `"100abc"`).
    pub fn as_number(&self) -> Option<f64> {
        let val = match self {
            Reading::Number(n) => *n,
            Reading::Text(s) => numeric_prefix(s)?,
            Reading::Missing | Reading::Other(_) => return None,
        };

        match val.is_finite() {
            true => Some(val),
            false => None,
        }
    }
}

impl Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Reading::Number(n) => write!(f, "{:.1}", n),
            Reading::Text(s) => f.write_str(s.trim()),
            Reading::Missing => Ok(()),
            Reading::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Snapshot of an in-flight job, keyed by the owning video's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub video_id: String,
    #[serde(default)]
    pub eta: Reading,
    #[serde(default)]
    pub percent: Reading,
    #[serde(default)]
    pub speed: Reading,
    #[serde(default)]
    pub downloaded_size: Reading,
    #[serde(default)]
    pub total_size: Reading,
}

impl Progress {
    /// Lenient decode used on the high-frequency push path: only the key is
    /// required, every reading falls back to `Missing`.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        serde_json::from_value(value).map_err(|e| SchemaError::new("progress", e.to_string()))
    }

    /// Whole percent in 0..=100, truncated; 0 when absent or unparseable.
    pub fn percent(&self) -> u8 {
        match self.percent.as_number() {
            Some(val) => val.trunc().clamp(0.0, 100.0) as u8,
            None => 0,
        }
    }
}
