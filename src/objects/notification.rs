use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warn,
    Error,
    Secondary,
    Contrast,
}

impl Severity {
    /// Unknown severities degrade to `Info`.
    pub fn parse(val: &str) -> Self {
        match val.trim().to_lowercase().as_str() {
            "success" => Severity::Success,
            "warn" | "warning" => Severity::Warn,
            "error" | "danger" => Severity::Error,
            "secondary" => Severity::Secondary,
            "contrast" => Severity::Contrast,
            _ => Severity::Info,
        }
    }
}

/// Transient message for the display surface; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(default)]
    pub extra_data: Value,
    /// Display lifetime in milliseconds; sticky when `None`.
    #[serde(skip)]
    pub life: Option<u32>,
}

impl Notification {
    pub fn new(severity: Severity, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: detail.into(),
            extra_data: Value::Null,
            life: None,
        }
    }

    pub fn warn(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Warn, summary, detail)
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(Severity::Error, summary, detail)
    }

    pub fn with_life(mut self, millis: u32) -> Self {
        self.life = Some(millis);
        self
    }

    /// Builds a notification from a pushed `notify` payload. Any shape is
    /// accepted; missing parts get placeholders.
    pub fn from_value(value: Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(String::from);
        let severity = text("severity")
            .map(|s| Severity::parse(&s))
            .unwrap_or(Severity::Info);
        let summary = text("summary").unwrap_or_else(|| String::from("Notification"));
        let detail = text("detail").unwrap_or_else(|| value.to_string());
        let extra_data = value.get("extraData").cloned().unwrap_or(Value::Null);

        Self {
            severity,
            summary,
            detail,
            extra_data,
            life: None,
        }
    }
}
