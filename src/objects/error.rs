use serde_json::Value;
use thiserror::Error;

/// A request/response exchange with the service failed.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("service responded with status {status}")]
    Status { status: u16, body: Option<Value> },
    #[error("could not decode response body: {0}")]
    Body(String),
}

impl NetworkError {
    /// The JSON body the service attached to a non-2xx response, if any.
    pub fn body(&self) -> Option<&Value> {
        match self {
            NetworkError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

/// A payload did not have the structure of the expected entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {entity}: {message}")]
pub struct SchemaError {
    pub entity: &'static str,
    pub message: String,
}

impl SchemaError {
    pub fn new(entity: &'static str, message: impl Into<String>) -> Self {
        Self {
            entity,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("could not open streaming connection: {0}")]
    Open(String),
    #[error("streaming connection lost: {0}")]
    Lost(String),
    #[error("streaming connection gave up after {0} reconnection attempts")]
    Exhausted(u32),
    #[error("undecodable frame: {0}")]
    Frame(String),
}

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn describe(val: &wasm_bindgen::JsValue) -> String {
    match val.as_string() {
        Some(s) => s,
        None => format!("{:?}", val),
    }
}

impl From<wasm_bindgen::JsValue> for NetworkError {
    fn from(val: wasm_bindgen::JsValue) -> Self {
        NetworkError::Request(describe(&val))
    }
}

impl From<serde_wasm_bindgen::Error> for NetworkError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        NetworkError::Body(err.to_string())
    }
}

impl From<&str> for NetworkError {
    fn from(str: &str) -> Self {
        NetworkError::Request(String::from(str))
    }
}

impl From<wasm_bindgen::JsValue> for TransportError {
    fn from(val: wasm_bindgen::JsValue) -> Self {
        TransportError::Open(describe(&val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_error_exposes_body() {
        let err = NetworkError::Status {
            status: 400,
            body: Some(json!({"error": "Video Already Exists!"})),
        };

        assert_eq!(err.body(), Some(&json!({"error": "Video Already Exists!"})));
        assert_eq!(err.to_string(), "service responded with status 400");
        assert!(NetworkError::Request("offline".into()).body().is_none());
    }

    #[test]
    fn sync_error_is_transparent() {
        let err: SyncError = SchemaError::new("video", "missing field `url`").into();

        assert_eq!(err.to_string(), "invalid video: missing field `url`");
    }
}
