use crate::objects::NetworkError;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Request/response access to the service api.
///
/// `path` is relative to the api base (`videos`, `video/{id}`). A non-2xx
/// answer is reported as `NetworkError::Status` carrying the decoded body, an
/// empty body as `Ok(None)`.
#[async_trait(?Send)]
pub trait Transport {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, NetworkError>;
}

pub(crate) fn require_body(body: Option<Value>) -> Result<Value, NetworkError> {
    body.ok_or_else(|| NetworkError::Body(String::from("empty response body")))
}
