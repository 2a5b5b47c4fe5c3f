use super::TransportError;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub api_base: String,
    pub socket_url: String,
    pub reconnection_attempts: u32,
    pub reconnection_delay_ms: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: String::from("http://localhost:8000/api"),
            socket_url: String::from("http://localhost:8000"),
            reconnection_attempts: 5,
            reconnection_delay_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Defaults for a client served from the same origin as the service.
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');

        Self {
            api_base: format!("{}/api", origin),
            socket_url: String::from(origin),
            ..Default::default()
        }
    }

    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Location of a stored asset (thumbnail, media file, subtitle track).
    pub fn files_url(&self, path_id: &str) -> Option<String> {
        match path_id.is_empty() {
            true => None,
            false => Some(self.api_url(&format!("files/{}", path_id))),
        }
    }

    /// Websocket endpoint of the Socket.IO server behind `socket_url`.
    pub fn socket_endpoint(&self) -> Result<String, TransportError> {
        let mut url =
            Url::parse(&self.socket_url).map_err(|e| TransportError::Open(e.to_string()))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(TransportError::Open(format!(
                    "unsupported scheme \"{}\"",
                    other
                )))
            }
        };

        url.set_scheme(scheme)
            .map_err(|_| TransportError::Open(String::from("could not set scheme")))?;
        url.set_path("/socket.io/");
        url.query_pairs_mut()
            .clear()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");

        Ok(url.to_string())
    }
}
