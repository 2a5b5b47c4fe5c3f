use crate::objects::{ClientConfig, NetworkError};
use crate::sync::{HttpMethod, Transport};
use crate::utils;
use async_trait::async_trait;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// `Transport` on top of the browser fetch api.
pub struct WebFetcher {
    config: ClientConfig,
}

impl WebFetcher {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait(?Send)]
impl Transport for WebFetcher {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, NetworkError> {
        let url = self.config.api_url(path);

        log::debug!("{} {}", method.as_str(), url);

        let resp = fetch(&url, method, body).await?;
        let text = fetch_text(&resp).await?;
        let body = parse_body(&text);

        match resp.ok() {
            true => body,
            false => Err(NetworkError::Status {
                status: resp.status(),
                body: body.ok().flatten(),
            }),
        }
    }
}

fn parse_body(text: &str) -> Result<Option<Value>, NetworkError> {
    match text.trim().is_empty() {
        true => Ok(None),
        false => serde_json::from_str(text)
            .map(Some)
            .map_err(|e| NetworkError::Body(e.to_string())),
    }
}

async fn fetch(
    url: &str,
    method: HttpMethod,
    body: Option<Value>,
) -> Result<web_sys::Response, NetworkError> {
    let mut opts = web_sys::RequestInit::new();

    opts.method(method.as_str());
    opts.mode(web_sys::RequestMode::Cors);

    if let Some(val) = body {
        let headers = web_sys::Headers::new()?;

        headers.append("Content-Type", "application/json")?;
        opts.headers(&headers);
        opts.body(Some(&serde_wasm_bindgen::to_value(&val.to_string())?));
    }

    let request = web_sys::Request::new_with_str_and_init(url, &opts)?;
    let window = web_sys::window().ok_or("error getting window")?;
    let resp: web_sys::Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;

    Ok(resp)
}

async fn fetch_text(resp: &web_sys::Response) -> Result<String, NetworkError> {
    JsFuture::from(resp.text()?)
        .await?
        .as_string()
        .ok_or_else(|| "error casting fetched value to string".into())
}

/// Origin-derived defaults, overridden by `/config/client_config.json` when
/// the server provides one.
pub async fn load_config() -> ClientConfig {
    let origin = match utils::get_origin() {
        Ok(origin) => origin,
        Err(e) => {
            log::warn!("could not determine origin: {:?}", e);
            return ClientConfig::default();
        }
    };
    let url = format!("{}/config/client_config.json", origin);

    let loaded = async {
        let resp = fetch(&url, HttpMethod::Get, None).await?;

        if !resp.ok() {
            return Err(NetworkError::Status {
                status: resp.status(),
                body: None,
            });
        }

        let text = fetch_text(&resp).await?;

        serde_json::from_str::<ClientConfig>(&text).map_err(|e| NetworkError::Body(e.to_string()))
    };

    match loaded.await {
        Ok(config) => {
            log::info!("loaded client config from {}", url);
            config
        }
        Err(e) => {
            log::warn!("using default client config for {}: {}", origin, e);
            ClientConfig::for_origin(&origin)
        }
    }
}
