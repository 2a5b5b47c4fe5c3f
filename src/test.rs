//! Shared fixtures for unit tests.

use crate::objects::{NetworkError, Progress, Reading, Video};
use crate::sync::{HttpMethod, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;

pub fn video_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "videoId": "dQw4w9WgXcQ",
        "url": "https://x/y",
        "format": "best",
        "type": "download",
        "downloadStatus": status,
        "audioOnly": false,
        "watched": false,
        "downloaded": false,
        "prevWatchTime": 0,
        "fullTitle": "Some Title",
        "durationString": "3:32",
        "size": "20MiB",
        "resolution": "1920x1080",
        "videoPathId": "v1",
        "thumbnailPathId": "t1",
        "vttPathId": "s1",
        "vttSpritePathId": "p1"
    })
}

pub fn video(id: &str, status: &str) -> Video {
    Video::validate(video_json(id, status)).unwrap()
}

pub fn progress(video_id: &str, percent: &str) -> Progress {
    Progress {
        video_id: String::from(video_id),
        eta: Reading::Missing,
        percent: Reading::Text(String::from(percent)),
        speed: Reading::Missing,
        downloaded_size: Reading::Missing,
        total_size: Reading::Missing,
    }
}

pub type Request = (HttpMethod, String, Option<Value>);

/// Answers requests from a fixed script, in order, and records them.
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<Option<Value>, NetworkError>>>,
    requests: RefCell<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<Option<Value>, NetworkError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, NetworkError> {
        self.requests
            .borrow_mut()
            .push((method, String::from(path), body));

        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(NetworkError::Request(String::from("unscripted request"))))
    }
}
