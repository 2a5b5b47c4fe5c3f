//! Mutating commands against the service.
//!
//! None of the commands writes to the store before the service answered:
//!
//! | command      | on success              | on failure                  |
//! |--------------|-------------------------|-----------------------------|
//! | create       | upsert returned record  | error notification          |
//! | delete       | remove id               | logged                      |
//! | mark watched | upsert echoed record    | logged                      |
//! | finalize     | upsert fetched record   | logged                      |
//!
//! Mark watched flips the flag on a private copy only; the stored record
//! changes when the echo arrives.

use super::{
    sink::NotificationSink,
    store::Store,
    transport::{require_body, HttpMethod, Transport},
};
use crate::objects::{Format, JobType, NetworkError, Notification, SchemaError, SyncError, Video};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::rc::Rc;
use url::Url;

/// Hex characters kept from the url digest (64 bits).
pub const ID_LENGTH: usize = 16;

/// Stable id for a source url; the same url always maps to the same id.
pub fn derive_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut id = hex::encode(digest);

    id.truncate(ID_LENGTH);
    id
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format: Format,
    pub job_type: JobType,
}

impl DownloadRequest {
    pub fn new(url: &str, format: Format, job_type: JobType) -> Result<Self, SchemaError> {
        let url = url.trim();
        let parsed = Url::parse(url).map_err(|e| SchemaError::new("url", e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => Ok(Self {
                url: String::from(url),
                format,
                job_type,
            }),
            other => Err(SchemaError::new(
                "url",
                format!("unsupported scheme \"{}\"", other),
            )),
        }
    }
}

fn create_error_detail(err: &SyncError) -> String {
    let body = match err {
        SyncError::Network(e) => e.body(),
        _ => None,
    };
    let title = body
        .and_then(|b| b.pointer("/video/fullTitle"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty());
    let error = body.and_then(|b| b.get("error")).map(|e| match e {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    match (title, error) {
        (Some(title), Some(error)) => format!(
            "Error while initiating download of video {}: {}",
            title, error
        ),
        (Some(title), None) => format!(
            "Error while initiating download of video {}: {}",
            title, err
        ),
        (None, Some(error)) => format!("Error while initiating download: {}", error),
        (None, None) => format!("Error while initiating download: {}", err),
    }
}

pub struct CommandGateway {
    store: Store,
    transport: Rc<dyn Transport>,
    sink: Rc<dyn NotificationSink>,
}

impl CommandGateway {
    pub fn new(store: Store, transport: Rc<dyn Transport>, sink: Rc<dyn NotificationSink>) -> Self {
        Self {
            store,
            transport,
            sink,
        }
    }

    async fn fetch_video(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Video, SyncError> {
        let body = self.transport.request(method, path, body).await?;

        Ok(Video::validate(require_body(body)?)?)
    }

    /// Submits a provisional record and stores what the service returns.
    pub async fn create(&self, request: DownloadRequest) -> Result<Video, SyncError> {
        let provisional = Video::provisional(
            derive_id(&request.url),
            request.url,
            request.format,
            request.job_type,
        );
        let body = serde_json::to_value(&provisional)
            .map_err(|e| NetworkError::Body(e.to_string()))?;

        match self.fetch_video(HttpMethod::Post, "video", Some(body)).await {
            Ok(video) => {
                log::info!("created {} for {}", video.id, video.url);
                self.store.upsert_video(video.clone());
                Ok(video)
            }
            Err(e) => {
                log::error!("could not create {}: {}", provisional.id, e);
                self.sink
                    .notify(Notification::error("Error", create_error_detail(&e)));
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        match self
            .transport
            .request(HttpMethod::Delete, &format!("video/{}", id), None)
            .await
        {
            Ok(_) => {
                self.store.remove_video(id);
                Ok(())
            }
            Err(e) => {
                log::error!("could not delete {}: {}", id, e);
                Err(e.into())
            }
        }
    }

    /// Returns `Ok(None)` without a request when the video is already watched.
    pub async fn mark_watched(&self, video: &Video) -> Result<Option<Video>, SyncError> {
        if video.watched {
            return Ok(None);
        }

        let mut update = video.clone();
        update.watched = true;

        let body = serde_json::to_value(&update).map_err(|e| NetworkError::Body(e.to_string()))?;

        match self
            .fetch_video(HttpMethod::Put, &format!("video/{}", video.id), Some(body))
            .await
        {
            Ok(echo) => {
                self.store.upsert_video(echo.clone());
                Ok(Some(echo))
            }
            Err(e) => {
                log::error!("could not mark {} as watched: {}", video.id, e);
                Err(e)
            }
        }
    }

    /// Authoritative fetch issued when progress reached 100%.
    pub async fn finalize(&self, id: &str) -> Result<Video, SyncError> {
        match self
            .fetch_video(HttpMethod::Get, &format!("video/{}", id), None)
            .await
        {
            Ok(video) => {
                log::debug!("finalized {} as {:?}", video.id, video.download_status);
                self.store.upsert_video(video.clone());
                Ok(video)
            }
            Err(e) => {
                log::error!("could not fetch final record of {}: {}", id, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::DownloadStatus;
    use crate::sync::reconciler::{phase, Phase, Reconciler};
    use crate::sync::router::{EventRouter, StreamEvent};
    use crate::test::{video, video_json, ScriptedTransport};
    use serde_json::json;
    use std::cell::RefCell;

    struct Fixture {
        store: Store,
        transport: Rc<ScriptedTransport>,
        sink: Rc<RefCell<Vec<Notification>>>,
        gateway: CommandGateway,
    }

    fn fixture(responses: Vec<Result<Option<Value>, NetworkError>>) -> Fixture {
        let store = Store::new();
        let transport = Rc::new(ScriptedTransport::new(responses));
        let sink = Rc::new(RefCell::new(Vec::new()));
        let gateway = CommandGateway::new(store.clone(), transport.clone(), sink.clone());

        Fixture {
            store,
            transport,
            sink,
            gateway,
        }
    }

    #[test]
    fn id_is_truncated_sha256() {
        assert_eq!(derive_id("abc"), "ba7816bf8f01cfea");
        assert_eq!(derive_id("https://x/y"), derive_id("https://x/y"));
        assert_eq!(derive_id("https://x/y").len(), ID_LENGTH);
        assert_ne!(derive_id("https://x/y"), derive_id("https://x/z"));
    }

    #[test]
    fn ids_do_not_collide_on_small_sets() {
        let ids: std::collections::HashSet<String> = (0..5000)
            .map(|n| derive_id(&format!("https://videos.example/watch?v={}", n)))
            .collect();

        assert_eq!(ids.len(), 5000);
    }

    #[test]
    fn request_requires_http_url() {
        assert!(DownloadRequest::new(" https://x/y ", Format::Best, JobType::Download).is_ok());
        assert!(DownloadRequest::new("x/y", Format::Best, JobType::Download).is_err());
        assert!(DownloadRequest::new("ftp://x/y", Format::Best, JobType::Scan).is_err());
    }

    #[tokio::test]
    async fn create_stores_returned_record() {
        let id = derive_id("https://x/y");
        let f = fixture(vec![Ok(Some(video_json(&id, "queued")))]);
        let request = DownloadRequest::new("https://x/y", Format::Best, JobType::Download).unwrap();

        let created = f.gateway.create(request).await.unwrap();

        assert_eq!(f.store.videos(), vec![created.clone()]);
        assert_eq!(created, video(&id, "queued"));

        let requests = f.transport.requests();
        let (method, path, body) = &requests[0];
        let body = body.as_ref().unwrap();

        assert_eq!(*method, HttpMethod::Post);
        assert_eq!(path, "video");
        assert_eq!(body["id"], json!(id));
        assert_eq!(body["url"], json!("https://x/y"));
        assert_eq!(body["format"], json!("best"));
        assert_eq!(body["type"], json!("download"));
        assert_eq!(body["downloadStatus"], json!("queued"));
        assert_eq!(body["fullTitle"], json!(""));
        assert!(f.sink.borrow().is_empty());
    }

    #[tokio::test]
    async fn create_failure_reports_server_detail() {
        let f = fixture(vec![Err(NetworkError::Status {
            status: 400,
            body: Some(json!({
                "error": "Video Already Exists!",
                "video": {"fullTitle": "Old Upload"}
            })),
        })]);
        let request = DownloadRequest::new("https://x/y", Format::Best, JobType::Download).unwrap();

        assert!(f.gateway.create(request).await.is_err());
        assert_eq!(f.store.snapshot().video_count(), 0);
        assert_eq!(
            f.sink.borrow()[0].detail,
            "Error while initiating download of video Old Upload: Video Already Exists!"
        );
    }

    #[tokio::test]
    async fn create_failure_without_detail() {
        let f = fixture(vec![Err(NetworkError::Request("offline".into()))]);
        let request = DownloadRequest::new("https://x/y", Format::Worst, JobType::Scan).unwrap();

        assert!(f.gateway.create(request).await.is_err());
        assert_eq!(
            f.sink.borrow()[0].detail,
            "Error while initiating download: request failed: offline"
        );
    }

    #[tokio::test]
    async fn create_rejects_malformed_response() {
        let f = fixture(vec![Ok(Some(json!({"id": "abc"})))]);
        let request = DownloadRequest::new("https://x/y", Format::Best, JobType::Download).unwrap();

        assert!(matches!(
            f.gateway.create(request).await,
            Err(SyncError::Schema(_))
        ));
        assert_eq!(f.store.snapshot().video_count(), 0);
        assert_eq!(f.sink.borrow().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_on_success() {
        let f = fixture(vec![Ok(Some(json!({"id": "a", "status": "deleted"})))]);
        f.store.upsert_video(video("a", "completed"));

        f.gateway.delete("a").await.unwrap();

        assert!(f.store.video("a").is_none());
        assert_eq!(
            f.transport.requests()[0],
            (HttpMethod::Delete, String::from("video/a"), None)
        );
    }

    #[tokio::test]
    async fn delete_failure_keeps_video() {
        let f = fixture(vec![Err(NetworkError::Status {
            status: 404,
            body: None,
        })]);
        f.store.upsert_video(video("a", "completed"));

        assert!(f.gateway.delete("a").await.is_err());
        assert_eq!(f.store.video("a"), Some(video("a", "completed")));
        assert!(f.sink.borrow().is_empty());
    }

    #[tokio::test]
    async fn mark_watched_upserts_echo() {
        let mut echo = video_json("a", "completed");
        echo["watched"] = json!(true);
        let f = fixture(vec![Ok(Some(echo))]);
        let original = video("a", "completed");
        f.store.upsert_video(original.clone());

        let updated = f.gateway.mark_watched(&original).await.unwrap().unwrap();

        assert!(updated.watched);
        assert!(f.store.video("a").unwrap().watched);
        assert!(!original.watched);

        let requests = f.transport.requests();
        let (method, path, body) = &requests[0];

        assert_eq!(*method, HttpMethod::Put);
        assert_eq!(path, "video/a");
        assert_eq!(body.as_ref().unwrap()["watched"], json!(true));
    }

    #[tokio::test]
    async fn mark_watched_failure_leaves_store() {
        let f = fixture(vec![Err(NetworkError::Request("offline".into()))]);
        let original = video("a", "completed");
        f.store.upsert_video(original.clone());

        assert!(f.gateway.mark_watched(&original).await.is_err());
        assert!(!f.store.video("a").unwrap().watched);
        assert!(f.sink.borrow().is_empty());
    }

    #[tokio::test]
    async fn mark_watched_skips_watched() {
        let f = fixture(vec![]);
        let mut watched = video("a", "completed");
        watched.watched = true;

        assert_eq!(f.gateway.mark_watched(&watched).await.unwrap(), None);
        assert!(f.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn finalize_error_envelope_is_contained() {
        let f = fixture(vec![Ok(Some(json!({"error": "Video not found with id a"})))]);
        f.store.upsert_video(video("a", "downloading"));

        assert!(f.gateway.finalize("a").await.is_err());
        assert_eq!(f.store.video("a"), Some(video("a", "downloading")));
    }

    #[tokio::test]
    async fn progress_at_100_is_confirmed_by_fetch() {
        let f = fixture(vec![Ok(Some(video_json("a", "completed")))]);
        let router = EventRouter::new(f.store.clone(), f.sink.clone());
        let requested = Rc::new(RefCell::new(Vec::new()));
        let sink = requested.clone();
        let _reconciler = Reconciler::attach(&f.store, move |id| sink.borrow_mut().push(id));

        f.store.upsert_video(video("a", "downloading"));
        router.route(StreamEvent::StatusUpdate(json!({"videoId": "a", "percent": 100})));
        router.route(StreamEvent::StatusUpdate(json!({"videoId": "a", "percent": "100%"})));

        let ids: Vec<String> = requested.borrow().clone();
        assert_eq!(ids, vec!["a"]);

        for id in ids {
            f.gateway.finalize(&id).await.unwrap();
        }

        let state = f.store.snapshot();
        let stored = state.video("a").unwrap();

        assert_eq!(
            f.transport.requests()[0],
            (HttpMethod::Get, String::from("video/a"), None)
        );
        assert_eq!(stored.download_status, DownloadStatus::Completed);
        assert_eq!(
            phase(stored, state.progress("a")),
            Phase::Finalized { confirmed: true }
        );
    }
}
