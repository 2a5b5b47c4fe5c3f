use super::{
    sink::NotificationSink,
    store::Store,
    transport::{require_body, HttpMethod, Transport},
};
use crate::objects::{Notification, SchemaError, SyncError, Video};
use serde_json::Value;
use std::cell::Cell;
use std::rc::Rc;

/// Accepts the collection either as an array or as an id-keyed map. One
/// invalid entry rejects the whole snapshot.
pub fn parse_snapshot(value: Value) -> Result<Vec<Video>, SchemaError> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(map) => map.into_iter().map(|(_, entry)| entry).collect(),
        other => {
            return Err(SchemaError::new(
                "video collection",
                format!("expected array or map, got {}", other),
            ))
        }
    };

    entries.into_iter().map(Video::validate).collect()
}

struct LoadingGuard<'a>(&'a Cell<bool>);

impl<'a> LoadingGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Fills the store with the full video collection.
pub struct SnapshotLoader {
    store: Store,
    transport: Rc<dyn Transport>,
    sink: Rc<dyn NotificationSink>,
    loading: Cell<bool>,
}

impl SnapshotLoader {
    pub fn new(store: Store, transport: Rc<dyn Transport>, sink: Rc<dyn NotificationSink>) -> Self {
        Self {
            store,
            transport,
            sink,
            loading: Cell::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// Replaces the stored videos in a single write. On failure the store
    /// keeps whatever it had and a passive notification is raised.
    pub async fn load(&self) -> Result<usize, SyncError> {
        let _guard = LoadingGuard::engage(&self.loading);

        match self.fetch().await {
            Ok(videos) => {
                let count = videos.len();

                log::info!("loaded {} videos", count);
                self.store.replace_videos(videos);
                Ok(count)
            }
            Err(e) => {
                log::error!("could not load videos: {}", e);
                self.sink
                    .notify(Notification::error("Error", format!("Could not load videos: {}", e)));
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<Video>, SyncError> {
        let body = self.transport.request(HttpMethod::Get, "videos", None).await?;

        Ok(parse_snapshot(require_body(body)?)?)
    }
}
