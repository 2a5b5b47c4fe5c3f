use super::{sink::NotificationSink, store::Store};
use crate::objects::{Notification, Progress, SchemaError, Video};
use serde_json::Value;
use std::rc::Rc;

/// Inbound events of the streaming channel, demultiplexed by tag.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Connect,
    Disconnect(String),
    Message(Value),
    StatusUpdate(Value),
    Notify(Value),
    Unknown { tag: String, payload: Value },
}

impl StreamEvent {
    pub fn from_tagged(tag: String, payload: Value) -> Self {
        match tag.as_str() {
            "connect" => StreamEvent::Connect,
            "disconnect" => StreamEvent::Disconnect(match payload {
                Value::String(reason) => reason,
                _ => String::from("server"),
            }),
            "message" => StreamEvent::Message(payload),
            "status_update" => StreamEvent::StatusUpdate(payload),
            "notify" => StreamEvent::Notify(payload),
            _ => StreamEvent::Unknown { tag, payload },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Ignored,
    Video(String),
    Progress(String),
    Notified,
    Dropped(SchemaError),
    DeadLetter(String),
}

/// Writes streaming events into the store and the notification surface.
///
/// Nothing here fails: malformed payloads and unknown tags are logged and
/// dropped, the store is left as it was.
pub struct EventRouter {
    store: Store,
    sink: Rc<dyn NotificationSink>,
}

impl EventRouter {
    pub fn new(store: Store, sink: Rc<dyn NotificationSink>) -> Self {
        Self { store, sink }
    }

    pub fn route(&self, event: StreamEvent) -> Routed {
        match event {
            StreamEvent::Connect => {
                log::info!("streaming channel connected");
                Routed::Ignored
            }
            StreamEvent::Message(payload) => match Video::validate(payload) {
                Ok(video) => {
                    let id = video.id.clone();

                    self.store.upsert_video(video);
                    Routed::Video(id)
                }
                Err(e) => {
                    log::warn!("dropping message event: {}", e);
                    Routed::Dropped(e)
                }
            },
            // high-frequency telemetry: decoded leniently, not validated
            StreamEvent::StatusUpdate(payload) => match Progress::from_value(payload) {
                Ok(progress) => {
                    let id = progress.video_id.clone();

                    self.store.upsert_progress(progress);
                    Routed::Progress(id)
                }
                Err(e) => {
                    log::warn!("dropping status_update event: {}", e);
                    Routed::Dropped(e)
                }
            },
            StreamEvent::Notify(payload) => {
                self.sink.notify(Notification::from_value(payload));
                Routed::Notified
            }
            StreamEvent::Disconnect(reason) => {
                log::warn!("streaming channel disconnected: {}", reason);
                self.sink.notify(
                    Notification::warn("Disconnected", "Socket connection lost.").with_life(3000),
                );
                Routed::Notified
            }
            StreamEvent::Unknown { tag, payload } => {
                log::warn!("dead letter: unknown event \"{}\": {}", tag, payload);
                Routed::DeadLetter(tag)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Severity;
    use crate::test::{progress, video, video_json};
    use serde_json::json;
    use std::cell::RefCell;

    fn router() -> (EventRouter, Store, Rc<RefCell<Vec<Notification>>>) {
        let store = Store::new();
        let sink = Rc::new(RefCell::new(Vec::new()));

        (EventRouter::new(store.clone(), sink.clone()), store, sink)
    }

    #[test]
    fn tags_are_demultiplexed() {
        assert_eq!(
            StreamEvent::from_tagged("message".into(), json!(1)),
            StreamEvent::Message(json!(1))
        );
        assert_eq!(
            StreamEvent::from_tagged("status_update".into(), json!(1)),
            StreamEvent::StatusUpdate(json!(1))
        );
        assert_eq!(
            StreamEvent::from_tagged("notify".into(), json!(1)),
            StreamEvent::Notify(json!(1))
        );
        assert_eq!(
            StreamEvent::from_tagged("disconnect".into(), json!("bye")),
            StreamEvent::Disconnect("bye".into())
        );
        assert_eq!(
            StreamEvent::from_tagged("surprise".into(), json!(1)),
            StreamEvent::Unknown {
                tag: "surprise".into(),
                payload: json!(1)
            }
        );
    }

    #[test]
    fn message_upserts_valid_video() {
        let (router, store, _) = router();

        assert_eq!(
            router.route(StreamEvent::Message(video_json("abc", "downloading"))),
            Routed::Video("abc".into())
        );
        assert_eq!(store.video("abc"), Some(video("abc", "downloading")));
    }

    #[test]
    fn message_missing_field_is_dropped() {
        let (router, store, sink) = router();
        store.upsert_video(video("abc", "queued"));
        let before = store.snapshot();
        let mut payload = video_json("abc", "completed");

        payload.as_object_mut().unwrap().remove("downloadStatus");

        assert!(matches!(
            router.route(StreamEvent::Message(payload)),
            Routed::Dropped(_)
        ));
        assert_eq!(store.snapshot(), before);
        assert!(sink.borrow().is_empty());
    }

    #[test]
    fn status_update_for_unknown_video() {
        let (router, store, _) = router();

        assert_eq!(
            router.route(StreamEvent::StatusUpdate(
                json!({"id": "x", "videoId": "ghost", "percent": "5%"})
            )),
            Routed::Progress("ghost".into())
        );
        assert_eq!(store.progress("ghost"), Some(progress("ghost", "5%")));
        assert_eq!(store.snapshot().video_count(), 0);
    }

    #[test]
    fn status_update_with_odd_field_types() {
        let (router, store, notes) = router();

        assert_eq!(
            router.route(StreamEvent::StatusUpdate(
                json!({"videoId": "a", "percent": "100%", "eta": false, "speed": {"v": 1}})
            )),
            Routed::Progress("a".into())
        );

        let stored = store.progress("a").unwrap();
        assert_eq!(stored.percent(), 100);
        assert_eq!(stored.eta.to_string(), "false");
        assert_eq!(stored.speed.to_string(), r#"{"v":1}"#);
        assert!(notes.borrow().is_empty());
    }

    #[test]
    fn status_update_without_key_is_dropped() {
        let (router, store, _) = router();

        assert!(matches!(
            router.route(StreamEvent::StatusUpdate(json!({"percent": "5%"}))),
            Routed::Dropped(_)
        ));
        assert_eq!(store.snapshot().progress_count(), 0);
    }

    #[test]
    fn notify_reaches_sink_only() {
        let (router, store, sink) = router();

        router.route(StreamEvent::Notify(
            json!({"severity": "success", "summary": "Done", "detail": "Finished x"}),
        ));

        assert_eq!(sink.borrow().len(), 1);
        assert_eq!(sink.borrow()[0].severity, Severity::Success);
        assert_eq!(store.snapshot(), Store::new().snapshot());
    }

    #[test]
    fn disconnect_warns_and_keeps_state() {
        let (router, store, sink) = router();
        store.upsert_video(video("abc", "downloading"));
        store.upsert_progress(progress("abc", "40%"));
        let before = store.snapshot();

        router.route(StreamEvent::Disconnect("transport close".into()));

        assert_eq!(store.snapshot(), before);
        assert_eq!(sink.borrow().len(), 1);
        assert_eq!(sink.borrow()[0].severity, Severity::Warn);
        assert_eq!(sink.borrow()[0].summary, "Disconnected");
        assert_eq!(sink.borrow()[0].life, Some(3000));
    }

    #[test]
    fn connect_and_unknown_do_nothing() {
        let (router, store, sink) = router();

        assert_eq!(router.route(StreamEvent::Connect), Routed::Ignored);
        assert_eq!(
            router.route(StreamEvent::Unknown {
                tag: "surprise".into(),
                payload: Value::Null
            }),
            Routed::DeadLetter("surprise".into())
        );
        assert_eq!(store.snapshot(), Store::new().snapshot());
        assert!(sink.borrow().is_empty());
    }
}
