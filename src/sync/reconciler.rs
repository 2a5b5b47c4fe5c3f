//! Per-video display state derived from the store, and the finalize trigger.
//!
//! Telemetry can reach 100% before the service has persisted the final
//! record (size, resolution, path ids). When that happens the reconciler asks
//! for one authoritative fetch of the video; the fetched record, not the
//! progress value, is what confirms the download.

use super::store::{Change, Store, StoreState, SubscriptionId};
use crate::objects::{Progress, Video};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    AwaitingMetadata,
    InProgress {
        percent: u8,
        downloaded_size: String,
        total_size: String,
        speed: String,
        eta: String,
    },
    /// `confirmed` once the stored video itself is `completed`.
    Finalized { confirmed: bool },
}

pub fn phase(video: &Video, progress: Option<&Progress>) -> Phase {
    let percent = progress.map(Progress::percent).unwrap_or(0);

    if percent == 100 || video.is_completed() {
        return Phase::Finalized {
            confirmed: video.is_completed(),
        };
    }

    match progress {
        Some(progress) => Phase::InProgress {
            percent,
            downloaded_size: progress.downloaded_size.to_string(),
            total_size: progress.total_size.to_string(),
            speed: progress.speed.to_string(),
            eta: progress.eta.to_string(),
        },
        None => Phase::AwaitingMetadata,
    }
}

/// Progress says done, the stored record does not.
pub fn needs_finalize(video: Option<&Video>, progress: Option<&Progress>) -> bool {
    match (video, progress) {
        (Some(video), Some(progress)) => progress.percent() == 100 && !video.is_completed(),
        _ => false,
    }
}

pub struct Reconciler {
    latched: RefCell<HashSet<String>>,
    on_finalize: Box<dyn Fn(String)>,
    subscription: Cell<Option<SubscriptionId>>,
}

impl Reconciler {
    pub fn new(on_finalize: impl Fn(String) + 'static) -> Self {
        Self {
            latched: RefCell::new(HashSet::new()),
            on_finalize: Box::new(on_finalize),
            subscription: Cell::new(None),
        }
    }

    /// Subscribes to `store`; `on_finalize` gets the id of every video that
    /// needs an authoritative fetch, once per transition.
    pub fn attach(store: &Store, on_finalize: impl Fn(String) + 'static) -> Rc<Self> {
        let reconciler = Rc::new(Self::new(on_finalize));
        let observer = reconciler.clone();
        let id = store.subscribe(move |change, state| observer.observe(change, state));

        reconciler.subscription.set(Some(id));
        reconciler
    }

    pub fn detach(&self, store: &Store) {
        if let Some(id) = self.subscription.take() {
            store.unsubscribe(id);
        }
    }

    pub fn observe(&self, change: &Change, state: &StoreState) {
        match change {
            Change::VideoUpserted(id) | Change::ProgressUpserted(id) | Change::ProgressRemoved(id) => {
                self.evaluate(id, state)
            }
            Change::VideoRemoved(id) => {
                self.latched.borrow_mut().remove(id);
            }
            Change::VideosReplaced => {
                let mut ids: Vec<String> = self.latched.borrow().iter().cloned().collect();

                ids.extend(state.progress_ids());
                for id in ids {
                    self.evaluate(&id, state);
                }
            }
            Change::FilterChanged => {}
        }
    }

    fn evaluate(&self, id: &str, state: &StoreState) {
        if needs_finalize(state.video(id), state.progress(id)) {
            let fresh = self.latched.borrow_mut().insert(String::from(id));

            if fresh {
                log::info!("progress of {} reached 100%, fetching final record", id);
                (self.on_finalize)(String::from(id));
            }
        } else {
            self.latched.borrow_mut().remove(id);
        }
    }

    /// Releases the latch so a later progress event can trigger again.
    pub fn finalize_failed(&self, id: &str) {
        self.latched.borrow_mut().remove(id);
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.latched.borrow().contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{progress, video};

    fn attached() -> (Store, Rc<Reconciler>, Rc<RefCell<Vec<String>>>) {
        let store = Store::new();
        let fetched = Rc::new(RefCell::new(Vec::new()));
        let sink = fetched.clone();
        let reconciler = Reconciler::attach(&store, move |id| sink.borrow_mut().push(id));

        (store, reconciler, fetched)
    }

    #[test]
    fn phase_awaiting_metadata_without_progress() {
        assert_eq!(phase(&video("a", "queued"), None), Phase::AwaitingMetadata);
    }

    #[test]
    fn phase_in_progress() {
        let mut telemetry = progress("a", "42.7%");

        telemetry.speed = crate::objects::Reading::Text("1.2MiB/s".into());

        assert_eq!(
            phase(&video("a", "downloading"), Some(&telemetry)),
            Phase::InProgress {
                percent: 42,
                downloaded_size: String::new(),
                total_size: String::new(),
                speed: String::from("1.2MiB/s"),
                eta: String::new(),
            }
        );
    }

    #[test]
    fn phase_finalized_precedence() {
        assert_eq!(
            phase(&video("a", "downloading"), Some(&progress("a", "100%"))),
            Phase::Finalized { confirmed: false }
        );
        assert_eq!(
            phase(&video("a", "completed"), None),
            Phase::Finalized { confirmed: true }
        );
    }

    #[test]
    fn completed_ignores_later_progress() {
        let finished = video("a", "completed");

        for percent in ["0%", "12%", "99.9%", "100%", "garbage"] {
            assert_eq!(
                phase(&finished, Some(&progress("a", percent))),
                Phase::Finalized { confirmed: true }
            );
        }
    }

    #[test]
    fn one_fetch_per_transition() {
        let (store, reconciler, fetched) = attached();

        store.upsert_video(video("a", "downloading"));
        store.upsert_progress(progress("a", "50%"));
        store.upsert_progress(progress("a", "100%"));
        store.upsert_progress(progress("a", "100%"));
        store.upsert_progress(progress("a", "100.0%"));

        assert_eq!(*fetched.borrow(), vec!["a"]);
        assert!(reconciler.is_pending("a"));

        // a second stream starts over
        store.upsert_progress(progress("a", "3%"));
        store.upsert_progress(progress("a", "100%"));

        assert_eq!(*fetched.borrow(), vec!["a", "a"]);
    }

    #[test]
    fn completed_video_is_never_fetched() {
        let (store, reconciler, fetched) = attached();

        store.upsert_video(video("a", "completed"));
        store.upsert_progress(progress("a", "100%"));

        assert!(fetched.borrow().is_empty());
        assert!(!reconciler.is_pending("a"));
    }

    #[test]
    fn completion_releases_latch() {
        let (store, reconciler, fetched) = attached();

        store.upsert_video(video("a", "downloading"));
        store.upsert_progress(progress("a", "100%"));
        store.upsert_video(video("a", "completed"));
        store.upsert_progress(progress("a", "100%"));

        assert_eq!(*fetched.borrow(), vec!["a"]);
        assert!(!reconciler.is_pending("a"));
    }

    #[test]
    fn progress_before_video() {
        let (store, _, fetched) = attached();

        store.upsert_progress(progress("a", "100%"));
        assert!(fetched.borrow().is_empty());

        store.upsert_video(video("a", "downloading"));
        assert_eq!(*fetched.borrow(), vec!["a"]);
    }

    #[test]
    fn failure_allows_retry() {
        let (store, reconciler, fetched) = attached();

        store.upsert_video(video("a", "downloading"));
        store.upsert_progress(progress("a", "100%"));
        reconciler.finalize_failed("a");
        store.upsert_progress(progress("a", "100%"));

        assert_eq!(*fetched.borrow(), vec!["a", "a"]);
    }

    #[test]
    fn snapshot_replacement_reevaluates() {
        let (store, reconciler, fetched) = attached();

        store.upsert_progress(progress("a", "100%"));
        store.upsert_progress(progress("b", "100%"));
        store.replace_videos(vec![video("a", "downloading"), video("b", "completed")]);

        assert_eq!(*fetched.borrow(), vec!["a"]);
        assert!(reconciler.is_pending("a"));

        store.replace_videos(vec![]);
        assert!(!reconciler.is_pending("a"));
    }

    #[test]
    fn removal_releases_latch_and_keeps_progress() {
        let (store, reconciler, _) = attached();

        store.upsert_video(video("a", "downloading"));
        store.upsert_progress(progress("a", "100%"));
        store.remove_video("a");

        assert!(!reconciler.is_pending("a"));
        assert!(store.progress("a").is_some());
    }

    #[test]
    fn stale_progress_is_retained_after_finalize() {
        let (store, _, _) = attached();

        store.upsert_video(video("a", "downloading"));
        store.upsert_progress(progress("a", "100%"));
        store.upsert_video(video("a", "completed"));

        assert_eq!(store.progress("a"), Some(progress("a", "100%")));
        assert_eq!(
            phase(&store.video("a").unwrap(), store.progress("a").as_ref()),
            Phase::Finalized { confirmed: true }
        );
    }

    #[test]
    fn detach_stops_observing() {
        let (store, reconciler, fetched) = attached();

        reconciler.detach(&store);
        store.upsert_video(video("a", "downloading"));
        store.upsert_progress(progress("a", "100%"));

        assert!(fetched.borrow().is_empty());
    }
}
