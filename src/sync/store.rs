//! The single in-memory source of truth for videos and their progress.
//!
//! State is only reachable through named mutations. Every mutation notifies
//! the registered listeners synchronously, in order, with an immutable view
//! of the state after the write. Mutations issued from inside a listener are
//! queued and run, with their own notifications, once the current pass is
//! over and before the outermost mutation call returns.

use crate::objects::{Progress, Video};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    VideoUpserted(String),
    VideoRemoved(String),
    VideosReplaced,
    ProgressUpserted(String),
    ProgressRemoved(String),
    FilterChanged,
}

impl Change {
    /// The video id the change is about, if it concerns a single one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Change::VideoUpserted(id)
            | Change::VideoRemoved(id)
            | Change::ProgressUpserted(id)
            | Change::ProgressRemoved(id) => Some(id),
            Change::VideosReplaced | Change::FilterChanged => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    videos: HashMap<String, Video>,
    progress: HashMap<String, Progress>,
    filter: String,
}

impl StoreState {
    pub fn video(&self, id: &str) -> Option<&Video> {
        self.videos.get(id)
    }

    pub fn progress(&self, video_id: &str) -> Option<&Progress> {
        self.progress.get(video_id)
    }

    /// All videos ordered by id.
    pub fn videos(&self) -> Vec<&Video> {
        let mut videos: Vec<&Video> = self.videos.values().collect();

        videos.sort_by(|a, b| a.id.cmp(&b.id));
        videos
    }

    /// Videos matching the free-text filter, ordered by id.
    pub fn filtered_videos(&self) -> Vec<&Video> {
        self.videos()
            .into_iter()
            .filter(|video| video.matches(&self.filter))
            .collect()
    }

    pub fn video_ids(&self) -> Vec<String> {
        self.videos().into_iter().map(|v| v.id.clone()).collect()
    }

    pub fn progress_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.progress.keys().cloned().collect();

        ids.sort();
        ids
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    pub fn progress_count(&self) -> usize {
        self.progress.len()
    }

    fn apply(&mut self, mutation: Mutation) -> Option<Change> {
        match mutation {
            Mutation::UpsertVideo(video) => {
                let id = video.id.clone();

                self.videos.insert(id.clone(), video);
                Some(Change::VideoUpserted(id))
            }
            Mutation::RemoveVideo(id) => self
                .videos
                .remove(&id)
                .map(|_| Change::VideoRemoved(id)),
            Mutation::ReplaceVideos(videos) => {
                self.videos = videos.into_iter().map(|v| (v.id.clone(), v)).collect();
                Some(Change::VideosReplaced)
            }
            Mutation::UpsertProgress(progress) => {
                let id = progress.video_id.clone();

                self.progress.insert(id.clone(), progress);
                Some(Change::ProgressUpserted(id))
            }
            Mutation::RemoveProgress(id) => self
                .progress
                .remove(&id)
                .map(|_| Change::ProgressRemoved(id)),
            Mutation::SetFilter(filter) => {
                self.filter = filter;
                Some(Change::FilterChanged)
            }
        }
    }
}

#[derive(Debug)]
enum Mutation {
    UpsertVideo(Video),
    RemoveVideo(String),
    ReplaceVideos(Vec<Video>),
    UpsertProgress(Progress),
    RemoveProgress(String),
    SetFilter(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&Change, &StoreState)>;

struct Inner {
    state: RefCell<StoreState>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    queue: RefCell<VecDeque<Mutation>>,
    dispatching: Cell<bool>,
    next_subscription: Cell<u64>,
}

/// Cheaply cloneable handle; all clones share the same state.
#[derive(Clone)]
pub struct Store {
    inner: Rc<Inner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(StoreState::default()),
                listeners: RefCell::new(Vec::new()),
                queue: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                next_subscription: Cell::new(0),
            }),
        }
    }

    /// Inserts or wholly replaces the video under `video.id`.
    pub fn upsert_video(&self, video: Video) {
        self.apply(Mutation::UpsertVideo(video))
    }

    /// No-op (and no notification) when the id is unknown.
    pub fn remove_video(&self, id: &str) {
        self.apply(Mutation::RemoveVideo(String::from(id)))
    }

    /// Swaps the whole video collection in one write and one notification.
    pub fn replace_videos(&self, videos: Vec<Video>) {
        self.apply(Mutation::ReplaceVideos(videos))
    }

    pub fn upsert_progress(&self, progress: Progress) {
        self.apply(Mutation::UpsertProgress(progress))
    }

    pub fn remove_progress(&self, video_id: &str) {
        self.apply(Mutation::RemoveProgress(String::from(video_id)))
    }

    pub fn set_filter(&self, filter: impl Into<String>) {
        self.apply(Mutation::SetFilter(filter.into()))
    }

    pub fn subscribe(&self, listener: impl Fn(&Change, &StoreState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.get());

        self.inner.next_subscription.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn video(&self, id: &str) -> Option<Video> {
        self.inner.state.borrow().video(id).cloned()
    }

    pub fn progress(&self, video_id: &str) -> Option<Progress> {
        self.inner.state.borrow().progress(video_id).cloned()
    }

    pub fn videos(&self) -> Vec<Video> {
        self.inner
            .state
            .borrow()
            .videos()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn filtered_videos(&self) -> Vec<Video> {
        self.inner
            .state
            .borrow()
            .filtered_videos()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn filter(&self) -> String {
        String::from(self.inner.state.borrow().filter())
    }

    /// Runs `f` against the current state without copying it. `f` must not
    /// mutate the store.
    pub fn with_state<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Detached copy of the current state.
    pub fn snapshot(&self) -> StoreState {
        self.inner.state.borrow().clone()
    }

    fn apply(&self, mutation: Mutation) {
        self.inner.queue.borrow_mut().push_back(mutation);

        if self.inner.dispatching.get() {
            return;
        }

        self.inner.dispatching.set(true);

        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let mutation = match next {
                Some(mutation) => mutation,
                None => break,
            };
            let change = self.inner.state.borrow_mut().apply(mutation);

            if let Some(change) = change {
                log::debug!("store: {:?}", change);

                let listeners: Vec<Listener> = self
                    .inner
                    .listeners
                    .borrow()
                    .iter()
                    .map(|(_, listener)| listener.clone())
                    .collect();
                let state = self.inner.state.borrow();

                for listener in listeners {
                    listener(&change, &state);
                }
            }
        }

        self.inner.dispatching.set(false);
    }
}
