use super::{
    fetcher::WebFetcher,
    notifier::NotifierSink,
    socket::{self, Socket},
};
use crate::objects::{
    ClientConfig, Format, JobType, NetworkError, Notification, Progress, SyncError, Video,
};
use crate::sync::{
    phase, CommandGateway, DownloadRequest, EventRouter, NotificationSink, Phase, Reconciler,
    SnapshotLoader, Store, Transport,
};
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use yew_agent::{Agent, AgentLink, Bridge, Bridged, Context, HandlerId};

/// What the list renders for one video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRow {
    pub video: Video,
    pub phase: Phase,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub subtitles_url: Option<String>,
}

impl VideoRow {
    pub fn new(config: &ClientConfig, video: &Video, progress: Option<&Progress>) -> Self {
        Self {
            phase: phase(video, progress),
            thumbnail_url: config.files_url(&video.thumbnail_path_id),
            video_url: config.files_url(&video.video_path_id),
            subtitles_url: config.files_url(&video.vtt_path_id),
            video: video.clone(),
        }
    }
}

#[derive(Debug)]
pub enum Request {
    Configure(ClientConfig),
    Load,
    Create {
        url: String,
        format: Format,
        job_type: JobType,
    },
    Delete(String),
    MarkWatched(String),
    SetFilter(String),
    Shutdown,
}

#[derive(Debug)]
pub enum Response {
    Videos {
        rows: Vec<VideoRow>,
        filter: String,
        loading: bool,
    },
    Created(bool),
}

pub enum Message {
    Stream(socket::Response),
    Changed,
    Finalize(String),
    Finalized(String, Result<Video, SyncError>),
    Loaded(Result<usize, SyncError>),
    Created(HandlerId, Result<Video, SyncError>),
    Completed(Result<(), SyncError>),
}

struct Services {
    gateway: Rc<CommandGateway>,
    loader: Rc<SnapshotLoader>,
}

/// Hosts the store for the lifetime of the page and connects it to the
/// service: snapshot loads, commands, and the streaming channel.
pub struct Repo {
    link: AgentLink<Self>,
    subscribers: HashSet<HandlerId>,
    store: Store,
    router: EventRouter,
    sink: Rc<NotifierSink>,
    reconciler: Rc<Reconciler>,
    socket: Box<dyn Bridge<Socket>>,
    config: ClientConfig,
    services: Option<Services>,
    load_requested: bool,
    dirty: Rc<Cell<bool>>,
}

impl Repo {
    fn services(&self) -> Result<&Services, SyncError> {
        self.services
            .as_ref()
            .ok_or_else(|| NetworkError::from("client is not configured").into())
    }

    fn is_loading(&self) -> bool {
        self.load_requested
            || self
                .services
                .as_ref()
                .map(|s| s.loader.is_loading())
                .unwrap_or(false)
    }

    fn rows(&self) -> Vec<VideoRow> {
        self.store.with_state(|state| {
            state
                .filtered_videos()
                .into_iter()
                .map(|video| VideoRow::new(&self.config, video, state.progress(&video.id)))
                .collect()
        })
    }

    fn publish(&self) {
        let rows = self.rows();
        let filter = self.store.filter();
        let loading = self.is_loading();

        for subscriber in &self.subscribers {
            if subscriber.is_respondable() {
                self.link.respond(
                    *subscriber,
                    Response::Videos {
                        rows: rows.clone(),
                        filter: filter.clone(),
                        loading,
                    },
                );
            }
        }
    }

    fn process_update(&mut self, msg: Message) -> Result<(), SyncError> {
        match msg {
            Message::Stream(socket::Response::Event(event)) => {
                log::debug!("routed {:?}", self.router.route(event));
            }
            Message::Changed => {
                self.dirty.set(false);
                self.publish();
            }
            Message::Finalize(id) => {
                let gateway = self.services()?.gateway.clone();

                self.link.send_future(async move {
                    let res = gateway.finalize(&id).await;

                    Message::Finalized(id, res)
                });
            }
            Message::Finalized(id, res) => {
                if res.is_err() {
                    self.reconciler.finalize_failed(&id);
                }
            }
            Message::Loaded(res) => {
                self.load_requested = false;
                if let Ok(count) = res {
                    log::debug!("snapshot of {} videos applied", count);
                }
                self.publish();
            }
            Message::Created(id, res) => {
                self.link.respond(id, Response::Created(res.is_ok()));
            }
            // failures are logged by the gateway
            Message::Completed(_) => {}
        }

        Ok(())
    }

    fn process_handle_input(&mut self, msg: Request, id: HandlerId) -> Result<(), SyncError> {
        match msg {
            Request::Configure(config) => {
                let transport: Rc<dyn Transport> = Rc::new(WebFetcher::new(config.clone()));

                self.services = Some(Services {
                    gateway: Rc::new(CommandGateway::new(
                        self.store.clone(),
                        transport.clone(),
                        self.sink.clone(),
                    )),
                    loader: Rc::new(SnapshotLoader::new(
                        self.store.clone(),
                        transport,
                        self.sink.clone(),
                    )),
                });
                self.socket.send(socket::Request::Connect(config.clone()));
                self.config = config;
            }
            Request::Load => {
                let loader = self.services()?.loader.clone();

                self.load_requested = true;
                self.link
                    .send_future(async move { Message::Loaded(loader.load().await) });
                self.publish();
            }
            Request::Create {
                url,
                format,
                job_type,
            } => {
                let prepared = DownloadRequest::new(&url, format, job_type)
                    .map_err(SyncError::from)
                    .and_then(|request| Ok((request, self.services()?.gateway.clone())));

                match prepared {
                    Ok((request, gateway)) => self.link.send_future(async move {
                        Message::Created(id, gateway.create(request).await)
                    }),
                    Err(e) => {
                        self.link.respond(id, Response::Created(false));
                        return Err(e);
                    }
                }
            }
            Request::Delete(video_id) => {
                let gateway = self.services()?.gateway.clone();

                self.link.send_future(async move {
                    Message::Completed(gateway.delete(&video_id).await)
                });
            }
            Request::MarkWatched(video_id) => {
                let gateway = self.services()?.gateway.clone();

                match self.store.video(&video_id) {
                    Some(video) => self.link.send_future(async move {
                        Message::Completed(gateway.mark_watched(&video).await.map(|_| ()))
                    }),
                    None => log::warn!("cannot mark unknown video {} as watched", video_id),
                }
            }
            Request::SetFilter(filter) => self.store.set_filter(filter),
            Request::Shutdown => self.socket.send(socket::Request::Disconnect),
        }

        Ok(())
    }

    fn report(&self, err: SyncError) {
        log::error!("{}", err);
        self.sink.notify(Notification::error("Error", err.to_string()));
    }
}

impl Agent for Repo {
    type Reach = Context<Self>;
    type Message = Message;
    type Input = Request;
    type Output = Response;

    fn create(link: AgentLink<Self>) -> Self {
        let store = Store::new();
        let sink = Rc::new(NotifierSink::new());
        let dirty = Rc::new(Cell::new(false));

        let changed = link.callback(|_| Message::Changed);
        let flag = dirty.clone();
        store.subscribe(move |_, _| {
            if !flag.replace(true) {
                changed.emit(());
            }
        });

        let finalize = link.callback(Message::Finalize);
        let reconciler = Reconciler::attach(&store, move |id| finalize.emit(id));

        Self {
            socket: Socket::bridge(link.callback(Message::Stream)),
            link,
            subscribers: HashSet::new(),
            router: EventRouter::new(store.clone(), sink.clone()),
            store,
            sink,
            reconciler,
            config: ClientConfig::default(),
            services: None,
            load_requested: false,
            dirty,
        }
    }

    fn update(&mut self, msg: Self::Message) {
        if let Err(e) = self.process_update(msg) {
            self.report(e);
        }
    }

    fn handle_input(&mut self, msg: Self::Input, id: HandlerId) {
        if let Err(e) = self.process_handle_input(msg, id) {
            self.report(e);
        }
    }

    fn connected(&mut self, id: HandlerId) {
        self.subscribers.insert(id);
        self.publish();
    }

    fn disconnected(&mut self, id: HandlerId) {
        self.subscribers.remove(&id);
    }

    fn destroy(&mut self) {
        self.reconciler.detach(&self.store);
        self.socket.send(socket::Request::Disconnect);
    }
}
