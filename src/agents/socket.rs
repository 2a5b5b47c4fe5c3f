use super::notifier::{self, Notifier};
use crate::objects::{ClientConfig, Notification, TransportError};
use crate::sync::{Action, Connection, ReconnectPolicy, StreamEvent};
use crate::utils;
use std::collections::HashSet;
use wasm_bindgen::{closure::Closure, JsCast};
use yew_agent::{Agent, AgentLink, Context, Dispatched, Dispatcher, HandlerId};

#[derive(Debug)]
pub enum Request {
    Connect(ClientConfig),
    Disconnect,
}

#[derive(Debug)]
pub enum Response {
    Event(StreamEvent),
}

pub enum Message {
    Frame(web_sys::MessageEvent),
    Closed(web_sys::CloseEvent),
    Errored(web_sys::Event),
    Retry(u32),
    Heartbeat(u32, u32),
}

/// Owns the websocket of the streaming channel and forwards decoded events
/// to its subscribers.
pub struct Socket {
    link: AgentLink<Self>,
    subscribers: HashSet<HandlerId>,
    connection: Connection,
    endpoint: Option<String>,
    // bumped on every connect; stale timers are ignored
    epoch: u32,
    ws: Option<web_sys::WebSocket>,
    closure_message: Closure<dyn Fn(web_sys::MessageEvent)>,
    closure_close: Closure<dyn Fn(web_sys::CloseEvent)>,
    closure_error: Closure<dyn Fn(web_sys::Event)>,
    notifier: Dispatcher<Notifier>,
}

impl Socket {
    fn open(&mut self) {
        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => return,
        };

        self.connection.opening();
        match web_sys::WebSocket::new(&endpoint) {
            Ok(ws) => {
                log::info!("opening streaming connection to {}", endpoint);
                ws.set_onmessage(Some(self.closure_message.as_ref().unchecked_ref()));
                ws.set_onclose(Some(self.closure_close.as_ref().unchecked_ref()));
                ws.set_onerror(Some(self.closure_error.as_ref().unchecked_ref()));
                self.ws = Some(ws);
            }
            Err(e) => {
                let err = TransportError::from(e);
                let actions = self.connection.on_close(&err.to_string());

                self.execute(actions);
            }
        }
    }

    fn release(&mut self) {
        if let Some(ws) = self.ws.take() {
            ws.set_onmessage(None);
            ws.set_onclose(None);
            ws.set_onerror(None);
            if let Err(e) = ws.close() {
                log::warn!("could not close websocket: {:?}", e);
            }
        }
    }

    fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Send(frame) => match &self.ws {
                    Some(ws) => {
                        if let Err(e) = ws.send_with_str(&frame) {
                            log::warn!("could not send frame \"{}\": {:?}", frame, e);
                        }
                    }
                    None => log::warn!("no socket to send \"{}\"", frame),
                },
                Action::Emit(event) => {
                    for subscriber in &self.subscribers {
                        if subscriber.is_respondable() {
                            self.link.respond(*subscriber, Response::Event(event.clone()));
                        }
                    }
                }
                Action::Reconnect { attempt, delay_ms } => {
                    log::info!("reconnecting in {} ms (attempt {})", delay_ms, attempt);
                    let epoch = self.epoch;

                    self.release();
                    self.link.send_future(async move {
                        if let Err(e) = utils::sleep(delay_ms).await {
                            log::warn!("reconnect timer failed: {:?}", e);
                        }
                        Message::Retry(epoch)
                    });
                }
                Action::ArmHeartbeat { beat, delay_ms } => {
                    let epoch = self.epoch;

                    self.link.send_future(async move {
                        if let Err(e) = utils::sleep(delay_ms).await {
                            log::warn!("heartbeat timer failed: {:?}", e);
                        }
                        Message::Heartbeat(epoch, beat)
                    });
                }
                Action::GiveUp(err) => {
                    self.release();
                    self.notifier.send(notifier::Request::Notify(Notification::error(
                        "Connection",
                        err.to_string(),
                    )));
                }
            }
        }
    }

    fn shutdown(&mut self) {
        let actions = self.connection.close();

        self.endpoint = None;
        self.execute(actions);
        self.release();
    }
}

impl Agent for Socket {
    type Reach = Context<Self>;
    type Message = Message;
    type Input = Request;
    type Output = Response;

    fn create(link: AgentLink<Self>) -> Self {
        let callback_message = link.callback(Message::Frame);
        let callback_close = link.callback(Message::Closed);
        let callback_error = link.callback(Message::Errored);

        Self {
            link,
            subscribers: HashSet::new(),
            connection: Connection::new(ReconnectPolicy::from(&ClientConfig::default())),
            endpoint: None,
            epoch: 0,
            ws: None,
            closure_message: Closure::wrap(Box::new(move |event: web_sys::MessageEvent| {
                callback_message.emit(event)
            }) as Box<dyn Fn(_)>),
            closure_close: Closure::wrap(Box::new(move |event: web_sys::CloseEvent| {
                callback_close.emit(event)
            }) as Box<dyn Fn(_)>),
            closure_error: Closure::wrap(Box::new(move |event: web_sys::Event| {
                callback_error.emit(event)
            }) as Box<dyn Fn(_)>),
            notifier: Notifier::dispatcher(),
        }
    }

    fn update(&mut self, msg: Self::Message) {
        match msg {
            Message::Frame(event) => match event.data().as_string() {
                Some(frame) => {
                    log::debug!("frame: {}", frame);
                    let actions = self.connection.on_frame(&frame);

                    self.execute(actions);
                }
                None => log::warn!("dropping non-text frame"),
            },
            Message::Closed(event) => {
                let reason = match event.reason().is_empty() {
                    true => format!("transport close ({})", event.code()),
                    false => event.reason(),
                };
                let actions = self.connection.on_close(&reason);

                self.ws = None;
                self.execute(actions);
            }
            // a close event follows
            Message::Errored(_) => log::warn!("streaming connection error"),
            Message::Retry(epoch) if epoch == self.epoch => self.open(),
            Message::Retry(_) => {}
            Message::Heartbeat(epoch, beat) if epoch == self.epoch => {
                let actions = self.connection.on_heartbeat(beat);

                self.execute(actions);
            }
            Message::Heartbeat(..) => {}
        }
    }

    fn handle_input(&mut self, msg: Self::Input, _id: HandlerId) {
        match msg {
            Request::Connect(config) => {
                self.shutdown();
                self.epoch = self.epoch.wrapping_add(1);
                self.connection = Connection::new(ReconnectPolicy::from(&config));

                match config.socket_endpoint() {
                    Ok(endpoint) => {
                        self.endpoint = Some(endpoint);
                        self.open();
                    }
                    Err(e) => self.notifier.send(notifier::Request::Notify(
                        Notification::error("Connection", e.to_string()),
                    )),
                }
            }
            Request::Disconnect => self.shutdown(),
        }
    }

    fn connected(&mut self, id: HandlerId) {
        self.subscribers.insert(id);
    }

    fn disconnected(&mut self, id: HandlerId) {
        self.subscribers.remove(&id);
    }

    fn destroy(&mut self) {
        self.shutdown();
    }
}
