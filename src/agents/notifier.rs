use crate::objects::{Notification, Severity};
use crate::sync::NotificationSink;
use crate::utils;
use std::cell::RefCell;
use std::collections::HashSet;
use uuid::Uuid;
use yew_agent::{Agent, AgentLink, Context, Dispatched, Dispatcher, HandlerId};

pub struct Notifier {
    subscribers: HashSet<HandlerId>,
    link: AgentLink<Self>,
    notifications: Vec<(Uuid, Notification)>,
}

#[derive(Debug)]
pub enum Request {
    Notify(Notification),
    Dismiss,
}

#[derive(Debug)]
pub enum Response {
    Notification(Option<Notification>),
}

pub enum Message {
    Expired(Uuid),
}

impl Notifier {
    fn notify_subscribed(&self) {
        for subscriber in &self.subscribers {
            if subscriber.is_respondable() {
                self.link.respond(
                    *subscriber,
                    Response::Notification(
                        self.notifications.first().map(|(_, n)| n.clone()),
                    ),
                );
            }
        }
    }
}

impl Agent for Notifier {
    type Reach = Context<Self>;
    type Message = Message;
    type Input = Request;
    type Output = Response;

    fn create(link: AgentLink<Self>) -> Self {
        Self {
            link,
            subscribers: HashSet::new(),
            notifications: Vec::new(),
        }
    }

    fn update(&mut self, msg: Self::Message) {
        match msg {
            Message::Expired(id) => {
                let before = self.notifications.len();

                self.notifications.retain(|(key, _)| *key != id);
                if self.notifications.len() != before {
                    self.notify_subscribed();
                }
            }
        }
    }

    fn handle_input(&mut self, msg: Self::Input, _id: HandlerId) {
        match msg {
            Request::Notify(notification) => {
                match notification.severity {
                    Severity::Error => log::error!("{}: {}", notification.summary, notification.detail),
                    Severity::Warn => log::warn!("{}: {}", notification.summary, notification.detail),
                    _ => log::info!("{}: {}", notification.summary, notification.detail),
                }

                let id = Uuid::new_v4();

                if let Some(life) = notification.life {
                    self.link.send_future(async move {
                        if let Err(e) = utils::sleep(life).await {
                            log::warn!("notification timer failed: {:?}", e);
                        }
                        Message::Expired(id)
                    });
                }
                self.notifications.push((id, notification));
            }
            Request::Dismiss => {
                if !self.notifications.is_empty() {
                    self.notifications.remove(0);
                }
            }
        }
        self.notify_subscribed();
    }

    fn connected(&mut self, id: HandlerId) {
        self.subscribers.insert(id);
        self.notify_subscribed();
    }

    fn disconnected(&mut self, id: HandlerId) {
        self.subscribers.remove(&id);
    }
}

/// Hands notifications raised by the sync layer to the notifier agent.
pub struct NotifierSink(RefCell<Dispatcher<Notifier>>);

impl NotifierSink {
    pub fn new() -> Self {
        Self(RefCell::new(Notifier::dispatcher()))
    }
}

impl Default for NotifierSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for NotifierSink {
    fn notify(&self, notification: Notification) {
        self.0.borrow_mut().send(Request::Notify(notification));
    }
}
