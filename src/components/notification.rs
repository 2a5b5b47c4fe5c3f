use crate::agents::notifier::{self, Notifier};
use crate::objects::{self, Severity};
use yew::prelude::*;
use yew_agent::{Bridge, Bridged};

pub struct Notification {
    notifier: Box<dyn Bridge<Notifier>>,
    current_notification: Option<objects::Notification>,
}

pub enum Message {
    NotifierResponse(notifier::Response),
    CloseNotification,
}

fn color(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "is-success",
        Severity::Info => "is-info",
        Severity::Warn => "is-warning",
        Severity::Error => "is-danger",
        Severity::Secondary => "is-light",
        Severity::Contrast => "is-dark",
    }
}

impl Component for Notification {
    type Message = Message;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        Self {
            notifier: Notifier::bridge(ctx.link().callback(Message::NotifierResponse)),
            current_notification: None,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Message::NotifierResponse(notifier::Response::Notification(notification)) => {
                self.current_notification = notification;
                true
            }
            Message::CloseNotification => {
                self.notifier.send(notifier::Request::Dismiss);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        match &self.current_notification {
            Some(notification) => html! {
                <article class={classes!("message", color(notification.severity))}>
                    <div class="message-header">
                        <p>{notification.summary.clone()}</p>
                        <button class="delete" aria-label="delete" onclick={ctx.link().callback(|_| Message::CloseNotification)}></button>
                    </div>
                    <div class="message-body">
                        {notification.detail.clone()}
                    </div>
                </article>
            },
            None => html! {},
        }
    }
}
