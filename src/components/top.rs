use super::{download_form::DownloadForm, notification::Notification, video_list::VideoList};
use crate::agents::{
    fetcher,
    repo::{self, Repo},
};
use crate::objects::ClientConfig;
use yew::{prelude::*, Component};
use yew_agent::{Bridge, Bridged};

pub struct Top {
    repo: Box<dyn Bridge<Repo>>,
}

pub enum Message {
    Configured(ClientConfig),
    RepoMessage(repo::Response),
}

impl Component for Top {
    type Message = Message;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let configured = ctx.link().callback(Message::Configured);

        wasm_bindgen_futures::spawn_local(async move {
            configured.emit(fetcher::load_config().await);
        });

        Self {
            repo: Repo::bridge(ctx.link().callback(Message::RepoMessage)),
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Message::Configured(config) => {
                log::info!("api at {}, streaming from {}", config.api_base, config.socket_url);
                self.repo.send(repo::Request::Configure(config));
                self.repo.send(repo::Request::Load);
                false
            }
            Message::RepoMessage(_) => false,
        }
    }

    fn view(&self, _ctx: &Context<Self>) -> Html {
        html! {
            <>
                <section class="hero is-small is-primary">
                    <div class="hero-body"><p class="title">{"Video Downloader"}</p></div>
                </section>
                <Notification/>
                <DownloadForm/>
                <VideoList/>
            </>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.repo.send(repo::Request::Shutdown);
    }
}
