use crate::agents::repo::{Repo, Request as RepoRequest, Response as RepoResponse};
use crate::objects::{Format, JobType, NetworkError};
use yew::prelude::*;
use yew_agent::{Bridge, Bridged};

pub struct DownloadForm {
    repo: Box<dyn Bridge<Repo>>,
    url_ref: NodeRef,
    format_ref: NodeRef,
    type_ref: NodeRef,
    submitting: bool,
}

pub enum Message {
    RepoMessage(RepoResponse),
    Submit,
}

impl DownloadForm {
    fn process_update(&mut self, msg: Message) -> Result<bool, NetworkError> {
        match msg {
            Message::RepoMessage(RepoResponse::Created(ok)) => {
                if ok {
                    if let Some(elem) = self.url_ref.cast::<web_sys::HtmlInputElement>() {
                        elem.set_value("");
                    }
                }
                self.submitting = false;
                Ok(true)
            }
            Message::RepoMessage(_) => Ok(false),
            Message::Submit => {
                let url = self
                    .url_ref
                    .cast::<web_sys::HtmlInputElement>()
                    .ok_or("could not get input element")?;
                let format = self
                    .format_ref
                    .cast::<web_sys::HtmlSelectElement>()
                    .ok_or("could not get format element")?;
                let job_type = self
                    .type_ref
                    .cast::<web_sys::HtmlSelectElement>()
                    .ok_or("could not get type element")?;

                self.repo.send(RepoRequest::Create {
                    url: url.value(),
                    format: Format::parse(&format.value()).unwrap_or(Format::Best),
                    job_type: match job_type.value().as_str() {
                        "scan" => JobType::Scan,
                        _ => JobType::Download,
                    },
                });
                self.submitting = true;
                Ok(true)
            }
        }
    }
}

impl Component for DownloadForm {
    type Message = Message;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        Self {
            repo: Repo::bridge(ctx.link().callback(Message::RepoMessage)),
            url_ref: NodeRef::default(),
            format_ref: NodeRef::default(),
            type_ref: NodeRef::default(),
            submitting: false,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match self.process_update(msg) {
            Ok(res) => res,
            Err(e) => {
                log::error!("download form: {}", e);
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <section class="section">
                <div class="columns">
                    <div class="column is-half">
                        <input class="input" ref={self.url_ref.clone()} type="text" placeholder="video url"/>
                    </div>
                    <div class="column">
                        <div class="select">
                            <select ref={self.format_ref.clone()}>
                                { Format::all().iter().map(|f| html! {
                                    <option value={f.as_str()}>{f.label()}</option>
                                }).collect::<Html>() }
                            </select>
                        </div>
                    </div>
                    <div class="column">
                        <div class="select">
                            <select ref={self.type_ref.clone()}>
                                <option value="download">{"Download"}</option>
                                <option value="scan">{"Scan"}</option>
                            </select>
                        </div>
                    </div>
                    <div class="column">
                        <button class={classes!("button", "is-primary", self.submitting.then(|| "is-loading"))}
                            onclick={ctx.link().callback(|_| Message::Submit)}>{"download"}</button>
                    </div>
                </div>
            </section>
        }
    }
}
