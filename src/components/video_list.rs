use crate::agents::repo::{Repo, Request as RepoRequest, Response as RepoResponse, VideoRow};
use crate::sync::Phase;
use yew::prelude::*;
use yew_agent::{Bridge, Bridged};

pub struct VideoList {
    repo: Box<dyn Bridge<Repo>>,
    rows: Vec<VideoRow>,
    filter: String,
    loading: bool,
}

pub enum Message {
    RepoMessage(RepoResponse),
    Filter(String),
    Delete(String),
    MarkWatched(String),
}

impl VideoList {
    fn view_phase(row: &VideoRow) -> Html {
        match &row.phase {
            Phase::AwaitingMetadata => html! { <span class="tag">{"awaiting metadata"}</span> },
            Phase::InProgress {
                percent,
                downloaded_size,
                total_size,
                speed,
                eta,
            } => html! {
                <div>
                    <progress class="progress is-small is-info" value={percent.to_string()} max="100">{format!("{}%", percent)}</progress>
                    <p class="is-size-7">{format!("{}% {} / {} {} eta {}", percent, downloaded_size, total_size, speed, eta)}</p>
                </div>
            },
            Phase::Finalized { confirmed: false } => html! { <span class="tag is-warning">{"finalizing"}</span> },
            Phase::Finalized { confirmed: true } => html! {
                <span class="tag is-success">{format!("{} {}", row.video.size, row.video.resolution)}</span>
            },
        }
    }

    fn view_row(&self, ctx: &Context<Self>, row: &VideoRow) -> Html {
        let video = &row.video;
        let id_delete = video.id.clone();
        let id_watched = video.id.clone();
        let title = match video.full_title.is_empty() {
            true => video.url.clone(),
            false => video.full_title.clone(),
        };

        html! {
            <tr key={video.id.clone()}>
                <td>
                    { match &row.thumbnail_url {
                        Some(src) => html! { <figure class="image is-128x128"><img src={src.clone()} alt={title.clone()}/></figure> },
                        None => html! {},
                    }}
                </td>
                <td>
                    <p>{&title}</p>
                    <p class="is-size-7">{format!("{} {}", video.duration_string, video.format.label())}</p>
                    // watching counts once playback starts
                    { match &row.video_url {
                        Some(src) => html! {
                            <video controls=true preload="none" width="320" src={src.clone()}
                                onplay={ctx.link().callback(move |_| Message::MarkWatched(id_watched.clone()))}>
                                { match &row.subtitles_url {
                                    Some(track) => html! { <track kind="subtitles" src={track.clone()} default=true/> },
                                    None => html! {},
                                }}
                            </video>
                        },
                        None => html! {},
                    }}
                </td>
                <td>{format!("{:?}", video.download_status).to_lowercase()}</td>
                <td>{ Self::view_phase(row) }</td>
                <td>
                    <div class="buttons">
                        { match video.watched {
                            true => html! { <span class="tag is-light">{"watched"}</span> },
                            false => html! {},
                        }}
                        <button class="button is-small is-danger"
                            onclick={ctx.link().callback(move |_| Message::Delete(id_delete.clone()))}>{"delete"}</button>
                    </div>
                </td>
            </tr>
        }
    }
}

impl Component for VideoList {
    type Message = Message;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        Self {
            repo: Repo::bridge(ctx.link().callback(Message::RepoMessage)),
            rows: Vec::new(),
            filter: String::new(),
            loading: false,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Message::RepoMessage(RepoResponse::Videos {
                rows,
                filter,
                loading,
            }) => {
                self.rows = rows;
                self.filter = filter;
                self.loading = loading;
                true
            }
            Message::RepoMessage(_) => false,
            Message::Filter(filter) => {
                self.repo.send(RepoRequest::SetFilter(filter));
                false
            }
            Message::Delete(id) => {
                self.repo.send(RepoRequest::Delete(id));
                false
            }
            Message::MarkWatched(id) => {
                self.repo.send(RepoRequest::MarkWatched(id));
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let oninput = ctx.link().callback(|e: InputEvent| {
            Message::Filter(e.target_unchecked_into::<web_sys::HtmlInputElement>().value())
        });

        html! {
            <section class="section">
                <input class="input" type="text" placeholder="filter" value={self.filter.clone()} {oninput}/>
                { match (self.loading, self.rows.is_empty()) {
                    (true, _) => html! { <progress class="progress is-small is-primary" max="100"/> },
                    (false, true) => html! { <p>{"no videos available"}</p> },
                    (false, false) => html! {},
                }}
                <table class="table is-fullwidth">
                    <tbody>
                        { self.rows.iter().map(|row| self.view_row(ctx, row)).collect::<Html>() }
                    </tbody>
                </table>
            </section>
        }
    }
}
