//! Yandex Music playlists.
//!
//! The public web handler is paged by `page`/`page-size` and needs no token.
//! The mobile API serves the same playlist in one response and is used as
//! the secondary source when a window of the handler comes back empty.

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{
    get_json,
    paging::{Page, PageOutcome, collect_pages_with_fallback},
};
use crate::{
    config::Config,
    error::{PipelineError, PipelineResult},
    reference::{YandexTarget, yandex_target},
    track::{Track, TrackList},
    types::{PlaylistReference, Service},
};

#[derive(Debug, Deserialize)]
struct HandlerResponse {
    #[serde(default)]
    playlist: Option<PlaylistBody>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    result: Option<PlaylistBody>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaylistBody {
    #[serde(default)]
    tracks: Vec<PlaylistItem>,
}

// The handler nests each entry under `track`, older responses do not.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlaylistItem {
    Wrapped { track: YandexTrack },
    Bare(YandexTrack),
}

#[derive(Debug, Default, Deserialize)]
struct YandexTrack {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artists: Vec<YandexArtist>,
}

#[derive(Debug, Deserialize)]
struct YandexArtist {
    #[serde(default)]
    name: Option<String>,
}

impl PlaylistItem {
    fn into_track(self) -> Track {
        let track = match self {
            PlaylistItem::Wrapped { track } | PlaylistItem::Bare(track) => track,
        };
        let artist = track
            .artists
            .iter()
            .filter_map(|a| a.name.as_deref())
            .collect::<Vec<_>>()
            .join(", ");
        Track::new(artist, track.title.unwrap_or_default())
    }
}

fn into_tracks(body: Option<PlaylistBody>) -> Vec<Track> {
    body.unwrap_or_default()
        .tracks
        .into_iter()
        .map(PlaylistItem::into_track)
        .collect()
}

fn handler_outcome(response: HandlerResponse) -> PageOutcome {
    match response.error {
        Some(error) => Err(PipelineError::restricted(Service::Yandex, error)),
        None => Ok(into_tracks(response.playlist)),
    }
}

async fn handler_page(http: Client, base: String, target: YandexTarget, page: Page) -> PageOutcome {
    let page_no = page.index.to_string();
    let page_size = page.size.to_string();
    let request = http.get(format!("{base}/handlers/playlist.jsx")).query(&[
        ("owner", target.owner.as_str()),
        ("kinds", target.kind.as_str()),
        ("light", "false"),
        ("page", page_no.as_str()),
        ("page-size", page_size.as_str()),
    ]);
    let response: HandlerResponse = get_json(Service::Yandex, request).await?;
    handler_outcome(response)
}

async fn api_page(
    http: Client,
    base: String,
    token: Option<String>,
    target: YandexTarget,
    page: Page,
) -> PageOutcome {
    let mut request = http
        .get(format!(
            "{base}/users/{owner}/playlists/{kind}",
            owner = target.owner,
            kind = target.kind
        ))
        .query(&[("page", page.index), ("page-size", page.size)]);
    if let Some(token) = token {
        request = request.header("Authorization", format!("OAuth {token}"));
    }
    let response: ApiResponse = get_json(Service::Yandex, request).await?;
    Ok(into_tracks(response.result))
}

pub async fn fetch(
    http: &Client,
    config: &Config,
    reference: &PlaylistReference,
) -> PipelineResult<TrackList> {
    let target = yandex_target(reference).ok_or(PipelineError::UnrecognizedReference)?;
    info!(owner = %target.owner, kind = %target.kind, "yandex.fetch");

    let web = config.endpoints.yandex_web.clone();
    let api = config.endpoints.yandex_api.clone();
    let token = config.credentials.yandex().map(str::to_string);

    collect_pages_with_fallback(
        Service::Yandex,
        &config.yandex,
        |page| handler_page(http.clone(), web.clone(), target.clone(), page),
        |page| api_page(http.clone(), api.clone(), token.clone(), target.clone(), page),
    )
    .await
}
