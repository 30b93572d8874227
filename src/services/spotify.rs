//! Spotify playlists, albums and single tracks through the Web API.
//!
//! Authentication is the client-credentials grant, so only public objects are
//! reachable. Playlist and album tracks are paged by `offset`/`limit` through
//! the shared window engine. The playlist object, which embeds the first page
//! of tracks, is the secondary source when a playlist window comes back empty.

use std::time::{Duration, Instant};

use reqwest::{Client, Response, StatusCode, header::RETRY_AFTER};
use serde::{Deserialize, de::DeserializeOwned};
use tokio::time::sleep;
use tracing::{info, warn};

use super::{
    check_status,
    paging::{Page, PageOutcome, collect_pages, collect_pages_with_fallback},
};
use crate::{
    config::{Config, PagingConfig},
    error::{PipelineError, PipelineResult},
    reference::{SpotifyKind, spotify_target},
    track::{Track, TrackList, TrackListBuilder, Validation},
    types::{PlaylistReference, Service},
};

/// Largest `limit` the playlist tracks endpoint accepts.
const PLAYLIST_PAGE_LIMIT: usize = 100;
/// Albums are served at most 50 tracks per page.
const ALBUM_PAGE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

impl SpotifyTrack {
    fn into_track(self) -> Track {
        let artist = self
            .artists
            .iter()
            .filter_map(|a| a.name.as_deref())
            .collect::<Vec<_>>()
            .join(", ");
        Track::new(artist, self.name.unwrap_or_default())
    }
}

// Local files and removed tracks come back as `"track": null`.
#[derive(Debug, Deserialize)]
struct PlaylistItem {
    #[serde(default)]
    track: Option<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct PlaylistTracksPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

impl PlaylistTracksPage {
    // A null entry stays as a blank track so the page keeps its length and
    // is not mistaken for the last one; the list builder drops it.
    fn into_tracks(self) -> Vec<Track> {
        self.items
            .into_iter()
            .map(|item| {
                item.track
                    .map(SpotifyTrack::into_track)
                    .unwrap_or_else(|| Track::new("", ""))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct PlaylistObject {
    tracks: PlaylistTracksPage,
}

#[derive(Debug, Deserialize)]
struct AlbumTracksPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

fn unavailable(detail: impl Into<String>) -> PipelineError {
    PipelineError::unavailable(Service::Spotify, detail)
}

async fn request_token(http: &Client, config: &Config) -> PipelineResult<String> {
    let (client_id, client_secret) = config.credentials.spotify()?;
    let response = http
        .post(&config.endpoints.spotify_token)
        .basic_auth(client_id, Some(client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    if !response.status().is_success() {
        return Err(unavailable(format!(
            "token request rejected: HTTP {}",
            response.status()
        )));
    }
    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| unavailable(format!("malformed token response: {e}")))?;
    Ok(token.access_token)
}

/// Everything a page task needs to call the API on its own.
#[derive(Debug, Clone)]
struct SpotifyApi {
    http: Client,
    base: String,
    token: String,
    deadline: Instant,
}

impl SpotifyApi {
    fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    async fn get(&self, url: &str) -> PipelineResult<Response> {
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))
    }

    /// Sends one GET. A 429 is waited out once when `Retry-After` fits into
    /// what is left of the budget.
    async fn send(&self, url: &str) -> PipelineResult<Response> {
        let mut response = self.get(url).await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(1));

            if retry_after >= self.remaining() {
                return Err(unavailable(format!(
                    "rate limited for {} seconds",
                    retry_after.as_secs()
                )));
            }
            warn!(retry_after_secs = retry_after.as_secs(), "spotify.rate_limited");
            sleep(retry_after).await;
            response = self.get(url).await?;
        }
        check_status(Service::Spotify, response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> PipelineResult<T> {
        self.send(url)
            .await?
            .json()
            .await
            .map_err(|e| unavailable(format!("malformed response: {e}")))
    }
}

async fn playlist_page(api: SpotifyApi, id: String, page: Page) -> PageOutcome {
    let url = format!(
        "{}/playlists/{id}/tracks?offset={}&limit={}&additional_types=track",
        api.base, page.offset, page.size
    );
    let body: PlaylistTracksPage = api.get_json(&url).await?;
    Ok(body.into_tracks())
}

/// The playlist object only embeds the first page, so later pages are empty.
async fn playlist_object_page(api: SpotifyApi, id: String, page: Page) -> PageOutcome {
    if page.index > 0 {
        return Ok(Vec::new());
    }
    let url = format!("{}/playlists/{id}?additional_types=track", api.base);
    let playlist: PlaylistObject = api.get_json(&url).await?;
    Ok(playlist.tracks.into_tracks())
}

async fn album_page(api: SpotifyApi, id: String, page: Page) -> PageOutcome {
    let url = format!(
        "{}/albums/{id}/tracks?offset={}&limit={}",
        api.base, page.offset, page.size
    );
    let body: AlbumTracksPage = api.get_json(&url).await?;
    Ok(body.items.into_iter().map(SpotifyTrack::into_track).collect())
}

fn capped(cfg: &PagingConfig, limit: usize) -> PagingConfig {
    PagingConfig {
        page_size: cfg.page_size.min(limit),
        ..cfg.clone()
    }
}

async fn single_track(api: &SpotifyApi, id: &str) -> PipelineResult<TrackList> {
    let url = format!("{}/tracks/{id}", api.base);
    let track: SpotifyTrack = api.get_json(&url).await?;
    let mut builder = TrackListBuilder::new(Validation::ArtistAndTitle);
    builder.push(track.into_track());
    Ok(builder.finish())
}

pub async fn fetch(
    http: &Client,
    config: &Config,
    reference: &PlaylistReference,
) -> PipelineResult<TrackList> {
    let target = spotify_target(reference).ok_or(PipelineError::UnrecognizedReference)?;
    let token = request_token(http, config).await?;
    info!(kind = ?target.kind, id = %target.id, "spotify.fetch");

    let api = SpotifyApi {
        http: http.clone(),
        base: config.endpoints.spotify_api.clone(),
        token,
        deadline: Instant::now() + config.spotify.budget,
    };
    let id = target.id;

    let list = match target.kind {
        SpotifyKind::Track => single_track(&api, &id).await?,
        SpotifyKind::Playlist => {
            collect_pages_with_fallback(
                Service::Spotify,
                &capped(&config.spotify, PLAYLIST_PAGE_LIMIT),
                |page| playlist_page(api.clone(), id.clone(), page),
                |page| playlist_object_page(api.clone(), id.clone(), page),
            )
            .await?
        }
        SpotifyKind::Album => {
            collect_pages(
                Service::Spotify,
                &capped(&config.spotify, ALBUM_PAGE_LIMIT),
                |page| album_page(api.clone(), id.clone(), page),
            )
            .await?
        }
    };
    info!(tracks = list.len(), "spotify.done");
    Ok(list)
}
