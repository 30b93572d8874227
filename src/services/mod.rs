//! Track fetchers, one per service, plus the file import.
//!
//! Every fetcher turns a [`PlaylistReference`] into a deduplicated
//! [`TrackList`]. They share one HTTP client and the windowed paging engine in
//! [`paging`].

use std::time::Duration;

use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue},
    redirect::Policy,
};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::{PipelineError, PipelineResult},
    track::TrackList,
    types::{PlaylistReference, Service},
};

pub mod file;
pub mod paging;
pub mod spotify;
pub mod vk;
pub mod yandex;

/// Builds the client every fetcher shares: browser-like headers, the
/// per-request timeout and a bounded redirect chain.
pub fn build_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/html;q=0.9, */*;q=0.8"),
    );
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.http_timeout)
        .connect_timeout(config.http_timeout.min(Duration::from_secs(5)))
        .redirect(Policy::limited(10))
        .build()
}

/// Maps a non-success status to the error a user can act on.
pub(crate) fn check_status(service: Service, response: Response) -> PipelineResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Err(
            PipelineError::restricted(service, format!("HTTP {status}")),
        ),
        _ => Err(PipelineError::unavailable(service, format!("HTTP {status}"))),
    }
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    service: Service,
    request: RequestBuilder,
) -> PipelineResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| PipelineError::unavailable(service, e.to_string()))?;
    let response = check_status(service, response)?;
    response
        .json::<T>()
        .await
        .map_err(|e| PipelineError::unavailable(service, format!("malformed response: {e}")))
}

/// Fetches the tracks behind `reference` from its service.
pub async fn fetch(
    http: &Client,
    config: &Config,
    reference: &PlaylistReference,
) -> PipelineResult<TrackList> {
    match reference.service() {
        Service::Yandex => yandex::fetch(http, config, reference).await,
        Service::Spotify => spotify::fetch(http, config, reference).await,
        Service::Vk => vk::fetch(http, config, reference).await,
    }
}
