//! VK audio.
//!
//! A VK reference is fetched in stages. A playlist is read through
//! `audio.get` with `execute.getPlaylist` as the secondary source. When the
//! playlist stage yields nothing, or the reference only names a person, the
//! owner's uploaded audio is read instead. Profile handles are resolved to a
//! numeric owner id first.

use std::time::Instant;

use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{
    get_json,
    paging::{Page, PageOutcome, collect_pages, collect_pages_with_fallback, remaining_budget},
};
use crate::{
    config::{Config, PagingConfig},
    error::{PipelineError, PipelineResult},
    reference::{VkTarget, vk_target},
    track::{Track, TrackList},
    types::{PlaylistReference, Service},
};

pub const VK_API_VERSION: &str = "5.131";

/// API error codes that mean the audio exists but is hidden from us.
const PRIVACY_CODES: [i64; 5] = [15, 18, 30, 201, 203];

#[derive(Debug, Deserialize)]
struct VkEnvelope<T> {
    response: Option<T>,
    #[serde(default)]
    error: Option<VkApiError>,
}

#[derive(Debug, Deserialize)]
struct VkApiError {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

#[derive(Debug, Deserialize)]
struct AudioItems {
    #[serde(default)]
    items: Vec<VkAudio>,
}

#[derive(Debug, Deserialize)]
struct PlaylistAudios {
    #[serde(default)]
    audios: Vec<VkAudio>,
}

#[derive(Debug, Deserialize)]
struct VkAudio {
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl VkAudio {
    fn into_track(self) -> Track {
        Track::new(self.artist.unwrap_or_default(), self.title.unwrap_or_default())
    }
}

impl<T> VkEnvelope<T> {
    fn into_result(self) -> PipelineResult<T> {
        if let Some(e) = self.error {
            let detail = format!("error {}: {}", e.error_code, e.error_msg);
            return Err(if PRIVACY_CODES.contains(&e.error_code) {
                PipelineError::restricted(Service::Vk, detail)
            } else {
                PipelineError::unavailable(Service::Vk, detail)
            });
        }
        self.response
            .ok_or_else(|| PipelineError::unavailable(Service::Vk, "empty response"))
    }
}

/// Everything a page task needs to call the API on its own.
#[derive(Debug, Clone)]
struct VkApi {
    http: Client,
    base: String,
    token: String,
}

impl VkApi {
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> PipelineResult<T> {
        let request = self
            .http
            .get(format!("{}/{method}", self.base))
            .query(params)
            .query(&[("access_token", self.token.as_str()), ("v", VK_API_VERSION)]);
        let envelope: VkEnvelope<T> = get_json(Service::Vk, request).await?;
        envelope.into_result()
    }
}

#[derive(Debug, Clone)]
struct PlaylistParams {
    owner_id: i64,
    playlist_id: i64,
    access_key: Option<String>,
}

async fn playlist_page(api: VkApi, playlist: PlaylistParams, page: Page) -> PageOutcome {
    let mut params = vec![
        ("owner_id", playlist.owner_id.to_string()),
        ("playlist_id", playlist.playlist_id.to_string()),
        ("count", page.size.to_string()),
        ("offset", page.offset.to_string()),
    ];
    if let Some(key) = playlist.access_key {
        params.push(("access_key", key));
    }
    let audios: AudioItems = api.call("audio.get", &params).await?;
    Ok(audios.items.into_iter().map(VkAudio::into_track).collect())
}

async fn execute_playlist_page(api: VkApi, playlist: PlaylistParams, page: Page) -> PageOutcome {
    let mut params = vec![
        ("owner_id", playlist.owner_id.to_string()),
        ("id", playlist.playlist_id.to_string()),
        ("audio_count", page.size.to_string()),
        ("audio_offset", page.offset.to_string()),
        ("need_playlist", "0".to_string()),
    ];
    if let Some(key) = playlist.access_key {
        params.push(("access_key", key));
    }
    let body: PlaylistAudios = api.call("execute.getPlaylist", &params).await?;
    Ok(body.audios.into_iter().map(VkAudio::into_track).collect())
}

async fn uploads_page(api: VkApi, owner_id: i64, page: Page) -> PageOutcome {
    let params = [
        ("owner_id", owner_id.to_string()),
        ("count", page.size.to_string()),
        ("offset", page.offset.to_string()),
    ];
    let audios: AudioItems = api.call("audio.get", &params).await?;
    Ok(audios.items.into_iter().map(VkAudio::into_track).collect())
}

/// Reads the numeric owner id out of a `resolveScreenName` answer.
/// Communities own audio under negative ids.
fn owner_from_resolution(value: &Value) -> Option<i64> {
    let id = value.get("object_id").and_then(Value::as_i64)?;
    match value.get("type").and_then(Value::as_str) {
        Some("group") | Some("page") | Some("event") => Some(-id),
        _ => Some(id),
    }
}

/// `id<digits>`, bare digits, or a screen name looked up through the API.
async fn resolve_owner(api: &VkApi, handle: &str) -> Option<i64> {
    if let Some(id) = handle.strip_prefix("id").and_then(|rest| rest.parse().ok()) {
        return Some(id);
    }
    if let Ok(id) = handle.parse() {
        return Some(id);
    }

    let params = [("screen_name", handle.to_string())];
    match api.call::<Value>("utils.resolveScreenName", &params).await {
        Ok(value) => owner_from_resolution(&value),
        Err(e) => {
            warn!(handle, error = %e, "vk.resolve.failed");
            None
        }
    }
}

async fn playlist_stage(
    api: &VkApi,
    cfg: &PagingConfig,
    playlist: PlaylistParams,
) -> PipelineResult<TrackList> {
    collect_pages_with_fallback(
        Service::Vk,
        cfg,
        |page| playlist_page(api.clone(), playlist.clone(), page),
        |page| execute_playlist_page(api.clone(), playlist.clone(), page),
    )
    .await
}

async fn uploads_stage(api: &VkApi, cfg: &PagingConfig, owner_id: i64) -> PipelineResult<TrackList> {
    collect_pages(Service::Vk, cfg, |page| {
        uploads_page(api.clone(), owner_id, page)
    })
    .await
}

// Running out of time is not an error; a failure seen before it still is.
fn out_of_time(playlist_error: Option<PipelineError>) -> PipelineResult<TrackList> {
    warn!("vk.budget.exhausted");
    match playlist_error {
        Some(e) => Err(e),
        None => Ok(TrackList::empty()),
    }
}

/// Fetches a VK reference. The budget of the first stage bounds the whole
/// fetch: owner resolution and the uploads stage only get what is left.
pub async fn fetch(
    http: &Client,
    config: &Config,
    reference: &PlaylistReference,
) -> PipelineResult<TrackList> {
    let target = vk_target(reference).ok_or(PipelineError::UnrecognizedReference)?;
    let api = VkApi {
        http: http.clone(),
        base: config.endpoints.vk_api.clone(),
        token: config.credentials.vk()?.to_string(),
    };
    info!(reference = %reference.canonical_id(), "vk.fetch");

    let started = Instant::now();
    let budget = match target {
        VkTarget::Playlist { .. } => config.vk_playlist.budget,
        _ => config.vk_uploads.budget,
    };

    let mut playlist_error = None;
    let owner_id = match target {
        VkTarget::Playlist {
            owner_id,
            playlist_id,
            access_key,
        } => {
            let playlist = PlaylistParams {
                owner_id,
                playlist_id,
                access_key,
            };
            match playlist_stage(&api, &config.vk_playlist, playlist).await {
                Ok(list) if !list.is_empty() => return Ok(list),
                Ok(_) => debug!(owner_id, playlist_id, "vk.playlist.empty"),
                Err(e) if e.allows_fallback() => {
                    warn!(owner_id, playlist_id, error = %e, "vk.playlist.fallback");
                    playlist_error = Some(e);
                }
                Err(e) => return Err(e),
            }
            Some(owner_id)
        }
        VkTarget::Audios { owner_id } => Some(owner_id),
        VkTarget::Profile { handle } => {
            let Some(remaining) = remaining_budget(budget, started) else {
                return out_of_time(None);
            };
            match timeout(remaining, resolve_owner(&api, &handle)).await {
                Ok(owner) => owner,
                Err(_) => return out_of_time(None),
            }
        }
    };

    let Some(owner_id) = owner_id else {
        return Err(PipelineError::restricted(
            Service::Vk,
            "profile could not be resolved",
        ));
    };

    let Some(remaining) = remaining_budget(budget, started) else {
        return out_of_time(playlist_error);
    };
    let uploads = PagingConfig {
        budget: remaining.min(config.vk_uploads.budget),
        ..config.vk_uploads.clone()
    };

    match uploads_stage(&api, &uploads, owner_id).await {
        Ok(list) if !list.is_empty() => Ok(list),
        Ok(list) if remaining_budget(budget, started).is_none() => {
            warn!(owner_id, "vk.budget.exhausted");
            Ok(list)
        }
        Ok(_) => Err(match playlist_error {
            Some(e) if e.is_privacy() => e,
            _ => PipelineError::restricted(Service::Vk, "no audio visible; check privacy settings"),
        }),
        Err(e) => Err(match playlist_error {
            Some(first) if first.is_privacy() && !e.is_privacy() => first,
            _ => e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privacy_error_codes_map_to_restricted() {
        let envelope: VkEnvelope<AudioItems> = serde_json::from_str(
            r#"{"error":{"error_code":201,"error_msg":"Access denied"}}"#,
        )
        .unwrap();
        assert!(envelope.into_result().unwrap_err().is_privacy());

        let envelope: VkEnvelope<AudioItems> =
            serde_json::from_str(r#"{"error":{"error_code":6,"error_msg":"Too many"}}"#).unwrap();
        assert!(!envelope.into_result().unwrap_err().is_privacy());
    }

    #[test]
    fn audio_items_become_tracks() {
        let envelope: VkEnvelope<AudioItems> = serde_json::from_str(
            r#"{"response":{"count":2,"items":[{"artist":"A","title":"X","id":1},{"title":"Y"}]}}"#,
        )
        .unwrap();
        let items = envelope.into_result().unwrap().items;
        let tracks: Vec<Track> = items.into_iter().map(VkAudio::into_track).collect();
        assert_eq!(tracks[0].artist(), "A");
        assert_eq!(tracks[1].artist(), "");
    }

    #[test]
    fn communities_resolve_to_negative_owner() {
        let group: Value = serde_json::from_str(r#"{"type":"group","object_id":42}"#).unwrap();
        let user: Value = serde_json::from_str(r#"{"type":"user","object_id":7}"#).unwrap();
        assert_eq!(owner_from_resolution(&group), Some(-42));
        assert_eq!(owner_from_resolution(&user), Some(7));
        assert_eq!(owner_from_resolution(&Value::Array(Vec::new())), None);
    }
}
