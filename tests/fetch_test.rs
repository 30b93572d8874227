use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use plmatch::{
    config::{Config, Endpoints, PagingConfig},
    error::PipelineError,
    pipeline::Pipeline,
    track::TrackList,
    types::PlaylistReference,
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, time::sleep};

type Params = HashMap<String, String>;

/// Every request the stand-in service received, in arrival order.
#[derive(Clone, Default)]
struct Calls(Arc<Mutex<Vec<(String, Params)>>>);

impl Calls {
    fn record(&self, name: &str, params: &Params) {
        self.0.lock().unwrap().push((name.to_string(), params.clone()));
    }

    fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|(n, _)| n == name).count()
    }

    fn values(&self, name: &str, key: &str) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .filter_map(|(_, p)| p.get(key).cloned())
            .collect()
    }

    fn total(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base: &str) -> Config {
    let mut config = Config::default();
    config.endpoints = Endpoints {
        yandex_web: base.to_string(),
        yandex_api: base.to_string(),
        vk_api: format!("{base}/method"),
        spotify_api: format!("{base}/v1"),
        spotify_token: format!("{base}/api/token"),
        boom_share: base.to_string(),
    };
    config.credentials.vk_access_token = Some("vk-token".to_string());
    config.credentials.spotify_client_id = Some("id".to_string());
    config.credentials.spotify_client_secret = Some("secret".to_string());
    config
}

async fn reference(pipeline: &Pipeline, link: &str) -> PlaylistReference {
    pipeline.canonicalize(link).await.unwrap()
}

fn titles(list: &TrackList) -> Vec<&str> {
    list.iter().map(|t| t.title()).collect()
}

/// VK stand-in: every `/method/<name>` call is recorded and answered by `answer`.
fn vk_stub<F>(calls: Calls, answer: F) -> Router
where
    F: Fn(&str, &Params) -> Value + Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/method/{method}",
        get(
            move |Path(method): Path<String>, Query(params): Query<Params>| {
                calls.record(&method, &params);
                let body = answer(&method, &params);
                async move { Json(body) }
            },
        ),
    )
}

fn vk_items(prefix: &str, n: usize) -> Value {
    let items: Vec<Value> = (0..n)
        .map(|i| json!({"artist": format!("{prefix} artist {i}"), "title": format!("{prefix} {i}")}))
        .collect();
    json!({"response": {"count": n, "items": items}})
}

fn vk_error(code: i64) -> Value {
    json!({"error": {"error_code": code, "error_msg": "Access denied"}})
}

#[tokio::test]
async fn test_vk_empty_playlist_falls_back_to_uploads() {
    let calls = Calls::default();
    let base = serve(vk_stub(calls.clone(), |method, params| match method {
        "audio.get" if params.contains_key("playlist_id") => vk_items("pl", 0),
        "audio.get" => vk_items("upload", 2),
        "execute.getPlaylist" => json!({"response": {"audios": []}}),
        _ => vk_error(100),
    }))
    .await;

    let pipeline = Pipeline::new(config(&base)).unwrap();
    let playlist = reference(&pipeline, "https://vk.com/music/playlist/5_7").await;
    let list = pipeline.fetch(&playlist).await.unwrap();

    assert_eq!(titles(&list), vec!["upload 0", "upload 1"]);
    assert!(calls.count("execute.getPlaylist") >= 1);
    assert!(calls.values("audio.get", "owner_id").iter().all(|o| o == "5"));
    assert_eq!(calls.values("audio.get", "access_token")[0], "vk-token");
}

#[tokio::test]
async fn test_vk_access_key_is_sent_with_playlist_calls() {
    let calls = Calls::default();
    let base = serve(vk_stub(calls.clone(), |_, _| vk_items("pl", 1))).await;

    let pipeline = Pipeline::new(config(&base)).unwrap();
    let playlist = reference(&pipeline, "https://vk.com/music/playlist/-3_9_s3cr3t").await;
    let list = pipeline.fetch(&playlist).await.unwrap();

    assert_eq!(list.len(), 1);
    assert!(calls.values("audio.get", "access_key").iter().all(|k| k == "s3cr3t"));
    assert_eq!(calls.values("audio.get", "playlist_id")[0], "9");
}

#[tokio::test]
async fn test_vk_without_token_fails_before_any_request() {
    let calls = Calls::default();
    let base = serve(vk_stub(calls.clone(), |_, _| vk_items("x", 1))).await;

    let mut config = config(&base);
    config.credentials.vk_access_token = None;
    let pipeline = Pipeline::new(config).unwrap();

    for link in ["https://vk.com/music/playlist/5_7", "https://vk.com/audios5", "https://vk.com/durov"] {
        let target = reference(&pipeline, link).await;
        let err = pipeline.fetch(&target).await.unwrap_err();
        assert!(matches!(err, PipelineError::CredentialsMissing(_)), "{link}: {err:?}");
    }
    assert_eq!(calls.total(), 0);
}

#[tokio::test]
async fn test_vk_owner_resolution_order() {
    let calls = Calls::default();
    let base = serve(vk_stub(calls.clone(), |method, params| match method {
        "utils.resolveScreenName" => json!({"response": {"type": "group", "object_id": 77}}),
        "audio.get" => {
            let owner = params.get("owner_id").cloned().unwrap_or_default();
            vk_items(&owner, 1)
        }
        _ => vk_error(100),
    }))
    .await;
    let pipeline = Pipeline::new(config(&base)).unwrap();

    let list = pipeline.fetch(&reference(&pipeline, "https://vk.com/id42").await).await.unwrap();
    assert_eq!(titles(&list), vec!["42 0"]);

    let list = pipeline.fetch(&reference(&pipeline, "https://vk.com/12345").await).await.unwrap();
    assert_eq!(titles(&list), vec!["12345 0"]);
    assert_eq!(calls.count("utils.resolveScreenName"), 0);

    let list = pipeline
        .fetch(&reference(&pipeline, "https://vk.com/some.band").await)
        .await
        .unwrap();
    assert_eq!(titles(&list), vec!["-77 0"]);
    assert_eq!(calls.values("utils.resolveScreenName", "screen_name"), vec!["some.band"]);
}

#[tokio::test]
async fn test_vk_failed_lookup_ends_the_fetch() {
    let calls = Calls::default();
    let base = serve(vk_stub(calls.clone(), |method, _| match method {
        "utils.resolveScreenName" => json!({"response": []}),
        _ => vk_items("never", 1),
    }))
    .await;
    let pipeline = Pipeline::new(config(&base)).unwrap();

    let err = pipeline
        .fetch(&reference(&pipeline, "https://vk.com/nobody_here").await)
        .await
        .unwrap_err();

    assert!(err.is_privacy(), "{err:?}");
    assert_eq!(calls.count("utils.resolveScreenName"), 1);
    assert_eq!(calls.count("audio.get"), 0);
}

#[tokio::test]
async fn test_vk_privacy_codes_reach_the_caller() {
    let base = serve(vk_stub(Calls::default(), |method, _| match method {
        "execute.getPlaylist" => vk_error(15),
        _ => vk_error(201),
    }))
    .await;
    let pipeline = Pipeline::new(config(&base)).unwrap();

    for link in ["https://vk.com/music/playlist/5_7", "https://vk.com/audios-5"] {
        let err = pipeline.fetch(&reference(&pipeline, link).await).await.unwrap_err();
        assert!(err.is_privacy(), "{link}: {err:?}");
    }
}

#[tokio::test]
async fn test_vk_budget_bounds_the_whole_fetch() {
    let slow = Router::new().route(
        "/method/{method}",
        get(|| async {
            sleep(Duration::from_secs(30)).await;
            Json(vk_items("late", 1))
        }),
    );
    let base = serve(slow).await;

    let mut config = config(&base);
    config.vk_playlist = PagingConfig::new(100, 4, 50, 1);
    config.vk_uploads = PagingConfig::new(200, 4, 25, 1);
    let pipeline = Pipeline::new(config).unwrap();

    for link in ["https://vk.com/music/playlist/5_7", "https://vk.com/slow.name"] {
        let target = reference(&pipeline, link).await;
        let started = Instant::now();
        let list = pipeline.fetch(&target).await.unwrap();

        assert!(list.is_empty(), "{link}");
        assert!(started.elapsed() < Duration::from_millis(1800), "{link}: {:?}", started.elapsed());
    }
}

fn yandex_tracks(n: usize) -> Value {
    let tracks: Vec<Value> = (0..n)
        .map(|i| json!({"track": {"title": format!("Song {i}"), "artists": [{"name": "Band"}]}}))
        .collect();
    Value::Array(tracks)
}

#[tokio::test]
async fn test_yandex_empty_handler_falls_back_to_api() {
    let calls = Calls::default();
    let handler_calls = calls.clone();
    let api_calls = calls.clone();
    let router = Router::new()
        .route(
            "/handlers/playlist.jsx",
            get(move |Query(params): Query<Params>| {
                handler_calls.record("handler", &params);
                async { Json(json!({"playlist": {"tracks": []}})) }
            }),
        )
        .route(
            "/users/{owner}/playlists/{kind}",
            get(
                move |Path((owner, kind)): Path<(String, String)>, Query(params): Query<Params>| {
                    api_calls.record(&format!("api {owner}/{kind}"), &params);
                    let page = params.get("page").cloned().unwrap_or_default();
                    let tracks = if page == "0" { yandex_tracks(3) } else { yandex_tracks(0) };
                    async move { Json(json!({"result": {"tracks": tracks}})) }
                },
            ),
        );
    let base = serve(router).await;

    let mut config = config(&base);
    config.yandex = PagingConfig::new(200, 1, 30, 60);
    let pipeline = Pipeline::new(config).unwrap();

    let playlist = reference(&pipeline, "https://music.yandex.ru/users/alice/playlists/3").await;
    let list = pipeline.fetch(&playlist).await.unwrap();

    assert_eq!(titles(&list), vec!["Song 0", "Song 1", "Song 2"]);
    assert_eq!(calls.count("handler"), 1);
    assert_eq!(calls.values("handler", "owner"), vec!["alice"]);
    assert_eq!(calls.count("api alice/3"), 1);
}

fn spotify_items(range: std::ops::Range<usize>) -> Vec<Value> {
    range
        .map(|i| json!({"track": {"name": format!("Track {i}"), "artists": [{"name": "Artist"}]}}))
        .collect()
}

/// Spotify stand-in. `tracks` answers the playlist tracks endpoint; the token
/// endpoint and the playlist object are fixed.
fn spotify_stub<F>(calls: Calls, tracks: F) -> Router
where
    F: Fn(&Params) -> Response + Clone + Send + Sync + 'static,
{
    let token_calls = calls.clone();
    let object_calls = calls.clone();
    Router::new()
        .route(
            "/api/token",
            post(move || {
                token_calls.record("token", &Params::new());
                async {
                    Json(json!({"access_token": "tok", "token_type": "Bearer", "expires_in": 3600}))
                }
            }),
        )
        .route(
            "/v1/playlists/{id}/tracks",
            get(move |Query(params): Query<Params>| {
                calls.record("tracks", &params);
                let response = tracks(&params);
                async move { response }
            }),
        )
        .route(
            "/v1/playlists/{id}",
            get(move |Path(id): Path<String>| {
                object_calls.record(&format!("object {id}"), &Params::new());
                async {
                    Json(json!({"name": "Mix", "tracks": {"items": spotify_items(0..2), "next": null}}))
                }
            }),
        )
}

fn offset_page(params: &Params, total: usize) -> Response {
    let offset: usize = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(100);
    let end = (offset + limit).min(total);
    let items = spotify_items(offset.min(end)..end);
    Json(json!({"items": items, "total": total})).into_response()
}

#[tokio::test]
async fn test_spotify_playlist_is_paged_by_offset() {
    let calls = Calls::default();
    let base = serve(spotify_stub(calls.clone(), |params| offset_page(params, 5))).await;

    let mut config = config(&base);
    config.spotify = PagingConfig::new(2, 4, 100, 60);
    let pipeline = Pipeline::new(config).unwrap();

    let playlist = reference(&pipeline, "https://open.spotify.com/playlist/abc123").await;
    let list = pipeline.fetch(&playlist).await.unwrap();

    assert_eq!(
        titles(&list),
        vec!["Track 0", "Track 1", "Track 2", "Track 3", "Track 4"]
    );
    assert_eq!(calls.count("token"), 1);
    let offsets = calls.values("tracks", "offset");
    for offset in ["0", "2", "4"] {
        assert!(offsets.iter().any(|o| o == offset), "{offsets:?}");
    }
    assert!(calls.values("tracks", "limit").iter().all(|l| l == "2"));
}

#[tokio::test]
async fn test_spotify_waits_out_one_rate_limit() {
    let calls = Calls::default();
    let counter = calls.clone();
    let base = serve(spotify_stub(calls.clone(), move |params| {
        if counter.count("tracks") == 1 {
            return (StatusCode::TOO_MANY_REQUESTS, [(RETRY_AFTER, "1")]).into_response();
        }
        offset_page(params, 3)
    }))
    .await;

    let mut config = config(&base);
    config.spotify = PagingConfig::new(100, 1, 100, 60);
    let pipeline = Pipeline::new(config).unwrap();

    let started = Instant::now();
    let playlist = reference(&pipeline, "https://open.spotify.com/playlist/abc123").await;
    let list = pipeline.fetch(&playlist).await.unwrap();

    assert_eq!(list.len(), 3);
    assert_eq!(calls.count("tracks"), 2);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_spotify_rate_limit_longer_than_budget_is_not_waited() {
    let calls = Calls::default();
    let base = serve(spotify_stub(calls.clone(), |_| {
        (StatusCode::TOO_MANY_REQUESTS, [(RETRY_AFTER, "120")]).into_response()
    }))
    .await;

    let mut config = config(&base);
    config.spotify = PagingConfig::new(100, 1, 100, 5);
    let pipeline = Pipeline::new(config).unwrap();

    let started = Instant::now();
    let playlist = reference(&pipeline, "https://open.spotify.com/playlist/abc123").await;
    let list = pipeline.fetch(&playlist).await.unwrap();

    assert_eq!(titles(&list), vec!["Track 0", "Track 1"]);
    assert_eq!(calls.count("tracks"), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_spotify_falls_back_to_playlist_object() {
    let calls = Calls::default();
    let base = serve(spotify_stub(calls.clone(), |_| {
        StatusCode::NOT_FOUND.into_response()
    }))
    .await;
    let pipeline = Pipeline::new(config(&base)).unwrap();

    let playlist = reference(&pipeline, "https://open.spotify.com/playlist/abc123").await;
    let list = pipeline.fetch(&playlist).await.unwrap();

    assert_eq!(titles(&list), vec!["Track 0", "Track 1"]);
    assert_eq!(calls.count("object abc123"), 1);
}

#[tokio::test]
async fn test_boom_share_link_resolves_to_vk_playlist() {
    let router = Router::new().route(
        "/playlist/{n}",
        get(|Path(n): Path<String>| async move {
            format!(r#"<html><a href="https://vk.com/music/playlist/-1_{n}_abc">open</a></html>"#)
        }),
    );
    let base = serve(router).await;
    let pipeline = Pipeline::new(config(&base)).unwrap();

    let resolved = pipeline
        .canonicalize("listen: https://share.boom.ru/playlist/42")
        .await
        .unwrap();

    assert_eq!(resolved.canonical_id(), "https://vk.com/music/playlist/-1_42");
    assert_eq!(resolved.access_key(), Some("abc"));
}

#[tokio::test]
async fn test_share_link_failures_are_link_resolution_errors() {
    let router = Router::new()
        .route(
            "/playlist/1",
            get(|| async { "<html>nothing to see</html>" }),
        )
        .route(
            "/playlist/2",
            get(|| async {
                sleep(Duration::from_secs(10)).await;
                "<html>https://vk.com/music/playlist/1_2</html>"
            }),
        );
    let base = serve(router).await;

    let mut slow_config = config(&base);
    slow_config.link_timeout = Duration::from_millis(300);
    let pipeline = Pipeline::new(slow_config).unwrap();

    let err = pipeline.canonicalize("https://share.boom.ru/playlist/1").await.unwrap_err();
    assert!(matches!(err, PipelineError::LinkResolutionFailed(_)), "{err:?}");

    let started = Instant::now();
    let err = pipeline.canonicalize("https://share.boom.ru/playlist/2").await.unwrap_err();
    assert!(matches!(err, PipelineError::LinkResolutionFailed(_)), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(3));

    let unreachable = Pipeline::new(config("http://127.0.0.1:1")).unwrap();
    let err = unreachable
        .canonicalize("https://share.boom.ru/playlist/3")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::LinkResolutionFailed(_)), "{err:?}");
}
