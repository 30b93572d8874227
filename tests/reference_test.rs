use plmatch::error::PipelineError;
use plmatch::reference::{Parsed, parse, vk_playlist_behind_redirect};
use plmatch::types::{PlaylistReference, Service};

fn canonical(text: &str) -> (Service, String) {
    match parse(text) {
        Ok(Parsed::Ready(reference)) => {
            (reference.service(), reference.canonical_id().to_string())
        }
        other => panic!("{text:?} did not canonicalize: {other:?}"),
    }
}

fn assert_same(forms: &[&str], service: Service, expected: &str) {
    for form in forms {
        assert_eq!(
            canonical(form),
            (service, expected.to_string()),
            "form {form:?}"
        );
    }
}

#[test]
fn test_yandex_forms_share_one_id() {
    assert_same(
        &[
            "https://music.yandex.ru/users/music-blog/playlists/2372",
            "https://music.yandex.com/users/music-blog/playlists/2372/?utm_source=share",
            "music.yandex.kz/users/music-blog/playlists/2372",
            r#"<iframe frameborder="0" src="https://music.yandex.ru/iframe/#playlist/music-blog/2372/show/cover/description/" width="100%"></iframe>"#,
            "https://music.yandex.ru/iframe/playlist/music-blog/2372",
        ],
        Service::Yandex,
        "https://music.yandex.ru/users/music-blog/playlists/2372",
    );
}

#[test]
fn test_spotify_forms_share_one_id() {
    assert_same(
        &[
            "https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M",
            "https://open.spotify.com/intl-de/playlist/37i9dQZF1DXcBWIGoYBM5M?si=f00",
            "https://open.spotify.com/embed/playlist/37i9dQZF1DXcBWIGoYBM5M",
            "spotify:playlist:37i9dQZF1DXcBWIGoYBM5M",
            "listen to this: https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M ok?",
        ],
        Service::Spotify,
        "https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M",
    );
    assert_eq!(
        canonical("https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy").1,
        "https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy"
    );
}

#[test]
fn test_vk_playlist_forms_share_one_id() {
    assert_same(
        &[
            "https://vk.com/music/playlist/-147845620_2949_9a8f0f04a1",
            "https://m.vk.com/music/album/-147845620_2949_9a8f0f04a1",
            "https://vk.ru/music/playlist/-147845620_2949_9a8f0f04a1/",
            "https://vk.com/audios-147845620?section=playlists&z=audio_playlist-147845620_2949%2F9a8f0f04a1",
            "https://vk.com/feed?z=audio_playlist-147845620_2949_9a8f0f04a1",
        ],
        Service::Vk,
        "https://vk.com/music/playlist/-147845620_2949",
    );
    assert_eq!(
        canonical("https://vk.com/music/playlist/123_45").1,
        "https://vk.com/music/playlist/123_45"
    );
}

#[test]
fn test_vk_uploads_and_profiles() {
    assert_eq!(
        canonical("https://vk.com/audios123456?section=all"),
        (Service::Vk, "https://vk.com/audios123456".to_string())
    );
    assert_eq!(
        canonical("https://vk.com/Durov/"),
        (Service::Vk, "https://vk.com/durov".to_string())
    );
    assert_eq!(canonical("vk.com/id1").1, "https://vk.com/id1");
}

#[test]
fn test_vk_service_pages_are_not_profiles() {
    for path in ["feed", "music", "im", "groups", "settings"] {
        let text = format!("https://vk.com/{path}");
        assert!(
            matches!(parse(&text), Err(PipelineError::UnrecognizedReference)),
            "{text} should be refused"
        );
    }
}

#[test]
fn test_boom_links_need_a_redirect() {
    assert_eq!(
        parse("https://share.boom.ru/playlist/5521/?share_auth=abc").unwrap(),
        Parsed::NeedsRedirect("https://share.boom.ru/playlist/5521".to_string())
    );
}

#[test]
fn test_unrecognized_input() {
    for text in [
        "",
        "hello there",
        "https://example.com/playlist/1",
        "https://music.yandex.ru/album/123",
    ] {
        assert!(
            matches!(parse(text), Err(PipelineError::UnrecognizedReference)),
            "{text:?} should be unrecognized"
        );
    }
}

#[test]
fn test_playlist_found_behind_share_redirect() {
    let from_url = vk_playlist_behind_redirect("https://vk.com/music/playlist/7_8_k3y", "");
    let from_url = from_url.unwrap();
    assert_eq!(from_url.canonical_id(), "https://vk.com/music/playlist/7_8");
    assert_eq!(from_url.access_key(), Some("k3y"));

    let body = r#"<a href="/audios7?z=audio_playlist7_8/k3y">open</a>"#;
    let from_body = vk_playlist_behind_redirect("https://share.boom.ru/playlist/1", body);
    assert_eq!(
        from_body.map(|r| r.canonical_id().to_string()),
        Some("https://vk.com/music/playlist/7_8".to_string())
    );

    assert!(vk_playlist_behind_redirect("https://boom.ru/", "<html></html>").is_none());
}

fn reference(text: &str) -> PlaylistReference {
    match parse(text) {
        Ok(Parsed::Ready(reference)) => reference,
        other => panic!("{text:?} did not canonicalize: {other:?}"),
    }
}

#[test]
fn test_vk_access_key_does_not_change_identity() {
    let keyed = reference("https://vk.com/music/playlist/-1_2_abc");
    let bare = reference("https://vk.com/music/playlist/-1_2");
    let in_query = reference("https://vk.com/audios-1?z=audio_playlist-1_2%2Fabc");

    assert_eq!(keyed, bare);
    assert_eq!(keyed, in_query);
    assert_eq!(keyed.canonical_id(), bare.canonical_id());
    assert_eq!(keyed.access_key(), Some("abc"));
    assert_eq!(in_query.access_key(), Some("abc"));
    assert_eq!(bare.access_key(), None);

    let json = serde_json::to_value(&keyed).unwrap();
    assert!(json.get("access_key").is_none());
}

#[test]
fn test_punctuation_around_pasted_links_is_ignored() {
    assert_eq!(
        canonical("see https://vk.com/durov."),
        (Service::Vk, "https://vk.com/durov".to_string())
    );
    assert_eq!(
        canonical(r#"my list: "https://open.spotify.com/playlist/abc123", enjoy!"#).1,
        "https://open.spotify.com/playlist/abc123"
    );
    assert_eq!(
        canonical("(https://music.yandex.ru/users/me/playlists/7)").1,
        "https://music.yandex.ru/users/me/playlists/7"
    );
    assert_eq!(
        canonical("<https://vk.com/audios42>;").1,
        "https://vk.com/audios42"
    );
}
