//! Turns whatever the user pasted into a [`PlaylistReference`].
//!
//! Accepted input is a bare link, an `<iframe src="...">` embed snippet, a
//! `spotify:` URI or a sentence with one of those in it. Patterns are tried in
//! a fixed order, most specific first; the catch-all VK profile pattern runs
//! last and refuses VK's own service pages.
//!
//! Parsing is pure. BOOM share links only reveal the VK playlist behind them
//! after an HTTP redirect, so [`parse`] hands those back as
//! [`Parsed::NeedsRedirect`] and the caller performs the hop.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{PipelineError, PipelineResult},
    types::{PlaylistReference, Service},
};

static IFRAME_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src\s*=\s*["']([^"']+)["']"#).expect("iframe regex is valid"));

static YANDEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"music\.yandex\.(?:ru|com|by|kz|uz)/(?:users/([^/]+)/playlists/(\d+)|iframe/#?playlist/([^/]+)/(\d+))",
    )
    .expect("yandex regex is valid")
});

static SPOTIFY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"open\.spotify\.com/(?:intl-[a-zA-Z]{2}(?:-[a-zA-Z]{2})?/)?(?:embed/)?(playlist|album|track)/([A-Za-z0-9]+)",
    )
    .expect("spotify regex is valid")
});

static SPOTIFY_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^spotify:(playlist|album|track):([A-Za-z0-9]+)$").expect("spotify uri regex is valid")
});

static VK_PLAYLIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"vk\.(?:com|ru)/music/(?:playlist|album)/(-?\d+)_(\d+)(?:_([0-9A-Za-z]+))?")
        .expect("vk playlist regex is valid")
});

static VK_AUDIO_PLAYLIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"audio_playlist(-?\d+)_(\d+)(?:(?:_|/|%2[Ff])([0-9A-Za-z]+))?")
        .expect("vk audio_playlist regex is valid")
});

static VK_AUDIOS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vk\.(?:com|ru)/audios(-?\d+)").expect("vk audios regex is valid"));

static BOOM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"share\.boom\.ru/playlist/(\d+)").expect("boom regex is valid"));

static VK_PROFILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"vk\.(?:com|ru)/([A-Za-z0-9._]+)$").expect("vk profile regex is valid")
});

static CANONICAL_YANDEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://music\.yandex\.ru/users/([^/]+)/playlists/(\d+)$")
        .expect("canonical yandex regex is valid")
});

static CANONICAL_SPOTIFY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://open\.spotify\.com/(playlist|album|track)/([A-Za-z0-9]+)$")
        .expect("canonical spotify regex is valid")
});

static CANONICAL_VK_AUDIOS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://vk\.com/audios(-?\d+)$").expect("canonical vk audios regex is valid")
});

static CANONICAL_VK_PROFILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://vk\.com/([a-z0-9._]+)$").expect("canonical vk profile regex is valid")
});

/// VK paths that are pages of the site itself, never somebody's profile.
pub const VK_RESERVED_PATHS: &[&str] = &[
    "feed", "im", "groups", "video", "settings", "music", "audios", "friends", "search", "login",
    "apps", "docs", "photos", "clips", "wall", "support", "about", "blog", "dev", "away", "share",
];

/// Where BOOM share links live. The pipeline may point this elsewhere.
pub const BOOM_SHARE_ORIGIN: &str = "https://share.boom.ru";

// Punctuation that sticks to a link pasted inside a sentence or quotes.
const LINK_TRIM: &[char] = &['.', ',', ';', ':', '!', '?', '"', '\'', '(', ')', '<', '>'];

const LINK_HINTS: &[&str] = &["yandex.", "spotify", "vk.com", "vk.ru", "boom.ru", "audio_playlist"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Ready(PlaylistReference),
    /// A share link whose target is only known after following this URL.
    NeedsRedirect(String),
}

/// Picks the link out of an embed snippet or a sentence.
fn extract_link(text: &str) -> &str {
    let text = text.trim();
    let text = if text.contains("<iframe") {
        IFRAME_SRC
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or(text)
    } else {
        text
    };

    let link = if text.contains(char::is_whitespace) {
        text.split_whitespace()
            .find(|token| LINK_HINTS.iter().any(|hint| token.contains(hint)))
            .unwrap_or(text)
    } else {
        text
    };
    link.trim_matches(LINK_TRIM)
}

/// The link without query string, fragment and trailing slashes.
fn strip_link(link: &str) -> &str {
    let end = link.find(['?', '#']).unwrap_or(link.len());
    link[..end].trim_end_matches('/')
}

fn vk_playlist(owner: &str, id: &str, key: Option<&str>) -> PlaylistReference {
    PlaylistReference::new(
        Service::Vk,
        format!("https://vk.com/music/playlist/{owner}_{id}"),
    )
    .with_access_key(key.map(str::to_string))
}

fn ready(service: Service, canonical_id: String) -> PipelineResult<Parsed> {
    Ok(Parsed::Ready(PlaylistReference::new(service, canonical_id)))
}

/// Recognizes a playlist reference without touching the network.
pub fn parse(text: &str) -> PipelineResult<Parsed> {
    let link = extract_link(text);
    let stripped = strip_link(link);

    // Old embed snippets keep the playlist after `#`.
    if let Some(c) = YANDEX
        .captures(stripped)
        .or_else(|| YANDEX.captures(link))
    {
        let (owner, kind) = match (c.get(1), c.get(2), c.get(3), c.get(4)) {
            (Some(o), Some(k), _, _) | (_, _, Some(o), Some(k)) => (o.as_str(), k.as_str()),
            _ => return Err(PipelineError::UnrecognizedReference),
        };
        return ready(
            Service::Yandex,
            format!("https://music.yandex.ru/users/{owner}/playlists/{kind}"),
        );
    }

    if let Some(c) = SPOTIFY
        .captures(stripped)
        .or_else(|| SPOTIFY_URI.captures(stripped))
    {
        return ready(
            Service::Spotify,
            format!("https://open.spotify.com/{}/{}", &c[1], &c[2]),
        );
    }

    if let Some(c) = VK_PLAYLIST.captures(stripped) {
        let key = c.get(3).map(|m| m.as_str());
        return Ok(Parsed::Ready(vk_playlist(&c[1], &c[2], key)));
    }

    // VK carries this one in the `z=` query parameter, so look before stripping.
    if let Some(c) = VK_AUDIO_PLAYLIST.captures(link) {
        let key = c.get(3).map(|m| m.as_str());
        return Ok(Parsed::Ready(vk_playlist(&c[1], &c[2], key)));
    }

    if let Some(c) = VK_AUDIOS.captures(stripped) {
        return ready(Service::Vk, format!("https://vk.com/audios{}", &c[1]));
    }

    if let Some(c) = BOOM.captures(stripped) {
        return Ok(Parsed::NeedsRedirect(format!(
            "{BOOM_SHARE_ORIGIN}/playlist/{}",
            &c[1]
        )));
    }

    if let Some(c) = VK_PROFILE.captures(stripped) {
        let handle = c[1].to_lowercase();
        if !VK_RESERVED_PATHS.contains(&handle.as_str()) {
            return ready(Service::Vk, format!("https://vk.com/{handle}"));
        }
    }

    Err(PipelineError::UnrecognizedReference)
}

/// Looks for a VK playlist behind a followed share link, first in the final
/// URL, then in the page body.
pub fn vk_playlist_behind_redirect(final_url: &str, body: &str) -> Option<PlaylistReference> {
    [final_url, body].into_iter().find_map(|haystack| {
        VK_PLAYLIST
            .captures(haystack)
            .or_else(|| VK_AUDIO_PLAYLIST.captures(haystack))
            .map(|c| {
                let key = c.get(3).map(|m| m.as_str());
                vk_playlist(&c[1], &c[2], key)
            })
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YandexTarget {
    pub owner: String,
    pub kind: String,
}

pub fn yandex_target(reference: &PlaylistReference) -> Option<YandexTarget> {
    if reference.service() != Service::Yandex {
        return None;
    }
    CANONICAL_YANDEX
        .captures(reference.canonical_id())
        .map(|c| YandexTarget {
            owner: c[1].to_string(),
            kind: c[2].to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotifyKind {
    Playlist,
    Album,
    Track,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyTarget {
    pub kind: SpotifyKind,
    pub id: String,
}

pub fn spotify_target(reference: &PlaylistReference) -> Option<SpotifyTarget> {
    if reference.service() != Service::Spotify {
        return None;
    }
    let c = CANONICAL_SPOTIFY.captures(reference.canonical_id())?;
    let kind = match &c[1] {
        "playlist" => SpotifyKind::Playlist,
        "album" => SpotifyKind::Album,
        _ => SpotifyKind::Track,
    };
    Some(SpotifyTarget {
        kind,
        id: c[2].to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VkTarget {
    Playlist {
        owner_id: i64,
        playlist_id: i64,
        access_key: Option<String>,
    },
    Audios {
        owner_id: i64,
    },
    Profile {
        handle: String,
    },
}

pub fn vk_target(reference: &PlaylistReference) -> Option<VkTarget> {
    if reference.service() != Service::Vk {
        return None;
    }
    let id = reference.canonical_id();

    if let Some(c) = VK_PLAYLIST.captures(id) {
        return Some(VkTarget::Playlist {
            owner_id: c[1].parse().ok()?,
            playlist_id: c[2].parse().ok()?,
            access_key: reference.access_key().map(str::to_string),
        });
    }
    if let Some(c) = CANONICAL_VK_AUDIOS.captures(id) {
        return Some(VkTarget::Audios {
            owner_id: c[1].parse().ok()?,
        });
    }
    CANONICAL_VK_PROFILE
        .captures(id)
        .map(|c| VkTarget::Profile {
            handle: c[1].to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_link_from_sentence() {
        assert_eq!(
            extract_link("look at this https://vk.com/audios123 please"),
            "https://vk.com/audios123"
        );
        assert_eq!(
            extract_link("here: https://vk.com/durov, thanks"),
            "https://vk.com/durov"
        );
        assert_eq!(extract_link("'spotify:album:x1'."), "spotify:album:x1");
    }

    #[test]
    fn strips_query_fragment_and_slashes() {
        assert_eq!(strip_link("https://vk.com/durov/?a=1#x"), "https://vk.com/durov");
        assert_eq!(strip_link("https://vk.com/durov//"), "https://vk.com/durov");
    }

    #[test]
    fn targets_round_trip_through_canonical_ids() {
        let Ok(Parsed::Ready(r)) = parse("https://vk.com/music/playlist/-2000_42_ab12") else {
            panic!("expected ready reference");
        };
        assert_eq!(
            vk_target(&r),
            Some(VkTarget::Playlist {
                owner_id: -2000,
                playlist_id: 42,
                access_key: Some("ab12".to_string()),
            })
        );
        assert_eq!(yandex_target(&r), None);
    }
}
