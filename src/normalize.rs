//! Matching keys for tracks.
//!
//! Two listings of the same song coming from different services rarely agree on
//! case, punctuation, the order of credited artists or remix annotations. The
//! key built here erases exactly those differences and nothing else: a
//! transliterated name or a missing featured artist still yields a different
//! key.

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator between the artist part and the title part of a key.
pub const KEY_SEPARATOR: &str = "||";

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\(\[\{].*?[\)\]\}]").expect("bracket regex is valid"));

static FEATURING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:featuring|feat|ft)\b\.?").expect("featuring regex is valid")
});

static ARTIST_SEPARATORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[,&/]|\s+and\s+|\b(?:featuring|feat|ft)\b\.?")
        .expect("artist separator regex is valid")
});

// Latin and Cyrillic letters plus digits survive, everything else goes.
// Runs on lowercased text only.
static NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\p{Cyrillic}]+").expect("alnum regex is valid"));

fn alnum_only(s: &str) -> String {
    NON_ALNUM.replace_all(s, "").into_owned()
}

/// Sorted, cleaned artist tokens of a (possibly multi-artist) credit.
pub fn artist_tokens(artist: &str) -> Vec<String> {
    let lowered = artist.to_lowercase();
    let mut tokens: Vec<String> = ARTIST_SEPARATORS
        .split(&lowered)
        .map(alnum_only)
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort();
    tokens
}

/// Title with annotations in brackets and featuring markers removed.
pub fn clean_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let without_groups = BRACKETED.replace_all(&lowered, "");
    let without_feat = FEATURING.replace_all(&without_groups, "");
    alnum_only(&without_feat)
}

/// Builds the matching key of a track. Never fails; empty input gives `"||"`.
pub fn normalize_key(artist: &str, title: &str) -> String {
    let mut key = artist_tokens(artist).join("|");
    key.push_str(KEY_SEPARATOR);
    key.push_str(&clean_title(title));
    key
}
