//! Track lists uploaded as plain text exports, one track per line.
//!
//! A line reads `Artist - Title`, optionally behind a `12.` or `12)` position.
//! Lines without the separator keep the whole text as the title.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::track::{Track, TrackList, TrackListBuilder, Validation};

pub const FIELD_SEPARATOR: &str = " - ";

static LEADING_POSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s*").expect("position regex is valid"));

/// Splits one line into `(artist, title)`. Blank lines give `None`.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let line = LEADING_POSITION.replace(line, "");
    let (artist, title) = line
        .split_once(FIELD_SEPARATOR)
        .unwrap_or(("", line.as_ref()));
    Some((artist.trim().to_string(), title.trim().to_string()))
}

/// Builds a track list from raw upload bytes.
///
/// Invalid UTF-8 is replaced rather than rejected and a leading byte order
/// mark is dropped. Tracks with an empty title are skipped, duplicates keep
/// their first position.
pub fn import(bytes: &[u8]) -> TrackList {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut builder = TrackListBuilder::new(Validation::TitleOnly);
    for (artist, title) in text.lines().filter_map(parse_line) {
        builder.push(Track::new(artist, title));
    }
    builder.finish()
}
