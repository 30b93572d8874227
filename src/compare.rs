use crate::{
    track::TrackList,
    types::{ComparisonResult, MatchedTrack},
};

/// Share of `list_size` covered by `matches`; an empty list gives 0.0.
pub fn ratio(matches: usize, list_size: usize) -> f64 {
    matches as f64 / list_size.max(1) as f64
}

/// Exact-key comparison of two deduplicated lists. Matches keep the order of
/// `a`.
pub fn compare(a: &TrackList, b: &TrackList) -> ComparisonResult {
    let b_keys = b.keys();

    let matches: Vec<MatchedTrack> = a
        .iter()
        .filter(|t| b_keys.contains(t.norm_key()))
        .map(|t| MatchedTrack {
            artist: t.artist().to_string(),
            title: t.title().to_string(),
        })
        .collect();

    let match_count = matches.len();
    ComparisonResult {
        list_a_size: a.len(),
        list_b_size: b.len(),
        matches,
        match_count,
        ratio_a_to_b: ratio(match_count, a.len()),
        ratio_b_to_a: ratio(match_count, b.len()),
    }
}
