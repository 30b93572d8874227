use std::path::Path;

use crate::{
    track::TrackList,
    types::{ComparisonResult, SummaryTableRow, TrackTableRow},
};

/// `1 track`, `2 tracks`, `0 tracks`.
pub fn tracks_label(count: usize) -> String {
    match count {
        1 => "1 track".to_string(),
        n => format!("{n} tracks"),
    }
}

/// A ratio as a percentage with one decimal, e.g. `0.5` becomes `50.0%`.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Whether a command-line argument names a file to import rather than a
/// link to canonicalize.
pub fn is_upload_path(arg: &str) -> bool {
    let path = Path::new(arg);
    !arg.contains("://") && path.is_file()
}

pub fn track_rows(list: &TrackList) -> Vec<TrackTableRow> {
    list.iter()
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            position: i + 1,
            artist: t.artist().to_string(),
            title: t.title().to_string(),
        })
        .collect()
}

pub fn match_rows(result: &ComparisonResult) -> Vec<TrackTableRow> {
    result
        .matches
        .iter()
        .enumerate()
        .map(|(i, m)| TrackTableRow {
            position: i + 1,
            artist: m.artist.clone(),
            title: m.title.clone(),
        })
        .collect()
}

pub fn summary_rows(result: &ComparisonResult) -> Vec<SummaryTableRow> {
    vec![
        SummaryTableRow {
            playlist: "A".to_string(),
            tracks: result.list_a_size,
            shared: result.match_count,
            similarity: format_percent(result.ratio_a_to_b),
        },
        SummaryTableRow {
            playlist: "B".to_string(),
            tracks: result.list_b_size,
            shared: result.match_count,
            similarity: format_percent(result.ratio_b_to_a),
        },
    ]
}
