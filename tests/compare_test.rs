use plmatch::compare::{compare, ratio};
use plmatch::track::TrackList;

fn list(pairs: &[(&str, &str)]) -> TrackList {
    TrackList::from_pairs(pairs.iter().copied())
}

#[test]
fn test_live_version_matches_studio_version() {
    let a = list(&[("Artist X", "Song One"), ("Artist Y", "Song Two")]);
    let b = list(&[("artist x", "song one (live)")]);

    let result = compare(&a, &b);
    assert_eq!(result.match_count, 1);
    assert_eq!(result.ratio_a_to_b, 0.5);
    assert_eq!(result.ratio_b_to_a, 1.0);
    assert_eq!(result.matches[0].artist, "Artist X");
    assert_eq!(result.matches[0].title, "Song One");
}

#[test]
fn test_match_count_is_symmetric_ratios_are_not() {
    let a = list(&[("A", "1"), ("B", "2"), ("C", "3"), ("D", "4")]);
    let b = list(&[("B", "2"), ("D", "4")]);

    let ab = compare(&a, &b);
    let ba = compare(&b, &a);
    assert_eq!(ab.match_count, ba.match_count);
    assert_eq!(ab.ratio_a_to_b, 0.5);
    assert_eq!(ab.ratio_b_to_a, 1.0);
    assert_ne!(ab.ratio_a_to_b, ab.ratio_b_to_a);
}

#[test]
fn test_matches_keep_order_of_first_list() {
    let a = list(&[("C", "3"), ("A", "1"), ("B", "2")]);
    let b = list(&[("A", "1"), ("B", "2"), ("C", "3")]);

    let titles: Vec<_> = compare(&a, &b)
        .matches
        .into_iter()
        .map(|m| m.title)
        .collect();
    assert_eq!(titles, vec!["3", "1", "2"]);
}

#[test]
fn test_empty_list_gives_zero_ratio() {
    let a = list(&[("A", "1")]);
    let empty = TrackList::empty();

    let result = compare(&a, &empty);
    assert_eq!(result.match_count, 0);
    assert_eq!(result.ratio_a_to_b, 0.0);
    assert_eq!(result.ratio_b_to_a, 0.0);

    let both_empty = compare(&empty, &empty);
    assert_eq!(both_empty.list_a_size, 0);
    assert_eq!(both_empty.ratio_a_to_b, 0.0);
    assert_eq!(ratio(0, 0), 0.0);
}

#[test]
fn test_result_serializes_to_json() {
    let result = compare(&list(&[("A", "1")]), &list(&[("A", "1")]));
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["match_count"], 1);
    assert_eq!(json["ratio_a_to_b"], 1.0);
    assert_eq!(json["matches"][0]["artist"], "A");
}
