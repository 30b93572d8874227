use std::collections::HashSet;

use serde::Serialize;

use crate::normalize::normalize_key;

/// One song as a fetcher saw it. `artist` and `title` are for display, the
/// key decides identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    artist: String,
    title: String,
    norm_key: String,
}

impl Track {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        let artist = artist.into().trim().to_string();
        let title = title.into().trim().to_string();
        let norm_key = normalize_key(&artist, &title);
        Self {
            artist,
            title,
            norm_key,
        }
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn norm_key(&self) -> &str {
        &self.norm_key
    }
}

/// Which raw entries are worth keeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Network listings: both artist and title must be present.
    ArtistAndTitle,
    /// Uploaded files: a line without a separator has no artist.
    TitleOnly,
}

impl Validation {
    fn accepts(self, track: &Track) -> bool {
        match self {
            Validation::ArtistAndTitle => !track.artist.is_empty() && !track.title.is_empty(),
            Validation::TitleOnly => !track.title.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Added,
    Duplicate,
    Rejected,
}

/// Ordered tracks, unique by key, first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrackList {
    tracks: Vec<Track>,
}

impl TrackList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Collects `(artist, title)` pairs with network-grade validation.
    pub fn from_pairs<I, A, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, T)>,
        A: Into<String>,
        T: Into<String>,
    {
        let mut builder = TrackListBuilder::new(Validation::ArtistAndTitle);
        for (artist, title) in pairs {
            builder.push(Track::new(artist, title));
        }
        builder.finish()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    pub fn as_slice(&self) -> &[Track] {
        &self.tracks
    }

    pub fn keys(&self) -> HashSet<&str> {
        self.tracks.iter().map(Track::norm_key).collect()
    }
}

impl<'a> IntoIterator for &'a TrackList {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

/// Accumulates tracks page by page, dropping invalid and already seen ones.
#[derive(Debug)]
pub struct TrackListBuilder {
    validation: Validation,
    seen: HashSet<String>,
    tracks: Vec<Track>,
}

impl TrackListBuilder {
    pub fn new(validation: Validation) -> Self {
        Self {
            validation,
            seen: HashSet::new(),
            tracks: Vec::new(),
        }
    }

    pub fn push(&mut self, track: Track) -> Admission {
        if !self.validation.accepts(&track) {
            return Admission::Rejected;
        }
        if !self.seen.insert(track.norm_key.clone()) {
            return Admission::Duplicate;
        }
        self.tracks.push(track);
        Admission::Added
    }

    /// Pushes a whole page and reports how many tracks were new.
    pub fn extend<I: IntoIterator<Item = Track>>(&mut self, tracks: I) -> usize {
        tracks
            .into_iter()
            .map(|t| self.push(t))
            .filter(|a| *a == Admission::Added)
            .count()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn finish(self) -> TrackList {
        TrackList {
            tracks: self.tracks,
        }
    }
}
