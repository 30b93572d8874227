use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Yandex,
    Spotify,
    Vk,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Yandex => "Yandex Music",
            Service::Spotify => "Spotify",
            Service::Vk => "VK",
        };
        f.write_str(name)
    }
}

/// A playlist as one service knows it, reduced to a single fixed string.
///
/// Only the canonicalizer builds these, so two values compare equal exactly
/// when they point at the same playlist. A VK access key travels alongside
/// the identifier: it grants access but does not change which playlist is
/// meant, so it takes no part in equality.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistReference {
    service: Service,
    canonical_id: String,
    #[serde(skip)]
    access_key: Option<String>,
}

impl PlaylistReference {
    pub(crate) fn new(service: Service, canonical_id: String) -> Self {
        Self {
            service,
            canonical_id,
            access_key: None,
        }
    }

    pub(crate) fn with_access_key(mut self, access_key: Option<String>) -> Self {
        self.access_key = access_key;
        self
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn canonical_id(&self) -> &str {
        &self.canonical_id
    }

    pub fn access_key(&self) -> Option<&str> {
        self.access_key.as_deref()
    }
}

impl PartialEq for PlaylistReference {
    fn eq(&self, other: &Self) -> bool {
        self.service == other.service && self.canonical_id == other.canonical_id
    }
}

impl Eq for PlaylistReference {}

impl Hash for PlaylistReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.service.hash(state);
        self.canonical_id.hash(state);
    }
}

impl fmt::Display for PlaylistReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.canonical_id, self.service)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedTrack {
    pub artist: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub list_a_size: usize,
    pub list_b_size: usize,
    pub matches: Vec<MatchedTrack>,
    pub match_count: usize,
    pub ratio_a_to_b: f64,
    pub ratio_b_to_a: f64,
}

#[derive(Tabled)]
pub struct SummaryTableRow {
    pub playlist: String,
    pub tracks: usize,
    pub shared: usize,
    #[tabled(rename = "similar to the other")]
    pub similarity: String,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub artist: String,
    pub title: String,
}
