//! Request/response types for the recommendation service
//!
//! JSON keys are snake_case, matching the service exactly. Optional request
//! fields are left out of the body when empty so older servers that do not
//! know them keep working.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Tunable Weights
// ========================================

/// User-adjustable knobs sent with every recommendation request
///
/// Defaults for `diversity`, `max_artists`, `genre_weight` and
/// `tracks_per_artist` are the service's own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Candidate pool multiplier; above 1 the ranking is shuffled
    pub diversity: u32,
    /// Maximum number of artists in one response
    pub max_artists: u32,
    /// Weight of genre distance relative to audio distance
    pub genre_weight: f64,
    /// Tracks returned for each recommended artist
    pub tracks_per_artist: u32,
    /// Mood slider, 0.0..=1.0
    pub vibe_mood: f64,
    /// Sound slider, 0.0..=1.0
    pub vibe_sound: f64,
    /// Popularity bias, 0.0..=1.0
    pub popularity: f64,
    /// Ask the service to attach debug metadata
    pub debug: bool,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            diversity: 2,
            max_artists: 6,
            genre_weight: 2.0,
            tracks_per_artist: 4,
            vibe_mood: 0.5,
            vibe_sound: 0.5,
            popularity: 0.5,
            debug: false,
        }
    }
}

impl Tunables {
    /// Clamp slider values into their valid ranges
    pub fn clamped(mut self) -> Self {
        self.diversity = self.diversity.max(1);
        self.max_artists = self.max_artists.max(1);
        self.tracks_per_artist = self.tracks_per_artist.max(1);
        self.genre_weight = self.genre_weight.max(0.0);
        self.vibe_mood = self.vibe_mood.clamp(0.0, 1.0);
        self.vibe_sound = self.vibe_sound.clamp(0.0, 1.0);
        self.popularity = self.popularity.clamp(0.0, 1.0);
        self
    }
}

// ========================================
// Recommendation Request
// ========================================

/// Body of `POST /recommend`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    /// Seed artist names
    pub artists: Vec<String>,

    /// Concrete track ids resolved from fine-tune selections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_ids: Option<Vec<String>>,

    /// Artists the service must not return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_artists: Option<Vec<String>>,

    pub diversity: u32,
    pub max_artists: u32,
    pub genre_weight: f64,
    pub tracks_per_artist: u32,
    pub vibe_mood: f64,
    pub vibe_sound: f64,
    pub popularity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,

    /// Per-session correlation id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl RecommendRequest {
    /// Build a request carrying the given tunables and no optional parts
    pub fn new(artists: Vec<String>, tunables: &Tunables) -> Self {
        Self {
            artists,
            track_ids: None,
            exclude_artists: None,
            diversity: tunables.diversity,
            max_artists: tunables.max_artists,
            genre_weight: tunables.genre_weight,
            tracks_per_artist: tunables.tracks_per_artist,
            vibe_mood: tunables.vibe_mood,
            vibe_sound: tunables.vibe_sound,
            popularity: tunables.popularity,
            debug: tunables.debug.then_some(true),
            client_id: None,
        }
    }

    /// Number of artists this request excludes
    pub fn excluded_count(&self) -> usize {
        self.exclude_artists.as_ref().map_or(0, Vec::len)
    }
}

// ========================================
// Recommendation Response
// ========================================

/// Audio descriptors the service may attach to a track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acousticness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danceability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrumentalness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speechiness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness: Option<f64>,

    /// Any descriptor not listed above
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A single track as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub track_id: String,
    pub track_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_features: Option<AudioFeatures>,
}

impl Track {
    pub fn new(track_id: impl Into<String>, track_name: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            track_name: track_name.into(),
            year: None,
            genre: None,
            audio_features: None,
        }
    }
}

/// Artist name → recommended tracks, in the order the service ranked them
pub type ArtistRecommendations = IndexMap<String, Vec<Track>>;

/// Response metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// False once the service has no unseen candidates for these seeds
    #[serde(default = "default_has_more")]
    pub has_more_candidates: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_genre_profile: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_vector_audio: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_vector_genre: Option<Vec<f64>>,
}

fn default_has_more() -> bool {
    true
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            has_more_candidates: true,
            debug: None,
            input_genre_profile: None,
            search_vector_audio: None,
            search_vector_genre: None,
        }
    }
}

/// Body returned by `POST /recommend`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    #[serde(default)]
    pub recommendations: ArtistRecommendations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl RecommendResponse {
    /// Whether more candidates exist; servers without metadata always say yes
    pub fn has_more_candidates(&self) -> bool {
        self.meta.as_ref().map_or(true, |m| m.has_more_candidates)
    }

    /// Artist names in response order
    pub fn artist_names(&self) -> impl Iterator<Item = &str> {
        self.recommendations.keys().map(String::as_str)
    }
}

// ========================================
// Health
// ========================================

/// Body returned by `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub tracks_loaded: u64,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
