//! Search inputs and outbound request assembly
//!
//! [`SearchInputs`] is everything the user edits between searches. The
//! [`SearchRequestBuilder`] turns a snapshot of it into a `POST /recommend`
//! body.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;
use vibe_common::api::{RecommendRequest, Track, Tunables};

use crate::fine_tune::FineTuneSelection;
use crate::session::ExclusionHistory;

/// User-edited search parameters
#[derive(Debug, Clone)]
pub struct SearchInputs {
    seeds: Vec<String>,
    fine_tune: FineTuneSelection,
    known_artists: BTreeSet<String>,
    tunables: Tunables,
    /// Track lists fetched per artist, used to resolve fine-tune names
    artist_tracks: HashMap<String, Vec<Track>>,
}

/// Serialized form compared to detect stale parameters
#[derive(Serialize)]
struct ParameterSnapshot<'a> {
    artists: &'a [String],
    fine_tune: &'a BTreeMap<String, Vec<String>>,
}

impl SearchInputs {
    pub fn new(fine_tune_capacity: usize, tunables: Tunables) -> Self {
        Self {
            seeds: Vec::new(),
            fine_tune: FineTuneSelection::new(fine_tune_capacity),
            known_artists: BTreeSet::new(),
            tunables: tunables.clamped(),
            artist_tracks: HashMap::new(),
        }
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    /// Append a seed artist; returns false if already present or blank
    pub fn add_seed(&mut self, artist: impl Into<String>) -> bool {
        let artist = artist.into();
        let artist = artist.trim();
        if artist.is_empty() || self.seeds.iter().any(|s| s == artist) {
            return false;
        }
        self.seeds.push(artist.to_string());
        true
    }

    /// Remove a seed artist along with its fine-tune picks
    pub fn remove_seed(&mut self, artist: &str) -> bool {
        let before = self.seeds.len();
        self.seeds.retain(|s| s != artist);
        if self.seeds.len() == before {
            return false;
        }
        self.fine_tune.clear_artist(artist);
        true
    }

    pub fn fine_tune(&self) -> &FineTuneSelection {
        &self.fine_tune
    }

    /// Pick a track for an artist; no-op at capacity
    pub fn select_track(&mut self, artist: &str, track_name: &str) -> bool {
        self.fine_tune.select(artist, track_name)
    }

    pub fn deselect_track(&mut self, artist: &str, track_name: &str) -> bool {
        self.fine_tune.deselect(artist, track_name)
    }

    pub fn known_artists(&self) -> &BTreeSet<String> {
        &self.known_artists
    }

    /// Mark an artist the user already knows; always excluded from results
    pub fn mark_known(&mut self, artist: impl Into<String>) -> bool {
        self.known_artists.insert(artist.into())
    }

    pub fn unmark_known(&mut self, artist: &str) -> bool {
        self.known_artists.remove(artist)
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn set_tunables(&mut self, tunables: Tunables) {
        self.tunables = tunables.clamped();
    }

    /// Remember an artist's track list for fine-tune resolution
    pub fn cache_artist_tracks(&mut self, artist: impl Into<String>, tracks: Vec<Track>) {
        self.artist_tracks.insert(artist.into(), tracks);
    }

    pub fn artist_tracks(&self, artist: &str) -> Option<&[Track]> {
        self.artist_tracks.get(artist).map(Vec::as_slice)
    }

    /// Serialized (seeds, fine-tune) pair
    ///
    /// Tunables and known artists are not part of it: changing them does not
    /// invalidate the exclusion history.
    pub fn fingerprint(&self) -> String {
        let snapshot = ParameterSnapshot {
            artists: &self.seeds,
            fine_tune: self.fine_tune.as_map(),
        };
        // Strings and vectors only; serialization cannot fail
        serde_json::to_string(&snapshot).unwrap_or_default()
    }
}

/// Builds `POST /recommend` bodies from a [`SearchInputs`] snapshot
pub struct SearchRequestBuilder<'a> {
    inputs: &'a SearchInputs,
    client_id: Option<String>,
}

impl<'a> SearchRequestBuilder<'a> {
    pub fn new(inputs: &'a SearchInputs) -> Self {
        Self {
            inputs,
            client_id: None,
        }
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Request for a fresh search: only known artists are excluded
    pub fn fresh_search(&self) -> RecommendRequest {
        let excluded: Vec<String> = self.inputs.known_artists.iter().cloned().collect();
        self.build(excluded)
    }

    /// Request for a regeneration: known artists plus everything already shown
    pub fn regenerate(&self, history: &ExclusionHistory) -> RecommendRequest {
        let excluded: BTreeSet<String> = self
            .inputs
            .known_artists
            .iter()
            .chain(history.iter())
            .cloned()
            .collect();
        self.build(excluded.into_iter().collect())
    }

    /// Track ids for every fine-tune pick that resolves against a fetched list
    ///
    /// Picks whose artist has no cached track list, or whose name is missing
    /// from it, are dropped.
    pub fn resolve_track_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for seed in &self.inputs.seeds {
            let picks = self.inputs.fine_tune.tracks_for(seed);
            if picks.is_empty() {
                continue;
            }
            let tracks = self.inputs.artist_tracks(seed).unwrap_or(&[]);
            for name in picks {
                match tracks.iter().find(|t| &t.track_name == name) {
                    Some(track) if !ids.contains(&track.track_id) => {
                        ids.push(track.track_id.clone())
                    }
                    Some(_) => {}
                    None => debug!("Dropping unresolvable fine-tune pick '{}' for {}", name, seed),
                }
            }
        }
        ids
    }

    fn build(&self, excluded: Vec<String>) -> RecommendRequest {
        let mut request = RecommendRequest::new(self.inputs.seeds.clone(), &self.inputs.tunables);
        let track_ids = self.resolve_track_ids();
        request.track_ids = (!track_ids.is_empty()).then_some(track_ids);
        request.exclude_artists = (!excluded.is_empty()).then_some(excluded);
        request.client_id = self.client_id.clone();
        request
    }
}
