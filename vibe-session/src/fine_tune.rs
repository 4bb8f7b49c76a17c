//! Fine-tune selections
//!
//! Per-artist ordered track picks that steer a search toward specific songs.

use std::collections::BTreeMap;

use serde::Serialize;

/// Artist → ordered set of chosen track names, bounded per artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FineTuneSelection {
    #[serde(skip)]
    capacity: usize,
    selections: BTreeMap<String, Vec<String>>,
}

impl FineTuneSelection {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            selections: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a track to an artist's picks
    ///
    /// Returns false and leaves the selection untouched when the track is
    /// already picked or the artist is at capacity.
    pub fn select(&mut self, artist: &str, track_name: &str) -> bool {
        let picks = self.selections.entry(artist.to_string()).or_default();
        if picks.len() >= self.capacity || picks.iter().any(|t| t == track_name) {
            if picks.is_empty() {
                self.selections.remove(artist);
            }
            return false;
        }
        picks.push(track_name.to_string());
        true
    }

    /// Remove a pick; returns whether it was present
    pub fn deselect(&mut self, artist: &str, track_name: &str) -> bool {
        let Some(picks) = self.selections.get_mut(artist) else {
            return false;
        };
        let before = picks.len();
        picks.retain(|t| t != track_name);
        let removed = picks.len() != before;
        if picks.is_empty() {
            self.selections.remove(artist);
        }
        removed
    }

    pub fn clear_artist(&mut self, artist: &str) {
        self.selections.remove(artist);
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    pub fn tracks_for(&self, artist: &str) -> &[String] {
        self.selections.get(artist).map_or(&[], Vec::as_slice)
    }

    pub fn is_selected(&self, artist: &str, track_name: &str) -> bool {
        self.tracks_for(artist).iter().any(|t| t == track_name)
    }

    pub fn is_full(&self, artist: &str) -> bool {
        self.tracks_for(artist).len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Total picks across all artists
    pub fn len(&self) -> usize {
        self.selections.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.selections
            .iter()
            .map(|(artist, picks)| (artist.as_str(), picks.as_slice()))
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.selections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_selection() -> FineTuneSelection {
        let mut selection = FineTuneSelection::new(5);
        for name in ["Airbag", "Karma Police", "Lucky", "No Surprises", "Let Down"] {
            assert!(selection.select("Radiohead", name));
        }
        selection
    }

    #[test]
    fn test_sixth_pick_is_a_no_op() {
        let mut selection = full_selection();
        let before = selection.clone();

        assert!(!selection.select("Radiohead", "Paranoid Android"));

        assert_eq!(selection, before);
        assert!(selection.is_full("Radiohead"));
        assert_eq!(selection.tracks_for("Radiohead").last().unwrap(), "Let Down");
    }

    #[test]
    fn test_duplicate_pick_is_ignored() {
        let mut selection = FineTuneSelection::new(5);
        assert!(selection.select("Beck", "Loser"));
        assert!(!selection.select("Beck", "Loser"));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_picks_keep_insertion_order() {
        let mut selection = FineTuneSelection::new(5);
        selection.select("Beck", "Loser");
        selection.select("Beck", "E-Pro");
        selection.select("Beck", "Debra");

        assert_eq!(selection.tracks_for("Beck"), ["Loser", "E-Pro", "Debra"]);
    }

    #[test]
    fn test_deselect_frees_capacity() {
        let mut selection = full_selection();
        assert!(selection.deselect("Radiohead", "Lucky"));
        assert!(!selection.deselect("Radiohead", "Lucky"));
        assert!(selection.select("Radiohead", "Paranoid Android"));
    }

    #[test]
    fn test_rejected_pick_leaves_no_empty_entry() {
        let mut selection = FineTuneSelection::new(0);
        assert!(!selection.select("Beck", "Loser"));
        assert!(selection.is_empty());
    }
}
