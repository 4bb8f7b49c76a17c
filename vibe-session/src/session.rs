//! Recommendation session
//!
//! Holds the displayed artist → tracks map, the exclusion history sent back on
//! every regeneration, and the lifecycle state:
//!
//! ```text
//! Idle ──search──► Searching ──ok──► Populated ◄──ok/err── Regenerating
//!  ▲                   │                │  ▲                    │
//!  └──────err──────────┘                │  └──regenerate────────┘
//!                                       ▼
//!                                   Exhausted (sticky until the next search)
//! ```
//!
//! Network calls happen outside the session. [`RecommendationSession::begin_search`]
//! and [`RecommendationSession::begin_regenerate`] hand out a [`PendingRequest`];
//! its outcome is fed back through [`RecommendationSession::complete`]. A ticket
//! from an earlier generation is discarded without touching state.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vibe_common::api::{ArtistRecommendations, RecommendRequest, RecommendResponse, ResponseMeta, Tunables};
use vibe_common::config::TomlConfig;
use vibe_common::{Error, Result, DEFAULT_FINE_TUNE_CAPACITY, HIDDEN_ARTIST_LIMIT};

use crate::request::{SearchInputs, SearchRequestBuilder};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Searching,
    Populated,
    Regenerating,
    Exhausted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Idle => "idle",
            SessionState::Searching => "searching",
            SessionState::Populated => "populated",
            SessionState::Regenerating => "regenerating",
            SessionState::Exhausted => "exhausted",
        };
        f.write_str(label)
    }
}

/// Why "regenerate" is currently disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegenerateBlocked {
    /// A search or regeneration is in flight
    Loading,
    /// Nothing has been found yet
    NoResults,
    /// Seeds or fine-tune picks changed since the last search
    StaleParameters,
    /// The service reported no further candidates
    PoolExhausted,
    /// Exclusion history reached its limit
    HistoryFull,
}

impl RegenerateBlocked {
    /// Tooltip text for the disabled action
    pub fn reason(&self) -> &'static str {
        match self {
            RegenerateBlocked::Loading => "Loading recommendations…",
            RegenerateBlocked::NoResults => "Run a search first",
            RegenerateBlocked::StaleParameters => {
                "Artists or fine-tune picks changed. Search again to continue."
            }
            RegenerateBlocked::PoolExhausted => "No more artists match these seeds",
            RegenerateBlocked::HistoryFull => {
                "Too many artists hidden already. Start a new search."
            }
        }
    }
}

impl fmt::Display for RegenerateBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Artists already shown within one regeneration chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionHistory {
    artists: BTreeSet<String>,
}

impl ExclusionHistory {
    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }

    pub fn contains(&self, artist: &str) -> bool {
        self.artists.contains(artist)
    }

    /// Union in more artists; returns how many were new
    pub fn extend<I: IntoIterator<Item = String>>(&mut self, artists: I) -> usize {
        let before = self.artists.len();
        self.artists.extend(artists);
        self.artists.len() - before
    }

    pub fn clear(&mut self) {
        self.artists.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.artists.iter()
    }
}

/// Size limits applied to one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub hidden_artist_limit: usize,
    pub fine_tune_capacity: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            hidden_artist_limit: HIDDEN_ARTIST_LIMIT,
            fine_tune_capacity: DEFAULT_FINE_TUNE_CAPACITY,
        }
    }
}

impl From<&TomlConfig> for SessionLimits {
    fn from(config: &TomlConfig) -> Self {
        Self {
            hidden_artist_limit: config.hidden_artist_limit,
            fine_tune_capacity: config.fine_tune_capacity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestKind {
    Search,
    Regenerate,
}

/// An issued request awaiting its response
#[derive(Debug, Clone)]
pub struct PendingRequest {
    kind: RequestKind,
    generation: u64,
    /// Parameters at issue time; becomes the baseline if a search succeeds
    fingerprint: String,
    request: RecommendRequest,
}

impl PendingRequest {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Body to `POST /recommend`
    pub fn request(&self) -> &RecommendRequest {
        &self.request
    }
}

/// Result of feeding a response back into the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Response stored; carries the state it led to
    Applied(SessionState),
    /// Request failed; carries the user-facing message
    Failed(String),
    /// Response belonged to a superseded request and was dropped
    Discarded,
}

/// One search and its regeneration chain
pub struct RecommendationSession {
    id: Uuid,
    limits: SessionLimits,
    inputs: SearchInputs,
    state: SessionState,
    recommendations: ArtistRecommendations,
    history: ExclusionHistory,
    has_more_candidates: bool,
    /// Parameter fingerprint of the last successful search
    baseline: Option<String>,
    /// Bumped on every issued request; only the latest ticket is applied
    generation: u64,
    last_error: Option<String>,
    last_meta: Option<ResponseMeta>,
}

impl RecommendationSession {
    pub fn new(limits: SessionLimits, tunables: Tunables) -> Self {
        Self {
            id: Uuid::new_v4(),
            limits,
            inputs: SearchInputs::new(limits.fine_tune_capacity, tunables),
            state: SessionState::Idle,
            recommendations: ArtistRecommendations::new(),
            history: ExclusionHistory::default(),
            has_more_candidates: true,
            baseline: None,
            generation: 0,
            last_error: None,
            last_meta: None,
        }
    }

    /// Session built from bootstrap config limits and default tunables
    pub fn from_config(config: &TomlConfig) -> Self {
        Self::new(SessionLimits::from(config), config.tunables.clone())
    }

    /// Correlation id sent as `client_id`
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Searching | SessionState::Regenerating)
    }

    pub fn inputs(&self) -> &SearchInputs {
        &self.inputs
    }

    /// Edit seeds, fine-tune picks, known artists or tunables
    pub fn inputs_mut(&mut self) -> &mut SearchInputs {
        &mut self.inputs
    }

    pub fn recommendations(&self) -> &ArtistRecommendations {
        &self.recommendations
    }

    pub fn exclusion_history(&self) -> &ExclusionHistory {
        &self.history
    }

    pub fn has_more_candidates(&self) -> bool {
        self.has_more_candidates
    }

    /// Message from the last failed request, cleared by the next request
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_meta(&self) -> Option<&ResponseMeta> {
        self.last_meta.as_ref()
    }

    /// Seeds or fine-tune picks differ from those of the last successful search
    pub fn is_stale(&self) -> bool {
        self.baseline
            .as_ref()
            .is_some_and(|baseline| *baseline != self.inputs.fingerprint())
    }

    /// First reason regeneration is unavailable, or `None` if allowed
    pub fn regenerate_blocked(&self) -> Option<RegenerateBlocked> {
        match self.state {
            SessionState::Searching | SessionState::Regenerating => {
                return Some(RegenerateBlocked::Loading)
            }
            SessionState::Idle => return Some(RegenerateBlocked::NoResults),
            SessionState::Exhausted => return Some(RegenerateBlocked::PoolExhausted),
            SessionState::Populated => {}
        }
        if self.is_stale() {
            return Some(RegenerateBlocked::StaleParameters);
        }
        if !self.has_more_candidates {
            return Some(RegenerateBlocked::PoolExhausted);
        }
        if self.history.len() >= self.limits.hidden_artist_limit {
            return Some(RegenerateBlocked::HistoryFull);
        }
        None
    }

    pub fn can_regenerate(&self) -> bool {
        self.regenerate_blocked().is_none()
    }

    /// Start a fresh search from the current inputs
    ///
    /// Allowed in every state. Supersedes any request in flight and clears
    /// the exclusion history along with the exhausted marker.
    pub fn begin_search(&mut self) -> Result<PendingRequest> {
        if self.inputs.seeds().is_empty() {
            return Err(Error::InvalidInput(
                "Pick at least one artist to search".to_string(),
            ));
        }
        if self.is_loading() {
            debug!("Search supersedes {} request in flight", self.state);
        }

        let request = self.builder().fresh_search();
        self.history.clear();
        self.has_more_candidates = true;
        self.last_error = None;
        let ticket = self.issue(RequestKind::Search, request);
        self.state = SessionState::Searching;
        info!(
            "Searching {} seed artist(s), {} excluded",
            ticket.request.artists.len(),
            ticket.request.excluded_count()
        );
        Ok(ticket)
    }

    /// Ask for more artists for the same seeds, excluding everything shown
    pub fn begin_regenerate(&mut self) -> std::result::Result<PendingRequest, RegenerateBlocked> {
        if let Some(blocked) = self.regenerate_blocked() {
            debug!("Regenerate blocked: {:?}", blocked);
            return Err(blocked);
        }

        let request = self.builder().regenerate(&self.history);
        self.last_error = None;
        let ticket = self.issue(RequestKind::Regenerate, request);
        self.state = SessionState::Regenerating;
        info!(
            "Regenerating with {} excluded artist(s)",
            ticket.request.excluded_count()
        );
        Ok(ticket)
    }

    /// Apply the outcome of a request issued by this session
    ///
    /// Failures are reduced to their user-facing message here.
    pub fn complete(
        &mut self,
        ticket: PendingRequest,
        result: Result<RecommendResponse>,
    ) -> Completion {
        if ticket.generation != self.generation || !self.is_loading() {
            debug!(
                "Discarding stale {:?} response (generation {}, current {})",
                ticket.kind, ticket.generation, self.generation
            );
            return Completion::Discarded;
        }

        match (ticket.kind, result) {
            (RequestKind::Search, Ok(response)) => {
                let shown = unseeded_artists(&response, &ticket.request.artists);
                self.apply_search(ticket.fingerprint, shown, response);
                Completion::Applied(self.state)
            }
            (RequestKind::Regenerate, Ok(response)) => {
                let shown = unseeded_artists(&response, &ticket.request.artists);
                self.apply_regenerate(shown, response);
                Completion::Applied(self.state)
            }
            (RequestKind::Search, Err(err)) => {
                warn!("Search failed: {}", err);
                self.recommendations.clear();
                self.history.clear();
                self.baseline = None;
                self.last_meta = None;
                self.state = SessionState::Idle;
                self.fail(&err)
            }
            (RequestKind::Regenerate, Err(err)) => {
                warn!("Regeneration failed: {}", err);
                self.state = SessionState::Populated;
                self.fail(&err)
            }
        }
    }

    fn apply_search(&mut self, fingerprint: String, shown: Vec<String>, response: RecommendResponse) {
        self.history.clear();
        self.history.extend(shown);
        self.baseline = Some(fingerprint);
        self.has_more_candidates = response.has_more_candidates();
        self.state = if self.has_more_candidates {
            SessionState::Populated
        } else {
            SessionState::Exhausted
        };
        self.recommendations = response.recommendations;
        self.last_meta = response.meta;
        info!(
            "Search returned {} artist(s), state {}",
            self.recommendations.len(),
            self.state
        );
    }

    fn apply_regenerate(&mut self, shown: Vec<String>, response: RecommendResponse) {
        let added = self.history.extend(shown);
        self.has_more_candidates = response.has_more_candidates();

        if response.recommendations.is_empty() {
            // Keep what is on screen; nothing new can come from these seeds
            self.has_more_candidates = false;
        } else {
            self.recommendations = response.recommendations;
        }
        if response.meta.is_some() {
            self.last_meta = response.meta;
        }
        self.state = if self.has_more_candidates {
            SessionState::Populated
        } else {
            SessionState::Exhausted
        };
        info!(
            "Regeneration added {} artist(s) to history ({} hidden), state {}",
            added,
            self.history.len(),
            self.state
        );
    }

    fn fail(&mut self, err: &Error) -> Completion {
        let message = err.user_message();
        self.last_error = Some(message.clone());
        Completion::Failed(message)
    }

    fn builder(&self) -> SearchRequestBuilder<'_> {
        SearchRequestBuilder::new(&self.inputs).client_id(self.id.to_string())
    }

    fn issue(&mut self, kind: RequestKind, request: RecommendRequest) -> PendingRequest {
        self.generation += 1;
        PendingRequest {
            kind,
            generation: self.generation,
            fingerprint: self.inputs.fingerprint(),
            request,
        }
    }
}

impl fmt::Debug for RecommendationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecommendationSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("artists", &self.recommendations.len())
            .field("hidden", &self.history.len())
            .field("stale", &self.is_stale())
            .field("generation", &self.generation)
            .finish()
    }
}

/// Response artists other than the seeds the request was sent with
fn unseeded_artists(response: &RecommendResponse, seeds: &[String]) -> Vec<String> {
    response
        .artist_names()
        .filter(|name| !seeds.iter().any(|s| s == name))
        .map(str::to_string)
        .collect()
}
