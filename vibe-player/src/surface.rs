//! Playback surfaces
//!
//! A surface is the UI-bound wrapper around one embedded audio player. The
//! player itself is an external collaborator: it is created asynchronously,
//! may announce readiness late or never, and may throw on any call. The
//! surface absorbs all of that so the coordinator only sees a well-behaved
//! target.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;
use vibe_common::config::TomlConfig;

use crate::error::PlayerFault;
use crate::reset_bus::{ResetSignal, ResetSubscription};

/// Identity of a mounted surface
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SurfaceId {
    /// Player on a recommendation card
    Artist(String),
    /// Shared sidebar/favorites player
    Library,
}

impl SurfaceId {
    pub fn artist(name: impl Into<String>) -> Self {
        SurfaceId::Artist(name.into())
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceId::Artist(name) => write!(f, "artist:{}", name),
            SurfaceId::Library => write!(f, "library"),
        }
    }
}

/// A track a surface can load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackRef {
    pub track_id: String,
    pub track_name: String,
}

impl TrackRef {
    pub fn new(track_id: impl Into<String>, track_name: impl Into<String>) -> Self {
        Self {
            track_id: track_id.into(),
            track_name: track_name.into(),
        }
    }
}

/// Play request parked until the surface's controller is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPlay {
    pub surface_id: SurfaceId,
    pub track: TrackRef,
}

/// `playback_update` payload from the embedded player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackUpdate {
    pub is_paused: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
}

impl PlaybackUpdate {
    /// Paused at the end of the track
    pub fn is_finished(&self) -> bool {
        self.is_paused && self.duration_ms > 0 && self.position_ms >= self.duration_ms
    }
}

/// Minimal contract of an embedded audio player
///
/// Implementations wrap a concrete embed; nothing above this trait knows
/// which provider is behind it.
pub trait PlayerController {
    fn load_uri(&mut self, uri: &str) -> Result<(), PlayerFault>;
    fn play(&mut self) -> Result<(), PlayerFault>;
    fn pause(&mut self) -> Result<(), PlayerFault>;
    fn toggle_play(&mut self) -> Result<(), PlayerFault>;
}

/// Settings shared by all surfaces of one coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceOptions {
    /// Prefix turning a track id into a player URI
    pub uri_prefix: String,
    /// Assume readiness after this long without a ready signal
    pub ready_fallback: Duration,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            uri_prefix: "spotify:track:".to_string(),
            ready_fallback: Duration::from_secs(3),
        }
    }
}

impl From<&TomlConfig> for SurfaceOptions {
    fn from(config: &TomlConfig) -> Self {
        Self {
            ready_fallback: config.ready_fallback(),
            ..Self::default()
        }
    }
}

/// One mounted player
///
/// Created through [`PlaybackCoordinator::mount`](crate::PlaybackCoordinator::mount).
pub struct PlaybackSurface {
    id: SurfaceId,
    instance: Uuid,
    options: SurfaceOptions,
    default_track: Option<TrackRef>,
    controller: Option<Box<dyn PlayerController>>,
    ready: bool,
    ready_deadline: Option<Instant>,
    pending: Option<PendingPlay>,
    loaded: Option<TrackRef>,
    playing: bool,
    /// Coordinator epoch of the last activation of this surface
    activated_epoch: u64,
    resets: ResetSubscription,
}

impl PlaybackSurface {
    pub(crate) fn new(
        id: SurfaceId,
        default_track: Option<TrackRef>,
        options: SurfaceOptions,
        resets: ResetSubscription,
    ) -> Self {
        Self {
            id,
            instance: Uuid::new_v4(),
            options,
            default_track,
            controller: None,
            ready: false,
            ready_deadline: None,
            pending: None,
            loaded: None,
            playing: false,
            activated_epoch: 0,
            resets,
        }
    }

    pub fn id(&self) -> &SurfaceId {
        &self.id
    }

    /// Unique per mount; a remounted card gets a new instance
    pub fn instance(&self) -> Uuid {
        self.instance
    }

    pub fn default_track(&self) -> Option<&TrackRef> {
        self.default_track.as_ref()
    }

    pub fn has_controller(&self) -> bool {
        self.controller.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Best-effort view of whether audio is currently coming out
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn loaded_track(&self) -> Option<&TrackRef> {
        self.loaded.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingPlay> {
        self.pending.as_ref()
    }

    /// Hand over the controller once the embed finished creating it
    ///
    /// The embed is created with the default track loaded; the readiness
    /// fallback clock starts now.
    pub fn attach_controller(&mut self, controller: Box<dyn PlayerController>, now: Instant) {
        self.controller = Some(controller);
        self.ready = false;
        self.ready_deadline = Some(now + self.options.ready_fallback);
        self.load_default();
        debug!("Controller attached to {}", self.id);
    }

    /// True when the controller exists, never signalled ready, and the
    /// fallback delay has passed
    pub fn ready_fallback_due(&self, now: Instant) -> bool {
        !self.ready
            && self.controller.is_some()
            && self.ready_deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Returns false if there is no controller to be ready
    pub(crate) fn mark_ready(&mut self) -> bool {
        if self.controller.is_none() {
            warn!("Ready signal for {} without a controller", self.id);
            return false;
        }
        self.ready = true;
        self.ready_deadline = None;
        true
    }

    /// Park a play request; returns the request it replaced
    pub(crate) fn set_pending(&mut self, track: TrackRef) -> Option<PendingPlay> {
        self.pending.replace(PendingPlay {
            surface_id: self.id.clone(),
            track,
        })
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingPlay> {
        self.pending.take()
    }

    pub(crate) fn load_and_play(&mut self, track: &TrackRef, epoch: u64) {
        let uri = self.uri_for(&track.track_id);
        self.call("load", |c| c.load_uri(&uri));
        self.call("play", |c| c.play());
        self.loaded = Some(track.clone());
        self.playing = true;
        self.mark_activated(epoch);
    }

    /// Resets issued at or before `epoch` no longer apply
    pub(crate) fn mark_activated(&mut self, epoch: u64) {
        self.activated_epoch = self.activated_epoch.max(epoch);
    }

    pub(crate) fn toggle(&mut self) {
        self.call("toggle", |c| c.toggle_play());
        self.playing = !self.playing;
    }

    pub(crate) fn apply_update(&mut self, update: &PlaybackUpdate) {
        self.playing = !update.is_paused;
    }

    /// React to a reset addressed to this surface
    ///
    /// Drops any parked play, pauses, and reloads the default track (or
    /// stays silent when there is none). Never calls back into the coordinator.
    pub fn on_external_reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Reset on {} dropped pending '{}'", self.id, pending.track.track_name);
        }
        if self.controller.is_some() {
            self.call("pause", |c| c.pause());
            self.load_default();
        }
        self.playing = false;
    }

    /// Apply `signal` unless this surface was activated again since it was sent
    ///
    /// Returns true when the reset took effect.
    pub fn apply_reset(&mut self, signal: &ResetSignal) -> bool {
        if signal.epoch <= self.activated_epoch {
            debug!(
                "Ignoring stale reset on {} (epoch {}, activated at {})",
                self.id, signal.epoch, self.activated_epoch
            );
            return false;
        }
        self.on_external_reset();
        true
    }

    /// Apply every reset delivered since the last call; returns how many took effect
    pub fn drain_resets(&mut self) -> usize {
        let mut applied = 0;
        while let Some(signal) = self.resets.try_next() {
            if self.apply_reset(&signal) {
                applied += 1;
            }
        }
        applied
    }

    fn load_default(&mut self) {
        match self.default_track.clone() {
            Some(track) => {
                let uri = self.uri_for(&track.track_id);
                self.call("load", |c| c.load_uri(&uri));
                self.loaded = Some(track);
            }
            None => self.loaded = None,
        }
    }

    fn uri_for(&self, track_id: &str) -> String {
        format!("{}{}", self.options.uri_prefix, track_id)
    }

    /// Run a controller call, swallowing faults
    fn call<F>(&mut self, op: &'static str, f: F)
    where
        F: FnOnce(&mut dyn PlayerController) -> Result<(), PlayerFault>,
    {
        let result = match self.controller.as_deref_mut() {
            Some(controller) => f(controller),
            None => Err(PlayerFault::NoController),
        };
        if let Err(fault) = result {
            warn!("Ignoring {} fault on {}: {}", op, self.id, fault);
        }
    }
}

impl fmt::Debug for PlaybackSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSurface")
            .field("id", &self.id)
            .field("instance", &self.instance)
            .field("ready", &self.ready)
            .field("pending", &self.pending)
            .field("loaded", &self.loaded)
            .field("playing", &self.playing)
            .finish()
    }
}
