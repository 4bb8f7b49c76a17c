//! Playback coordinator
//!
//! Owns the one system-wide [`ActiveTrack`] and turns play intents into
//! controller calls on the target surface, resetting the previously sounding
//! surface through the [`ResetBus`].
//!
//! # Play request flow
//!
//! ```text
//! request_play(S, T)
//!   ├─ active == (S, T)      → toggle pause/resume on S, no reset
//!   │                          (resuming T that never started on S activates it)
//!   ├─ S not ready           → park T on S, active = (S, T), previous keeps sounding
//!   └─ S ready               → reset previous surface, load + play T on S
//!
//! on_surface_ready(S)        → parked T still active? play it as above : drop it
//! ```
//!
//! Resets are delivered asynchronously, so for a short window the old
//! surface may still be sounding after a new one started. Each activation
//! bumps an epoch stamped on the resets it issues; a surface activated again
//! before a reset reaches it ignores that reset.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;
use vibe_common::config::TomlConfig;

use crate::error::{Error, Result};
use crate::reset_bus::{ResetBus, ResetSignal};
use crate::surface::{PlaybackSurface, PlaybackUpdate, SurfaceId, SurfaceOptions, TrackRef};

/// The single track considered playing/selected system-wide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveTrack {
    pub surface_id: SurfaceId,
    pub track_id: String,
    pub track_name: String,
    /// Paused/playing sub-state; identity is unaffected by toggling
    pub paused: bool,
}

impl ActiveTrack {
    fn new(surface_id: SurfaceId, track: &TrackRef) -> Self {
        Self {
            surface_id,
            track_id: track.track_id.clone(),
            track_name: track.track_name.clone(),
            paused: false,
        }
    }

    pub fn matches(&self, surface_id: &SurfaceId, track_id: &str) -> bool {
        &self.surface_id == surface_id && self.track_id == track_id
    }
}

/// What a play request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Same track again: paused or resumed
    Toggled { paused: bool },
    /// Surface not ready; the request waits for its ready signal
    Buffered,
    /// Track loaded and started
    Started,
}

/// Enforces the single-active-track rule across all mounted surfaces
pub struct PlaybackCoordinator {
    bus: ResetBus,
    options: SurfaceOptions,
    /// Identity → instance of the currently mounted surface
    mounted: HashMap<SurfaceId, Uuid>,
    active: Option<ActiveTrack>,
    /// Surface on which play was last actually issued
    sounding: Option<SurfaceId>,
    /// Incremented on every activation
    epoch: u64,
}

impl PlaybackCoordinator {
    pub fn new(bus: ResetBus, options: SurfaceOptions) -> Self {
        Self {
            bus,
            options,
            mounted: HashMap::new(),
            active: None,
            sounding: None,
            epoch: 0,
        }
    }

    /// Coordinator with the ready fallback taken from config
    pub fn from_config(config: &TomlConfig) -> Self {
        Self::new(ResetBus::new(), SurfaceOptions::from(config))
    }

    pub fn bus(&self) -> &ResetBus {
        &self.bus
    }

    pub fn active(&self) -> Option<&ActiveTrack> {
        self.active.as_ref()
    }

    pub fn is_active(&self, surface_id: &SurfaceId, track_id: &str) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.matches(surface_id, track_id))
    }

    pub fn is_mounted(&self, surface_id: &SurfaceId) -> bool {
        self.mounted.contains_key(surface_id)
    }

    /// Create the surface for `id`, subscribed to its resets
    ///
    /// `default_track` is what the surface rewinds to when reset: the card's
    /// first recommended track, or `None` (silence) for the library.
    pub fn mount(
        &mut self,
        id: SurfaceId,
        default_track: Option<TrackRef>,
    ) -> Result<PlaybackSurface> {
        if self.mounted.contains_key(&id) {
            return Err(Error::AlreadyMounted(id));
        }
        let resets = self.bus.subscribe(id.clone());
        let surface = PlaybackSurface::new(id.clone(), default_track, self.options.clone(), resets);
        self.mounted.insert(id.clone(), surface.instance());
        debug!("Mounted surface {}", id);
        Ok(surface)
    }

    /// Tear a surface down
    ///
    /// Its parked play dies with it; if it held the active track, nothing is
    /// active afterwards.
    pub fn detach(&mut self, surface: PlaybackSurface) {
        let id = surface.id().clone();
        if self.mounted.get(&id) != Some(&surface.instance()) {
            debug!("Detaching stale instance of {}", id);
            return;
        }
        self.mounted.remove(&id);
        self.bus.unsubscribe(&id);
        if self.active.as_ref().is_some_and(|a| a.surface_id == id) {
            info!("Active surface {} unmounted, clearing active track", id);
            self.active = None;
        }
        if self.sounding.as_ref() == Some(&id) {
            self.sounding = None;
        }
        debug!("Detached surface {}", id);
    }

    /// Serialize a play intent for `track_id` on `surface`
    pub fn request_play(
        &mut self,
        surface: &mut PlaybackSurface,
        track_id: &str,
        track_name: &str,
    ) -> Result<PlayOutcome> {
        self.ensure_current(surface)?;
        let track = TrackRef::new(track_id, track_name);

        if self.is_active(surface.id(), track_id) {
            return Ok(self.toggle_active(surface));
        }

        if !surface.is_ready() {
            if let Some(replaced) = surface.set_pending(track.clone()) {
                debug!(
                    "Pending play on {} replaced '{}' with '{}'",
                    surface.id(),
                    replaced.track.track_name,
                    track.track_name
                );
            } else {
                debug!("Buffering '{}' until {} is ready", track.track_name, surface.id());
            }
            self.active = Some(ActiveTrack::new(surface.id().clone(), &track));
            return Ok(PlayOutcome::Buffered);
        }

        self.activate(surface, &track);
        Ok(PlayOutcome::Started)
    }

    /// Controller reported ready; plays the parked request if it is still wanted
    ///
    /// Returns true when a parked play was started.
    pub fn on_surface_ready(&mut self, surface: &mut PlaybackSurface) -> Result<bool> {
        self.ensure_current(surface)?;
        if !surface.mark_ready() {
            return Ok(false);
        }

        let Some(pending) = surface.take_pending() else {
            return Ok(false);
        };

        if !self.is_active(surface.id(), &pending.track.track_id) {
            debug!(
                "Dropping superseded pending '{}' on {}",
                pending.track.track_name,
                surface.id()
            );
            return Ok(false);
        }

        self.activate(surface, &pending.track);
        Ok(true)
    }

    /// Treat a silent controller as ready once its fallback delay passed
    pub fn poll_ready_fallback(
        &mut self,
        surface: &mut PlaybackSurface,
        now: Instant,
    ) -> Result<bool> {
        if !surface.ready_fallback_due(now) {
            return Ok(false);
        }
        debug!("No ready signal from {}, assuming ready", surface.id());
        self.on_surface_ready(surface)
    }

    /// Mirror a `playback_update` from the embed
    pub fn on_playback_update(
        &mut self,
        surface: &mut PlaybackSurface,
        update: PlaybackUpdate,
    ) -> Result<()> {
        self.ensure_current(surface)?;
        surface.apply_update(&update);
        let id = surface.id().clone();

        let holds_active = self.active.as_ref().is_some_and(|a| {
            a.surface_id == id
                && surface
                    .loaded_track()
                    .is_some_and(|loaded| loaded.track_id == a.track_id)
        });

        if holds_active {
            if update.is_finished() {
                info!("Playback finished on {}", id);
                self.active = None;
                self.sounding = None;
            } else if let Some(active) = self.active.as_mut() {
                active.paused = update.is_paused;
            }
            return Ok(());
        }

        // Started from the embed's own controls
        if !update.is_paused && self.sounding.as_ref() != Some(&id) {
            if let Some(track) = surface.loaded_track().cloned() {
                info!("{} started '{}' on its own, adopting it", id, track.track_name);
                let epoch = self.next_epoch();
                self.reset_others(&id, epoch);
                surface.mark_activated(epoch);
                self.active = Some(ActiveTrack::new(id.clone(), &track));
                self.sounding = Some(id);
            }
        }
        Ok(())
    }

    fn toggle_active(&mut self, surface: &mut PlaybackSurface) -> PlayOutcome {
        let Some(active) = self.active.as_mut() else {
            return PlayOutcome::Toggled { paused: false };
        };
        active.paused = !active.paused;
        let paused = active.paused;
        let track = TrackRef::new(active.track_id.clone(), active.track_name.clone());

        if !surface.is_ready() {
            if paused {
                surface.take_pending();
            } else {
                surface.set_pending(track);
            }
        } else if self.holds_track(surface, &track) {
            surface.toggle();
        } else if !paused {
            // Paused before it ever started here, so resuming means starting
            self.activate(surface, &track);
        } else {
            debug!("'{}' never started on {}, nothing to pause", track.track_name, surface.id());
        }
        debug!("Toggled {} (paused: {})", surface.id(), paused);
        PlayOutcome::Toggled { paused }
    }

    /// `surface` has `track` loaded and is where play was last issued
    fn holds_track(&self, surface: &PlaybackSurface, track: &TrackRef) -> bool {
        self.sounding.as_ref() == Some(surface.id())
            && surface
                .loaded_track()
                .is_some_and(|loaded| loaded.track_id == track.track_id)
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn activate(&mut self, surface: &mut PlaybackSurface, track: &TrackRef) {
        let id = surface.id().clone();
        let epoch = self.next_epoch();
        self.reset_others(&id, epoch);
        surface.load_and_play(track, epoch);
        self.active = Some(ActiveTrack::new(id.clone(), track));
        self.sounding = Some(id.clone());
        info!("Playing '{}' on {}", track.track_name, id);
    }

    /// Reset the previously active and sounding surfaces, except `keep`
    fn reset_others(&self, keep: &SurfaceId, epoch: u64) {
        let previous_active = self.active.as_ref().map(|a| &a.surface_id);
        if let Some(prev) = previous_active.filter(|prev| *prev != keep) {
            self.broadcast_reset(prev, keep, epoch);
        }
        if let Some(sounding) = self.sounding.as_ref() {
            if sounding != keep && Some(sounding) != previous_active {
                self.broadcast_reset(sounding, keep, epoch);
            }
        }
    }

    fn broadcast_reset(&self, target: &SurfaceId, superseded_by: &SurfaceId, epoch: u64) {
        let delivered = self.bus.publish(ResetSignal {
            target: target.clone(),
            superseded_by: Some(superseded_by.clone()),
            epoch,
        });
        debug!(
            "Reset {} (superseded by {}, epoch {}, delivered: {})",
            target, superseded_by, epoch, delivered
        );
    }

    fn ensure_current(&self, surface: &PlaybackSurface) -> Result<()> {
        match self.mounted.get(surface.id()) {
            Some(instance) if *instance == surface.instance() => Ok(()),
            _ => Err(Error::NotMounted(surface.id().clone())),
        }
    }
}

impl Default for PlaybackCoordinator {
    fn default() -> Self {
        Self::new(ResetBus::new(), SurfaceOptions::default())
    }
}
