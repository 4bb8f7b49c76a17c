//! Test helpers for playback coordination tests
//!
//! Provides a recording player controller whose state stays inspectable
//! after it has been boxed and handed to a surface.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use vibe_player::{PlaybackCoordinator, PlaybackSurface, PlayerController, PlayerFault, SurfaceId, TrackRef};

/// A call received by the mock controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Load(String),
    Play,
    Pause,
    Toggle,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub calls: Vec<Call>,
    pub playing: bool,
    pub fail_all: bool,
}

/// Shared handle to a mock controller's state
#[derive(Clone, Default)]
pub struct MockPlayer {
    state: Rc<RefCell<MockState>>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller that throws on every call but still records it
    pub fn failing() -> Self {
        let player = Self::default();
        player.state.borrow_mut().fail_all = true;
        player
    }

    pub fn controller(&self) -> Box<dyn PlayerController> {
        Box::new(MockController {
            state: Rc::clone(&self.state),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }
}

struct MockController {
    state: Rc<RefCell<MockState>>,
}

impl MockController {
    fn record(&mut self, call: Call) -> Result<(), PlayerFault> {
        let mut state = self.state.borrow_mut();
        let op = match &call {
            Call::Load(_) => "load",
            Call::Play => "play",
            Call::Pause => "pause",
            Call::Toggle => "toggle",
        };
        match call {
            Call::Load(_) | Call::Pause => state.playing = false,
            Call::Play => state.playing = true,
            Call::Toggle => state.playing = !state.playing,
        }
        state.calls.push(call);
        if state.fail_all {
            return Err(PlayerFault::rejected(op, "embed threw"));
        }
        Ok(())
    }
}

impl PlayerController for MockController {
    fn load_uri(&mut self, uri: &str) -> Result<(), PlayerFault> {
        self.record(Call::Load(uri.to_string()))
    }

    fn play(&mut self) -> Result<(), PlayerFault> {
        self.record(Call::Play)
    }

    fn pause(&mut self) -> Result<(), PlayerFault> {
        self.record(Call::Pause)
    }

    fn toggle_play(&mut self) -> Result<(), PlayerFault> {
        self.record(Call::Toggle)
    }
}

/// Player URI for a track id with the default prefix
pub fn uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id)
}

/// Mount a card surface, attach a mock controller and mark it ready
pub fn ready_card(
    coordinator: &mut PlaybackCoordinator,
    artist: &str,
    default_track: Option<TrackRef>,
) -> (PlaybackSurface, MockPlayer) {
    let mut surface = coordinator
        .mount(SurfaceId::artist(artist), default_track)
        .expect("mount card");
    let player = MockPlayer::new();
    surface.attach_controller(player.controller(), Instant::now());
    coordinator.on_surface_ready(&mut surface).expect("ready");
    player.clear_calls();
    (surface, player)
}

/// Deliver pending resets to every surface
pub fn deliver_resets(surfaces: &mut [&mut PlaybackSurface]) {
    for surface in surfaces.iter_mut() {
        surface.drain_resets();
    }
}
