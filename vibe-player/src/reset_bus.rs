//! Reset bus
//!
//! Carries "you are no longer active" signals. The coordinator publishes by
//! surface identity without holding any handle to the surface itself; each
//! mounted identity has its own queue, so traffic for one surface can never
//! crowd out a reset addressed to another.
//!
//! Every signal carries the activation epoch that caused it. A surface that
//! was activated again after the signal was published ignores it.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::surface::SurfaceId;

/// A reset addressed to one surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetSignal {
    /// Surface that must pause and rewind to its default track
    pub target: SurfaceId,
    /// Surface that took over playback, if known
    pub superseded_by: Option<SurfaceId>,
    /// Coordinator activation that issued this reset
    pub epoch: u64,
}

/// Reset signal distribution bus
///
/// One unbounded queue per mounted identity:
/// - Publishing never blocks and never drops a signal for a live surface
/// - Subscribing again for an identity replaces the previous queue
/// - Signals published before a subscription are never seen by it
///
/// # Examples
///
/// ```
/// use vibe_player::{ResetBus, ResetSignal, SurfaceId};
///
/// let mut bus = ResetBus::new();
/// let mut beck = bus.subscribe(SurfaceId::artist("Beck"));
///
/// bus.publish(ResetSignal { target: SurfaceId::Library, superseded_by: None, epoch: 1 });
/// bus.publish(ResetSignal { target: SurfaceId::artist("Beck"), superseded_by: None, epoch: 2 });
///
/// let signal = beck.try_next().unwrap();
/// assert_eq!(signal.epoch, 2);
/// assert!(beck.try_next().is_none());
/// ```
#[derive(Default)]
pub struct ResetBus {
    senders: HashMap<SurfaceId, mpsc::UnboundedSender<ResetSignal>>,
}

impl ResetBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the queue for `id`, replacing any earlier one
    pub fn subscribe(&mut self, id: SurfaceId) -> ResetSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(id.clone(), tx);
        ResetSubscription { id, rx }
    }

    /// Close the queue for `id`
    pub fn unsubscribe(&mut self, id: &SurfaceId) {
        self.senders.remove(id);
    }

    /// Queue a reset for its target; returns whether a live surface will see it
    ///
    /// A missing target is fine: it was already torn down.
    pub fn publish(&self, signal: ResetSignal) -> bool {
        let Some(tx) = self.senders.get(&signal.target) else {
            debug!("No subscription for {}, reset dropped", signal.target);
            return false;
        };
        tx.send(signal).is_ok()
    }

    /// Identities whose subscription is still alive
    pub fn subscriber_count(&self) -> usize {
        self.senders.values().filter(|tx| !tx.is_closed()).count()
    }
}

/// A surface's own reset queue
pub struct ResetSubscription {
    id: SurfaceId,
    rx: mpsc::UnboundedReceiver<ResetSignal>,
}

impl ResetSubscription {
    pub fn id(&self) -> &SurfaceId {
        &self.id
    }

    /// Next queued signal, without waiting
    pub fn try_next(&mut self) -> Option<ResetSignal> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next signal
    ///
    /// Returns `None` once the bus closed this queue.
    pub async fn recv(&mut self) -> Option<ResetSignal> {
        self.rx.recv().await
    }
}
