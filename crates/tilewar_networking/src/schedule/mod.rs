//! # Deferred Effects
//!
//! One-shot effects that must happen a fixed time after a message, such as
//! the grenade splash 100 ms after release.
//!
//! Effects are plain data owned by the queue. The session drains due
//! effects from its tick and applies them to the state it owns, so an effect
//! can never outlive or alias the state it mutates. Effects belong to a
//! player; removing the player cancels them.

use std::time::{Duration, Instant};

use tilewar_shared::Tile;

/// Handle of a scheduled effect.
pub type EffectId = u64;

/// Work to perform when an effect comes due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredEffect {
    /// Paint a square of the map.
    PaintTerrain {
        /// Centre cell x.
        x: i64,
        /// Centre cell y.
        y: i64,
        /// Side of the square in cells.
        size: u32,
        /// Tile to write.
        tile: Tile,
    },
    /// End the visible release of the owner's weapon.
    ClearRelease {
        /// Release counter the clear belongs to.
        generation: u64,
    },
}

/// An effect that came due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DueEffect {
    /// Handle returned by [`DeferredQueue::schedule`].
    pub id: EffectId,
    /// Player the effect belongs to.
    pub owner: i16,
    /// What to do.
    pub effect: DeferredEffect,
}

#[derive(Clone, Debug)]
struct PendingEffect {
    id: EffectId,
    owner: i16,
    due: Instant,
    effect: DeferredEffect,
}

/// Queue of pending one-shot effects.
#[derive(Clone, Debug, Default)]
pub struct DeferredQueue {
    pending: Vec<PendingEffect>,
    next_id: EffectId,
}

impl DeferredQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedules `effect` to run `delay` after `now`.
    pub fn schedule(
        &mut self,
        now: Instant,
        delay: Duration,
        owner: i16,
        effect: DeferredEffect,
    ) -> EffectId {
        let id = self.next_id;
        self.next_id += 1;

        self.pending.push(PendingEffect {
            id,
            owner,
            due: now + delay,
            effect,
        });

        id
    }

    /// Cancels one effect. Returns false if it already ran or never existed.
    pub fn cancel(&mut self, id: EffectId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Cancels every effect of a player. Returns how many were dropped.
    pub fn cancel_owner(&mut self, owner: i16) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.owner != owner);
        before - self.pending.len()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Earliest due time, if anything is pending.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }

    /// Removes and returns every effect due at `now`, oldest first.
    ///
    /// Each effect is returned exactly once.
    pub fn drain_due(&mut self, now: Instant) -> Vec<DueEffect> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = pending;

        due.sort_by_key(|p| (p.due, p.id));
        due.into_iter()
            .map(|p| DueEffect {
                id: p.id,
                owner: p.owner,
                effect: p.effect,
            })
            .collect()
    }
}
