//! # Weapon Extension
//!
//! Weapon sub-messages layered on top of the base protocol.
//!
//! The codec splits a weapon frame into kind, player id and body
//! ([`WeaponFrame`]). This module routes the body to the weapon cached for
//! that player and lets the weapon interpret it.
//!
//! ```text
//! body: ┌─────────┬──────────────────────┐
//!       │ len (1) │ payload (len bytes)  │
//!       └─────────┴──────────────────────┘
//! ```
//!
//! Weapons are keyed by user id, so roster reordering between snapshots
//! never hands a weapon to the wrong player.

mod grenade;

use std::collections::HashMap;

use tilewar_shared::{GameState, Player, Vec2};
use tracing::{debug, warn};

pub use grenade::{Grenade, GrenadeState, SPLASH_SIZE};

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::{MessageDeserializer, WeaponFrame};

/// Weapon kinds known to this client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WeaponKind {
    /// Thrown splash painter.
    Grenade = 0,
}

impl WeaponKind {
    /// Converts a kind id into a weapon kind.
    #[must_use]
    pub const fn from_u8(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Grenade),
            _ => None,
        }
    }

    /// Kind id on the wire.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }
}

/// Which weapon sub-message is being applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Trigger pressed.
    Pressed,
    /// Aim changed.
    Updated,
    /// Trigger released.
    Released,
}

/// A completed throw. The session turns it into deferred effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Release {
    /// Landing point in cells.
    pub target: Vec2,
    /// Release counter of the weapon, used to clear only this release.
    pub generation: u64,
    /// Side of the painted square in cells.
    pub splash_size: u32,
}

/// Segment the renderer draws for a weapon, in map cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AimLine {
    /// Start, the centre of the player's cell.
    pub from: Vec2,
    /// End.
    pub to: Vec2,
}

/// A weapon instance, dispatched by kind.
#[derive(Clone, Debug)]
pub enum Weapon {
    /// See [`Grenade`].
    Grenade(Grenade),
}

impl Weapon {
    /// Creates an idle weapon of `kind`.
    #[must_use]
    pub fn new(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Grenade => Self::Grenade(Grenade::new()),
        }
    }

    /// Creates an idle weapon from a kind id.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnknownWeaponKind`] for ids without an implementation.
    pub fn from_kind_id(id: u8) -> ProtocolResult<Self> {
        WeaponKind::from_u8(id)
            .map(Self::new)
            .ok_or(ProtocolError::UnknownWeaponKind(id))
    }

    /// Kind of this weapon.
    #[must_use]
    pub const fn kind(&self) -> WeaponKind {
        match self {
            Self::Grenade(_) => WeaponKind::Grenade,
        }
    }

    /// Applies one weapon sub-message body.
    ///
    /// # Errors
    ///
    /// Layout errors of the body.
    pub fn handle(&mut self, trigger: Trigger, body: &[u8]) -> ProtocolResult<Option<Release>> {
        match self {
            Self::Grenade(g) => match trigger {
                Trigger::Pressed => g.handle_pressed(body).map(|()| None),
                Trigger::Updated => g.handle_updated(body).map(|()| None),
                Trigger::Released => g.handle_released(body).map(Some),
            },
        }
    }

    /// Ends the visible release `generation`, if it is still showing.
    pub fn clear_release(&mut self, generation: u64) -> bool {
        match self {
            Self::Grenade(g) => g.clear_release(generation),
        }
    }

    /// Returns true if there is nothing to draw.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        match self {
            Self::Grenade(g) => g.state() == GrenadeState::Idle,
        }
    }

    /// Segment to draw for the owning player, `None` when idle.
    #[must_use]
    pub fn aim_line(&self, player: &Player, line_length: f64) -> Option<AimLine> {
        match self {
            Self::Grenade(g) => g.aim_line(player, line_length),
        }
    }
}

/// Checks the length byte of a weapon body and returns a reader over the payload.
pub(crate) fn read_payload(body: &[u8], expected: usize) -> ProtocolResult<MessageDeserializer<'_>> {
    let mut reader = MessageDeserializer::new(body);
    let declared = usize::from(reader.read_u8()?);
    if declared != expected {
        return Err(ProtocolError::InvalidLength {
            expected,
            actual: declared,
        });
    }
    if reader.remaining() < expected {
        return Err(ProtocolError::truncated(expected, reader.remaining()));
    }
    Ok(reader)
}

/// Weapons of every player in the roster, keyed by user id.
#[derive(Clone, Debug, Default)]
pub struct WeaponSet {
    weapons: HashMap<i16, Weapon>,
}

impl WeaponSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached weapons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    /// Returns true if no weapon is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Weapon of a player.
    #[must_use]
    pub fn get(&self, player_id: i16) -> Option<&Weapon> {
        self.weapons.get(&player_id)
    }

    /// Aligns the set with a new roster.
    ///
    /// Creates weapons for new ids from the snapshot's kind byte, keeps the
    /// weapons of ids already present and drops the rest. Returns the ids
    /// whose weapons were dropped.
    pub fn sync(&mut self, state: &GameState) -> Vec<i16> {
        let mut removed: Vec<i16> = self
            .weapons
            .keys()
            .copied()
            .filter(|&id| state.player(id).is_none())
            .collect();
        removed.sort_unstable();
        for id in &removed {
            self.weapons.remove(id);
        }

        for player in &state.players {
            let id = player.user.id;
            if self.weapons.contains_key(&id) {
                continue;
            }
            match Weapon::from_kind_id(player.weapon_kind) {
                Ok(weapon) => {
                    debug!(player = id, kind = ?weapon.kind(), "weapon created");
                    self.weapons.insert(id, weapon);
                }
                Err(err) => warn!(player = id, %err, "player carries no usable weapon"),
            }
        }

        removed
    }

    /// Routes a weapon frame to the acting player's weapon.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::NoSnapshot`] before the first snapshot
    /// - [`ProtocolError::PlayerNotFound`] if the id is not in the roster
    /// - [`ProtocolError::UnknownWeaponKind`] if the player has no weapon
    /// - [`ProtocolError::WeaponKindMismatch`] if the frame is for another kind
    /// - layout errors of the body
    pub fn dispatch(
        &mut self,
        state: Option<&GameState>,
        trigger: Trigger,
        frame: &WeaponFrame,
    ) -> ProtocolResult<Option<Release>> {
        let state = state.ok_or(ProtocolError::NoSnapshot)?;
        let player = state
            .player(frame.player_id)
            .ok_or(ProtocolError::PlayerNotFound(frame.player_id))?;
        let weapon = self
            .weapons
            .get_mut(&frame.player_id)
            .ok_or(ProtocolError::UnknownWeaponKind(player.weapon_kind))?;

        let kind = weapon.kind().id();
        if kind != frame.kind {
            return Err(ProtocolError::WeaponKindMismatch {
                expected: kind,
                actual: frame.kind,
            });
        }

        weapon.handle(trigger, &frame.body)
    }

    /// Ends a release if the weapon still exists and still shows it.
    pub fn clear_release(&mut self, player_id: i16, generation: u64) -> bool {
        self.weapons
            .get_mut(&player_id)
            .is_some_and(|w| w.clear_release(generation))
    }

    /// Drops every weapon.
    pub fn clear(&mut self) {
        self.weapons.clear();
    }

    /// Iterates over `(player id, weapon)`.
    pub fn iter(&self) -> impl Iterator<Item = (i16, &Weapon)> {
        self.weapons.iter().map(|(&id, w)| (id, w))
    }
}
