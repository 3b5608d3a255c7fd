//! # Client Session
//!
//! Everything the client knows about its room, owned in one place.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CLIENT SESSION                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  frames ──► decode ──► apply ──┬──► GameState / TileMap     │
//! │                                ├──► WeaponSet ──► effects   │
//! │                                └──► SessionEvent queue (UI) │
//! │                                                             │
//! │  tick ──► fire due effects ──► predict movement             │
//! │                                                             │
//! │  intents ──► targeting ──► encode ──► frames                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session never blocks and never touches the network. A driver feeds
//! it frames, intents and ticks in a deterministic order (see
//! [`crate::driver`]).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tilewar_shared::{GameState, TileMap, User, Vec2};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ProtocolError, ProtocolResult};
use crate::prediction::PredictionEngine;
use crate::protocol::{decode, Message, MessageSerializer, MoveDirection, SystemKind, WeaponFrame};
use crate::schedule::{DeferredEffect, DeferredQueue, DueEffect};
use crate::targeting::{AimGesture, TargetInfo, Targeting, Viewport};
use crate::weapon::{AimLine, Release, Trigger, WeaponKind, WeaponSet};

/// Something the UI should show.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// The server assigned our identity.
    Connected(User),
    /// A room was created or joined.
    RoomEntered {
        /// Room code.
        room: String,
        /// True if we created it.
        hosted: bool,
    },
    /// We left the room.
    RoomLeft,
    /// Chat line.
    Chat {
        /// Sender id.
        from: i16,
        /// Sender name, if they are in the roster.
        username: Option<String>,
        /// Text.
        message: String,
    },
    /// System notice.
    System {
        /// Subtype.
        kind: SystemKind,
        /// Text.
        message: String,
    },
    /// Error notice from the server.
    ServerError {
        /// Text.
        message: String,
    },
    /// A frame was rejected.
    ProtocolError(ProtocolError),
}

/// User input, already translated from device events.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    /// Create a room.
    Host,
    /// Join a room.
    Join {
        /// Room code.
        room: String,
    },
    /// Leave the room.
    Leave,
    /// Start the match.
    Start,
    /// Switch team.
    SwitchTeam,
    /// Paint the current cell.
    Shoot,
    /// Send a chat line.
    Chat {
        /// Text.
        text: String,
    },
    /// Direction key pressed or released.
    Move {
        /// Direction.
        direction: MoveDirection,
        /// True on press.
        start: bool,
    },
    /// Trigger pressed at a canvas position.
    PointerDown(Vec2),
    /// Pointer moved to a canvas position.
    PointerMove(Vec2),
    /// Trigger released at a canvas position.
    PointerUp(Vec2),
}

/// Client-side game context.
#[derive(Debug)]
pub struct ClientSession {
    config: ClientConfig,
    user: Option<User>,
    room: Option<String>,
    state: Option<GameState>,
    map: Option<TileMap>,
    weapons: WeaponSet,
    prediction: PredictionEngine,
    effects: DeferredQueue,
    aim: Option<AimGesture>,
    last_tick: Option<Instant>,
    events: VecDeque<SessionEvent>,
    serializer: MessageSerializer,
}

impl ClientSession {
    /// Creates a disconnected session.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            prediction: PredictionEngine::new(config.player_speed),
            config,
            user: None,
            room: None,
            state: None,
            map: None,
            weapons: WeaponSet::new(),
            effects: DeferredQueue::new(),
            aim: None,
            last_tick: None,
            events: VecDeque::new(),
            serializer: MessageSerializer::new(),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Our identity, once connected.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Current room code.
    #[must_use]
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Last snapshot with predicted positions.
    #[must_use]
    pub const fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    /// Current map.
    #[must_use]
    pub const fn map(&self) -> Option<&TileMap> {
        self.map.as_ref()
    }

    /// Weapons of the roster.
    #[must_use]
    pub const fn weapons(&self) -> &WeaponSet {
        &self.weapons
    }

    /// Pending deferred effects.
    #[must_use]
    pub const fn effects(&self) -> &DeferredQueue {
        &self.effects
    }

    /// Returns true while the local trigger is held.
    #[must_use]
    pub const fn is_aiming(&self) -> bool {
        self.aim.is_some()
    }

    /// Takes every queued UI event.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// Decodes and applies one frame.
    ///
    /// Errors are logged and queued as [`SessionEvent::ProtocolError`]
    /// before being returned; the session stays usable.
    ///
    /// # Errors
    ///
    /// Any decode or apply error of this frame.
    pub fn handle_frame(&mut self, frame: &[u8], now: Instant) -> ProtocolResult<()> {
        let result = match decode(frame) {
            Ok(Some(message)) => self.apply(message, now),
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            warn!(%err, len = frame.len(), "rejected frame");
            self.events.push_back(SessionEvent::ProtocolError(err.clone()));
        }
        result
    }

    /// Applies one decoded message.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::NotReceivable`] for client-to-server messages, or
    /// weapon dispatch errors.
    pub fn apply(&mut self, message: Message, now: Instant) -> ProtocolResult<()> {
        match message {
            Message::Connected { id, username } => {
                info!(id, %username, "connected");
                let user = User { id, username };
                self.user = Some(user.clone());
                self.events.push_back(SessionEvent::Connected(user));
            }
            Message::Hosted { room } => self.enter_room(room, true),
            Message::Joined { room } => self.enter_room(room, false),
            Message::Left => {
                info!(room = ?self.room, "left room");
                self.reset_room();
                self.events.push_back(SessionEvent::RoomLeft);
            }
            Message::Started | Message::Teamed | Message::Moved => {
                debug!(ty = ?message.message_type(), "acknowledged");
            }
            Message::Shot { x, y, tile } => match &mut self.map {
                Some(map) => {
                    if !map.set(i64::from(x), i64::from(y), tile) {
                        debug!(x, y, "shot outside the map");
                    }
                }
                None => debug!(x, y, "shot before map"),
            },
            Message::Chatted { from, message } => {
                let username = self
                    .state
                    .as_ref()
                    .and_then(|s| s.username(from))
                    .map(str::to_owned);
                self.events.push_back(SessionEvent::Chat {
                    from,
                    username,
                    message,
                });
            }
            Message::Map(map) => {
                debug!(width = map.width(), height = map.height(), "map received");
                self.map = Some(map);
            }
            Message::State(state) => self.apply_snapshot(state),
            Message::System { kind, message } => {
                self.events.push_back(SessionEvent::System { kind, message });
            }
            Message::Error { message } => {
                warn!(%message, "server error");
                self.events.push_back(SessionEvent::ServerError { message });
            }
            Message::WeaponPressed(frame) => {
                self.apply_weapon(Trigger::Pressed, &frame, now)?;
            }
            Message::WeaponUpdated(frame) => {
                self.apply_weapon(Trigger::Updated, &frame, now)?;
            }
            Message::WeaponReleased(frame) => {
                self.apply_weapon(Trigger::Released, &frame, now)?;
            }
            Message::Host
            | Message::Join { .. }
            | Message::Leave
            | Message::Start
            | Message::Team
            | Message::Move { .. }
            | Message::Shoot
            | Message::Chat { .. }
            | Message::WeaponDown { .. }
            | Message::WeaponUpdate { .. }
            | Message::WeaponUp { .. } => {
                return Err(ProtocolError::NotReceivable(message.message_type()));
            }
        }
        Ok(())
    }

    fn enter_room(&mut self, room: String, hosted: bool) {
        info!(%room, hosted, "entered room");
        self.room = Some(room.clone());
        self.events.push_back(SessionEvent::RoomEntered { room, hosted });
    }

    fn reset_room(&mut self) {
        self.room = None;
        self.state = None;
        self.map = None;
        self.weapons.clear();
        self.effects.clear();
        self.aim = None;
    }

    fn apply_snapshot(&mut self, state: GameState) {
        if self.state.is_none() {
            info!(room = %state.room, players = state.players.len(), "first snapshot");
        }

        for id in self.weapons.sync(&state) {
            let cancelled = self.effects.cancel_owner(id);
            debug!(player = id, cancelled, "weapon dropped");
        }

        if !state.started {
            self.aim = None;
        }
        self.state = Some(state);
        self.prediction.on_snapshot();
    }

    fn apply_weapon(&mut self, trigger: Trigger, frame: &WeaponFrame, now: Instant) -> ProtocolResult<()> {
        let Some(release) = self.weapons.dispatch(self.state.as_ref(), trigger, frame)? else {
            return Ok(());
        };
        self.schedule_release(frame.player_id, release, now)
    }

    fn schedule_release(&mut self, owner: i16, release: Release, now: Instant) -> ProtocolResult<()> {
        let grenade = self.config.grenade;
        // The clear goes in first so a rejected paint never pins the release.
        self.effects.schedule(
            now,
            grenade.release_display(),
            owner,
            DeferredEffect::ClearRelease {
                generation: release.generation,
            },
        );

        let player = self
            .state
            .as_ref()
            .and_then(|s| s.player(owner))
            .ok_or(ProtocolError::PlayerNotFound(owner))?;
        // Team is read at release time, not when the paint lands.
        let tile = player
            .team_tile()
            .ok_or(ProtocolError::InvalidTile(player.team.saturating_add(1)))?;

        let target = release.target.floor();
        if !(target.x.is_finite() && target.y.is_finite()) {
            debug!(player = owner, x = target.x, y = target.y, "release target not finite");
            return Ok(());
        }
        #[allow(clippy::cast_possible_truncation)]
        let paint = DeferredEffect::PaintTerrain {
            x: target.x as i64,
            y: target.y as i64,
            size: release.splash_size,
            tile,
        };
        self.effects.schedule(now, grenade.paint_delay(), owner, paint);
        Ok(())
    }

    /// Fires due effects, then advances prediction.
    pub fn tick(&mut self, now: Instant) {
        let dt = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);

        self.fire_due(now);

        if let Some(state) = self.state.as_mut() {
            self.prediction.advance(state, self.map.as_ref(), dt);
        }
    }

    /// Fires every effect due at `now` without touching prediction.
    ///
    /// Returns the number of effects fired.
    pub fn fire_due(&mut self, now: Instant) -> usize {
        let due = self.effects.drain_due(now);
        let fired = due.len();
        for effect in due {
            self.fire(effect);
        }
        fired
    }

    /// When the earliest pending effect is due.
    #[must_use]
    pub fn next_effect_due(&self) -> Option<Instant> {
        self.effects.next_due()
    }

    fn fire(&mut self, due: DueEffect) {
        match due.effect {
            DeferredEffect::PaintTerrain { x, y, size, tile } => match &mut self.map {
                Some(map) => {
                    let painted = map.paint_square(x, y, size, tile);
                    debug!(owner = due.owner, x, y, painted, "terrain painted");
                }
                None => debug!(owner = due.owner, "paint dropped, no map"),
            },
            DeferredEffect::ClearRelease { generation } => {
                let cleared = self.weapons.clear_release(due.owner, generation);
                debug!(owner = due.owner, generation, cleared, "release cleared");
            }
        }
    }

    /// Turns an intent into an outgoing frame.
    ///
    /// Returns `Ok(None)` for intents that send nothing, such as pointer
    /// input outside a running match. Errors are queued as
    /// [`SessionEvent::ProtocolError`] like frame errors.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::FieldTooLong`] for oversized room codes or chat lines.
    pub fn apply_intent(&mut self, intent: Intent, now: Instant) -> ProtocolResult<Option<Vec<u8>>> {
        let result = self.encode_intent(intent, now);
        if let Err(err) = &result {
            warn!(%err, "rejected intent");
            self.events.push_back(SessionEvent::ProtocolError(err.clone()));
        }
        result
    }

    fn encode_intent(&mut self, intent: Intent, now: Instant) -> ProtocolResult<Option<Vec<u8>>> {
        let message = match intent {
            Intent::Host => Message::Host,
            Intent::Join { room } => Message::Join { room },
            Intent::Leave => Message::Leave,
            Intent::Start => Message::Start,
            Intent::SwitchTeam => Message::Team,
            Intent::Shoot => Message::Shoot,
            Intent::Chat { text } => Message::Chat { message: text },
            Intent::Move { direction, start } => Message::Move { direction, start },
            Intent::PointerDown(pointer) => {
                let Some(kind) = self.local_weapon_kind() else {
                    return Ok(None);
                };
                // A second press keeps the original hold time.
                let gesture = self.aim.unwrap_or(AimGesture::start(now));
                let Some(target) = self.target_for(pointer, gesture, now) else {
                    return Ok(None);
                };
                self.aim = Some(gesture);
                Message::WeaponDown {
                    kind,
                    angle: target.angle,
                }
            }
            Intent::PointerMove(pointer) => {
                let (Some(kind), Some(gesture)) = (self.local_weapon_kind(), self.aim) else {
                    return Ok(None);
                };
                let Some(target) = self.target_for(pointer, gesture, now) else {
                    return Ok(None);
                };
                Message::WeaponUpdate {
                    kind,
                    angle: target.angle,
                }
            }
            Intent::PointerUp(pointer) => {
                let (Some(kind), Some(gesture)) = (self.local_weapon_kind(), self.aim.take()) else {
                    return Ok(None);
                };
                let (Some(target), Some(viewport)) =
                    (self.target_for(pointer, gesture, now), self.viewport())
                else {
                    return Ok(None);
                };
                let cell = viewport.canvas_to_cell(target.point());
                Message::WeaponUp {
                    kind,
                    x: cell.x,
                    y: cell.y,
                }
            }
        };

        Ok(Some(self.serializer.serialize(&message)?.to_vec()))
    }

    /// Weapon kind of the local player while the match runs with a map.
    fn local_weapon_kind(&self) -> Option<WeaponKind> {
        let state = self.state.as_ref().filter(|s| s.started)?;
        self.map.as_ref()?;
        let id = self.user.as_ref()?.id;
        match self.weapons.get(id) {
            Some(weapon) => Some(weapon.kind()),
            None => {
                debug!(id, "local player has no weapon");
                state.player(id).and_then(|p| WeaponKind::from_u8(p.weapon_kind))
            }
        }
    }

    /// Canvas geometry for the current map.
    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        let map = self.map.as_ref()?;
        Some(Viewport::new(self.config.viewport, map.width(), map.height()))
    }

    /// Canvas position of the local player's cell centre.
    #[must_use]
    pub fn local_screen_position(&self) -> Option<Vec2> {
        let id = self.user.as_ref()?.id;
        let player = self.state.as_ref()?.player(id)?;
        Some(self.viewport()?.cell_to_canvas(player.center()))
    }

    fn target_for(&self, pointer: Vec2, gesture: AimGesture, now: Instant) -> Option<TargetInfo> {
        let targeting = Targeting::new(self.viewport()?, self.config.aim);
        let player = self.local_screen_position()?;
        Some(targeting.compute(pointer, player, gesture.held(now)))
    }

    /// Live aim point of the local gesture, for drawing.
    #[must_use]
    pub fn aim_target(&self, pointer: Vec2, now: Instant) -> Option<TargetInfo> {
        self.target_for(pointer, self.aim?, now)
    }

    /// Weapon segments to draw this frame, in map cells.
    #[must_use]
    pub fn aim_lines(&self) -> Vec<(i16, AimLine)> {
        let Some(state) = self.state.as_ref() else {
            return Vec::new();
        };
        let length = self.config.aim.line_length;
        state
            .players
            .iter()
            .filter_map(|p| {
                let line = self.weapons.get(p.user.id)?.aim_line(p, length)?;
                Some((p.user.id, line))
            })
            .collect()
    }
}
