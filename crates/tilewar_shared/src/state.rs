//! Authoritative game state as broadcast by the server.
//!
//! A [`GameState`] is replaced wholesale on every snapshot. The client only
//! moves player positions locally between snapshots.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::constants::MATCH_DURATION_SECS;
use crate::map::Tile;
use crate::math::Vec2;

/// A connected user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned id, stable for the connection.
    pub id: i16,
    /// Display name.
    pub username: String,
}

/// Phase of a match.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Lobby, not enough players yet.
    #[default]
    WaitingForPlayers = 0,
    /// Match running.
    Playing = 1,
    /// Match finished, scores are final.
    GameOver = 2,
}

impl GamePhase {
    /// Converts a wire byte into a phase.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::WaitingForPlayers),
            1 => Some(Self::Playing),
            2 => Some(Self::GameOver),
            _ => None,
        }
    }
}

/// Match block of a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    /// RGB color of team A.
    pub team_a_color: i32,
    /// RGB color of team B.
    pub team_b_color: i32,
    /// Cells owned by team A.
    pub score_a: i32,
    /// Cells owned by team B.
    pub score_b: i32,
    /// Current phase.
    pub phase: GamePhase,
}

/// One player in a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Owning user.
    pub user: User,
    /// Team index (0 or 1).
    pub team: u8,
    /// X position in cells.
    pub x: f64,
    /// Y position in cells.
    pub y: f64,
    /// Horizontal direction flag (-1, 0, 1).
    pub vx: i32,
    /// Vertical direction flag (-1, 0, 1).
    pub vy: i32,
    /// Kind id of the weapon the player carries.
    pub weapon_kind: u8,
}

impl Player {
    /// Position of the top-left corner in cells.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Position of the centre of the player's cell.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + 0.5, self.y + 0.5)
    }

    /// Tile this player paints.
    #[inline]
    #[must_use]
    pub const fn team_tile(&self) -> Option<Tile> {
        Tile::for_team(self.team)
    }
}

/// Full authoritative snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// User id of the room host.
    pub host: i16,
    /// Room code.
    pub room: String,
    /// Whether the host started the match.
    pub started: bool,
    /// Match start in unix seconds, `None` when unset.
    pub started_at: Option<i32>,
    /// Colors, scores and phase.
    pub match_state: MatchState,
    /// Roster in server order.
    pub players: Vec<Player>,
}

impl GameState {
    /// Looks up a player by user id.
    #[must_use]
    pub fn player(&self, id: i16) -> Option<&Player> {
        self.players.iter().find(|p| p.user.id == id)
    }

    /// Username of a roster member.
    #[must_use]
    pub fn username(&self, id: i16) -> Option<&str> {
        self.player(id).map(|p| p.user.username.as_str())
    }

    /// Returns true if `id` is the room host.
    #[inline]
    #[must_use]
    pub const fn is_host(&self, id: i16) -> bool {
        self.host == id
    }

    /// Match start as a wall-clock time.
    #[must_use]
    pub fn started_at_time(&self) -> Option<SystemTime> {
        let secs = u64::try_from(self.started_at?).ok()?;
        UNIX_EPOCH.checked_add(Duration::from_secs(secs))
    }

    /// Time left in the match at `now`, `None` before the start time is set.
    #[must_use]
    pub fn time_left(&self, now: SystemTime) -> Option<Duration> {
        let elapsed = now.duration_since(self.started_at_time()?).unwrap_or_default();
        Some(Duration::from_secs(MATCH_DURATION_SECS).saturating_sub(elapsed))
    }

    /// Players on one team.
    pub fn team(&self, team: u8) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.team == team)
    }
}
