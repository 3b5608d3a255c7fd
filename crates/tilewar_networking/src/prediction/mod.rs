//! # Client-Side Prediction
//!
//! Moves players locally between authoritative snapshots.
//!
//! ## How It Works
//!
//! 1. Server sends a snapshot, the client replaces its state wholesale
//! 2. The next tick is skipped (the snapshot already contains that motion)
//! 3. Every following tick integrates each player's direction flags and
//!    resolves collisions against the last known map
//!
//! ```text
//! Snapshot:   [S1]────────────────[S2]──────────
//!              │                   │
//! Ticks:      skip [P][P][P][P]   skip [P][P]
//! ```
//!
//! ## Collision
//!
//! A player occupies a unit square whose top-left corner is `(x, y)`. After
//! integrating, the four cells under the candidate square are checked and
//! the moving axis is snapped back to the cell edge when it would enter a
//! wall. Out-of-map cells are walls.

use std::time::Duration;

use tilewar_shared::{GameState, Player, Surroundings, Tile, TileMap, Vec2};
use tracing::trace;

/// Local movement integrator.
#[derive(Clone, Debug)]
pub struct PredictionEngine {
    /// Movement speed in cells per second.
    speed: f64,
    /// Set by a snapshot, cleared by the next tick.
    resynced: bool,
}

impl PredictionEngine {
    /// Creates an engine moving players at `speed` cells per second.
    #[must_use]
    pub const fn new(speed: f64) -> Self {
        Self {
            speed,
            resynced: false,
        }
    }

    /// Movement speed in cells per second.
    #[inline]
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Marks that an authoritative snapshot just replaced the state.
    #[inline]
    pub fn on_snapshot(&mut self) {
        self.resynced = true;
    }

    /// Returns true if the next tick will be skipped.
    #[inline]
    #[must_use]
    pub const fn is_resynced(&self) -> bool {
        self.resynced
    }

    /// Advances every player by `dt`.
    ///
    /// Does nothing before the match starts or without a map, and skips
    /// exactly one tick after each snapshot. Returns true if players moved.
    pub fn advance(&mut self, state: &mut GameState, map: Option<&TileMap>, dt: Duration) -> bool {
        if std::mem::take(&mut self.resynced) {
            trace!("skipping prediction after snapshot");
            return false;
        }
        let Some(map) = map else {
            return false;
        };
        if !state.started {
            return false;
        }

        let dt = dt.as_secs_f64();
        for player in &mut state.players {
            let next = step_player(player, map, dt, self.speed);
            player.x = next.x;
            player.y = next.y;
        }
        true
    }
}

/// Computes where one player ends up after `dt` seconds.
#[must_use]
pub fn step_player(player: &Player, map: &TileMap, dt: f64, speed: f64) -> Vec2 {
    let mut x = player.x + f64::from(player.vx) * dt * speed;
    let mut y = player.y + f64::from(player.vy) * dt * speed;

    #[allow(clippy::cast_possible_truncation)]
    let Surroundings {
        tile,
        bottom,
        right,
        bottom_right,
    } = map.get_around(x.floor() as i64, y.floor() as i64);

    // Fractional parts mean the square straddles two rows or columns.
    let corner_x = x - x.floor() > 0.0;
    let corner_y = y - y.floor() > 0.0;

    if player.vx > 0 && (right == Tile::Wall || (corner_y && bottom_right == Tile::Wall)) {
        x = x.floor();
    }
    if player.vx < 0 && (tile == Tile::Wall || (corner_y && bottom == Tile::Wall)) {
        x = x.ceil();
    }
    if player.vy > 0 && (bottom == Tile::Wall || (corner_x && bottom_right == Tile::Wall)) {
        y = y.floor();
    }
    if player.vy < 0 && (tile == Tile::Wall || (corner_x && right == Tile::Wall)) {
        y = y.ceil();
    }

    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewar_shared::User;

    fn moving(x: f64, y: f64, vx: i32, vy: i32) -> Player {
        Player {
            user: User {
                id: 1,
                username: "p".into(),
            },
            x,
            y,
            vx,
            vy,
            ..Default::default()
        }
    }

    fn started(players: Vec<Player>) -> GameState {
        GameState {
            started: true,
            players,
            ..Default::default()
        }
    }

    #[test]
    fn test_free_movement() {
        let map = TileMap::new(10, 10);
        let next = step_player(&moving(2.0, 2.0, 1, 0), &map, 0.05, 10.0);
        assert!((next.x - 2.5).abs() < 1e-9);
        assert!((next.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_right_into_wall() {
        let mut map = TileMap::new(10, 10);
        map.set(6, 5, Tile::Wall);

        let next = step_player(&moving(4.5, 5.0, 1, 0), &map, 0.1, 10.0);
        assert!((next.x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_left_into_wall() {
        let mut map = TileMap::new(10, 10);
        map.set(2, 3, Tile::Wall);

        let next = step_player(&moving(3.2, 3.0, -1, 0), &map, 0.05, 10.0);
        assert!((next.x - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_down_with_corner() {
        let mut map = TileMap::new(10, 10);
        // Square straddles columns 4 and 5; only the right column is blocked.
        map.set(5, 7, Tile::Wall);

        let next = step_player(&moving(4.5, 5.8, 0, 1), &map, 0.05, 10.0);
        assert!((next.y - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_up_at_map_edge() {
        let map = TileMap::new(10, 10);
        let next = step_player(&moving(3.0, 0.2, 0, -1), &map, 0.05, 10.0);
        assert!((next.y - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_skips_one_tick_after_snapshot() {
        let map = TileMap::new(10, 10);
        let mut state = started(vec![moving(1.0, 1.0, 1, 0)]);
        let mut engine = PredictionEngine::new(10.0);

        engine.on_snapshot();
        assert!(engine.is_resynced());
        assert!(!engine.advance(&mut state, Some(&map), Duration::from_millis(50)));
        assert!(!engine.is_resynced());
        assert!((state.players[0].x - 1.0).abs() < f64::EPSILON);

        assert!(engine.advance(&mut state, Some(&map), Duration::from_millis(50)));
        assert!((state.players[0].x - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_idle_without_map_or_start() {
        let map = TileMap::new(10, 10);
        let mut engine = PredictionEngine::new(10.0);

        let mut state = started(vec![moving(1.0, 1.0, 1, 0)]);
        assert!(!engine.advance(&mut state, None, Duration::from_millis(50)));

        state.started = false;
        assert!(!engine.advance(&mut state, Some(&map), Duration::from_millis(50)));
        assert!((state.players[0].x - 1.0).abs() < f64::EPSILON);
    }
}
