//! # Tilewar Shared
//!
//! Game data used by both the client core and the server.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - an async runtime
//! - a logging backend
//! - anything that knows about sockets
//!
//! If you need wire formats, put them in `tilewar_networking`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod map;
pub mod math;
pub mod state;

pub use constants::{
    MAP_HEIGHT, MAP_WIDTH, MATCH_DURATION_SECS, MAX_SHORT_STRING_LEN, PLAYER_SPEED, ROOM_CODE_LEN,
    TEAM_A_COLOR, TEAM_B_COLOR,
};
pub use map::{Surroundings, Tile, TileMap};
pub use math::Vec2;
pub use state::{GamePhase, GameState, MatchState, Player, User};
