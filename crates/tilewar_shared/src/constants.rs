//! # Game Constants
//!
//! Values both ends of the wire agree on.
//!
//! **CRITICAL:** Changing any of these breaks compatibility with deployed servers.

// =============================================================================
// PROTOCOL LIMITS
// =============================================================================

/// Room codes are exactly this many bytes on the wire.
pub const ROOM_CODE_LEN: usize = 4;

/// Longest string that fits behind a one-byte length prefix.
pub const MAX_SHORT_STRING_LEN: usize = u8::MAX as usize;

// =============================================================================
// SIMULATION
// =============================================================================

/// Player movement speed in cells per second.
pub const PLAYER_SPEED: f64 = 10.0;

/// Default map width in cells.
pub const MAP_WIDTH: usize = 48;

/// Default map height in cells.
pub const MAP_HEIGHT: usize = 27;

/// Length of a match in seconds.
pub const MATCH_DURATION_SECS: u64 = 60;

// =============================================================================
// TEAMS
// =============================================================================

/// Default RGB color of team A.
pub const TEAM_A_COLOR: i32 = 0x006C_946F;

/// Default RGB color of team B.
pub const TEAM_B_COLOR: i32 = 0x00DC_0083;
