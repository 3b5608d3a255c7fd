//! Grenade: aim with a held pointer, release to paint a 3x3 square.
//!
//! ```text
//!          pressed            released
//!   Idle ──────────► Aiming ──────────► Released ──┐
//!    ▲                │  ▲                          │
//!    │                └──┘ updated                  │
//!    └───────────────── clear (after display time) ─┘
//! ```

use tilewar_shared::{Player, Vec2};
use tracing::debug;

use super::{read_payload, AimLine, Release};
use crate::error::ProtocolResult;

/// Payload length of pressed and updated bodies (one f64 angle).
pub const ANGLE_PAYLOAD_LEN: usize = 8;

/// Payload length of released bodies (two f64 coordinates).
pub const TARGET_PAYLOAD_LEN: usize = 16;

/// Side of the painted square in cells.
pub const SPLASH_SIZE: u32 = 3;

/// Visible state of a grenade.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GrenadeState {
    /// Nothing to draw.
    #[default]
    Idle,
    /// Trigger held.
    Aiming {
        /// Aim angle in radians, pointing from the target towards the player.
        angle: f64,
    },
    /// Thrown, shown until its clear effect fires.
    Released {
        /// Landing point in cells.
        target: Vec2,
        /// Release counter value that scheduled the clear.
        generation: u64,
    },
}

/// Per-player grenade.
#[derive(Clone, Debug, Default)]
pub struct Grenade {
    state: GrenadeState,
    releases: u64,
}

impl Grenade {
    /// Creates an idle grenade.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> GrenadeState {
        self.state
    }

    /// Trigger pressed: starts aiming.
    ///
    /// # Errors
    ///
    /// Fails if the body is not a length byte of 8 followed by an f64.
    pub fn handle_pressed(&mut self, body: &[u8]) -> ProtocolResult<()> {
        let mut payload = read_payload(body, ANGLE_PAYLOAD_LEN)?;
        let angle = payload.read_f64()?;
        self.state = GrenadeState::Aiming { angle };
        debug!(angle, "grenade aiming");
        Ok(())
    }

    /// Aim changed. Ignored unless aiming.
    ///
    /// # Errors
    ///
    /// Fails if the body is not a length byte of 8 followed by an f64.
    pub fn handle_updated(&mut self, body: &[u8]) -> ProtocolResult<()> {
        let mut payload = read_payload(body, ANGLE_PAYLOAD_LEN)?;
        let new_angle = payload.read_f64()?;
        match &mut self.state {
            GrenadeState::Aiming { angle } => *angle = new_angle,
            other => debug!(state = ?other, "ignoring grenade update while not aiming"),
        }
        Ok(())
    }

    /// Trigger released at a target.
    ///
    /// # Errors
    ///
    /// Fails if the body is not a length byte of 16 followed by two f64s.
    pub fn handle_released(&mut self, body: &[u8]) -> ProtocolResult<Release> {
        let mut payload = read_payload(body, TARGET_PAYLOAD_LEN)?;
        let x = payload.read_f64()?;
        let y = payload.read_f64()?;
        let target = Vec2::new(x, y);

        self.releases += 1;
        self.state = GrenadeState::Released {
            target,
            generation: self.releases,
        };
        debug!(x, y, generation = self.releases, "grenade released");

        Ok(Release {
            target,
            generation: self.releases,
            splash_size: SPLASH_SIZE,
        })
    }

    /// Returns to idle if still showing the release `generation`.
    pub fn clear_release(&mut self, generation: u64) -> bool {
        match self.state {
            GrenadeState::Released { generation: g, .. } if g == generation => {
                self.state = GrenadeState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Segment to draw for `player`, in cells.
    #[must_use]
    pub fn aim_line(&self, player: &Player, line_length: f64) -> Option<AimLine> {
        let from = player.center();
        let to = match self.state {
            GrenadeState::Idle => return None,
            GrenadeState::Aiming { angle } => {
                Vec2::new(from.x - line_length * angle.cos(), from.y - line_length * angle.sin())
            }
            GrenadeState::Released { target, .. } => target,
        };
        Some(AimLine { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;

    fn angle_body(angle: f64) -> Vec<u8> {
        let mut body = vec![8];
        body.extend_from_slice(&angle.to_le_bytes());
        body
    }

    fn target_body(x: f64, y: f64) -> Vec<u8> {
        let mut body = vec![16];
        body.extend_from_slice(&x.to_le_bytes());
        body.extend_from_slice(&y.to_le_bytes());
        body
    }

    #[test]
    fn test_press_update_release() {
        let mut grenade = Grenade::new();

        grenade.handle_pressed(&angle_body(0.5)).unwrap();
        assert_eq!(grenade.state(), GrenadeState::Aiming { angle: 0.5 });

        grenade.handle_updated(&angle_body(1.0)).unwrap();
        assert_eq!(grenade.state(), GrenadeState::Aiming { angle: 1.0 });

        let release = grenade.handle_released(&target_body(4.2, 7.9)).unwrap();
        assert_eq!(release.generation, 1);
        assert_eq!(release.splash_size, 3);
        assert!(matches!(grenade.state(), GrenadeState::Released { .. }));
    }

    #[test]
    fn test_update_while_idle_is_ignored() {
        let mut grenade = Grenade::new();
        grenade.handle_updated(&angle_body(1.0)).unwrap();
        assert_eq!(grenade.state(), GrenadeState::Idle);
    }

    #[test]
    fn test_wrong_length_byte() {
        let mut grenade = Grenade::new();
        let mut body = angle_body(1.0);
        body[0] = 9;

        assert_eq!(
            grenade.handle_pressed(&body).unwrap_err(),
            ProtocolError::InvalidLength {
                expected: 8,
                actual: 9
            }
        );
        assert_eq!(
            grenade.handle_released(&angle_body(1.0)).unwrap_err(),
            ProtocolError::InvalidLength {
                expected: 16,
                actual: 8
            }
        );
    }

    #[test]
    fn test_short_payload() {
        let mut grenade = Grenade::new();
        let body = [8, 0, 0, 0];
        assert_eq!(
            grenade.handle_pressed(&body).unwrap_err(),
            ProtocolError::truncated(8, 3)
        );
    }

    #[test]
    fn test_stale_clear_keeps_newer_release() {
        let mut grenade = Grenade::new();
        let first = grenade.handle_released(&target_body(1.0, 1.0)).unwrap();
        let second = grenade.handle_released(&target_body(2.0, 2.0)).unwrap();

        assert!(!grenade.clear_release(first.generation));
        assert!(matches!(grenade.state(), GrenadeState::Released { .. }));
        assert!(grenade.clear_release(second.generation));
        assert_eq!(grenade.state(), GrenadeState::Idle);
    }

    #[test]
    fn test_aim_line_geometry() {
        let player = Player {
            x: 2.0,
            y: 3.0,
            ..Default::default()
        };
        let mut grenade = Grenade::new();
        assert!(grenade.aim_line(&player, 0.4).is_none());

        grenade.handle_pressed(&angle_body(0.0)).unwrap();
        let line = grenade.aim_line(&player, 0.4).unwrap();
        assert_eq!(line.from, Vec2::new(2.5, 3.5));
        assert!((line.to.x - 2.1).abs() < 1e-9);
        assert!((line.to.y - 3.5).abs() < 1e-9);

        grenade.handle_released(&target_body(6.0, 1.0)).unwrap();
        let line = grenade.aim_line(&player, 0.4).unwrap();
        assert_eq!(line.to, Vec2::new(6.0, 1.0));
    }
}
