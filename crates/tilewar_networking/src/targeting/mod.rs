//! # Targeting
//!
//! Turns a pointer position into a weapon target.
//!
//! ## Canvas Layout
//!
//! ```text
//! (0,0) ┌─────────────────────────────────────┐
//!       │ margin                              │
//!       │      (left,top) ┌─────────────────┐ │
//!       │                 │      map        │ │
//!       │                 │                 │ │
//!       └─────────────────┴─────────────────┘ (width,height)
//! ```
//!
//! The map fills the canvas minus a margin on the left and top. All
//! targeting math runs in canvas pixels; the result is converted to map
//! cells only when it goes on the wire.
//!
//! ## Clamping
//!
//! 1. Range: the target may be at most `range` pixels from the player. The
//!    range grows while the trigger is held, up to a cap.
//! 2. Map edge: a target outside the map is pulled back along the line to
//!    the player until it sits on the map boundary.

use std::time::{Duration, Instant};

use tilewar_shared::Vec2;

use crate::config::{AimConfig, ViewportConfig};

/// Map rectangle on the canvas, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapBounds {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
}

impl MapBounds {
    /// Returns true if `p` lies inside or on the rectangle.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        (self.left..=self.right).contains(&p.x) && (self.top..=self.bottom).contains(&p.y)
    }

    fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.left, self.right), p.y.clamp(self.top, self.bottom))
    }
}

/// Canvas geometry for a map of a given size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    config: ViewportConfig,
    map_width: f64,
    map_height: f64,
}

impl Viewport {
    /// Binds the canvas to a map of `map_width` x `map_height` cells.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(config: ViewportConfig, map_width: usize, map_height: usize) -> Self {
        Self {
            config,
            map_width: map_width.max(1) as f64,
            map_height: map_height.max(1) as f64,
        }
    }

    /// Map rectangle on the canvas.
    #[must_use]
    pub fn bounds(&self) -> MapBounds {
        MapBounds {
            left: self.config.canvas_width * self.config.margin,
            top: self.config.canvas_height * self.config.margin,
            right: self.config.canvas_width,
            bottom: self.config.canvas_height,
        }
    }

    /// Pixels per cell along each axis.
    #[must_use]
    pub fn cell_extent(&self) -> Vec2 {
        let scale = 1.0 - self.config.margin;
        Vec2::new(
            self.config.canvas_width * scale / self.map_width,
            self.config.canvas_height * scale / self.map_height,
        )
    }

    /// Mean cell side in pixels, the unit of aim range.
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        let extent = self.cell_extent();
        (extent.x + extent.y) / 2.0
    }

    /// Canvas pixel to map cell coordinates.
    #[must_use]
    pub fn canvas_to_cell(&self, p: Vec2) -> Vec2 {
        let b = self.bounds();
        let extent = self.cell_extent();
        Vec2::new((p.x - b.left) / extent.x, (p.y - b.top) / extent.y)
    }

    /// Map cell coordinates to canvas pixel.
    #[must_use]
    pub fn cell_to_canvas(&self, c: Vec2) -> Vec2 {
        let b = self.bounds();
        let extent = self.cell_extent();
        Vec2::new(c.x * extent.x + b.left, c.y * extent.y + b.top)
    }
}

/// A computed aim point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetInfo {
    /// Target x in canvas pixels.
    pub x: f64,
    /// Target y in canvas pixels.
    pub y: f64,
    /// Angle of the vector from the pointer to the player, in radians.
    pub angle: f64,
}

impl TargetInfo {
    /// Target as a point.
    #[inline]
    #[must_use]
    pub const fn point(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Press-hold-release sequence of the local weapon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AimGesture {
    started_at: Instant,
}

impl AimGesture {
    /// Starts a gesture at `now`.
    #[must_use]
    pub const fn start(now: Instant) -> Self {
        Self { started_at: now }
    }

    /// Time the trigger has been held.
    #[must_use]
    pub fn held(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }
}

/// Range and map-edge clamping of aim points.
#[derive(Clone, Copy, Debug)]
pub struct Targeting {
    viewport: Viewport,
    aim: AimConfig,
}

impl Targeting {
    /// Creates a targeting helper for one viewport.
    #[must_use]
    pub const fn new(viewport: Viewport, aim: AimConfig) -> Self {
        Self { viewport, aim }
    }

    /// Viewport in use.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Aim range in pixels after holding for `held`.
    #[must_use]
    pub fn range(&self, held: Duration) -> f64 {
        let cell = self.viewport.cell_size();
        let grown = self.aim.range_growth_cells * cell * held.as_secs_f64()
            + self.aim.base_range_cells * cell;
        grown.min(self.aim.max_range_cells * cell)
    }

    /// Computes the target for a pointer position.
    ///
    /// `pointer` and `player` are canvas pixels. Never fails: every input is
    /// clamped into range and onto the map.
    #[must_use]
    pub fn compute(&self, pointer: Vec2, player: Vec2, held: Duration) -> TargetInfo {
        let range = self.range(held);
        // Operands are reversed: the angle points from the pointer back to the player.
        let angle = (player.y - pointer.y).atan2(player.x - pointer.x);

        let mut target = pointer;
        if player.distance(pointer) > range {
            target = Vec2::new(
                player.x - range * angle.cos(),
                player.y - range * angle.sin(),
            );
        }

        let target = project_into_map(target, player, &self.viewport.bounds());
        TargetInfo {
            x: target.x,
            y: target.y,
            angle,
        }
    }
}

/// Pulls `target` back along the line from `player` onto the map boundary.
///
/// Vertical edges are tried first; the horizontal edges are the fallback.
#[must_use]
pub fn project_into_map(target: Vec2, player: Vec2, bounds: &MapBounds) -> Vec2 {
    let mut p = target;

    let vertical = if p.x < bounds.left {
        Some(bounds.left)
    } else if p.x > bounds.right {
        Some(bounds.right)
    } else {
        None
    };
    if let Some(edge) = vertical {
        let y = along_line(player.y, player.x, p.y, p.x, edge);
        p = Vec2::new(edge, y);
        if (bounds.top..=bounds.bottom).contains(&y) {
            return p;
        }
    }

    let horizontal = if p.y < bounds.top {
        Some(bounds.top)
    } else if p.y > bounds.bottom {
        Some(bounds.bottom)
    } else {
        None
    };
    if let Some(edge) = horizontal {
        let x = along_line(player.x, player.y, p.x, p.y, edge);
        p = Vec2::new(x, edge);
    }

    // Only matters when the player itself is off the map.
    bounds.clamp(p)
}

/// Value of the dependent coordinate where the line from `origin` to `point`
/// crosses `edge` on the independent axis.
fn along_line(origin_dep: f64, origin_ind: f64, point_dep: f64, point_ind: f64, edge: f64) -> f64 {
    let span = point_ind - origin_ind;
    if span.abs() < f64::EPSILON {
        return point_dep;
    }
    origin_dep + (point_dep - origin_dep) * ((edge - origin_ind) / span)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn targeting() -> Targeting {
        let viewport = Viewport::new(ViewportConfig::default(), 48, 27);
        Targeting::new(viewport, AimConfig::default())
    }

    #[test]
    fn test_cell_geometry() {
        let viewport = Viewport::new(ViewportConfig::default(), 48, 27);
        assert!((viewport.cell_size() - 30.0).abs() < EPS);

        let canvas = viewport.cell_to_canvas(Vec2::new(2.5, 3.5));
        assert!((canvas.x - 235.0).abs() < EPS);
        assert!((canvas.y - 195.0).abs() < EPS);

        let back = viewport.canvas_to_cell(canvas);
        assert!((back.x - 2.5).abs() < EPS);
        assert!((back.y - 3.5).abs() < EPS);
    }

    #[test]
    fn test_range_grows_then_caps() {
        let t = targeting();
        assert!((t.range(Duration::ZERO) - 60.0).abs() < EPS);
        assert!((t.range(Duration::from_secs(1)) - 90.0).abs() < EPS);
        assert!((t.range(Duration::from_secs(30)) - 150.0).abs() < EPS);
    }

    #[test]
    fn test_clamped_to_max_range() {
        let t = targeting();
        let player = Vec2::new(800.0, 450.0);

        for pointer in [
            Vec2::new(1500.0, 450.0),
            Vec2::new(300.0, 200.0),
            Vec2::new(900.0, 880.0),
        ] {
            let info = t.compute(pointer, player, Duration::from_secs(10));
            assert!((player.distance(info.point()) - 150.0).abs() < EPS);

            // Same direction as the raw pointer.
            let expected = (player.y - pointer.y).atan2(player.x - pointer.x);
            assert!((info.angle - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_inside_range_is_unchanged() {
        let t = targeting();
        let player = Vec2::new(800.0, 450.0);
        let info = t.compute(Vec2::new(820.0, 460.0), player, Duration::ZERO);
        assert!((info.x - 820.0).abs() < EPS);
        assert!((info.y - 460.0).abs() < EPS);
    }

    #[test]
    fn test_projects_onto_left_edge() {
        let t = targeting();
        let info = t.compute(Vec2::new(0.0, 300.0), Vec2::new(200.0, 450.0), Duration::from_secs(10));

        assert!((info.x - 160.0).abs() < EPS);
        assert!((info.y - 420.0).abs() < EPS);
    }

    #[test]
    fn test_projects_onto_top_edge() {
        let t = targeting();
        let info = t.compute(Vec2::new(800.0, 0.0), Vec2::new(800.0, 100.0), Duration::ZERO);

        assert!((info.x - 800.0).abs() < EPS);
        assert!((info.y - 90.0).abs() < EPS);
    }

    #[test]
    fn test_corner_falls_back_to_horizontal_edge() {
        let bounds = MapBounds {
            left: 0.0,
            top: 0.0,
            right: 100.0,
            bottom: 100.0,
        };
        // The line leaves through the top edge, above the left edge crossing.
        let p = project_into_map(Vec2::new(-10.0, -60.0), Vec2::new(10.0, 20.0), &bounds);

        assert!(p.y.abs() < EPS);
        assert!((p.x - 5.0).abs() < EPS);
        assert!(bounds.contains(p));
    }
}
