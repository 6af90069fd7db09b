//! Integer grid geometry: positions, rectangles, wire elbows and pick tests.
//!
//! All node positions are grid-aligned integers. Wires are drawn as two
//! straight segments meeting at an elbow point that is derived from the
//! endpoints and an [`ElbowConfig`], so the elbow must be recomputed
//! whenever either endpoint moves.

use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Spacing of the placement grid, in world units.
pub const GRID_SIZE: i32 = 8;

/// Radius around a node center that counts as a hit on that node.
pub const NODE_RADIUS: i32 = 4;

/// Maximum distance from a wire segment that counts as a hit on the wire.
pub const WIRE_PICK_RADIUS: f32 = 2.0;

/// Radius around a wire elbow that counts as a hit on the elbow.
pub const ELBOW_PICK_RADIUS: i32 = 3;

/// Largest absolute coordinate a node or group corner may have. Keeps all
/// elbow, snapping and rectangle arithmetic well inside `i32`.
pub const COORD_LIMIT: i32 = 1 << 24;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A 2D integer position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Returns `true` if both coordinates are within [`COORD_LIMIT`].
    pub fn in_bounds(self) -> bool {
        self.x.unsigned_abs() <= COORD_LIMIT as u32 && self.y.unsigned_abs() <= COORD_LIMIT as u32
    }

    /// `self + offset` computed without overflow, if the result is in bounds.
    pub fn offset_within_bounds(self, offset: Position) -> Option<Position> {
        let x = i32::try_from(i64::from(self.x) + i64::from(offset.x)).ok()?;
        let y = i32::try_from(i64::from(self.y) + i64::from(offset.y)).ok()?;
        Some(Position::new(x, y)).filter(|p| p.in_bounds())
    }

    /// Rounds each coordinate to the nearest grid line.
    pub fn snapped(self) -> Self {
        fn snap(v: i32) -> i32 {
            let half = GRID_SIZE / 2;
            v.saturating_add(if v >= 0 { half } else { -half }) / GRID_SIZE * GRID_SIZE
        }
        Position::new(snap(self.x), snap(self.y))
    }

    /// Squared Euclidean distance to `other`, saturating at `i64::MAX`.
    pub fn distance_squared(self, other: Position) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Returns `true` if `other` lies within `radius` of this position.
    pub fn is_within(self, other: Position, radius: i32) -> bool {
        self.distance_squared(other) <= (radius as i64) * (radius as i64)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Position {
    type Output = Position;

    fn neg(self) -> Position {
        Position::new(-self.x, -self.y)
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle with non-negative extents. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    /// Returns `true` if both corners are within [`COORD_LIMIT`].
    pub fn in_bounds(&self) -> bool {
        let far = |origin: i32, extent: i32| i64::from(origin) + i64::from(extent);
        let limit = i64::from(COORD_LIMIT);
        Position::new(self.x, self.y).in_bounds()
            && far(self.x, self.w).abs() <= limit
            && far(self.y, self.h).abs() <= limit
    }

    /// Builds the rectangle spanned by two arbitrary corners.
    pub fn from_corners(a: Position, b: Position) -> Self {
        let min = Position::new(a.x.min(b.x), a.y.min(b.y));
        let max = Position::new(a.x.max(b.x), a.y.max(b.y));
        Rect::new(min.x, min.y, max.x.saturating_sub(min.x), max.y.saturating_sub(min.y))
    }

    /// Smallest rectangle containing every point, or `None` for no points.
    pub fn bounding<I: IntoIterator<Item = Position>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| {
            (
                Position::new(min.x.min(p.x), min.y.min(p.y)),
                Position::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        Some(Rect::from_corners(min, max))
    }

    pub fn min(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn max(&self) -> Position {
        Position::new(self.x.saturating_add(self.w), self.y.saturating_add(self.h))
    }

    pub fn contains(&self, p: Position) -> bool {
        let max = self.max();
        p.x >= self.x && p.x <= max.x && p.y >= self.y && p.y <= max.y
    }

    pub fn translated(&self, by: Position) -> Self {
        Rect::new(self.x + by.x, self.y + by.y, self.w, self.h)
    }
}

// ---------------------------------------------------------------------------
// Elbows
// ---------------------------------------------------------------------------

/// How a wire bends between its two endpoints.
///
/// The discriminant is the value written to save files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElbowConfig {
    /// Horizontal leg first, then vertical.
    #[default]
    Horizontal = 0,
    /// Diagonal leg leaving the start, then straight.
    DiagonalFromStart = 1,
    /// Vertical leg first, then horizontal.
    Vertical = 2,
    /// Straight leg first, then a diagonal into the end.
    DiagonalToEnd = 3,
}

impl ElbowConfig {
    /// All configurations in declaration order.
    pub const ALL: [ElbowConfig; 4] = [
        ElbowConfig::Horizontal,
        ElbowConfig::DiagonalFromStart,
        ElbowConfig::Vertical,
        ElbowConfig::DiagonalToEnd,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// The next configuration in the editor's cycling order.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() as usize + 1) % Self::ALL.len()]
    }

    /// Computes the elbow point for a wire from `start` to `end`.
    pub fn elbow(self, start: Position, end: Position) -> Position {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let m = dx.abs().min(dy.abs());
        let diagonal = Position::new(dx.signum() * m, dy.signum() * m);
        match self {
            ElbowConfig::Horizontal => Position::new(end.x, start.y),
            ElbowConfig::DiagonalFromStart => start + diagonal,
            ElbowConfig::Vertical => Position::new(start.x, end.y),
            ElbowConfig::DiagonalToEnd => end - diagonal,
        }
    }

    /// Picks the configuration whose elbow lands nearest to `target`.
    ///
    /// Ties resolve to the earliest configuration in declaration order.
    pub fn snap(start: Position, end: Position, target: Position) -> Self {
        let mut best = ElbowConfig::Horizontal;
        let mut best_dist = i64::MAX;
        for config in Self::ALL {
            let dist = config.elbow(start, end).distance_squared(target);
            if dist < best_dist {
                best = config;
                best_dist = dist;
            }
        }
        best
    }
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Position, a: Position, b: Position) -> f32 {
    let (px, py) = (p.x as f32, p.y as f32);
    let (ax, ay) = (a.x as f32, a.y as f32);
    let (bx, by) = (b.x as f32, b.y as f32);
    let (abx, aby) = (bx - ax, by - ay);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * abx + (py - ay) * aby) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * abx, ay + t * aby);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapping_rounds_to_nearest_grid_line() {
        assert_eq!(Position::new(3, 4).snapped(), Position::new(0, 8));
        assert_eq!(Position::new(-3, -5).snapped(), Position::new(0, -8));
        assert_eq!(Position::new(16, 17).snapped(), Position::new(16, 16));
    }

    #[test]
    fn coordinate_limit() {
        assert!(Position::new(COORD_LIMIT, -COORD_LIMIT).in_bounds());
        assert!(!Position::new(COORD_LIMIT + 1, 0).in_bounds());
        assert!(!Position::new(0, i32::MIN).in_bounds());
        assert_eq!(Position::new(i32::MAX, i32::MIN).snapped(), Position::new(i32::MAX - 7, i32::MIN));

        let origin = Position::new(8, 8);
        assert_eq!(origin.offset_within_bounds(Position::new(8, -8)), Some(Position::new(16, 0)));
        assert_eq!(origin.offset_within_bounds(Position::new(i32::MAX, 0)), None);

        assert!(Rect::new(-COORD_LIMIT, 0, 2 * COORD_LIMIT, 8).in_bounds());
        assert!(!Rect::new(0, 0, i32::MAX, 8).in_bounds());
        let huge = Rect::from_corners(Position::new(-8, 0), Position::new(i32::MAX, 0));
        assert!(huge.contains(Position::new(0, 0)));
        assert_eq!(Rect::new(8, 0, i32::MAX, 0).max(), Position::new(i32::MAX, 0));
        let far = Position::new(i32::MAX, i32::MIN).distance_squared(Position::new(i32::MIN, i32::MAX));
        assert_eq!(far, i64::MAX);
    }

    #[test]
    fn rect_from_corners_normalizes() {
        let r = Rect::from_corners(Position::new(10, 2), Position::new(-2, 8));
        assert_eq!(r, Rect::new(-2, 2, 12, 6));
        assert!(r.contains(Position::new(10, 8)));
        assert!(!r.contains(Position::new(11, 8)));
    }

    #[test]
    fn bounding_of_nothing_is_none() {
        assert_eq!(Rect::bounding(Vec::new()), None);
        let r = Rect::bounding(vec![Position::new(4, 4), Position::new(-4, 12)]).unwrap();
        assert_eq!(r, Rect::new(-4, 4, 8, 8));
    }

    #[test]
    fn elbow_points_for_each_config() {
        let s = Position::new(0, 0);
        let e = Position::new(16, 8);
        assert_eq!(ElbowConfig::Horizontal.elbow(s, e), Position::new(16, 0));
        assert_eq!(ElbowConfig::DiagonalFromStart.elbow(s, e), Position::new(8, 8));
        assert_eq!(ElbowConfig::Vertical.elbow(s, e), Position::new(0, 8));
        assert_eq!(ElbowConfig::DiagonalToEnd.elbow(s, e), Position::new(8, 0));
    }

    #[test]
    fn reversed_elbow_snaps_back_to_same_point() {
        let a = Position::new(0, 0);
        let b = Position::new(24, 8);
        for config in ElbowConfig::ALL {
            let elbow = config.elbow(a, b);
            let reversed = ElbowConfig::snap(b, a, elbow);
            assert_eq!(reversed.elbow(b, a), elbow, "config {:?}", config);
        }
    }

    #[test]
    fn next_cycles_through_all_configs() {
        let mut c = ElbowConfig::Horizontal;
        for _ in 0..4 {
            c = c.next();
        }
        assert_eq!(c, ElbowConfig::Horizontal);
        assert_eq!(ElbowConfig::from_index(3), Some(ElbowConfig::DiagonalToEnd));
        assert_eq!(ElbowConfig::from_index(4), None);
    }

    #[test]
    fn segment_distance() {
        let a = Position::new(0, 0);
        let b = Position::new(10, 0);
        assert_eq!(distance_to_segment(Position::new(5, 3), a, b), 3.0);
        assert_eq!(distance_to_segment(Position::new(-4, 3), a, b), 5.0);
        assert_eq!(distance_to_segment(Position::new(2, 2), a, a), (8.0f32).sqrt());
    }
}
