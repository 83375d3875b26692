//! Grid coordinates and directions

use core::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter};

/// A map coordinate. Off-map values are legal and used as sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    /// Sentinel for "no location"
    pub const INVALID: Pos = Pos { x: -1, y: -1 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Both coordinates are non-negative
    pub const fn is_valid(self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    /// Step one cell in a direction
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }

    /// Component-wise sign of `self - other`, i.e. the unit step leading
    /// from `other` toward `self`.
    pub fn unit_away_from(self, other: Pos) -> (i32, i32) {
        ((self.x - other.x).signum(), (self.y - other.y).signum())
    }
}

impl Add for Pos {
    type Output = Pos;
    fn add(self, rhs: Pos) -> Pos {
        Pos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Pos {
    type Output = Pos;
    fn sub(self, rhs: Pos) -> Pos {
        Pos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl core::fmt::Display for Pos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Chebyshev distance: diagonal moves cost the same as orthogonal ones.
pub fn distance_between(a: Pos, b: Pos) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// The eight compass directions, cardinals first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumCount,
)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    DownLeft,
    UpRight,
    DownRight,
}

/// Direction deltas in [`Direction`] order
pub const NB_DIRS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Clockwise ring of deltas, used when sweeping around a creature
pub const CLOCKWISE_DIRS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpLeft,
        Direction::DownLeft,
        Direction::UpRight,
        Direction::DownRight,
    ];

    pub fn delta(self) -> (i32, i32) {
        NB_DIRS[self as usize]
    }

    pub fn is_cardinal(self) -> bool {
        (self as usize) < 4
    }

    /// Direction of a single-step delta, if it is one
    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        NB_DIRS
            .iter()
            .position(|&d| d == (dx, dy))
            .map(|i| Direction::ALL[i])
    }

    /// Direction from `from` to an adjacent `to`
    pub fn between(from: Pos, to: Pos) -> Option<Direction> {
        Self::from_delta(to.x - from.x, to.y - from.y)
    }
}

/// Number of cells on the reflection perimeter
pub const PERIMETER_CELLS: i32 = 40;

/// Offset of the `n`th cell on the perimeter of an 11×11 square centred on
/// the origin, walking the top edge, the bottom edge, then the left and
/// right edges without their corners.
pub fn perimeter_coords(n: i32) -> Pos {
    let n = n.rem_euclid(PERIMETER_CELLS);
    if n <= 10 {
        Pos::new(n - 5, -5)
    } else if n <= 21 {
        Pos::new(n - 16, 5)
    } else if n <= 30 {
        Pos::new(-5, n - 26)
    } else {
        Pos::new(5, n - 35)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_distance_is_chebyshev() {
        assert_eq!(distance_between(Pos::new(0, 0), Pos::new(3, 1)), 3);
        assert_eq!(distance_between(Pos::new(5, 5), Pos::new(2, 9)), 4);
        assert_eq!(distance_between(Pos::new(1, 1), Pos::new(1, 1)), 0);
    }

    #[test]
    fn test_direction_round_trip() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            assert_eq!(Direction::from_delta(dx, dy), Some(dir));
        }
        assert_eq!(Direction::from_delta(2, 0), None);
        assert!(Direction::Left.is_cardinal());
        assert!(!Direction::DownRight.is_cardinal());
    }

    #[test]
    fn test_perimeter_is_a_closed_ring() {
        let cells: HashSet<Pos> = (0..PERIMETER_CELLS).map(perimeter_coords).collect();
        assert_eq!(cells.len(), PERIMETER_CELLS as usize);
        for p in &cells {
            assert_eq!(p.x.abs().max(p.y.abs()), 5, "{} not on the ring", p);
        }
    }

    #[test]
    fn test_unit_away_from() {
        let a = Pos::new(5, 5);
        assert_eq!(a.unit_away_from(Pos::new(4, 6)), (1, -1));
        assert_eq!(a.unit_away_from(Pos::new(5, 2)), (0, 1));
    }
}
