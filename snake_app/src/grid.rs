//! Grid coordinates and movement directions

use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Integer cell coordinate on the play field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GridLocation {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl GridLocation {
    /// Create a location
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for GridLocation {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for GridLocation {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for GridLocation {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for GridLocation {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// The four movement directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Negative y
    Up,
    /// Positive y
    Down,
    /// Negative x
    Left,
    /// Positive x
    Right,
}

impl Direction {
    /// One-cell step in this direction
    pub fn delta(self) -> GridLocation {
        match self {
            Self::Up => GridLocation::new(0, -1),
            Self::Down => GridLocation::new(0, 1),
            Self::Left => GridLocation::new(-1, 0),
            Self::Right => GridLocation::new(1, 0),
        }
    }

    /// The direction pointing the opposite way
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let mut loc = GridLocation::new(3, 4);
        loc += GridLocation::new(1, -1);
        assert_eq!(loc, GridLocation::new(4, 3));
        assert_eq!(loc - GridLocation::new(4, 3), GridLocation::default());
    }

    #[test]
    fn deltas_are_unit_steps() {
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            let d = dir.delta();
            assert_eq!(d.x.abs() + d.y.abs(), 1);
            assert_eq!(dir.opposite().delta(), GridLocation::default() - d);
        }
    }
}
