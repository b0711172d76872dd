//! Play field

use key_engine::core::Random;
use key_engine::prelude::Vec3;

use crate::grid::GridLocation;
use crate::snake::Snake;

/// World-space size of one grid cell
pub const CELL_SIZE: f32 = 1.0;

/// What a field cell holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellContents {
    /// Walkable
    Empty,
    /// Kills the snake on contact
    Obstacle,
    /// Grows the snake
    Food,
    /// Shrinks the snake
    Poison,
}

/// Bordered grid the snake moves on
///
/// The outermost ring of cells is the wall; the interior is playable.
pub struct PlayField {
    width: i32,
    height: i32,
    contents: Vec<CellContents>,
}

impl PlayField {
    /// Create an empty field; dimensions include the wall ring
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            contents: vec![CellContents::Empty; (width * height) as usize],
        }
    }

    /// Field width in cells
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Field height in cells
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether `loc` is a playable interior cell
    pub fn is_inside(&self, loc: GridLocation) -> bool {
        loc.x >= 1 && loc.x < self.width - 1 && loc.y >= 1 && loc.y < self.height - 1
    }

    /// Contents of a cell; out-of-field lookups read as obstacles
    pub fn contents(&self, loc: GridLocation) -> CellContents {
        if loc.x < 0 || loc.x >= self.width || loc.y < 0 || loc.y >= self.height {
            return CellContents::Obstacle;
        }
        self.contents[(loc.y * self.width + loc.x) as usize]
    }

    /// Overwrite the contents of a cell
    pub fn set_contents(&mut self, loc: GridLocation, contents: CellContents) {
        if loc.x >= 0 && loc.x < self.width && loc.y >= 0 && loc.y < self.height {
            self.contents[(loc.y * self.width + loc.x) as usize] = contents;
        }
    }

    /// Place `contents` on a random empty interior cell away from the snake
    ///
    /// Falls back to scanning the interior once random placement keeps
    /// missing; `None` means no free cell is left.
    pub fn spawn_contents(
        &mut self,
        rng: &mut Random,
        snake: &Snake,
        contents: CellContents,
    ) -> Option<GridLocation> {
        // random placements tried before the scan takes over
        const SPAWN_ATTEMPTS: usize = 64;

        for _ in 0..SPAWN_ATTEMPTS {
            let loc = GridLocation::new(
                rng.int_in_range(1, self.width - 1),
                rng.int_in_range(1, self.height - 1),
            );
            if !snake.occupies(loc) && self.contents(loc) == CellContents::Empty {
                self.set_contents(loc, contents);
                return Some(loc);
            }
        }
        for y in 1..self.height - 1 {
            for x in 1..self.width - 1 {
                let loc = GridLocation::new(x, y);
                if !snake.occupies(loc) && self.contents(loc) == CellContents::Empty {
                    self.set_contents(loc, contents);
                    return Some(loc);
                }
            }
        }
        None
    }

    /// World-space center of a cell, with the field centered on the origin
    pub fn cell_to_world(&self, loc: GridLocation) -> Vec3 {
        Vec3::new(
            (loc.x as f32 - self.width as f32 * 0.5 + 0.5) * CELL_SIZE,
            (self.height as f32 * 0.5 - loc.y as f32 - 0.5) * CELL_SIZE,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walls_are_outside() {
        let field = PlayField::new(25, 25);
        assert!(field.is_inside(GridLocation::new(1, 1)));
        assert!(field.is_inside(GridLocation::new(23, 23)));
        assert!(!field.is_inside(GridLocation::new(0, 5)));
        assert!(!field.is_inside(GridLocation::new(24, 5)));
        assert!(!field.is_inside(GridLocation::new(5, 24)));
    }

    #[test]
    fn out_of_field_reads_as_obstacle() {
        let field = PlayField::new(10, 10);
        assert_eq!(field.contents(GridLocation::new(-1, 0)), CellContents::Obstacle);
        assert_eq!(field.contents(GridLocation::new(3, 3)), CellContents::Empty);
    }

    #[test]
    fn spawn_avoids_snake_and_occupied_cells() {
        let mut field = PlayField::new(6, 6);
        let snake = Snake::new(GridLocation::new(2, 2));
        let mut rng = Random::from_seed(7);
        let loc = field.spawn_contents(&mut rng, &snake, CellContents::Food).unwrap();
        assert!(field.is_inside(loc));
        assert!(!snake.occupies(loc));
        assert_eq!(field.contents(loc), CellContents::Food);
    }

    #[test]
    fn spawn_finds_the_last_free_cell() {
        let mut field = PlayField::new(4, 4);
        field.set_contents(GridLocation::new(1, 1), CellContents::Obstacle);
        field.set_contents(GridLocation::new(2, 1), CellContents::Obstacle);
        field.set_contents(GridLocation::new(1, 2), CellContents::Obstacle);
        let snake = Snake::new(GridLocation::new(1, 1));
        let mut rng = Random::from_seed(7);
        let loc = field.spawn_contents(&mut rng, &snake, CellContents::Food).unwrap();
        assert_eq!(loc, GridLocation::new(2, 2));
    }

    #[test]
    fn spawn_on_a_full_field_returns_none() {
        let mut field = PlayField::new(4, 4);
        for y in 1..3 {
            for x in 1..3 {
                field.set_contents(GridLocation::new(x, y), CellContents::Obstacle);
            }
        }
        let snake = Snake::new(GridLocation::new(1, 1));
        let mut rng = Random::from_seed(7);
        assert!(field.spawn_contents(&mut rng, &snake, CellContents::Food).is_none());
    }
}
