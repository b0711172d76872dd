//! Fruit spawning

use key_engine::core::Random;

use crate::field::{CellContents, PlayField};
use crate::grid::GridLocation;
use crate::snake::Snake;

/// The fruit the snake chases
pub struct Fruit {
    loc: GridLocation,
}

impl Fruit {
    /// Spawn a fruit on a free cell; `None` when the field has none
    pub fn new(rng: &mut Random, field: &mut PlayField, snake: &Snake) -> Option<Self> {
        let loc = field.spawn_contents(rng, snake, CellContents::Food)?;
        Some(Self { loc })
    }

    /// Current cell
    pub fn location(&self) -> GridLocation {
        self.loc
    }

    /// Move the fruit to a new free cell after it was eaten
    ///
    /// The old cell stays marked while spawning so the fruit never lands on
    /// the cell it just left. Returns `false` when no free cell is left; the
    /// old cell is vacated either way.
    pub fn respawn(&mut self, rng: &mut Random, field: &mut PlayField, snake: &Snake) -> bool {
        let old = self.loc;
        let respawned = match field.spawn_contents(rng, snake, CellContents::Food) {
            Some(loc) => {
                self.loc = loc;
                true
            }
            None => false,
        };
        field.set_contents(old, CellContents::Empty);
        respawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respawn_frees_the_old_cell() {
        let mut field = PlayField::new(8, 8);
        let snake = Snake::new(GridLocation::new(2, 2));
        let mut rng = Random::from_seed(3);
        let mut fruit = Fruit::new(&mut rng, &mut field, &snake).unwrap();
        let old = fruit.location();
        assert!(fruit.respawn(&mut rng, &mut field, &snake));
        assert_eq!(field.contents(old), CellContents::Empty);
        assert_eq!(field.contents(fruit.location()), CellContents::Food);
        assert!(field.is_inside(fruit.location()));
        assert_ne!(old, fruit.location());
    }

    #[test]
    fn respawn_with_no_free_cell_reports_failure() {
        // single-column interior; block every cell the fruit is not on
        let mut field = PlayField::new(3, 5);
        let snake = Snake::new(GridLocation::new(1, 1));
        let mut rng = Random::from_seed(3);
        let mut fruit = Fruit::new(&mut rng, &mut field, &snake).unwrap();
        for y in 1..4 {
            let loc = GridLocation::new(1, y);
            if loc != fruit.location() && !snake.occupies(loc) {
                field.set_contents(loc, CellContents::Obstacle);
            }
        }
        let old = fruit.location();
        assert!(!fruit.respawn(&mut rng, &mut field, &snake));
        assert_eq!(field.contents(old), CellContents::Empty);
    }
}
