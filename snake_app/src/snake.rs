//! The snake itself

use crate::grid::GridLocation;

/// Segment chain, head first
///
/// Movement is follow-the-leader: every segment takes its predecessor's
/// cell, then the head advances by the move delta.
pub struct Snake {
    segments: Vec<GridLocation>,
}

impl Snake {
    /// Single-segment snake at `head`
    pub fn new(head: GridLocation) -> Self {
        Self {
            segments: vec![head],
        }
    }

    /// Head cell
    pub fn head(&self) -> GridLocation {
        self.segments[0]
    }

    /// The cell the head would reach by moving `delta`
    pub fn next_head(&self, delta: GridLocation) -> GridLocation {
        self.head() + delta
    }

    /// Advance one cell
    pub fn move_rel(&mut self, delta: GridLocation) {
        for i in (1..self.segments.len()).rev() {
            self.segments[i] = self.segments[i - 1];
        }
        self.segments[0] += delta;
    }

    /// Append a segment at the tail, then advance
    pub fn grow(&mut self, delta: GridLocation) {
        let tail = *self.segments.last().unwrap_or(&self.head());
        self.segments.push(tail);
        self.move_rel(delta);
    }

    /// Whether moving onto `target` hits the body
    ///
    /// The tail cell is exempt: it moves away in the same step.
    pub fn collides_with(&self, target: GridLocation) -> bool {
        let body = &self.segments[..self.segments.len().saturating_sub(1)];
        body.iter().any(|s| *s == target)
    }

    /// Whether any segment sits on `loc`
    pub fn occupies(&self, loc: GridLocation) -> bool {
        self.segments.iter().any(|s| *s == loc)
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// A snake always has at least a head
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Segment cells, head first
    pub fn segments(&self) -> &[GridLocation] {
        &self.segments
    }
}
