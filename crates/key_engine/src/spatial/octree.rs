//! Octree over axis-aligned bounding boxes
//!
//! Items live in the deepest node that fully contains their bounds, so an
//! item straddling a child split stays with the parent. Nodes subdivide into
//! eight octants (split at the node center) once they hold more than
//! `capacity` items and the depth limit allows it.

use crate::foundation::math::{Aabb, Vec3};

struct Node<T> {
    bounds: Aabb,
    items: Vec<(Aabb, T)>,
    children: Option<Box<[Node<T>; 8]>>,
    depth: u32,
}

impl<T> Node<T> {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            items: Vec::new(),
            children: None,
            depth,
        }
    }

    fn octant_bounds(&self, index: usize) -> Aabb {
        let center = self.bounds.center();
        let mut min = self.bounds.min;
        let mut max = center;
        if index & 1 != 0 {
            min.x = center.x;
            max.x = self.bounds.max.x;
        }
        if index & 2 != 0 {
            min.y = center.y;
            max.y = self.bounds.max.y;
        }
        if index & 4 != 0 {
            min.z = center.z;
            max.z = self.bounds.max.z;
        }
        Aabb::new(min, max)
    }

    fn subdivide(&mut self, capacity: usize, max_depth: u32) {
        let children = std::array::from_fn(|i| Node::new(self.octant_bounds(i), self.depth + 1));
        self.children = Some(Box::new(children));
        let items = std::mem::take(&mut self.items);
        for (bounds, item) in items {
            self.insert(bounds, item, capacity, max_depth);
        }
    }

    fn insert(&mut self, bounds: Aabb, item: T, capacity: usize, max_depth: u32) {
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                if contains_box(&child.bounds, &bounds) {
                    child.insert(bounds, item, capacity, max_depth);
                    return;
                }
            }
            // straddles a split plane
            self.items.push((bounds, item));
            return;
        }
        self.items.push((bounds, item));
        if self.items.len() > capacity && self.depth < max_depth {
            self.subdivide(capacity, max_depth);
        }
    }

    fn query<'a>(&'a self, region: &Aabb, out: &mut Vec<&'a T>) {
        if !self.bounds.intersects(region) {
            return;
        }
        for (bounds, item) in &self.items {
            if bounds.intersects(region) {
                out.push(item);
            }
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(region, out);
            }
        }
    }

    fn len(&self) -> usize {
        self.items.len()
            + self
                .children
                .as_ref()
                .map_or(0, |c| c.iter().map(Node::len).sum())
    }
}

fn contains_box(outer: &Aabb, inner: &Aabb) -> bool {
    outer.contains(&inner.min) && outer.contains(&inner.max)
}

/// Loose spatial index over boxed items
pub struct Octree<T> {
    root: Node<T>,
    capacity: usize,
    max_depth: u32,
}

impl<T> Octree<T> {
    /// Create an octree covering `bounds`
    ///
    /// `capacity` is the per-node item count that triggers a subdivision;
    /// `max_depth` caps how deep the tree may split.
    pub fn new(bounds: Aabb, capacity: usize, max_depth: u32) -> Self {
        Self {
            root: Node::new(bounds, 0),
            capacity: capacity.max(1),
            max_depth,
        }
    }

    /// Insert an item with its bounds
    ///
    /// Returns `false` when the bounds fall outside the tree.
    pub fn insert(&mut self, bounds: Aabb, item: T) -> bool {
        if !contains_box(&self.root.bounds, &bounds) {
            return false;
        }
        self.root.insert(bounds, item, self.capacity, self.max_depth);
        true
    }

    /// Collect all items whose bounds intersect `region`
    pub fn query(&self, region: &Aabb) -> Vec<&T> {
        let mut out = Vec::new();
        self.root.query(region, &mut out);
        out
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Whether the tree holds no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds covered by the tree
    pub fn bounds(&self) -> Aabb {
        self.root.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(center: Vec3) -> Aabb {
        let half = Vec3::repeat(0.5);
        Aabb::new(center - half, center + half)
    }

    fn world() -> Aabb {
        Aabb::new(Vec3::repeat(-100.0), Vec3::repeat(100.0))
    }

    #[test]
    fn query_returns_intersecting_items() {
        let mut tree = Octree::new(world(), 4, 5);
        assert!(tree.insert(unit_box(Vec3::new(50.0, 50.0, 50.0)), "far"));
        assert!(tree.insert(unit_box(Vec3::zeros()), "near"));
        assert_eq!(tree.len(), 2);

        let hits = tree.query(&Aabb::new(Vec3::repeat(-2.0), Vec3::repeat(2.0)));
        assert_eq!(hits, vec![&"near"]);
    }

    #[test]
    fn out_of_bounds_insert_is_rejected() {
        let mut tree = Octree::new(world(), 4, 5);
        assert!(!tree.insert(unit_box(Vec3::repeat(500.0)), "outside"));
        assert!(tree.is_empty());
    }

    #[test]
    fn subdivision_keeps_all_items_queryable() {
        let mut tree = Octree::new(world(), 2, 4);
        // cluster in the +x +y +z octant to force splits
        for i in 0..16 {
            let offset = Vec3::new(10.0 + i as f32, 10.0, 10.0);
            assert!(tree.insert(unit_box(offset), i));
        }
        assert_eq!(tree.len(), 16);
        let all = tree.query(&world());
        assert_eq!(all.len(), 16);
        let some = tree.query(&Aabb::new(
            Vec3::new(9.0, 9.0, 9.0),
            Vec3::new(12.0, 11.0, 11.0),
        ));
        assert!(!some.is_empty() && some.len() < 16);
    }

    #[test]
    fn straddling_items_stay_with_the_parent() {
        let mut tree = Octree::new(world(), 1, 4);
        // spans the center split on every axis
        let straddler = Aabb::new(Vec3::repeat(-1.0), Vec3::repeat(1.0));
        assert!(tree.insert(straddler, "straddler"));
        assert!(tree.insert(unit_box(Vec3::repeat(20.0)), "corner"));
        assert!(tree.insert(unit_box(Vec3::repeat(-20.0)), "other"));
        assert_eq!(tree.len(), 3);
        let hits = tree.query(&Aabb::new(Vec3::repeat(-0.1), Vec3::repeat(0.1)));
        assert_eq!(hits, vec![&"straddler"]);
    }
}
