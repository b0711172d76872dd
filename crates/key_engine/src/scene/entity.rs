//! Entity storage
//!
//! Entities are stored in a generational slotmap, so an [`EntityId`] held
//! after a despawn simply stops resolving instead of aliasing a recycled
//! slot. Entities are grouped into coarse categories for bulk queries and
//! may form parent/child hierarchies.

use std::collections::HashMap;

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generational handle to an entity
    pub struct EntityId;
}

/// Coarse grouping used for bulk entity queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Default bucket
    Uncategorized,
    /// Player-controlled entities
    Player,
    /// Hostile entities
    Enemy,
    /// Short-lived spawned entities
    Projectile,
    /// Static decoration
    Scenery,
    /// Light sources
    Light,
}

/// One scene entity
pub struct Entity {
    name: String,
    category: Category,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

impl Entity {
    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category bucket
    pub fn category(&self) -> Category {
        self.category
    }

    /// Parent entity, if any
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Direct children
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }
}

/// Owns all entities and their category buckets
#[derive(Default)]
pub struct EntityManager {
    entities: SlotMap<EntityId, Entity>,
    by_category: HashMap<Category, Vec<EntityId>>,
}

impl EntityManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity, optionally attached under `parent`
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        category: Category,
        parent: Option<EntityId>,
    ) -> EntityId {
        let parent = parent.filter(|p| self.entities.contains_key(*p));
        let id = self.entities.insert(Entity {
            name: name.into(),
            category,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.entities[parent].children.push(id);
        }
        self.by_category.entry(category).or_default().push(id);
        id
    }

    /// Remove an entity and all of its descendants
    ///
    /// Returns whether the id was alive.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.remove(id) else {
            return false;
        };
        if let Some(parent) = entity.parent.and_then(|p| self.entities.get_mut(p)) {
            parent.children.retain(|c| *c != id);
        }
        if let Some(bucket) = self.by_category.get_mut(&entity.category) {
            bucket.retain(|c| *c != id);
        }
        for child in entity.children {
            // child's parent link is already gone with the slotmap entry
            self.despawn(child);
        }
        true
    }

    /// Whether `id` refers to a live entity
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Read access to an entity
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// First live entity with the given name
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, e)| e.name == name)
            .map(|(id, _)| id)
    }

    /// Live entities in a category, in spawn order
    pub fn in_category(&self, category: Category) -> &[EntityId] {
        self.by_category
            .get(&category)
            .map_or(&[], Vec::as_slice)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entities are alive
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over all live entities
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_and_lookup() {
        let mut manager = EntityManager::new();
        let id = manager.spawn("hero", Category::Player, None);
        assert!(manager.contains(id));
        assert_eq!(manager.get(id).unwrap().name(), "hero");
        assert_eq!(manager.find_by_name("hero"), Some(id));
        assert_eq!(manager.in_category(Category::Player), &[id]);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn stale_ids_stop_resolving() {
        let mut manager = EntityManager::new();
        let id = manager.spawn("tmp", Category::Uncategorized, None);
        assert!(manager.despawn(id));
        assert!(!manager.contains(id));
        assert!(!manager.despawn(id));
        // the slot may be reused but the old id must not alias it
        let replacement = manager.spawn("new", Category::Uncategorized, None);
        assert_ne!(id, replacement);
        assert!(manager.get(id).is_none());
    }

    #[test]
    fn despawn_removes_descendants() {
        let mut manager = EntityManager::new();
        let root = manager.spawn("root", Category::Scenery, None);
        let child = manager.spawn("child", Category::Scenery, Some(root));
        let grandchild = manager.spawn("grandchild", Category::Scenery, Some(child));
        assert_eq!(manager.get(root).unwrap().children(), &[child]);

        manager.despawn(root);
        assert!(manager.is_empty());
        assert!(!manager.contains(grandchild));
        assert!(manager.in_category(Category::Scenery).is_empty());
    }

    #[test]
    fn spawn_with_dead_parent_becomes_root() {
        let mut manager = EntityManager::new();
        let parent = manager.spawn("p", Category::Uncategorized, None);
        manager.despawn(parent);
        let orphan = manager.spawn("o", Category::Uncategorized, Some(parent));
        assert_eq!(manager.get(orphan).unwrap().parent(), None);
    }
}
