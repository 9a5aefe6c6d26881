//! Insertion-ordered list of the entities an engine tracks.

use engine_component::Entity;

/// Entities in the order they were added. Membership is by identity.
#[derive(Debug, Default)]
pub struct EntityList {
    entities: Vec<Entity>,
}

impl EntityList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
        }
    }

    /// Append `entity`.
    pub fn add(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Remove the first occurrence of `entity`.
    ///
    /// Returns `false` if it was not in the list.
    pub fn remove(&mut self, entity: &Entity) -> bool {
        match self.entities.iter().position(|e| e.ptr_eq(entity)) {
            Some(index) => {
                self.entities.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every entity.
    pub fn remove_all(&mut self) {
        self.entities.clear();
    }

    /// Returns the entity at `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    /// Returns `true` if `entity` is in the list.
    #[must_use]
    pub fn contains(&self, entity: &Entity) -> bool {
        self.entities.iter().any(|e| e.ptr_eq(entity))
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_at() {
        let mut list = EntityList::new();
        let a = Entity::named("a");
        let b = Entity::named("b");
        list.add(a.clone());
        list.add(b.clone());

        assert_eq!(list.len(), 2);
        assert!(list.at(0).unwrap().ptr_eq(&a));
        assert!(list.at(1).unwrap().ptr_eq(&b));
        assert!(list.at(2).is_none());
    }

    #[test]
    fn test_remove() {
        let mut list = EntityList::new();
        let a = Entity::new();
        let b = Entity::new();
        list.add(a.clone());

        assert!(!list.remove(&b));
        assert!(list.remove(&a));
        assert!(list.is_empty());
        assert!(!list.contains(&a));
    }

    #[test]
    fn test_contains_is_identity() {
        let mut list = EntityList::new();
        let a = Entity::named("twin");
        list.add(a.clone());
        assert!(list.contains(&a));
        assert!(!list.contains(&Entity::named("twin")));
    }

    #[test]
    fn test_remove_all() {
        let mut list = EntityList::new();
        list.add(Entity::new());
        list.add(Entity::new());
        list.remove_all();
        assert_eq!(list.len(), 0);
        assert_eq!(list.iter().count(), 0);
    }
}
