//! Families: incremental membership for one node shape.
//!
//! A [`Family`] answers two questions about one entity at a time: does it now
//! belong in my node list, and must it now leave? The engine asks only when
//! an event could have changed the answer (an entity joined or left, or one
//! component was added or removed), so membership is maintained without ever
//! rescanning the entity population.
//!
//! Invariant: an entity has at most one node in a family, and the entity
//! index and the node list always hold the same nodes.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{trace, warn};

use engine_component::{ComponentTypeId, Entity, EntityId};

use crate::node::{Node, NodeShape};
use crate::node_list::NodeList;

/// Maintains the [`NodeList`] of entities that satisfy shape `S`.
pub struct Family<S: NodeShape> {
    required: Vec<ComponentTypeId>,
    nodes: NodeList<S>,
    entity_index: RefCell<HashMap<EntityId, Node<S>>>,
}

impl<S: NodeShape> Family<S> {
    /// Create an empty family for shape `S`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            required: S::required(),
            nodes: NodeList::new(),
            entity_index: RefCell::new(HashMap::new()),
        }
    }

    /// The family's node list (a shared handle).
    #[must_use]
    pub fn node_list(&self) -> NodeList<S> {
        self.nodes.clone()
    }

    /// The component kinds this family requires.
    #[must_use]
    pub fn required(&self) -> &[ComponentTypeId] {
        &self.required
    }

    /// Returns `true` if a change to `kind` can affect membership.
    #[must_use]
    pub fn is_relevant(&self, kind: ComponentTypeId) -> bool {
        self.required.contains(&kind)
    }

    /// Returns the node held for `entity`, if any.
    #[must_use]
    pub fn node_for(&self, entity: &Entity) -> Option<Node<S>> {
        let id = entity.id()?;
        self.entity_index.borrow().get(&id).cloned()
    }

    /// Admit `entity` if it has every required component.
    ///
    /// Returns `true` if the entity is a member afterwards. Calling this for
    /// an entity that is already a member changes nothing. Entities without
    /// an id (not tracked by an engine) are never admitted.
    pub fn check_entity_add(&self, entity: &Entity) -> bool {
        self.add_if_match(entity)
    }

    /// Evict `entity` even if it still has every required component.
    ///
    /// Returns `false` if the entity was not a member.
    pub fn check_entity_remove(&self, entity: &Entity) -> bool {
        self.remove_if_match(entity)
    }

    /// Re-check `entity` after a component of kind `kind` was added to it.
    ///
    /// Kinds this family does not require are rejected without looking at
    /// the entity.
    pub fn check_new_component(&self, entity: &Entity, kind: ComponentTypeId) -> bool {
        if !self.is_relevant(kind) {
            return false;
        }
        self.add_if_match(entity)
    }

    /// Re-check `entity` after a component of kind `kind` was removed from it.
    ///
    /// Kinds this family does not require are rejected without touching the
    /// index.
    pub fn check_removed_component(&self, entity: &Entity, kind: ComponentTypeId) -> bool {
        if !self.is_relevant(kind) {
            return false;
        }
        self.remove_if_match(entity)
    }

    /// Drop every node without announcing the removals.
    ///
    /// For full teardown only.
    pub fn clean_up(&self) {
        self.entity_index.borrow_mut().clear();
        self.nodes.clear();
    }

    /// Evict every member, announcing each removal front to back.
    pub fn evict_all(&self) {
        self.entity_index.borrow_mut().clear();
        self.nodes.remove_all();
    }

    fn add_if_match(&self, entity: &Entity) -> bool {
        let Some(id) = entity.id() else {
            return false;
        };
        if self.entity_index.borrow().contains_key(&id) {
            return true;
        }
        if !self.required.iter().all(|kind| entity.has_kind(*kind)) {
            return false;
        }
        let Some(fields) = S::bind(entity) else {
            warn!(
                entity = %id,
                shape = std::any::type_name::<S>(),
                "entity has every required kind but a component has an unexpected type"
            );
            return false;
        };

        let node = Node::new(entity.clone(), fields);
        self.entity_index.borrow_mut().insert(id, node.clone());
        trace!(entity = %id, shape = std::any::type_name::<S>(), "node admitted");
        self.nodes.add(node);
        true
    }

    fn remove_if_match(&self, entity: &Entity) -> bool {
        let Some(id) = entity.id() else {
            return false;
        };
        let Some(node) = self.entity_index.borrow_mut().remove(&id) else {
            return false;
        };

        trace!(entity = %id, shape = std::any::type_name::<S>(), "node evicted");
        self.nodes.remove(&node);
        true
    }
}

impl<S: NodeShape> Default for Family<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: NodeShape> std::fmt::Debug for Family<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Family")
            .field("shape", &std::any::type_name::<S>())
            .field("required", &self.required)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// Object-safe view of a [`Family`] used by the engine to route events to
/// families of every shape.
pub(crate) trait FamilyHooks {
    fn check_entity_add(&self, entity: &Entity) -> bool;
    fn check_entity_remove(&self, entity: &Entity) -> bool;
    fn check_new_component(&self, entity: &Entity, kind: ComponentTypeId) -> bool;
    fn check_removed_component(&self, entity: &Entity, kind: ComponentTypeId) -> bool;
    fn clean_up(&self);
    fn evict_all(&self);
    fn shape_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

impl<S: NodeShape> FamilyHooks for Family<S> {
    fn check_entity_add(&self, entity: &Entity) -> bool {
        Family::check_entity_add(self, entity)
    }

    fn check_entity_remove(&self, entity: &Entity) -> bool {
        Family::check_entity_remove(self, entity)
    }

    fn check_new_component(&self, entity: &Entity, kind: ComponentTypeId) -> bool {
        Family::check_new_component(self, entity, kind)
    }

    fn check_removed_component(&self, entity: &Entity, kind: ComponentTypeId) -> bool {
        Family::check_removed_component(self, entity, kind)
    }

    fn clean_up(&self) {
        Family::clean_up(self);
    }

    fn evict_all(&self) {
        Family::evict_all(self);
    }

    fn shape_name(&self) -> &'static str {
        std::any::type_name::<S>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use engine_component::{Component, EntityAllocator, listener};

    use super::*;
    use crate::node_list::NodeEvent;

    #[derive(Debug, Clone)]
    struct ComponentOne;
    impl Component for ComponentOne {}

    #[derive(Debug, Clone)]
    struct ComponentTwo;
    impl Component for ComponentTwo {}

    #[derive(Debug, Clone)]
    struct OtherComponent;
    impl Component for OtherComponent {}

    crate::node_shape! {
        struct TestNode {
            one: ComponentOne,
            two: ComponentTwo,
        }
    }

    struct Fixture {
        family: Family<TestNode>,
        matching: Entity,
        non_matching: Entity,
    }

    fn fixture() -> Fixture {
        let mut allocator = EntityAllocator::new();
        let matching = Entity::new();
        matching.add(ComponentOne).add(ComponentTwo);
        allocator.assign(&matching);

        let non_matching = Entity::new();
        non_matching.add(ComponentOne);
        allocator.assign(&non_matching);

        Fixture {
            family: Family::new(),
            matching,
            non_matching,
        }
    }

    #[test]
    fn test_check_entity_add_admits_matching() {
        let f = fixture();
        assert!(f.family.check_entity_add(&f.matching));
        assert_eq!(f.family.node_list().len(), 1);

        let node = f.family.node_for(&f.matching).unwrap();
        assert!(node.entity().ptr_eq(&f.matching));
        assert!(Rc::ptr_eq(
            &node.one,
            &f.matching.get::<ComponentOne>().unwrap()
        ));
        assert!(Rc::ptr_eq(
            &node.two,
            &f.matching.get::<ComponentTwo>().unwrap()
        ));
    }

    #[test]
    fn test_check_entity_add_rejects_non_matching() {
        let f = fixture();
        assert!(!f.family.check_entity_add(&f.non_matching));
        assert!(f.family.node_list().is_empty());
    }

    #[test]
    fn test_check_entity_add_is_idempotent() {
        let f = fixture();
        let added = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&added);
        f.family.node_list().subscribe(
            NodeEvent::NodeAdded,
            listener(move |_: &Node<TestNode>| *counter.borrow_mut() += 1),
        );

        assert!(f.family.check_entity_add(&f.matching));
        let first = f.family.node_for(&f.matching).unwrap();
        assert!(f.family.check_entity_add(&f.matching));

        assert_eq!(f.family.node_list().len(), 1);
        assert_eq!(*added.borrow(), 1);
        assert!(first.ptr_eq(&f.family.node_for(&f.matching).unwrap()));
    }

    #[test]
    fn test_untracked_entity_is_never_admitted() {
        let family: Family<TestNode> = Family::new();
        let entity = Entity::new();
        entity.add(ComponentOne).add(ComponentTwo);
        assert!(!family.check_entity_add(&entity));
        assert!(!family.check_entity_remove(&entity));
    }

    #[test]
    fn test_check_entity_remove() {
        let f = fixture();
        assert!(!f.family.check_entity_remove(&f.matching));

        f.family.check_entity_add(&f.matching);
        assert!(f.family.check_entity_remove(&f.matching));
        assert!(f.family.node_list().is_empty());
        assert!(f.family.node_for(&f.matching).is_none());
    }

    #[test]
    fn test_check_new_component_admits_qualified_entity() {
        let f = fixture();
        f.non_matching.add(ComponentTwo);
        assert!(
            f.family
                .check_new_component(&f.non_matching, ComponentTwo::component_type_id())
        );
        assert_eq!(f.family.node_list().len(), 1);
    }

    #[test]
    fn test_check_new_component_ignores_irrelevant_kind() {
        let f = fixture();
        f.non_matching.add(OtherComponent);
        assert!(
            !f.family
                .check_new_component(&f.non_matching, OtherComponent::component_type_id())
        );

        // Irrelevant kinds are rejected even if the entity would qualify.
        assert!(
            !f.family
                .check_new_component(&f.matching, OtherComponent::component_type_id())
        );
        assert!(f.family.node_list().is_empty());
    }

    #[test]
    fn test_check_removed_component_evicts() {
        let f = fixture();
        f.family.check_entity_add(&f.matching);
        f.matching.remove::<ComponentTwo>();

        assert!(
            f.family
                .check_removed_component(&f.matching, ComponentTwo::component_type_id())
        );
        assert!(f.family.node_list().is_empty());
    }

    #[test]
    fn test_check_removed_component_ignores_irrelevant_kind() {
        let f = fixture();
        f.matching.add(OtherComponent);
        f.family.check_entity_add(&f.matching);
        f.matching.remove::<OtherComponent>();

        assert!(
            !f.family
                .check_removed_component(&f.matching, OtherComponent::component_type_id())
        );
        assert_eq!(f.family.node_list().len(), 1);
    }

    /// Shares `ComponentTwo`'s kind but is a different type.
    #[derive(Debug, Clone)]
    struct Impostor;
    impl Component for Impostor {
        fn type_name() -> &'static str {
            ComponentTwo::type_name()
        }
    }

    #[test]
    fn test_colliding_type_is_not_admitted() {
        let mut allocator = EntityAllocator::new();
        let family = Family::<TestNode>::new();
        let entity = Entity::new();
        entity.add(ComponentOne).add(Impostor);
        allocator.assign(&entity);

        assert!(!family.check_entity_add(&entity));
        assert!(
            !family.check_new_component(&entity, ComponentTwo::component_type_id())
        );
        assert!(family.node_list().is_empty());
        assert!(family.node_for(&entity).is_none());
    }

    #[test]
    fn test_clean_up_is_silent() {
        let f = fixture();
        let removed = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&removed);
        f.family.node_list().subscribe(
            NodeEvent::NodeRemoved,
            listener(move |_: &Node<TestNode>| *counter.borrow_mut() += 1),
        );
        f.family.check_entity_add(&f.matching);

        f.family.clean_up();
        assert!(f.family.node_list().is_empty());
        assert!(f.family.node_for(&f.matching).is_none());
        assert_eq!(*removed.borrow(), 0);

        // The entity can be admitted again after teardown.
        assert!(f.family.check_entity_add(&f.matching));
    }

    #[test]
    fn test_evict_all_announces() {
        let f = fixture();
        let removed = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&removed);
        f.family.node_list().subscribe(
            NodeEvent::NodeRemoved,
            listener(move |_: &Node<TestNode>| *counter.borrow_mut() += 1),
        );
        f.family.check_entity_add(&f.matching);

        f.family.evict_all();
        assert!(f.family.node_list().is_empty());
        assert!(f.family.node_for(&f.matching).is_none());
        assert_eq!(*removed.borrow(), 1);
    }

    #[test]
    fn test_relevance() {
        let family: Family<TestNode> = Family::new();
        assert!(family.is_relevant(ComponentOne::component_type_id()));
        assert!(!family.is_relevant(OtherComponent::component_type_id()));
        assert_eq!(family.required().len(), 2);
    }
}
