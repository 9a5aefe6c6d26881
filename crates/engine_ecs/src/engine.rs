//! The engine: owner of entities, systems, and families.
//!
//! The [`Engine`] assigns entity ids, relays every component change on a
//! tracked entity to each family, creates one family per node shape on
//! demand, and runs systems in priority order once per frame.
//!
//! ```text
//! entity.add(c) ──► ComponentAdded ──► relay ──► every family
//!                                                   │ check_new_component
//!                                                   ▼
//!                                    NodeList::add ──► NodeAdded ──► systems
//! ```

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use engine_component::{
    ComponentEvent, Entity, EntityAllocator, EntityEvent, EntityId, Listener, Shared, listener,
};

use crate::entity_list::EntityList;
use crate::family::{Family, FamilyHooks};
use crate::node::NodeShape;
use crate::node_list::NodeList;
use crate::system::{System, SystemEntry, SystemList};

/// Families keyed by node shape, in creation order.
#[derive(Default)]
struct FamilyRegistry {
    order: RefCell<Vec<Rc<dyn FamilyHooks>>>,
    by_shape: RefCell<HashMap<TypeId, Rc<dyn FamilyHooks>>>,
}

impl FamilyRegistry {
    fn get(&self, shape: TypeId) -> Option<Rc<dyn FamilyHooks>> {
        self.by_shape.borrow().get(&shape).cloned()
    }

    fn insert(&self, shape: TypeId, family: Rc<dyn FamilyHooks>) {
        self.order.borrow_mut().push(Rc::clone(&family));
        self.by_shape.borrow_mut().insert(shape, family);
    }

    fn remove(&self, shape: TypeId) -> Option<Rc<dyn FamilyHooks>> {
        let family = self.by_shape.borrow_mut().remove(&shape)?;
        self.order.borrow_mut().retain(|f| !Rc::ptr_eq(f, &family));
        Some(family)
    }

    /// Copy of the current families, so callbacks may create or release
    /// families while an event is being routed.
    fn snapshot(&self) -> Vec<Rc<dyn FamilyHooks>> {
        self.order.borrow().clone()
    }

    fn len(&self) -> usize {
        self.order.borrow().len()
    }
}

/// Build the listener that forwards one entity event channel to every family.
///
/// Holds the registry weakly: an entity that outlives its engine must not
/// keep the engine's families alive.
fn relay(families: &Rc<FamilyRegistry>, event: EntityEvent) -> Listener<ComponentEvent> {
    let families: Weak<FamilyRegistry> = Rc::downgrade(families);
    listener(move |change: &ComponentEvent| {
        let Some(families) = families.upgrade() else {
            return;
        };
        for family in families.snapshot() {
            match event {
                EntityEvent::ComponentAdded => {
                    family.check_new_component(&change.entity, change.component);
                }
                EntityEvent::ComponentRemoved => {
                    family.check_removed_component(&change.entity, change.component);
                }
            }
        }
    })
}

/// The root of the ECS: tracks entities, owns systems and families, and runs
/// the frame update.
///
/// # Examples
///
/// ```
/// use engine_ecs::{Component, Engine, Entity, node_shape};
///
/// #[derive(Debug, Clone)]
/// struct Position { x: f32 }
/// impl Component for Position {}
///
/// node_shape! {
///     struct Placed { position: Position }
/// }
///
/// let mut engine = Engine::new();
/// let entity = Entity::new();
/// entity.add(Position { x: 0.0 });
/// engine.add_entity(&entity);
///
/// let placed = engine.get_node_list::<Placed>();
/// assert_eq!(placed.len(), 1);
///
/// entity.remove::<Position>();
/// assert!(placed.is_empty());
/// ```
pub struct Engine {
    entities: EntityList,
    systems: SystemList,
    families: Rc<FamilyRegistry>,
    allocator: EntityAllocator,
    relay_added: Listener<ComponentEvent>,
    relay_removed: Listener<ComponentEvent>,
    /// Systems removed while their own update was running.
    pending_detach: Vec<SystemEntry>,
}

impl Engine {
    /// Create an engine with no entities, systems, or families.
    #[must_use]
    pub fn new() -> Self {
        let families = Rc::new(FamilyRegistry::default());
        Self {
            entities: EntityList::new(),
            systems: SystemList::new(),
            relay_added: relay(&families, EntityEvent::ComponentAdded),
            relay_removed: relay(&families, EntityEvent::ComponentRemoved),
            families,
            allocator: EntityAllocator::new(),
            pending_detach: Vec::new(),
        }
    }

    // -- Entities --

    /// Start tracking `entity`: assign it an id, watch its components, and
    /// offer it to every existing family.
    ///
    /// Adding an entity that is already tracked returns its id unchanged. An
    /// entity that already has an id belongs to another engine: it is refused,
    /// its id is returned, and nothing changes in either engine.
    pub fn add_entity(&mut self, entity: &Entity) -> EntityId {
        if let Some(id) = entity.id() {
            if self.entities.contains(entity) {
                debug!(entity = %id, "entity already tracked");
            } else {
                warn!(entity = %id, "entity is tracked by another engine; not added");
            }
            return id;
        }

        let id = self.allocator.assign(entity);
        self.entities.add(entity.clone());
        entity.subscribe(EntityEvent::ComponentAdded, Rc::clone(&self.relay_added));
        entity.subscribe(EntityEvent::ComponentRemoved, Rc::clone(&self.relay_removed));
        for family in self.families.snapshot() {
            family.check_entity_add(entity);
        }

        debug!(entity = %id, name = %entity.name(), "entity added");
        id
    }

    /// Stop tracking `entity`: evict it from every family and clear its id.
    ///
    /// The entity keeps its components. Returns `false` if it was not
    /// tracked.
    pub fn remove_entity(&mut self, entity: &Entity) -> bool {
        if !self.entities.contains(entity) {
            return false;
        }

        entity.unsubscribe(EntityEvent::ComponentAdded, &self.relay_added);
        entity.unsubscribe(EntityEvent::ComponentRemoved, &self.relay_removed);
        for family in self.families.snapshot() {
            family.check_entity_remove(entity);
        }
        self.entities.remove(entity);

        if let Some(id) = entity.id() {
            debug!(entity = %id, "entity removed");
        }
        self.allocator.release(entity);
        true
    }

    /// Remove every tracked entity, one at a time, front to back.
    pub fn remove_all_entities(&mut self) {
        while let Some(entity) = self.entities.at(0).cloned() {
            self.remove_entity(&entity);
        }
    }

    /// The tracked entities in the order they were added.
    #[must_use]
    pub fn entities(&self) -> &EntityList {
        &self.entities
    }

    /// Returns the number of tracked entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- Families --

    /// Returns the node list for shape `S`.
    ///
    /// The first request for a shape creates its family and offers it every
    /// tracked entity, so the list is complete on return. Later requests
    /// return the same list.
    pub fn get_node_list<S: NodeShape>(&mut self) -> NodeList<S> {
        let shape = TypeId::of::<S>();
        if let Some(existing) = self.families.get(shape)
            && let Some(family) = existing.as_any().downcast_ref::<Family<S>>()
        {
            return family.node_list();
        }

        let family = Rc::new(Family::<S>::new());
        self.families
            .insert(shape, Rc::clone(&family) as Rc<dyn FamilyHooks>);
        let entities: Vec<Entity> = self.entities.iter().cloned().collect();
        for entity in &entities {
            family.check_entity_add(entity);
        }

        debug!(
            shape = std::any::type_name::<S>(),
            nodes = family.node_list().len(),
            "family created"
        );
        family.node_list()
    }

    /// Tear down the family for shape `S`.
    ///
    /// Every node is evicted with a `NodeRemoved` announcement, and the next
    /// [`get_node_list`](Self::get_node_list) builds a fresh family. Returns
    /// `false` if no family existed for `S`.
    pub fn release_node_list<S: NodeShape>(&mut self) -> bool {
        let Some(family) = self.families.remove(TypeId::of::<S>()) else {
            return false;
        };
        family.evict_all();
        debug!(shape = family.shape_name(), "family released");
        true
    }

    /// Returns the number of families.
    #[must_use]
    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    // -- Systems --

    /// Add `system` with the given priority and return a handle to it.
    ///
    /// [`System::setup`] runs before the system joins the list. The system is
    /// placed after every system with a lower or equal priority.
    pub fn add_system<S: System>(&mut self, system: S, priority: i32) -> Shared<S> {
        let shared: Shared<S> = Rc::new(RefCell::new(system));
        shared.borrow_mut().setup(self);

        let entry = SystemEntry::new(Rc::clone(&shared), priority);
        debug!(system = entry.name(), priority, "system added");
        self.systems.add(entry);
        shared
    }

    /// Returns the first system of type `S`.
    #[must_use]
    pub fn get_system<S: System>(&self) -> Option<Shared<S>> {
        self.systems.get::<S>()
    }

    /// Returns the priority `system` was added with.
    #[must_use]
    pub fn system_priority<S: System>(&self, system: &Shared<S>) -> Option<i32> {
        self.systems
            .iter()
            .find(|entry| entry.holds(system))
            .map(SystemEntry::priority)
    }

    /// Remove `system` and call its [`System::detach`].
    ///
    /// A system that removes itself from inside its own update is detached
    /// as soon as that update returns. Returns `false` if the system was not
    /// in the list.
    pub fn remove_system<S: System>(&mut self, system: &Shared<S>) -> bool {
        match self.systems.remove(system) {
            Some(entry) => {
                self.detach(entry);
                true
            }
            None => false,
        }
    }

    /// Remove every system, one at a time, front to back.
    pub fn remove_all_systems(&mut self) {
        while let Some(entry) = self.systems.at(0).cloned() {
            if let Some(entry) = self.systems.remove_entry(&entry) {
                self.detach(entry);
            }
        }
    }

    /// The systems in execution order.
    #[must_use]
    pub fn systems(&self) -> &SystemList {
        &self.systems
    }

    /// Returns the number of systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    fn detach(&mut self, entry: SystemEntry) {
        let detached = match entry.system.try_borrow_mut() {
            Ok(mut system) => {
                system.detach(self);
                true
            }
            Err(_) => false,
        };

        if detached {
            debug!(system = entry.name(), "system removed");
        } else {
            self.pending_detach.push(entry);
        }
    }

    fn flush_detached(&mut self) {
        for entry in std::mem::take(&mut self.pending_detach) {
            self.detach(entry);
        }
    }

    // -- Frame --

    /// Run every system's update once, in priority order, with the same
    /// `time_delta_ms`.
    ///
    /// Systems may add or remove entities and systems while this runs. After
    /// each update the loop resumes after the system that just ran, or at the
    /// same position if that system was removed.
    pub fn update(&mut self, time_delta_ms: f64) {
        let mut index = 0;
        while let Some(entry) = self.systems.at(index).cloned() {
            match entry.system.try_borrow_mut() {
                Ok(mut system) => system.update(self, time_delta_ms),
                Err(_) => warn!(
                    system = entry.name(),
                    "system is already updating; skipping nested update"
                ),
            }
            self.flush_detached();

            index = match self.systems.index_of(&entry) {
                Some(position) => position + 1,
                None => index,
            };
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Detach systems before tearing down the state they observe.
        self.remove_all_systems();
        self.flush_detached();

        for entity in self.entities.iter() {
            entity.unsubscribe(EntityEvent::ComponentAdded, &self.relay_added);
            entity.unsubscribe(EntityEvent::ComponentRemoved, &self.relay_removed);
            self.allocator.release(entity);
        }
        for family in self.families.snapshot() {
            family.clean_up();
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("entities", &self.entities.len())
            .field("systems", &self.systems)
            .field("families", &self.families.len())
            .finish()
    }
}
