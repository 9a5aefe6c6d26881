//! Entities, entity identifiers, and id allocation.
//!
//! An [`Entity`] is a shared handle to a set of components, at most one per
//! [`ComponentTypeId`]. Cloning the handle does not copy the entity; use
//! [`Entity::duplicate`] for that. Every component change is announced on one
//! of the entity's two signals (see [`EntityEvent`]).
//!
//! An entity has no [`EntityId`] until an [`EntityAllocator`] assigns one,
//! which only the engine that tracks the entity does.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::warn;

use crate::component::{Component, ComponentRef, ComponentTypeId, Shared};
use crate::error::EcsError;
use crate::signal::{Listener, Signal};

/// A unique entity identifier, assigned when an entity joins an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create an entity id from a raw `u64`.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// The two event channels of an [`Entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityEvent {
    /// A component was stored on the entity.
    ComponentAdded,
    /// A component was taken off the entity.
    ComponentRemoved,
}

/// Payload of both entity signals.
#[derive(Debug, Clone)]
pub struct ComponentEvent {
    /// The entity whose components changed.
    pub entity: Entity,
    /// The kind of component that was added or removed.
    pub component: ComponentTypeId,
}

struct EntityData {
    id: Cell<Option<EntityId>>,
    name: RefCell<String>,
    components: RefCell<HashMap<ComponentTypeId, ComponentRef>>,
    component_added: Signal<ComponentEvent>,
    component_removed: Signal<ComponentEvent>,
}

/// A shared handle to an entity.
///
/// Equality is identity: two handles are equal when they refer to the same
/// entity.
///
/// # Examples
///
/// ```rust
/// use engine_component::{Component, Entity};
///
/// #[derive(Debug, Clone)]
/// struct Position { x: f32, y: f32 }
/// impl Component for Position {}
///
/// let entity = Entity::new();
/// entity.add(Position { x: 1.0, y: 2.0 });
/// assert!(entity.has::<Position>());
/// assert_eq!(entity.get::<Position>().unwrap().borrow().x, 1.0);
/// ```
#[derive(Clone)]
pub struct Entity {
    data: Rc<EntityData>,
}

impl Entity {
    /// Create an empty, unattached entity.
    #[must_use]
    pub fn new() -> Self {
        Self::named("")
    }

    /// Create an empty, unattached entity with a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            data: Rc::new(EntityData {
                id: Cell::new(None),
                name: RefCell::new(name.into()),
                components: RefCell::new(HashMap::new()),
                component_added: Signal::new(),
                component_removed: Signal::new(),
            }),
        }
    }

    /// The id assigned by the tracking engine, or `None` when untracked.
    #[must_use]
    pub fn id(&self) -> Option<EntityId> {
        self.data.id.get()
    }

    /// The entity's name.
    #[must_use]
    pub fn name(&self) -> String {
        self.data.name.borrow().clone()
    }

    /// Rename the entity.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.data.name.borrow_mut() = name.into();
    }

    /// Store `component`, replacing any component of the same kind.
    ///
    /// A replacement announces the removal of the old component before the
    /// addition of the new one. If the entity already holds a component of a
    /// different Rust type under the same kind, the entity is left unchanged
    /// and a warning is logged; use [`try_add`](Self::try_add) to handle that
    /// case as an error.
    pub fn add<T: Component>(&self, component: T) -> &Self {
        if let Err(err) = self.try_add(component) {
            warn!(entity = ?self.id(), %err, "component not added");
        }
        self
    }

    /// Store `component`, replacing any component of the same Rust type.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::KindCollision`] if a component of a different Rust
    /// type is stored under `T`'s kind. Nothing is removed or announced.
    pub fn try_add<T: Component>(&self, component: T) -> Result<&Self, EcsError> {
        let kind = T::component_type_id();
        if let Some(existing) = self.get_kind(kind) {
            if !existing.is::<T>() {
                return Err(EcsError::KindCollision {
                    existing: existing.name(),
                    incoming: T::type_name(),
                    type_id: kind,
                });
            }
            self.remove_kind(kind);
        }

        let shared: Shared<T> = Rc::new(RefCell::new(component));
        self.data
            .components
            .borrow_mut()
            .insert(kind, ComponentRef::new(shared));
        self.data.component_added.dispatch(&ComponentEvent {
            entity: self.clone(),
            component: kind,
        });
        Ok(self)
    }

    /// Remove the `T` component and hand it back.
    ///
    /// Returns `None` (and announces nothing) if the entity has no `T`.
    pub fn remove<T: Component>(&self) -> Option<Shared<T>> {
        if !self.has::<T>() {
            return None;
        }
        self.remove_kind(T::component_type_id())?.downcast::<T>()
    }

    /// Remove the component of the given kind and hand it back.
    ///
    /// Returns `None` (and announces nothing) if no component of that kind is
    /// stored.
    pub fn remove_kind(&self, kind: ComponentTypeId) -> Option<ComponentRef> {
        let removed = self.data.components.borrow_mut().remove(&kind)?;
        self.data.component_removed.dispatch(&ComponentEvent {
            entity: self.clone(),
            component: kind,
        });
        Some(removed)
    }

    /// Returns `true` if the entity has a `T` component.
    ///
    /// Agrees with [`get`](Self::get): a different type stored under the same
    /// kind does not count.
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.data
            .components
            .borrow()
            .get(&T::component_type_id())
            .is_some_and(ComponentRef::is::<T>)
    }

    /// Returns `true` if the entity has a component of the given kind.
    #[must_use]
    pub fn has_kind(&self, kind: ComponentTypeId) -> bool {
        self.data.components.borrow().contains_key(&kind)
    }

    /// Returns the entity's `T` component.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<Shared<T>> {
        self.get_kind(T::component_type_id())?.downcast::<T>()
    }

    /// Returns the component of the given kind, type-erased.
    #[must_use]
    pub fn get_kind(&self, kind: ComponentTypeId) -> Option<ComponentRef> {
        self.data.components.borrow().get(&kind).cloned()
    }

    /// Returns all components. The order is unspecified.
    #[must_use]
    pub fn components(&self) -> Vec<ComponentRef> {
        self.data.components.borrow().values().cloned().collect()
    }

    /// Returns the number of components on the entity.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.data.components.borrow().len()
    }

    /// Create a new, unattached entity holding copies of every component.
    ///
    /// The copy has no id, an empty name, and no listeners. Mutating a
    /// component of the copy never affects the original.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentBorrowed`] if a component is mutably
    /// borrowed at the time of the call.
    pub fn duplicate(&self) -> Result<Entity, EcsError> {
        let copy = Entity::new();
        {
            let source = self.data.components.borrow();
            let mut target = copy.data.components.borrow_mut();
            for (kind, component) in source.iter() {
                let fresh = component
                    .duplicate()
                    .ok_or(EcsError::ComponentBorrowed {
                        name: component.name(),
                        type_id: *kind,
                    })?;
                target.insert(*kind, fresh);
            }
        }
        Ok(copy)
    }

    /// The signal for one event channel.
    #[must_use]
    pub fn signal(&self, event: EntityEvent) -> &Signal<ComponentEvent> {
        match event {
            EntityEvent::ComponentAdded => &self.data.component_added,
            EntityEvent::ComponentRemoved => &self.data.component_removed,
        }
    }

    /// Subscribe `listener` to one event channel.
    pub fn subscribe(&self, event: EntityEvent, listener: Listener<ComponentEvent>) {
        self.signal(event).subscribe(listener);
    }

    /// Remove the first registration of `listener` from one event channel.
    pub fn unsubscribe(&self, event: EntityEvent, listener: &Listener<ComponentEvent>) -> bool {
        self.signal(event).unsubscribe(listener)
    }

    /// Returns `true` if both handles refer to the same entity.
    #[must_use]
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Entity {}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let components: Vec<&'static str> = self
            .data
            .components
            .borrow()
            .values()
            .map(ComponentRef::name)
            .collect();
        f.debug_struct("Entity")
            .field("id", &self.id())
            .field("name", &*self.data.name.borrow())
            .field("components", &components)
            .finish()
    }
}

/// Allocates monotonically increasing entity IDs.
///
/// The allocator is the only way to give an [`Entity`] an id or take it away,
/// so whoever owns the allocator owns entity identity. IDs start at 1 and are
/// never reused.
#[derive(Debug)]
pub struct EntityAllocator {
    next_id: u64,
}

impl EntityAllocator {
    /// Creates a new allocator.
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Assigns a fresh id to `entity`, overwriting any previous one.
    pub fn assign(&mut self, entity: &Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.data.id.set(Some(id));
        id
    }

    /// Clears the id of `entity`.
    pub fn release(&mut self, entity: &Entity) {
        entity.data.id.set(None);
    }

    /// Returns the number of ids handed out so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
