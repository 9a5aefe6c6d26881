//! Systems and the priority-ordered system list.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use engine_component::Shared;

use crate::engine::Engine;

/// Per-frame behaviour operating over one or more node lists.
///
/// Every hook defaults to a no-op. A system typically fetches its node lists
/// in [`setup`](System::setup) and walks them in [`update`](System::update).
///
/// # Examples
///
/// ```
/// use engine_ecs::{Engine, NodeList, System, Component, node_shape};
///
/// #[derive(Debug, Clone)]
/// struct Health { current: f32 }
/// impl Component for Health {}
///
/// node_shape! {
///     struct Living { health: Health }
/// }
///
/// #[derive(Default)]
/// struct Regeneration { nodes: Option<NodeList<Living>> }
///
/// impl System for Regeneration {
///     fn setup(&mut self, engine: &mut Engine) {
///         self.nodes = Some(engine.get_node_list::<Living>());
///     }
///
///     fn update(&mut self, _engine: &mut Engine, time_delta_ms: f64) {
///         for node in self.nodes.iter().flat_map(NodeList::iter) {
///             node.health.borrow_mut().current += time_delta_ms as f32 / 1000.0;
///         }
///     }
/// }
/// ```
pub trait System: 'static {
    /// Called once when the system is added, before it is placed in the
    /// system list.
    fn setup(&mut self, _engine: &mut Engine) {}

    /// Called once per frame with the time since the previous frame, in
    /// milliseconds.
    fn update(&mut self, _engine: &mut Engine, _time_delta_ms: f64) {}

    /// Called once when the system is removed.
    fn detach(&mut self, _engine: &mut Engine) {}

    /// Returns the name of this system for debugging purposes.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Named execution priorities. Lower values run first; any `i32` is valid.
pub struct SystemPriority;

impl SystemPriority {
    /// Runs before everything else.
    pub const FIRST: i32 = i32::MIN;
    /// Input and other work that feeds the main update.
    pub const EARLY: i32 = -1000;
    /// The default for gameplay systems.
    pub const NORMAL: i32 = 0;
    /// Work that reacts to the main update.
    pub const LATE: i32 = 1000;
    /// Runs after everything else.
    pub const LAST: i32 = i32::MAX;
}

/// A system in the list together with its priority.
#[derive(Clone)]
pub struct SystemEntry {
    priority: i32,
    type_id: TypeId,
    name: String,
    pub(crate) system: Rc<RefCell<dyn System>>,
    handle: Rc<dyn Any>,
}

impl SystemEntry {
    pub(crate) fn new<S: System>(system: Shared<S>, priority: i32) -> Self {
        let name = system.borrow().name().to_owned();
        Self {
            priority,
            type_id: TypeId::of::<S>(),
            name,
            system: Rc::clone(&system) as Rc<RefCell<dyn System>>,
            handle: system,
        }
    }

    /// The priority the system was added with.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The system's name, captured when it was added.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the typed handle if this entry holds an `S`.
    #[must_use]
    pub fn downcast<S: System>(&self) -> Option<Shared<S>> {
        Rc::clone(&self.handle).downcast::<RefCell<S>>().ok()
    }

    /// Returns `true` if this entry holds `system`.
    #[must_use]
    pub fn holds<S: System>(&self, system: &Shared<S>) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.handle), Rc::as_ptr(system))
    }

    fn same(&self, other: &SystemEntry) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }
}

impl std::fmt::Debug for SystemEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Systems in ascending priority order. Systems with equal priority keep the
/// order in which they were added.
#[derive(Debug, Default)]
pub struct SystemList {
    entries: Vec<SystemEntry>,
}

impl SystemList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert `entry` before the first entry with a strictly greater priority.
    pub fn add(&mut self, entry: SystemEntry) {
        let index = self
            .entries
            .iter()
            .position(|e| e.priority > entry.priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
    }

    /// Remove `system` and return its entry.
    pub fn remove<S: System>(&mut self, system: &Shared<S>) -> Option<SystemEntry> {
        let index = self.entries.iter().position(|e| e.holds(system))?;
        Some(self.entries.remove(index))
    }

    /// Remove the system held by `entry`.
    pub fn remove_entry(&mut self, entry: &SystemEntry) -> Option<SystemEntry> {
        let index = self.index_of(entry)?;
        Some(self.entries.remove(index))
    }

    /// Remove every system without calling any hook.
    pub fn remove_all(&mut self) {
        self.entries.clear();
    }

    /// Returns `true` if `system` is in the list.
    #[must_use]
    pub fn contains<S: System>(&self, system: &Shared<S>) -> bool {
        self.entries.iter().any(|e| e.holds(system))
    }

    /// Returns the first system of type `S`.
    #[must_use]
    pub fn get<S: System>(&self) -> Option<Shared<S>> {
        self.entries
            .iter()
            .find(|e| e.type_id == TypeId::of::<S>())
            .and_then(SystemEntry::downcast::<S>)
    }

    /// Returns the entry at `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&SystemEntry> {
        self.entries.get(index)
    }

    /// Returns the current position of the system held by `entry`.
    #[must_use]
    pub fn index_of(&self, entry: &SystemEntry) -> Option<usize> {
        self.entries.iter().position(|e| e.same(entry))
    }

    /// Returns the number of systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &SystemEntry> {
        self.entries.iter()
    }
}
