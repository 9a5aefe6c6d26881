//! # engine_ecs
//!
//! The "S" in ECS, plus the indexing that makes it cheap.
//!
//! Systems never query entities directly. They ask the [`Engine`] for the
//! [`NodeList`] of a [`NodeShape`], and a [`Family`] keeps that list current
//! as entities gain and lose components. Each change costs one check per
//! family, never a scan of every entity.
//!
//! ```text
//! Engine ──┬── EntityList        tracked entities, insertion order
//!          ├── SystemList        systems, ascending priority
//!          └── Family<S> ...     one per requested shape
//!                 └── NodeList<S> ──► shared with systems
//! ```

pub mod engine;
pub mod entity_list;
pub mod family;
pub mod node;
pub mod node_list;
pub mod system;

pub use engine::Engine;
pub use entity_list::EntityList;
pub use family::Family;
pub use node::{Node, NodeShape};
pub use node_list::{Iter, NodeEvent, NodeList};
pub use system::{System, SystemEntry, SystemList, SystemPriority};

pub use engine_component::{
    Component, ComponentEvent, ComponentTypeId, EcsError, Entity, EntityEvent, EntityId,
    Listener, Shared, listener,
};
