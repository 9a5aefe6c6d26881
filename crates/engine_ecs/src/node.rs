//! Node shapes and nodes.
//!
//! A [`NodeShape`] names the component kinds a system needs and knows how to
//! bundle them from one entity. A [`Node`] is one such bundle, created by a
//! [`Family`](crate::Family) when an entity qualifies and dropped when it
//! stops qualifying. Nodes are never rebound in place.

use std::ops::Deref;
use std::rc::Rc;

use engine_component::{ComponentTypeId, Entity};

/// The declared shape of a node: which components it requires and how to
/// bind them from an entity.
///
/// Implement it by hand or with [`node_shape!`](crate::node_shape). The
/// implementing type's identity is the key under which an
/// [`Engine`](crate::Engine) caches the shape's family.
pub trait NodeShape: Sized + 'static {
    /// The component kinds an entity must have to get a node of this shape.
    fn required() -> Vec<ComponentTypeId>;

    /// Bind every field to the entity's current component.
    ///
    /// Returns `None` if a required component is missing.
    fn bind(entity: &Entity) -> Option<Self>;
}

struct NodeData<S> {
    entity: Entity,
    fields: S,
}

/// A shared, read-only view of one entity through shape `S`.
///
/// Dereferences to `S`, so node fields are read directly:
/// `node.position.borrow().x`.
pub struct Node<S> {
    data: Rc<NodeData<S>>,
}

impl<S> Node<S> {
    pub(crate) fn new(entity: Entity, fields: S) -> Self {
        Self {
            data: Rc::new(NodeData { entity, fields }),
        }
    }

    /// The entity this node was built from.
    #[must_use]
    pub fn entity(&self) -> &Entity {
        &self.data.entity
    }

    /// Returns `true` if both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Node<S>) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl<S> Deref for Node<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.data.fields
    }
}

impl<S> Clone for Node<S> {
    fn clone(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
        }
    }
}

impl<S> PartialEq for Node<S> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<S> Eq for Node<S> {}

impl<S> std::fmt::Debug for Node<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("shape", &std::any::type_name::<S>())
            .field("entity", &self.data.entity.id())
            .finish()
    }
}

/// Declare a node shape struct whose fields are shared component handles.
///
/// ```rust
/// use engine_ecs::{Component, node_shape};
///
/// #[derive(Debug, Clone)]
/// pub struct Position { pub x: f32 }
/// impl Component for Position {}
///
/// #[derive(Debug, Clone)]
/// pub struct Motion { pub dx: f32 }
/// impl Component for Motion {}
///
/// node_shape! {
///     /// Entities that move.
///     pub struct Movement {
///         pub position: Position,
///         pub motion: Motion,
///     }
/// }
/// ```
///
/// expands to a `Movement { position: Shared<Position>, motion: Shared<Motion> }`
/// struct with a [`NodeShape`] impl requiring both components.
#[macro_export]
macro_rules! node_shape {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $component:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $crate::Shared<$component>,
            )*
        }

        impl $crate::NodeShape for $name {
            fn required() -> ::std::vec::Vec<$crate::ComponentTypeId> {
                ::std::vec![
                    $(<$component as $crate::Component>::component_type_id()),*
                ]
            }

            fn bind(entity: &$crate::Entity) -> ::std::option::Option<Self> {
                ::std::option::Option::Some(Self {
                    $($field: entity.get::<$component>()?,)*
                })
            }
        }
    };
}
