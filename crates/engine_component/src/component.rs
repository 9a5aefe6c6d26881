//! Core [`Component`] trait and associated metadata.
//!
//! Every piece of data attached to an [`Entity`](crate::Entity) must implement
//! [`Component`]. Components are plain data: the only behaviour the framework
//! needs from them is a way to copy their value when an entity is duplicated.
//!
//! ## Type Identity
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 64-bit hash algorithm. The id is computed from the declared
//! type, not from the runtime value, so it is stable across runs and usable
//! as a plain map key.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared, interior-mutable handle to a component instance.
///
/// Entities, nodes, and systems all hold the same `Shared<T>` for a given
/// component, so a mutation through a node is visible on the entity.
pub type Shared<T> = Rc<RefCell<T>>;

/// A unique identifier for a component type, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] from a component's string name using
    /// the FNV-1a 64-bit hash algorithm.
    ///
    /// # Algorithm (FNV-1a 64-bit)
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325          (offset basis)
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3  (prime)
    /// return hash
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

impl std::fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({:#018x})", self.0)
    }
}

/// Metadata about a component type, used for type-erased storage.
#[derive(Debug, Clone, Copy)]
pub struct ComponentMeta {
    /// The unique type identifier.
    pub type_id: ComponentTypeId,
    /// The human-readable name of the component.
    pub name: &'static str,
    /// Copy the value behind a type-erased `Shared<Self>` into a fresh
    /// allocation. Returns `None` if the value is mutably borrowed.
    pub clone_fn: fn(&Rc<dyn Any>) -> Option<Rc<dyn Any>>,
}

/// The core component trait.
///
/// Components are plain data records. `Clone` is required so that
/// [`Entity::duplicate`](crate::Entity::duplicate) can give the copy its own
/// values instead of sharing the original's.
///
/// # Examples
///
/// ```rust
/// use engine_component::Component;
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: Clone + 'static {
    /// A human-readable name for this component type.
    ///
    /// Defaults to the fully-qualified Rust path of the type. Two components
    /// that override this with the same string share a [`ComponentTypeId`].
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }

    /// Returns the [`ComponentMeta`] descriptor for this component type.
    fn meta() -> ComponentMeta {
        ComponentMeta {
            type_id: Self::component_type_id(),
            name: Self::type_name(),
            clone_fn: |erased: &Rc<dyn Any>| {
                let cell = erased.downcast_ref::<RefCell<Self>>()?;
                let value = cell.try_borrow().ok()?.clone();
                Some(Rc::new(RefCell::new(value)) as Rc<dyn Any>)
            },
        }
    }
}

/// A type-erased reference to a component stored on an entity.
///
/// Returned by [`Entity::components`](crate::Entity::components). Holding a
/// `ComponentRef` keeps the component alive even after it is removed from its
/// entity.
#[derive(Clone)]
pub struct ComponentRef {
    meta: ComponentMeta,
    value: Rc<dyn Any>,
}

impl ComponentRef {
    pub(crate) fn new<T: Component>(value: Shared<T>) -> Self {
        Self {
            meta: T::meta(),
            value,
        }
    }

    /// The component's type id.
    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        self.meta.type_id
    }

    /// The component's type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.meta.name
    }

    /// Returns the typed handle if this component is a `T`.
    #[must_use]
    pub fn downcast<T: Component>(&self) -> Option<Shared<T>> {
        Rc::clone(&self.value).downcast::<RefCell<T>>().ok()
    }

    /// Returns `true` if this component is a `T`, not merely a component
    /// whose kind shares `T`'s [`ComponentTypeId`].
    #[must_use]
    pub fn is<T: Component>(&self) -> bool {
        self.value.is::<RefCell<T>>()
    }

    /// Returns `true` if both refs point at the same component instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &ComponentRef) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }

    /// Copy the component value into a new, unshared instance.
    pub(crate) fn duplicate(&self) -> Option<ComponentRef> {
        let value = (self.meta.clone_fn)(&self.value)?;
        Some(Self {
            meta: self.meta,
            value,
        })
    }
}

impl std::fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRef")
            .field("name", &self.meta.name)
            .field("type_id", &self.meta.type_id)
            .finish()
    }
}
