//! Component-layer error types.

use crate::component::ComponentTypeId;

/// Errors raised by entity operations that cannot complete.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// A component could not be copied because it is mutably borrowed.
    #[error("component '{name}' ({type_id}) is mutably borrowed and cannot be copied")]
    ComponentBorrowed {
        /// Name of the locked component type.
        name: &'static str,
        /// Id of the locked component type.
        type_id: ComponentTypeId,
    },

    /// Two different Rust types resolved to the same component kind.
    #[error("component '{incoming}' collides with stored '{existing}' on kind {type_id}")]
    KindCollision {
        /// Name of the component already on the entity.
        existing: &'static str,
        /// Name of the component that was being added.
        incoming: &'static str,
        /// The shared kind.
        type_id: ComponentTypeId,
    },
}
