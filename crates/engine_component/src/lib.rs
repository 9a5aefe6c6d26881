//! # engine_component
//!
//! The "E" and "C" in ECS: what a component is, how an entity holds its
//! components, and how component changes are announced.
//!
//! This crate provides:
//!
//! - [`Component`] trait, the contract all component data must satisfy.
//! - [`ComponentTypeId`], the map key identifying a component kind.
//! - [`Entity`], a shared handle holding at most one component per kind.
//! - [`EntityAllocator`], the monotonically increasing id allocator.
//! - [`Signal`], the synchronous publish/subscribe primitive behind every
//!   change notification.

pub mod component;
pub mod entity;
pub mod error;
pub mod signal;

pub use component::{Component, ComponentMeta, ComponentRef, ComponentTypeId, Shared};
pub use entity::{ComponentEvent, Entity, EntityAllocator, EntityEvent, EntityId};
pub use error::EcsError;
pub use signal::{Listener, Signal, listener};
