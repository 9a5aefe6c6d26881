//! # engine_math
//!
//! Math types for the ECS. Re-exports [`glam`] for linear algebra and
//! defines 2D spatial types that implement
//! [`Component`](engine_component::Component).

pub mod kinematics;

// Re-export glam types for convenience.
pub use glam::{Mat2, Vec2};

pub use kinematics::{Motion, Position};
