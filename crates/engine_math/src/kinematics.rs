//! 2D kinematics components.
//!
//! [`Position`] places an entity on a plane with a heading. [`Motion`]
//! carries the velocities that move it, plus an optional damping that bleeds
//! velocity off along the current heading.

use engine_component::Component;
use glam::Vec2;

/// Location and heading on a 2D plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// World-space position.
    pub position: Vec2,
    /// Heading in radians.
    pub rotation: f32,
}

impl Position {
    /// A position at `position` with zero rotation.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }

    /// Set the heading.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Wrap the position into `[0, bounds]` on both axes, by at most one
    /// period per axis.
    pub fn wrap(&mut self, bounds: Vec2) {
        if self.position.x < 0.0 {
            self.position.x += bounds.x;
        }
        if self.position.x > bounds.x {
            self.position.x -= bounds.x;
        }
        if self.position.y < 0.0 {
            self.position.y += bounds.y;
        }
        if self.position.y > bounds.y {
            self.position.y -= bounds.y;
        }
    }
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// Linear and angular velocity with damping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    /// Units per second.
    pub velocity: Vec2,
    /// Radians per second.
    pub angular_velocity: f32,
    /// Velocity lost per second along the heading. Zero disables damping.
    pub damping: f32,
}

impl Motion {
    /// Motion with the given velocity and no spin or damping.
    #[must_use]
    pub fn new(velocity: Vec2) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    #[must_use]
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Advance `position` by `seconds`, then apply damping to the velocity.
    pub fn integrate(&mut self, position: &mut Position, seconds: f32) {
        position.position += self.velocity * seconds;
        position.rotation += self.angular_velocity * seconds;

        if self.damping > 0.0 {
            let (sin, cos) = position.rotation.sin_cos();
            let damp = Vec2::new(cos, sin).abs() * self.damping * seconds;
            self.velocity.x = damp_axis(self.velocity.x, damp.x);
            self.velocity.y = damp_axis(self.velocity.y, damp.y);
        }
    }
}

/// Move `velocity` toward zero by `amount`, stopping at zero.
fn damp_axis(velocity: f32, amount: f32) -> f32 {
    if velocity > amount {
        velocity - amount
    } else if velocity < -amount {
        velocity + amount
    } else {
        0.0
    }
}

impl Component for Motion {
    fn type_name() -> &'static str {
        "Motion"
    }
}
