//! Rigid body component.

use darkwood_component::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::layers::Layers;

/// How a body responds to the physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyKind {
    /// Affected by gravity and forces, blocked by solid colliders.
    #[default]
    Dynamic,
    /// Moves by its velocity only. Ignores gravity, forces and collisions.
    Kinematic,
}

/// How [`Body::add_force`] interprets its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceMode {
    /// Continuous force, integrated over the next step (`f / m * dt`).
    Force,
    /// Instant velocity change (`f / m`).
    Impulse,
}

/// A moving box. The box is centred on the entity's transform position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub velocity: Vec2,
    pub gravity_scale: f32,
    pub mass: f32,
    pub kind: BodyKind,
    pub half_extents: Vec2,
    /// Layer the body's own collider lives on.
    pub layer: Layers,
    /// Solid layers that block this body.
    pub collides_with: Layers,
    /// Restitution applied on a blocked axis. `0` stops dead.
    pub bounciness: f32,
    /// Whether the body takes part in the step at all.
    pub simulated: bool,
    #[serde(skip)]
    pending_force: Vec2,
}

impl Body {
    /// A unit-mass dynamic body with the given half extents on `layer`,
    /// blocked by the ground.
    #[must_use]
    pub fn dynamic(half_extents: Vec2, layer: Layers) -> Self {
        Self {
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            mass: 1.0,
            kind: BodyKind::Dynamic,
            half_extents,
            layer,
            collides_with: Layers::GROUND,
            bounciness: 0.0,
            simulated: true,
            pending_force: Vec2::ZERO,
        }
    }

    /// A kinematic body that moves only by its velocity.
    #[must_use]
    pub fn kinematic(half_extents: Vec2, layer: Layers) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            gravity_scale: 0.0,
            ..Self::dynamic(half_extents, layer)
        }
    }

    #[must_use]
    pub fn with_gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    #[must_use]
    pub fn with_collides_with(mut self, mask: Layers) -> Self {
        self.collides_with = mask;
        self
    }

    #[must_use]
    pub fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness;
        self
    }

    /// Apply a force or impulse. Impulses change velocity immediately;
    /// forces accumulate until the next step.
    pub fn add_force(&mut self, force: Vec2, mode: ForceMode) {
        let mass = self.mass.max(f32::EPSILON);
        match mode {
            ForceMode::Force => self.pending_force += force,
            ForceMode::Impulse => self.velocity += force / mass,
        }
    }

    /// Forces accumulated since the last step.
    #[must_use]
    pub fn pending_force(&self) -> Vec2 {
        self.pending_force
    }

    /// Integrate gravity and pending forces into the velocity and clear the
    /// accumulator. Kinematic bodies only drop their pending forces.
    pub fn integrate(&mut self, gravity: Vec2, dt: f32) {
        let force = std::mem::take(&mut self.pending_force);
        if self.kind == BodyKind::Kinematic {
            return;
        }
        let mass = self.mass.max(f32::EPSILON);
        self.velocity += gravity * self.gravity_scale * dt + force / mass * dt;
    }

    /// Switch to kinematic, stopping the body and removing gravity.
    pub fn freeze(&mut self) {
        self.kind = BodyKind::Kinematic;
        self.velocity = Vec2::ZERO;
        self.gravity_scale = 0.0;
        self.pending_force = Vec2::ZERO;
    }
}

impl Component for Body {
    fn type_name() -> &'static str {
        "Body"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    #[test]
    fn test_force_is_applied_on_integrate() {
        let mut body = Body::dynamic(Vec2::splat(0.5), Layers::PLAYER).with_gravity_scale(0.0);
        body.add_force(Vec2::new(0.0, 400.0), ForceMode::Force);
        assert_eq!(body.velocity, Vec2::ZERO);
        body.integrate(Vec2::new(0.0, -9.81), DT);
        assert!((body.velocity.y - 8.0).abs() < 1e-4);
        assert_eq!(body.pending_force(), Vec2::ZERO);
    }

    #[test]
    fn test_impulse_is_immediate() {
        let mut body = Body::dynamic(Vec2::splat(0.5), Layers::ENEMY);
        body.mass = 2.0;
        body.add_force(Vec2::new(10.0, 0.0), ForceMode::Impulse);
        assert_eq!(body.velocity, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_gravity_scaled() {
        let mut body = Body::dynamic(Vec2::splat(0.5), Layers::ENEMY).with_gravity_scale(0.5);
        body.integrate(Vec2::new(0.0, -10.0), 1.0);
        assert_eq!(body.velocity, Vec2::new(0.0, -5.0));
    }

    #[test]
    fn test_kinematic_ignores_forces_and_gravity() {
        let mut body = Body::kinematic(Vec2::splat(0.5), Layers::ENEMY);
        body.velocity = Vec2::new(1.0, 0.0);
        body.add_force(Vec2::new(0.0, 100.0), ForceMode::Force);
        body.integrate(Vec2::new(0.0, -9.81), DT);
        assert_eq!(body.velocity, Vec2::new(1.0, 0.0));
        assert_eq!(body.pending_force(), Vec2::ZERO);
    }

    #[test]
    fn test_freeze() {
        let mut body = Body::dynamic(Vec2::splat(0.5), Layers::ENEMY);
        body.velocity = Vec2::new(3.0, -2.0);
        body.freeze();
        assert_eq!(body.kind, BodyKind::Kinematic);
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.gravity_scale, 0.0);
    }
}
