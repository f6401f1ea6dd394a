//! 2D transform component.
//!
//! [`Transform2D`] represents position, rotation, and scale in the level
//! plane. Sprites face right at positive `scale.x`; mirroring a character is
//! done by negating `scale.x`, which also mirrors any child offsets computed
//! through [`Transform2D::local_to_world`].

use darkwood_component::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position, rotation (degrees, counter-clockwise) and scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform2D {
    /// World-space position.
    pub position: Vec2,
    /// Rotation around the view axis, in degrees.
    pub rotation_deg: f32,
    /// Per-axis scale. A negative `x` mirrors the entity.
    pub scale: Vec2,
}

impl Transform2D {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation_deg: 0.0,
        scale: Vec2::ONE,
    };

    /// Create a new transform with the given position and default rotation/scale.
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Translate the transform by the given offset.
    #[must_use]
    pub fn translated(mut self, offset: Vec2) -> Self {
        self.position += offset;
        self
    }

    /// Rotate the transform by the given angle in degrees.
    #[must_use]
    pub fn rotated(mut self, degrees: f32) -> Self {
        self.rotation_deg += degrees;
        self
    }

    /// Apply a uniform scale factor.
    #[must_use]
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale *= factor;
        self
    }

    /// Whether the entity faces right (non-negative horizontal scale).
    #[must_use]
    pub fn facing_right(&self) -> bool {
        self.scale.x >= 0.0
    }

    /// `1.0` when facing right, `-1.0` when facing left.
    #[must_use]
    pub fn facing_sign(&self) -> f32 {
        if self.facing_right() { 1.0 } else { -1.0 }
    }

    /// Face the given direction by setting the sign of `scale.x`, keeping its magnitude.
    pub fn set_facing(&mut self, right: bool) {
        let magnitude = self.scale.x.abs();
        self.scale.x = if right { magnitude } else { -magnitude };
    }

    /// Unit vector along the local x axis after rotation.
    #[must_use]
    pub fn right(&self) -> Vec2 {
        Vec2::from_angle(self.rotation_deg.to_radians())
    }

    /// Map a child offset into world space (scale, then rotate, then translate).
    #[must_use]
    pub fn local_to_world(&self, local: Vec2) -> Vec2 {
        let scaled = local * self.scale;
        self.position + Vec2::from_angle(self.rotation_deg.to_radians()).rotate(scaled)
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform2D {
    fn type_name() -> &'static str {
        "Transform2D"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_identity_transform() {
        let t = Transform2D::IDENTITY;
        assert_eq!(t.position, Vec2::ZERO);
        assert_eq!(t.rotation_deg, 0.0);
        assert_eq!(t.scale, Vec2::ONE);
        assert!(t.facing_right());
    }

    #[test]
    fn test_translated() {
        let t = Transform2D::IDENTITY.translated(Vec2::new(5.0, 0.0));
        assert_eq!(t.position, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_set_facing_keeps_magnitude() {
        let mut t = Transform2D::IDENTITY.scaled(2.0);
        t.set_facing(false);
        assert_eq!(t.scale.x, -2.0);
        assert_eq!(t.facing_sign(), -1.0);
        t.set_facing(false);
        assert_eq!(t.scale.x, -2.0);
        t.set_facing(true);
        assert_eq!(t.scale.x, 2.0);
    }

    #[test]
    fn test_local_to_world_mirrors_with_facing() {
        let mut t = Transform2D::from_position(Vec2::new(10.0, 1.0));
        assert!(approx(t.local_to_world(Vec2::new(0.8, 0.0)), Vec2::new(10.8, 1.0)));
        t.set_facing(false);
        assert!(approx(t.local_to_world(Vec2::new(0.8, 0.0)), Vec2::new(9.2, 1.0)));
    }

    #[test]
    fn test_right_follows_rotation() {
        let t = Transform2D::IDENTITY.rotated(90.0);
        assert!(approx(t.right(), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn test_json_roundtrip() {
        let t = Transform2D::from_position(Vec2::new(1.0, 2.0)).rotated(45.0);
        let json = serde_json::to_string(&t).unwrap();
        let restored: Transform2D = serde_json::from_str(&json).unwrap();
        assert_eq!(t, restored);
    }
}
