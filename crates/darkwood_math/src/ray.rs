//! Rays.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A half-line with a normalised direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray2 {
    pub origin: Vec2,
    pub direction: Vec2,
}

impl Ray2 {
    /// Build a ray. Returns `None` for a zero direction.
    #[must_use]
    pub fn new(origin: Vec2, direction: Vec2) -> Option<Self> {
        Some(Self {
            origin,
            direction: direction.try_normalize()?,
        })
    }

    /// The ray from `from` through `to`, with the segment length.
    #[must_use]
    pub fn between(from: Vec2, to: Vec2) -> Option<(Self, f32)> {
        Self::new(from, to - from).map(|ray| (ray, from.distance(to)))
    }

    #[must_use]
    pub fn point_at(&self, distance: f32) -> Vec2 {
        self.origin + self.direction * distance
    }
}
