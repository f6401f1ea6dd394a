//! # darkwood_math
//!
//! 2D math for the game. Re-exports [`glam`] for linear algebra and defines
//! the spatial types gameplay code shares: the [`Transform2D`] component,
//! axis-aligned boxes, and the smoothing helpers used for movement.

pub mod aabb;
pub mod ray;
pub mod smoothing;
pub mod transform;

pub use glam::{Mat2, Vec2};

pub use aabb::{Aabb, RayHit};
pub use ray::Ray2;
pub use smoothing::{inverse_lerp, lerp, move_towards, sign, smooth_damp, smooth_damp_vec2};
pub use transform::Transform2D;
