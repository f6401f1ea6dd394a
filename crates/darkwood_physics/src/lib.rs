//! # darkwood_physics
//!
//! A small deterministic 2D physics layer. Everything is an axis-aligned box:
//!
//! - [`Layers`]: collision layer bit masks used to filter queries.
//! - [`Body`]: velocity, gravity scale, mass and pending forces of a moving entity.
//! - [`PhysicsWorld`]: colliders, ray/line/overlap queries and the body step.
//! - [`ContactTracker`] / [`OverlapTracker`]: turn per-step contact sets into
//!   enter and exit events.
//!
//! Normals follow the usual convention: a body standing on the ground sees a
//! contact normal of `(0, 1)`; a wall on its right yields `(-1, 0)`.

pub mod body;
pub mod contact;
pub mod layers;
pub mod world;

pub use body::{Body, BodyKind, ForceMode};
pub use contact::{CollisionEvent, ContactTracker, OverlapEvent, OverlapTracker};
pub use layers::Layers;
pub use world::{Collider, ColliderId, Contact, DEFAULT_GRAVITY, HitTarget, PhysicsWorld, RaycastHit};
