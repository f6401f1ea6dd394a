//! # darkwood_component
//!
//! The entity/component layer the game world is built on.
//!
//! This crate provides:
//!
//! - [`Entity`]: `u64` handles tagged with the scene they were spawned in.
//! - [`EntityAllocator`]: per-scene handle allocation.
//! - [`Component`] trait: the contract every stored type satisfies.
//! - [`ComponentStore`]: ordered per-type storage keyed by entity.
//! - [`QueryDescriptor`]: declarative data access requirements for systems.

pub mod component;
pub mod entity;
pub mod query;
pub mod store;

pub use component::{Component, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use query::QueryDescriptor;
pub use store::ComponentStore;
