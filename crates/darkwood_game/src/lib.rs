//! # darkwood_game
//!
//! A headless 2D action platformer. A level file describes the scene; the
//! frame loop runs the player controllers, skeleton and ghost AI, combat,
//! hazards and the level flow against a deterministic box physics world.
//!
//! - [`GameWorld`]: component stores, physics, clock, input and the scene
//!   singletons.
//! - [`TickLoop`]: fixed-step and per-frame phases, scheduled from each
//!   system's [`QueryDescriptor`](darkwood_component::QueryDescriptor).
//! - [`SceneCatalog`] / [`LevelDesc`]: levels as JSON, loaded by name.
//! - [`InputScript`]: recorded input played back tick by tick.

pub mod animator;
pub mod audio;
pub mod clock;
pub mod config;
pub mod enemy;
pub mod error;
pub mod events;
pub mod hazards;
pub mod input;
pub mod level;
pub mod player;
pub mod registry;
pub mod routine;
pub mod scene;
pub mod scheduler;
pub mod systems;
pub mod tick;
pub mod world;

pub use config::GameConfig;
pub use error::{LevelError, WorldError};
pub use events::{EffectKind, GameEvent};
pub use input::{InputFrame, InputScript};
pub use registry::{SystemInfo, SystemRegistry};
pub use scene::{LevelDesc, SceneCatalog, build_level, load_scene};
pub use scheduler::Phase;
pub use tick::{RunSummary, TickConfig, TickLoop};
pub use world::{GameWorld, Tag};
