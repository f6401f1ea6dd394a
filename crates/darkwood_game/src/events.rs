//! Gameplay events.
//!
//! Systems push [`GameEvent`]s into the world as things happen; the tick loop
//! hands the frame's events to its caller. Every event is also logged.

use darkwood_component::Entity;
use glam::Vec2;
use serde::Serialize;
use tracing::{debug, info};

use crate::enemy::ai::AiState;
use crate::level::manager::LevelState;

/// Visual effects that would be spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectKind {
    Hit,
    BonePile,
    GhostVanish,
    SpecialAttack,
    Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum GameEvent {
    EnemyDamaged { entity: Entity, amount: f32, remaining: f32 },
    EnemyDied { entity: Entity },
    PlayerDamaged { entity: Entity, amount: f32, remaining: f32 },
    PlayerDied { entity: Entity },
    GarbageCollected { pickup: Entity, total: u32 },
    SceneLoadRequested { scene: String },
    Teleported { entity: Entity, to: Vec2 },
    SectionSpawned { position: Vec2 },
    DialogueLine { index: usize, line: String },
    DialogueEnded,
    EffectSpawned { kind: EffectKind, position: Vec2 },
    LevelStateChanged { from: LevelState, to: LevelState },
    EnemyStateChanged { entity: Entity, from: AiState, to: AiState },
}

impl GameEvent {
    /// Write the event to the log at a level matching its weight.
    pub fn log(&self, tick: u64) {
        match self {
            GameEvent::EnemyStateChanged { entity, from, to } => {
                debug!(tick, %entity, ?from, ?to, "enemy state changed");
            }
            GameEvent::EffectSpawned { kind, position } => {
                debug!(tick, ?kind, x = position.x, y = position.y, "effect spawned");
            }
            GameEvent::EnemyDamaged {
                entity,
                amount,
                remaining,
            } => debug!(tick, %entity, amount, remaining, "enemy damaged"),
            GameEvent::DialogueLine { index, line } => debug!(tick, index, line = %line, "dialogue line"),
            GameEvent::PlayerDamaged {
                entity,
                amount,
                remaining,
            } => info!(tick, %entity, amount, remaining, "player damaged"),
            GameEvent::EnemyDied { entity } => info!(tick, %entity, "enemy died"),
            GameEvent::PlayerDied { entity } => info!(tick, %entity, "player died"),
            GameEvent::GarbageCollected { pickup, total } => info!(tick, %pickup, total, "garbage collected"),
            GameEvent::SceneLoadRequested { scene } => info!(tick, scene = %scene, "scene load requested"),
            GameEvent::Teleported { entity, to } => info!(tick, %entity, x = to.x, y = to.y, "teleported"),
            GameEvent::SectionSpawned { position } => info!(tick, x = position.x, "section spawned"),
            GameEvent::DialogueEnded => info!(tick, "dialogue ended"),
            GameEvent::LevelStateChanged { from, to } => info!(tick, ?from, ?to, "level state changed"),
        }
    }
}
