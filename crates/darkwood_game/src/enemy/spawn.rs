//! Building enemy entities from level data.

use darkwood_component::Entity;
use darkwood_math::Aabb;
use darkwood_physics::{Body, Layers};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::animator::Animator;
use crate::enemy::ai::EnemyAi;
use crate::enemy::attack::EnemyAttack;
use crate::enemy::data::{EnemyData, EnemyOverrides, GhostData, GhostTuning};
use crate::enemy::ghost::GhostBrain;
use crate::enemy::health::EnemyHealth;
use crate::enemy::movement::EnemyMovement;
use crate::enemy::{Enemy, EnemyKind, with_enemy};
use crate::world::{GameWorld, Tag};

/// Collider half extents of a skeleton.
pub const SKELETON_HALF_EXTENTS: Vec2 = Vec2::new(0.4, 0.9);
/// Collider half extents of a ghost.
pub const GHOST_HALF_EXTENTS: Vec2 = Vec2::new(0.4, 0.5);

/// One enemy placement in a level file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyDesc {
    pub name: String,
    pub kind: EnemyKind,
    pub position: Vec2,
    /// Skeleton numbers; defaults when absent.
    pub data: Option<EnemyData>,
    /// Ghost numbers; defaults when absent.
    pub ghost: Option<GhostData>,
    pub overrides: EnemyOverrides,
    /// Ghost placement values.
    pub tuning: GhostTuning,
    pub patrol_points: Vec<Vec2>,
    /// Skeletons only: leave a bone pile on death.
    pub bone_pile: bool,
}

impl EnemyDesc {
    #[must_use]
    pub fn skeleton(name: &str, position: Vec2) -> Self {
        Self {
            name: name.to_string(),
            kind: EnemyKind::Skeleton,
            position,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ghost(name: &str, position: Vec2) -> Self {
        Self {
            name: name.to_string(),
            kind: EnemyKind::Ghost,
            position,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_patrol(mut self, points: Vec<Vec2>) -> Self {
        self.patrol_points = points;
        self
    }
}

/// Compose an enemy entity and start its AI.
///
/// The player must already be spawned for the AI to find it. With an
/// [`EnemyManager`](crate::enemy::manager::EnemyManager) present the enemy
/// starts inactive and is switched on by the activation pass.
pub fn spawn_enemy(world: &mut GameWorld, desc: &EnemyDesc) -> Entity {
    let (enemy, tag, half_extents, animator) = match desc.kind {
        EnemyKind::Skeleton => {
            let data = desc.data.clone().unwrap_or_default();
            let enemy = Enemy {
                kind: EnemyKind::Skeleton,
                health: EnemyHealth::new(data.max_health),
                movement: EnemyMovement::walker(),
                attack: EnemyAttack::new(&data, &desc.overrides),
                ai: EnemyAi::new(&data, &desc.overrides, desc.patrol_points.clone()),
                ghost: None,
                bone_pile: desc.bone_pile,
                data,
            };
            (enemy, Tag::Enemy, SKELETON_HALF_EXTENTS, Animator::skeleton(&desc.name))
        }
        EnemyKind::Ghost => {
            let ghost = desc.tuning.apply_hover(&desc.ghost.clone().unwrap_or_default());
            let data = ghost.base.clone();
            let brain = GhostBrain::new(&ghost, &desc.tuning);
            let enemy = Enemy {
                kind: EnemyKind::Ghost,
                health: EnemyHealth::new(data.max_health),
                movement: EnemyMovement::hover(),
                attack: EnemyAttack::new(&data, &desc.overrides).with_special(&ghost),
                ai: EnemyAi::new(&data, &desc.overrides, desc.patrol_points.clone()).with_ghost(brain),
                ghost: Some(ghost),
                bone_pile: false,
                data,
            };
            (enemy, Tag::Enemy, GHOST_HALF_EXTENTS, Animator::ghost(&desc.name))
        }
    };

    let entity = world.spawn_at(desc.name.clone(), tag, desc.position);
    world.bodies.insert(entity, Body::dynamic(half_extents, Layers::ENEMY));
    world.physics.attach(
        entity,
        Aabb::from_center_size(desc.position, half_extents * 2.0),
        Layers::ENEMY,
        true,
    );
    world.animators.insert(entity, animator);
    info!(
        enemy = %entity,
        name = %desc.name,
        kind = ?desc.kind,
        health = enemy.health.max,
        "enemy spawned"
    );
    world.enemies.insert(entity, enemy);
    with_enemy(world, entity, |enemy, world| enemy.init_ai(entity, world));

    if let Some(manager) = world.enemy_manager.as_mut() {
        manager.register(entity);
        world.set_active(entity, false);
    }
    entity
}
