//! Enemy activation.
//!
//! A scene may carry one [`EnemyManager`]. It keeps only the enemies near the
//! player running: nearest first, up to a cap, and never two within
//! `enemy_spacing` of each other. Everything else is deactivated.

use darkwood_component::Entity;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::world::GameWorld;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyManagerSettings {
    pub enemy_spacing: f32,
    pub limit_active_enemies: bool,
    pub max_active_enemies: usize,
    pub activation_range: f32,
}

impl Default for EnemyManagerSettings {
    fn default() -> Self {
        Self {
            enemy_spacing: 3.0,
            limit_active_enemies: true,
            max_active_enemies: 5,
            activation_range: 20.0,
        }
    }
}

/// One enemy as the activation pass sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub entity: Entity,
    pub position: Vec2,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EnemyManager {
    pub settings: EnemyManagerSettings,
    enemies: Vec<Entity>,
}

impl EnemyManager {
    #[must_use]
    pub fn new(settings: EnemyManagerSettings) -> Self {
        Self {
            settings,
            enemies: Vec::new(),
        }
    }

    /// Track an enemy. Registering twice is a no-op.
    pub fn register(&mut self, enemy: Entity) {
        if !self.enemies.contains(&enemy) {
            self.enemies.push(enemy);
        }
    }

    pub fn unregister(&mut self, enemy: Entity) {
        self.enemies.retain(|e| *e != enemy);
    }

    #[must_use]
    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    /// Decide which candidates should be active.
    ///
    /// Candidates are visited nearest first. Spacing is checked against the
    /// active flags as they stand during the pass, so an enemy switched off
    /// earlier in the pass no longer blocks its neighbours.
    #[must_use]
    pub fn plan(&self, player: Vec2, mut candidates: Vec<Candidate>) -> Vec<(Entity, bool)> {
        candidates.sort_by(|a, b| {
            a.position
                .distance(player)
                .total_cmp(&b.position.distance(player))
        });
        let s = &self.settings;
        let mut active_count = 0;
        for i in 0..candidates.len() {
            let candidate = candidates[i];
            let in_range = candidate.position.distance(player) <= s.activation_range;
            let below_cap = !s.limit_active_enemies || active_count < s.max_active_enemies;
            let activate = in_range
                && below_cap
                && !candidates.iter().enumerate().any(|(j, other)| {
                    j != i && other.active && other.position.distance(candidate.position) < s.enemy_spacing
                });
            if activate {
                active_count += 1;
            }
            candidates[i].active = activate;
        }
        candidates.into_iter().map(|c| (c.entity, c.active)).collect()
    }
}

/// Switch enemies on and off around the player.
///
/// Dead enemies are left alone so their corpse stays until removed.
pub fn update_enemy_activation(world: &mut GameWorld) {
    let Some(manager) = world.enemy_manager.as_ref() else {
        return;
    };
    let Some(player) = world.player().and_then(|p| world.position(p)) else {
        return;
    };
    let candidates: Vec<Candidate> = manager
        .enemies()
        .iter()
        .filter(|e| world.enemies.get(**e).is_some_and(|enemy| !enemy.health.is_dead()))
        .filter_map(|e| {
            Some(Candidate {
                entity: *e,
                position: world.position(*e)?,
                active: world.is_active(*e),
            })
        })
        .collect();
    let plan = manager.plan(player, candidates);
    for (entity, active) in plan {
        if world.is_active(entity) != active {
            debug!(%entity, active, "enemy activation changed");
            world.set_active(entity, active);
        }
    }
}
