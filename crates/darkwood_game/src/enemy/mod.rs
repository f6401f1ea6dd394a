//! Enemies: skeletons that walk and ghosts that hover, jump and climb.
//!
//! One [`Enemy`] component holds everything an enemy needs: its data,
//! health, movement, attack and AI state. Behaviour is split by concern
//! across the submodules, each adding methods to [`Enemy`]:
//!
//! - [`movement`]: ground following, hovering, jumps and climbing.
//! - [`attack`]: melee hits and the ghost special attack.
//! - [`health`]: damage and death.
//! - [`ai`]: the shared state machine.
//! - [`ghost`]: platform navigation layered on the state machine.
//!
//! Systems take an enemy out of the world with [`with_enemy`] so its
//! methods can borrow the rest of the world freely.

pub mod ai;
pub mod animation;
pub mod attack;
pub mod data;
pub mod ghost;
pub mod health;
pub mod manager;
pub mod movement;
pub mod spawn;

use darkwood_component::{Component, Entity};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::enemy::ai::EnemyAi;
use crate::enemy::animation::{EnemyAnimation, EnemyAnimator};
use crate::enemy::attack::EnemyAttack;
use crate::enemy::data::{EnemyData, GhostData};
use crate::enemy::health::EnemyHealth;
use crate::enemy::movement::EnemyMovement;
use crate::world::GameWorld;

/// Which body and brain an enemy has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyKind {
    #[default]
    Skeleton,
    Ghost,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub data: EnemyData,
    /// Present for ghosts only.
    pub ghost: Option<GhostData>,
    pub health: EnemyHealth,
    pub movement: EnemyMovement,
    pub attack: EnemyAttack,
    pub ai: EnemyAi,
    /// Leave a bone pile behind on death (skeletons).
    pub bone_pile: bool,
}

impl Enemy {
    #[must_use]
    pub fn is_ghost(&self) -> bool {
        self.kind == EnemyKind::Ghost
    }

    /// Run `f` against this enemy's animator, if it has one.
    pub(crate) fn animate(&self, me: Entity, world: &mut GameWorld, f: impl FnOnce(&mut EnemyAnimator<'_>)) {
        if let Some(animator) = world.animators.get_mut(me) {
            f(&mut EnemyAnimator::new(self.kind, animator));
        }
    }

    /// Reset every trigger and play one animation.
    pub(crate) fn fire(&self, me: Entity, world: &mut GameWorld, animation: EnemyAnimation) {
        self.animate(me, world, |anim| anim.fire(animation));
    }
}

impl Component for Enemy {
    fn type_name() -> &'static str {
        "Enemy"
    }
}

/// Take the enemy out of the world, run `f`, and put it back.
///
/// Returns `None` when `entity` has no enemy component (it died and was
/// removed, or another system is holding it).
pub fn with_enemy<R>(world: &mut GameWorld, entity: Entity, f: impl FnOnce(&mut Enemy, &mut GameWorld) -> R) -> Option<R> {
    let mut enemy = world.enemies.remove(entity)?;
    let result = f(&mut enemy, world);
    if world.is_alive(entity) {
        world.enemies.insert(entity, enemy);
    }
    Some(result)
}

/// Damage an enemy. Returns whether the hit landed on an enemy.
pub fn damage_enemy(world: &mut GameWorld, entity: Entity, amount: f32, source: Vec2) -> bool {
    let landed = with_enemy(world, entity, |enemy, world| enemy.take_damage(entity, world, amount, source));
    if landed.is_none() {
        debug!(%entity, amount, "damage target is not an enemy");
    }
    landed.is_some()
}
