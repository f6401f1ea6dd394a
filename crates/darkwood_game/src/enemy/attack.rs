//! Enemy melee attacks.
//!
//! An attack plays its animation at once and checks for the player around
//! the attack point a moment later. Ghosts also carry a slower, wider
//! special attack.

use darkwood_component::Entity;
use darkwood_physics::Layers;
use glam::Vec2;
use tracing::debug;

use crate::enemy::Enemy;
use crate::enemy::data::{EnemyData, EnemyOverrides, GhostData};
use crate::events::{EffectKind, GameEvent};
use crate::player::{DamageInfo, damage_player};
use crate::routine::Routines;
use crate::world::GameWorld;

/// Attack point relative to an enemy facing right.
pub const ATTACK_POINT_OFFSET: Vec2 = Vec2::new(0.8, 0.0);
/// Delay between the swing starting and the hit landing.
pub const ATTACK_HIT_DELAY: f32 = 0.3;
/// Length of the whole attack animation.
pub const ATTACK_DURATION: f32 = 1.1;
pub const SPECIAL_ATTACK_DELAY: f32 = 0.5;
pub const SPECIAL_ATTACK_RADIUS: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttackAction {
    DealDamage,
    SpecialDamage,
}

#[derive(Debug, Clone)]
pub struct SpecialAttack {
    pub radius: f32,
    pub cooldown: f32,
    pub damage: f32,
    last_used: f32,
}

impl SpecialAttack {
    #[must_use]
    pub fn from_data(ghost: &GhostData) -> Self {
        Self {
            radius: SPECIAL_ATTACK_RADIUS,
            cooldown: ghost.special_attack_cooldown,
            damage: ghost.special_attack_damage,
            last_used: f32::NEG_INFINITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnemyAttack {
    pub attack_point: Vec2,
    pub radius: f32,
    pub cooldown: f32,
    pub damage: f32,
    pub special: Option<SpecialAttack>,
    last_attack: f32,
    routines: Routines<AttackAction>,
}

impl EnemyAttack {
    #[must_use]
    pub fn new(data: &EnemyData, overrides: &EnemyOverrides) -> Self {
        Self {
            attack_point: ATTACK_POINT_OFFSET,
            radius: overrides.attack_radius.unwrap_or(data.attack_radius),
            cooldown: data.attack_cooldown,
            damage: data.damage,
            special: None,
            last_attack: f32::NEG_INFINITY,
            routines: Routines::new(),
        }
    }

    #[must_use]
    pub fn with_special(mut self, ghost: &GhostData) -> Self {
        self.special = Some(SpecialAttack::from_data(ghost));
        self
    }

    #[must_use]
    pub fn can_attack(&self, now: f32) -> bool {
        now >= self.last_attack + self.cooldown
    }

    #[must_use]
    pub fn can_special_attack(&self, now: f32) -> bool {
        self.special
            .as_ref()
            .is_some_and(|s| now >= s.last_used + s.cooldown)
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        ATTACK_DURATION
    }

    /// Pending delayed hits.
    #[must_use]
    pub fn pending_hits(&self) -> usize {
        self.routines.len()
    }

    fn point(&self, position: Vec2, facing_sign: f32) -> Vec2 {
        position + Vec2::new(self.attack_point.x * facing_sign, self.attack_point.y)
    }
}

impl Enemy {
    fn attack_point(&self, me: Entity, world: &GameWorld) -> Option<Vec2> {
        let position = world.position(me)?;
        Some(self.attack.point(position, self.movement.facing_sign()))
    }

    /// Start a swing. Does nothing while the attack is cooling down.
    pub fn perform_attack(&mut self, me: Entity, world: &mut GameWorld) {
        let now = world.clock.time;
        if !self.attack.can_attack(now) {
            return;
        }
        self.attack.last_attack = now;
        self.animate(me, world, |anim| anim.play_attack());
        self.attack.routines.start(now, ATTACK_HIT_DELAY, AttackAction::DealDamage);
    }

    /// Damage the player if they are inside the attack circle.
    pub fn on_attack_hit(&mut self, me: Entity, world: &mut GameWorld) {
        let Some(point) = self.attack_point(me, world) else {
            return;
        };
        let Some(source) = world.position(me) else {
            return;
        };
        let hit = world
            .physics
            .overlap_circle(point, self.attack.radius, Layers::PLAYER)
            .into_iter()
            .find_map(|t| t.entity);
        if let Some(player) = hit {
            debug!(enemy = %me, %player, damage = self.attack.damage, "enemy attack hit");
            damage_player(world, player, DamageInfo::new(self.attack.damage, source));
        }
    }

    /// Start the ghost special attack. Does nothing on cooldown or for
    /// enemies without one.
    pub fn perform_special_attack(&mut self, world: &mut GameWorld) {
        let now = world.clock.time;
        if !self.attack.can_special_attack(now) {
            return;
        }
        if let Some(special) = self.attack.special.as_mut() {
            special.last_used = now;
        }
        self.attack
            .routines
            .start(now, SPECIAL_ATTACK_DELAY, AttackAction::SpecialDamage);
    }

    fn special_hit(&mut self, me: Entity, world: &mut GameWorld) {
        let Some(special) = self.attack.special.as_ref() else {
            return;
        };
        let (radius, damage) = (special.radius, special.damage);
        let (Some(point), Some(source)) = (self.attack_point(me, world), world.position(me)) else {
            return;
        };
        let hit = world
            .physics
            .overlap_circle(point, radius, Layers::PLAYER)
            .into_iter()
            .find_map(|t| t.entity);
        if let Some(player) = hit {
            damage_player(world, player, DamageInfo::new(damage, source));
            if let Some(position) = world.position(player) {
                world.emit(GameEvent::EffectSpawned {
                    kind: EffectKind::SpecialAttack,
                    position,
                });
            }
        }
    }

    /// Land delayed hits that are due.
    pub fn update_attack(&mut self, me: Entity, world: &mut GameWorld) {
        for action in self.attack.routines.drain_due(world.clock.time) {
            match action {
                AttackAction::DealDamage => self.on_attack_hit(me, world),
                AttackAction::SpecialDamage => self.special_hit(me, world),
            }
        }
    }

    /// Cancel delayed hits (the enemy died).
    pub fn cancel_attacks(&mut self) {
        self.attack.routines.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown() {
        let mut attack = EnemyAttack::new(&EnemyData::default(), &EnemyOverrides::default());
        assert!(attack.can_attack(0.0));
        attack.last_attack = 1.0;
        assert!(!attack.can_attack(2.0));
        assert!(attack.can_attack(2.5));
        assert_eq!(attack.duration(), 1.1);
    }

    #[test]
    fn test_radius_override() {
        let overrides = EnemyOverrides {
            attack_radius: Some(2.0),
            ..Default::default()
        };
        let attack = EnemyAttack::new(&EnemyData::default(), &overrides);
        assert_eq!(attack.radius, 2.0);
        let plain = EnemyAttack::new(&EnemyData::default(), &EnemyOverrides::default());
        assert_eq!(plain.radius, 0.8);
    }

    #[test]
    fn test_attack_point_mirrors_with_facing() {
        let attack = EnemyAttack::new(&EnemyData::default(), &EnemyOverrides::default());
        let ahead = attack.point(Vec2::new(1.0, 1.0), 1.0);
        let behind = attack.point(Vec2::new(1.0, 1.0), -1.0);
        assert!(ahead.abs_diff_eq(Vec2::new(1.8, 1.0), 1e-6), "{ahead}");
        assert!(behind.abs_diff_eq(Vec2::new(0.2, 1.0), 1e-6), "{behind}");
    }

    #[test]
    fn test_special_attack_only_for_ghosts() {
        let attack = EnemyAttack::new(&EnemyData::default(), &EnemyOverrides::default());
        assert!(!attack.can_special_attack(100.0));
        let ghost = GhostData::default();
        let attack = attack.with_special(&ghost);
        assert!(attack.can_special_attack(0.0));
        assert_eq!(attack.special.as_ref().map(|s| s.damage), Some(4.0));
    }
}
