//! Enemy hit points, damage and death.

use darkwood_component::Entity;
use glam::Vec2;
use tracing::info;

use crate::enemy::Enemy;
use crate::events::{EffectKind, GameEvent};
use crate::world::GameWorld;

/// Seconds a dead enemy lingers before it is removed.
pub const CORPSE_LIFETIME: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EnemyHealth {
    pub current: f32,
    pub max: f32,
}

impl EnemyHealth {
    #[must_use]
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Remaining health as a fraction of the maximum.
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }
}

impl Enemy {
    /// Apply damage from `source`. Ignored once the enemy is dead.
    pub fn take_damage(&mut self, me: Entity, world: &mut GameWorld, amount: f32, _source: Vec2) {
        if self.health.is_dead() {
            return;
        }
        self.health.current -= amount;
        world.emit(GameEvent::EnemyDamaged {
            entity: me,
            amount,
            remaining: self.health.current.max(0.0),
        });
        self.on_damaged(me, world);

        if let Some(position) = world.position(me) {
            world.emit(GameEvent::EffectSpawned {
                kind: EffectKind::Hit,
                position,
            });
        }
        self.animate(me, world, |anim| anim.play_hit());

        if self.health.is_dead() {
            self.die(me, world);
        }
    }

    fn die(&mut self, me: Entity, world: &mut GameWorld) {
        info!(enemy = %me, kind = ?self.kind, "enemy died");
        self.animate(me, world, |anim| anim.play_death());
        world.physics.set_enabled(me, false);
        if let Some(body) = world.bodies.get_mut(me) {
            body.freeze();
        }
        self.cancel_attacks();
        self.on_death(me, world);

        if self.bone_pile
            && let Some(position) = world.position(me)
        {
            world.emit(GameEvent::EffectSpawned {
                kind: EffectKind::BonePile,
                position,
            });
        }
        world.emit(GameEvent::EnemyDied { entity: me });
        world.destroy(me, CORPSE_LIFETIME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_health_is_full() {
        let health = EnemyHealth::new(20.0);
        assert_eq!(health.percentage(), 1.0);
        assert!(!health.is_dead());
    }

    #[test]
    fn test_percentage_and_death() {
        let mut health = EnemyHealth::new(20.0);
        health.current -= 15.0;
        assert!((health.percentage() - 0.25).abs() < 1e-6);
        health.current -= 5.0;
        assert!(health.is_dead());
        assert_eq!(EnemyHealth::new(0.0).percentage(), 0.0);
    }
}
