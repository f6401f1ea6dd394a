//! Melee and thrown attacks of the character controller.

use darkwood_component::{Component, Entity};
use darkwood_math::Aabb;
use darkwood_physics::Layers;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::enemy::damage_enemy;
use crate::events::{EffectKind, GameEvent};
use crate::routine::Routines;
use crate::world::{GameWorld, Tag};

/// Radius of a thrown weapon's hit circle.
pub const THROWABLE_RADIUS: f32 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerAttackSettings {
    pub dmg_value: f32,
    /// Attack check relative to a player facing right.
    pub attack_offset: Vec2,
    pub attack_radius: f32,
    pub cooldown: f32,
    /// Time from the swing to the hit.
    pub hit_delay: f32,
    pub throwable: bool,
    pub throw_speed: f32,
    pub throw_lifetime: f32,
}

impl Default for PlayerAttackSettings {
    fn default() -> Self {
        Self {
            dmg_value: 4.0,
            attack_offset: Vec2::new(0.6, 0.0),
            attack_radius: 0.9,
            cooldown: 0.25,
            hit_delay: 0.1,
            throwable: true,
            throw_speed: 10.0,
            throw_lifetime: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttackAction {
    Ready,
    Hit,
}

#[derive(Debug, Clone)]
pub struct PlayerAttack {
    pub settings: PlayerAttackSettings,
    pub can_attack: bool,
    /// Cleared when the player dies.
    pub enabled: bool,
    routines: Routines<AttackAction>,
}

impl PlayerAttack {
    #[must_use]
    pub fn new(settings: PlayerAttackSettings) -> Self {
        Self {
            settings,
            can_attack: true,
            enabled: true,
            routines: Routines::new(),
        }
    }

    pub fn update(&mut self, me: Entity, world: &mut GameWorld) {
        for action in self.routines.drain_due(world.clock.time) {
            match action {
                AttackAction::Ready => self.can_attack = true,
                AttackAction::Hit => {
                    self.do_dash_damage(me, world);
                    if let Some(animator) = world.animators.get_mut(me) {
                        animator.set_bool("IsAttacking", false);
                    }
                }
            }
        }
        if !self.enabled {
            return;
        }

        let now = world.clock.time;
        if world.input.attack && self.can_attack {
            self.can_attack = false;
            if let Some(animator) = world.animators.get_mut(me) {
                animator.set_bool("IsAttacking", true);
            }
            self.routines.start(now, self.settings.cooldown, AttackAction::Ready);
            self.routines.start(now, self.settings.hit_delay, AttackAction::Hit);
        }
        if world.input.throw && self.settings.throwable {
            spawn_throwable(world, me, &self.settings);
        }
    }

    /// Where the melee hit lands, mirrored with the player's facing.
    #[must_use]
    pub fn attack_point(&self, world: &GameWorld, me: Entity) -> Option<Vec2> {
        let transform = world.transforms.get(me)?;
        let offset = self.settings.attack_offset;
        Some(transform.position + Vec2::new(offset.x * transform.facing_sign(), offset.y))
    }

    /// Damage every enemy around the attack point. Returns how many were hit.
    pub fn do_dash_damage(&mut self, me: Entity, world: &mut GameWorld) -> usize {
        let (Some(point), Some(position)) = (self.attack_point(world, me), world.position(me)) else {
            return 0;
        };
        let mut targets: Vec<Entity> = world
            .physics
            .overlap_circle(point, self.settings.attack_radius, Layers::ENEMY)
            .into_iter()
            .filter_map(|hit| hit.entity)
            .filter(|e| world.tag(*e) == Tag::Enemy)
            .collect();
        targets.dedup();

        let damage = self.settings.dmg_value.abs();
        let mut hits = 0;
        for target in targets {
            debug!(player = %me, enemy = %target, damage, "melee hit");
            if damage_enemy(world, target, damage, position) {
                hits += 1;
            }
        }
        hits
    }
}

impl Component for PlayerAttack {
    fn type_name() -> &'static str {
        "PlayerAttack"
    }
}

/// A thrown weapon flying in a straight line.
#[derive(Debug, Clone, PartialEq)]
pub struct Throwable {
    pub thrower: Entity,
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    spent: bool,
}

impl Component for Throwable {
    fn type_name() -> &'static str {
        "Throwable"
    }
}

/// Throw a weapon from in front of `thrower` in its facing direction.
pub fn spawn_throwable(world: &mut GameWorld, thrower: Entity, settings: &PlayerAttackSettings) -> Option<Entity> {
    let transform = world.transforms.get(thrower)?;
    let facing = transform.facing_sign();
    let origin = transform.position + Vec2::new(facing * 0.5, -0.2);
    let weapon = world.spawn_at("ThrowableWeapon", Tag::Untagged, origin);
    world.physics.attach(
        weapon,
        Aabb::from_center_size(origin, Vec2::splat(THROWABLE_RADIUS * 2.0)),
        Layers::PROJECTILE,
        false,
    );
    world.throwables.insert(
        weapon,
        Throwable {
            thrower,
            direction: Vec2::new(facing, 0.0),
            speed: settings.throw_speed,
            damage: settings.dmg_value.abs(),
            spent: false,
        },
    );
    world.destroy(weapon, settings.throw_lifetime);
    info!(%thrower, %weapon, "weapon thrown");
    Some(weapon)
}

/// Move thrown weapons and resolve their hits. A weapon is spent on its
/// first enemy or on hitting the ground.
pub fn update_throwables(world: &mut GameWorld) {
    let dt = world.clock.dt;
    for weapon in world.throwables.entities() {
        let Some(throwable) = world.throwables.get(weapon).cloned() else {
            continue;
        };
        if throwable.spent {
            continue;
        }
        let Some(position) = world.position(weapon) else {
            continue;
        };
        let position = position + throwable.direction * throwable.speed * dt;
        world.set_position(weapon, position);

        let enemy = world
            .physics
            .overlap_circle(position, THROWABLE_RADIUS, Layers::ENEMY)
            .into_iter()
            .filter_map(|hit| hit.entity)
            .find(|e| *e != throwable.thrower && world.tag(*e) == Tag::Enemy);
        let hit_ground = world
            .physics
            .overlap_circle_any(position, THROWABLE_RADIUS, Layers::GROUND, Some(weapon));
        if let Some(enemy) = enemy {
            damage_enemy(world, enemy, throwable.damage, position);
        } else if !hit_ground {
            continue;
        }
        world.emit(GameEvent::EffectSpawned {
            kind: EffectKind::Impact,
            position,
        });
        if let Some(t) = world.throwables.get_mut(weapon) {
            t.spent = true;
        }
        world.destroy(weapon, 0.0);
    }
}
