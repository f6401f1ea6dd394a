//! Cannons that lob bouncing cannonballs at the player.

use darkwood_component::{Component, Entity};
use darkwood_math::{Aabb, Transform2D};
use darkwood_physics::{Body, CollisionEvent, ContactTracker, ForceMode, Layers};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::Sfx;
use crate::events::{EffectKind, GameEvent};
use crate::player::{DamageInfo, damage_player};
use crate::world::{GameWorld, Tag};

pub const CANNONBALL_RADIUS: f32 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannonballSettings {
    pub damage: f32,
    pub max_lifetime: f32,
    /// Velocity kept after each bounce.
    pub bounce_force_reduction: f32,
    pub max_bounces: u32,
}

impl Default for CannonballSettings {
    fn default() -> Self {
        Self {
            damage: 2.0,
            max_lifetime: 5.0,
            bounce_force_reduction: 0.6,
            max_bounces: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannonSettings {
    pub firing_interval: f32,
    pub projectile_force: f32,
    /// Degrees above the cannon's right vector.
    pub firing_angle: f32,
    /// Muzzle relative to the cannon.
    pub firing_point: Vec2,
    pub cannonball: CannonballSettings,
}

impl Default for CannonSettings {
    fn default() -> Self {
        Self {
            firing_interval: 3.0,
            projectile_force: 10.0,
            firing_angle: 45.0,
            firing_point: Vec2::new(0.5, 0.0),
            cannonball: CannonballSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cannon {
    pub settings: CannonSettings,
    next_fire_time: f32,
}

impl Cannon {
    /// A cannon that first fires one interval after `now`.
    #[must_use]
    pub fn new(settings: CannonSettings, now: f32) -> Self {
        Self {
            next_fire_time: now + settings.firing_interval,
            settings,
        }
    }

    /// Launch direction for a cannon with `transform`.
    #[must_use]
    pub fn direction(&self, transform: &Transform2D) -> Vec2 {
        Vec2::from_angle(self.settings.firing_angle.to_radians()).rotate(transform.right())
    }
}

impl Component for Cannon {
    fn type_name() -> &'static str {
        "Cannon"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cannonball {
    pub settings: CannonballSettings,
    pub owner: Entity,
    pub bounce_count: u32,
    pub has_hit_player: bool,
    spawn_time: f32,
}

impl Component for Cannonball {
    fn type_name() -> &'static str {
        "Cannonball"
    }
}

pub fn spawn_cannon(world: &mut GameWorld, position: Vec2, rotation_deg: f32, settings: CannonSettings) -> Entity {
    let cannon = world.spawn_at("Cannon", Tag::Untagged, position);
    if let Some(transform) = world.transforms.get_mut(cannon) {
        transform.rotation_deg = rotation_deg;
    }
    let now = world.clock.time;
    world.cannons.insert(cannon, Cannon::new(settings, now));
    cannon
}

/// Fire every cannon whose interval has passed.
pub fn update_cannons(world: &mut GameWorld) {
    let now = world.clock.time;
    for entity in world.cannons.entities() {
        if !world.is_active(entity) {
            continue;
        }
        let Some(cannon) = world.cannons.get_mut(entity) else {
            continue;
        };
        if now < cannon.next_fire_time {
            continue;
        }
        cannon.next_fire_time = now + cannon.settings.firing_interval;
        let cannon = cannon.clone();
        fire_cannonball(world, entity, &cannon);
    }
}

fn fire_cannonball(world: &mut GameWorld, owner: Entity, cannon: &Cannon) -> Option<Entity> {
    let transform = *world.transforms.get(owner)?;
    let muzzle = transform.local_to_world(cannon.settings.firing_point);
    let direction = cannon.direction(&transform);

    let ball = world.spawn_at("Cannonball", Tag::Untagged, muzzle);
    let mut body = Body::dynamic(Vec2::splat(CANNONBALL_RADIUS), Layers::PROJECTILE)
        .with_collides_with(Layers::GROUND | Layers::PLAYER)
        .with_bounciness(1.0);
    body.add_force(direction * cannon.settings.projectile_force, ForceMode::Impulse);
    world.bodies.insert(ball, body);
    world.physics.attach(
        ball,
        Aabb::from_center_size(muzzle, Vec2::splat(CANNONBALL_RADIUS * 2.0)),
        Layers::PROJECTILE,
        false,
    );
    world.contacts.insert(ball, ContactTracker::new());
    world.cannonballs.insert(
        ball,
        Cannonball {
            settings: cannon.settings.cannonball.clone(),
            owner,
            bounce_count: 0,
            has_hit_player: false,
            spawn_time: world.clock.time,
        },
    );
    world.audio.play_sfx(Sfx::CannonFire);
    info!(
        cannon = %owner,
        angle = cannon.settings.firing_angle,
        force = cannon.settings.projectile_force,
        "cannon fired"
    );
    Some(ball)
}

/// Expire old cannonballs and point the rest along their flight.
pub fn update_cannonballs(world: &mut GameWorld) {
    let now = world.clock.time;
    for ball in world.cannonballs.entities() {
        let Some(cannonball) = world.cannonballs.get(ball) else {
            continue;
        };
        if now - cannonball.spawn_time > cannonball.settings.max_lifetime {
            world.cannonballs.remove(ball);
            world.destroy(ball, 0.0);
            continue;
        }
        let velocity = world.velocity(ball);
        if velocity.length_squared() > 0.1
            && let Some(transform) = world.transforms.get_mut(ball)
        {
            transform.rotation_deg = velocity.y.atan2(velocity.x).to_degrees();
        }
    }
}

/// A cannonball started touching something.
pub fn on_cannonball_collision(world: &mut GameWorld, ball: Entity, event: &CollisionEvent) {
    let CollisionEvent::Enter { target, .. } = event else {
        return;
    };
    let Some(position) = world.position(ball) else {
        return;
    };
    let Some(cannonball) = world.cannonballs.get_mut(ball) else {
        return;
    };

    let hit_player = target.entity.filter(|e| world.meta.get(*e).is_some_and(|m| m.tag == Tag::Player));
    if let Some(player) = hit_player
        && !cannonball.has_hit_player
    {
        cannonball.has_hit_player = true;
        let damage = cannonball.settings.damage;
        debug!(%player, damage, "player hit by cannonball");
        damage_player(world, player, DamageInfo::new(damage, position));
        destroy_cannonball(world, ball, position);
        return;
    }

    cannonball.bounce_count += 1;
    if cannonball.bounce_count >= cannonball.settings.max_bounces {
        destroy_cannonball(world, ball, position);
        return;
    }
    let reduction = cannonball.settings.bounce_force_reduction;
    if let Some(body) = world.bodies.get_mut(ball) {
        body.velocity *= reduction;
    }
    impact(world, position);
}

fn impact(world: &mut GameWorld, position: Vec2) {
    world.emit(GameEvent::EffectSpawned {
        kind: EffectKind::Impact,
        position,
    });
    world.audio.play_sfx(Sfx::Impact);
}

fn destroy_cannonball(world: &mut GameWorld, ball: Entity, position: Vec2) {
    impact(world, position);
    world.cannonballs.remove(ball);
    world.destroy(ball, 0.0);
}
