//! Wraiths: weak ghosts drifting around their spawn point. They kill the
//! player on touch and burn away in the flashlight.

use darkwood_component::{Component, Entity};
use darkwood_math::Aabb;
use darkwood_physics::{Body, Layers};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{EffectKind, GameEvent};
use crate::world::{GameWorld, Tag};

pub const WRAITH_HALF_EXTENTS: Vec2 = Vec2::new(0.4, 0.4);
/// Closer than this to the target counts as arrived.
const ARRIVE_DISTANCE: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderSettings {
    pub speed: f32,
    pub wander_radius: f32,
    pub time_to_change_direction: f32,
}

impl Default for WanderSettings {
    fn default() -> Self {
        Self {
            speed: 1.5,
            wander_radius: 5.0,
            time_to_change_direction: 3.0,
        }
    }
}

/// Drift towards random points around a start position.
#[derive(Debug, Clone, PartialEq)]
pub struct WanderMovement {
    pub settings: WanderSettings,
    pub start: Vec2,
    pub target: Vec2,
    timer: f32,
}

impl WanderMovement {
    pub fn new(settings: WanderSettings, start: Vec2, rng: &mut impl Rng) -> Self {
        let mut wander = Self {
            settings,
            start,
            target: start,
            timer: 0.0,
        };
        wander.pick_target(rng);
        wander
    }

    /// New target inside the wander radius.
    pub fn pick_target(&mut self, rng: &mut impl Rng) {
        self.target = self.start + random_in_unit_circle(rng) * self.settings.wander_radius;
        self.timer = 0.0;
    }

    pub fn update(&mut self, dt: f32, rng: &mut impl Rng) {
        self.timer += dt;
        if self.timer >= self.settings.time_to_change_direction {
            self.pick_target(rng);
        }
    }

    /// Velocity towards the target; zero and a fresh target on arrival.
    pub fn steer(&mut self, position: Vec2, rng: &mut impl Rng) -> Vec2 {
        if position.distance(self.target) < ARRIVE_DISTANCE {
            self.pick_target(rng);
            return Vec2::ZERO;
        }
        (self.target - position).normalize_or_zero() * self.settings.speed
    }
}

impl Component for WanderMovement {
    fn type_name() -> &'static str {
        "WanderMovement"
    }
}

fn random_in_unit_circle(rng: &mut impl Rng) -> Vec2 {
    loop {
        let p = Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
        if p.length_squared() <= 1.0 {
            return p;
        }
    }
}

/// Hit points of a wraith.
#[derive(Debug, Clone, PartialEq)]
pub struct Wraith {
    pub hp: i32,
    pub dying: bool,
    /// Seconds left on the damage flash.
    pub flash_timer: f32,
}

impl Wraith {
    pub const DAMAGE_FLASH: f32 = 0.1;

    /// Starting hit points are drawn from `hp_min..=hp_max`.
    pub fn new(hp_min: i32, hp_max: i32, rng: &mut impl Rng) -> Self {
        Self {
            hp: rng.gen_range(hp_min..=hp_max.max(hp_min)),
            dying: false,
            flash_timer: 0.0,
        }
    }

    /// Lose hit points. Returns whether this blow killed the wraith.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if self.dying {
            return false;
        }
        self.hp -= amount;
        self.flash_timer = Self::DAMAGE_FLASH;
        if self.hp <= 0 {
            self.dying = true;
            return true;
        }
        false
    }
}

impl Component for Wraith {
    fn type_name() -> &'static str {
        "Wraith"
    }
}

pub fn spawn_wraith(world: &mut GameWorld, position: Vec2, settings: WanderSettings) -> Entity {
    let wraith = world.spawn_at("Wraith", Tag::Ghost, position);
    world.bodies.insert(
        wraith,
        Body::dynamic(WRAITH_HALF_EXTENTS, Layers::ENEMY).with_gravity_scale(0.0),
    );
    world.physics.attach(
        wraith,
        Aabb::from_center_size(position, WRAITH_HALF_EXTENTS * 2.0),
        Layers::ENEMY,
        false,
    );
    let wander = WanderMovement::new(settings, position, &mut world.rng);
    world.wanderers.insert(wraith, wander);
    let health = Wraith::new(3, 5, &mut world.rng);
    debug!(%wraith, hp = health.hp, "wraith spawned");
    world.wraiths.insert(wraith, health);
    wraith
}

/// Damage a wraith, removing it when it dies. Returns whether it died.
pub fn damage_wraith(world: &mut GameWorld, wraith: Entity, amount: i32) -> bool {
    let Some(health) = world.wraiths.get_mut(wraith) else {
        return false;
    };
    let died = health.take_damage(amount);
    debug!(%wraith, amount, hp = health.hp, "wraith damaged");
    if died {
        info!(%wraith, "wraith died");
        if let Some(position) = world.position(wraith) {
            world.emit(GameEvent::EffectSpawned {
                kind: EffectKind::GhostVanish,
                position,
            });
        }
        world.destroy(wraith, 0.0);
    }
    died
}

/// Retarget wanderers and fade wraith damage flashes.
pub fn update_wanderers(world: &mut GameWorld) {
    let dt = world.clock.dt;
    for entity in world.wanderers.entities() {
        if !world.is_active(entity) {
            continue;
        }
        if let Some(wander) = world.wanderers.get_mut(entity) {
            wander.update(dt, &mut world.rng);
        }
    }
    for entity in world.wraiths.entities() {
        if let Some(wraith) = world.wraiths.get_mut(entity) {
            wraith.flash_timer = (wraith.flash_timer - dt).max(0.0);
        }
    }
}

/// Steer wanderers. Runs in the fixed step before physics.
pub fn fixed_wanderers(world: &mut GameWorld) {
    for entity in world.wanderers.entities() {
        if !world.is_active(entity) {
            continue;
        }
        let Some(position) = world.position(entity) else {
            continue;
        };
        let Some(wander) = world.wanderers.get_mut(entity) else {
            continue;
        };
        let velocity = wander.steer(position, &mut world.rng);
        world.set_velocity(entity, velocity);
    }
}
