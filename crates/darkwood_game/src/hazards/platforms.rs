//! Bobbing and spinning platforms.

use darkwood_component::{Component, Entity};
use darkwood_math::Aabb;
use darkwood_physics::Layers;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::world::{GameWorld, Tag};

/// Bobs up and down on a sine wave around where it started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingPlatform {
    pub speed: f32,
    pub height: f32,
    /// Radians added to the wave, to desynchronise neighbours.
    pub phase: f32,
    #[serde(skip)]
    pub start: Vec2,
}

impl Default for MovingPlatform {
    fn default() -> Self {
        Self {
            speed: 2.0,
            height: 2.0,
            phase: 0.0,
            start: Vec2::ZERO,
        }
    }
}

impl MovingPlatform {
    #[must_use]
    pub fn position_at(&self, time: f32) -> Vec2 {
        Vec2::new(self.start.x, self.start.y + (time * self.speed + self.phase).sin() * self.height)
    }
}

impl Component for MovingPlatform {
    fn type_name() -> &'static str {
        "MovingPlatform"
    }
}

/// Spins at a constant rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatingPlatform {
    /// Degrees per second.
    pub speed: f32,
    pub start_rotation: f32,
}

impl Default for RotatingPlatform {
    fn default() -> Self {
        Self {
            speed: 50.0,
            start_rotation: 0.0,
        }
    }
}

impl Component for RotatingPlatform {
    fn type_name() -> &'static str {
        "RotatingPlatform"
    }
}

/// A platform as described by a level file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDesc {
    pub position: Vec2,
    #[serde(default = "default_platform_size")]
    pub size: Vec2,
    #[serde(default)]
    pub moving: Option<MovingPlatform>,
    #[serde(default)]
    pub rotating: Option<RotatingPlatform>,
}

fn default_platform_size() -> Vec2 {
    Vec2::new(3.0, 0.5)
}

pub fn spawn_platform(world: &mut GameWorld, desc: &PlatformDesc) -> Entity {
    let platform = world.spawn_at("Platform", Tag::Ground, desc.position);
    world.physics.attach(
        platform,
        Aabb::from_center_size(desc.position, desc.size),
        Layers::GROUND,
        true,
    );
    if let Some(moving) = &desc.moving {
        world.platforms.insert(
            platform,
            MovingPlatform {
                start: desc.position,
                ..moving.clone()
            },
        );
    }
    if let Some(rotating) = &desc.rotating {
        if let Some(transform) = world.transforms.get_mut(platform) {
            transform.rotation_deg = rotating.start_rotation;
        }
        world.rotators.insert(platform, rotating.clone());
    }
    platform
}

pub fn update_platforms(world: &mut GameWorld) {
    let time = world.clock.time;
    let dt = world.clock.dt;
    for entity in world.platforms.entities() {
        if !world.is_active(entity) {
            continue;
        }
        if let Some(target) = world.platforms.get(entity).map(|p| p.position_at(time)) {
            world.set_position(entity, target);
        }
    }
    for entity in world.rotators.entities() {
        if !world.is_active(entity) {
            continue;
        }
        let Some(speed) = world.rotators.get(entity).map(|r| r.speed) else {
            continue;
        };
        if let Some(transform) = world.transforms.get_mut(entity) {
            transform.rotation_deg = (transform.rotation_deg + speed * dt).rem_euclid(360.0);
        }
    }
}
