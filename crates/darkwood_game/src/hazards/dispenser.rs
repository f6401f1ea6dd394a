//! Dispensers that drop crates into the level on a fixed interval.

use std::collections::VecDeque;

use darkwood_component::{Component, Entity};
use darkwood_math::Aabb;
use darkwood_physics::{Body, Layers};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::world::{GameWorld, Tag};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxDispenserSettings {
    pub spawn_interval: f32,
    /// Where crates appear, relative to the dispenser.
    pub spawn_point: Vec2,
    pub box_size: Vec2,
    /// Oldest crates are removed past this many; `0` keeps them all.
    pub max_boxes: usize,
}

impl Default for BoxDispenserSettings {
    fn default() -> Self {
        Self {
            spawn_interval: 3.0,
            spawn_point: Vec2::ZERO,
            box_size: Vec2::ONE,
            max_boxes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxDispenser {
    pub settings: BoxDispenserSettings,
    next_spawn_time: f32,
    boxes: VecDeque<Entity>,
}

impl BoxDispenser {
    /// A dispenser whose first crate drops at `now`.
    #[must_use]
    pub fn new(settings: BoxDispenserSettings, now: f32) -> Self {
        Self {
            settings,
            next_spawn_time: now,
            boxes: VecDeque::new(),
        }
    }

    /// Crates this dispenser has dropped that are still around.
    pub fn boxes(&self) -> impl Iterator<Item = Entity> + '_ {
        self.boxes.iter().copied()
    }
}

impl Component for BoxDispenser {
    fn type_name() -> &'static str {
        "BoxDispenser"
    }
}

pub fn spawn_dispenser(world: &mut GameWorld, position: Vec2, settings: BoxDispenserSettings) -> Entity {
    let dispenser = world.spawn_at("BoxDispenser", Tag::Untagged, position);
    let now = world.clock.time;
    world.dispensers.insert(dispenser, BoxDispenser::new(settings, now));
    dispenser
}

/// Drop a crate from every dispenser whose interval has passed.
pub fn update_dispensers(world: &mut GameWorld) {
    let now = world.clock.time;
    for entity in world.dispensers.entities() {
        if !world.is_active(entity) {
            continue;
        }
        let Some(origin) = world.position(entity) else {
            continue;
        };
        let Some(mut dispenser) = world.dispensers.remove(entity) else {
            continue;
        };
        if now >= dispenser.next_spawn_time {
            dispenser.next_spawn_time = now + dispenser.settings.spawn_interval;
            dispenser.boxes.retain(|b| world.is_alive(*b));
            let crate_box = drop_box(world, origin + dispenser.settings.spawn_point, dispenser.settings.box_size);
            dispenser.boxes.push_back(crate_box);
            let max = dispenser.settings.max_boxes;
            while max > 0 && dispenser.boxes.len() > max {
                if let Some(oldest) = dispenser.boxes.pop_front() {
                    debug!(dispenser = %entity, crate_box = %oldest, "oldest crate removed");
                    world.destroy(oldest, 0.0);
                }
            }
            info!(dispenser = %entity, crate_box = %crate_box, count = dispenser.boxes.len(), "crate dropped");
        }
        world.dispensers.insert(entity, dispenser);
    }
}

fn drop_box(world: &mut GameWorld, position: Vec2, size: Vec2) -> Entity {
    let crate_box = world.spawn_at("Box", Tag::Untagged, position);
    world
        .bodies
        .insert(crate_box, Body::dynamic(size * 0.5, Layers::GROUND));
    world
        .physics
        .attach(crate_box, Aabb::from_center_size(position, size), Layers::GROUND, true);
    crate_box
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_immediately_then_on_interval() {
        let mut world = GameWorld::default();
        let dispenser = spawn_dispenser(
            &mut world,
            Vec2::new(2.0, 4.0),
            BoxDispenserSettings {
                spawn_point: Vec2::new(0.0, -1.0),
                ..Default::default()
            },
        );
        update_dispensers(&mut world);
        let first: Vec<Entity> = world.dispensers.get(dispenser).unwrap().boxes().collect();
        assert_eq!(first.len(), 1);
        assert_eq!(world.position(first[0]), Some(Vec2::new(2.0, 3.0)));
        assert!(world.bodies.contains(first[0]));
        assert!(world.physics.collider_of(first[0]).is_some_and(|c| c.solid));

        world.clock.time = 2.9;
        update_dispensers(&mut world);
        assert_eq!(world.dispensers.get(dispenser).unwrap().boxes().count(), 1);
        world.clock.time = 3.0;
        update_dispensers(&mut world);
        assert_eq!(world.dispensers.get(dispenser).unwrap().boxes().count(), 2);
    }

    #[test]
    fn test_cap_removes_oldest_crate() {
        let mut world = GameWorld::default();
        let dispenser = spawn_dispenser(
            &mut world,
            Vec2::ZERO,
            BoxDispenserSettings {
                spawn_interval: 1.0,
                max_boxes: 2,
                ..Default::default()
            },
        );
        for t in 0..3 {
            world.clock.time = t as f32;
            update_dispensers(&mut world);
        }
        let boxes: Vec<Entity> = world.dispensers.get(dispenser).unwrap().boxes().collect();
        assert_eq!(boxes.len(), 2);
        world.flush_destroyed();
        assert_eq!(world.bodies.len(), 2);
        assert!(boxes.iter().all(|b| world.is_alive(*b)));
    }
}
