//! Acid rain: a box of falling droplets that hurts the player inside it.

use darkwood_component::Component;
use darkwood_math::Aabb;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::player::{DamageInfo, damage_player};
use crate::world::GameWorld;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcidRain {
    pub droplet_damage: f32,
    /// Seconds between droplets reaching the ground.
    pub drop_interval: f32,
    /// Size of the rain area, centred on the entity.
    pub area: Vec2,
    #[serde(skip)]
    next_drop: f32,
}

impl Default for AcidRain {
    fn default() -> Self {
        Self {
            droplet_damage: 1.0,
            drop_interval: 0.5,
            area: Vec2::new(6.0, 10.0),
            next_drop: 0.0,
        }
    }
}

impl Component for AcidRain {
    fn type_name() -> &'static str {
        "AcidRain"
    }
}

/// Drop a droplet from every rain area that is due, hurting the player
/// when it stands inside.
pub fn update_acid_rain(world: &mut GameWorld) {
    let now = world.clock.time;
    let player = world.player();
    for entity in world.acid_rain.entities() {
        if !world.is_active(entity) {
            continue;
        }
        let Some(center) = world.position(entity) else {
            continue;
        };
        let Some(rain) = world.acid_rain.get_mut(entity) else {
            continue;
        };
        if now < rain.next_drop {
            continue;
        }
        rain.next_drop = now + rain.drop_interval;
        let area = Aabb::from_center_size(center, rain.area);
        let damage = rain.droplet_damage;
        let Some(player) = player else {
            continue;
        };
        if world.position(player).is_some_and(|p| area.contains_point(p)) {
            damage_player(world, player, DamageInfo::new(damage, center));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerDesc, spawn_player};
    use crate::world::Tag;

    #[test]
    fn test_droplets_hurt_only_inside_and_on_interval() {
        let mut world = GameWorld::default();
        let player = spawn_player(&mut world, &PlayerDesc::default());
        let rain = world.spawn_at("AcidRain", Tag::Untagged, Vec2::new(1.0, 2.0));
        world.acid_rain.insert(rain, AcidRain::default());

        update_acid_rain(&mut world);
        world.clock.time = 0.2;
        update_acid_rain(&mut world);
        assert_eq!(world.controllers.get(player).unwrap().life, 9.0);
        world.clock.time = 0.5;
        update_acid_rain(&mut world);
        assert_eq!(world.controllers.get(player).unwrap().life, 8.0);

        world.set_position(player, Vec2::new(20.0, 0.0));
        world.clock.time = 1.0;
        update_acid_rain(&mut world);
        assert_eq!(world.controllers.get(player).unwrap().life, 8.0);
    }
}
