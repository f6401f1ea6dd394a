//! The player's flashlight: a charge-limited cone that burns wraiths.
//!
//! Holding the light button drains charge and ticks damage on every wraith
//! inside the cone; releasing it lets the charge regenerate. The cone points
//! at the aim position.

use std::collections::BTreeMap;

use darkwood_component::{Component, Entity};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::hazards::wander::damage_wraith;
use crate::world::GameWorld;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashlightSettings {
    pub max_charge: f32,
    /// Charge drained per second while lit.
    pub consumption_rate: f32,
    /// Charge regained per second while off.
    pub regen_rate: f32,
    /// Added to the aim angle, in degrees.
    pub rotation_offset: f32,
    pub damage_per_tick: i32,
    pub damage_tick_rate: f32,
    pub range: f32,
    /// Half the cone's opening, in degrees.
    pub half_angle: f32,
}

impl Default for FlashlightSettings {
    fn default() -> Self {
        Self {
            max_charge: 100.0,
            consumption_rate: 20.0,
            regen_rate: 10.0,
            rotation_offset: -90.0,
            damage_per_tick: 1,
            damage_tick_rate: 0.5,
            range: 6.0,
            half_angle: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flashlight {
    pub settings: FlashlightSettings,
    pub charge: f32,
    /// Lit and damaging this frame.
    pub attacking: bool,
    /// Rotation of the light visual.
    pub rotation_deg: f32,
    aim_dir: Vec2,
    /// Wraiths in the cone and the time left until their next damage tick.
    ghosts_in_light: BTreeMap<Entity, f32>,
}

impl Flashlight {
    #[must_use]
    pub fn new(settings: FlashlightSettings) -> Self {
        Self {
            charge: settings.max_charge,
            settings,
            attacking: false,
            rotation_deg: 0.0,
            aim_dir: Vec2::X,
            ghosts_in_light: BTreeMap::new(),
        }
    }

    /// Turn the light off, e.g. when the player dies.
    pub fn release(&mut self) {
        self.attacking = false;
    }

    /// Charge in `0..=1`, for the gauge.
    #[must_use]
    pub fn charge_normalized(&self) -> f32 {
        if self.settings.max_charge <= 0.0 {
            return 0.0;
        }
        (self.charge / self.settings.max_charge).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn aim_dir(&self) -> Vec2 {
        self.aim_dir
    }

    #[must_use]
    pub fn tracked(&self) -> usize {
        self.ghosts_in_light.len()
    }

    /// Point the light from `origin` at `target`.
    pub fn aim_at(&mut self, origin: Vec2, target: Vec2) {
        let direction = target - origin;
        if direction.length_squared() <= f32::EPSILON {
            return;
        }
        self.aim_dir = direction.normalize();
        self.rotation_deg = direction.y.atan2(direction.x).to_degrees() + self.settings.rotation_offset;
    }

    /// Whether `point` lies inside the cone cast from `origin`.
    #[must_use]
    pub fn illuminates(&self, origin: Vec2, point: Vec2) -> bool {
        let offset = point - origin;
        let distance = offset.length();
        if distance > self.settings.range {
            return false;
        }
        if distance <= f32::EPSILON {
            return true;
        }
        self.aim_dir.angle_to(offset).to_degrees().abs() <= self.settings.half_angle
    }

    /// Start tracking a wraith that entered the cone.
    pub fn on_enter(&mut self, ghost: Entity) {
        let rate = self.settings.damage_tick_rate;
        self.ghosts_in_light.entry(ghost).or_insert(rate);
    }

    pub fn on_exit(&mut self, ghost: Entity) {
        self.ghosts_in_light.remove(&ghost);
    }

    /// Drain or regenerate charge. Returns whether the light damages this
    /// frame.
    pub fn update_gauge(&mut self, trying: bool, dt: f32) -> bool {
        if trying && self.charge > 0.0 {
            self.charge = (self.charge - self.settings.consumption_rate * dt).max(0.0);
            self.attacking = true;
        } else {
            self.attacking = false;
            self.charge = (self.charge + self.settings.regen_rate * dt).min(self.settings.max_charge);
        }
        self.attacking
    }

    /// Count down every tracked wraith's timer and collect those due for a
    /// damage tick, resetting their timers.
    fn due_ticks(&mut self, dt: f32) -> Vec<Entity> {
        let rate = self.settings.damage_tick_rate;
        let mut due = Vec::new();
        for (ghost, timer) in &mut self.ghosts_in_light {
            *timer -= dt;
            if *timer <= 0.0 {
                *timer = rate;
                due.push(*ghost);
            }
        }
        due
    }
}

impl Component for Flashlight {
    fn type_name() -> &'static str {
        "Flashlight"
    }
}

/// Track wraiths in the cone, run the charge gauge and tick damage.
pub fn update_flashlight(world: &mut GameWorld) {
    let dt = world.clock.dt;
    let trying = world.input.flashlight;
    for owner in world.flashlights.entities() {
        if world.player_health.get(owner).is_some_and(|h| h.dead) || !world.is_active(owner) {
            continue;
        }
        let Some(origin) = world.position(owner) else {
            continue;
        };
        let in_cone: Vec<Entity> = world
            .wraiths
            .iter()
            .filter(|(_, wraith)| !wraith.dying)
            .map(|(entity, _)| entity)
            .filter(|e| world.is_active(*e))
            .filter(|e| {
                let light = world.flashlights.get(owner);
                world
                    .position(*e)
                    .zip(light)
                    .is_some_and(|(p, light)| light.illuminates(origin, p))
            })
            .collect();
        let Some(light) = world.flashlights.get_mut(owner) else {
            continue;
        };
        let gone: Vec<Entity> = light
            .ghosts_in_light
            .keys()
            .filter(|e| !in_cone.contains(e))
            .copied()
            .collect();
        for ghost in gone {
            trace!(%ghost, "ghost left the light");
            light.on_exit(ghost);
        }
        for ghost in &in_cone {
            light.on_enter(*ghost);
        }

        if !light.update_gauge(trying, dt) {
            continue;
        }
        let damage = light.settings.damage_per_tick;
        for ghost in light.due_ticks(dt) {
            if damage_wraith(world, ghost, damage) {
                debug!(%ghost, "ghost burned away");
                if let Some(light) = world.flashlights.get_mut(owner) {
                    light.on_exit(ghost);
                }
            }
        }
    }
}

/// Aim every flashlight at the aim position. Runs late, after movement.
pub fn aim_flashlights(world: &mut GameWorld) {
    let Some(target) = world.input.aim else {
        return;
    };
    for owner in world.flashlights.entities() {
        if world.player_health.get(owner).is_some_and(|h| h.dead) {
            continue;
        }
        let Some(origin) = world.position(owner) else {
            continue;
        };
        if let Some(light) = world.flashlights.get_mut(owner) {
            light.aim_at(origin, target);
        }
    }
}
