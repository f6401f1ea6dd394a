//! The simple player controller.
//!
//! Input sets velocity directly. Walls are detected from contact normals:
//! touching a wall while airborne starts a slide, and jumping during a slide
//! kicks the player away from the wall.

use darkwood_component::{Component, Entity};
use darkwood_physics::CollisionEvent;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::level::manager::can_play;
use crate::player::DamageInfo;
use crate::routine::Routines;
use crate::world::GameWorld;

/// Seconds between death and the scene reload.
pub const DEATH_RELOAD_DELAY: f32 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub run_speed: f32,
    pub jump_force: f32,
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    pub wall_sliding_speed: f32,
    pub life: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            run_speed: 8.0,
            jump_force: 12.0,
            dash_speed: 20.0,
            dash_duration: 0.2,
            dash_cooldown: 1.0,
            wall_sliding_speed: 6.0,
            life: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControllerAction {
    ReloadScene,
}

#[derive(Debug, Clone)]
pub struct PlayerController {
    pub settings: ControllerSettings,
    pub life: f32,
    pub enabled: bool,
    horizontal: f32,
    jumping: bool,
    pub dashing: bool,
    pub grounded: bool,
    pub wall_sliding: bool,
    wall_jumping: bool,
    jump_left: bool,
    jump_right: bool,
    dash_timer: f32,
    last_dash: f32,
    routines: Routines<ControllerAction>,
}

impl PlayerController {
    #[must_use]
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            life: settings.life,
            settings,
            enabled: true,
            horizontal: 0.0,
            jumping: false,
            dashing: false,
            grounded: false,
            wall_sliding: false,
            wall_jumping: false,
            jump_left: false,
            jump_right: false,
            dash_timer: 0.0,
            last_dash: f32::NEG_INFINITY,
            routines: Routines::new(),
        }
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    /// Read input. Outside of play the player is held in place
    /// horizontally.
    pub fn update(&mut self, me: Entity, world: &mut GameWorld) {
        for action in self.routines.drain_due(world.clock.time) {
            match action {
                ControllerAction::ReloadScene => {
                    let scene = world.scene.clone();
                    world.request_scene(scene);
                }
            }
        }
        if !self.enabled || !can_play(world) {
            if let Some(body) = world.bodies.get_mut(me) {
                body.velocity.x = 0.0;
            }
            return;
        }

        let input = &world.input;
        self.horizontal = input.horizontal;
        if input.jump && self.grounded {
            self.jumping = true;
        }
        if input.jump && self.wall_sliding {
            self.wall_jumping = true;
        }
        let now = world.clock.time;
        if input.dash && now >= self.last_dash + self.settings.dash_cooldown {
            self.dashing = true;
            self.dash_timer = self.settings.dash_duration;
            self.last_dash = now;
            debug!(player = %me, "dash");
        }
    }

    pub fn fixed_update(&mut self, me: Entity, world: &mut GameWorld) {
        if !self.enabled {
            return;
        }
        let dt = world.clock.fixed_dt;
        let s = &self.settings;
        let Some(body) = world.bodies.get_mut(me) else {
            return;
        };

        if self.dashing {
            body.velocity.x = darkwood_math::sign(self.horizontal) * s.dash_speed;
            self.dash_timer -= dt;
            if self.dash_timer <= 0.0 {
                self.dashing = false;
            }
        }
        if !self.dashing {
            body.velocity.x = self.horizontal * s.run_speed;
        }
        if self.jumping {
            body.velocity.y = s.jump_force;
            self.jumping = false;
        }
        if self.wall_jumping {
            body.velocity = Vec2::ZERO;
            if self.jump_right {
                body.velocity = Vec2::new(2.0 * s.jump_force, s.jump_force);
            }
            if self.jump_left {
                body.velocity = Vec2::new(-2.0 * s.jump_force, s.jump_force);
            }
            self.wall_sliding = false;
            self.wall_jumping = false;
        }
        if self.wall_sliding {
            body.velocity.y = -s.wall_sliding_speed;
        }
    }

    /// React to the physics step's contact changes.
    pub fn on_collision(&mut self, event: &CollisionEvent) {
        match event {
            CollisionEvent::Enter { normal, .. } => {
                if *normal == Vec2::Y {
                    self.grounded = true;
                    self.jumping = false;
                } else if *normal == Vec2::NEG_X {
                    if !self.wall_jumping {
                        self.wall_sliding = true;
                        self.jump_left = true;
                    }
                } else if *normal == Vec2::X && !self.wall_jumping {
                    self.wall_sliding = true;
                    self.jump_right = true;
                }
            }
            CollisionEvent::Exit { .. } => {
                self.grounded = false;
                self.wall_sliding = false;
                self.jump_left = false;
                self.jump_right = false;
            }
        }
    }

    /// Lose life. Returns whether the damage was taken.
    pub fn apply_damage(&mut self, me: Entity, world: &mut GameWorld, damage: DamageInfo) -> bool {
        if self.is_dead() {
            return false;
        }
        self.life -= damage.amount;
        if self.is_dead() {
            info!(player = %me, "player died");
            self.enabled = false;
            world.set_velocity(me, Vec2::ZERO);
            self.routines
                .start(world.clock.time, DEATH_RELOAD_DELAY, ControllerAction::ReloadScene);
        }
        true
    }

    /// Put the controller back to its starting state (level restart).
    pub fn reset(&mut self) {
        *self = Self::new(self.settings.clone());
    }
}

impl Component for PlayerController {
    fn type_name() -> &'static str {
        "PlayerController"
    }
}
