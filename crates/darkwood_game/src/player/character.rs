//! The character controller.
//!
//! Movement is smoothed towards a target speed and only steerable on the
//! ground unless `air_control` is on. Off the ground the controller tests a
//! wall check in front of the player; touching a wall while falling starts a
//! wall slide, from which the player can wall-jump or dash away.
//!
//! A wall jump briefly takes control away. Control comes back once the
//! player has travelled far enough from the wall, starts falling, or after a
//! hard timeout so the player can never stay locked.

use darkwood_component::{Component, Entity};
use darkwood_math::smooth_damp_vec2;
use darkwood_physics::{ForceMode, Layers};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::player::DamageInfo;
use crate::routine::Routines;
use crate::world::GameWorld;

/// Radius of the ground and wall checks.
pub const GROUNDED_RADIUS: f32 = 0.2;
pub const GROUND_CHECK_OFFSET: Vec2 = Vec2::new(0.0, -0.9);
/// Wall check relative to a player facing right.
pub const WALL_CHECK_OFFSET: Vec2 = Vec2::new(0.5, 0.0);
/// Longest control stays locked after a wall jump.
pub const WALL_JUMP_TIMEOUT: f32 = 0.5;
const DASH_TIME: f32 = 0.1;
const DASH_COOLDOWN: f32 = 0.5;
const WALL_CHECK_DELAY: f32 = 0.1;
const END_SLIDE_DELAY: f32 = 0.1;
const STUN_TIME: f32 = 0.25;
const INVINCIBLE_TIME: f32 = 1.0;
const DEATH_STOP_DELAY: f32 = 0.4;
const DEATH_RELOAD_DELAY: f32 = 1.1;
const KNOCKBACK: f32 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterSettings {
    /// Input scale: horizontal axis times this is the distance per second.
    pub run_speed: f32,
    pub jump_force: f32,
    pub movement_smoothing: f32,
    pub air_control: bool,
    pub dash_force: f32,
    pub wall_sliding_speed: f32,
    pub wall_jump_horizontal_multiplier: f32,
    pub wall_jump_vertical_multiplier: f32,
    pub limit_fall_speed: f32,
    pub life: f32,
}

impl Default for CharacterSettings {
    fn default() -> Self {
        Self {
            run_speed: 40.0,
            jump_force: 400.0,
            movement_smoothing: 0.05,
            air_control: false,
            dash_force: 25.0,
            wall_sliding_speed: 5.0,
            wall_jump_horizontal_multiplier: 1.2,
            wall_jump_vertical_multiplier: 1.0,
            limit_fall_speed: 25.0,
            life: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharacterAction {
    DashEnd,
    DashReady,
    EnableWallCheck,
    EndSliding,
    StunEnd,
    InvincibleEnd,
    DeathStop,
    DeathReload,
}

/// Input latched in `update` and consumed by the next fixed step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    pub horizontal: f32,
    pub jump: bool,
    pub dash: bool,
}

#[derive(Debug, Clone)]
pub struct CharacterController {
    pub settings: CharacterSettings,
    pub life: f32,
    pub invincible: bool,
    pub can_move: bool,
    pub dead: bool,
    pub grounded: bool,
    pub facing_right: bool,
    pub can_double_jump: bool,
    pub can_dash: bool,
    pub dashing: bool,
    pub is_wall: bool,
    pub wall_sliding: bool,
    old_wall_sliding: bool,
    can_check: bool,
    pub limit_vel_on_wall_jump: bool,
    last_wall_jump_time: f32,
    jump_wall_start_x: f32,
    prev_velocity_x: f32,
    wall_check: Vec2,
    smoothing: Vec2,
    input: MoveInput,
    /// Landings since spawn.
    pub landings: u32,
    routines: Routines<CharacterAction>,
}

impl CharacterController {
    #[must_use]
    pub fn new(settings: CharacterSettings) -> Self {
        Self {
            life: settings.life,
            settings,
            invincible: false,
            can_move: true,
            dead: false,
            grounded: false,
            facing_right: true,
            can_double_jump: true,
            can_dash: true,
            dashing: false,
            is_wall: false,
            wall_sliding: false,
            old_wall_sliding: false,
            can_check: false,
            limit_vel_on_wall_jump: false,
            last_wall_jump_time: 0.0,
            jump_wall_start_x: 0.0,
            prev_velocity_x: 0.0,
            wall_check: WALL_CHECK_OFFSET,
            smoothing: Vec2::ZERO,
            input: MoveInput::default(),
            landings: 0,
            routines: Routines::new(),
        }
    }

    fn facing_sign(&self) -> f32 {
        if self.facing_right { 1.0 } else { -1.0 }
    }

    /// Horizontal distance travelled away from the wall since the last wall
    /// jump, negative while moving away.
    #[must_use]
    pub fn wall_jump_distance(&self, x: f32) -> f32 {
        (self.jump_wall_start_x - x) * self.facing_sign()
    }

    /// Run due timers, handle the emergency reset and latch input.
    pub fn update(&mut self, me: Entity, world: &mut GameWorld) {
        for action in self.routines.drain_due(world.clock.time) {
            self.run_action(me, world, action);
        }

        if world.input.reset_movement {
            warn!(player = %me, "emergency movement reset");
            self.emergency_reset();
        }

        let playing = world.level.as_ref().is_none_or(|l| l.can_play());
        if !playing || self.dead {
            self.input = MoveInput::default();
            return;
        }
        let input = &world.input;
        self.input.horizontal = input.horizontal;
        self.input.jump |= input.jump;
        self.input.dash |= input.dash;
    }

    pub fn emergency_reset(&mut self) {
        self.can_move = true;
        self.limit_vel_on_wall_jump = false;
        self.dashing = false;
        self.wall_sliding = false;
        self.old_wall_sliding = false;
    }

    fn run_action(&mut self, me: Entity, world: &mut GameWorld, action: CharacterAction) {
        match action {
            CharacterAction::DashEnd => {
                self.dashing = false;
                set_bool(world, me, "IsDashing", false);
            }
            CharacterAction::DashReady => self.can_dash = true,
            CharacterAction::EnableWallCheck => self.can_check = true,
            CharacterAction::EndSliding => {
                self.can_double_jump = true;
                self.stop_sliding(me, world);
            }
            CharacterAction::StunEnd => {
                self.can_move = true;
                set_bool(world, me, "Hit", false);
            }
            CharacterAction::InvincibleEnd => self.invincible = false,
            CharacterAction::DeathStop => {
                if let Some(body) = world.bodies.get_mut(me) {
                    body.velocity.x = 0.0;
                }
            }
            CharacterAction::DeathReload => {
                let scene = world.scene.clone();
                world.request_scene(scene);
            }
        }
    }

    /// Fixed step: check the ground and wall, release wall-jump limiting,
    /// then move with the latched input.
    pub fn fixed_update(&mut self, me: Entity, world: &mut GameWorld) {
        self.check_surroundings(me, world);
        self.limit_wall_jump_velocity(me, world);
        let input = std::mem::take(&mut self.input);
        self.move_character(me, world, input.horizontal * self.settings.run_speed * world.clock.fixed_dt, input.jump, input.dash);
        self.input.horizontal = input.horizontal;
    }

    fn check_surroundings(&mut self, me: Entity, world: &mut GameWorld) {
        let Some(position) = world.position(me) else {
            return;
        };
        let was_grounded = self.grounded;
        self.grounded = world.physics.overlap_circle_any(
            position + GROUND_CHECK_OFFSET,
            GROUNDED_RADIUS,
            Layers::GROUND,
            Some(me),
        );
        if self.grounded && !was_grounded {
            self.landings += 1;
            self.can_double_jump = true;
            if world.velocity(me).y < 0.0 {
                self.limit_vel_on_wall_jump = false;
            }
            set_bool(world, me, "IsJumping", false);
            set_bool(world, me, "IsDoubleJumping", false);
            set_bool(world, me, "JumpUp", false);
            debug!(player = %me, "landed");
        }

        self.is_wall = false;
        if !self.grounded {
            let wall_point = position + Vec2::new(self.wall_check.x * self.facing_sign(), self.wall_check.y);
            if world
                .physics
                .overlap_circle_any(wall_point, GROUNDED_RADIUS, Layers::GROUND, Some(me))
            {
                self.dashing = false;
                self.is_wall = true;
            }
            self.prev_velocity_x = world.velocity(me).x;
        }
    }

    fn limit_wall_jump_velocity(&mut self, me: Entity, world: &mut GameWorld) {
        if !self.limit_vel_on_wall_jump {
            return;
        }
        let now = world.clock.time;
        let Some(position) = world.position(me) else {
            return;
        };
        let Some(body) = world.bodies.get_mut(me) else {
            return;
        };
        if now - self.last_wall_jump_time > WALL_JUMP_TIMEOUT {
            debug!(player = %me, "wall jump limit timed out");
            self.limit_vel_on_wall_jump = false;
            self.can_move = true;
            return;
        }
        if body.velocity.y < -0.5 {
            self.limit_vel_on_wall_jump = false;
            self.can_move = true;
            return;
        }
        let dist = self.wall_jump_distance(position.x);
        if dist < -0.5 && dist > -1.0 {
            self.can_move = true;
        } else if dist < -1.0 && dist >= -2.0 {
            self.can_move = true;
            body.velocity.x = 10.0 * self.facing_sign();
        } else if dist < -2.0 || dist > 0.0 {
            self.limit_vel_on_wall_jump = false;
            self.can_move = true;
            body.velocity.x = 0.0;
        }
    }

    fn start_dash(&mut self, me: Entity, world: &mut GameWorld) {
        set_bool(world, me, "IsDashing", true);
        self.dashing = true;
        self.can_dash = false;
        let now = world.clock.time;
        self.routines.start(now, DASH_TIME, CharacterAction::DashEnd);
        self.routines
            .start(now, DASH_TIME + DASH_COOLDOWN, CharacterAction::DashReady);
    }

    fn flip(&mut self, me: Entity, world: &mut GameWorld) {
        self.facing_right = !self.facing_right;
        if let Some(transform) = world.transforms.get_mut(me) {
            transform.set_facing(self.facing_right);
        }
    }

    fn stop_sliding(&mut self, me: Entity, world: &mut GameWorld) {
        self.wall_sliding = false;
        set_bool(world, me, "IsWallSliding", false);
        self.old_wall_sliding = false;
        self.wall_check.x = self.wall_check.x.abs();
    }

    /// Apply one fixed step of movement.
    ///
    /// `movement` is the horizontal distance the input asks for this step.
    pub fn move_character(&mut self, me: Entity, world: &mut GameWorld, movement: f32, jump: bool, dash: bool) {
        if !self.can_move {
            return;
        }
        let s = self.settings.clone();
        let now = world.clock.time;
        let dt = world.clock.fixed_dt;

        if dash && self.can_dash && !self.wall_sliding {
            self.start_dash(me, world);
        }
        let velocity = world.velocity(me);
        if self.dashing {
            world.set_velocity(me, Vec2::new(self.facing_sign() * s.dash_force, 0.0));
        } else if self.grounded || s.air_control {
            let mut current = velocity;
            if current.y < -s.limit_fall_speed {
                current.y = -s.limit_fall_speed;
            }
            let target = Vec2::new(movement * 10.0, current.y);
            let smoothed = smooth_damp_vec2(current, target, &mut self.smoothing, s.movement_smoothing, dt);
            world.set_velocity(me, smoothed);
            if (movement > 0.0 && !self.facing_right || movement < 0.0 && self.facing_right) && !self.wall_sliding {
                self.flip(me, world);
            }
        }

        if self.grounded && jump {
            set_bool(world, me, "IsJumping", true);
            set_bool(world, me, "JumpUp", true);
            self.grounded = false;
            self.add_force(me, world, Vec2::new(0.0, s.jump_force));
            self.can_double_jump = true;
        } else if !self.grounded && jump && self.can_double_jump && !self.wall_sliding {
            self.can_double_jump = false;
            let v = world.velocity(me);
            world.set_velocity(me, Vec2::new(v.x, 0.0));
            self.add_force(me, world, Vec2::new(0.0, s.jump_force / 1.2));
            set_bool(world, me, "IsDoubleJumping", true);
        } else if self.is_wall && !self.grounded {
            let falling = world.velocity(me).y < 0.0;
            if (!self.old_wall_sliding && falling) || self.dashing {
                self.wall_sliding = true;
                self.wall_check.x = -self.wall_check.x;
                self.flip(me, world);
                self.can_check = false;
                self.routines
                    .start(now, WALL_CHECK_DELAY, CharacterAction::EnableWallCheck);
                self.can_double_jump = true;
                set_bool(world, me, "IsWallSliding", true);
            }
            self.dashing = false;

            if self.wall_sliding {
                if movement * self.facing_sign() > 0.1 {
                    if !self.routines.any(|a| *a == CharacterAction::EndSliding) {
                        self.routines.start(now, END_SLIDE_DELAY, CharacterAction::EndSliding);
                    }
                } else {
                    self.old_wall_sliding = true;
                    world.set_velocity(me, Vec2::new(-self.facing_sign() * 2.0, -s.wall_sliding_speed));
                }
            }

            if jump && self.wall_sliding {
                set_bool(world, me, "IsJumping", true);
                set_bool(world, me, "JumpUp", true);
                world.set_velocity(me, Vec2::ZERO);
                let push = Vec2::new(
                    self.facing_sign() * s.jump_force * s.wall_jump_horizontal_multiplier,
                    s.jump_force * s.wall_jump_vertical_multiplier,
                );
                self.add_force(me, world, push);
                self.jump_wall_start_x = world.position(me).map_or(0.0, |p| p.x);
                self.limit_vel_on_wall_jump = true;
                self.last_wall_jump_time = now;
                self.can_double_jump = true;
                self.stop_sliding(me, world);
                self.can_move = false;
                debug!(player = %me, "wall jump");
            } else if dash && self.can_dash {
                self.stop_sliding(me, world);
                self.can_double_jump = true;
                self.start_dash(me, world);
            }
        } else if self.wall_sliding && !self.is_wall && self.can_check {
            self.stop_sliding(me, world);
            self.can_double_jump = true;
        }
    }

    fn add_force(&self, me: Entity, world: &mut GameWorld, force: Vec2) {
        if let Some(body) = world.bodies.get_mut(me) {
            body.add_force(force, ForceMode::Force);
        }
    }

    /// Take a hit from `damage.source`. Returns whether it landed.
    ///
    /// The player is knocked away from the source, then either stunned and
    /// briefly invincible, or killed and the scene reloaded.
    pub fn apply_damage(&mut self, me: Entity, world: &mut GameWorld, position: Vec2, damage: DamageInfo) -> bool {
        if self.invincible || self.dead {
            return false;
        }
        set_bool(world, me, "Hit", true);
        self.life -= damage.amount;
        let direction = (position - damage.source).normalize_or_zero() * KNOCKBACK;
        world.set_velocity(me, Vec2::ZERO);
        self.add_force(me, world, direction * 10.0);

        let now = world.clock.time;
        if self.life <= 0.0 {
            info!(player = %me, "player died");
            set_bool(world, me, "IsDead", true);
            self.dead = true;
            self.can_move = false;
            self.invincible = true;
            if let Some(attack) = world.player_attacks.get_mut(me) {
                attack.enabled = false;
            }
            self.routines.start(now, DEATH_STOP_DELAY, CharacterAction::DeathStop);
            self.routines.start(
                now,
                DEATH_STOP_DELAY + DEATH_RELOAD_DELAY,
                CharacterAction::DeathReload,
            );
        } else {
            self.can_move = false;
            self.routines.start(now, STUN_TIME, CharacterAction::StunEnd);
            self.invincible = true;
            self.routines
                .start(now, INVINCIBLE_TIME, CharacterAction::InvincibleEnd);
        }
        true
    }
}

fn set_bool(world: &mut GameWorld, me: Entity, name: &'static str, value: bool) {
    if let Some(animator) = world.animators.get_mut(me) {
        animator.set_bool(name, value);
    }
}

impl Component for CharacterController {
    fn type_name() -> &'static str {
        "CharacterController"
    }
}
