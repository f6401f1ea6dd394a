//! Enemy locomotion.
//!
//! Skeletons walk along the ground and snap back onto it whenever they lose
//! contact. Ghosts hover a fixed height above whatever is below them, bob
//! gently, and can jump or climb when the AI asks.

use darkwood_component::Entity;
use darkwood_math::smooth_damp;
use darkwood_physics::{ForceMode, Layers};
use glam::Vec2;

use crate::enemy::Enemy;
use crate::world::GameWorld;

/// Ground check position relative to the enemy.
pub const GROUND_CHECK_OFFSET: Vec2 = Vec2::new(0.0, -0.9);
/// How far below a falling walker the ground is searched for.
const GROUND_SNAP_DISTANCE: f32 = 10.0;
/// Horizontal push of a hover jump.
const JUMP_FORWARD_IMPULSE: f32 = 3.0;
/// Horizontal speed cap of a targeted jump.
const MAX_TARGET_JUMP_SPEED: f32 = 8.0;
/// Velocity given when stepping off the top of a climb.
const CLIMB_EXIT_PUSH: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct EnemyMovement {
    pub direction: Vec2,
    pub facing_right: bool,
    pub grounded: bool,
    pub ground_check: Vec2,
    pub ghost: Option<GhostMotion>,
}

impl EnemyMovement {
    #[must_use]
    pub fn walker() -> Self {
        Self {
            direction: Vec2::ZERO,
            facing_right: true,
            grounded: false,
            ground_check: GROUND_CHECK_OFFSET,
            ghost: None,
        }
    }

    #[must_use]
    pub fn hover() -> Self {
        Self {
            ghost: Some(GhostMotion::default()),
            ..Self::walker()
        }
    }

    #[must_use]
    pub fn facing_sign(&self) -> f32 {
        if self.facing_right { 1.0 } else { -1.0 }
    }

    #[must_use]
    pub fn is_climbing(&self) -> bool {
        self.ghost.as_ref().is_some_and(|g| g.climbing)
    }
}

/// Hover state of a ghost.
#[derive(Debug, Clone, Default)]
pub struct GhostMotion {
    /// Height the ghost settles at. Unset until the first ground ray hits.
    pub target_hover_y: Option<f32>,
    pub bob_time: f32,
    pub climbing: bool,
    /// Airborne from a jump; hovering is suspended until landing.
    pub jumping: bool,
    hover_velocity: f32,
}

impl Enemy {
    /// Fixed-step movement.
    pub fn fixed_movement(&mut self, me: Entity, world: &mut GameWorld) {
        if self.movement.ghost.is_some() {
            self.hover_fixed(me, world);
        } else {
            self.walk_fixed(me, world);
        }
    }

    /// Per-frame movement bookkeeping (the hover bob).
    pub fn update_movement(&mut self, dt: f32) {
        let bob_speed = self.ghost.as_ref().map_or(0.0, |g| g.hover_bob_speed);
        if let Some(motion) = self.movement.ghost.as_mut() {
            motion.bob_time += dt * bob_speed;
        }
    }

    fn check_grounded(&mut self, me: Entity, world: &GameWorld, position: Vec2) {
        let check = position + self.movement.ground_check;
        self.movement.grounded =
            world
                .physics
                .overlap_circle_any(check, self.data.ground_check_radius, Layers::GROUND, Some(me));
    }

    fn walk_fixed(&mut self, me: Entity, world: &mut GameWorld) {
        let Some(position) = world.position(me) else {
            return;
        };
        self.check_grounded(me, world, position);
        if self.movement.grounded {
            let vx = self.movement.direction.x * self.data.move_speed;
            if let Some(body) = world.bodies.get_mut(me) {
                body.velocity.x = vx;
            }
        } else {
            self.keep_on_ground(me, world, position);
        }
    }

    /// Put a walker that lost the ground back on the nearest floor below.
    fn keep_on_ground(&mut self, me: Entity, world: &mut GameWorld, position: Vec2) {
        let Some(hit) = world
            .physics
            .raycast(position, Vec2::NEG_Y, GROUND_SNAP_DISTANCE, Layers::GROUND)
        else {
            return;
        };
        let snapped = Vec2::new(position.x, hit.point.y - GROUND_CHECK_OFFSET.y);
        world.set_position(me, snapped);
        if let Some(body) = world.bodies.get_mut(me) {
            body.velocity.y = 0.0;
        }
    }

    fn hover_fixed(&mut self, me: Entity, world: &mut GameWorld) {
        let Some(data) = self.ghost.as_ref() else {
            return;
        };
        let (smoothing, amplitude) = (data.hover_smoothing, data.hover_bob_amplitude);
        let Some(motion) = self.movement.ghost.as_mut() else {
            return;
        };
        if motion.climbing {
            return;
        }
        let Some(mut position) = world.position(me) else {
            return;
        };

        if let (Some(target), false) = (motion.target_hover_y, motion.jumping) {
            let target_y = target + motion.bob_time.sin() * amplitude;
            let dt = world.clock.fixed_dt;
            position.y = smooth_damp(position.y, target_y, &mut motion.hover_velocity, smoothing, dt);
            world.set_position(me, position);
            if let Some(body) = world.bodies.get_mut(me) {
                body.velocity.y = 0.0;
            }
        }
        let jumping = motion.jumping;

        self.check_grounded(me, world, position);
        if !jumping {
            let vx = self.movement.direction.x * self.data.move_speed;
            if let Some(body) = world.bodies.get_mut(me) {
                body.velocity.x = vx;
            }
        }
    }

    /// Walk in `direction`. Ignored while climbing.
    pub fn set_move_direction(&mut self, me: Entity, world: &mut GameWorld, direction: Vec2) {
        if self.movement.is_climbing() {
            return;
        }
        self.movement.direction = direction;
        if direction.x != 0.0 {
            self.flip(me, world, direction.x > 0.0);
        }
        let walking = direction.x.abs() > 0.1;
        self.animate(me, world, |anim| anim.set_walking(walking));
    }

    pub fn stop_moving(&mut self, me: Entity, world: &mut GameWorld) {
        self.movement.direction = Vec2::ZERO;
        if let Some(body) = world.bodies.get_mut(me) {
            body.velocity.x = 0.0;
        }
        self.animate(me, world, |anim| anim.set_walking(false));
    }

    /// Face left or right. Walkers only react to a change; ghosts always
    /// re-apply their facing.
    pub fn flip(&mut self, me: Entity, world: &mut GameWorld, face_right: bool) {
        if self.movement.ghost.is_none() && self.movement.facing_right == face_right {
            return;
        }
        self.movement.facing_right = face_right;
        if let Some(transform) = world.transforms.get_mut(me) {
            transform.set_facing(face_right);
        }
    }

    pub fn adjust_hover_height(&mut self, height: f32) {
        if let Some(motion) = self.movement.ghost.as_mut() {
            motion.target_hover_y = Some(height);
        }
    }

    /// Hop upward, harder for taller obstacles, with a small forward push.
    pub fn jump(&mut self, me: Entity, world: &mut GameWorld, height_needed: f32) {
        let Some(force) = self.ghost.as_ref().map(|g| g.jump_force) else {
            return;
        };
        if let Some(motion) = self.movement.ghost.as_mut() {
            motion.jumping = true;
        }
        let scaled = force.max(force * (height_needed / 2.0));
        let forward = JUMP_FORWARD_IMPULSE * self.movement.facing_sign();
        if let Some(body) = world.bodies.get_mut(me) {
            body.velocity.y = 0.0;
            body.add_force(Vec2::Y * scaled, ForceMode::Impulse);
            body.add_force(Vec2::X * forward, ForceMode::Impulse);
        }
    }

    /// Launch on a ballistic arc that peaks one unit above `height_needed`
    /// and lands on `target`.
    pub fn jump_to_target(&mut self, me: Entity, world: &mut GameWorld, height_needed: f32, target: Vec2) {
        let Some(position) = world.position(me) else {
            return;
        };
        if let Some(motion) = self.movement.ghost.as_mut() {
            motion.jumping = true;
        }
        let gravity_y = world.physics.gravity.y.abs();
        let Some(body) = world.bodies.get_mut(me) else {
            return;
        };
        let velocity = target_jump_velocity(position, target, height_needed, gravity_y * body.gravity_scale);
        body.velocity = velocity;
    }

    /// The jump is over; hovering takes control again.
    pub fn land(&mut self) {
        if let Some(motion) = self.movement.ghost.as_mut() {
            motion.jumping = false;
        }
    }

    pub fn start_climbing(&mut self, me: Entity, world: &mut GameWorld) {
        if let Some(motion) = self.movement.ghost.as_mut() {
            motion.climbing = true;
        }
        if let Some(body) = world.bodies.get_mut(me) {
            body.velocity = Vec2::ZERO;
            body.gravity_scale = 0.0;
        }
    }

    pub fn climb(&mut self, me: Entity, world: &mut GameWorld) {
        if !self.movement.is_climbing() {
            return;
        }
        let speed = self.ghost.as_ref().map_or(0.0, |g| g.climb_speed);
        if let Some(body) = world.bodies.get_mut(me) {
            body.velocity = Vec2::new(0.0, speed);
        }
    }

    /// Leave the wall, stepping forward over the top.
    pub fn finish_climbing(&mut self, me: Entity, world: &mut GameWorld) {
        if let Some(motion) = self.movement.ghost.as_mut() {
            motion.climbing = false;
        }
        let push = self.movement.facing_sign() * CLIMB_EXIT_PUSH;
        if let Some(body) = world.bodies.get_mut(me) {
            body.gravity_scale = 1.0;
            body.velocity = Vec2::new(push, 1.0);
        }
    }
}

/// Launch velocity for a jump from `from` to `target` that rises one unit
/// above `height_needed`.
#[must_use]
pub fn target_jump_velocity(from: Vec2, target: Vec2, height_needed: f32, gravity: f32) -> Vec2 {
    let gravity = gravity.max(f32::EPSILON);
    let jump_height = (height_needed + 1.0).max(0.0);
    let vy = (2.0 * gravity * jump_height).sqrt();
    let time_to_apex = vy / gravity;
    let vx = if time_to_apex > 0.0 {
        (target.x - from.x) / (time_to_apex * 2.0)
    } else {
        0.0
    };
    Vec2::new(vx.clamp(-MAX_TARGET_JUMP_SPEED, MAX_TARGET_JUMP_SPEED), vy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_jump_reaches_height() {
        let g = 9.81;
        let v = target_jump_velocity(Vec2::ZERO, Vec2::new(4.0, 2.0), 2.0, g);
        let apex = v.y * v.y / (2.0 * g);
        assert!((apex - 3.0).abs() < 1e-4);
        let flight = 2.0 * v.y / g;
        assert!((v.x * flight - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_target_jump_clamps_horizontal_speed() {
        let v = target_jump_velocity(Vec2::ZERO, Vec2::new(-100.0, 0.0), 0.0, 9.81);
        assert_eq!(v.x, -MAX_TARGET_JUMP_SPEED);
    }

    #[test]
    fn test_facing_sign() {
        let mut movement = EnemyMovement::walker();
        assert_eq!(movement.facing_sign(), 1.0);
        movement.facing_right = false;
        assert_eq!(movement.facing_sign(), -1.0);
        assert!(!movement.is_climbing());
        assert!(EnemyMovement::hover().ghost.is_some());
    }
}
