//! Ghost navigation.
//!
//! Ghosts hover above the ground and can follow the player onto higher
//! ledges. Each frame a ghost casts rays at the ground below it and the wall ahead,
//! samples the player's position, and decides between the shared state
//! machine's moves and a jump or climb of its own.
//!
//! A player who keeps standing above the ghost for a while is treated as
//! being on a platform; the ghost then computes a landing spot near them and
//! jumps if the arc is clear, or climbs if a wall is in the way.

use std::collections::VecDeque;

use darkwood_component::Entity;
use darkwood_math::sign;
use darkwood_physics::{Layers, PhysicsWorld};
use glam::Vec2;
use tracing::debug;

use crate::enemy::Enemy;
use crate::enemy::ai::{AiAction, AiState};
use crate::enemy::animation::EnemyAnimation;
use crate::enemy::data::{GhostData, GhostTuning};
use crate::events::{EffectKind, GameEvent};
use crate::world::GameWorld;

/// Delay before the ghost's own stun recovery check.
pub const GHOST_RECOVERY_DELAY: f32 = 0.6;
/// Longest a ghost may stay stunned before it is forced out.
pub const DAMAGE_STUCK_TIMEOUT: f32 = 2.0;
/// Pause between a platform jump and the next one.
const PLATFORM_JUMP_COOLDOWN: f32 = 3.0;
/// Pause between any two jumps or climbs.
const MANEUVER_COOLDOWN: f32 = 1.0;
/// Smallest height difference worth a jump.
const MIN_JUMP_HEIGHT: f32 = 0.5;
/// Hover height tolerance that counts as settled.
const HOVER_TOLERANCE: f32 = 0.05;
const SPECIAL_ATTACK_RECOVERY: f32 = 0.5;

/// What a ghost is doing outside the shared state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GhostPhase {
    #[default]
    None,
    Jumping,
    Climbing,
    SpecialAttack,
}

#[derive(Debug, Clone)]
pub struct GhostBrain {
    pub phase: GhostPhase,
    pub detection_range: f32,
    pub attack_range: f32,
    pub chase_memory: f32,
    pub wall_check_distance: f32,
    pub ledge_check_distance: f32,
    pub max_jump_height: f32,
    pub hover_height: f32,
    pub ground_ray_distance: f32,
    pub sight_through_walls: bool,
    pub climb_to_idle_delay: f32,
    /// Ledge ray origin relative to a ghost facing right.
    pub ledge_check: Vec2,

    pub platform_dwell_time: f32,
    pub tracking_interval: f32,
    pub history_size: usize,
    pub vertical_jump_threshold: f32,
    pub platform_detection_distance: f32,
    history: VecDeque<Vec2>,
    last_record_time: f32,
    on_platform_timer: f32,
    pub player_on_higher_platform: bool,
    pub detected_platform_y: f32,
    pub platform_jump_target: Vec2,

    pub last_climb_time: f32,
    pub last_jump_time: f32,
    damage_entered: Option<f32>,
    pub surface_y: f32,
    pub grounded: bool,
    pub climbing: bool,
    pub jumping: bool,
    pub wall_ahead: bool,
    pub ledge_clear: bool,
    pub player_height_difference: f32,
}

impl GhostBrain {
    /// Ranges come from the placement when `tuning.use_instance_values` is
    /// set, otherwise from the ghost data.
    #[must_use]
    pub fn new(data: &GhostData, tuning: &GhostTuning) -> Self {
        let (detection_range, attack_range, chase_memory, wall, ledge, max_jump) = if tuning.use_instance_values {
            (
                tuning.detection_range,
                tuning.attack_range,
                tuning.chase_memory_duration,
                tuning.wall_check_distance,
                tuning.ledge_check_distance,
                tuning.max_jump_height,
            )
        } else {
            (
                data.base.detection_range,
                data.base.attack_range,
                data.base.chase_memory_duration,
                data.wall_check_distance,
                data.ledge_check_distance,
                data.max_jump_height,
            )
        };
        Self {
            phase: GhostPhase::None,
            detection_range,
            attack_range,
            chase_memory,
            wall_check_distance: wall,
            ledge_check_distance: ledge,
            max_jump_height: max_jump,
            hover_height: data.hover_height,
            ground_ray_distance: data.ground_ray_distance,
            sight_through_walls: data.sight_through_walls,
            climb_to_idle_delay: data.climb_to_idle_delay,
            ledge_check: Vec2::new(0.5, max_jump),
            platform_dwell_time: 0.5,
            tracking_interval: 0.2,
            history_size: 10,
            vertical_jump_threshold: 1.0,
            platform_detection_distance: 5.0,
            history: VecDeque::new(),
            last_record_time: 0.0,
            on_platform_timer: 0.0,
            player_on_higher_platform: false,
            detected_platform_y: 0.0,
            platform_jump_target: Vec2::ZERO,
            last_climb_time: 0.0,
            last_jump_time: 0.0,
            damage_entered: None,
            surface_y: 0.0,
            grounded: false,
            climbing: false,
            jumping: false,
            wall_ahead: false,
            ledge_clear: false,
            player_height_difference: 0.0,
        }
    }

    #[must_use]
    pub fn history(&self) -> &VecDeque<Vec2> {
        &self.history
    }

    /// Whether a sample is due at `now`.
    #[must_use]
    pub fn sample_due(&self, now: f32) -> bool {
        now > self.last_record_time + self.tracking_interval
    }

    /// Store a player sample and update platform detection. Returns `true`
    /// when the player has just been judged to stand on a higher platform.
    ///
    /// `ground_below_player` is whether there is ground right under the
    /// player's feet.
    pub fn record_player_position(&mut self, now: f32, player: Vec2, ghost: Vec2, ground_below_player: bool) -> bool {
        self.last_record_time = now;
        self.history.push_back(player);
        while self.history.len() > self.history_size {
            self.history.pop_front();
        }
        self.detect_player_on_platform(player, ghost, ground_below_player)
    }

    fn detect_player_on_platform(&mut self, player: Vec2, ghost: Vec2, ground_below_player: bool) -> bool {
        if self.history.len() < 3 {
            return false;
        }
        if (player.x - ghost.x).abs() > self.platform_detection_distance {
            self.on_platform_timer = 0.0;
            self.player_on_higher_platform = false;
            return false;
        }

        let recent: Vec<f32> = self.history.iter().rev().take(3).map(|p| p.y).collect();
        let avg_height = recent.iter().sum::<f32>() / recent.len() as f32;
        if avg_height - ghost.y <= self.vertical_jump_threshold {
            self.on_platform_timer = 0.0;
            self.player_on_higher_platform = false;
            return false;
        }

        let min = recent.iter().copied().fold(f32::MAX, f32::min);
        let max = recent.iter().copied().fold(f32::MIN, f32::max);
        let consistent = max - min < 0.3;
        if !(consistent && self.player_likely_grounded(ground_below_player)) {
            self.on_platform_timer = 0.0;
            return false;
        }

        self.on_platform_timer += self.tracking_interval;
        if self.on_platform_timer >= self.platform_dwell_time && !self.player_on_higher_platform {
            self.player_on_higher_platform = true;
            self.detected_platform_y = avg_height;
            return true;
        }
        false
    }

    fn player_likely_grounded(&self, ground_below_player: bool) -> bool {
        let n = self.history.len();
        if n < 2 {
            return false;
        }
        let current = self.history[n - 1];
        let previous = self.history[n - 2];
        let mut likely = (current.y - previous.y).abs() < 0.1 && (current.x - previous.x).abs() > 0.05;
        if n >= 3 && (current.y - self.history[n - 3].y).abs() < 0.15 {
            likely = true;
        }
        likely || ground_below_player
    }

    /// Where to land when jumping up to the player: on the floor found two
    /// units short of them, or one unit short if there is none.
    #[must_use]
    pub fn jump_target(&self, physics: &PhysicsWorld, player: Vec2, ghost: Vec2) -> Vec2 {
        let approach = sign(player.x - ghost.x);
        let origin = Vec2::new(player.x - approach * 2.0, player.y - 0.5);
        match physics.raycast(origin, Vec2::NEG_Y, 3.0, Layers::GROUND) {
            Some(hit) => Vec2::new(hit.point.x + approach * 0.5, self.detected_platform_y),
            None => Vec2::new(player.x - approach, self.detected_platform_y),
        }
    }

    /// Whether the arc from `start` over a peak to `target` is free of ground.
    #[must_use]
    pub fn jump_path_clear(&self, physics: &PhysicsWorld, start: Vec2, target: Vec2) -> bool {
        let peak = Vec2::new(
            start.x + (target.x - start.x) * 0.5,
            start.y.max(target.y) + self.max_jump_height * 0.5,
        );
        physics.linecast(start, peak, Layers::GROUND).is_none()
            && physics.linecast(peak, target, Layers::GROUND).is_none()
    }
}

impl Enemy {
    fn brain(&self) -> Option<&GhostBrain> {
        self.ai.ghost.as_ref()
    }

    fn brain_mut(&mut self) -> Option<&mut GhostBrain> {
        self.ai.ghost.as_mut()
    }

    pub(crate) fn update_ghost_ai(&mut self, me: Entity, world: &mut GameWorld) {
        let Some(brain) = self.brain() else {
            return;
        };
        if brain.climbing || brain.jumping {
            self.handle_special_states(me, world);
            return;
        }

        self.check_ground_beneath(me, world);
        self.check_environment(me, world);
        self.track_player_position(me, world);

        let now = world.clock.time;
        let can_see = self.can_see_player(me, world);
        let in_range = self.in_attack_range(me, world);
        let has_player = self.ai.player.is_some();

        if self.ai.state == AiState::TakingDamage {
            self.check_damage_timeout(me, world, can_see);
            return;
        }
        if let Some(brain) = self.brain_mut() {
            brain.damage_entered = None;
        }

        if self.ai.state != AiState::Attacking && has_player && can_see && in_range && self.attack.can_attack(now) {
            self.change_state(me, world, AiState::Attacking);
            self.fire(me, world, EnemyAnimation::Attack);
            return;
        }

        let Some(brain) = self.brain() else {
            return;
        };
        let (last_jump, last_climb) = (brain.last_jump_time, brain.last_climb_time);
        if self.ai.state == AiState::Chasing
            && has_player
            && !can_see
            && now - last_jump > PLATFORM_JUMP_COOLDOWN
            && now - last_climb > PLATFORM_JUMP_COOLDOWN
            && brain.player_on_higher_platform
        {
            self.attempt_platform_jump(me, world);
            return;
        }

        if matches!(self.ai.state, AiState::Chasing | AiState::Patrolling | AiState::Idle)
            && has_player
            && now - last_climb > MANEUVER_COOLDOWN
            && now - last_jump > MANEUVER_COOLDOWN
        {
            let diff = brain.player_height_difference;
            let can_jump = diff > MIN_JUMP_HEIGHT && diff <= brain.max_jump_height && !brain.wall_ahead && brain.grounded;
            let must_climb = diff > brain.max_jump_height && brain.wall_ahead;
            if can_jump {
                self.start_jumping(me, world);
                return;
            }
            if must_climb {
                self.start_climbing_maneuver(me, world);
                return;
            }
        }

        if has_player
            && can_see
            && !matches!(self.ai.state, AiState::Attacking | AiState::Jumping | AiState::Climbing)
        {
            if self.ai.state != AiState::Chasing {
                self.change_state(me, world, AiState::Chasing);
                self.fire(me, world, EnemyAnimation::Move);
            }
        } else if self.ai.state == AiState::Chasing && now - self.ai.last_player_detected > self.ai.chase_memory {
            if self.ai.has_patrol_points() {
                self.change_state(me, world, AiState::Patrolling);
                self.fire(me, world, EnemyAnimation::Move);
            } else {
                self.change_state(me, world, AiState::Idle);
                self.animate(me, world, |anim| anim.reset_all_triggers());
            }
        }

        self.handle_current_state(me, world);
    }

    fn handle_special_states(&mut self, me: Entity, world: &mut GameWorld) {
        let Some(brain) = self.brain() else {
            return;
        };
        if brain.climbing {
            self.check_environment(me, world);
            if let Some(brain) = self.brain_mut() {
                brain.phase = GhostPhase::Climbing;
            }
            let ledge_clear = self.brain().is_some_and(|b| b.ledge_clear);
            if ledge_clear || self.top_reached(me, world) {
                self.finish_climbing_maneuver(me, world);
            } else {
                self.climb(me, world);
            }
        } else if brain.jumping {
            if let Some(brain) = self.brain_mut() {
                brain.phase = GhostPhase::Jumping;
            }
            if self.has_landed(me, world) {
                self.finish_jumping(me, world);
            }
        }
    }

    /// Cast down to the floor below; keep the hover target on it.
    fn check_ground_beneath(&mut self, me: Entity, world: &GameWorld) {
        let Some(position) = world.position(me) else {
            return;
        };
        let Some(brain) = self.brain() else {
            return;
        };
        let hit = world
            .physics
            .raycast(position, Vec2::NEG_Y, brain.ground_ray_distance, Layers::GROUND);
        let hover_height = brain.hover_height;
        let Some(hit) = hit else {
            if let Some(brain) = self.brain_mut() {
                brain.grounded = false;
            }
            return;
        };
        let target = hit.point.y + hover_height;
        let mut settled_target = None;
        if let Some(brain) = self.brain_mut() {
            brain.surface_y = hit.point.y;
            brain.grounded = (position.y - target).abs() < HOVER_TOLERANCE;
            if !brain.climbing && !brain.jumping {
                settled_target = Some(target);
            }
        }
        if let Some(target) = settled_target {
            self.adjust_hover_height(target);
        }
    }

    /// Height difference to the player, wall ahead, and whether the top of
    /// that wall is within reach.
    fn check_environment(&mut self, me: Entity, world: &GameWorld) {
        let Some(player_pos) = self.ai.player.and_then(|p| world.position(p)) else {
            return;
        };
        let Some(position) = world.position(me) else {
            return;
        };
        let facing = self.movement.facing_sign();
        let direction = Vec2::new(facing, 0.0);
        let Some(brain) = self.brain_mut() else {
            return;
        };
        brain.player_height_difference = player_pos.y - position.y;
        brain.wall_ahead = world
            .physics
            .raycast(position, direction, brain.wall_check_distance, Layers::GROUND)
            .is_some();
        brain.ledge_clear = brain.wall_ahead && {
            let ledge = position + Vec2::new(brain.ledge_check.x * facing, brain.ledge_check.y);
            world
                .physics
                .raycast(ledge, direction, brain.ledge_check_distance, Layers::GROUND)
                .is_none()
        };
    }

    fn track_player_position(&mut self, me: Entity, world: &GameWorld) {
        let now = world.clock.time;
        let Some(player_pos) = self.ai.player.and_then(|p| world.position(p)) else {
            return;
        };
        let Some(position) = world.position(me) else {
            return;
        };
        if !self.brain().is_some_and(|b| b.sample_due(now)) {
            return;
        }
        let ground_below = world
            .physics
            .raycast(player_pos, Vec2::NEG_Y, 0.3, Layers::GROUND)
            .is_some();
        let Some(brain) = self.brain_mut() else {
            return;
        };
        if brain.record_player_position(now, player_pos, position, ground_below) {
            brain.platform_jump_target = brain.jump_target(&world.physics, player_pos, position);
            debug!(
                ghost = %me,
                platform_y = brain.detected_platform_y,
                target_x = brain.platform_jump_target.x,
                "player on higher platform"
            );
        }
    }

    /// A ray just past the ghost's front finds a floor under it.
    fn top_reached(&self, me: Entity, world: &GameWorld) -> bool {
        let Some(position) = world.position(me) else {
            return false;
        };
        let front = position + Vec2::new(self.movement.facing_sign() * 0.5, 0.0);
        world
            .physics
            .raycast(front, Vec2::NEG_Y, 0.5, Layers::GROUND)
            .is_some_and(|hit| hit.distance > 0.0)
    }

    /// Descending and back at (or below) hover height.
    fn has_landed(&self, me: Entity, world: &GameWorld) -> bool {
        let (Some(position), Some(brain)) = (world.position(me), self.brain()) else {
            return false;
        };
        let falling = world.bodies.get(me).is_none_or(|b| b.velocity.y <= 0.0);
        if !falling {
            return false;
        }
        world
            .physics
            .raycast(position, Vec2::NEG_Y, brain.ground_ray_distance, Layers::GROUND)
            .is_some_and(|hit| position.y - hit.point.y <= brain.hover_height + HOVER_TOLERANCE)
    }

    fn check_damage_timeout(&mut self, me: Entity, world: &mut GameWorld, can_see: bool) {
        let now = world.clock.time;
        let Some(brain) = self.brain_mut() else {
            return;
        };
        let entered = *brain.damage_entered.get_or_insert(now);
        if now - entered <= DAMAGE_STUCK_TIMEOUT {
            return;
        }
        brain.damage_entered = None;
        debug!(ghost = %me, "stun timed out");
        if self.ai.player.is_some() && can_see {
            self.change_state(me, world, AiState::Chasing);
            self.fire(me, world, EnemyAnimation::Move);
        } else if self.ai.has_patrol_points() {
            self.change_state(me, world, AiState::Patrolling);
            self.fire(me, world, EnemyAnimation::Move);
        } else {
            self.change_state(me, world, AiState::Idle);
        }
    }

    fn attempt_platform_jump(&mut self, me: Entity, world: &mut GameWorld) {
        let now = world.clock.time;
        let Some(position) = world.position(me) else {
            return;
        };
        let Some(brain) = self.brain_mut() else {
            return;
        };
        if !brain.player_on_higher_platform || now - brain.last_jump_time < PLATFORM_JUMP_COOLDOWN {
            return;
        }
        brain.player_on_higher_platform = false;
        let target = brain.platform_jump_target;
        let height = brain.detected_platform_y - position.y;
        let wall_ahead = brain.wall_ahead;
        if brain.jump_path_clear(&world.physics, position, target) {
            self.start_intelligent_jump(me, world, height, target);
        } else if wall_ahead {
            self.start_climbing_maneuver(me, world);
        } else {
            debug!(ghost = %me, "no route to the player's platform");
        }
    }

    fn start_intelligent_jump(&mut self, me: Entity, world: &mut GameWorld, height: f32, target: Vec2) {
        let now = world.clock.time;
        if let Some(brain) = self.brain_mut() {
            brain.jumping = true;
            brain.phase = GhostPhase::Jumping;
            brain.last_jump_time = now;
        }
        self.fire(me, world, EnemyAnimation::Jump);
        if let Some(position) = world.position(me) {
            self.flip(me, world, target.x > position.x);
        }
        self.jump_to_target(me, world, height, target);
        self.change_state(me, world, AiState::Jumping);
    }

    fn start_jumping(&mut self, me: Entity, world: &mut GameWorld) {
        let now = world.clock.time;
        let Some(brain) = self.brain_mut() else {
            return;
        };
        brain.jumping = true;
        brain.phase = GhostPhase::Jumping;
        brain.last_jump_time = now;
        let height = brain.player_height_difference;
        self.fire(me, world, EnemyAnimation::Jump);
        self.jump(me, world, height);
    }

    fn finish_jumping(&mut self, me: Entity, world: &mut GameWorld) {
        if let Some(brain) = self.brain_mut() {
            brain.jumping = false;
            brain.phase = GhostPhase::None;
        }
        self.land();
        self.change_state(me, world, AiState::Chasing);
        self.fire(me, world, EnemyAnimation::Move);
    }

    fn start_climbing_maneuver(&mut self, me: Entity, world: &mut GameWorld) {
        let now = world.clock.time;
        if let Some(brain) = self.brain_mut() {
            brain.climbing = true;
            brain.phase = GhostPhase::Climbing;
            brain.last_climb_time = now;
        }
        self.fire(me, world, EnemyAnimation::Climb);
        self.start_climbing(me, world);
    }

    fn finish_climbing_maneuver(&mut self, me: Entity, world: &mut GameWorld) {
        if let Some(brain) = self.brain_mut() {
            brain.climbing = false;
            brain.phase = GhostPhase::None;
        }
        self.finish_climbing(me, world);
        let delay = self.brain().map_or(0.3, |b| b.climb_to_idle_delay);
        self.ai
            .routines
            .start(world.clock.time, delay, AiAction::ResumeAfterClimb);
    }

    pub(crate) fn resume_after_climb(&mut self, me: Entity, world: &mut GameWorld) {
        self.change_state(me, world, AiState::Chasing);
        self.fire(me, world, EnemyAnimation::Move);
    }

    /// Abort a jump or climb in progress (the ghost was hit).
    pub(crate) fn cancel_ghost_maneuvers(&mut self, me: Entity, world: &mut GameWorld) {
        let Some(brain) = self.brain_mut() else {
            return;
        };
        let (was_climbing, was_jumping) = (brain.climbing, brain.jumping);
        brain.climbing = false;
        brain.jumping = false;
        brain.phase = GhostPhase::None;
        if was_climbing {
            if let Some(motion) = self.movement.ghost.as_mut() {
                motion.climbing = false;
            }
            if let Some(body) = world.bodies.get_mut(me) {
                body.gravity_scale = 1.0;
            }
        }
        if was_jumping {
            self.land();
        }
    }

    /// Sight for ghosts: through walls when allowed, otherwise the ray to
    /// the player must reach them.
    pub(crate) fn ghost_sight(&mut self, world: &GameWorld, player: Entity, position: Vec2, player_pos: Vec2, distance: f32) -> bool {
        let now = world.clock.time;
        let through_walls = self.brain().is_some_and(|b| b.sight_through_walls);
        let visible = through_walls || {
            let eye = position + self.ai.eye_offset;
            world
                .physics
                .raycast(eye, player_pos - eye, distance, Layers::ALL - Layers::ENEMY)
                .is_some_and(|hit| hit.target.entity == Some(player))
        };
        if visible {
            self.ai.last_player_detected = now;
        }
        visible
    }

    pub(crate) fn ghost_recovery(&mut self, me: Entity, world: &mut GameWorld, _previous: AiState) {
        if self.ai.state != AiState::TakingDamage {
            return;
        }
        if self.ai.player.is_some() && self.can_see_player(me, world) {
            if self.in_attack_range(me, world) && self.attack.can_attack(world.clock.time) {
                self.change_state(me, world, AiState::Attacking);
                self.fire(me, world, EnemyAnimation::Attack);
            } else {
                self.change_state(me, world, AiState::Chasing);
                self.fire(me, world, EnemyAnimation::Move);
            }
        } else if self.ai.has_patrol_points() {
            self.change_state(me, world, AiState::Patrolling);
            self.fire(me, world, EnemyAnimation::Move);
        } else {
            self.change_state(me, world, AiState::Idle);
        }
    }

    /// Special attack out of a regular one: animate, strike, then resume
    /// chasing.
    pub fn trigger_special_attack(&mut self, me: Entity, world: &mut GameWorld) {
        if self.ai.state != AiState::Attacking || self.attack.special.is_none() {
            return;
        }
        if let Some(brain) = self.brain_mut() {
            brain.phase = GhostPhase::SpecialAttack;
        }
        self.fire(me, world, EnemyAnimation::SpecialAttack);
        self.perform_special_attack(world);
        self.ai.routines.start(
            world.clock.time,
            SPECIAL_ATTACK_RECOVERY,
            AiAction::FinishSpecialAttack,
        );
    }

    pub(crate) fn finish_special_attack(&mut self, me: Entity, world: &mut GameWorld) {
        if let Some(brain) = self.brain_mut() {
            brain.phase = GhostPhase::None;
        }
        self.change_state(me, world, AiState::Chasing);
        self.fire(me, world, EnemyAnimation::Move);
    }

    pub(crate) fn ghost_death_effects(&mut self, me: Entity, world: &mut GameWorld) {
        self.fire(me, world, EnemyAnimation::Death);
        if let Some(position) = world.position(me) {
            world.emit(GameEvent::EffectSpawned {
                kind: EffectKind::GhostVanish,
                position,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use darkwood_math::Aabb;

    use super::*;
    use crate::enemy::spawn::{EnemyDesc, spawn_enemy};
    use crate::enemy::with_enemy;
    use crate::player::{PlayerDesc, spawn_player};

    fn brain() -> GhostBrain {
        GhostBrain::new(&GhostData::default(), &GhostTuning::default())
    }

    /// A ghost hovering at (0, 1.2), with the player at `player_at` if given.
    fn ghost_world(player_at: Option<Vec2>) -> (GameWorld, Entity) {
        let mut world = GameWorld::default();
        if let Some(spawn) = player_at {
            spawn_player(
                &mut world,
                &PlayerDesc {
                    spawn,
                    ..PlayerDesc::default()
                },
            );
        }
        let ghost = spawn_enemy(&mut world, &EnemyDesc::ghost("Ghost", Vec2::new(0.0, 1.2)));
        (world, ghost)
    }

    fn think(world: &mut GameWorld, ghost: Entity, time: f32) {
        world.clock.time = time;
        with_enemy(world, ghost, |enemy, world| enemy.update_ai(ghost, world));
    }

    fn ghost_of(world: &GameWorld, ghost: Entity) -> &Enemy {
        world.enemies.get(ghost).unwrap()
    }

    fn brain_of(world: &GameWorld, ghost: Entity) -> &GhostBrain {
        ghost_of(world, ghost).ai.ghost.as_ref().unwrap()
    }

    #[test]
    fn test_stun_without_recovery_times_out() {
        let (mut world, ghost) = ghost_world(None);
        with_enemy(&mut world, ghost, |enemy, world| {
            enemy.on_damaged(ghost, world);
            // Lose the scheduled recovery, as a scene hiccup would.
            enemy.ai.routines.stop_all();
        });
        assert_eq!(ghost_of(&world, ghost).ai.state, AiState::TakingDamage);
        world.drain_events();

        let mut left_at = None;
        for frame in 1..=240u32 {
            think(&mut world, ghost, frame as f32 / 60.0);
            if ghost_of(&world, ghost).ai.state != AiState::TakingDamage {
                left_at = Some(frame);
                break;
            }
        }
        // The timer starts on the first stunned frame and runs two seconds.
        let left_at = left_at.expect("ghost stayed stunned");
        assert!((121..=123).contains(&left_at), "left the stun on frame {left_at}");
        assert_eq!(ghost_of(&world, ghost).ai.state, AiState::Idle);
        assert!(world.events().iter().any(|e| matches!(
            e,
            GameEvent::EnemyStateChanged {
                from: AiState::TakingDamage,
                to: AiState::Idle,
                ..
            }
        )));
    }

    #[test]
    fn test_platform_jump_then_landing_resumes_chase() {
        let (mut world, ghost) = ghost_world(Some(Vec2::new(25.0, 4.0)));
        with_enemy(&mut world, ghost, |enemy, world| {
            enemy.change_state(ghost, world, AiState::Chasing);
            let brain = enemy.ai.ghost.as_mut().unwrap();
            brain.player_on_higher_platform = true;
            brain.detected_platform_y = 3.0;
            brain.platform_jump_target = Vec2::new(3.0, 3.0);
        });

        think(&mut world, ghost, 5.0);
        let enemy = ghost_of(&world, ghost);
        assert_eq!(enemy.ai.state, AiState::Jumping);
        let brain = brain_of(&world, ghost);
        assert!(brain.jumping);
        assert_eq!(brain.phase, GhostPhase::Jumping);
        assert!(!brain.player_on_higher_platform);
        assert_eq!(brain.last_jump_time, 5.0);
        assert!(enemy.movement.facing_right);
        let launch = world.velocity(ghost);
        assert!(launch.x > 0.0 && launch.y > 0.0, "{launch}");

        // Coming down onto a floor at hover height ends the jump.
        world
            .physics
            .add_static(Aabb::from_min_max(Vec2::new(-10.0, -1.0), Vec2::new(10.0, 0.0)), Layers::GROUND);
        world.set_position(ghost, Vec2::new(2.5, 1.2));
        world.set_velocity(ghost, Vec2::new(1.0, -1.0));
        think(&mut world, ghost, 5.5);
        let enemy = ghost_of(&world, ghost);
        assert_eq!(enemy.ai.state, AiState::Chasing);
        assert!(!brain_of(&world, ghost).jumping);
        assert!(enemy.movement.ghost.as_ref().is_some_and(|m| !m.jumping));
    }

    #[test]
    fn test_climb_until_top_then_chase() {
        let (mut world, ghost) = ghost_world(Some(Vec2::new(-30.0, 1.0)));
        world
            .physics
            .add_static(Aabb::from_min_max(Vec2::new(0.4, 0.0), Vec2::new(1.4, 5.0)), Layers::GROUND);
        world.clock.time = 2.0;
        with_enemy(&mut world, ghost, |enemy, world| enemy.start_climbing_maneuver(ghost, world));
        assert_eq!(world.bodies.get(ghost).unwrap().gravity_scale, 0.0);

        think(&mut world, ghost, 2.1);
        let brain = brain_of(&world, ghost);
        assert!(brain.climbing && brain.wall_ahead && !brain.ledge_clear);
        assert_eq!(brain.phase, GhostPhase::Climbing);
        assert_eq!(world.velocity(ghost), Vec2::new(0.0, 3.0));

        // Above the wall top: step over it and fall back under gravity.
        world.set_position(ghost, Vec2::new(0.0, 5.3));
        think(&mut world, ghost, 2.5);
        assert!(!brain_of(&world, ghost).climbing);
        assert_eq!(world.bodies.get(ghost).unwrap().gravity_scale, 1.0);
        assert_eq!(world.velocity(ghost), Vec2::new(2.0, 1.0));
        assert_ne!(ghost_of(&world, ghost).ai.state, AiState::Chasing);

        think(&mut world, ghost, 2.85);
        assert_eq!(ghost_of(&world, ghost).ai.state, AiState::Chasing);
    }

    #[test]
    fn test_instance_values_override_data() {
        let b = brain();
        assert_eq!(b.detection_range, 15.38);
        assert_eq!(b.attack_range, 13.96);
        let data_only = GhostBrain::new(
            &GhostData::default(),
            &GhostTuning {
                use_instance_values: false,
                ..GhostTuning::default()
            },
        );
        assert_eq!(data_only.detection_range, 7.0);
        assert_eq!(data_only.attack_range, 1.5);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut b = brain();
        for i in 0..25 {
            b.record_player_position(i as f32, Vec2::new(i as f32, 0.0), Vec2::ZERO, false);
        }
        assert_eq!(b.history().len(), 10);
        assert_eq!(b.history().front().map(|p| p.x), Some(15.0));
    }

    #[test]
    fn test_platform_detected_after_dwell() {
        let mut b = brain();
        let ghost = Vec2::ZERO;
        let player = Vec2::new(2.0, 2.5);
        let detected: Vec<bool> = (0..6)
            .map(|i| b.record_player_position(i as f32 * 0.25, player, ghost, true))
            .collect();
        // Three samples are needed before the dwell timer starts counting.
        assert_eq!(detected, vec![false, false, false, false, true, false]);
        assert!(b.player_on_higher_platform);
        assert!((b.detected_platform_y - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_platform_reset_when_player_drops() {
        let mut b = brain();
        for i in 0..5 {
            b.record_player_position(i as f32, Vec2::new(1.0, 3.0), Vec2::ZERO, true);
        }
        assert!(b.player_on_higher_platform);
        for i in 5..8 {
            b.record_player_position(i as f32, Vec2::new(1.0, 0.2), Vec2::ZERO, true);
        }
        assert!(!b.player_on_higher_platform);
    }

    #[test]
    fn test_far_player_is_not_on_platform() {
        let mut b = brain();
        for i in 0..6 {
            b.record_player_position(i as f32, Vec2::new(9.0, 3.0), Vec2::ZERO, true);
        }
        assert!(!b.player_on_higher_platform);
    }

    #[test]
    fn test_jump_path_blocked_by_ceiling() {
        let b = brain();
        let mut physics = PhysicsWorld::new();
        assert!(b.jump_path_clear(&physics, Vec2::ZERO, Vec2::new(4.0, 2.0)));
        physics.add_static(
            darkwood_math::Aabb::from_center_size(Vec2::new(2.0, 3.0), Vec2::new(6.0, 0.5)),
            Layers::GROUND,
        );
        assert!(!b.jump_path_clear(&physics, Vec2::ZERO, Vec2::new(4.0, 2.0)));
    }

    #[test]
    fn test_jump_target_lands_past_platform_edge() {
        let mut b = brain();
        b.detected_platform_y = 3.0;
        let mut physics = PhysicsWorld::new();
        // Platform from x = 3 to x = 9, top at y = 2.4.
        physics.add_static(
            darkwood_math::Aabb::from_min_max(Vec2::new(3.0, 2.0), Vec2::new(9.0, 2.4)),
            Layers::GROUND,
        );
        let target = b.jump_target(&physics, Vec2::new(6.0, 3.0), Vec2::ZERO);
        assert_eq!(target, Vec2::new(4.5, 3.0));
        let fallback = b.jump_target(&PhysicsWorld::new(), Vec2::new(6.0, 3.0), Vec2::ZERO);
        assert_eq!(fallback, Vec2::new(5.0, 3.0));
    }
}
