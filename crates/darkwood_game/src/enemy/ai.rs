//! The enemy state machine.
//!
//! Every enemy idles, patrols, chases and attacks the player the same way.
//! Ghosts replace the per-frame decision step with their own (see
//! [`crate::enemy::ghost`]) but share state changes, sight, patrolling,
//! chasing, the attack sequence and damage recovery defined here.
//!
//! Delays run on the AI's own [`Routines`]; stopping them is how a state
//! change cancels an attack in progress or a wait at a patrol point.

use darkwood_component::Entity;
use darkwood_math::sign;
use darkwood_physics::Layers;
use glam::Vec2;
use serde::Serialize;
use tracing::{debug, warn};

use crate::enemy::Enemy;
use crate::enemy::data::{EnemyData, EnemyOverrides};
use crate::enemy::ghost::GhostBrain;
use crate::events::GameEvent;
use crate::routine::Routines;
use crate::world::{GameWorld, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AiState {
    #[default]
    Idle,
    Patrolling,
    Chasing,
    Attacking,
    TakingDamage,
    Dying,
    Jumping,
    Climbing,
}

/// Seconds in Idle before the enemy is nudged back into action.
pub const MAX_IDLE_TIME: f32 = 4.0;
/// Seconds spent stunned after a hit.
pub const DAMAGE_RECOVERY_DELAY: f32 = 0.5;
/// Distance at which a patrol point counts as reached.
pub const PATROL_ARRIVE_DISTANCE: f32 = 0.1;
/// Frames between consistency checks of the state machine.
pub const CONSISTENCY_CHECK_FRAMES: u64 = 180;
/// Where sight lines aim, relative to the player's position.
const SIGHT_TARGET_OFFSET: Vec2 = Vec2::new(0.0, 0.5);
const DEFAULT_EYE_OFFSET: Vec2 = Vec2::new(0.0, 0.7);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AiAction {
    FinishPatrolWait,
    AttackHit,
    AttackDecide,
    ResumeAfterDamage(AiState),
    GhostRecovery(AiState),
    ResumeAfterClimb,
    FinishSpecialAttack,
}

impl AiAction {
    fn is_attack_step(&self) -> bool {
        matches!(self, AiAction::AttackHit | AiAction::AttackDecide)
    }
}

#[derive(Debug, Clone)]
pub struct EnemyAi {
    pub state: AiState,
    pub patrol_points: Vec<Vec2>,
    pub current_patrol_point: usize,
    pub waiting_at_patrol_point: bool,
    pub player: Option<Entity>,
    pub detection_range: f32,
    pub attack_range: f32,
    pub chase_memory: f32,
    /// Eye position relative to the enemy, mirrored with its facing.
    pub eye_offset: Vec2,
    /// Let sight lines pass through ground geometry.
    pub ignore_ground_for_sight: bool,
    pub max_idle_time: f32,
    pub(crate) last_player_detected: f32,
    idle_started: Option<f32>,
    /// State to return to once a stun ends.
    resume_state: AiState,
    pub(crate) routines: Routines<AiAction>,
    pub(crate) ghost: Option<GhostBrain>,
}

impl EnemyAi {
    #[must_use]
    pub fn new(data: &EnemyData, overrides: &EnemyOverrides, patrol_points: Vec<Vec2>) -> Self {
        Self {
            state: AiState::Idle,
            patrol_points,
            current_patrol_point: 0,
            waiting_at_patrol_point: false,
            player: None,
            detection_range: overrides.detection_range.unwrap_or(data.detection_range),
            attack_range: overrides.attack_range.unwrap_or(data.attack_range),
            chase_memory: data.chase_memory_duration,
            eye_offset: DEFAULT_EYE_OFFSET,
            ignore_ground_for_sight: true,
            max_idle_time: MAX_IDLE_TIME,
            last_player_detected: f32::NEG_INFINITY,
            idle_started: None,
            resume_state: AiState::Idle,
            routines: Routines::new(),
            ghost: None,
        }
    }

    #[must_use]
    pub fn with_ghost(mut self, brain: GhostBrain) -> Self {
        self.detection_range = brain.detection_range;
        self.attack_range = brain.attack_range;
        self.chase_memory = brain.chase_memory;
        self.ghost = Some(brain);
        self
    }

    #[must_use]
    pub fn has_patrol_points(&self) -> bool {
        !self.patrol_points.is_empty()
    }

    /// Patrolling when there is a route, otherwise Idle.
    #[must_use]
    pub fn fallback_state(&self) -> AiState {
        if self.has_patrol_points() {
            AiState::Patrolling
        } else {
            AiState::Idle
        }
    }

    #[must_use]
    pub fn attack_sequence_running(&self) -> bool {
        self.routines.any(AiAction::is_attack_step)
    }

    /// Index of the patrol point closest to `position`.
    #[must_use]
    pub fn nearest_patrol_point(&self, position: Vec2) -> usize {
        self.patrol_points
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.distance(position).total_cmp(&b.distance(position)))
            .map_or(0, |(i, _)| i)
    }

    /// Move on to the next patrol point, wrapping around.
    pub fn advance_patrol_point(&mut self) {
        if self.has_patrol_points() {
            self.current_patrol_point = (self.current_patrol_point + 1) % self.patrol_points.len();
        }
    }
}

impl Enemy {
    /// Find the player and pick the starting state.
    pub fn init_ai(&mut self, me: Entity, world: &mut GameWorld) {
        self.ai.player = world.find_by_tag(Tag::Player);
        if !self.ai.has_patrol_points() {
            warn!(enemy = %me, name = %self.data.name, "enemy has no patrol points");
        }
        let initial = self.ai.fallback_state();
        self.change_state(me, world, initial);
    }

    /// Per-frame AI.
    pub fn update_ai(&mut self, me: Entity, world: &mut GameWorld) {
        if self.ai.state == AiState::Dying {
            return;
        }
        if self.ai.ghost.is_some() {
            self.update_ghost_ai(me, world);
        } else {
            self.update_base_ai(me, world);
        }
        self.run_ai_routines(me, world);
    }

    fn update_base_ai(&mut self, me: Entity, world: &mut GameWorld) {
        let now = world.clock.time;
        let can_see = self.can_see_player(me, world);

        if self.ai.state == AiState::Attacking
            && !self.ai.attack_sequence_running()
            && self.ai.player.is_some()
            && self.attack.can_attack(now)
        {
            debug!(enemy = %me, "restarting stalled attack");
            self.start_attack_sequence(me, world);
        }

        if world.clock.frame_count % CONSISTENCY_CHECK_FRAMES == 0 {
            if self.ai.state == AiState::Attacking && !self.ai.attack_sequence_running() {
                let fallback = self.ai.fallback_state();
                self.change_state(me, world, fallback);
            }
            if self.ai.state == AiState::Idle && can_see && self.ai.has_patrol_points() {
                self.change_state(me, world, AiState::Chasing);
            }
            debug!(
                enemy = %me,
                state = ?self.ai.state,
                can_see,
                in_range = self.in_attack_range(me, world),
                can_attack = self.attack.can_attack(now),
                "enemy status"
            );
        }

        self.update_state(me, world, can_see);
        self.handle_current_state(me, world);
    }

    fn update_state(&mut self, me: Entity, world: &mut GameWorld, can_see: bool) {
        let now = world.clock.time;
        if !matches!(self.ai.state, AiState::Attacking | AiState::Dying)
            && self.ai.player.is_some()
            && can_see
            && self.in_attack_range(me, world)
            && self.attack.can_attack(now)
        {
            self.change_state(me, world, AiState::Attacking);
            return;
        }

        match self.ai.state {
            AiState::Idle => {
                if can_see {
                    self.change_state(me, world, AiState::Chasing);
                } else if self.ai.has_patrol_points() {
                    self.change_state(me, world, AiState::Patrolling);
                }
            }
            AiState::Patrolling => {
                if can_see {
                    self.change_state(me, world, AiState::Chasing);
                }
            }
            AiState::Chasing => {
                if !can_see && now - self.ai.last_player_detected > self.ai.chase_memory {
                    let fallback = self.ai.fallback_state();
                    self.change_state(me, world, fallback);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn handle_current_state(&mut self, me: Entity, world: &mut GameWorld) {
        match self.ai.state {
            AiState::Idle => self.handle_idle(me, world),
            AiState::Patrolling => self.handle_patrol(me, world),
            AiState::Chasing => self.handle_chase(me, world),
            _ => {}
        }
    }

    fn handle_idle(&mut self, me: Entity, world: &mut GameWorld) {
        let now = world.clock.time;
        let started = *self.ai.idle_started.get_or_insert(now);
        if now - started > self.ai.max_idle_time {
            if self.ai.has_patrol_points() {
                self.change_state(me, world, AiState::Patrolling);
            } else {
                self.ai.idle_started = Some(now);
                if self.ai.player.is_none() {
                    self.ai.player = world.find_by_tag(Tag::Player);
                }
            }
        }
        self.stop_moving(me, world);
    }

    fn handle_patrol(&mut self, me: Entity, world: &mut GameWorld) {
        if !self.ai.has_patrol_points() || self.ai.waiting_at_patrol_point {
            return;
        }
        let Some(position) = world.position(me) else {
            return;
        };
        let index = self.ai.current_patrol_point.min(self.ai.patrol_points.len() - 1);
        let dx = self.ai.patrol_points[index].x - position.x;
        self.set_move_direction(me, world, Vec2::new(sign(dx), 0.0));

        if dx.abs() < PATROL_ARRIVE_DISTANCE {
            let now = world.clock.time;
            self.ai
                .routines
                .stop_where(|a| *a == AiAction::FinishPatrolWait);
            self.ai.waiting_at_patrol_point = true;
            self.stop_moving(me, world);
            self.ai
                .routines
                .start(now, self.data.patrol_stop_duration, AiAction::FinishPatrolWait);
        }
    }

    fn handle_chase(&mut self, me: Entity, world: &mut GameWorld) {
        let Some(player_pos) = self.ai.player.and_then(|p| world.position(p)) else {
            return;
        };
        let Some(position) = world.position(me) else {
            return;
        };
        if self.in_attack_range(me, world) && !self.attack.can_attack(world.clock.time) {
            self.stop_moving(me, world);
            return;
        }
        let direction = Vec2::new(sign(player_pos.x - position.x), 0.0);
        self.set_move_direction(me, world, direction);
    }

    /// Switch state, running the exit work of the old state and the entry
    /// work of the new one. Switching to the current state does nothing.
    pub fn change_state(&mut self, me: Entity, world: &mut GameWorld, new_state: AiState) {
        let old = self.ai.state;
        if old == new_state {
            return;
        }
        if old == AiState::Idle {
            self.ai.idle_started = None;
        }
        match old {
            AiState::Patrolling => {
                self.ai
                    .routines
                    .stop_where(|a| *a == AiAction::FinishPatrolWait);
                self.ai.waiting_at_patrol_point = false;
            }
            AiState::Attacking => {
                self.ai.routines.stop_where(AiAction::is_attack_step);
            }
            _ => {}
        }

        self.ai.state = new_state;
        world.emit(GameEvent::EnemyStateChanged {
            entity: me,
            from: old,
            to: new_state,
        });

        match new_state {
            AiState::Idle => {
                self.ai.idle_started = Some(world.clock.time);
                self.stop_moving(me, world);
            }
            AiState::Patrolling => {
                if let Some(position) = world.position(me) {
                    self.ai.current_patrol_point = self.ai.nearest_patrol_point(position);
                }
            }
            AiState::Attacking => self.start_attack_sequence(me, world),
            _ => {}
        }
    }

    /// Face the player, swing, and schedule the forced hit.
    fn start_attack_sequence(&mut self, me: Entity, world: &mut GameWorld) {
        let player_pos = self.ai.player.and_then(|p| world.position(p));
        if let (Some(player_pos), Some(position)) = (player_pos, world.position(me)) {
            self.flip(me, world, player_pos.x > position.x);
            self.stop_moving(me, world);
        }
        self.perform_attack(me, world);
        let now = world.clock.time;
        self.ai.routines.start(now, crate::enemy::attack::ATTACK_HIT_DELAY, AiAction::AttackHit);
    }

    /// After the swing: attack again, chase, patrol or idle.
    fn decide_after_attack(&mut self, me: Entity, world: &mut GameWorld) {
        let player_active = self.ai.player.is_some_and(|p| world.is_active(p));
        if !player_active {
            let fallback = self.ai.fallback_state();
            self.change_state(me, world, fallback);
            return;
        }

        if self.is_ghost() && self.attack.can_special_attack(world.clock.time) {
            self.trigger_special_attack(me, world);
            return;
        }

        let in_range = self.in_attack_range(me, world);
        let can_attack_again = self.attack.can_attack(world.clock.time);
        let can_see = self.can_see_player(me, world);
        debug!(enemy = %me, in_range, can_attack_again, can_see, "attack finished");

        if in_range && can_attack_again {
            if self.ai.state == AiState::Attacking {
                self.start_attack_sequence(me, world);
            } else {
                self.change_state(me, world, AiState::Attacking);
            }
        } else if can_see {
            self.change_state(me, world, AiState::Chasing);
        } else {
            let fallback = self.ai.fallback_state();
            self.change_state(me, world, fallback);
        }
    }

    /// Re-find the player if the reference was lost.
    pub(crate) fn acquire_player(&mut self, world: &GameWorld) -> Option<Entity> {
        if self.ai.player.is_none_or(|p| !world.is_alive(p)) {
            self.ai.player = world.find_by_tag(Tag::Player);
        }
        self.ai.player
    }

    /// Line-of-sight check. Beyond detection range the enemy still "sees"
    /// the player while the chase memory lasts.
    pub fn can_see_player(&mut self, me: Entity, world: &GameWorld) -> bool {
        let Some(player) = self.acquire_player(world) else {
            return false;
        };
        let (Some(position), Some(player_pos)) = (world.position(me), world.position(player)) else {
            return false;
        };
        let now = world.clock.time;
        let distance = position.distance(player_pos);
        if distance > self.ai.detection_range {
            return now - self.ai.last_player_detected < self.ai.chase_memory;
        }
        if self.ai.ghost.is_some() {
            return self.ghost_sight(world, player, position, player_pos, distance);
        }

        let eye = position
            + Vec2::new(
                self.ai.eye_offset.x * self.movement.facing_sign(),
                self.ai.eye_offset.y,
            );
        let target = player_pos + SIGHT_TARGET_OFFSET;
        let mask = if self.ai.ignore_ground_for_sight {
            Layers::ALL - Layers::GROUND - Layers::ENEMY
        } else {
            Layers::ALL - Layers::ENEMY
        };
        let visible = match world.physics.raycast(eye, target - eye, distance, mask) {
            Some(hit) => hit.target.entity == Some(player),
            None => true,
        };
        if visible {
            self.ai.last_player_detected = now;
        }
        visible
    }

    #[must_use]
    pub fn in_attack_range(&self, me: Entity, world: &GameWorld) -> bool {
        let Some(player) = self.ai.player else {
            return false;
        };
        match (world.position(me), world.position(player)) {
            (Some(a), Some(b)) => a.distance(b) <= self.ai.attack_range,
            _ => false,
        }
    }

    /// React to a hit: drop everything, stagger, and schedule recovery.
    pub(crate) fn on_damaged(&mut self, me: Entity, world: &mut GameWorld) {
        if self.ai.state == AiState::Dying {
            return;
        }
        if self.ai.ghost.is_some() {
            self.cancel_ghost_maneuvers(me, world);
        }
        let previous = match self.ai.state {
            AiState::TakingDamage => self.ai.resume_state,
            AiState::Jumping | AiState::Climbing => AiState::Chasing,
            state => state,
        };
        self.ai.resume_state = previous;

        self.ai.routines.stop_all();
        self.ai.waiting_at_patrol_point = false;
        self.change_state(me, world, AiState::TakingDamage);

        let now = world.clock.time;
        self.ai
            .routines
            .start(now, DAMAGE_RECOVERY_DELAY, AiAction::ResumeAfterDamage(previous));
        if self.ai.ghost.is_some() {
            self.ai.routines.start(
                now,
                crate::enemy::ghost::GHOST_RECOVERY_DELAY,
                AiAction::GhostRecovery(previous),
            );
        }
    }

    fn resume_after_damage(&mut self, me: Entity, world: &mut GameWorld, previous: AiState) {
        if self.ai.state != AiState::TakingDamage {
            return;
        }
        if previous == AiState::Attacking && self.ai.player.is_some() {
            let next = if self.in_attack_range(me, world) && self.attack.can_attack(world.clock.time) {
                AiState::Attacking
            } else if self.can_see_player(me, world) {
                AiState::Chasing
            } else {
                self.ai.fallback_state()
            };
            self.change_state(me, world, next);
        } else {
            self.change_state(me, world, previous);
        }
    }

    pub(crate) fn on_death(&mut self, me: Entity, world: &mut GameWorld) {
        self.change_state(me, world, AiState::Dying);
        if self.is_ghost() {
            self.ghost_death_effects(me, world);
        }
    }

    /// Unstick an enemy: back to patrolling or idling. Dead enemies stay dead.
    pub fn emergency_reset(&mut self, me: Entity, world: &mut GameWorld, stop_routines: bool) {
        if self.ai.state == AiState::Dying {
            return;
        }
        if stop_routines {
            self.ai.routines.stop_all();
            self.ai.waiting_at_patrol_point = false;
        }
        let fallback = self.ai.fallback_state();
        debug!(enemy = %me, ?fallback, stop_routines, "enemy reset");
        self.change_state(me, world, fallback);
    }

    fn run_ai_routines(&mut self, me: Entity, world: &mut GameWorld) {
        for action in self.ai.routines.drain_due(world.clock.time) {
            if self.ai.state == AiState::Dying {
                break;
            }
            match action {
                AiAction::FinishPatrolWait => {
                    self.ai.advance_patrol_point();
                    self.ai.waiting_at_patrol_point = false;
                }
                AiAction::AttackHit => {
                    self.on_attack_hit(me, world);
                    let rest = self.attack.duration() - crate::enemy::attack::ATTACK_HIT_DELAY;
                    self.ai
                        .routines
                        .start(world.clock.time, rest, AiAction::AttackDecide);
                }
                AiAction::AttackDecide => self.decide_after_attack(me, world),
                AiAction::ResumeAfterDamage(previous) => self.resume_after_damage(me, world, previous),
                AiAction::GhostRecovery(previous) => self.ghost_recovery(me, world, previous),
                AiAction::ResumeAfterClimb => self.resume_after_climb(me, world),
                AiAction::FinishSpecialAttack => self.finish_special_attack(me, world),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::spawn::{EnemyDesc, spawn_enemy};
    use crate::enemy::with_enemy;
    use crate::player::{PlayerDesc, spawn_player};

    fn ai_with_points(points: Vec<Vec2>) -> EnemyAi {
        EnemyAi::new(&EnemyData::default(), &EnemyOverrides::default(), points)
    }

    /// A patrolling skeleton at the origin, with the player at `player_at`
    /// if given. Frame 1, so the periodic consistency check stays out of
    /// the way.
    fn skeleton_world(player_at: Option<Vec2>) -> (GameWorld, Entity) {
        let mut world = GameWorld::default();
        world.clock.frame_count = 1;
        if let Some(spawn) = player_at {
            spawn_player(
                &mut world,
                &PlayerDesc {
                    spawn,
                    ..PlayerDesc::default()
                },
            );
        }
        let desc = EnemyDesc::skeleton("Skeleton", Vec2::ZERO).with_patrol(vec![Vec2::new(-3.0, 0.0), Vec2::new(3.0, 0.0)]);
        let skeleton = spawn_enemy(&mut world, &desc);
        (world, skeleton)
    }

    fn think(world: &mut GameWorld, enemy: Entity, time: f32) {
        world.clock.time = time;
        with_enemy(world, enemy, |e, world| e.update_ai(enemy, world));
    }

    fn hit(world: &mut GameWorld, enemy: Entity, time: f32) {
        world.clock.time = time;
        with_enemy(world, enemy, |e, world| e.on_damaged(enemy, world));
    }

    fn state_of(world: &GameWorld, enemy: Entity) -> AiState {
        world.enemies.get(enemy).unwrap().ai.state
    }

    #[test]
    fn test_second_hit_keeps_original_resume_state() {
        let (mut world, skeleton) = skeleton_world(None);
        assert_eq!(state_of(&world, skeleton), AiState::Patrolling);

        hit(&mut world, skeleton, 0.0);
        assert_eq!(state_of(&world, skeleton), AiState::TakingDamage);
        hit(&mut world, skeleton, 0.3);

        // The second hit restarts the stun instead of resuming into it.
        think(&mut world, skeleton, 0.6);
        assert_eq!(state_of(&world, skeleton), AiState::TakingDamage);
        think(&mut world, skeleton, 0.81);
        assert_eq!(state_of(&world, skeleton), AiState::Patrolling);
    }

    #[test]
    fn test_hit_during_attack_resumes_to_fallback_when_player_gone() {
        let (mut world, skeleton) = skeleton_world(Some(Vec2::new(30.0, 0.0)));
        with_enemy(&mut world, skeleton, |e, world| e.change_state(skeleton, world, AiState::Attacking));
        assert!(world.enemies.get(skeleton).unwrap().ai.attack_sequence_running());

        hit(&mut world, skeleton, 0.1);
        let enemy = world.enemies.get(skeleton).unwrap();
        assert_eq!(enemy.ai.state, AiState::TakingDamage);
        assert!(!enemy.ai.attack_sequence_running());

        think(&mut world, skeleton, 0.61);
        assert_eq!(state_of(&world, skeleton), AiState::Patrolling);
        assert!(world.events().iter().any(|e| matches!(
            e,
            GameEvent::EnemyStateChanged {
                from: AiState::TakingDamage,
                to: AiState::Patrolling,
                ..
            }
        )));
    }

    #[test]
    fn test_consistency_check_clears_stale_attack() {
        let (mut world, skeleton) = skeleton_world(None);
        if let Some(enemy) = world.enemies.get_mut(skeleton) {
            enemy.ai.state = AiState::Attacking;
        }

        world.clock.frame_count = CONSISTENCY_CHECK_FRAMES - 1;
        think(&mut world, skeleton, 1.0);
        assert_eq!(state_of(&world, skeleton), AiState::Attacking);

        world.clock.frame_count = CONSISTENCY_CHECK_FRAMES;
        think(&mut world, skeleton, 1.02);
        assert_eq!(state_of(&world, skeleton), AiState::Patrolling);
    }

    #[test]
    fn test_fallback_state_depends_on_patrol_points() {
        assert_eq!(ai_with_points(vec![]).fallback_state(), AiState::Idle);
        assert_eq!(ai_with_points(vec![Vec2::ZERO]).fallback_state(), AiState::Patrolling);
    }

    #[test]
    fn test_patrol_points_cycle() {
        let mut ai = ai_with_points(vec![Vec2::ZERO, Vec2::X, Vec2::Y]);
        let visited: Vec<usize> = (0..5)
            .map(|_| {
                ai.advance_patrol_point();
                ai.current_patrol_point
            })
            .collect();
        assert_eq!(visited, vec![1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_nearest_patrol_point() {
        let ai = ai_with_points(vec![Vec2::new(-5.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(10.0, 0.0)]);
        assert_eq!(ai.nearest_patrol_point(Vec2::new(2.0, 1.0)), 1);
        assert_eq!(ai.nearest_patrol_point(Vec2::new(-20.0, 0.0)), 0);
    }

    #[test]
    fn test_overrides_replace_ranges() {
        let overrides = EnemyOverrides {
            detection_range: Some(12.0),
            attack_range: None,
            attack_radius: None,
        };
        let ai = EnemyAi::new(&EnemyData::default(), &overrides, vec![]);
        assert_eq!(ai.detection_range, 12.0);
        assert_eq!(ai.attack_range, 1.5);
        assert_eq!(ai.chase_memory, 3.0);
    }

    #[test]
    fn test_attack_sequence_tracking() {
        let mut ai = ai_with_points(vec![]);
        assert!(!ai.attack_sequence_running());
        ai.routines.start(0.0, 0.3, AiAction::AttackHit);
        assert!(ai.attack_sequence_running());
        ai.routines.stop_where(AiAction::is_attack_step);
        assert!(!ai.attack_sequence_running());
    }
}
