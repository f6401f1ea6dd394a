//! Enemy animation facade.
//!
//! AI, movement and health talk to the animator through [`EnemyAnimator`]
//! so they never need to know which graph an enemy uses. Skeletons drive a
//! walk bool; ghosts drive everything through triggers.

use crate::animator::Animator;
use crate::enemy::EnemyKind;

/// Every trigger of the ghost graph, in reset order.
pub const GHOST_TRIGGERS: [&str; 8] = [
    "MoveTrigger",
    "TalkTrigger",
    "ClimbTrigger",
    "JumpTrigger",
    "AttackTrigger",
    "StunedTrigger",
    "DeathTrigger",
    "SpecialATrigger",
];

/// Named animations an enemy can be asked to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyAnimation {
    Move,
    Jump,
    Climb,
    Attack,
    Hit,
    Death,
    Talk,
    SpecialAttack,
}

/// Borrowed view of one enemy's animator.
pub struct EnemyAnimator<'a> {
    kind: EnemyKind,
    animator: &'a mut Animator,
}

impl<'a> EnemyAnimator<'a> {
    pub fn new(kind: EnemyKind, animator: &'a mut Animator) -> Self {
        Self { kind, animator }
    }

    pub fn set_walking(&mut self, walking: bool) {
        match self.kind {
            EnemyKind::Skeleton => {
                if self.animator.has_parameter("isWalking") {
                    self.animator.set_bool("isWalking", walking);
                }
            }
            // Triggers need no reset when the walk ends.
            EnemyKind::Ghost => {
                if walking {
                    self.animator.set_trigger("MoveTrigger");
                }
            }
        }
    }

    pub fn play_attack(&mut self) {
        match self.kind {
            EnemyKind::Skeleton => self.skeleton_trigger("Attack"),
            EnemyKind::Ghost => self.animator.set_trigger("AttackTrigger"),
        }
    }

    pub fn play_hit(&mut self) {
        match self.kind {
            EnemyKind::Skeleton => self.skeleton_trigger("Hit"),
            EnemyKind::Ghost => self.animator.set_trigger("StunedTrigger"),
        }
    }

    pub fn play_death(&mut self) {
        match self.kind {
            EnemyKind::Skeleton => self.skeleton_trigger("Die"),
            EnemyKind::Ghost => self.animator.set_trigger("DeathTrigger"),
        }
    }

    pub fn play_jump(&mut self) {
        self.ghost_trigger("JumpTrigger");
    }

    pub fn play_climb(&mut self) {
        self.ghost_trigger("ClimbTrigger");
    }

    pub fn play_talk(&mut self) {
        self.ghost_trigger("TalkTrigger");
    }

    pub fn play_special_attack(&mut self) {
        self.ghost_trigger("SpecialATrigger");
    }

    /// Clear every ghost trigger.
    pub fn reset_all_triggers(&mut self) {
        for name in GHOST_TRIGGERS {
            self.animator.reset_trigger(name);
        }
    }

    /// Reset all triggers, then play exactly one animation.
    pub fn fire(&mut self, animation: EnemyAnimation) {
        self.reset_all_triggers();
        match animation {
            EnemyAnimation::Move => self.set_walking(true),
            EnemyAnimation::Jump => self.play_jump(),
            EnemyAnimation::Climb => self.play_climb(),
            EnemyAnimation::Attack => self.play_attack(),
            EnemyAnimation::Hit => self.play_hit(),
            EnemyAnimation::Death => self.play_death(),
            EnemyAnimation::Talk => self.play_talk(),
            EnemyAnimation::SpecialAttack => self.play_special_attack(),
        }
    }

    fn skeleton_trigger(&mut self, name: &'static str) {
        if self.animator.has_parameter(name) {
            self.animator.set_trigger(name);
        }
    }

    fn ghost_trigger(&mut self, name: &'static str) {
        if self.kind == EnemyKind::Ghost {
            self.animator.set_trigger(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_walk_is_a_bool() {
        let mut animator = Animator::skeleton("Skeleton");
        let mut anim = EnemyAnimator::new(EnemyKind::Skeleton, &mut animator);
        anim.set_walking(true);
        anim.play_attack();
        assert!(animator.get_bool("isWalking"));
        assert!(animator.is_armed("Attack"));
    }

    #[test]
    fn test_ghost_walk_fires_move_trigger_only_when_walking() {
        let mut animator = Animator::ghost("Ghost");
        let mut anim = EnemyAnimator::new(EnemyKind::Ghost, &mut animator);
        anim.set_walking(false);
        assert_eq!(animator.trigger_count("MoveTrigger"), 0);
        let mut anim = EnemyAnimator::new(EnemyKind::Ghost, &mut animator);
        anim.set_walking(true);
        assert_eq!(animator.trigger_count("MoveTrigger"), 1);
    }

    #[test]
    fn test_fire_resets_other_triggers() {
        let mut animator = Animator::ghost("Ghost");
        let mut anim = EnemyAnimator::new(EnemyKind::Ghost, &mut animator);
        anim.fire(EnemyAnimation::Attack);
        anim.fire(EnemyAnimation::Move);
        assert!(!animator.is_armed("AttackTrigger"));
        assert!(animator.is_armed("MoveTrigger"));
        assert_eq!(animator.last_trigger(), Some("MoveTrigger"));
    }

    #[test]
    fn test_ghost_only_animations_skip_skeletons() {
        let mut animator = Animator::skeleton("Skeleton");
        let mut anim = EnemyAnimator::new(EnemyKind::Skeleton, &mut animator);
        anim.play_climb();
        anim.play_hit();
        assert_eq!(animator.last_trigger(), Some("Hit"));
    }
}
