//! Animation parameter state.
//!
//! Sprites are not drawn, but gameplay still drives an animation graph
//! through named parameters. An [`Animator`] records those parameters so the
//! rest of the game (and its tests) can see what would be playing. Triggers
//! stay armed until reset and count how often they fired.

use std::collections::BTreeMap;

use darkwood_component::Component;
use tracing::{debug, warn};

/// Kind of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Trigger,
}

#[derive(Debug, Clone, Default)]
struct Param {
    kind: Option<ParamKind>,
    value: bool,
    fired: u32,
}

/// Declared parameters and their current values.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    owner: String,
    params: BTreeMap<&'static str, Param>,
    last_trigger: Option<&'static str>,
}

impl Animator {
    /// An animator with the given declared parameters.
    #[must_use]
    pub fn with_params(owner: impl Into<String>, params: &[(&'static str, ParamKind)]) -> Self {
        let params = params
            .iter()
            .map(|(name, kind)| {
                (
                    *name,
                    Param {
                        kind: Some(*kind),
                        ..Param::default()
                    },
                )
            })
            .collect();
        Self {
            owner: owner.into(),
            params,
            last_trigger: None,
        }
    }

    /// Skeleton graph: walk bool plus attack, hit and death triggers.
    #[must_use]
    pub fn skeleton(owner: impl Into<String>) -> Self {
        Self::with_params(
            owner,
            &[
                ("isWalking", ParamKind::Bool),
                ("Attack", ParamKind::Trigger),
                ("Hit", ParamKind::Trigger),
                ("Die", ParamKind::Trigger),
            ],
        )
    }

    /// Ghost graph: every transition is a trigger.
    #[must_use]
    pub fn ghost(owner: impl Into<String>) -> Self {
        Self::with_params(
            owner,
            &[
                ("MoveTrigger", ParamKind::Trigger),
                ("JumpTrigger", ParamKind::Trigger),
                ("ClimbTrigger", ParamKind::Trigger),
                ("AttackTrigger", ParamKind::Trigger),
                ("StunedTrigger", ParamKind::Trigger),
                ("DeathTrigger", ParamKind::Trigger),
                ("TalkTrigger", ParamKind::Trigger),
                ("SpecialATrigger", ParamKind::Trigger),
            ],
        )
    }

    /// Player graph.
    #[must_use]
    pub fn player(owner: impl Into<String>) -> Self {
        Self::with_params(
            owner,
            &[
                ("IsJumping", ParamKind::Bool),
                ("IsDoubleJumping", ParamKind::Bool),
                ("JumpUp", ParamKind::Bool),
                ("IsWallSliding", ParamKind::Bool),
                ("IsDashing", ParamKind::Bool),
                ("IsAttacking", ParamKind::Bool),
                ("Hit", ParamKind::Bool),
                ("IsDead", ParamKind::Bool),
            ],
        )
    }

    /// Whether `name` is declared. Logs a warning when it is not.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        let found = self.params.contains_key(name);
        if !found {
            warn!(owner = %self.owner, param = name, "animator parameter not found");
        }
        found
    }

    fn declared(&mut self, name: &'static str, kind: ParamKind) -> Option<&mut Param> {
        match self.params.get_mut(name) {
            Some(p) if p.kind == Some(kind) => Some(p),
            Some(_) => {
                warn!(owner = %self.owner, param = name, ?kind, "animator parameter has another type");
                None
            }
            None => {
                warn!(owner = %self.owner, param = name, "animator parameter not found");
                None
            }
        }
    }

    pub fn set_bool(&mut self, name: &'static str, value: bool) {
        if let Some(p) = self.declared(name, ParamKind::Bool) {
            p.value = value;
        }
    }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> bool {
        self.params.get(name).is_some_and(|p| p.kind == Some(ParamKind::Bool) && p.value)
    }

    pub fn set_trigger(&mut self, name: &'static str) {
        let owner = self.owner.clone();
        if let Some(p) = self.declared(name, ParamKind::Trigger) {
            p.value = true;
            p.fired += 1;
            self.last_trigger = Some(name);
            debug!(owner = %owner, trigger = name, "animator trigger");
        }
    }

    pub fn reset_trigger(&mut self, name: &'static str) {
        if let Some(p) = self.params.get_mut(name)
            && p.kind == Some(ParamKind::Trigger)
        {
            p.value = false;
        }
    }

    pub fn reset_all_triggers(&mut self) {
        for p in self.params.values_mut() {
            if p.kind == Some(ParamKind::Trigger) {
                p.value = false;
            }
        }
    }

    /// Whether a trigger is armed right now.
    #[must_use]
    pub fn is_armed(&self, name: &str) -> bool {
        self.params.get(name).is_some_and(|p| p.kind == Some(ParamKind::Trigger) && p.value)
    }

    /// How many times a trigger has fired.
    #[must_use]
    pub fn trigger_count(&self, name: &str) -> u32 {
        self.params.get(name).map_or(0, |p| p.fired)
    }

    /// The most recently fired trigger.
    #[must_use]
    pub fn last_trigger(&self) -> Option<&'static str> {
        self.last_trigger
    }
}

impl Component for Animator {
    fn type_name() -> &'static str {
        "Animator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_params() {
        let mut a = Animator::skeleton("Skeleton");
        assert!(!a.get_bool("isWalking"));
        a.set_bool("isWalking", true);
        assert!(a.get_bool("isWalking"));
    }

    #[test]
    fn test_trigger_arm_count_and_reset() {
        let mut a = Animator::ghost("Ghost");
        a.set_trigger("MoveTrigger");
        a.set_trigger("MoveTrigger");
        assert!(a.is_armed("MoveTrigger"));
        assert_eq!(a.trigger_count("MoveTrigger"), 2);
        assert_eq!(a.last_trigger(), Some("MoveTrigger"));
        a.set_trigger("JumpTrigger");
        a.reset_all_triggers();
        assert!(!a.is_armed("MoveTrigger"));
        assert!(!a.is_armed("JumpTrigger"));
        assert_eq!(a.trigger_count("JumpTrigger"), 1);
    }

    #[test]
    fn test_undeclared_parameter_is_a_no_op() {
        let mut a = Animator::skeleton("Skeleton");
        assert!(!a.has_parameter("MoveTrigger"));
        a.set_trigger("MoveTrigger");
        assert_eq!(a.trigger_count("MoveTrigger"), 0);
        assert_eq!(a.last_trigger(), None);
    }

    #[test]
    fn test_kind_mismatch_is_a_no_op() {
        let mut a = Animator::skeleton("Skeleton");
        a.set_bool("Attack", true);
        assert!(!a.get_bool("Attack"));
        a.set_trigger("isWalking");
        assert_eq!(a.trigger_count("isWalking"), 0);
    }

    #[test]
    fn test_player_profile() {
        let mut a = Animator::player("Player");
        a.set_bool("IsDead", true);
        assert!(a.get_bool("IsDead"));
        assert!(a.has_parameter("IsWallSliding"));
    }
}
