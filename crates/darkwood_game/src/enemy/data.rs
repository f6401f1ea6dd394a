//! Enemy tunables.
//!
//! Shared enemy types read their numbers from an [`EnemyData`] (or the ghost
//! superset [`GhostData`]); single placements can override ranges through
//! [`EnemyOverrides`].

use serde::{Deserialize, Serialize};

/// Numbers shared by every enemy of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyData {
    pub name: String,
    pub max_health: f32,
    pub move_speed: f32,
    pub patrol_speed: f32,
    /// Seconds spent standing at each patrol point.
    pub patrol_stop_duration: f32,
    pub ground_check_radius: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    /// Seconds a lost player is still chased.
    pub chase_memory_duration: f32,
    pub attack_cooldown: f32,
    pub damage: f32,
    pub attack_radius: f32,
}

impl Default for EnemyData {
    fn default() -> Self {
        Self {
            name: "Skeleton".to_string(),
            max_health: 20.0,
            move_speed: 2.0,
            patrol_speed: 1.0,
            patrol_stop_duration: 1.0,
            ground_check_radius: 0.2,
            detection_range: 7.0,
            attack_range: 1.5,
            chase_memory_duration: 3.0,
            attack_cooldown: 1.5,
            damage: 2.0,
            attack_radius: 0.8,
        }
    }
}

/// Ghost numbers: everything in [`EnemyData`] plus hovering, jumping,
/// climbing and the special attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostData {
    #[serde(flatten)]
    pub base: EnemyData,
    pub hover_height: f32,
    pub hover_variation: f32,
    pub hover_speed: f32,
    pub hover_smoothing: f32,
    pub hover_bob_amplitude: f32,
    pub hover_bob_speed: f32,
    pub max_jump_height: f32,
    pub jump_force: f32,
    pub climb_speed: f32,
    pub wall_check_distance: f32,
    pub ledge_check_distance: f32,
    pub ground_ray_distance: f32,
    pub sight_through_walls: bool,
    pub special_attack_cooldown: f32,
    pub special_attack_damage: f32,
    pub climb_to_idle_delay: f32,
    pub jump_to_chase_delay: f32,
}

impl Default for GhostData {
    fn default() -> Self {
        Self {
            base: EnemyData {
                name: "Ghost".to_string(),
                ..EnemyData::default()
            },
            hover_height: 1.2,
            hover_variation: 0.2,
            hover_speed: 2.0,
            hover_smoothing: 0.2,
            hover_bob_amplitude: 0.1,
            hover_bob_speed: 1.5,
            max_jump_height: 3.0,
            jump_force: 10.0,
            climb_speed: 3.0,
            wall_check_distance: 0.7,
            ledge_check_distance: 1.5,
            ground_ray_distance: 10.0,
            sight_through_walls: false,
            special_attack_cooldown: 5.0,
            special_attack_damage: 4.0,
            climb_to_idle_delay: 0.3,
            jump_to_chase_delay: 0.3,
        }
    }
}

/// Per-placement overrides. Unset fields fall back to the enemy's data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyOverrides {
    pub detection_range: Option<f32>,
    pub attack_range: Option<f32>,
    pub attack_radius: Option<f32>,
}

/// Ghost placement values, used instead of the data when `use_instance_values` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostTuning {
    pub use_instance_values: bool,
    pub detection_range: f32,
    pub attack_range: f32,
    pub wall_check_distance: f32,
    pub ledge_check_distance: f32,
    pub max_jump_height: f32,
    pub chase_memory_duration: f32,
    pub hover_height: f32,
    pub hover_variation: f32,
    pub hover_speed: f32,
}

impl GhostTuning {
    /// The ghost data with this placement's hover values applied.
    #[must_use]
    pub fn apply_hover(&self, data: &GhostData) -> GhostData {
        if !self.use_instance_values {
            return data.clone();
        }
        GhostData {
            hover_height: self.hover_height,
            hover_variation: self.hover_variation,
            hover_speed: self.hover_speed,
            ..data.clone()
        }
    }
}

impl Default for GhostTuning {
    fn default() -> Self {
        Self {
            use_instance_values: true,
            detection_range: 15.38,
            attack_range: 13.96,
            wall_check_distance: 0.7,
            ledge_check_distance: 1.5,
            max_jump_height: 3.0,
            chase_memory_duration: 3.0,
            hover_height: 1.2,
            hover_variation: 0.2,
            hover_speed: 2.0,
        }
    }
}
