//! Game-wide settings.
//!
//! Per-entity tunables live next to the component they configure; this
//! module holds what applies to a whole run.

use serde::{Deserialize, Serialize};

/// Settings shared by every scene of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for wandering actors and enemy hit points.
    pub seed: u64,
    /// Scene loaded when a ghost catches the player.
    pub death_scene_name: String,
    /// Scene loaded after the last level.
    pub end_scene_name: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            death_scene_name: "DeathScene".to_string(),
            end_scene_name: "end_screen".to_string(),
        }
    }
}
