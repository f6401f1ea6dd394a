//! Instant death on ghost contact.

use darkwood_component::{Component, Entity};
use glam::Vec2;
use tracing::info;

use crate::events::GameEvent;
use crate::world::{GameWorld, Tag};

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerHealth {
    pub death_scene_name: String,
    pub dead: bool,
}

impl PlayerHealth {
    #[must_use]
    pub fn new(death_scene_name: impl Into<String>) -> Self {
        Self {
            death_scene_name: death_scene_name.into(),
            dead: false,
        }
    }

    /// React to a trigger overlap starting. Returns whether it killed the
    /// player.
    pub fn on_trigger_enter(&mut self, me: Entity, world: &mut GameWorld, other: Entity) -> bool {
        if self.dead || world.tag(other) != Tag::Ghost {
            return false;
        }
        self.die(me, world);
        true
    }

    fn die(&mut self, me: Entity, world: &mut GameWorld) {
        self.dead = true;
        info!(player = %me, scene = %self.death_scene_name, "player touched a ghost");
        if let Some(controller) = world.controllers.get_mut(me) {
            controller.enabled = false;
        }
        if let Some(character) = world.characters.get_mut(me) {
            character.can_move = false;
        }
        if let Some(flashlight) = world.flashlights.get_mut(me) {
            flashlight.release();
        }
        world.set_velocity(me, Vec2::ZERO);
        world.emit(GameEvent::PlayerDied { entity: me });
        world.request_scene(self.death_scene_name.clone());
    }
}

impl Component for PlayerHealth {
    fn type_name() -> &'static str {
        "PlayerHealth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazards::flashlight::FlashlightSettings;
    use crate::player::{PlayerDesc, spawn_player};

    #[test]
    fn test_ghost_contact_kills_once() {
        let mut world = GameWorld::default();
        let desc = PlayerDesc {
            flashlight: Some(FlashlightSettings::default()),
            ..PlayerDesc::default()
        };
        let player = spawn_player(&mut world, &desc);
        let ghost = world.spawn_at("Wraith", Tag::Ghost, Vec2::ZERO);
        let mut health = world.player_health.remove(player).unwrap();

        assert!(health.on_trigger_enter(player, &mut world, ghost));
        assert!(!health.on_trigger_enter(player, &mut world, ghost));
        assert!(!world.controllers.get(player).unwrap().enabled);
        assert_eq!(world.pending_scene(), Some("DeathScene"));
        assert_eq!(world.scene_history, vec!["DeathScene".to_string()]);
    }

    #[test]
    fn test_other_tags_are_harmless() {
        let mut world = GameWorld::default();
        let player = spawn_player(&mut world, &PlayerDesc::default());
        let garbage = world.spawn_at("Garbage", Tag::Garbage, Vec2::ZERO);
        let mut health = PlayerHealth::new("DeathScene");
        assert!(!health.on_trigger_enter(player, &mut world, garbage));
        assert!(!health.dead);
    }
}
