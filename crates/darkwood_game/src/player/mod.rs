//! The player: two controller variants, melee and thrown attacks, and the
//! flashlight-era health that dies on ghost contact.
//!
//! A level picks the controller with [`ControllerKind`]. The simple
//! [`PlayerController`](controller::PlayerController) drives velocity
//! directly from input and reads walls from contact normals; the
//! [`CharacterController`](character::CharacterController) adds double
//! jumps, wall slides, dashes, knockback and a melee attack.

pub mod attack;
pub mod character;
pub mod controller;
pub mod health;

use darkwood_component::Entity;
use darkwood_math::Aabb;
use darkwood_physics::{Body, ContactTracker, Layers, OverlapTracker};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::animator::Animator;
use crate::events::GameEvent;
use crate::hazards::flashlight::{Flashlight, FlashlightSettings};
use crate::level::manager::with_level;
use crate::player::attack::{PlayerAttack, PlayerAttackSettings};
use crate::player::character::{CharacterController, CharacterSettings};
use crate::player::controller::{ControllerSettings, PlayerController};
use crate::player::health::PlayerHealth;
use crate::world::{GameWorld, Tag};

/// Collider half extents of the player.
pub const PLAYER_HALF_EXTENTS: Vec2 = Vec2::new(0.4, 0.9);

/// Damage dealt to the player and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInfo {
    pub amount: f32,
    pub source: Vec2,
}

impl DamageInfo {
    #[must_use]
    pub fn new(amount: f32, source: Vec2) -> Self {
        Self { amount, source }
    }
}

/// Which controller moves the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    /// Direct velocity control with contact-normal wall slides.
    #[default]
    Simple,
    /// Smoothed movement, double jump, wall jump, dash and melee.
    Character,
}

/// The player as described by a level file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerDesc {
    pub spawn: Vec2,
    pub controller: ControllerKind,
    pub simple: ControllerSettings,
    pub character: CharacterSettings,
    pub attack: PlayerAttackSettings,
    /// Attach the flashlight and ghost-contact death.
    pub flashlight: Option<FlashlightSettings>,
}

/// Build the player entity.
pub fn spawn_player(world: &mut GameWorld, desc: &PlayerDesc) -> Entity {
    let player = world.spawn_at("Player", Tag::Player, desc.spawn);
    world.bodies.insert(
        player,
        Body::dynamic(PLAYER_HALF_EXTENTS, Layers::PLAYER).with_collides_with(Layers::GROUND),
    );
    world.physics.attach(
        player,
        Aabb::from_center_size(desc.spawn, PLAYER_HALF_EXTENTS * 2.0),
        Layers::PLAYER,
        true,
    );
    world.contacts.insert(player, ContactTracker::new());
    world.overlaps.insert(player, OverlapTracker::new());
    world.animators.insert(player, Animator::player("Player"));
    match desc.controller {
        ControllerKind::Simple => {
            world
                .controllers
                .insert(player, PlayerController::new(desc.simple.clone()));
        }
        ControllerKind::Character => {
            world
                .characters
                .insert(player, CharacterController::new(desc.character.clone()));
            world
                .player_attacks
                .insert(player, PlayerAttack::new(desc.attack.clone()));
        }
    }
    if let Some(settings) = &desc.flashlight {
        world
            .player_health
            .insert(player, PlayerHealth::new(world.config.death_scene_name.clone()));
        world.flashlights.insert(player, Flashlight::new(settings.clone()));
    }
    info!(%player, controller = ?desc.controller, x = desc.spawn.x, y = desc.spawn.y, "player spawned");
    player
}

/// Damage the player through whichever controller it uses. Returns whether
/// the damage was taken.
pub fn damage_player(world: &mut GameWorld, player: Entity, damage: DamageInfo) -> bool {
    let Some(position) = world.position(player) else {
        return false;
    };
    let outcome = if let Some(mut character) = world.characters.remove(player) {
        let taken = character.apply_damage(player, world, position, damage);
        let life = character.life;
        world.characters.insert(player, character);
        taken.then_some(life)
    } else if let Some(mut controller) = world.controllers.remove(player) {
        let taken = controller.apply_damage(player, world, damage);
        let life = controller.life;
        world.controllers.insert(player, controller);
        taken.then_some(life)
    } else {
        warn!(%player, "damage target has no controller");
        None
    };
    let Some(life) = outcome else {
        debug!(%player, amount = damage.amount, "player damage ignored");
        return false;
    };
    world.emit(GameEvent::PlayerDamaged {
        entity: player,
        amount: damage.amount,
        remaining: life.max(0.0),
    });
    if life <= 0.0 {
        world.emit(GameEvent::PlayerDied { entity: player });
    }
    true
}

/// Pick up a garbage item: hide it and count it for the level.
pub fn collect_garbage(world: &mut GameWorld, pickup: Entity) {
    if !world.is_active(pickup) {
        return;
    }
    world.set_active(pickup, false);
    let total = with_level(world, |level, world| level.increment_garbage(world)).unwrap_or(0);
    world.emit(GameEvent::GarbageCollected { pickup, total });
}

/// Spawn a garbage pickup at `position`.
pub fn spawn_garbage(world: &mut GameWorld, position: Vec2) -> Entity {
    let pickup = world.spawn_at("Garbage", Tag::Garbage, position);
    world.physics.attach(
        pickup,
        Aabb::from_center_size(position, Vec2::splat(0.5)),
        Layers::PICKUP,
        false,
    );
    pickup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_simple_player() {
        let mut world = GameWorld::default();
        let player = spawn_player(&mut world, &PlayerDesc::default());
        assert_eq!(world.player(), Some(player));
        assert!(world.controllers.contains(player));
        assert!(!world.characters.contains(player));
        assert!(!world.player_health.contains(player));
    }

    #[test]
    fn test_spawn_character_player_with_flashlight() {
        let mut world = GameWorld::default();
        let desc = PlayerDesc {
            controller: ControllerKind::Character,
            flashlight: Some(FlashlightSettings::default()),
            ..PlayerDesc::default()
        };
        let player = spawn_player(&mut world, &desc);
        assert!(world.characters.contains(player));
        assert!(world.player_attacks.contains(player));
        assert!(world.player_health.contains(player));
        assert!(world.flashlights.contains(player));
    }

    #[test]
    fn test_damage_reports_clamped_life() {
        let mut world = GameWorld::default();
        let player = spawn_player(&mut world, &PlayerDesc::default());
        assert!(damage_player(&mut world, player, DamageInfo::new(25.0, Vec2::ZERO)));
        let events = world.drain_events();
        assert!(events.contains(&GameEvent::PlayerDamaged {
            entity: player,
            amount: 25.0,
            remaining: 0.0
        }));
        assert!(events.contains(&GameEvent::PlayerDied { entity: player }));
        // Dead players take no more damage.
        assert!(!damage_player(&mut world, player, DamageInfo::new(1.0, Vec2::ZERO)));
    }

    #[test]
    fn test_collect_garbage_once() {
        let mut world = GameWorld::default();
        let pickup = spawn_garbage(&mut world, Vec2::ZERO);
        collect_garbage(&mut world, pickup);
        collect_garbage(&mut world, pickup);
        assert!(!world.is_active(pickup));
        let collected = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GarbageCollected { .. }))
            .count();
        assert_eq!(collected, 1);
    }
}
