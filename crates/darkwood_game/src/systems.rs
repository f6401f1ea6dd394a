//! The game's systems and their registration.
//!
//! Each system is a function over the whole [`GameWorld`]. Its
//! [`QueryDescriptor`] names the component stores and scene singletons it
//! touches, so the scheduler can keep dependent systems in order.

use darkwood_component::{ComponentTypeId, Entity, QueryDescriptor};
use darkwood_math::Transform2D;
use darkwood_physics::{Body, CollisionEvent, ContactTracker, Layers, OverlapEvent, OverlapTracker};
use tracing::{debug, warn};

use crate::animator::Animator;
use crate::enemy::{Enemy, with_enemy};
use crate::hazards::acid_rain::{AcidRain, update_acid_rain};
use crate::hazards::cannon::{Cannon, Cannonball, on_cannonball_collision, update_cannonballs, update_cannons};
use crate::hazards::dispenser::{BoxDispenser, update_dispensers};
use crate::hazards::flashlight::{Flashlight, aim_flashlights, update_flashlight};
use crate::hazards::platforms::{MovingPlatform, RotatingPlatform, update_platforms};
use crate::hazards::wander::{WanderMovement, Wraith, fixed_wanderers, update_wanderers};
use crate::level::dialogue::update_dialogue;
use crate::level::parallax::{ParallaxFollow, ParallaxLayer, update_parallax_camera, update_parallax_follow};
use crate::level::triggers::{NpcTrigger, Trigger, on_player_enter, on_player_exit, update_npcs};
use crate::player::attack::{PlayerAttack, Throwable, update_throwables};
use crate::player::character::CharacterController;
use crate::player::controller::PlayerController;
use crate::player::health::PlayerHealth;
use crate::player::collect_garbage;
use crate::registry::SystemRegistry;
use crate::scheduler::Phase;
use crate::world::{EntityMeta, GameWorld, Tag};

/// Scene singletons, named like components so queries can list them.
pub const PHYSICS: ComponentTypeId = ComponentTypeId::from_name("PhysicsWorld");
pub const LEVEL: ComponentTypeId = ComponentTypeId::from_name("LevelManager");
pub const ENEMY_MANAGER: ComponentTypeId = ComponentTypeId::from_name("EnemyManager");
pub const DIALOGUE: ComponentTypeId = ComponentTypeId::from_name("DialogueManager");
pub const CAMERA: ComponentTypeId = ComponentTypeId::from_name("ParallaxCamera");
pub const AUDIO: ComponentTypeId = ComponentTypeId::from_name("AudioState");
pub const EVENTS: ComponentTypeId = ComponentTypeId::from_name("GameEvent");
pub const RNG: ComponentTypeId = ComponentTypeId::from_name("SmallRng");

/// Overlaps the player reacts to.
const PLAYER_OVERLAP_MASK: Layers = Layers::TRIGGER
    .union(Layers::PICKUP)
    .union(Layers::ENEMY)
    .union(Layers::HAZARD);

/// Register every game system in frame order.
pub fn register_game_systems(registry: &mut SystemRegistry) {
    // Fixed step.
    registry.register(
        "player_controller_fixed",
        Phase::Fixed,
        QueryDescriptor::new()
            .reads::<PlayerController>()
            .writes::<Body>()
            .write(PHYSICS),
        fixed_player_controllers,
    );
    registry.register(
        "character_fixed",
        Phase::Fixed,
        QueryDescriptor::new()
            .writes::<CharacterController>()
            .writes::<Body>()
            .writes::<Transform2D>()
            .writes::<Animator>()
            .write(PHYSICS)
            .write(ENEMY_MANAGER)
            .write(EVENTS),
        fixed_characters,
    );
    registry.register(
        "enemy_movement",
        Phase::Fixed,
        QueryDescriptor::new()
            .writes::<Enemy>()
            .writes::<Body>()
            .writes::<Transform2D>()
            .read(PHYSICS),
        fixed_enemy_movement,
    );
    registry.register(
        "wander",
        Phase::Fixed,
        QueryDescriptor::new()
            .writes::<WanderMovement>()
            .writes::<Body>()
            .reads::<Transform2D>()
            .write(RNG),
        fixed_wanderers,
    );
    registry.register(
        "physics",
        Phase::Fixed,
        QueryDescriptor::new()
            .writes::<Body>()
            .writes::<Transform2D>()
            .writes::<ContactTracker>()
            .writes::<PlayerController>()
            .writes::<Cannonball>()
            .write(PHYSICS)
            .write(EVENTS)
            .write(AUDIO),
        step_physics,
    );

    // Update.
    registry.register(
        "player_input",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<PlayerController>()
            .writes::<CharacterController>()
            .writes::<Body>()
            .read(LEVEL),
        update_player_input,
    );
    registry.register(
        "player_attack",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<PlayerAttack>()
            .writes::<Throwable>()
            .writes::<Enemy>()
            .writes::<Transform2D>()
            .writes::<Animator>()
            .write(PHYSICS)
            .write(EVENTS),
        update_player_attacks,
    );
    registry.register(
        "flashlight",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<Flashlight>()
            .writes::<Wraith>()
            .reads::<Transform2D>()
            .reads::<PlayerHealth>()
            .write(EVENTS),
        update_flashlight,
    );
    registry.register(
        "player_overlaps",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<OverlapTracker>()
            .writes::<PlayerHealth>()
            .writes::<Trigger>()
            .writes::<EntityMeta>()
            .writes::<Transform2D>()
            .writes::<Body>()
            .write(PHYSICS)
            .write(LEVEL)
            .write(AUDIO)
            .write(DIALOGUE)
            .write(EVENTS),
        update_player_overlaps,
    );
    registry.register(
        "dialogue",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<NpcTrigger>()
            .reads::<Transform2D>()
            .write(DIALOGUE)
            .write(EVENTS),
        update_dialogue_system,
    );
    registry.register(
        "level",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<Transform2D>()
            .writes::<EntityMeta>()
            .writes::<PlayerController>()
            .write(LEVEL)
            .write(AUDIO)
            .write(EVENTS),
        crate::level::manager::update_level,
    );
    registry.register(
        "enemy_activation",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<EntityMeta>()
            .reads::<Enemy>()
            .reads::<Transform2D>()
            .read(ENEMY_MANAGER)
            .write(PHYSICS),
        crate::enemy::manager::update_enemy_activation,
    );
    registry.register(
        "enemy_ai",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<Enemy>()
            .writes::<Body>()
            .writes::<Transform2D>()
            .writes::<Animator>()
            .writes::<CharacterController>()
            .writes::<PlayerController>()
            .write(PHYSICS)
            .write(EVENTS),
        update_enemy_ai,
    );
    registry.register(
        "wraiths",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<WanderMovement>()
            .writes::<Wraith>()
            .write(RNG),
        update_wanderers,
    );
    registry.register(
        "hazards",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<Cannon>()
            .writes::<Cannonball>()
            .writes::<BoxDispenser>()
            .writes::<AcidRain>()
            .writes::<Transform2D>()
            .writes::<Body>()
            .writes::<CharacterController>()
            .writes::<PlayerController>()
            .write(PHYSICS)
            .write(AUDIO)
            .write(EVENTS),
        update_hazards,
    );
    registry.register(
        "platforms",
        Phase::Update,
        QueryDescriptor::new()
            .reads::<MovingPlatform>()
            .reads::<RotatingPlatform>()
            .writes::<Transform2D>()
            .write(PHYSICS),
        update_platforms,
    );
    registry.register(
        "parallax_follow",
        Phase::Update,
        QueryDescriptor::new()
            .writes::<ParallaxFollow>()
            .writes::<Transform2D>(),
        update_parallax_follow,
    );

    // Late update.
    registry.register(
        "emergency_resets",
        Phase::Late,
        QueryDescriptor::new()
            .writes::<Enemy>()
            .writes::<Animator>()
            .writes::<Body>()
            .read(PHYSICS)
            .write(EVENTS),
        emergency_resets,
    );
    registry.register(
        "flashlight_aim",
        Phase::Late,
        QueryDescriptor::new()
            .writes::<Flashlight>()
            .reads::<Transform2D>()
            .reads::<PlayerHealth>(),
        aim_flashlights,
    );
    registry.register(
        "parallax_camera",
        Phase::Late,
        QueryDescriptor::new()
            .writes::<ParallaxLayer>()
            .writes::<Transform2D>()
            .write(CAMERA),
        update_parallax_camera,
    );

    debug!(systems = registry.system_count(), "game systems registered");
}

fn active(world: &GameWorld, entity: Entity) -> bool {
    world.is_active(entity)
}

fn fixed_player_controllers(world: &mut GameWorld) {
    for player in world.controllers.entities() {
        if !active(world, player) {
            continue;
        }
        if let Some(mut controller) = world.controllers.remove(player) {
            controller.fixed_update(player, world);
            world.controllers.insert(player, controller);
        }
    }
}

fn fixed_characters(world: &mut GameWorld) {
    for player in world.characters.entities() {
        if !active(world, player) {
            continue;
        }
        if let Some(mut character) = world.characters.remove(player) {
            character.fixed_update(player, world);
            world.characters.insert(player, character);
        }
    }
}

fn fixed_enemy_movement(world: &mut GameWorld) {
    for enemy in world.enemies.entities() {
        if !active(world, enemy) {
            continue;
        }
        with_enemy(world, enemy, |e, world| e.fixed_movement(enemy, world));
    }
}

/// Move every simulated body and hand contact changes to their owners.
fn step_physics(world: &mut GameWorld) {
    let dt = world.clock.fixed_dt;
    for entity in world.bodies.entities() {
        if !active(world, entity) {
            continue;
        }
        let (Some(mut transform), Some(mut body)) =
            (world.transforms.get(entity).copied(), world.bodies.remove(entity))
        else {
            continue;
        };
        let contacts = world.physics.step_body(entity, &mut transform, &mut body, dt);
        world.bodies.insert(entity, body);
        if let Some(stored) = world.transforms.get_mut(entity) {
            *stored = transform;
        }

        let Some(tracker) = world.contacts.get_mut(entity) else {
            continue;
        };
        for event in tracker.update(&contacts) {
            dispatch_collision(world, entity, &event);
        }
    }
}

fn dispatch_collision(world: &mut GameWorld, entity: Entity, event: &CollisionEvent) {
    if let Some(controller) = world.controllers.get_mut(entity) {
        controller.on_collision(event);
    }
    if world.cannonballs.contains(entity) {
        on_cannonball_collision(world, entity, event);
    }
}

fn update_player_input(world: &mut GameWorld) {
    for player in world.controllers.entities() {
        if !active(world, player) {
            continue;
        }
        if let Some(mut controller) = world.controllers.remove(player) {
            controller.update(player, world);
            world.controllers.insert(player, controller);
        }
    }
    for player in world.characters.entities() {
        if !active(world, player) {
            continue;
        }
        if let Some(mut character) = world.characters.remove(player) {
            character.update(player, world);
            world.characters.insert(player, character);
        }
    }
}

fn update_player_attacks(world: &mut GameWorld) {
    for player in world.player_attacks.entities() {
        if !active(world, player) {
            continue;
        }
        if let Some(mut attack) = world.player_attacks.remove(player) {
            attack.update(player, world);
            world.player_attacks.insert(player, attack);
        }
    }
    update_throwables(world);
}

/// Diff what the player overlaps and react to pickups, ghosts and trigger
/// volumes.
fn update_player_overlaps(world: &mut GameWorld) {
    for player in world.overlaps.entities() {
        if !active(world, player) {
            continue;
        }
        let Some(aabb) = world.physics.collider_of(player).map(|c| c.aabb) else {
            continue;
        };
        let touching: Vec<Entity> = world
            .physics
            .overlap_aabb(&aabb, PLAYER_OVERLAP_MASK)
            .into_iter()
            .filter_map(|hit| hit.entity)
            .filter(|e| *e != player && world.is_active(*e))
            .collect();
        let Some(tracker) = world.overlaps.get_mut(player) else {
            continue;
        };
        for event in tracker.update(touching) {
            match event {
                OverlapEvent::Enter(other) => on_overlap_enter(world, player, other),
                OverlapEvent::Exit(other) => {
                    if world.triggers.contains(other) {
                        on_player_exit(world, other);
                    }
                }
            }
        }
    }
}

fn on_overlap_enter(world: &mut GameWorld, player: Entity, other: Entity) {
    match world.tag(other) {
        Tag::Garbage => collect_garbage(world, other),
        Tag::Ghost => {
            if let Some(mut health) = world.player_health.remove(player) {
                health.on_trigger_enter(player, world, other);
                world.player_health.insert(player, health);
            }
        }
        _ => {
            if world.triggers.contains(other) {
                on_player_enter(world, other, player);
            }
        }
    }
}

fn update_dialogue_system(world: &mut GameWorld) {
    update_npcs(world);
    update_dialogue(world);
}

fn update_enemy_ai(world: &mut GameWorld) {
    let dt = world.clock.dt;
    for enemy in world.enemies.entities() {
        if !active(world, enemy) {
            continue;
        }
        with_enemy(world, enemy, |e, world| {
            e.update_movement(dt);
            e.update_ai(enemy, world);
            e.update_attack(enemy, world);
        });
    }
}

fn update_hazards(world: &mut GameWorld) {
    update_cannons(world);
    update_cannonballs(world);
    update_dispensers(world);
    update_acid_rain(world);
}

/// F12 resets every enemy; a reset click resets the enemy under it and
/// stops its routines.
fn emergency_resets(world: &mut GameWorld) {
    if world.input.reset_all_enemies {
        warn!("emergency reset of all enemies");
        for enemy in world.enemies.entities() {
            with_enemy(world, enemy, |e, world| e.emergency_reset(enemy, world, false));
        }
    }
    if let Some(point) = world.input.reset_enemy_at {
        match world.physics.entity_at_point(point, Layers::ENEMY) {
            Some(enemy) if world.enemies.contains(enemy) => {
                warn!(%enemy, "emergency reset of clicked enemy");
                with_enemy(world, enemy, |e, world| e.emergency_reset(enemy, world, true));
            }
            _ => debug!(x = point.x, y = point.y, "reset click hit no enemy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::enemy::ai::AiState;
    use crate::enemy::spawn::{EnemyDesc, spawn_enemy};
    use crate::level::triggers::{TriggerDesc, TriggerKind, spawn_trigger};
    use crate::player::{PlayerDesc, spawn_garbage, spawn_player};
    use crate::scheduler::{compute_stages, execution_order};

    #[test]
    fn test_every_phase_keeps_registration_order_for_conflicts() {
        let mut registry = SystemRegistry::new();
        register_game_systems(&mut registry);
        for phase in Phase::ALL {
            let systems = registry.scheduled(phase);
            let order = execution_order(&compute_stages(&systems));
            for (i, a) in order.iter().enumerate() {
                for b in &order[i + 1..] {
                    if systems[*a].query.conflicts_with(&systems[*b].query) {
                        assert!(a < b, "{} ran before {}", systems[*b].name, systems[*a].name);
                    }
                }
            }
        }
    }

    #[test]
    fn test_physics_lands_body_and_reports_ground() {
        let mut world = GameWorld::default();
        world.physics.add_static(
            darkwood_math::Aabb::from_center_size(Vec2::new(0.0, -1.0), Vec2::new(20.0, 2.0)),
            Layers::GROUND,
        );
        let player = spawn_player(&mut world, &PlayerDesc {
            spawn: Vec2::new(0.0, 1.5),
            ..PlayerDesc::default()
        });
        for _ in 0..100 {
            step_physics(&mut world);
        }
        let y = world.position(player).unwrap().y;
        assert!((y - 0.9).abs() < 1e-3, "landed at {y}");
        assert!(world.controllers.get(player).unwrap().grounded);
    }

    #[test]
    fn test_overlaps_collect_garbage_and_fire_triggers() {
        let mut world = GameWorld::default();
        let player = spawn_player(&mut world, &PlayerDesc::default());
        let pickup = spawn_garbage(&mut world, Vec2::new(0.2, 0.0));
        let zone = spawn_trigger(&mut world, &TriggerDesc {
            name: "KillZone".to_string(),
            position: Vec2::ZERO,
            size: Vec2::splat(4.0),
            kind: TriggerKind::Respawn {
                respawn_point: Vec2::new(10.0, 5.0),
            },
        });
        update_player_overlaps(&mut world);
        assert!(!world.is_active(pickup));
        assert_eq!(world.position(player), Some(Vec2::new(10.0, 5.0)));
        assert!(world.overlaps.get(player).unwrap().contains(zone));
    }

    #[test]
    fn test_reset_click_resets_only_that_enemy() {
        let mut world = GameWorld::default();
        spawn_player(&mut world, &PlayerDesc::default());
        let patrol = vec![Vec2::new(10.0, 0.0), Vec2::new(14.0, 0.0)];
        let a = spawn_enemy(&mut world, &EnemyDesc::skeleton("A", Vec2::new(10.0, 0.0)).with_patrol(patrol.clone()));
        let b = spawn_enemy(&mut world, &EnemyDesc::skeleton("B", Vec2::new(30.0, 0.0)).with_patrol(patrol));
        for e in [a, b] {
            with_enemy(&mut world, e, |enemy, world| enemy.change_state(e, world, AiState::Chasing));
        }
        world.input.reset_enemy_at = Some(Vec2::new(10.0, 0.0));
        emergency_resets(&mut world);
        assert_eq!(world.enemies.get(a).unwrap().ai.state, AiState::Patrolling);
        assert_eq!(world.enemies.get(b).unwrap().ai.state, AiState::Chasing);

        world.input.reset_enemy_at = None;
        world.input.reset_all_enemies = true;
        emergency_resets(&mut world);
        assert_eq!(world.enemies.get(b).unwrap().ai.state, AiState::Patrolling);
    }
}
