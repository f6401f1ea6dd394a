//! World state for a running scene.
//!
//! The [`GameWorld`] owns every entity's components, the physics world, the
//! clock, this frame's input and the scene-wide singletons (level manager,
//! enemy manager, dialogue, parallax camera). It is the single owner of game
//! state; systems receive it mutably one at a time.
//!
//! Entities are never dropped mid-frame. [`GameWorld::destroy`] queues them
//! and the tick loop removes them between frames.

use darkwood_component::{Component, ComponentStore, Entity, EntityAllocator};
use darkwood_math::Transform2D;
use darkwood_physics::{Body, ContactTracker, OverlapTracker, PhysicsWorld};
use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animator::Animator;
use crate::audio::AudioState;
use crate::clock::{Clock, DEFAULT_FIXED_RATE};
use crate::config::GameConfig;
use crate::enemy::Enemy;
use crate::enemy::manager::EnemyManager;
use crate::error::WorldError;
use crate::events::GameEvent;
use crate::hazards::acid_rain::AcidRain;
use crate::hazards::cannon::{Cannon, Cannonball};
use crate::hazards::dispenser::BoxDispenser;
use crate::hazards::flashlight::Flashlight;
use crate::hazards::platforms::{MovingPlatform, RotatingPlatform};
use crate::hazards::wander::{WanderMovement, Wraith};
use crate::input::InputFrame;
use crate::level::dialogue::DialogueManager;
use crate::level::manager::LevelManager;
use crate::level::parallax::{ParallaxCamera, ParallaxFollow, ParallaxLayer};
use crate::level::triggers::{NpcTrigger, Trigger};
use crate::player::attack::{PlayerAttack, Throwable};
use crate::player::character::CharacterController;
use crate::player::controller::PlayerController;
use crate::player::health::PlayerHealth;
use crate::routine::Routines;

/// Entity tags used for lookups and collision filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tag {
    #[default]
    Untagged,
    Player,
    Enemy,
    Ghost,
    Garbage,
    Ground,
    Foreground,
    Midground,
    Background,
}

/// Name, tag and active flag of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMeta {
    pub name: String,
    pub tag: Tag,
    /// Inactive entities are skipped by every system and their colliders
    /// are disabled.
    pub active: bool,
}

impl Component for EntityMeta {
    fn type_name() -> &'static str {
        "EntityMeta"
    }
}

/// The state of one loaded scene.
#[derive(Debug)]
pub struct GameWorld {
    pub config: GameConfig,
    pub clock: Clock,
    /// Input for the current frame.
    pub input: InputFrame,
    pub physics: PhysicsWorld,
    pub audio: AudioState,
    pub rng: SmallRng,
    /// Name of the loaded scene.
    pub scene: String,
    /// Every scene load requested so far, in order.
    pub scene_history: Vec<String>,

    pub dialogue: DialogueManager,
    pub level: Option<LevelManager>,
    pub enemy_manager: Option<EnemyManager>,
    pub camera: Option<ParallaxCamera>,

    pub meta: ComponentStore<EntityMeta>,
    pub transforms: ComponentStore<Transform2D>,
    pub bodies: ComponentStore<Body>,
    pub contacts: ComponentStore<ContactTracker>,
    pub overlaps: ComponentStore<OverlapTracker>,
    pub animators: ComponentStore<Animator>,
    pub controllers: ComponentStore<PlayerController>,
    pub characters: ComponentStore<CharacterController>,
    pub player_attacks: ComponentStore<PlayerAttack>,
    pub player_health: ComponentStore<PlayerHealth>,
    pub flashlights: ComponentStore<Flashlight>,
    pub throwables: ComponentStore<Throwable>,
    pub enemies: ComponentStore<Enemy>,
    pub triggers: ComponentStore<Trigger>,
    pub npcs: ComponentStore<NpcTrigger>,
    pub parallax_layers: ComponentStore<ParallaxLayer>,
    pub parallax_follow: ComponentStore<ParallaxFollow>,
    pub cannons: ComponentStore<Cannon>,
    pub cannonballs: ComponentStore<Cannonball>,
    pub dispensers: ComponentStore<BoxDispenser>,
    pub acid_rain: ComponentStore<AcidRain>,
    pub platforms: ComponentStore<MovingPlatform>,
    pub rotators: ComponentStore<RotatingPlatform>,
    pub wanderers: ComponentStore<WanderMovement>,
    pub wraiths: ComponentStore<Wraith>,

    allocator: EntityAllocator,
    events: Vec<GameEvent>,
    destroy_queue: Routines<Entity>,
    pending_scene: Option<String>,
}

impl GameWorld {
    /// Create an empty world.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        Self {
            config,
            clock: Clock::new(DEFAULT_FIXED_RATE),
            input: InputFrame::neutral(),
            physics: PhysicsWorld::new(),
            audio: AudioState::new(),
            rng,
            scene: String::new(),
            scene_history: Vec::new(),
            dialogue: DialogueManager::new(),
            level: None,
            enemy_manager: None,
            camera: None,
            meta: ComponentStore::new(),
            transforms: ComponentStore::new(),
            bodies: ComponentStore::new(),
            contacts: ComponentStore::new(),
            overlaps: ComponentStore::new(),
            animators: ComponentStore::new(),
            controllers: ComponentStore::new(),
            characters: ComponentStore::new(),
            player_attacks: ComponentStore::new(),
            player_health: ComponentStore::new(),
            flashlights: ComponentStore::new(),
            throwables: ComponentStore::new(),
            enemies: ComponentStore::new(),
            triggers: ComponentStore::new(),
            npcs: ComponentStore::new(),
            parallax_layers: ComponentStore::new(),
            parallax_follow: ComponentStore::new(),
            cannons: ComponentStore::new(),
            cannonballs: ComponentStore::new(),
            dispensers: ComponentStore::new(),
            acid_rain: ComponentStore::new(),
            platforms: ComponentStore::new(),
            rotators: ComponentStore::new(),
            wanderers: ComponentStore::new(),
            wraiths: ComponentStore::new(),
            allocator: EntityAllocator::new(),
            events: Vec::new(),
            destroy_queue: Routines::new(),
            pending_scene: None,
        }
    }

    /// Allocate an active entity with a name and tag and no other
    /// components.
    pub fn spawn(&mut self, name: impl Into<String>, tag: Tag) -> Entity {
        let entity = self.allocator.allocate();
        self.meta.insert(
            entity,
            EntityMeta {
                name: name.into(),
                tag,
                active: true,
            },
        );
        entity
    }

    /// Allocate an entity with a transform at `position`.
    pub fn spawn_at(&mut self, name: impl Into<String>, tag: Tag, position: Vec2) -> Entity {
        let entity = self.spawn(name, tag);
        self.transforms.insert(entity, Transform2D::from_position(position));
        entity
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.meta.contains(entity)
    }

    #[must_use]
    pub fn is_active(&self, entity: Entity) -> bool {
        self.meta.get(entity).is_some_and(|m| m.active)
    }

    /// Activate or deactivate an entity together with its collider.
    pub fn set_active(&mut self, entity: Entity, active: bool) {
        if let Some(meta) = self.meta.get_mut(entity) {
            meta.active = active;
            self.physics.set_enabled(entity, active);
        }
    }

    #[must_use]
    pub fn tag(&self, entity: Entity) -> Tag {
        self.meta.get(entity).map_or(Tag::Untagged, |m| m.tag)
    }

    #[must_use]
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.meta.get(entity).map(|m| m.name.as_str())
    }

    /// First active entity with `tag`, lowest id first.
    #[must_use]
    pub fn find_by_tag(&self, tag: Tag) -> Option<Entity> {
        self.meta
            .iter()
            .find(|(_, m)| m.tag == tag && m.active)
            .map(|(e, _)| e)
    }

    /// Every entity with `tag`, active or not.
    #[must_use]
    pub fn entities_with_tag(&self, tag: Tag) -> Vec<Entity> {
        self.meta
            .iter()
            .filter(|(_, m)| m.tag == tag)
            .map(|(e, _)| e)
            .collect()
    }

    /// First entity whose name is `name`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.meta.iter().find(|(_, m)| m.name == name).map(|(e, _)| e)
    }

    /// The active player, if any.
    #[must_use]
    pub fn player(&self) -> Option<Entity> {
        self.find_by_tag(Tag::Player)
    }

    #[must_use]
    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        self.transforms.get(entity).map(|t| t.position)
    }

    /// Move an entity, keeping its collider in sync.
    pub fn set_position(&mut self, entity: Entity, position: Vec2) {
        if let Some(transform) = self.transforms.get_mut(entity) {
            transform.position = position;
            self.physics.set_center(entity, position);
        }
    }

    /// Move an entity and stop its body.
    pub fn teleport(&mut self, entity: Entity, position: Vec2) {
        self.set_position(entity, position);
        self.set_velocity(entity, Vec2::ZERO);
    }

    #[must_use]
    pub fn velocity(&self, entity: Entity) -> Vec2 {
        self.bodies.get(entity).map_or(Vec2::ZERO, |b| b.velocity)
    }

    pub fn set_velocity(&mut self, entity: Entity, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(entity) {
            body.velocity = velocity;
        }
    }

    /// Position of an entity that must exist.
    pub fn require_position(&self, entity: Entity) -> Result<Vec2, WorldError> {
        if !self.is_alive(entity) {
            return Err(WorldError::EntityNotFound(entity));
        }
        self.position(entity)
            .ok_or(WorldError::ComponentNotFound(Transform2D::type_name(), entity))
    }

    /// Record a gameplay event.
    pub fn emit(&mut self, event: GameEvent) {
        event.log(self.clock.frame_count);
        self.events.push(event);
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Remove `entity` after `delay` seconds. Zero removes it at the end of
    /// the current frame.
    pub fn destroy(&mut self, entity: Entity, delay: f32) {
        if !self.allocator.is_current(entity) {
            debug!(%entity, scene = self.allocator.scene(), "destroy of an entity from an earlier scene ignored");
            return;
        }
        self.destroy_queue.start(self.clock.time, delay.max(0.0), entity);
    }

    /// Remove entities whose destroy delay has passed.
    pub fn flush_destroyed(&mut self) -> usize {
        let due = self.destroy_queue.drain_due(self.clock.time);
        let mut removed = 0;
        for entity in due {
            if self.despawn(entity) {
                removed += 1;
            }
        }
        removed
    }

    /// Remove an entity and all its components right away.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if self.meta.remove(entity).is_none() {
            return false;
        }
        self.transforms.remove(entity);
        self.bodies.remove(entity);
        self.contacts.remove(entity);
        self.overlaps.remove(entity);
        self.animators.remove(entity);
        self.controllers.remove(entity);
        self.characters.remove(entity);
        self.player_attacks.remove(entity);
        self.player_health.remove(entity);
        self.flashlights.remove(entity);
        self.throwables.remove(entity);
        self.enemies.remove(entity);
        self.triggers.remove(entity);
        self.npcs.remove(entity);
        self.parallax_layers.remove(entity);
        self.parallax_follow.remove(entity);
        self.cannons.remove(entity);
        self.cannonballs.remove(entity);
        self.dispensers.remove(entity);
        self.acid_rain.remove(entity);
        self.platforms.remove(entity);
        self.rotators.remove(entity);
        self.wanderers.remove(entity);
        self.wraiths.remove(entity);
        self.physics.detach(entity);
        if let Some(manager) = self.enemy_manager.as_mut() {
            manager.unregister(entity);
        }
        debug!(%entity, "despawned");
        true
    }

    /// Ask for `scene` to be loaded at the end of the frame. Only the first
    /// request of a frame is honoured.
    pub fn request_scene(&mut self, scene: impl Into<String>) {
        let scene = scene.into();
        if self.pending_scene.is_some() {
            debug!(scene = %scene, "scene load already pending");
            return;
        }
        self.scene_history.push(scene.clone());
        self.emit(GameEvent::SceneLoadRequested { scene: scene.clone() });
        self.pending_scene = Some(scene);
    }

    pub fn take_pending_scene(&mut self) -> Option<String> {
        self.pending_scene.take()
    }

    #[must_use]
    pub fn pending_scene(&self) -> Option<&str> {
        self.pending_scene.as_deref()
    }

    /// Drop every entity and scene singleton, keeping config, audio and
    /// the scene history. The clock restarts.
    pub fn clear_scene(&mut self) {
        for entity in self.meta.entities() {
            self.despawn(entity);
        }
        self.physics.clear();
        self.dialogue = DialogueManager::new();
        self.level = None;
        self.enemy_manager = None;
        self.camera = None;
        self.events.clear();
        self.destroy_queue.stop_all();
        self.pending_scene = None;
        self.clock.reset();
        self.audio.stop_sfx();
        self.allocator.begin_scene();
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.meta.len()
    }
}

impl Default for GameWorld {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use darkwood_math::Aabb;
    use darkwood_physics::Layers;

    use super::*;

    #[test]
    fn test_spawn_and_find_by_tag() {
        let mut world = GameWorld::default();
        let a = world.spawn("Pickup", Tag::Garbage);
        let b = world.spawn("Pickup", Tag::Garbage);
        assert_eq!(world.find_by_tag(Tag::Garbage), Some(a));
        world.set_active(a, false);
        assert_eq!(world.find_by_tag(Tag::Garbage), Some(b));
        assert_eq!(world.entities_with_tag(Tag::Garbage).len(), 2);
        assert_eq!(world.find_by_tag(Tag::Player), None);
    }

    #[test]
    fn test_set_position_moves_collider() {
        let mut world = GameWorld::default();
        let e = world.spawn_at("Crate", Tag::Untagged, Vec2::ZERO);
        world
            .physics
            .attach(e, Aabb::from_center_size(Vec2::ZERO, Vec2::ONE), Layers::GROUND, true);
        world.set_position(e, Vec2::new(5.0, 0.0));
        assert_eq!(world.position(e), Some(Vec2::new(5.0, 0.0)));
        assert_eq!(world.physics.entity_at_point(Vec2::new(5.0, 0.0), Layers::GROUND), Some(e));
    }

    #[test]
    fn test_destroy_waits_for_delay() {
        let mut world = GameWorld::default();
        let e = world.spawn("Corpse", Tag::Enemy);
        world.destroy(e, 0.5);
        world.clock.begin_frame(0.25);
        assert_eq!(world.flush_destroyed(), 0);
        assert!(world.is_alive(e));
        world.clock.begin_frame(0.25);
        assert_eq!(world.flush_destroyed(), 1);
        assert!(!world.is_alive(e));
    }

    #[test]
    fn test_handles_do_not_survive_a_scene_clear() {
        let mut world = GameWorld::default();
        let old = world.spawn("Skeleton", Tag::Enemy);
        world.clear_scene();
        let fresh = world.spawn("Skeleton", Tag::Enemy);
        assert_eq!(fresh.slot(), old.slot());
        assert_ne!(fresh, old);
        assert!(!world.is_alive(old));

        world.destroy(old, 0.0);
        assert_eq!(world.flush_destroyed(), 0);
        assert!(world.is_alive(fresh));
    }

    #[test]
    fn test_only_first_scene_request_is_kept() {
        let mut world = GameWorld::default();
        world.request_scene("Level2");
        world.request_scene("DeathScene");
        assert_eq!(world.take_pending_scene().as_deref(), Some("Level2"));
        assert_eq!(world.scene_history, vec!["Level2".to_string()]);
        assert!(world.take_pending_scene().is_none());
    }

    #[test]
    fn test_require_position_reports_missing_pieces() {
        let mut world = GameWorld::default();
        let bare = world.spawn("Bare", Tag::Untagged);
        assert!(matches!(
            world.require_position(bare),
            Err(WorldError::ComponentNotFound("Transform2D", _))
        ));
        world.despawn(bare);
        assert!(matches!(world.require_position(bare), Err(WorldError::EntityNotFound(_))));
    }

    #[test]
    fn test_clear_scene_drops_everything() {
        let mut world = GameWorld::default();
        world.spawn_at("A", Tag::Player, Vec2::ZERO);
        world.request_scene("Next");
        world.clear_scene();
        assert_eq!(world.entity_count(), 0);
        assert!(world.pending_scene().is_none());
        assert_eq!(world.scene_history.len(), 1);
    }
}
