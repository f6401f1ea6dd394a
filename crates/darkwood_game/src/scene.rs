//! Level files and scene loading.
//!
//! A scene is described by a JSON [`LevelDesc`]. A [`SceneCatalog`] maps
//! scene names to descriptions; [`load_scene`] clears the world and builds
//! the named scene into it. Scenes the catalog does not hold but the game
//! knows about (the death screen and the end screen) load as empty screens.

use std::collections::BTreeMap;
use std::path::Path;

use darkwood_math::Aabb;
use darkwood_physics::{ColliderId, Layers};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::MusicChannel;
use crate::enemy::manager::{EnemyManager, EnemyManagerSettings};
use crate::enemy::spawn::{EnemyDesc, spawn_enemy};
use crate::error::LevelError;
use crate::hazards::acid_rain::AcidRain;
use crate::hazards::cannon::{CannonSettings, spawn_cannon};
use crate::hazards::dispenser::{BoxDispenserSettings, spawn_dispenser};
use crate::hazards::platforms::{PlatformDesc, spawn_platform};
use crate::hazards::wander::{WanderSettings, spawn_wraith};
use crate::level::manager::{LevelManager, LevelSettings, with_level};
use crate::level::parallax::{ParallaxCamera, ParallaxFollow, ParallaxLayer};
use crate::level::triggers::{NpcTrigger, TriggerDesc, TriggerKind, spawn_trigger};
use crate::player::{PlayerDesc, spawn_garbage, spawn_player};
use crate::world::{GameWorld, Tag};

/// The level compiled into the binary.
pub const DEMO_LEVEL: &str = include_str!("../levels/demo.json");

/// A solid rectangle of ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundDesc {
    pub center: Vec2,
    pub size: Vec2,
}

/// Add `ground` as static collision, shifted by `offset`.
pub fn spawn_ground(world: &mut GameWorld, ground: &GroundDesc, offset: Vec2) -> ColliderId {
    world
        .physics
        .add_static(Aabb::from_center_size(ground.center + offset, ground.size), Layers::GROUND)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDesc {
    pub name: String,
    pub position: Vec2,
    #[serde(flatten)]
    pub npc: NpcTrigger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannonDesc {
    pub position: Vec2,
    #[serde(default)]
    pub rotation_deg: f32,
    #[serde(flatten)]
    pub settings: CannonSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispenserDesc {
    pub position: Vec2,
    #[serde(flatten)]
    pub settings: BoxDispenserSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcidRainDesc {
    pub position: Vec2,
    #[serde(flatten)]
    pub rain: AcidRain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WraithDesc {
    pub position: Vec2,
    #[serde(flatten)]
    pub wander: WanderSettings,
}

/// A scrolling backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallaxDesc {
    pub name: String,
    /// `Foreground`, `Midground` or `Background`; picks the default factor.
    #[serde(default)]
    pub tag: Tag,
    pub position: Vec2,
    /// Unset resolves from the tag.
    #[serde(default)]
    pub factor: Option<f32>,
    /// Follow the player instead of shifting against the camera.
    #[serde(default)]
    pub follow: Option<ParallaxFollow>,
}

/// One scene as stored in a level file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDesc {
    pub scene: String,
    pub player: PlayerDesc,
    pub ground: Vec<GroundDesc>,
    pub platforms: Vec<PlatformDesc>,
    pub enemies: Vec<EnemyDesc>,
    pub garbage: Vec<Vec2>,
    pub triggers: Vec<TriggerDesc>,
    pub npcs: Vec<NpcDesc>,
    pub cannons: Vec<CannonDesc>,
    pub dispensers: Vec<DispenserDesc>,
    pub acid_rain: Vec<AcidRainDesc>,
    pub wraiths: Vec<WraithDesc>,
    pub parallax: Vec<ParallaxDesc>,
    /// Timed garbage-collection rules; absent for free-roaming scenes.
    pub level: Option<LevelSettings>,
    pub enemy_manager: Option<EnemyManagerSettings>,
    /// Background music clip.
    pub music: Option<String>,
}

impl LevelDesc {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let desc: Self = serde_json::from_str(json)?;
        desc.validate()?;
        Ok(desc)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The built-in demo level.
    pub fn demo() -> Result<Self, LevelError> {
        Self::from_json(DEMO_LEVEL)
    }

    fn invalid(&self, reason: impl Into<String>) -> LevelError {
        LevelError::Invalid {
            scene: self.scene.clone(),
            reason: reason.into(),
        }
    }

    /// Reject descriptions the game cannot run.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.scene.trim().is_empty() {
            return Err(self.invalid("scene name is empty"));
        }
        if let Some(ground) = self.ground.iter().find(|g| g.size.x <= 0.0 || g.size.y <= 0.0) {
            return Err(self.invalid(format!("ground at {} has no area", ground.center)));
        }
        if let Some(level) = &self.level
            && level.score_to_win == 0
        {
            return Err(self.invalid("score_to_win must be at least 1"));
        }
        for trigger in &self.triggers {
            if let TriggerKind::Portal { destination, .. } = &trigger.kind
                && !self.triggers.iter().any(|t| &t.name == destination)
            {
                return Err(self.invalid(format!("portal '{}' leads to unknown '{destination}'", trigger.name)));
            }
        }
        if self.cannons.iter().any(|c| c.settings.firing_interval <= 0.0) {
            return Err(self.invalid("cannon firing_interval must be positive"));
        }
        if self.dispensers.iter().any(|d| d.settings.spawn_interval <= 0.0) {
            return Err(self.invalid("dispenser spawn_interval must be positive"));
        }
        if self.acid_rain.iter().any(|r| r.rain.drop_interval <= 0.0) {
            return Err(self.invalid("acid rain drop_interval must be positive"));
        }
        if let Some(enemy) = self.enemies.iter().find(|e| e.name.trim().is_empty()) {
            return Err(self.invalid(format!("enemy at {} has no name", enemy.position)));
        }
        Ok(())
    }
}

/// Scenes by name.
#[derive(Debug, Clone, Default)]
pub struct SceneCatalog {
    scenes: BTreeMap<String, LevelDesc>,
}

impl SceneCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding only the demo level.
    pub fn with_demo() -> Result<Self, LevelError> {
        let mut catalog = Self::new();
        catalog.insert(LevelDesc::demo()?);
        Ok(catalog)
    }

    pub fn insert(&mut self, desc: LevelDesc) {
        self.scenes.insert(desc.scene.clone(), desc);
    }

    #[must_use]
    pub fn get(&self, scene: &str) -> Option<&LevelDesc> {
        self.scenes.get(scene)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// Clear the world and load `scene` from the catalog.
pub fn load_scene(world: &mut GameWorld, catalog: &SceneCatalog, scene: &str) -> Result<(), LevelError> {
    if let Some(desc) = catalog.get(scene) {
        build_level(world, desc);
        return Ok(());
    }
    if scene == world.config.death_scene_name || scene == world.config.end_scene_name {
        world.clear_scene();
        world.scene = scene.to_string();
        info!(scene, "screen loaded");
        return Ok(());
    }
    Err(LevelError::UnknownScene(scene.to_string()))
}

/// Clear the world and build `desc` into it.
pub fn build_level(world: &mut GameWorld, desc: &LevelDesc) {
    world.clear_scene();
    world.scene = desc.scene.clone();

    for ground in &desc.ground {
        spawn_ground(world, ground, Vec2::ZERO);
    }
    for platform in &desc.platforms {
        spawn_platform(world, platform);
    }

    let player = spawn_player(world, &desc.player);
    for position in &desc.garbage {
        spawn_garbage(world, *position);
    }
    for trigger in &desc.triggers {
        spawn_trigger(world, trigger);
    }
    for npc in &desc.npcs {
        let entity = world.spawn_at(npc.name.clone(), Tag::Untagged, npc.position);
        world.npcs.insert(entity, npc.npc.clone());
    }
    for cannon in &desc.cannons {
        spawn_cannon(world, cannon.position, cannon.rotation_deg, cannon.settings.clone());
    }
    for dispenser in &desc.dispensers {
        spawn_dispenser(world, dispenser.position, dispenser.settings.clone());
    }
    for rain in &desc.acid_rain {
        let entity = world.spawn_at("AcidRain", Tag::Untagged, rain.position);
        world.acid_rain.insert(entity, rain.rain.clone());
    }
    for wraith in &desc.wraiths {
        spawn_wraith(world, wraith.position, wraith.wander.clone());
    }

    for layer in &desc.parallax {
        let entity = world.spawn_at(layer.name.clone(), layer.tag, layer.position);
        if let Some(follow) = layer.follow {
            world.parallax_follow.insert(entity, follow);
        } else {
            let unresolved = ParallaxLayer {
                factor: layer.factor.unwrap_or(-1.0),
            };
            world.parallax_layers.insert(entity, unresolved.resolved(layer.tag));
        }
    }
    if !world.parallax_layers.is_empty() {
        world.camera = Some(ParallaxCamera::new(desc.player.spawn));
    }

    if let Some(settings) = &desc.enemy_manager {
        world.enemy_manager = Some(EnemyManager::new(settings.clone()));
    }
    for enemy in &desc.enemies {
        spawn_enemy(world, enemy);
    }

    if let Some(clip) = &desc.music {
        let music = world.audio.music_mut(MusicChannel::Level);
        music.clip = Some(clip.clone());
        music.volume = 1.0;
        music.play();
    } else {
        debug!(scene = %desc.scene, "scene has no music");
    }

    if let Some(settings) = &desc.level {
        world.level = Some(LevelManager::new(settings.clone()));
        with_level(world, |level, world| level.start(world));
    } else if !desc.garbage.is_empty() {
        warn!(scene = %desc.scene, "garbage placed without level rules");
    }

    info!(
        scene = %desc.scene,
        %player,
        entities = world.entity_count(),
        colliders = world.physics.collider_count(),
        "scene loaded"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::manager::LevelState;

    fn minimal(scene: &str) -> LevelDesc {
        LevelDesc {
            scene: scene.to_string(),
            ground: vec![GroundDesc {
                center: Vec2::new(0.0, -1.0),
                size: Vec2::new(40.0, 2.0),
            }],
            ..LevelDesc::default()
        }
    }

    #[test]
    fn test_demo_level_parses_and_validates() {
        let demo = LevelDesc::demo().unwrap();
        assert!(!demo.scene.is_empty());
        assert!(!demo.enemies.is_empty());
        assert!(demo.level.is_some());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let desc = LevelDesc::from_json(r#"{ "scene": "Empty" }"#).unwrap();
        assert_eq!(desc.player, PlayerDesc::default());
        assert!(desc.level.is_none());
    }

    #[test]
    fn test_validation_errors() {
        let mut desc = minimal("Broken");
        desc.ground[0].size = Vec2::new(0.0, 1.0);
        assert!(matches!(desc.validate(), Err(LevelError::Invalid { .. })));

        let mut desc = minimal("Portals");
        desc.triggers.push(TriggerDesc {
            name: "A".to_string(),
            position: Vec2::ZERO,
            size: Vec2::ONE,
            kind: TriggerKind::Portal {
                destination: "Nowhere".to_string(),
                cooldown: 1.0,
            },
        });
        assert!(desc.validate().is_err());

        let mut desc = minimal("Crates");
        desc.dispensers.push(DispenserDesc {
            position: Vec2::ZERO,
            settings: BoxDispenserSettings {
                spawn_interval: 0.0,
                ..Default::default()
            },
        });
        assert!(desc.validate().is_err());

        assert!(matches!(LevelDesc::from_json("{"), Err(LevelError::Parse(_))));
        assert!(matches!(LevelDesc::from_json("{}"), Err(LevelError::Invalid { .. })));
    }

    #[test]
    fn test_load_builds_world() {
        let mut desc = minimal("Forest");
        desc.garbage = vec![Vec2::new(3.0, 0.5), Vec2::new(6.0, 0.5)];
        desc.enemies = vec![EnemyDesc::skeleton("Skeleton", Vec2::new(8.0, 0.0))];
        desc.level = Some(LevelSettings::default());
        desc.music = Some("forest".to_string());
        desc.dispensers = vec![DispenserDesc {
            position: Vec2::new(-4.0, 6.0),
            settings: BoxDispenserSettings::default(),
        }];
        let mut catalog = SceneCatalog::new();
        catalog.insert(desc);

        let mut world = GameWorld::default();
        load_scene(&mut world, &catalog, "Forest").unwrap();
        assert_eq!(world.scene, "Forest");
        assert!(world.player().is_some());
        assert_eq!(world.entities_with_tag(Tag::Garbage).len(), 2);
        assert_eq!(world.enemies.len(), 1);
        assert_eq!(world.dispensers.len(), 1);
        assert_eq!(world.level.as_ref().map(LevelManager::state), Some(LevelState::Ready));
        assert!(world.audio.music(MusicChannel::Level).playing);
        assert!(world.physics.raycast(Vec2::new(0.0, 2.0), Vec2::NEG_Y, 5.0, Layers::GROUND).is_some());
    }

    #[test]
    fn test_reload_replaces_scene() {
        let mut catalog = SceneCatalog::new();
        catalog.insert(minimal("Forest"));
        let mut world = GameWorld::default();
        load_scene(&mut world, &catalog, "Forest").unwrap();
        let first = world.player();
        load_scene(&mut world, &catalog, "Forest").unwrap();
        assert_eq!(world.entities_with_tag(Tag::Player).len(), 1);
        assert_ne!(world.player(), first);
    }

    #[test]
    fn test_screens_and_unknown_scenes() {
        let catalog = SceneCatalog::new();
        let mut world = GameWorld::default();
        load_scene(&mut world, &catalog, "DeathScene").unwrap();
        assert_eq!(world.scene, "DeathScene");
        assert_eq!(world.entity_count(), 0);
        assert!(matches!(
            load_scene(&mut world, &catalog, "Atlantis"),
            Err(LevelError::UnknownScene(_))
        ));
    }
}
