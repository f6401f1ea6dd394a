//! Trigger volumes the player walks into, and NPCs that talk when the
//! player comes close.
//!
//! A trigger is an entity with a non-solid collider on the `TRIGGER` layer.
//! The player's overlap tracker reports enter and exit; the overlap system
//! hands them to [`on_player_enter`] and [`on_player_exit`].

use darkwood_component::{Component, Entity};
use darkwood_math::Aabb;
use darkwood_physics::Layers;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::audio::MusicChannel;
use crate::events::GameEvent;
use crate::level::dialogue::start_dialogue;
use crate::scene::{GroundDesc, spawn_ground};
use crate::world::{GameWorld, Tag};

/// Ground layout that a section-end trigger copies ahead of the player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionDesc {
    /// Ground relative to the section origin.
    pub ground: Vec<GroundDesc>,
    /// Where the current section starts.
    pub origin: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerKind {
    /// Load another scene.
    LevelExit { next_scene: String },
    /// Send the player to the trigger named `destination`.
    Portal {
        destination: String,
        #[serde(default = "default_portal_cooldown")]
        cooldown: f32,
    },
    /// Put the player back at `respawn_point`.
    Respawn { respawn_point: Vec2 },
    /// Build the next section once, then disappear.
    SectionEnd {
        section: SectionDesc,
        #[serde(default = "default_section_width")]
        section_width: f32,
    },
    /// Play a clip on the zone channel while the player is inside.
    Music {
        clip: String,
        #[serde(default = "default_volume")]
        volume: f32,
        #[serde(default = "default_true")]
        play_only_once: bool,
    },
    /// Swap the level music for the zone music while the player is inside.
    MusicZone { clip: String },
}

fn default_portal_cooldown() -> f32 {
    1.0
}

fn default_section_width() -> f32 {
    86.5
}

fn default_volume() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub kind: TriggerKind,
    /// Level exits have started loading; sections have spawned; music has
    /// played.
    pub fired: bool,
    /// Portals teleport again from this time on.
    pub ready_at: f32,
}

impl Trigger {
    #[must_use]
    pub fn new(kind: TriggerKind) -> Self {
        Self {
            kind,
            fired: false,
            ready_at: 0.0,
        }
    }
}

impl Component for Trigger {
    fn type_name() -> &'static str {
        "Trigger"
    }
}

/// A trigger volume in a level file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDesc {
    pub name: String,
    pub position: Vec2,
    #[serde(default = "default_trigger_size")]
    pub size: Vec2,
    #[serde(flatten)]
    pub kind: TriggerKind,
}

fn default_trigger_size() -> Vec2 {
    Vec2::splat(2.0)
}

pub fn spawn_trigger(world: &mut GameWorld, desc: &TriggerDesc) -> Entity {
    let entity = world.spawn_at(desc.name.clone(), Tag::Untagged, desc.position);
    world.physics.attach(
        entity,
        Aabb::from_center_size(desc.position, desc.size),
        Layers::TRIGGER,
        false,
    );
    world.triggers.insert(entity, Trigger::new(desc.kind.clone()));
    debug!(trigger = %entity, name = %desc.name, "trigger spawned");
    entity
}

fn with_trigger<R>(world: &mut GameWorld, entity: Entity, f: impl FnOnce(&mut Trigger, &mut GameWorld) -> R) -> Option<R> {
    let mut trigger = world.triggers.remove(entity)?;
    let result = f(&mut trigger, world);
    if world.is_alive(entity) {
        world.triggers.insert(entity, trigger);
    }
    Some(result)
}

/// The player entered `trigger`.
pub fn on_player_enter(world: &mut GameWorld, trigger: Entity, player: Entity) {
    with_trigger(world, trigger, |t, world| {
        let now = world.clock.time;
        match t.kind.clone() {
            TriggerKind::LevelExit { next_scene } => {
                if t.fired {
                    return;
                }
                if next_scene.is_empty() {
                    error!(%trigger, "level exit is missing the next scene name");
                    return;
                }
                info!(%trigger, scene = %next_scene, "player reached the level exit");
                t.fired = true;
                world.request_scene(next_scene);
            }
            TriggerKind::Portal { destination, cooldown } => {
                if now < t.ready_at {
                    return;
                }
                let Some(target) = world.find_by_name(&destination) else {
                    warn!(%trigger, destination = %destination, "portal destination not found");
                    return;
                };
                let Some(to) = world.position(target) else {
                    return;
                };
                world.set_position(player, to);
                world.emit(GameEvent::Teleported { entity: player, to });
                t.ready_at = now + cooldown;
                if let Some(other) = world.triggers.get_mut(target)
                    && matches!(other.kind, TriggerKind::Portal { .. })
                {
                    other.ready_at = now + cooldown;
                }
            }
            TriggerKind::Respawn { respawn_point } => {
                debug!(%player, "respawned");
                world.teleport(player, respawn_point);
                world.emit(GameEvent::Teleported {
                    entity: player,
                    to: respawn_point,
                });
            }
            TriggerKind::SectionEnd { section, section_width } => {
                if t.fired {
                    return;
                }
                t.fired = true;
                let offset = Vec2::new(section_width, 0.0);
                let next = SectionDesc {
                    ground: section.ground,
                    origin: section.origin + offset,
                };
                for ground in &next.ground {
                    spawn_ground(world, ground, next.origin);
                }
                if let Some(position) = world.position(trigger) {
                    let size = world
                        .physics
                        .collider_of(trigger)
                        .map_or(default_trigger_size(), |c| c.aabb.half_extents * 2.0);
                    spawn_trigger(
                        world,
                        &TriggerDesc {
                            name: "SectionEnd".to_string(),
                            position: position + offset,
                            size,
                            kind: TriggerKind::SectionEnd {
                                section: next.clone(),
                                section_width,
                            },
                        },
                    );
                }
                world.emit(GameEvent::SectionSpawned { position: next.origin });
                world.destroy(trigger, 0.0);
            }
            TriggerKind::Music {
                clip,
                volume,
                play_only_once,
            } => {
                if t.fired && play_only_once {
                    debug!(%trigger, "music already played");
                    return;
                }
                let music = world.audio.music_mut(MusicChannel::Zone);
                music.stop();
                music.clip = Some(clip.clone());
                music.volume = volume;
                music.play();
                info!(clip = %clip, volume, "music triggered");
                if play_only_once {
                    t.fired = true;
                }
            }
            TriggerKind::MusicZone { clip } => {
                world.audio.music_mut(MusicChannel::Level).pause();
                let zone = world.audio.music_mut(MusicChannel::Zone);
                zone.clip = Some(clip);
                zone.play();
            }
        }
    });
}

/// The player left `trigger`.
pub fn on_player_exit(world: &mut GameWorld, trigger: Entity) {
    let Some(t) = world.triggers.get(trigger) else {
        return;
    };
    match t.kind {
        TriggerKind::Music { .. } => world.audio.music_mut(MusicChannel::Zone).stop(),
        TriggerKind::MusicZone { .. } => {
            world.audio.music_mut(MusicChannel::Zone).stop();
            world.audio.music_mut(MusicChannel::Level).play();
        }
        _ => {}
    }
}

/// An NPC that starts a dialogue when the player comes within `radius`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcTrigger {
    pub lines: Vec<String>,
    pub radius: f32,
    #[serde(skip)]
    pub player_in_range: bool,
}

impl Default for NpcTrigger {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            radius: 2.0,
            player_in_range: false,
        }
    }
}

impl Component for NpcTrigger {
    fn type_name() -> &'static str {
        "NpcTrigger"
    }
}

/// Start dialogues for NPCs the player just walked up to.
pub fn update_npcs(world: &mut GameWorld) {
    let Some(player) = world.player().and_then(|p| world.position(p)) else {
        return;
    };
    for npc in world.npcs.entities() {
        let Some(position) = world.position(npc) else {
            continue;
        };
        let in_range = position.distance(player) <= world.npcs.get(npc).map_or(0.0, |n| n.radius);
        let Some(trigger) = world.npcs.get_mut(npc) else {
            continue;
        };
        if !in_range {
            trigger.player_in_range = false;
            continue;
        }
        if !trigger.player_in_range {
            trigger.player_in_range = true;
            let lines = trigger.lines.clone();
            start_dialogue(world, lines);
        }
    }
}
