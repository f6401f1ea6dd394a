//! Parallax scrolling.
//!
//! Two schemes coexist. A [`ParallaxCamera`] follows the player and shifts
//! every [`ParallaxLayer`] against its own motion; a [`ParallaxFollow`]
//! entity instead moves along with the player at its own speed.

use darkwood_component::Component;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::world::{GameWorld, Tag};

/// Camera moves smaller than this leave the layers alone.
const MIN_CAMERA_DELTA: f32 = 0.0001;

#[derive(Debug, Clone, PartialEq)]
pub struct ParallaxCamera {
    pub position: Vec2,
    old_x: f32,
}

impl ParallaxCamera {
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            old_x: position.x,
        }
    }

    /// Horizontal motion since the last call.
    pub fn take_delta(&mut self) -> f32 {
        let delta = self.position.x - self.old_x;
        self.old_x = self.position.x;
        delta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxLayer {
    /// Negative means unset; resolved from the layer's tag on spawn.
    pub factor: f32,
}

impl Default for ParallaxLayer {
    fn default() -> Self {
        Self { factor: -1.0 }
    }
}

impl ParallaxLayer {
    /// Fill in an unset factor from the layer's tag.
    #[must_use]
    pub fn resolved(self, tag: Tag) -> Self {
        if self.factor >= 0.0 {
            return self;
        }
        let factor = match tag {
            Tag::Midground => 0.5,
            Tag::Background => 0.8,
            _ => 0.2,
        };
        Self { factor }
    }
}

impl Component for ParallaxLayer {
    fn type_name() -> &'static str {
        "ParallaxLayer"
    }
}

/// Moves with the player's horizontal motion scaled by `speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxFollow {
    pub speed: f32,
    #[serde(skip)]
    pub last_player_x: Option<f32>,
}

impl Default for ParallaxFollow {
    fn default() -> Self {
        Self {
            speed: 1.0,
            last_player_x: None,
        }
    }
}

impl Component for ParallaxFollow {
    fn type_name() -> &'static str {
        "ParallaxFollow"
    }
}

/// Camera follow and layer shifting. Runs late, after the player moved.
pub fn update_parallax_camera(world: &mut GameWorld) {
    let player = world.player().and_then(|p| world.position(p));
    let Some(camera) = world.camera.as_mut() else {
        return;
    };
    if let Some(player) = player {
        camera.position = player;
    }
    let delta = camera.take_delta();
    if delta.abs() <= MIN_CAMERA_DELTA {
        return;
    }
    for layer in world.parallax_layers.entities() {
        if !world.is_active(layer) {
            continue;
        }
        let factor = world.parallax_layers.get(layer).map_or(0.0, |l| l.factor);
        if let Some(position) = world.position(layer) {
            world.set_position(layer, position - Vec2::new(delta * factor, 0.0));
        }
    }
}

pub fn update_parallax_follow(world: &mut GameWorld) {
    let Some(player_x) = world.player().and_then(|p| world.position(p)).map(|p| p.x) else {
        return;
    };
    for entity in world.parallax_follow.entities() {
        let Some(follow) = world.parallax_follow.get_mut(entity) else {
            continue;
        };
        let last = follow.last_player_x.replace(player_x).unwrap_or(player_x);
        let dx = (player_x - last) * follow.speed;
        if let Some(position) = world.position(entity) {
            world.set_position(entity, position + Vec2::new(dx, 0.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_factor_resolves_by_tag() {
        let unset = ParallaxLayer::default();
        assert_eq!(unset.resolved(Tag::Foreground).factor, 0.2);
        assert_eq!(unset.resolved(Tag::Midground).factor, 0.5);
        assert_eq!(unset.resolved(Tag::Background).factor, 0.8);
        assert_eq!(unset.resolved(Tag::Untagged).factor, 0.2);
        assert_eq!(ParallaxLayer { factor: 0.0 }.resolved(Tag::Background).factor, 0.0);
    }

    #[test]
    fn test_layers_shift_against_camera() {
        let mut world = GameWorld::default();
        let player = world.spawn_at("Player", Tag::Player, Vec2::ZERO);
        let layer = world.spawn_at("Hills", Tag::Background, Vec2::new(0.0, 3.0));
        world
            .parallax_layers
            .insert(layer, ParallaxLayer::default().resolved(Tag::Background));
        world.camera = Some(ParallaxCamera::new(Vec2::ZERO));

        world.set_position(player, Vec2::new(2.0, 0.0));
        update_parallax_camera(&mut world);
        let moved = world.position(layer).unwrap();
        assert!((moved.x + 1.6).abs() < 1e-5);
        assert_eq!(moved.y, 3.0);

        update_parallax_camera(&mut world);
        assert_eq!(world.position(layer), Some(moved));
    }

    #[test]
    fn test_follow_tracks_player_dx() {
        let mut world = GameWorld::default();
        let player = world.spawn_at("Player", Tag::Player, Vec2::ZERO);
        let sky = world.spawn_at("Sky", Tag::Untagged, Vec2::new(0.0, 5.0));
        world.parallax_follow.insert(sky, ParallaxFollow {
            speed: 0.5,
            last_player_x: None,
        });
        update_parallax_follow(&mut world);
        world.set_position(player, Vec2::new(4.0, 0.0));
        update_parallax_follow(&mut world);
        assert_eq!(world.position(sky), Some(Vec2::new(2.0, 5.0)));
    }
}
