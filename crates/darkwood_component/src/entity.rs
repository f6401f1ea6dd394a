//! Entity handles.
//!
//! A handle packs the number of the scene it was spawned in (high 32 bits)
//! with its slot inside that scene (low 32 bits). Each scene load starts a
//! new scene number, so a handle that outlives its scene (held by a timed
//! routine, a dialogue or an event) never matches anything spawned later.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    #[must_use]
    pub const fn new(scene: u32, slot: u32) -> Self {
        Self(((scene as u64) << 32) | slot as u64)
    }

    #[must_use]
    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    /// The packed bits, as stored in component maps and logs.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Number of the scene this entity was spawned in.
    #[must_use]
    pub const fn scene(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[must_use]
    pub const fn slot(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.scene(), self.slot())
    }
}

/// Hands out entity handles for the scene currently loaded.
#[derive(Debug)]
pub struct EntityAllocator {
    scene: u32,
    next_slot: u32,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self { scene: 0, next_slot: 1 }
    }

    pub fn allocate(&mut self) -> Entity {
        let entity = Entity::new(self.scene, self.next_slot);
        self.next_slot += 1;
        entity
    }

    /// Start handing out handles for a freshly loaded scene. Slots restart
    /// at 1.
    pub fn begin_scene(&mut self) {
        self.scene = self.scene.wrapping_add(1);
        self.next_slot = 1;
    }

    #[must_use]
    pub fn scene(&self) -> u32 {
        self.scene
    }

    /// Whether `entity` belongs to the current scene.
    #[must_use]
    pub fn is_current(&self, entity: Entity) -> bool {
        entity.scene() == self.scene
    }

    /// Handles allocated in the current scene.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.next_slot - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_and_slot_are_packed() {
        let e = Entity::new(3, 17);
        assert_eq!(e.scene(), 3);
        assert_eq!(e.slot(), 17);
        assert_eq!(Entity::from_raw(e.id()), e);
        assert_eq!(e.to_string(), "3#17");
    }

    #[test]
    fn test_slots_restart_per_scene() {
        let mut alloc = EntityAllocator::new();
        let first = alloc.allocate();
        alloc.allocate();
        assert_eq!(alloc.count(), 2);

        alloc.begin_scene();
        assert_eq!(alloc.count(), 0);
        let reloaded = alloc.allocate();
        assert_eq!(reloaded.slot(), first.slot());
        assert_ne!(reloaded, first);
        assert!(alloc.is_current(reloaded));
        assert!(!alloc.is_current(first));
    }

    #[test]
    fn test_handle_serializes_as_number() {
        let json = serde_json::to_string(&Entity::new(1, 2)).unwrap();
        assert_eq!(json, ((1u64 << 32) | 2).to_string());
    }
}
