//! Enter/exit bookkeeping for collisions and trigger overlaps.
//!
//! The physics step reports the contacts that exist right now. Gameplay code
//! reacts to changes, so trackers keep the previous set and diff it. Exits
//! are reported before enters so a body walking from one ground tile onto
//! the next ends the step grounded.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use darkwood_component::{Component, Entity};
use glam::Vec2;

use crate::world::{ColliderId, Contact, HitTarget};

/// A change in the solid contacts of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionEvent {
    Enter { target: HitTarget, normal: Vec2 },
    Exit { target: HitTarget },
}

/// Remembers which colliders touched a body on the previous step.
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    touching: BTreeMap<ColliderId, HitTarget>,
}

impl ContactTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff this step's contacts against the previous step's.
    ///
    /// A collider touching on several sides reports the first normal seen.
    pub fn update(&mut self, contacts: &[Contact]) -> Vec<CollisionEvent> {
        let mut now: BTreeMap<ColliderId, (HitTarget, Vec2)> = BTreeMap::new();
        for c in contacts {
            now.entry(c.target.collider).or_insert((c.target, c.normal));
        }

        let mut events = Vec::new();
        for (id, target) in &self.touching {
            if !now.contains_key(id) {
                events.push(CollisionEvent::Exit { target: *target });
            }
        }
        for (id, (target, normal)) in &now {
            if !self.touching.contains_key(id) {
                events.push(CollisionEvent::Enter {
                    target: *target,
                    normal: *normal,
                });
            }
        }
        self.touching = now.into_iter().map(|(id, (t, _))| (id, t)).collect();
        events
    }

    #[must_use]
    pub fn is_touching(&self, collider: ColliderId) -> bool {
        self.touching.contains_key(&collider)
    }

    /// Forget every contact without reporting exits.
    pub fn clear(&mut self) {
        self.touching.clear();
    }
}

impl Component for ContactTracker {
    fn type_name() -> &'static str {
        "ContactTracker"
    }
}

/// A change in the set of trigger volumes an entity is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapEvent {
    Enter(Entity),
    Exit(Entity),
}

/// Remembers which trigger entities overlapped on the previous check.
#[derive(Debug, Clone, Default)]
pub struct OverlapTracker {
    inside: BTreeSet<Entity>,
}

impl OverlapTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff the current overlaps against the previous call.
    pub fn update(&mut self, current: impl IntoIterator<Item = Entity>) -> Vec<OverlapEvent> {
        let now: BTreeSet<Entity> = current.into_iter().collect();
        let mut events: Vec<OverlapEvent> = self.inside.difference(&now).map(|e| OverlapEvent::Exit(*e)).collect();
        events.extend(now.difference(&self.inside).map(|e| OverlapEvent::Enter(*e)));
        self.inside = now;
        events
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.inside.contains(&entity)
    }

    /// Forget a trigger without reporting an exit (it was destroyed).
    pub fn forget(&mut self, entity: Entity) {
        self.inside.remove(&entity);
    }
}

impl Component for OverlapTracker {
    fn type_name() -> &'static str {
        "OverlapTracker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Layers;

    fn contact(id: u32, normal: Vec2) -> Contact {
        Contact {
            target: HitTarget {
                collider: ColliderId(id),
                entity: None,
                layer: Layers::GROUND,
            },
            normal,
        }
    }

    #[test]
    fn test_enter_then_steady_then_exit() {
        let mut tracker = ContactTracker::new();
        let events = tracker.update(&[contact(1, Vec2::Y)]);
        assert!(matches!(events.as_slice(), [CollisionEvent::Enter { normal, .. }] if *normal == Vec2::Y));
        assert!(tracker.update(&[contact(1, Vec2::Y)]).is_empty());
        assert!(tracker.is_touching(ColliderId(1)));
        let events = tracker.update(&[]);
        assert!(matches!(events.as_slice(), [CollisionEvent::Exit { .. }]));
    }

    #[test]
    fn test_exit_reported_before_enter() {
        let mut tracker = ContactTracker::new();
        tracker.update(&[contact(1, Vec2::Y)]);
        let events = tracker.update(&[contact(2, Vec2::Y)]);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], CollisionEvent::Exit { target } if target.collider == ColliderId(1)));
        assert!(matches!(events[1], CollisionEvent::Enter { target, .. } if target.collider == ColliderId(2)));
    }

    #[test]
    fn test_overlap_tracker() {
        let mut tracker = OverlapTracker::new();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        assert_eq!(tracker.update([a]), vec![OverlapEvent::Enter(a)]);
        assert!(tracker.update([a]).is_empty());
        assert_eq!(tracker.update([b]), vec![OverlapEvent::Exit(a), OverlapEvent::Enter(b)]);
        tracker.forget(b);
        assert!(!tracker.contains(b));
        assert_eq!(tracker.update([b]), vec![OverlapEvent::Enter(b)]);
    }
}
