//! Collider storage, spatial queries and the body step.
//!
//! Colliders are either static level geometry (no owner) or attached to an
//! entity. Entity colliders follow their entity: the body step moves them,
//! and [`PhysicsWorld::set_center`] moves colliders of entities without a body.
//!
//! Ray queries skip trigger colliders. Overlap queries see every enabled
//! collider that passes the layer mask.

use std::collections::BTreeMap;

use darkwood_component::Entity;
use darkwood_math::{Aabb, Ray2, Transform2D};
use glam::Vec2;
use tracing::debug;

use crate::body::{Body, BodyKind};
use crate::layers::Layers;

/// Distance used to detect resting contact after a move.
const CONTACT_SKIN: f32 = 0.01;

/// Standard gravity in world units per second squared.
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, -9.81);

/// Handle of a collider in a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u32);

/// A box volume in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub aabb: Aabb,
    pub layer: Layers,
    pub owner: Option<Entity>,
    /// Solid colliders block bodies; triggers only report overlaps.
    pub solid: bool,
    pub enabled: bool,
}

/// What a query found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HitTarget {
    pub collider: ColliderId,
    pub entity: Option<Entity>,
    pub layer: Layers,
}

/// Result of a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
    pub target: HitTarget,
}

/// A solid collider touching a body after its step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub target: HitTarget,
    /// Points from the touched collider toward the body.
    pub normal: Vec2,
}

/// All colliders of a level plus the global gravity.
#[derive(Debug)]
pub struct PhysicsWorld {
    pub gravity: Vec2,
    colliders: BTreeMap<ColliderId, Collider>,
    by_entity: BTreeMap<Entity, ColliderId>,
    next_id: u32,
}

impl PhysicsWorld {
    #[must_use]
    pub fn new() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            colliders: BTreeMap::new(),
            by_entity: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn insert(&mut self, collider: Collider) -> ColliderId {
        let id = ColliderId(self.next_id);
        self.next_id += 1;
        self.colliders.insert(id, collider);
        id
    }

    /// Add static solid level geometry.
    pub fn add_static(&mut self, aabb: Aabb, layer: Layers) -> ColliderId {
        self.insert(Collider {
            aabb,
            layer,
            owner: None,
            solid: true,
            enabled: true,
        })
    }

    /// Give `entity` a collider, replacing any previous one.
    pub fn attach(&mut self, entity: Entity, aabb: Aabb, layer: Layers, solid: bool) -> ColliderId {
        self.detach(entity);
        let id = self.insert(Collider {
            aabb,
            layer,
            owner: Some(entity),
            solid,
            enabled: true,
        });
        self.by_entity.insert(entity, id);
        debug!(%entity, collider = id.0, ?layer, solid, "collider attached");
        id
    }

    /// Remove the collider owned by `entity`.
    pub fn detach(&mut self, entity: Entity) -> bool {
        match self.by_entity.remove(&entity) {
            Some(id) => self.colliders.remove(&id).is_some(),
            None => false,
        }
    }

    /// Remove a collider by id.
    pub fn remove(&mut self, id: ColliderId) -> Option<Collider> {
        let collider = self.colliders.remove(&id)?;
        if let Some(owner) = collider.owner {
            self.by_entity.remove(&owner);
        }
        Some(collider)
    }

    #[must_use]
    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    #[must_use]
    pub fn collider_of(&self, entity: Entity) -> Option<&Collider> {
        self.by_entity.get(&entity).and_then(|id| self.colliders.get(id))
    }

    /// Move the collider owned by `entity` so it is centred on `center`.
    pub fn set_center(&mut self, entity: Entity, center: Vec2) {
        if let Some(c) = self.by_entity.get(&entity).and_then(|id| self.colliders.get_mut(id)) {
            c.aabb.center = center;
        }
    }

    /// Enable or disable the collider owned by `entity`.
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) {
        if let Some(c) = self.by_entity.get(&entity).and_then(|id| self.colliders.get_mut(id)) {
            c.enabled = enabled;
        }
    }

    #[must_use]
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.collider_of(entity).is_some_and(|c| c.enabled)
    }

    /// Number of colliders, enabled or not.
    #[must_use]
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Drop every collider.
    pub fn clear(&mut self) {
        self.colliders.clear();
        self.by_entity.clear();
    }

    fn candidates(&self, mask: Layers) -> impl Iterator<Item = (ColliderId, &Collider)> {
        self.colliders
            .iter()
            .filter(move |(_, c)| c.enabled && c.layer.matches(mask))
            .map(|(id, c)| (*id, c))
    }

    fn target(id: ColliderId, c: &Collider) -> HitTarget {
        HitTarget {
            collider: id,
            entity: c.owner,
            layer: c.layer,
        }
    }

    /// Nearest non-trigger collider along the ray. `direction` need not be
    /// normalised; a zero direction never hits.
    #[must_use]
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32, mask: Layers) -> Option<RaycastHit> {
        self.raycast_filtered(origin, direction, max_distance, mask, None)
    }

    /// Like [`raycast`](Self::raycast), ignoring the collider owned by `exclude`.
    #[must_use]
    pub fn raycast_excluding(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: Layers,
        exclude: Entity,
    ) -> Option<RaycastHit> {
        self.raycast_filtered(origin, direction, max_distance, mask, Some(exclude))
    }

    fn raycast_filtered(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: Layers,
        exclude: Option<Entity>,
    ) -> Option<RaycastHit> {
        let ray = Ray2::new(origin, direction)?;
        let mut best: Option<RaycastHit> = None;
        for (id, c) in self.candidates(mask) {
            if !c.solid || (exclude.is_some() && c.owner == exclude) {
                continue;
            }
            let Some(hit) = c.aabb.cast(&ray, max_distance) else {
                continue;
            };
            if best.is_none_or(|b| hit.distance < b.distance) {
                best = Some(RaycastHit {
                    point: hit.point,
                    normal: hit.normal,
                    distance: hit.distance,
                    target: Self::target(id, c),
                });
            }
        }
        best
    }

    /// First non-trigger collider on the segment `from -> to`.
    #[must_use]
    pub fn linecast(&self, from: Vec2, to: Vec2, mask: Layers) -> Option<RaycastHit> {
        let (ray, length) = Ray2::between(from, to)?;
        self.raycast(ray.origin, ray.direction, length, mask)
    }

    /// Every collider overlapping the circle, in collider order.
    #[must_use]
    pub fn overlap_circle(&self, center: Vec2, radius: f32, mask: Layers) -> Vec<HitTarget> {
        self.candidates(mask)
            .filter(|(_, c)| c.aabb.overlaps_circle(center, radius))
            .map(|(id, c)| Self::target(id, c))
            .collect()
    }

    /// Whether any collider other than `exclude`'s overlaps the circle.
    #[must_use]
    pub fn overlap_circle_any(&self, center: Vec2, radius: f32, mask: Layers, exclude: Option<Entity>) -> bool {
        self.candidates(mask)
            .any(|(_, c)| (exclude.is_none() || c.owner != exclude) && c.aabb.overlaps_circle(center, radius))
    }

    /// Every collider overlapping the box, in collider order.
    #[must_use]
    pub fn overlap_aabb(&self, aabb: &Aabb, mask: Layers) -> Vec<HitTarget> {
        self.candidates(mask)
            .filter(|(_, c)| c.aabb.intersects(aabb))
            .map(|(id, c)| Self::target(id, c))
            .collect()
    }

    /// The entity owning a collider that contains `point`, if any.
    #[must_use]
    pub fn entity_at_point(&self, point: Vec2, mask: Layers) -> Option<Entity> {
        self.candidates(mask)
            .filter(|(_, c)| c.aabb.contains_point(point))
            .find_map(|(_, c)| c.owner)
    }

    fn blockers(&self, body: &Body, entity: Entity) -> Vec<(ColliderId, Aabb, Layers, Option<Entity>)> {
        self.candidates(body.collides_with)
            .filter(|(_, c)| c.solid && c.owner != Some(entity))
            .map(|(id, c)| (id, c.aabb, c.layer, c.owner))
            .collect()
    }

    /// Advance one body by `dt`.
    ///
    /// Dynamic bodies integrate gravity and forces, then move along x and
    /// y separately, stopping at solid colliders on their `collides_with`
    /// layers. The returned contacts are every such collider touching the
    /// body after the move. Kinematic bodies move freely and report nothing.
    pub fn step_body(&mut self, entity: Entity, transform: &mut Transform2D, body: &mut Body, dt: f32) -> Vec<Contact> {
        if !body.simulated {
            return Vec::new();
        }
        body.integrate(self.gravity, dt);

        if body.kind == BodyKind::Kinematic {
            transform.position += body.velocity * dt;
            self.set_center(entity, transform.position);
            return Vec::new();
        }

        let blockers = self.blockers(body, entity);
        let mut me = Aabb::new(transform.position, body.half_extents);

        let dx = body.velocity.x * dt;
        if dx != 0.0 {
            me = me.translated(Vec2::new(dx, 0.0));
            for (_, other, _, _) in &blockers {
                if me.intersects(other) {
                    me.center.x = if dx > 0.0 {
                        other.min().x - me.half_extents.x
                    } else {
                        other.max().x + me.half_extents.x
                    };
                    body.velocity.x = -body.velocity.x * body.bounciness;
                }
            }
        }

        let dy = body.velocity.y * dt;
        if dy != 0.0 {
            me = me.translated(Vec2::new(0.0, dy));
            for (_, other, _, _) in &blockers {
                if me.intersects(other) {
                    me.center.y = if dy > 0.0 {
                        other.min().y - me.half_extents.y
                    } else {
                        other.max().y + me.half_extents.y
                    };
                    body.velocity.y = -body.velocity.y * body.bounciness;
                }
            }
        }

        transform.position = me.center;
        self.set_center(entity, me.center);

        let skins = [
            (Vec2::new(0.0, -CONTACT_SKIN), Vec2::Y),
            (Vec2::new(0.0, CONTACT_SKIN), Vec2::NEG_Y),
            (Vec2::new(CONTACT_SKIN, 0.0), Vec2::NEG_X),
            (Vec2::new(-CONTACT_SKIN, 0.0), Vec2::X),
        ];
        let mut contacts = Vec::new();
        for (id, other, layer, owner) in &blockers {
            for (offset, normal) in skins {
                if me.translated(offset).intersects(other) && !me.intersects(other) {
                    contacts.push(Contact {
                        target: HitTarget {
                            collider: *id,
                            entity: *owner,
                            layer: *layer,
                        },
                        normal,
                    });
                }
            }
        }
        contacts
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ForceMode;

    const DT: f32 = 0.02;

    fn level() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        // floor with its top at y = 0
        world.add_static(Aabb::from_min_max(Vec2::new(-20.0, -1.0), Vec2::new(20.0, 0.0)), Layers::GROUND);
        // wall from x = 5 to 6
        world.add_static(Aabb::from_min_max(Vec2::new(5.0, 0.0), Vec2::new(6.0, 10.0)), Layers::GROUND);
        world
    }

    fn player_body() -> Body {
        Body::dynamic(Vec2::new(0.4, 0.9), Layers::PLAYER)
    }

    #[test]
    fn test_body_falls_and_lands() {
        let mut world = level();
        let e = Entity::from_raw(1);
        let mut t = Transform2D::from_position(Vec2::new(0.0, 3.0));
        let mut body = player_body();
        let mut contacts = Vec::new();
        for _ in 0..200 {
            contacts = world.step_body(e, &mut t, &mut body, DT);
        }
        assert!((t.position.y - 0.9).abs() < 1e-4);
        assert!(contacts.iter().any(|c| c.normal == Vec2::Y));
    }

    #[test]
    fn test_resting_contact_persists() {
        let mut world = level();
        let e = Entity::from_raw(1);
        let mut t = Transform2D::from_position(Vec2::new(0.0, 0.9));
        let mut body = player_body();
        for _ in 0..10 {
            let contacts = world.step_body(e, &mut t, &mut body, DT);
            assert_eq!(contacts.len(), 1);
            assert_eq!(contacts[0].normal, Vec2::Y);
        }
    }

    #[test]
    fn test_wall_blocks_and_reports_normal() {
        let mut world = level();
        let e = Entity::from_raw(1);
        let mut t = Transform2D::from_position(Vec2::new(4.0, 0.9));
        let mut body = player_body();
        let mut contacts = Vec::new();
        for _ in 0..30 {
            body.velocity.x = 8.0;
            contacts = world.step_body(e, &mut t, &mut body, DT);
        }
        assert!((t.position.x - 4.6).abs() < 1e-4);
        assert!(contacts.iter().any(|c| c.normal == Vec2::NEG_X));
    }

    #[test]
    fn test_bounciness_reflects_velocity() {
        let mut world = level();
        let e = Entity::from_raw(2);
        let mut t = Transform2D::from_position(Vec2::new(0.0, 0.3));
        let mut body = Body::dynamic(Vec2::splat(0.2), Layers::PROJECTILE)
            .with_gravity_scale(0.0)
            .with_bounciness(1.0);
        body.velocity = Vec2::new(0.0, -10.0);
        world.step_body(e, &mut t, &mut body, DT);
        assert!(body.velocity.y > 0.0);
    }

    #[test]
    fn test_kinematic_moves_through_walls() {
        let mut world = level();
        let e = Entity::from_raw(3);
        let mut t = Transform2D::from_position(Vec2::new(4.0, 2.0));
        let mut body = Body::kinematic(Vec2::splat(0.4), Layers::ENEMY);
        body.velocity = Vec2::new(100.0, 0.0);
        let contacts = world.step_body(e, &mut t, &mut body, DT);
        assert!(contacts.is_empty());
        assert!((t.position.x - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_force_jump() {
        let mut world = level();
        let e = Entity::from_raw(1);
        let mut t = Transform2D::from_position(Vec2::new(0.0, 0.9));
        let mut body = player_body();
        body.add_force(Vec2::new(0.0, 400.0), ForceMode::Force);
        world.step_body(e, &mut t, &mut body, DT);
        assert!(body.velocity.y > 7.0);
        assert!(t.position.y > 0.9);
    }

    #[test]
    fn test_raycast_nearest_and_mask() {
        let mut world = level();
        let enemy = Entity::from_raw(9);
        world.attach(enemy, Aabb::from_center_size(Vec2::new(2.0, 1.0), Vec2::ONE), Layers::ENEMY, true);

        let hit = world.raycast(Vec2::new(0.0, 1.0), Vec2::X, 20.0, Layers::ALL).unwrap();
        assert_eq!(hit.target.entity, Some(enemy));
        assert!((hit.distance - 1.5).abs() < 1e-5);

        let hit = world
            .raycast(Vec2::new(0.0, 1.0), Vec2::X, 20.0, Layers::ALL - Layers::ENEMY)
            .unwrap();
        assert_eq!(hit.target.entity, None);
        assert!((hit.distance - 5.0).abs() < 1e-5);

        let hit = world
            .raycast_excluding(Vec2::new(0.0, 1.0), Vec2::X, 20.0, Layers::ALL, enemy)
            .unwrap();
        assert_eq!(hit.target.layer, Layers::GROUND);
    }

    #[test]
    fn test_raycast_skips_triggers_and_disabled() {
        let mut world = PhysicsWorld::new();
        let pickup = Entity::from_raw(4);
        let wall = Entity::from_raw(5);
        world.attach(pickup, Aabb::from_center_size(Vec2::new(2.0, 0.0), Vec2::ONE), Layers::PICKUP, false);
        world.attach(wall, Aabb::from_center_size(Vec2::new(4.0, 0.0), Vec2::ONE), Layers::GROUND, true);
        assert_eq!(
            world.raycast(Vec2::ZERO, Vec2::X, 10.0, Layers::ALL).map(|h| h.target.entity),
            Some(Some(wall))
        );
        world.set_enabled(wall, false);
        assert!(world.raycast(Vec2::ZERO, Vec2::X, 10.0, Layers::ALL).is_none());
    }

    #[test]
    fn test_linecast() {
        let world = level();
        assert!(world.linecast(Vec2::new(0.0, 2.0), Vec2::new(4.0, 2.0), Layers::GROUND).is_none());
        assert!(world.linecast(Vec2::new(0.0, 2.0), Vec2::new(8.0, 2.0), Layers::GROUND).is_some());
    }

    #[test]
    fn test_overlap_queries() {
        let mut world = level();
        let player = Entity::from_raw(1);
        world.attach(player, Aabb::from_center_size(Vec2::new(1.0, 0.9), Vec2::new(0.8, 1.8)), Layers::PLAYER, true);

        let hits = world.overlap_circle(Vec2::new(1.5, 1.0), 0.8, Layers::PLAYER);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, Some(player));

        assert!(world.overlap_circle_any(Vec2::new(0.0, 0.05), 0.2, Layers::GROUND, None));
        assert!(!world.overlap_circle_any(Vec2::new(1.0, 1.0), 0.2, Layers::PLAYER, Some(player)));

        let boxed = world.overlap_aabb(&Aabb::from_center_size(Vec2::new(5.5, 5.0), Vec2::ONE), Layers::ALL);
        assert_eq!(boxed.len(), 1);
        assert_eq!(world.entity_at_point(Vec2::new(1.0, 1.0), Layers::ALL), Some(player));
    }

    #[test]
    fn test_attach_replaces_and_detach() {
        let mut world = PhysicsWorld::new();
        let e = Entity::from_raw(1);
        world.attach(e, Aabb::from_center_size(Vec2::ZERO, Vec2::ONE), Layers::ENEMY, true);
        world.attach(e, Aabb::from_center_size(Vec2::ZERO, Vec2::ONE), Layers::ENEMY, true);
        assert_eq!(world.collider_count(), 1);
        world.set_center(e, Vec2::new(3.0, 0.0));
        assert_eq!(world.collider_of(e).map(|c| c.aabb.center), Some(Vec2::new(3.0, 0.0)));
        assert!(world.detach(e));
        assert!(!world.detach(e));
        assert_eq!(world.collider_count(), 0);
    }
}
