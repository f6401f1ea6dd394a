//! Axis-aligned boxes and the intersection tests physics queries are built on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ray::Ray2;

/// An axis-aligned box stored as center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

/// Where a ray enters a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the (normalised) ray direction.
    pub distance: f32,
    /// Contact point.
    pub point: Vec2,
    /// Surface normal at the contact point. Zero when the ray starts inside.
    pub normal: Vec2,
}

impl Aabb {
    #[must_use]
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Build a box from its center and full size.
    #[must_use]
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self::new(center, size * 0.5)
    }

    /// Build a box from two opposite corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.center + offset, self.half_extents)
    }

    /// Grow the box by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(self.center, self.half_extents + Vec2::splat(margin))
    }

    /// Strict overlap: touching edges do not count.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let r = self.half_extents + other.half_extents;
        d.x < r.x && d.y < r.y
    }

    #[must_use]
    pub fn contains_point(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y
    }

    /// The point of the box closest to `p`.
    #[must_use]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }

    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        self.closest_point(center).distance_squared(center) <= radius * radius
    }

    /// [`ray_intersection`](Self::ray_intersection) for a [`Ray2`].
    #[must_use]
    pub fn cast(&self, ray: &Ray2, max_distance: f32) -> Option<RayHit> {
        self.ray_intersection(ray.origin, ray.direction, max_distance)
    }

    /// Slab test. `direction` must be normalised; hits further than
    /// `max_distance` are ignored. A ray starting inside the box hits at
    /// distance zero.
    #[must_use]
    pub fn ray_intersection(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit> {
        if self.contains_point(origin) {
            return Some(RayHit {
                distance: 0.0,
                point: origin,
                normal: Vec2::ZERO,
            });
        }

        let min = self.min();
        let max = self.max();
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut normal = Vec2::ZERO;

        for axis in 0..2 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < f32::EPSILON {
                if o < min[axis] || o > max[axis] {
                    return None;
                }
                continue;
            }
            let mut t0 = (min[axis] - o) / d;
            let mut t1 = (max[axis] - o) / d;
            let mut n = Vec2::ZERO;
            n[axis] = -1.0;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
                n[axis] = 1.0;
            }
            if t0 > t_enter {
                t_enter = t0;
                normal = n;
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        if t_enter < 0.0 || t_enter > max_distance {
            return None;
        }
        Some(RayHit {
            distance: t_enter,
            point: origin + direction * t_enter,
            normal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground() -> Aabb {
        Aabb::from_center_size(Vec2::new(0.0, -0.5), Vec2::new(20.0, 1.0))
    }

    #[test]
    fn test_min_max_and_size() {
        let b = ground();
        assert_eq!(b.min(), Vec2::new(-10.0, -1.0));
        assert_eq!(b.max(), Vec2::new(10.0, 0.0));
        assert_eq!(b.size(), Vec2::new(20.0, 1.0));
        assert_eq!(Aabb::from_min_max(b.min(), b.max()), b);
    }

    #[test]
    fn test_intersects_is_strict() {
        let a = Aabb::from_center_size(Vec2::ZERO, Vec2::ONE);
        let touching = a.translated(Vec2::new(1.0, 0.0));
        let overlapping = a.translated(Vec2::new(0.5, 0.0));
        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
    }

    #[test]
    fn test_overlaps_circle() {
        let b = ground();
        assert!(b.overlaps_circle(Vec2::new(0.0, 0.15), 0.2));
        assert!(!b.overlaps_circle(Vec2::new(0.0, 0.5), 0.2));
    }

    #[test]
    fn test_ray_down_hits_top_face() {
        let hit = ground()
            .ray_intersection(Vec2::new(1.0, 3.0), Vec2::NEG_Y, 10.0)
            .unwrap();
        assert!((hit.distance - 3.0).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::Y);
        assert!((hit.point.y - 0.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_respects_max_distance() {
        assert!(
            ground()
                .ray_intersection(Vec2::new(1.0, 3.0), Vec2::NEG_Y, 2.0)
                .is_none()
        );
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        assert!(
            ground()
                .ray_intersection(Vec2::new(1.0, 3.0), Vec2::Y, 10.0)
                .is_none()
        );
    }

    #[test]
    fn test_ray_from_inside_hits_at_zero() {
        let hit = ground()
            .ray_intersection(Vec2::new(0.0, -0.5), Vec2::X, 5.0)
            .unwrap();
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_ray_sideways_hits_wall_face() {
        let wall = Aabb::from_center_size(Vec2::new(5.0, 2.0), Vec2::new(1.0, 4.0));
        let hit = wall
            .ray_intersection(Vec2::new(0.0, 1.0), Vec2::X, 10.0)
            .unwrap();
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::NEG_X);
    }
}
