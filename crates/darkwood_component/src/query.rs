//! Query descriptors for system data access declarations.
//!
//! A [`QueryDescriptor`] declares which component types a system reads and
//! writes. The scheduler uses these descriptors to detect conflicts between
//! systems and group them into execution stages.

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentTypeId};

/// Describes the data access requirements of a system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Component types the system reads immutably.
    pub reads: Vec<ComponentTypeId>,
    /// Component types the system writes (mutable access).
    pub writes: Vec<ComponentTypeId>,
}

impl QueryDescriptor {
    /// Create a new empty query descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a read-only component requirement.
    #[must_use]
    pub fn read(mut self, type_id: ComponentTypeId) -> Self {
        self.reads.push(type_id);
        self
    }

    /// Add a mutable component requirement.
    #[must_use]
    pub fn write(mut self, type_id: ComponentTypeId) -> Self {
        self.writes.push(type_id);
        self
    }

    /// Shorthand for `read(ComponentTypeId::of::<T>())`.
    #[must_use]
    pub fn reads<T: Component>(self) -> Self {
        self.read(ComponentTypeId::of::<T>())
    }

    /// Shorthand for `write(ComponentTypeId::of::<T>())`.
    #[must_use]
    pub fn writes<T: Component>(self) -> Self {
        self.write(ComponentTypeId::of::<T>())
    }

    /// Returns all component types that this query accesses.
    #[must_use]
    pub fn all_types(&self) -> Vec<ComponentTypeId> {
        let mut types = Vec::with_capacity(self.reads.len() + self.writes.len());
        types.extend_from_slice(&self.reads);
        types.extend_from_slice(&self.writes);
        types
    }

    /// Checks whether this query conflicts with another.
    ///
    /// Two queries conflict when one writes a component type that the other
    /// reads or writes:
    ///
    /// ```text
    /// A.writes ∩ (B.reads ∪ B.writes) ≠ ∅  OR
    /// B.writes ∩ (A.reads ∪ A.writes) ≠ ∅
    /// ```
    #[must_use]
    pub fn conflicts_with(&self, other: &QueryDescriptor) -> bool {
        for w in &self.writes {
            if other.reads.contains(w) || other.writes.contains(w) {
                return true;
            }
        }
        for w in &other.writes {
            if self.reads.contains(w) || self.writes.contains(w) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFORM: ComponentTypeId = ComponentTypeId::from_name("Transform2D");
    const BODY: ComponentTypeId = ComponentTypeId::from_name("Body");
    const ENEMY: ComponentTypeId = ComponentTypeId::from_name("Enemy");

    #[test]
    fn test_no_conflict_both_read() {
        let q1 = QueryDescriptor::new().read(TRANSFORM);
        let q2 = QueryDescriptor::new().read(TRANSFORM);
        assert!(!q1.conflicts_with(&q2));
    }

    #[test]
    fn test_conflict_read_vs_write() {
        let q1 = QueryDescriptor::new().read(TRANSFORM);
        let q2 = QueryDescriptor::new().write(TRANSFORM);
        assert!(q1.conflicts_with(&q2));
        assert!(q2.conflicts_with(&q1));
    }

    #[test]
    fn test_conflict_write_vs_write() {
        let q1 = QueryDescriptor::new().write(BODY);
        let q2 = QueryDescriptor::new().write(BODY);
        assert!(q1.conflicts_with(&q2));
    }

    #[test]
    fn test_no_conflict_different_writes() {
        // Physics: reads Transform2D, writes Body
        let physics = QueryDescriptor::new().read(TRANSFORM).write(BODY);
        // AI: reads Transform2D, writes Enemy
        let ai = QueryDescriptor::new().read(TRANSFORM).write(ENEMY);
        assert!(!physics.conflicts_with(&ai));
    }

    #[test]
    fn test_all_types() {
        let q = QueryDescriptor::new().read(TRANSFORM).write(BODY);
        let all = q.all_types();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&TRANSFORM));
        assert!(all.contains(&BODY));
    }
}
