//! Per-type component storage.
//!
//! A [`ComponentStore`] maps entities to one component type. Entries are kept
//! in entity order so every pass over a store visits entities the same way on
//! every run, which keeps simulations reproducible.

use std::collections::BTreeMap;

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;

/// Ordered storage for a single component type.
#[derive(Debug, Clone)]
pub struct ComponentStore<T: Component> {
    items: BTreeMap<Entity, T>,
}

impl<T: Component> ComponentStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    /// The type id of the component held by this store.
    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        T::component_type_id()
    }

    /// Attach a component, returning the previous value if there was one.
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.items.insert(entity, component)
    }

    /// Detach and return a component.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.items.remove(&entity)
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.items.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.items.get_mut(&entity)
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.items.contains_key(&entity)
    }

    /// Iterate over `(entity, component)` pairs in entity order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.items.iter().map(|(e, c)| (*e, c))
    }

    /// Mutable iteration in entity order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.items.iter_mut().map(|(e, c)| (*e, c))
    }

    /// Snapshot of the entities currently holding this component.
    ///
    /// Systems iterate over this snapshot when they need to take components
    /// out of the store while they work on them.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.items.keys().copied().collect()
    }

    /// The first entity (lowest id) holding this component, if any.
    #[must_use]
    pub fn first(&self) -> Option<(Entity, &T)> {
        self.items.iter().next().map(|(e, c)| (*e, c))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Charge(f32);

    impl Component for Charge {
        fn type_name() -> &'static str {
            "Charge"
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = ComponentStore::new();
        let e = Entity::from_raw(3);
        assert!(store.insert(e, Charge(1.0)).is_none());
        assert_eq!(store.get(e), Some(&Charge(1.0)));
        assert!(store.contains(e));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_replaces_previous() {
        let mut store = ComponentStore::new();
        let e = Entity::from_raw(1);
        store.insert(e, Charge(1.0));
        assert_eq!(store.insert(e, Charge(2.0)), Some(Charge(1.0)));
        assert_eq!(store.get(e), Some(&Charge(2.0)));
    }

    #[test]
    fn test_iteration_is_entity_ordered() {
        let mut store = ComponentStore::new();
        store.insert(Entity::from_raw(9), Charge(9.0));
        store.insert(Entity::from_raw(2), Charge(2.0));
        store.insert(Entity::from_raw(5), Charge(5.0));
        let ids: Vec<u64> = store.iter().map(|(e, _)| e.id()).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        assert_eq!(store.first().map(|(e, _)| e.id()), Some(2));
    }

    #[test]
    fn test_take_out_and_put_back() {
        let mut store = ComponentStore::new();
        let e = Entity::from_raw(4);
        store.insert(e, Charge(4.0));
        let mut taken = store.remove(e).unwrap();
        assert!(store.is_empty());
        taken.0 += 1.0;
        store.insert(e, taken);
        assert_eq!(store.get(e), Some(&Charge(5.0)));
    }

    #[test]
    fn test_get_mut_and_clear() {
        let mut store = ComponentStore::new();
        let e = Entity::from_raw(1);
        store.insert(e, Charge(0.0));
        if let Some(c) = store.get_mut(e) {
            c.0 = 3.0;
        }
        assert_eq!(store.get(e), Some(&Charge(3.0)));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.type_id(), ComponentTypeId::from_name("Charge"));
    }
}
