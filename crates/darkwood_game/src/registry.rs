//! System registry: the game's systems, what they touch and when they run.
//!
//! Systems are plain functions over the [`GameWorld`]. Registration order is
//! meaningful; the scheduler keeps conflicting systems in that order.

use darkwood_component::QueryDescriptor;
use tracing::debug;

use crate::scheduler::{Phase, RegisteredSystem};
use crate::world::GameWorld;

/// A system body.
pub type SystemFn = fn(&mut GameWorld);

/// Information about a registered system.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// The system's human-readable name.
    pub name: String,
    pub phase: Phase,
    /// The system's data access requirements.
    pub query: QueryDescriptor,
    pub run: SystemFn,
    /// Disabled systems are scheduled but skipped.
    pub enabled: bool,
}

/// Registry of every system the tick loop runs.
#[derive(Debug, Default)]
pub struct SystemRegistry {
    systems: Vec<SystemInfo>,
}

impl SystemRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system. A system with the same name is replaced in place.
    pub fn register(&mut self, name: &str, phase: Phase, query: QueryDescriptor, run: SystemFn) {
        let info = SystemInfo {
            name: name.to_string(),
            phase,
            query,
            run,
            enabled: true,
        };
        if let Some(existing) = self.systems.iter_mut().find(|s| s.name == name) {
            debug!(system = name, "system replaced");
            *existing = info;
        } else {
            debug!(system = name, ?phase, "system registered");
            self.systems.push(info);
        }
    }

    /// Remove a system. Returns `true` if it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.name != name);
        self.systems.len() != before
    }

    /// Switch a system on or off. Returns `false` for unknown names.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.systems.iter_mut().find(|s| s.name == name) {
            Some(system) => {
                system.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns information about a system by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SystemInfo> {
        self.systems.iter().find(|s| s.name == name)
    }

    /// Returns an iterator over all registered systems in registration
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = &SystemInfo> {
        self.systems.iter()
    }

    /// Systems of one phase, in registration order.
    #[must_use]
    pub fn in_phase(&self, phase: Phase) -> Vec<&SystemInfo> {
        self.systems.iter().filter(|s| s.phase == phase).collect()
    }

    /// Scheduler input for one phase.
    #[must_use]
    pub fn scheduled(&self, phase: Phase) -> Vec<RegisteredSystem> {
        self.in_phase(phase)
            .into_iter()
            .map(|info| RegisteredSystem {
                name: info.name.clone(),
                query: info.query.clone(),
            })
            .collect()
    }

    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }
}

#[cfg(test)]
mod tests {
    use darkwood_component::ComponentTypeId;

    use super::*;

    fn noop(_: &mut GameWorld) {}

    fn query() -> QueryDescriptor {
        QueryDescriptor::new().read(ComponentTypeId(1)).write(ComponentTypeId(2))
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = SystemRegistry::new();
        registry.register("physics", Phase::Fixed, query(), noop);
        registry.register("ai", Phase::Update, query(), noop);
        registry.register("camera", Phase::Late, query(), noop);
        let names: Vec<&str> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["physics", "ai", "camera"]);
        assert_eq!(registry.in_phase(Phase::Update).len(), 1);
    }

    #[test]
    fn test_same_name_replaces() {
        let mut registry = SystemRegistry::new();
        registry.register("physics", Phase::Fixed, query(), noop);
        registry.register("physics", Phase::Update, QueryDescriptor::new(), noop);
        assert_eq!(registry.system_count(), 1);
        assert_eq!(registry.get("physics").unwrap().phase, Phase::Update);
    }

    #[test]
    fn test_unregister_and_disable() {
        let mut registry = SystemRegistry::new();
        registry.register("physics", Phase::Fixed, query(), noop);
        assert!(registry.set_enabled("physics", false));
        assert!(!registry.get("physics").unwrap().enabled);
        assert!(!registry.set_enabled("missing", false));
        assert!(registry.unregister("physics"));
        assert!(!registry.unregister("physics"));
        assert_eq!(registry.system_count(), 0);
    }
}
