//! System scheduler: conflict detection and stage computation.
//!
//! The scheduler groups the systems of one [`Phase`] into **stages** based
//! on their read/write access sets. Systems within a stage touch disjoint
//! data, so their relative order does not matter; stages run one after the
//! other.

use darkwood_component::QueryDescriptor;
use serde::{Deserialize, Serialize};

/// When in the frame a system runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Once per fixed step, before the frame's update.
    Fixed,
    /// Once per frame.
    Update,
    /// Once per frame, after every update system.
    Late,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Fixed, Phase::Update, Phase::Late];
}

/// A registered system with its name and query descriptor.
#[derive(Debug, Clone)]
pub struct RegisteredSystem {
    /// The system name (e.g. `"physics"`).
    pub name: String,
    /// The system's data access requirements.
    pub query: QueryDescriptor,
}

/// A group of systems with no conflicts between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Indices into the scheduler's system list.
    pub system_indices: Vec<usize>,
}

/// Computes execution stages from a list of systems in registration order.
///
/// The algorithm is a greedy graph colouring:
/// 1. Find the last stage holding a system this one conflicts with.
/// 2. Place the system in the first stage after that one.
/// 3. If there is no such stage, open a new one.
///
/// A system therefore never runs before an earlier-registered system it
/// conflicts with, while unrelated systems share stages.
#[must_use]
pub fn compute_stages(systems: &[RegisteredSystem]) -> Vec<Stage> {
    let mut stages: Vec<Stage> = Vec::new();

    for (sys_idx, system) in systems.iter().enumerate() {
        let first_free = stages
            .iter()
            .rposition(|stage| {
                stage
                    .system_indices
                    .iter()
                    .any(|&existing| system.query.conflicts_with(&systems[existing].query))
            })
            .map_or(0, |last| last + 1);

        match stages.get_mut(first_free) {
            Some(stage) => stage.system_indices.push(sys_idx),
            None => stages.push(Stage {
                system_indices: vec![sys_idx],
            }),
        }
    }

    stages
}

/// System indices in the order the stages run them.
#[must_use]
pub fn execution_order(stages: &[Stage]) -> Vec<usize> {
    stages.iter().flat_map(|s| s.system_indices.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use darkwood_component::ComponentTypeId;

    use super::*;

    fn make_system(name: &str, reads: &[u64], writes: &[u64]) -> RegisteredSystem {
        let mut query = QueryDescriptor::new();
        for &r in reads {
            query = query.read(ComponentTypeId(r));
        }
        for &w in writes {
            query = query.write(ComponentTypeId(w));
        }
        RegisteredSystem {
            name: name.to_string(),
            query,
        }
    }

    #[test]
    fn test_no_systems_no_stages() {
        assert!(compute_stages(&[]).is_empty());
    }

    #[test]
    fn test_non_conflicting_systems_share_a_stage() {
        // parallax: reads Transform(1), writes ParallaxLayer(2)
        // cannons: reads Transform(1), writes Cannon(3)
        let systems = vec![make_system("parallax", &[1], &[2]), make_system("cannons", &[1], &[3])];
        let stages = compute_stages(&systems);
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].system_indices, vec![0, 1]);
    }

    #[test]
    fn test_conflicting_systems_different_stages() {
        // physics: reads Body(2), writes Transform(1)
        // ai: reads Transform(1), writes Enemy(3)
        let systems = vec![make_system("physics", &[2], &[1]), make_system("ai", &[1], &[3])];
        let stages = compute_stages(&systems);
        assert_eq!(stages.len(), 2);
    }

    #[test]
    fn test_later_system_never_jumps_ahead_of_a_conflict() {
        // a and b both write 1; c only conflicts with b. Plain first-fit
        // would put c next to a, ahead of b.
        let systems = vec![
            make_system("a", &[], &[1]),
            make_system("b", &[], &[1, 2]),
            make_system("c", &[2], &[3]),
        ];
        let stages = compute_stages(&systems);
        assert_eq!(stages.len(), 3);
        assert_eq!(execution_order(&stages), vec![0, 1, 2]);
    }

    #[test]
    fn test_unrelated_late_system_joins_first_stage() {
        let systems = vec![
            make_system("a", &[], &[1]),
            make_system("b", &[1], &[2]),
            make_system("c", &[], &[9]),
        ];
        let stages = compute_stages(&systems);
        assert_eq!(stages[0].system_indices, vec![0, 2]);
        assert_eq!(stages[1].system_indices, vec![1]);
    }
}
