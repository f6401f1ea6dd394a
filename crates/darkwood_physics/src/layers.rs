//! Collision layers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Layer membership of a collider, or a mask of layers a query accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct Layers: u32 {
        const GROUND     = 1 << 0;
        const PLAYER     = 1 << 1;
        const ENEMY      = 1 << 2;
        const HAZARD     = 1 << 3;
        const PICKUP     = 1 << 4;
        const TRIGGER    = 1 << 5;
        const PROJECTILE = 1 << 6;
    }
}

impl Layers {
    /// Every layer.
    pub const ALL: Self = Self::all();

    /// Whether a collider on `self` passes a query filtered by `mask`.
    #[must_use]
    pub fn matches(self, mask: Layers) -> bool {
        self.intersects(mask)
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::GROUND
    }
}
