//! Level flow and the scene furniture around it: triggers, NPC dialogue and
//! parallax backgrounds.

pub mod dialogue;
pub mod manager;
pub mod parallax;
pub mod triggers;
