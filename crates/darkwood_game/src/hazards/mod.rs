//! Environmental hazards and the things the player fights them with:
//! cannons, acid rain, crate dispensers, moving platforms, wandering
//! wraiths and the flashlight that burns them.

pub mod acid_rain;
pub mod cannon;
pub mod dispenser;
pub mod flashlight;
pub mod platforms;
pub mod wander;
