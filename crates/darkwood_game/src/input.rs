//! Per-frame player input and scripted input playback.
//!
//! Buttons are edge-triggered ("pressed this frame"); `flashlight` is a held
//! button; `horizontal` is an axis in `[-1, 1]`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Everything the game reads from input devices in one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFrame {
    pub horizontal: f32,
    pub jump: bool,
    pub dash: bool,
    pub attack: bool,
    pub throw: bool,
    pub continue_dialogue: bool,
    /// Emergency movement unstick.
    pub reset_movement: bool,
    /// Emergency reset of every enemy AI.
    pub reset_all_enemies: bool,
    /// World point of a reset click on a single enemy.
    pub reset_enemy_at: Option<Vec2>,
    /// Flashlight trigger, held.
    pub flashlight: bool,
    /// World point the flashlight aims at.
    pub aim: Option<Vec2>,
}

impl InputFrame {
    /// An idle frame.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_horizontal(mut self, horizontal: f32) -> Self {
        self.horizontal = horizontal.clamp(-1.0, 1.0);
        self
    }
}

/// Input applied to an inclusive range of frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpan {
    pub from_frame: u64,
    pub to_frame: u64,
    pub frame: InputFrame,
}

/// Recorded input for a whole run. Frames no span covers are neutral; where
/// spans overlap, the later span wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputScript {
    pub spans: Vec<InputSpan>,
}

impl InputScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a span.
    #[must_use]
    pub fn with(mut self, from_frame: u64, to_frame: u64, frame: InputFrame) -> Self {
        self.push(from_frame, to_frame, frame);
        self
    }

    /// Append a span to a script that may already be playing.
    pub fn push(&mut self, from_frame: u64, to_frame: u64, frame: InputFrame) {
        self.spans.push(InputSpan {
            from_frame,
            to_frame,
            frame,
        });
    }

    /// Input for tick number `frame` (1-based, counted across scene loads).
    #[must_use]
    pub fn frame_at(&self, frame: u64) -> InputFrame {
        self.spans
            .iter()
            .rev()
            .find(|s| (s.from_frame..=s.to_frame).contains(&frame))
            .map(|s| s.frame.clone())
            .unwrap_or_default()
    }

    /// The last frame any span covers.
    #[must_use]
    pub fn last_frame(&self) -> u64 {
        self.spans.iter().map(|s| s.to_frame).max().unwrap_or(0)
    }
}
