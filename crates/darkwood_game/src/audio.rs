//! Audio state.
//!
//! Nothing is played; the game records what would be heard so tests and the
//! run summary can inspect it.

use serde::Serialize;
use tracing::debug;

/// One-shot sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sfx {
    Countdown,
    CountdownGo,
    Win,
    Lose,
    Bleurgh,
    CannonFire,
    Impact,
}

/// Music channels: the level's background track and the zone override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicChannel {
    Level,
    Zone,
}

/// State of one music source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MusicState {
    pub clip: Option<String>,
    pub volume: f32,
    pub playing: bool,
    pub paused: bool,
}

impl MusicState {
    pub fn play(&mut self) {
        self.playing = self.clip.is_some();
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            self.paused = true;
        }
    }

    pub fn unpause(&mut self) {
        if self.paused {
            self.playing = true;
            self.paused = false;
        }
    }
}

impl Default for MusicState {
    fn default() -> Self {
        Self {
            clip: None,
            volume: 1.0,
            playing: false,
            paused: false,
        }
    }
}

/// Everything audible right now plus the effect history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AudioState {
    /// The single sfx source; a new effect replaces the current one.
    pub current_sfx: Option<Sfx>,
    pub played: Vec<Sfx>,
    pub level_music: MusicState,
    pub zone_music: MusicState,
}

impl AudioState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play_sfx(&mut self, sfx: Sfx) {
        debug!(?sfx, "play sfx");
        self.current_sfx = Some(sfx);
        self.played.push(sfx);
    }

    pub fn stop_sfx(&mut self) {
        self.current_sfx = None;
    }

    #[must_use]
    pub fn music(&self, channel: MusicChannel) -> &MusicState {
        match channel {
            MusicChannel::Level => &self.level_music,
            MusicChannel::Zone => &self.zone_music,
        }
    }

    pub fn music_mut(&mut self, channel: MusicChannel) -> &mut MusicState {
        match channel {
            MusicChannel::Level => &mut self.level_music,
            MusicChannel::Zone => &mut self.zone_music,
        }
    }

    /// How many times an effect has been played.
    #[must_use]
    pub fn count(&self, sfx: Sfx) -> usize {
        self.played.iter().filter(|s| **s == sfx).count()
    }
}
