//! Level flow: ready screen, countdown, timed play, end screen and the
//! fade into the next scene.

use darkwood_component::Entity;
use darkwood_math::lerp;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::audio::{MusicChannel, Sfx};
use crate::events::GameEvent;
use crate::world::{GameWorld, Tag};

const COUNTDOWN_START: f32 = 3.0;
const COUNTDOWN_MIN_SIZE: f32 = 1.0;
const COUNTDOWN_MAX_SIZE: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelState {
    Ready,
    Start,
    Play,
    End,
    NextScene,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub score_to_win: u32,
    pub level_time_seconds: u32,
    /// Blank loads the end screen.
    pub next_scene: String,
    pub seconds_before_next_scene: f32,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            score_to_win: 3,
            level_time_seconds: 120,
            next_scene: String::new(),
            seconds_before_next_scene: 0.5,
        }
    }
}

/// What the level's HUD would show.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelUi {
    pub score_text: String,
    pub timer_text: String,
    pub countdown_text: String,
    pub countdown_font_size: u32,
    pub countdown_visible: bool,
    pub end_text: String,
    pub start_panel: bool,
    pub ui_panel: bool,
    pub end_panel: bool,
}

#[derive(Debug, Clone)]
pub struct LevelManager {
    pub settings: LevelSettings,
    pub ui: LevelUi,
    state: LevelState,
    collected_garbage: u32,
    time: f32,
    countdown_time: f32,
    won: bool,
    next_scene_loading_time: f32,
    player: Option<Entity>,
    player_start: Vec2,
    garbage: Vec<Entity>,
}

impl LevelManager {
    #[must_use]
    pub fn new(settings: LevelSettings) -> Self {
        Self {
            next_scene_loading_time: settings.seconds_before_next_scene,
            time: settings.level_time_seconds as f32,
            settings,
            ui: LevelUi::default(),
            state: LevelState::Ready,
            collected_garbage: 0,
            countdown_time: COUNTDOWN_START,
            won: false,
            player: None,
            player_start: Vec2::ZERO,
            garbage: Vec::new(),
        }
    }

    /// Find the player and the garbage of the loaded scene and reset the
    /// level. Call once the scene is populated.
    pub fn start(&mut self, world: &mut GameWorld) {
        self.player = world.find_by_name("Player");
        match self.player.and_then(|p| world.position(p)) {
            Some(position) => self.player_start = position,
            None => error!("object with 'Player' name not found"),
        }
        self.garbage = world.entities_with_tag(Tag::Garbage);
        self.init_level_parameters(world);
        self.next_scene_loading_time = self.settings.seconds_before_next_scene;
    }

    #[must_use]
    pub fn state(&self) -> LevelState {
        self.state
    }

    #[must_use]
    pub fn can_play(&self) -> bool {
        self.state == LevelState::Play
    }

    #[must_use]
    pub fn collected_garbage(&self) -> u32 {
        self.collected_garbage
    }

    /// Seconds left on the level timer.
    #[must_use]
    pub fn time_left(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn won(&self) -> bool {
        self.won
    }

    fn set_state(&mut self, world: &mut GameWorld, state: LevelState) {
        if self.state != state {
            world.emit(GameEvent::LevelStateChanged {
                from: self.state,
                to: state,
            });
            self.state = state;
        }
    }

    pub fn update(&mut self, world: &mut GameWorld) {
        let dt = world.clock.dt;
        let pressed = world.input.jump || world.input.attack;
        match self.state {
            LevelState::Ready => {
                if pressed {
                    self.set_state(world, LevelState::Start);
                    self.ui.start_panel = false;
                    self.ui.countdown_visible = true;
                    self.countdown_time = COUNTDOWN_START;
                }
            }
            LevelState::Start => self.update_countdown(world, dt),
            LevelState::Play => {
                self.time -= dt;
                if self.time <= 0.0 {
                    self.lose(world);
                } else {
                    self.ui.timer_text = format_timer(self.time);
                }
            }
            LevelState::End => {
                if pressed {
                    world.audio.play_sfx(Sfx::Bleurgh);
                    if self.won {
                        self.set_state(world, LevelState::NextScene);
                    } else {
                        self.init_level_parameters(world);
                    }
                }
            }
            LevelState::NextScene => {
                if self.next_scene_loading_time < 0.0 {
                    let next = self.settings.next_scene.trim();
                    let scene = if next.is_empty() {
                        world.config.end_scene_name.clone()
                    } else {
                        next.to_string()
                    };
                    world.request_scene(scene);
                }
                self.next_scene_loading_time -= dt;
                let fade = self.next_scene_loading_time / self.settings.seconds_before_next_scene;
                world.audio.music_mut(MusicChannel::Level).volume = lerp(0.0, 1.0, fade);
            }
        }
    }

    fn update_countdown(&mut self, world: &mut GameWorld, dt: f32) {
        self.countdown_time -= dt;
        let t = self.countdown_time;
        let size = lerp(COUNTDOWN_MIN_SIZE, COUNTDOWN_MAX_SIZE as f32, 1.0 - (t - t.trunc()));
        self.ui.countdown_font_size = size.round() as u32;
        let previous = self.ui.countdown_text.clone();
        if t < -1.0 {
            self.set_state(world, LevelState::Play);
            self.ui.countdown_visible = false;
            self.ui.ui_panel = true;
        } else if t < 0.0 {
            self.ui.countdown_text = "GO!".to_string();
            self.ui.countdown_font_size = COUNTDOWN_MAX_SIZE;
        } else {
            self.ui.countdown_text = ((t + 1.0) as i32).to_string();
        }
        if self.ui.countdown_text != previous {
            world.audio.stop_sfx();
            world
                .audio
                .play_sfx(if t < 0.0 { Sfx::CountdownGo } else { Sfx::Countdown });
        }
    }

    /// Reset score, timer and HUD, put the player back at its start and
    /// bring every garbage pickup back.
    pub fn init_level_parameters(&mut self, world: &mut GameWorld) {
        self.collected_garbage = 0;
        self.ui.score_text = self.score_text();
        self.time = self.settings.level_time_seconds as f32;
        self.set_state(world, LevelState::Ready);
        self.ui.ui_panel = false;
        self.ui.start_panel = true;
        self.ui.countdown_visible = false;
        self.ui.end_panel = false;
        if let Some(player) = self.player {
            world.teleport(player, self.player_start);
            if let Some(controller) = world.controllers.get_mut(player) {
                controller.reset();
            }
        }
        for pickup in &self.garbage {
            world.set_active(*pickup, true);
        }
    }

    fn score_text(&self) -> String {
        format!("{}/{}", self.collected_garbage, self.settings.score_to_win)
    }

    /// Count one pickup and win on reaching the score. Returns the total.
    pub fn increment_garbage(&mut self, world: &mut GameWorld) -> u32 {
        self.collected_garbage += 1;
        self.ui.score_text = self.score_text();
        if self.collected_garbage == self.settings.score_to_win {
            self.win(world);
        }
        self.collected_garbage
    }

    pub fn win(&mut self, world: &mut GameWorld) {
        info!(garbage = self.collected_garbage, "level won");
        self.end(world, true, "You won!\n\npress jump button to continue", Sfx::Win);
    }

    pub fn lose(&mut self, world: &mut GameWorld) {
        info!(garbage = self.collected_garbage, "level lost");
        self.end(world, false, "You lose!\n\npress jump button to restart", Sfx::Lose);
    }

    fn end(&mut self, world: &mut GameWorld, won: bool, text: &str, sfx: Sfx) {
        self.ui.end_text = text.to_string();
        self.ui.end_panel = true;
        self.set_state(world, LevelState::End);
        self.ui.ui_panel = false;
        self.won = won;
        world.audio.play_sfx(sfx);
    }
}

/// `m:ss` with whole seconds truncated.
#[must_use]
pub fn format_timer(time: f32) -> String {
    let minutes = (time / 60.0) as u32;
    let seconds = (time - minutes as f32 * 60.0) as u32;
    format!("{minutes}:{seconds:02}")
}

/// Take the level manager out of the world, run `f`, and put it back.
pub fn with_level<R>(world: &mut GameWorld, f: impl FnOnce(&mut LevelManager, &mut GameWorld) -> R) -> Option<R> {
    let mut level = world.level.take()?;
    let result = f(&mut level, world);
    if world.level.is_none() {
        world.level = Some(level);
    }
    Some(result)
}

/// Whether the player may move: a level manager exists and is in play.
#[must_use]
pub fn can_play(world: &GameWorld) -> bool {
    world.level.as_ref().is_some_and(LevelManager::can_play)
}

/// Run the level manager for this frame.
pub fn update_level(world: &mut GameWorld) {
    with_level(world, |level, world| level.update(world));
}
