//! Frame loop.
//!
//! One tick is one rendered frame:
//!
//! 1. Advance the clock and read this frame's input.
//! 2. Run the fixed-step systems as many times as the fixed rate requires.
//! 3. Run the update systems, then the late-update systems, stage by stage.
//! 4. Remove destroyed entities and hand the frame's events to the caller.
//! 5. Load the scene requested during the frame, if any.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use glam::Vec2;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::DEFAULT_FIXED_RATE;
use crate::error::LevelError;
use crate::events::GameEvent;
use crate::input::InputScript;
use crate::level::manager::LevelState;
use crate::registry::SystemRegistry;
use crate::scene::{SceneCatalog, load_scene};
use crate::scheduler::{self, Phase, Stage};
use crate::systems::register_game_systems;
use crate::world::GameWorld;

/// Configuration for the frame loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target frames per second.
    pub tick_rate: f64,
    /// Fixed steps per second.
    pub fixed_rate: f32,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            fixed_rate: DEFAULT_FIXED_RATE,
            max_ticks: 0,
        }
    }
}

/// The frame loop state.
#[derive(Debug)]
pub struct TickLoop {
    /// Frames run so far, across scene loads.
    tick_id: u64,
    config: TickConfig,
    world: GameWorld,
    catalog: SceneCatalog,
    input: InputScript,
    registry: SystemRegistry,
    /// Pre-computed stages per phase (recomputed when the system set
    /// changes).
    stages: BTreeMap<Phase, Vec<Stage>>,
    stages_dirty: bool,
    scenes_loaded: u32,
}

impl TickLoop {
    /// Create a loop over `world` with every game system registered.
    #[must_use]
    pub fn new(config: TickConfig, mut world: GameWorld, catalog: SceneCatalog) -> Self {
        world.clock = crate::clock::Clock::new(config.fixed_rate);
        let mut registry = SystemRegistry::new();
        register_game_systems(&mut registry);
        Self {
            tick_id: 0,
            config,
            world,
            catalog,
            input: InputScript::new(),
            registry,
            stages: BTreeMap::new(),
            stages_dirty: true,
            scenes_loaded: 0,
        }
    }

    /// Play back `input`, indexed by tick number.
    #[must_use]
    pub fn with_input(mut self, input: InputScript) -> Self {
        self.input = input;
        self
    }

    /// The input being played back. Spans added here apply from the next
    /// tick they cover.
    pub fn input_mut(&mut self) -> &mut InputScript {
        &mut self.input
    }

    /// Load a scene now, replacing the current one.
    pub fn load(&mut self, scene: &str) -> Result<(), LevelError> {
        load_scene(&mut self.world, &self.catalog, scene)?;
        self.scenes_loaded += 1;
        info!(tick_id = self.tick_id, scene, loads = self.scenes_loaded, "scene switched");
        Ok(())
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn world(&self) -> &GameWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GameWorld {
        &mut self.world
    }

    #[must_use]
    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    /// Returns a mutable reference to the system registry.
    pub fn registry_mut(&mut self) -> &mut SystemRegistry {
        self.stages_dirty = true;
        &mut self.registry
    }

    /// Scenes loaded so far, the first one included.
    #[must_use]
    pub fn scenes_loaded(&self) -> u32 {
        self.scenes_loaded
    }

    fn recompute_stages(&mut self) {
        self.stages = Phase::ALL
            .into_iter()
            .map(|phase| (phase, scheduler::compute_stages(&self.registry.scheduled(phase))))
            .collect();
        self.stages_dirty = false;

        info!(
            tick_id = self.tick_id,
            stage_count = self.stages.values().map(Vec::len).sum::<usize>(),
            system_count = self.registry.system_count(),
            "recomputed execution stages"
        );
    }

    /// The stages of one phase, recomputing if necessary.
    pub fn stages(&mut self, phase: Phase) -> &[Stage] {
        if self.stages_dirty {
            self.recompute_stages();
        }
        self.stages.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    fn run_phase(&mut self, phase: Phase) {
        let systems = self.registry.in_phase(phase);
        let Some(stages) = self.stages.get(&phase) else {
            return;
        };
        for stage in stages {
            for &index in &stage.system_indices {
                let system = systems[index];
                if system.enabled {
                    (system.run)(&mut self.world);
                }
            }
        }
    }

    /// Run one frame of `dt` seconds and return its events.
    pub fn tick(&mut self, dt: f64) -> Result<Vec<GameEvent>, LevelError> {
        self.tick_id += 1;

        if self.stages_dirty {
            self.recompute_stages();
        }

        self.world.clock.begin_frame(dt as f32);
        self.world.input = self.input.frame_at(self.tick_id);

        debug!(tick_id = self.tick_id, dt, "tick start");

        let mut fixed_steps = 0;
        while self.world.clock.fixed_step_due() {
            self.world.clock.begin_fixed();
            self.run_phase(Phase::Fixed);
            self.world.clock.end_fixed();
            fixed_steps += 1;
        }
        self.run_phase(Phase::Update);
        self.run_phase(Phase::Late);

        let removed = self.world.flush_destroyed();
        let events = self.world.drain_events();
        for event in &events {
            event.log(self.tick_id);
        }
        debug!(tick_id = self.tick_id, fixed_steps, removed, events = events.len(), "tick end");

        if let Some(scene) = self.world.take_pending_scene() {
            self.load(&scene)?;
        }
        Ok(events)
    }

    /// Run the loop in real time for the configured number of ticks, or
    /// indefinitely.
    pub fn run(&mut self) -> Result<RunSummary, LevelError> {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut tick_count = 0u64;
        let mut events = 0usize;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            events += self.tick(tick_duration.as_secs_f64())?.len();

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
        Ok(self.summary(events))
    }

    /// Run `frames` ticks back to back at the configured rate.
    pub fn run_headless(&mut self, frames: u64) -> Result<RunSummary, LevelError> {
        let dt = 1.0 / self.config.tick_rate;
        let mut events = 0usize;
        for _ in 0..frames {
            events += self.tick(dt)?.len();
        }
        info!(ticks = frames, scene = %self.world.scene, "headless run complete");
        Ok(self.summary(events))
    }

    /// Where the run stands now.
    #[must_use]
    pub fn summary(&self, events: usize) -> RunSummary {
        let world = &self.world;
        let player = world.player();
        let player_life = player.and_then(|p| {
            world
                .characters
                .get(p)
                .map(|c| c.life)
                .or_else(|| world.controllers.get(p).map(|c| c.life))
        });
        RunSummary {
            scene: world.scene.clone(),
            ticks: self.tick_id,
            level_state: world.level.as_ref().map(|l| l.state()),
            garbage: world.level.as_ref().map_or(0, |l| l.collected_garbage()),
            player_position: player.and_then(|p| world.position(p)),
            player_life,
            enemies_alive: world
                .enemies
                .iter()
                .filter(|(_, e)| !e.health.is_dead())
                .count(),
            wraiths_alive: world.wraiths.iter().filter(|(_, w)| !w.dying).count(),
            scenes_requested: world.scene_history.clone(),
            events,
        }
    }
}

/// The outcome of a run, printed by the binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub scene: String,
    pub ticks: u64,
    pub level_state: Option<LevelState>,
    pub garbage: u32,
    pub player_position: Option<Vec2>,
    pub player_life: Option<f32>,
    pub enemies_alive: usize,
    pub wraiths_alive: usize,
    pub scenes_requested: Vec<String>,
    pub events: usize,
}

#[cfg(test)]
mod tests {
    use darkwood_component::QueryDescriptor;

    use super::*;
    use crate::input::InputFrame;

    fn demo_loop() -> TickLoop {
        let catalog = SceneCatalog::with_demo().unwrap();
        let mut tick_loop = TickLoop::new(TickConfig::default(), GameWorld::default(), catalog);
        tick_loop.load("Forest").unwrap();
        tick_loop
    }

    fn mark_tick(world: &mut GameWorld) {
        world.scene_history.push("counted".to_string());
    }

    #[test]
    fn test_tick_advances_counter() {
        let mut tick_loop = demo_loop();
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick(1.0 / 60.0).unwrap();
        assert_eq!(tick_loop.tick_id(), 1);
        tick_loop.tick(1.0 / 60.0).unwrap();
        assert_eq!(tick_loop.tick_id(), 2);
        assert_eq!(tick_loop.world().clock.frame_count, 2);
    }

    #[test]
    fn test_stages_recomputed_on_registry_change() {
        let mut tick_loop = demo_loop();
        let before = tick_loop.stages(Phase::Late).len();
        assert!(before > 0);

        tick_loop
            .registry_mut()
            .register("counter", Phase::Late, QueryDescriptor::new(), mark_tick);
        tick_loop.tick(1.0 / 60.0).unwrap();
        assert!(tick_loop.world().scene_history.contains(&"counted".to_string()));

        tick_loop.registry_mut().set_enabled("counter", false);
        tick_loop.world_mut().scene_history.clear();
        tick_loop.tick(1.0 / 60.0).unwrap();
        assert!(tick_loop.world().scene_history.is_empty());
    }

    #[test]
    fn test_fixed_steps_follow_fixed_rate() {
        let mut tick_loop = demo_loop();
        for _ in 0..60 {
            tick_loop.tick(1.0 / 60.0).unwrap();
        }
        // One second of frames; gravity has pulled the player onto the
        // ground it spawned above.
        let summary = tick_loop.summary(0);
        assert_eq!(summary.ticks, 60);
        assert!((tick_loop.world().clock.time - 1.0).abs() < 1e-3);
        assert!(summary.player_position.is_some());
    }

    #[test]
    fn test_stalled_frame_runs_bounded_fixed_steps() {
        let mut tick_loop = demo_loop();
        tick_loop
            .registry_mut()
            .register("fixed_counter", Phase::Fixed, QueryDescriptor::new(), mark_tick);
        tick_loop.tick(30.0).unwrap();
        let steps = tick_loop
            .world()
            .scene_history
            .iter()
            .filter(|s| *s == "counted")
            .count();
        assert_eq!(steps, 16);
        assert!(tick_loop.world().clock.time < 0.34);
    }

    #[test]
    fn test_scripted_input_moves_player() {
        let catalog = SceneCatalog::with_demo().unwrap();
        // Jump starts the countdown; play begins four seconds later.
        let jump = InputFrame {
            jump: true,
            ..InputFrame::neutral()
        };
        let script = InputScript::new()
            .with(1, 400, InputFrame::neutral().with_horizontal(1.0))
            .with(1, 1, jump);
        let mut tick_loop =
            TickLoop::new(TickConfig::default(), GameWorld::default(), catalog).with_input(script);
        tick_loop.load("Forest").unwrap();
        let start = tick_loop.summary(0).player_position.unwrap();
        tick_loop.run_headless(400).unwrap();
        let end = tick_loop.summary(0).player_position.unwrap();
        assert!(end.x > start.x);
    }

    #[test]
    fn test_unknown_scene_request_is_an_error() {
        let mut tick_loop = demo_loop();
        tick_loop.world_mut().request_scene("Nowhere");
        assert!(matches!(tick_loop.tick(1.0 / 60.0), Err(LevelError::UnknownScene(_))));
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = TickConfig {
            tick_rate: 1000.0,
            max_ticks: 5,
            ..TickConfig::default()
        };
        let catalog = SceneCatalog::with_demo().unwrap();
        let mut tick_loop = TickLoop::new(config, GameWorld::default(), catalog);
        tick_loop.load("Forest").unwrap();
        let summary = tick_loop.run().unwrap();
        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.scene, "Forest");
    }
}
