//! # darkwood
//!
//! Runs a scene headless and prints a JSON summary of how the run ended.
//!
//! Without `--level` the built-in demo forest is played.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use darkwood_game::{GameConfig, GameWorld, InputScript, LevelDesc, SceneCatalog, TickConfig, TickLoop};

#[derive(Parser)]
#[command(name = "darkwood", about = "Headless 2D action platformer")]
struct Args {
    /// Level files to load; may be given several times
    #[arg(short, long)]
    level: Vec<PathBuf>,

    /// Scene to start in (defaults to the first level)
    #[arg(short, long)]
    scene: Option<String>,

    /// Recorded input to play back
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Game settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Frames per second
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Pace frames in real time instead of running them back to back
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("darkwood_game=info".parse()?))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<GameConfig>(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => GameConfig::default(),
    };

    let mut catalog = SceneCatalog::new();
    let mut first_scene = None;
    if args.level.is_empty() {
        let demo = LevelDesc::demo().context("loading the demo level")?;
        first_scene = Some(demo.scene.clone());
        catalog.insert(demo);
    }
    for path in &args.level {
        let desc = LevelDesc::from_path(path).with_context(|| format!("loading level {}", path.display()))?;
        info!(scene = %desc.scene, path = %path.display(), "level loaded");
        first_scene.get_or_insert_with(|| desc.scene.clone());
        catalog.insert(desc);
    }
    let scene = args
        .scene
        .or(first_scene)
        .context("no scene to start in")?;

    let input = match &args.input {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading input {}", path.display()))?;
            serde_json::from_str::<InputScript>(&text).with_context(|| format!("parsing input {}", path.display()))?
        }
        None => InputScript::new(),
    };

    let tick_config = TickConfig {
        tick_rate: args.tick_rate,
        max_ticks: args.frames,
        ..TickConfig::default()
    };
    let mut tick_loop = TickLoop::new(tick_config, GameWorld::new(config), catalog).with_input(input);
    tick_loop
        .load(&scene)
        .with_context(|| format!("loading scene {scene}"))?;

    let summary = if args.realtime {
        tick_loop.run()?
    } else {
        tick_loop.run_headless(args.frames)?
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
