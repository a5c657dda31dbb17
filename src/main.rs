use std::f32::consts::TAU;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bevy::prelude::*;
use clap::Parser;
use crane::{
    init_logging, BirdConfig, ControlInput, CranePlugin, InputSource, PlayerControls,
    ScriptedInput, Simulation, SimulationHandle, StepSettings, Terrain,
};
use log::info;

/// Headless crane locomotion demo
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Number of simulation steps to run
    #[arg(long, default_value_t = 900)]
    ticks: u32,
    /// Seconds per step
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// NPC birds to scatter around the lake
    #[arg(long, default_value_t = 3)]
    npcs: u32,
    /// Seed for NPC wandering
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// JSON file overriding the default tuning
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Glide in, land, walk about, peck and take off again.
fn demo_script() -> ScriptedInput {
    let walk = ControlInput {
        forward: true,
        ..ControlInput::default()
    };
    ScriptedInput::new()
        .then(1.0, ControlInput::default())
        .then(
            4.0,
            ControlInput {
                land: true,
                ..ControlInput::default()
            },
        )
        .then(3.0, walk)
        .then(
            0.5,
            ControlInput {
                attack: true,
                ..ControlInput::default()
            },
        )
        .then(
            2.0,
            ControlInput {
                turn: 0.5,
                ..walk
            },
        )
        .then(
            0.1,
            ControlInput {
                take_flight: true,
                ..ControlInput::default()
            },
        )
        .then(
            4.0,
            ControlInput {
                vertical: 0.6,
                turn: -0.3,
                ..ControlInput::default()
            },
        )
}

#[expect(
    clippy::cast_precision_loss,
    reason = "NPC counts are far below the f32 mantissa."
)]
fn build_simulation(args: &Args) -> Result<Simulation> {
    let config = match &args.config {
        Some(path) => BirdConfig::from_json_path(path)
            .with_context(|| format!("loading tuning from {}", path.display()))?,
        None => BirdConfig::default(),
    };
    let mut simulation = Simulation::new(config, Terrain::demo(), args.seed);
    let ground = simulation.terrain().height_at(0.0, -40.0);
    simulation.spawn_player(Vec3::new(0.0, ground + 2.0, -40.0));
    for index in 0..args.npcs {
        let angle = TAU * index as f32 / args.npcs.max(1) as f32;
        let (x, z) = (angle.cos() * 45.0, angle.sin() * 45.0);
        let height = simulation.terrain().height_at(x, z);
        simulation.spawn_npc(Vec3::new(x, height + 1.0, z));
    }
    Ok(simulation)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let simulation = build_simulation(&args)?;
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(SimulationHandle(simulation))
        .insert_resource(StepSettings {
            fixed_delta: Some(args.dt),
            ..StepSettings::default()
        })
        .add_plugins(CranePlugin);

    let mut script = demo_script();
    info!(
        "running {} steps of {:.4}s over a {:.1}s script",
        args.ticks,
        args.dt,
        script.duration()
    );
    for _ in 0..args.ticks {
        let input = script.sample(args.dt);
        app.world_mut().resource_mut::<PlayerControls>().0 = input;
        app.update();
    }

    let handle = app.world().resource::<SimulationHandle>();
    let simulation = &handle.0;
    if let Some(player) = simulation.player() {
        info!(
            "player ended {} at {} after {:.1}s",
            player.kind(),
            player.agent().pose.position,
            simulation.elapsed()
        );
    }
    info!(
        "{} birds found, {} still wandering",
        simulation.session().collected(),
        simulation.birds().len().saturating_sub(1)
    );
    Ok(())
}
