//! Fixtures shared by the crane integration tests.
//!
//! Behaviour suites build a [`Simulation`] on one of the terrains below and
//! drive it through a [`SharedEpisode`], which rspec can clone into every
//! example. Runs are idempotent: asking for the same tick count twice only
//! simulates once, so several `then` blocks can inspect one outcome.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;
use crane::agent::AgentId;
use crane::bounds::{VolumeId, VolumeTag};
use crane::controller::Transition;
use crane::simulation::Bird;
use crane::terrain::{Aabb, TriggerVolume};
use crane::{
    BirdConfig, ControlInput, CranePlugin, Simulation, SimulationHandle, StateKind, StepSettings,
    Terrain, TickReport,
};

/// Step used by every suite.
pub const DT: f32 = 1.0 / 60.0;

/// Seed used by every suite.
pub const SEED: u64 = 7;

/// Level ground one unit above the water.
#[must_use]
pub fn meadow() -> Terrain {
    Terrain::flat(1.0)
}

/// Deep water everywhere.
#[must_use]
pub fn open_lake() -> Terrain {
    Terrain::flat(-5.0)
}

/// Deep water for `z > -3`, then a shallow shelf just under the surface.
#[must_use]
pub fn lake_shore() -> Terrain {
    Terrain::from_fn(|_, z| if z < -3.0 { -0.1 } else { -5.0 })
}

/// Flat ground at zero with a step of `height` starting just in front of the
/// origin (towards −Z). The water sits far below.
#[must_use]
pub fn ledge(height: f32) -> Terrain {
    Terrain::from_fn(move |_, z| if z < -0.8 { height } else { 0.0 }).with_water_level(-5.0)
}

/// A climbable trigger volume spanning `min` to `max`.
#[must_use]
pub fn climbable(id: u32, min: Vec3, max: Vec3) -> TriggerVolume {
    TriggerVolume {
        id: VolumeId(id),
        bounds: Aabb::new(min, max),
        tag: VolumeTag::Climbable,
    }
}

/// A simulation on `terrain` with default tuning.
#[must_use]
pub fn simulation_on(terrain: Terrain) -> Simulation {
    Simulation::new(BirdConfig::default(), terrain, SEED)
}

/// Spawns the player at `position` and puts it straight into walking.
pub fn walking_player(simulation: &mut Simulation, position: Vec3) -> AgentId {
    let player = simulation.spawn_player(position);
    simulation.force_state(player, StateKind::Walking);
    player
}

/// The same input on every tick.
pub fn held(input: ControlInput) -> impl Fn(usize) -> ControlInput {
    move |_| input
}

/// `input` from tick `from` onwards, idle before.
pub fn from_tick(from: usize, input: ControlInput) -> impl Fn(usize) -> ControlInput {
    move |tick| if tick >= from { input } else { ControlInput::default() }
}

/// `input` on tick `at` only, idle otherwise.
pub fn on_tick(at: usize, input: ControlInput) -> impl Fn(usize) -> ControlInput {
    move |tick| if tick == at { input } else { ControlInput::default() }
}

/// A simulation together with every report it produced.
#[derive(Debug)]
pub struct Episode {
    simulation: Simulation,
    reports: Vec<TickReport>,
}

impl Episode {
    /// The simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Looks a bird up, panicking when it has gone.
    ///
    /// # Panics
    /// Panics if `id` is no longer in the world.
    #[must_use]
    pub fn bird(&self, id: AgentId) -> &Bird {
        self.simulation
            .bird(id)
            .unwrap_or_else(|| panic!("bird {id:?} is not in the world"))
    }

    /// Position of a bird.
    #[must_use]
    pub fn position(&self, id: AgentId) -> Vec3 {
        self.bird(id).agent().pose.position
    }

    /// Reports in tick order.
    #[must_use]
    pub fn reports(&self) -> &[TickReport] {
        &self.reports
    }

    /// Every transition so far, in order.
    #[must_use]
    pub fn transitions(&self) -> Vec<Transition> {
        self.reports
            .iter()
            .flat_map(|report| report.transitions.iter().copied())
            .collect()
    }

    /// Transitions of one bird as `(from, to)` pairs.
    #[must_use]
    pub fn transitions_of(&self, id: AgentId) -> Vec<(StateKind, StateKind)> {
        self.transitions()
            .into_iter()
            .filter(|transition| transition.agent == id)
            .map(|transition| (transition.from, transition.to))
            .collect()
    }

    /// Ticks until `ticks` reports exist, asking `input` for each tick by
    /// index.
    pub fn run_to(&mut self, ticks: usize, input: impl Fn(usize) -> ControlInput) {
        while self.reports.len() < ticks {
            let tick = self.reports.len();
            let report = self.simulation.tick(DT, input(tick));
            self.reports.push(report);
        }
    }
}

/// An [`Episode`] that rspec examples can share.
#[derive(Debug, Clone)]
pub struct SharedEpisode(Arc<Mutex<Episode>>);

impl SharedEpisode {
    /// Wraps a prepared simulation.
    #[must_use]
    pub fn new(simulation: Simulation) -> Self {
        Self(Arc::new(Mutex::new(Episode {
            simulation,
            reports: Vec::new(),
        })))
    }

    /// Locks the episode, recovering from a poisoned mutex.
    #[must_use]
    pub fn lock(&self) -> MutexGuard<'_, Episode> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A headless app running `simulation` at a fixed [`DT`].
#[must_use]
pub fn headless_app(simulation: Simulation) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(SimulationHandle(simulation))
        .insert_resource(StepSettings {
            fixed_delta: Some(DT),
            ..StepSettings::default()
        })
        .add_plugins(CranePlugin);
    app
}

/// Updates `app` until its simulation has run for `seconds`.
pub fn update_until(app: &mut App, seconds: f32) {
    while app.world().resource::<SimulationHandle>().0.elapsed() < seconds - DT * 0.5 {
        app.update();
    }
}
