//! Bevy plugin driving a [`Simulation`] from the app schedule.
//!
//! The simulation stays the single owner of bird state. Each `Update` it is
//! stepped once, entities are spawned for birds that do not have one yet, and
//! their `Transform`s are copied from the birds' poses. Entities whose bird
//! has been removed are despawned. State switches and discoveries are raised
//! as events so the rest of the app can react without polling.
use bevy::ecs::prelude::On;
use bevy::prelude::*;
use hashbrown::HashSet;
use log::{debug, info};

use crate::agent::AgentId;
use crate::controller::Transition;
use crate::fsm::StateKind;
use crate::input::ControlInput;
use crate::simulation::{Found, Simulation};

/// The simulation, as a Bevy resource.
#[derive(Resource, Debug)]
pub struct SimulationHandle(pub Simulation);

/// Control intent for the player, written by whatever reads the keyboard or
/// plays a script.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerControls(pub ControlInput);

/// How far the simulation advances per app update.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct StepSettings {
    /// Fixed step in seconds. When `None` the real frame delta is used.
    pub fixed_delta: Option<f32>,
    /// Upper bound on the real frame delta, so a hitch does not teleport
    /// birds through the ground.
    pub max_delta_seconds: f32,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            fixed_delta: None,
            max_delta_seconds: 0.1,
        }
    }
}

impl StepSettings {
    /// Seconds to advance for a frame that took `real_delta`.
    #[must_use]
    pub fn step(&self, real_delta: f32) -> f32 {
        self.fixed_delta
            .unwrap_or_else(|| real_delta.min(self.max_delta_seconds.max(f32::EPSILON)))
    }
}

/// Links an entity to the bird it shows.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirdEntity(pub AgentId);

/// Raised for every state switch.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChanged {
    /// Bird that switched.
    pub agent: AgentId,
    /// State that exited.
    pub from: StateKind,
    /// State that entered.
    pub to: StateKind,
}

impl From<Transition> for StateChanged {
    fn from(transition: Transition) -> Self {
        Self {
            agent: transition.agent,
            from: transition.from,
            to: transition.to,
        }
    }
}

/// Raised when the player finds an NPC.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirdFound {
    /// The finder.
    pub player: AgentId,
    /// The bird that was found.
    pub npc: AgentId,
}

impl From<Found> for BirdFound {
    fn from(found: Found) -> Self {
        Self {
            player: found.player,
            npc: found.npc,
        }
    }
}

/// Advances the simulation by one step and raises its events.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn step_simulation_system(
    mut commands: Commands,
    time: Res<Time>,
    settings: Res<StepSettings>,
    controls: Res<PlayerControls>,
    mut handle: ResMut<SimulationHandle>,
) {
    let dt = settings.step(time.delta_secs());
    let report = handle.0.tick(dt, controls.0);
    for transition in report.transitions {
        commands.trigger(StateChanged::from(transition));
    }
    for found in report.discoveries {
        commands.trigger(BirdFound::from(found));
    }
}

/// Spawns an entity for every bird that lacks one.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn attach_bodies_system(
    mut commands: Commands,
    handle: Res<SimulationHandle>,
    attached: Query<&BirdEntity>,
) {
    let known: HashSet<AgentId> = attached.iter().map(|bird| bird.0).collect();
    for bird in handle.0.birds() {
        let agent = bird.agent();
        if known.contains(&agent.id) {
            continue;
        }
        debug!("attaching entity to bird {:?}", agent.id);
        commands.spawn((
            BirdEntity(agent.id),
            Transform::from_translation(agent.pose.position).with_rotation(agent.pose.rotation),
        ));
    }
}

/// Copies poses onto `Transform`s and despawns entities of removed birds.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn sync_transforms_system(
    mut commands: Commands,
    handle: Res<SimulationHandle>,
    mut query: Query<(Entity, &BirdEntity, &mut Transform)>,
) {
    for (entity, bird_entity, mut transform) in &mut query {
        match handle.0.bird(bird_entity.0) {
            Some(bird) => {
                let pose = &bird.agent().pose;
                transform.translation = pose.position;
                transform.rotation = pose.rotation;
            }
            None => {
                debug!("bird {:?} gone, despawning its entity", bird_entity.0);
                commands.entity(entity).despawn();
            }
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_state_changed(event: On<StateChanged>) {
    let StateChanged { agent, from, to } = *event.event();
    debug!("bird {agent:?} switched {from} -> {to}");
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_bird_found(event: On<BirdFound>) {
    let BirdFound { player, npc } = *event.event();
    info!("bird {npc:?} found by {player:?}");
}

/// Installs the simulation systems. The app must provide a
/// [`SimulationHandle`]; controls and step settings fall back to defaults.
#[derive(Default)]
pub struct CranePlugin;

impl Plugin for CranePlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_state_changed);
        app.add_observer(log_bird_found);
        app.init_resource::<PlayerControls>();
        app.init_resource::<StepSettings>();
        app.add_systems(
            Update,
            (
                step_simulation_system,
                attach_bodies_system,
                sync_transforms_system,
            )
                .chain()
                .run_if(resource_exists::<SimulationHandle>),
        );
    }
}
