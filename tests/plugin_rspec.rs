//! Behavioural test for driving the simulation from a headless Bevy app.
//!
//! The plugin owns no bird state of its own: it steps the simulation, mirrors
//! birds onto entities and raises state switches and discoveries as events.

#[path = "support/thread_safe_app.rs"]
mod thread_safe_app;

#[path = "support/rspec_runner.rs"]
mod rspec_runner;

use std::sync::MutexGuard;

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use crane::agent::AgentId;
use crane::plugin::BirdEntity;
use crane::{BirdFound, SimulationHandle, StateChanged, StateKind};
use rspec::block::Context as Scenario;
use rspec_runner::run_serial;
use test_utils::{headless_app, meadow, simulation_on, update_until, walking_player};
use thread_safe_app::{lock_app, share, SharedApp, ThreadSafeApp};

#[derive(Resource, Debug, Default)]
struct Heard {
    switches: Vec<StateChanged>,
    found: Vec<BirdFound>,
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn hear_switch(event: On<StateChanged>, mut heard: ResMut<Heard>) {
    heard.switches.push(*event.event());
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn hear_found(event: On<BirdFound>, mut heard: ResMut<Heard>) {
    heard.found.push(*event.event());
}

#[derive(Debug, Clone)]
struct PluginFixture {
    app: SharedApp,
    player: AgentId,
    npc: AgentId,
}

impl PluginFixture {
    /// A walking player with an NPC landing right beside it.
    fn bootstrap() -> Self {
        let mut simulation = simulation_on(meadow());
        let player = walking_player(&mut simulation, Vec3::new(0.0, 1.0, 0.0));
        let npc = simulation.spawn_npc(Vec3::new(0.3, 1.0, 0.0));
        let mut app = headless_app(simulation);
        app.init_resource::<Heard>();
        app.add_observer(hear_switch);
        app.add_observer(hear_found);
        Self {
            app: share(app),
            player,
            npc,
        }
    }

    fn app_guard(&self) -> MutexGuard<'_, ThreadSafeApp> {
        lock_app(&self.app)
    }

    fn run_for(&self, seconds: f32) {
        update_until(&mut self.app_guard(), seconds);
    }

    fn entities(&self) -> Vec<(AgentId, Transform)> {
        let mut app = self.app_guard();
        let world = app.world_mut();
        let mut query = world.query::<(&BirdEntity, &Transform)>();
        query.iter(world).map(|(bird, transform)| (bird.0, *transform)).collect()
    }

    fn heard_found(&self) -> Vec<BirdFound> {
        self.app_guard().world().resource::<Heard>().found.clone()
    }

    fn heard_switches(&self) -> Vec<StateChanged> {
        self.app_guard().world().resource::<Heard>().switches.clone()
    }
}

fn first_update(scenario: &mut Scenario<PluginFixture>) {
    scenario.when("the app updates once", |ctx| {
        ctx.before_each(|fixture| fixture.run_for(test_utils::DT));
        ctx.then("each bird gets an entity", |fixture| {
            let mut ids: Vec<AgentId> = fixture.entities().into_iter().map(|(id, _)| id).collect();
            ids.sort_by_key(|id| id.0);
            assert_eq!(ids, vec![fixture.player, fixture.npc]);
        });
        ctx.then("the NPC landing and the discovery are heard", |fixture| {
            assert_eq!(
                fixture.heard_switches(),
                vec![StateChanged {
                    agent: fixture.npc,
                    from: StateKind::Landing,
                    to: StateKind::Walking,
                }]
            );
            assert_eq!(
                fixture.heard_found(),
                vec![BirdFound {
                    player: fixture.player,
                    npc: fixture.npc,
                }]
            );
        });
    });
}

fn after_the_fade(scenario: &mut Scenario<PluginFixture>) {
    scenario.when("the app runs for six seconds", |ctx| {
        ctx.before_each(|fixture| fixture.run_for(6.0));
        ctx.then("only the player's entity remains", |fixture| {
            let entities = fixture.entities();
            assert_eq!(entities.len(), 1);
            let (id, transform) = entities.first().copied().expect("player entity");
            assert_eq!(id, fixture.player);
            assert!((transform.translation.y - 1.0).abs() < 0.06);
        });
        ctx.then("the NPC was counted into the session", |fixture| {
            let app = fixture.app_guard();
            let handle = app.world().resource::<SimulationHandle>();
            assert_eq!(handle.0.session().collected(), 1);
            assert_eq!(app.world().resource::<Heard>().found.len(), 1);
        });
    });
}

#[test]
fn plugin_mirrors_birds_and_raises_events() {
    run_serial(&rspec::given(
        "a headless app with a walking player beside an NPC",
        PluginFixture::bootstrap(),
        |scenario: &mut Scenario<PluginFixture>| {
            scenario.before_each(|fixture| *fixture = PluginFixture::bootstrap());
            first_update(scenario);
            after_the_fade(scenario);
        },
    ));
}
