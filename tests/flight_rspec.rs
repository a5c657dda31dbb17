//! Behaviour tests for free flight and landing using rust-rspec.
//!
//! A player is dropped into the sky above a meadow and steered with held
//! input; the suites check where it ends up and which states it went through.

#[path = "support/rspec_runner.rs"]
mod rspec_runner;

use crane::agent::AgentId;
use crane::animation::AnimParam;
use crane::{ControlInput, StateKind};
use glam::Vec3;
use rspec::block::Context as Scenario;
use rspec_runner::run_serial;
use test_utils::{held, meadow, simulation_on, SharedEpisode};

#[derive(Debug, Clone)]
struct SkyWorld {
    episode: SharedEpisode,
    player: AgentId,
}

impl SkyWorld {
    fn at(height: f32) -> Self {
        let mut simulation = simulation_on(meadow());
        let player = simulation.spawn_player(Vec3::new(0.0, height, 0.0));
        Self {
            episode: SharedEpisode::new(simulation),
            player,
        }
    }

    fn run(&self, ticks: usize, input: ControlInput) {
        self.episode.lock().run_to(ticks, held(input));
    }

    fn position(&self) -> Vec3 {
        self.episode.lock().position(self.player)
    }

    fn kind(&self) -> StateKind {
        self.episode.lock().bird(self.player).kind()
    }

    fn transitions(&self) -> Vec<(StateKind, StateKind)> {
        self.episode.lock().transitions_of(self.player)
    }
}

fn cruising(ctx: &mut Scenario<SkyWorld>) {
    ctx.when("no input is held for a second", |ctx| {
        ctx.before_each(|world| world.run(60, ControlInput::default()));
        ctx.then("it is still flying", |world| {
            assert_eq!(world.kind(), StateKind::Flying);
            assert!(world.transitions().is_empty());
        });
        ctx.then("it has flown straight ahead at its altitude", |world| {
            let position = world.position();
            assert!(position.z < -2.0, "expected forward progress, got {position}");
            assert!(position.x.abs() < 1e-3, "drifted sideways to {position}");
            assert!((position.y - 30.0).abs() < 0.5, "altitude changed to {position}");
        });
    });

    ctx.when("boost is held for a second", |ctx| {
        ctx.before_each(|world| {
            world.run(
                60,
                ControlInput {
                    boost: true,
                    ..ControlInput::default()
                },
            );
        });
        ctx.then("it covers far more ground than cruising", |world| {
            let position = world.position();
            assert!(position.z < -6.0, "boost too slow, got {position}");
        });
    });

    ctx.when("a right turn is held for a second", |ctx| {
        ctx.before_each(|world| {
            world.run(
                60,
                ControlInput {
                    turn: 1.0,
                    ..ControlInput::default()
                },
            );
        });
        ctx.then("it banks and curves to the right", |world| {
            let episode = world.episode.lock();
            let agent = episode.bird(world.player).agent();
            assert!(agent.pose.forward().x > 0.0);
            assert!(agent.pose.position.x > 0.0);
            assert!(agent.tilt < 0.0, "right wing should drop");
        });
    });

    ctx.when("landing is requested far above the ground", |ctx| {
        ctx.before_each(|world| {
            world.run(
                30,
                ControlInput {
                    land: true,
                    ..ControlInput::default()
                },
            );
        });
        ctx.then("the request is ignored", |world| {
            assert_eq!(world.kind(), StateKind::Flying);
            assert!(world.transitions().is_empty());
        });
    });
}

#[test]
fn player_cruises_above_a_meadow() {
    run_serial(&rspec::given(
        "a player cruising high above a meadow",
        SkyWorld::at(30.0),
        |ctx| {
            ctx.before_each(|world| *world = SkyWorld::at(30.0));
            cruising(ctx);
        },
    ));
}

#[test]
fn low_glide_lands_on_request() {
    run_serial(&rspec::given(
        "a player gliding two units above a meadow",
        SkyWorld::at(3.0),
        |ctx| {
            ctx.before_each(|world| *world = SkyWorld::at(3.0));
            ctx.when("landing is held for ten seconds", |ctx| {
                ctx.before_each(|world| {
                    world.run(
                        600,
                        ControlInput {
                            land: true,
                            ..ControlInput::default()
                        },
                    );
                });
                ctx.then("it lands and starts walking", |world| {
                    assert_eq!(
                        world.transitions(),
                        vec![
                            (StateKind::Flying, StateKind::Landing),
                            (StateKind::Landing, StateKind::Walking),
                        ]
                    );
                });
                ctx.then("it stands on the ground with the landed pose", |world| {
                    let episode = world.episode.lock();
                    let bird = episode.bird(world.player);
                    assert!((bird.agent().pose.position.y - 1.0).abs() < 0.06);
                    assert!(bird.body().grounded());
                    assert!(bird.agent().gravity);
                    assert!(bird.animator().flag(AnimParam::Landed));
                });
            });
        },
    ));
}
