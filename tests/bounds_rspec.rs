//! Behaviour tests for climbable trigger volumes using rust-rspec.
//!
//! Climbable volumes are only counted while a bird is on the ground or in the
//! water. While one overlaps, movement falls back to the avoidance velocity,
//! and jumping can be made to depend on standing in one.

#[path = "support/rspec_runner.rs"]
mod rspec_runner;

use crane::agent::AgentId;
use crane::terrain::Terrain;
use crane::{BirdConfig, ControlInput, JumpHeight, Simulation, StateKind};
use glam::Vec3;
use rspec_runner::run_serial;
use test_utils::{
    climbable, from_tick, held, ledge, meadow, on_tick, simulation_on, walking_player,
    SharedEpisode, SEED,
};

#[derive(Debug, Clone)]
struct Rocks {
    episode: SharedEpisode,
    player: AgentId,
}

impl Rocks {
    fn meadow_with_rock() -> Terrain {
        meadow().with_volume(climbable(1, Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0)))
    }

    fn walking_inside() -> Self {
        let mut simulation = simulation_on(Self::meadow_with_rock());
        let player = walking_player(&mut simulation, Vec3::new(0.0, 1.0, 0.0));
        Self {
            episode: SharedEpisode::new(simulation),
            player,
        }
    }

    fn flying_through() -> Self {
        let mut simulation = simulation_on(Self::meadow_with_rock());
        let player = simulation.spawn_player(Vec3::new(0.0, 1.8, 0.0));
        Self {
            episode: SharedEpisode::new(simulation),
            player,
        }
    }

    /// Jumping needs a climbable volume. `covered` wraps one around the
    /// player's feet.
    fn before_gated_ledge(covered: bool) -> Self {
        let mut config = BirdConfig::default();
        config.walking.jump_requires_climbable = true;
        let mut terrain = ledge(0.5);
        if covered {
            terrain = terrain.with_volume(climbable(
                2,
                Vec3::new(-1.0, -0.5, -0.5),
                Vec3::new(1.0, 1.5, 0.5),
            ));
        }
        let mut simulation = Simulation::new(config, terrain, SEED);
        let player = walking_player(&mut simulation, Vec3::ZERO);
        Self {
            episode: SharedEpisode::new(simulation),
            player,
        }
    }

    fn overlapping(&self) -> u32 {
        self.episode.lock().bird(self.player).agent().bounds.exceeded()
    }

    fn transitions(&self) -> Vec<(StateKind, StateKind)> {
        self.episode.lock().transitions_of(self.player)
    }
}

#[test]
fn walking_bird_counts_the_rock_it_stands_in() {
    run_serial(&rspec::given(
        "a walking player standing inside a climbable rock",
        Rocks::walking_inside(),
        |ctx| {
            ctx.before_each(|rocks| *rocks = Rocks::walking_inside());

            ctx.when("one tick passes", |ctx| {
                ctx.before_each(|rocks| rocks.episode.lock().run_to(1, held(ControlInput::default())));
                ctx.then("the rock is counted", |rocks| assert_eq!(rocks.overlapping(), 1));
            });

            ctx.when("forward is held for a second", |ctx| {
                ctx.before_each(|rocks| {
                    rocks.episode.lock().run_to(
                        60,
                        held(ControlInput {
                            forward: true,
                            ..ControlInput::default()
                        }),
                    );
                });
                ctx.then("the avoidance fallback holds it in place", |rocks| {
                    let position = rocks.episode.lock().position(rocks.player);
                    assert!(position.z.abs() < 0.05, "moved to {position}");
                    assert_eq!(rocks.overlapping(), 1);
                });
            });

            ctx.when("it takes flight", |ctx| {
                ctx.before_each(|rocks| {
                    rocks.episode.lock().run_to(
                        600,
                        from_tick(
                            10,
                            ControlInput {
                                take_flight: true,
                                ..ControlInput::default()
                            },
                        ),
                    );
                });
                ctx.then("it rises out of the rock and the count drops", |rocks| {
                    assert_eq!(rocks.overlapping(), 0);
                    assert_eq!(
                        rocks.transitions().last(),
                        Some(&(StateKind::TakingFlight, StateKind::Flying))
                    );
                });
            });
        },
    ));
}

#[test]
fn flying_bird_ignores_the_rock() {
    run_serial(&rspec::given(
        "a player flying low through a climbable rock",
        Rocks::flying_through(),
        |ctx| {
            ctx.before_each(|rocks| *rocks = Rocks::flying_through());
            ctx.when("one tick passes", |ctx| {
                ctx.before_each(|rocks| rocks.episode.lock().run_to(1, held(ControlInput::default())));
                ctx.then("nothing is counted", |rocks| assert_eq!(rocks.overlapping(), 0));
            });
        },
    ));
}

#[test]
fn gated_jumps_need_a_climbable_volume() {
    let jump = ControlInput {
        jump: true,
        ..ControlInput::default()
    };

    run_serial(&rspec::given(
        "jumping gated on climbable volumes and a player with none",
        Rocks::before_gated_ledge(false),
        move |ctx| {
            ctx.before_each(|rocks| *rocks = Rocks::before_gated_ledge(false));
            ctx.when("jump is pressed in front of a ledge", move |ctx| {
                ctx.before_each(move |rocks| rocks.episode.lock().run_to(30, on_tick(10, jump)));
                ctx.then("the bird stays on the ground", |rocks| {
                    assert!(rocks.transitions().is_empty());
                });
            });
        },
    ));

    run_serial(&rspec::given(
        "jumping gated on climbable volumes and a player standing in one",
        Rocks::before_gated_ledge(true),
        move |ctx| {
            ctx.before_each(|rocks| *rocks = Rocks::before_gated_ledge(true));
            ctx.when("jump is pressed in front of a ledge", move |ctx| {
                ctx.before_each(move |rocks| rocks.episode.lock().run_to(30, on_tick(10, jump)));
                ctx.then("the bird jumps", |rocks| {
                    assert_eq!(
                        rocks.transitions().first(),
                        Some(&(StateKind::Walking, StateKind::Jumping(JumpHeight::Tall)))
                    );
                });
            });
        },
    ));
}
