//! The simulation world: every bird, the ground they share, and the play
//! session.
//!
//! One [`Simulation::tick`] advances every bird's active state, runs the
//! physics stand-in, routes the resulting collision and trigger events back
//! through each bird's controller, and then advances discovery fades.
//! Everything happens on the caller's thread within the call.
use glam::Vec3;
use log::{debug, info};

use crate::agent::{Agent, AgentId, Role};
use crate::animation::{AnimParam, AnimationSink, Animator, Clip};
use crate::config::BirdConfig;
use crate::constants::MIN_DELTA_TIME;
use crate::controller::{initial_state, Controller, Transition};
use crate::discovery::Discovery;
use crate::effects::{EffectLog, Session};
use crate::fsm::{Frame, Reaction, StateKind};
use crate::input::ControlInput;
use crate::physics::{Body, Neighbour, PhysicsEvent};
use crate::terrain::Terrain;

/// One bird and everything that belongs to it.
#[derive(Debug)]
pub struct Bird {
    agent: Agent,
    controller: Controller,
    animator: Animator,
    body: Body,
    discovery: Option<Discovery>,
}

impl Bird {
    /// Motion fields.
    #[must_use]
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Owner of the active state.
    #[must_use]
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Active locomotion mode.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        self.controller.kind()
    }

    /// Animation parameters and clip.
    #[must_use]
    pub const fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Physics memory.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Whether the bird has been found and is fading out.
    #[must_use]
    pub const fn fading(&self) -> bool {
        self.discovery.is_some()
    }
}

/// A player finding an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found {
    /// The finder.
    pub player: AgentId,
    /// The bird that was found.
    pub npc: AgentId,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// State switches, in the order they happened.
    pub transitions: Vec<Transition>,
    /// Discovery sequences started.
    pub discoveries: Vec<Found>,
    /// Birds removed at the end of the tick.
    pub despawned: Vec<AgentId>,
}

/// Owns every bird and advances them together.
#[derive(Debug)]
pub struct Simulation {
    config: BirdConfig,
    terrain: Terrain,
    birds: Vec<Bird>,
    effects: EffectLog,
    session: Session,
    seed: u64,
    next_id: u32,
    elapsed: f32,
}

impl Simulation {
    /// Creates an empty world. `seed` makes NPC wandering reproducible.
    #[must_use]
    pub fn new(config: BirdConfig, terrain: Terrain, seed: u64) -> Self {
        Self {
            config,
            terrain,
            birds: Vec::new(),
            effects: EffectLog::default(),
            session: Session::default(),
            seed,
            next_id: 1,
            elapsed: 0.0,
        }
    }

    /// Spawns the player in flight.
    pub fn spawn_player(&mut self, position: Vec3) -> AgentId {
        self.spawn(Role::Player, position, Animator::new(Clip::FlapForward))
    }

    /// Spawns an NPC, landing where it is placed.
    pub fn spawn_npc(&mut self, position: Vec3) -> AgentId {
        let mut animator = Animator::new(Clip::Landing);
        animator.set_bool(AnimParam::Landing, true);
        self.spawn(Role::Npc, position, animator)
    }

    fn spawn(&mut self, role: Role, position: Vec3, mut animator: Animator) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        let mut agent = Agent::new(id, role, position, self.seed);
        let mut frame = Frame {
            dt: 0.0,
            input: ControlInput::default(),
            world: &self.terrain,
            animator: &mut animator,
            config: &self.config,
            player_position: None,
        };
        let controller = Controller::new(initial_state(role), &mut agent, &mut frame);
        info!("spawned {role:?} bird {id:?} at {position}");
        self.birds.push(Bird {
            agent,
            controller,
            animator,
            body: Body::default(),
            discovery: None,
        });
        id
    }

    /// Switches a bird's state from outside the state machine. Exit and
    /// enter run as for any other switch; a discovery fade keeps running.
    pub fn force_state(&mut self, id: AgentId, kind: StateKind) -> Option<Transition> {
        let bird = self.birds.iter_mut().find(|bird| bird.agent.id == id)?;
        let mut frame = Frame {
            dt: 0.0,
            input: ControlInput::default(),
            world: &self.terrain,
            animator: &mut bird.animator,
            config: &self.config,
            player_position: None,
        };
        bird.controller.switch(&mut bird.agent, kind, &mut frame)
    }

    /// Advances the world by `dt` seconds with `input` driving the player.
    pub fn tick(&mut self, dt: f32, input: ControlInput) -> TickReport {
        let dt = dt.max(MIN_DELTA_TIME);
        let input = input.clamped();
        let player_position = self.player().map(|bird| bird.agent.pose.position);
        let mut report = TickReport::default();

        for bird in &mut self.birds {
            let input = match bird.agent.role {
                Role::Player => input,
                Role::Npc => ControlInput::default(),
            };
            let mut frame = Frame {
                dt,
                input,
                world: &self.terrain,
                animator: &mut bird.animator,
                config: &self.config,
                player_position,
            };
            if let Some(transition) = bird.controller.tick(&mut bird.agent, &mut frame) {
                report.transitions.push(transition);
            }
        }

        let neighbours: Vec<Neighbour> = self
            .birds
            .iter()
            .map(|bird| Neighbour::from(&bird.agent))
            .collect();
        let mut found = Vec::new();
        for bird in &mut self.birds {
            let events = bird.body.step(
                &mut bird.agent,
                &self.terrain,
                self.terrain.volumes(),
                &neighbours,
                &self.config.physics,
                dt,
            );
            for event in events {
                let mut frame = Frame {
                    dt,
                    input: ControlInput::default(),
                    world: &self.terrain,
                    animator: &mut bird.animator,
                    config: &self.config,
                    player_position,
                };
                match event {
                    PhysicsEvent::Collision(contact) => {
                        let outcome = bird.controller.on_collision(&mut bird.agent, contact, &mut frame);
                        report.transitions.extend(outcome.transition);
                        if let Some(Reaction::Discovered(npc)) = outcome.reaction {
                            found.push(Found {
                                player: bird.agent.id,
                                npc,
                            });
                        }
                    }
                    PhysicsEvent::TriggerEnter { volume, tag } => {
                        bird.controller.on_trigger_enter(&mut bird.agent, volume, tag);
                    }
                    PhysicsEvent::TriggerExit { volume, tag } => {
                        bird.controller.on_trigger_exit(&mut bird.agent, volume, tag);
                    }
                }
            }
            bird.animator.advance(dt);
        }

        for event in found {
            if self.discover(event) {
                report.discoveries.push(event);
            }
        }

        for bird in &mut self.birds {
            let Some(discovery) = bird.discovery.as_mut() else {
                continue;
            };
            if discovery.advance(dt, &mut self.effects, &mut self.session) {
                report.despawned.push(bird.agent.id);
            }
        }
        if !report.despawned.is_empty() {
            self.birds
                .retain(|bird| !report.despawned.contains(&bird.agent.id));
        }

        self.elapsed += dt;
        report
    }

    /// Starts a discovery unless the NPC is gone or already fading.
    fn discover(&mut self, event: Found) -> bool {
        let Some(npc) = self.birds.iter().find(|bird| bird.agent.id == event.npc) else {
            return false;
        };
        if npc.fading() {
            debug!("bird {:?} already found", event.npc);
            return false;
        }
        let Some(player) = self.birds.iter_mut().find(|bird| bird.agent.id == event.player) else {
            return false;
        };
        let discovery = Discovery::begin(
            &mut player.agent,
            event.npc,
            &mut self.effects,
            &self.config.discovery,
        );
        let Some(npc) = self.birds.iter_mut().find(|bird| bird.agent.id == event.npc) else {
            return false;
        };
        npc.discovery = Some(discovery);
        true
    }

    /// Every bird still in the world.
    #[must_use]
    pub fn birds(&self) -> &[Bird] {
        &self.birds
    }

    /// Looks a bird up by identifier.
    #[must_use]
    pub fn bird(&self, id: AgentId) -> Option<&Bird> {
        self.birds.iter().find(|bird| bird.agent.id == id)
    }

    /// The first player bird, if one has been spawned.
    #[must_use]
    pub fn player(&self) -> Option<&Bird> {
        self.birds.iter().find(|bird| bird.agent.role == Role::Player)
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &BirdConfig {
        &self.config
    }

    /// The shared collision world.
    #[must_use]
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Visual requests recorded so far.
    #[must_use]
    pub const fn effects(&self) -> &EffectLog {
        &self.effects
    }

    /// Mutable access to the visual request log, for draining.
    pub fn effects_mut(&mut self) -> &mut EffectLog {
        &mut self.effects
    }

    /// The play session tally.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Simulated seconds so far.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Effect;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    const DT: f32 = 1.0 / 60.0;

    #[fixture]
    fn meadow() -> Simulation {
        Simulation::new(BirdConfig::default(), Terrain::flat(1.0), 7)
    }

    fn run(simulation: &mut Simulation, input: ControlInput, ticks: usize) -> Vec<TickReport> {
        (0..ticks).map(|_| simulation.tick(DT, input)).collect()
    }

    #[rstest]
    fn birds_start_in_their_role_default(mut meadow: Simulation) {
        let player = meadow.spawn_player(Vec3::new(0.0, 10.0, 0.0));
        let npc = meadow.spawn_npc(Vec3::new(5.0, 3.0, 0.0));
        assert_ne!(player, npc);
        assert_eq!(meadow.bird(player).map(Bird::kind), Some(StateKind::Flying));
        assert_eq!(meadow.bird(npc).map(Bird::kind), Some(StateKind::Landing));
    }

    #[rstest]
    fn landed_npc_starts_walking_on_ground_contact(mut meadow: Simulation) {
        let npc = meadow.spawn_npc(Vec3::new(5.0, 2.0, 0.0));
        let reports = run(&mut meadow, ControlInput::default(), 180);
        let transitions: Vec<_> = reports.iter().flat_map(|r| r.transitions.clone()).collect();
        assert_eq!(
            transitions,
            vec![Transition {
                agent: npc,
                from: StateKind::Landing,
                to: StateKind::Walking
            }]
        );
        let bird = meadow.bird(npc).expect("npc still present");
        assert!(bird.body().grounded());
        assert!(bird.agent().gravity);
    }

    #[rstest]
    fn forced_states_still_validate_the_role(mut meadow: Simulation) {
        let npc = meadow.spawn_npc(Vec3::new(5.0, 1.0, 0.0));
        assert!(meadow.force_state(npc, StateKind::Flying).is_none());
        assert!(meadow.force_state(AgentId(99), StateKind::Walking).is_none());
        let transition = meadow.force_state(npc, StateKind::Walking);
        assert_eq!(transition.map(|t| t.to), Some(StateKind::Walking));
    }

    #[rstest]
    fn walking_into_an_npc_collects_it(mut meadow: Simulation) {
        let player = meadow.spawn_player(Vec3::new(0.0, 1.0, 0.0));
        let npc = meadow.spawn_npc(Vec3::new(0.3, 1.0, 0.0));
        meadow.force_state(player, StateKind::Walking);

        let first = meadow.tick(DT, ControlInput::default());
        assert_eq!(first.discoveries, vec![Found { player, npc }]);
        assert!(meadow.bird(npc).is_some_and(Bird::fading));
        assert!(meadow.bird(player).is_some_and(|bird| bird.agent().is_frozen()));
        assert!(matches!(
            meadow.effects().effects().first(),
            Some(Effect::FoundFx { lifetime, .. }) if (*lifetime - 2.0).abs() < 1e-6
        ));

        let reports = run(&mut meadow, ControlInput::default(), 300);
        let despawned: Vec<_> = reports.iter().flat_map(|r| r.despawned.clone()).collect();
        assert_eq!(despawned, vec![npc]);
        assert!(reports.iter().all(|r| r.discoveries.is_empty()));
        assert!(meadow.bird(npc).is_none());
        assert_eq!(meadow.session().collected(), 1);
        assert!(meadow.effects().effects().contains(&Effect::CollectedIcon(0)));
        assert!(meadow.effects().effects().contains(&Effect::Despawn(npc)));
        assert!(!meadow.bird(player).is_some_and(|bird| bird.agent().is_frozen()));
    }

    #[rstest]
    fn elapsed_time_accumulates(mut meadow: Simulation) {
        run(&mut meadow, ControlInput::default(), 30);
        assert_relative_eq!(meadow.elapsed(), 0.5, epsilon = 1e-4);
    }
}
