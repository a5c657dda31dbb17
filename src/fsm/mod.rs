//! The locomotion state machine.
//!
//! [`State`] is a closed set of variants, each owning only the locals it needs.
//! A state is built fresh by [`State::enter`] on every transition, so nothing
//! from a previous visit survives. Updates never switch state themselves; they
//! return the [`StateKind`] they want next and the
//! [`Controller`](crate::controller::Controller) performs exit and enter before
//! the tick returns.
use std::fmt;

use glam::Vec3;

use crate::agent::{Agent, AgentId, Role};
use crate::animation::{AnimParam, AnimationSink};
use crate::config::BirdConfig;
use crate::input::ControlInput;
use crate::sensor::{Sensor, Surroundings};

mod flying;
mod in_air;
mod jumping;
mod landing;
mod npc_walking;
mod swimming;
mod taking_flight;
#[cfg(test)]
pub(crate) mod test_support;
mod walking;

pub use flying::{arc_step, ArcStep, Flying};
pub use jumping::{jump_offset, Jumping};
pub use landing::Landing;
pub use npc_walking::NpcWalking;
pub use swimming::Swimming;
pub use taking_flight::TakingFlight;
pub use walking::{GroundWalker, PlayerWalking};

/// How high a ledge hop reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpHeight {
    /// Scaled-down hop onto a low ledge.
    Short,
    /// Full hop onto a high ledge.
    Tall,
}

/// The closed set of locomotion modes.
///
/// `Walking` resolves to the player or NPC variant from the agent's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// Free flight.
    Flying,
    /// Springing off the ground.
    TakingFlight,
    /// Scripted ledge hop.
    Jumping(JumpHeight),
    /// Levelling off and sinking onto the ground.
    Landing,
    /// On the ground.
    Walking,
    /// On the water surface.
    Swimming,
}

impl StateKind {
    /// Whether a bird with `role` may ever be in this state.
    #[must_use]
    pub const fn allowed_for(self, role: Role) -> bool {
        match role {
            Role::Player => true,
            Role::Npc => matches!(self, Self::Landing | Self::Walking),
        }
    }

    /// Whether climbable volumes are counted while in this state.
    #[must_use]
    pub const fn tracks_bounds(self) -> bool {
        matches!(self, Self::Walking | Self::Swimming)
    }

    /// Whether the kinds match, ignoring the jump height.
    #[must_use]
    pub const fn same_mode(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Flying, Self::Flying)
                | (Self::TakingFlight, Self::TakingFlight)
                | (Self::Jumping(_), Self::Jumping(_))
                | (Self::Landing, Self::Landing)
                | (Self::Walking, Self::Walking)
                | (Self::Swimming, Self::Swimming)
        )
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flying => f.write_str("flying"),
            Self::TakingFlight => f.write_str("taking flight"),
            Self::Jumping(JumpHeight::Short) => f.write_str("jumping (short)"),
            Self::Jumping(JumpHeight::Tall) => f.write_str("jumping (tall)"),
            Self::Landing => f.write_str("landing"),
            Self::Walking => f.write_str("walking"),
            Self::Swimming => f.write_str("swimming"),
        }
    }
}

/// What a bird collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Anything on the ground layer.
    Ground,
    /// Another bird.
    Bird {
        /// The other bird.
        id: AgentId,
        /// Its role.
        role: Role,
    },
}

/// Side effect a collision asks the simulation to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// The player walked into this NPC.
    Discovered(AgentId),
}

/// Result of routing a collision through the active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionOutcome {
    /// Requested transition, if any.
    pub next: Option<StateKind>,
    /// Requested reaction, if any.
    pub reaction: Option<Reaction>,
}

impl CollisionOutcome {
    const fn transition(next: StateKind) -> Self {
        Self {
            next: Some(next),
            reaction: None,
        }
    }
}

/// Everything a state may read or signal during one call.
pub struct Frame<'a> {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Control intent for this bird.
    pub input: ControlInput,
    /// Ground queries, terrain height and water level.
    pub world: &'a dyn Surroundings,
    /// The bird's animation sink.
    pub animator: &'a mut dyn AnimationSink,
    /// Tuning.
    pub config: &'a BirdConfig,
    /// Where the player is, for NPCs.
    pub player_position: Option<Vec3>,
}

impl<'a> Frame<'a> {
    /// Probe against the ground layer of this frame's world.
    #[must_use]
    pub fn sensor(&self) -> Sensor<'a> {
        Sensor::new(self.world)
    }

    /// Mirrors `input` into the animation graph, with `forward` as the
    /// drive. An attack press fires the trigger once.
    pub(crate) fn signal_controls(&mut self, input: ControlInput, forward: f32) {
        self.animator.set_float(AnimParam::Forward, forward);
        self.animator.set_float(AnimParam::Turn, input.turn);
        self.animator.set_float(AnimParam::Vertical, input.vertical);
        if input.attack {
            self.animator.set_trigger(AnimParam::Attack);
        }
    }
}

/// The active locomotion state and its locals.
#[derive(Debug, Clone)]
pub enum State {
    /// See [`Flying`].
    Flying(Flying),
    /// See [`TakingFlight`].
    TakingFlight(TakingFlight),
    /// See [`Jumping`].
    Jumping(Jumping),
    /// See [`Landing`].
    Landing(Landing),
    /// See [`PlayerWalking`].
    PlayerWalking(PlayerWalking),
    /// See [`NpcWalking`].
    NpcWalking(NpcWalking),
    /// See [`Swimming`].
    Swimming(Swimming),
}

impl State {
    /// Builds a fresh `kind` state and runs its entry logic.
    pub fn enter(kind: StateKind, agent: &mut Agent, frame: &mut Frame<'_>) -> Self {
        match kind {
            StateKind::Flying => Self::Flying(Flying::enter(agent, frame)),
            StateKind::TakingFlight => Self::TakingFlight(TakingFlight::enter(agent, frame)),
            StateKind::Jumping(height) => Self::Jumping(Jumping::enter(agent, frame, height)),
            StateKind::Landing => Self::Landing(Landing::enter(agent, frame)),
            StateKind::Walking => match agent.role {
                Role::Player => Self::PlayerWalking(PlayerWalking::enter(agent, frame)),
                Role::Npc => Self::NpcWalking(NpcWalking::enter(agent, frame)),
            },
            StateKind::Swimming => Self::Swimming(Swimming::enter(agent, frame)),
        }
    }

    /// Which mode this is.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::Flying(_) => StateKind::Flying,
            Self::TakingFlight(_) => StateKind::TakingFlight,
            Self::Jumping(jumping) => StateKind::Jumping(jumping.height()),
            Self::Landing(_) => StateKind::Landing,
            Self::PlayerWalking(_) | Self::NpcWalking(_) => StateKind::Walking,
            Self::Swimming(_) => StateKind::Swimming,
        }
    }

    /// Runs one frame and returns the state to switch to, if any.
    pub fn update(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) -> Option<StateKind> {
        match self {
            Self::Flying(state) => state.update(agent, frame),
            Self::TakingFlight(state) => state.update(agent, frame),
            Self::Jumping(state) => state.update(agent, frame),
            Self::Landing(state) => state.update(agent, frame),
            Self::PlayerWalking(state) => state.update(agent, frame),
            Self::NpcWalking(state) => state.update(agent, frame),
            Self::Swimming(state) => state.update(agent, frame),
        }
    }

    /// Runs exit logic. Called exactly once, before the next state enters.
    pub fn exit(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) {
        match self {
            Self::TakingFlight(state) => state.exit(frame),
            Self::Jumping(state) => state.exit(agent, frame),
            Self::Flying(_)
            | Self::Landing(_)
            | Self::PlayerWalking(_)
            | Self::NpcWalking(_)
            | Self::Swimming(_) => {}
        }
    }

    /// Lets the state react to a collision.
    #[must_use]
    pub fn on_collision(&self, contact: Contact) -> CollisionOutcome {
        match (self, contact) {
            (Self::Jumping(_) | Self::Landing(_), Contact::Ground) => {
                CollisionOutcome::transition(StateKind::Walking)
            }
            (
                Self::PlayerWalking(_),
                Contact::Bird {
                    id,
                    role: Role::Npc,
                },
            ) => CollisionOutcome {
                next: None,
                reaction: Some(Reaction::Discovered(id)),
            },
            _ => CollisionOutcome::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StateKind::Landing, true)]
    #[case(StateKind::Walking, true)]
    #[case(StateKind::Flying, false)]
    #[case(StateKind::Swimming, false)]
    #[case(StateKind::Jumping(JumpHeight::Tall), false)]
    fn npcs_only_land_and_walk(#[case] kind: StateKind, #[case] allowed: bool) {
        assert_eq!(kind.allowed_for(Role::Npc), allowed);
        assert!(kind.allowed_for(Role::Player));
    }

    #[rstest]
    fn jump_heights_share_a_mode() {
        assert!(StateKind::Jumping(JumpHeight::Short).same_mode(StateKind::Jumping(JumpHeight::Tall)));
        assert!(!StateKind::Walking.same_mode(StateKind::Swimming));
    }

    #[rstest]
    fn only_ground_and_water_states_track_bounds() {
        assert!(StateKind::Walking.tracks_bounds());
        assert!(StateKind::Swimming.tracks_bounds());
        assert!(!StateKind::Flying.tracks_bounds());
        assert!(!StateKind::Landing.tracks_bounds());
    }
}
