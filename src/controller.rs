//! Per-bird owner of the active locomotion state.
//!
//! The controller is the only code that replaces a bird's [`State`]. Every
//! switch runs the outgoing state's exit before the incoming state's enter,
//! and both finish before control returns to the caller.
use log::{debug, warn};

use crate::agent::{Agent, AgentId, Role};
use crate::bounds::{VolumeId, VolumeTag};
use crate::fsm::{Contact, Frame, Reaction, State, StateKind};

/// State a freshly spawned bird starts in.
#[must_use]
pub const fn initial_state(role: Role) -> StateKind {
    match role {
        Role::Player => StateKind::Flying,
        Role::Npc => StateKind::Landing,
    }
}

/// A completed state switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Bird that switched.
    pub agent: AgentId,
    /// State that exited.
    pub from: StateKind,
    /// State that entered.
    pub to: StateKind,
}

/// What a routed collision caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionReport {
    /// Switch carried out in response, if any.
    pub transition: Option<Transition>,
    /// Reaction the simulation still has to carry out.
    pub reaction: Option<Reaction>,
}

/// Owns exactly one active state for one bird.
#[derive(Debug, Clone)]
pub struct Controller {
    state: State,
}

impl Controller {
    /// Enters `initial` for `agent`. A state the role may never be in is
    /// replaced by the role's default.
    pub fn new(initial: StateKind, agent: &mut Agent, frame: &mut Frame<'_>) -> Self {
        let kind = if initial.allowed_for(agent.role) {
            initial
        } else {
            let fallback = initial_state(agent.role);
            warn!(
                "{:?} bird {:?} cannot start {initial}; starting {fallback}",
                agent.role, agent.id
            );
            fallback
        };
        debug!("bird {:?} starting {kind}", agent.id);
        Self {
            state: State::enter(kind, agent, frame),
        }
    }

    /// The active state.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Which mode is active.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        self.state.kind()
    }

    /// Exits the active state and enters `next`.
    ///
    /// Requests the role does not allow, or for the mode already active, are
    /// ignored and return `None`.
    pub fn switch(
        &mut self,
        agent: &mut Agent,
        next: StateKind,
        frame: &mut Frame<'_>,
    ) -> Option<Transition> {
        let from = self.kind();
        if !next.allowed_for(agent.role) {
            warn!(
                "ignoring {next} for {:?} bird {:?}",
                agent.role, agent.id
            );
            return None;
        }
        if from.same_mode(next) {
            debug!("bird {:?} already {from}; ignoring {next}", agent.id);
            return None;
        }
        self.state.exit(agent, frame);
        self.state = State::enter(next, agent, frame);
        let to = self.kind();
        debug!("bird {:?}: {from} -> {to}", agent.id);
        Some(Transition {
            agent: agent.id,
            from,
            to,
        })
    }

    /// Runs one frame of the active state and carries out any switch it
    /// asks for.
    pub fn tick(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) -> Option<Transition> {
        agent.advance_freeze(frame.dt);
        let next = self.state.update(agent, frame)?;
        self.switch(agent, next, frame)
    }

    /// Routes a collision through the active state.
    pub fn on_collision(
        &mut self,
        agent: &mut Agent,
        contact: Contact,
        frame: &mut Frame<'_>,
    ) -> CollisionReport {
        let outcome = self.state.on_collision(contact);
        let transition = outcome
            .next
            .and_then(|next| self.switch(agent, next, frame));
        CollisionReport {
            transition,
            reaction: outcome.reaction,
        }
    }

    /// A trigger volume started overlapping the bird. Outside ground and
    /// water states any trigger clears the count; otherwise only climbable
    /// volumes count.
    pub fn on_trigger_enter(&self, agent: &mut Agent, volume: VolumeId, tag: VolumeTag) -> bool {
        if !self.kind().tracks_bounds() {
            agent.bounds.clear();
            return false;
        }
        tag == VolumeTag::Climbable && agent.bounds.enter(volume, true)
    }

    /// A trigger volume stopped overlapping the bird.
    pub fn on_trigger_exit(&self, agent: &mut Agent, volume: VolumeId, tag: VolumeTag) -> bool {
        if tag != VolumeTag::Climbable {
            return false;
        }
        agent.bounds.exit(volume)
    }
}
