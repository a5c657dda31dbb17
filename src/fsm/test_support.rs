//! Fixtures for driving single states in unit tests.

use glam::Vec3;

use crate::agent::{Agent, AgentId, Role};
use crate::animation::{Animator, Clip};
use crate::config::BirdConfig;
use crate::input::ControlInput;
use crate::terrain::Terrain;

use super::Frame;

/// World, animator and tuning for one bird.
pub(crate) struct Harness {
    pub terrain: Terrain,
    pub animator: Animator,
    pub config: BirdConfig,
    pub player_position: Option<Vec3>,
}

impl Harness {
    /// Harness over `terrain` with the animator already playing `clip`.
    pub fn new(terrain: Terrain, clip: Clip) -> Self {
        Self {
            terrain,
            animator: Animator::with_dwell(clip, 0.0),
            config: BirdConfig::default(),
            player_position: None,
        }
    }

    /// Frame of `dt` seconds carrying `input`.
    pub fn frame(&mut self, dt: f32, input: ControlInput) -> Frame<'_> {
        Frame {
            dt,
            input,
            world: &self.terrain,
            animator: &mut self.animator,
            config: &self.config,
            player_position: self.player_position,
        }
    }
}

/// Player bird standing at `position`.
pub(crate) fn player_at(position: Vec3) -> Agent {
    Agent::new(AgentId(1), Role::Player, position, 11)
}

/// NPC bird standing at `position`.
pub(crate) fn npc_at(position: Vec3) -> Agent {
    Agent::new(AgentId(2), Role::Npc, position, 11)
}
