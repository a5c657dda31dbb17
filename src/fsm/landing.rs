//! Levelling off and sinking onto the ground.
use glam::Vec3;

use super::in_air::{reset_left_right, reset_up_down};
use super::{Frame, StateKind};
use crate::agent::Agent;
use crate::constants::WORLD_DOWN;
use crate::motion::{move_towards, Blend};

/// Landing state. Hovers until level, then sinks straight down. Leaves only
/// through a ground contact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Landing {
    sinking: bool,
}

impl Landing {
    pub(super) fn enter(agent: &mut Agent, _frame: &mut Frame<'_>) -> Self {
        agent.gravity = false;
        Self::default()
    }

    /// Whether the bird was level enough to sink on the last frame.
    #[must_use]
    pub const fn sinking(&self) -> bool {
        self.sinking
    }

    pub(super) fn update(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) -> Option<StateKind> {
        let config = frame.config;
        let dt = frame.dt;
        reset_left_right(agent, &config.in_air, 1.0, dt);
        reset_up_down(agent, &config.in_air, dt);
        agent.apply_attitude();

        let tolerance = config.landing.level_tolerance;
        self.sinking = agent.tilt.abs() < tolerance && agent.pitch.abs() < tolerance;
        let target = if self.sinking { WORLD_DOWN } else { Vec3::ZERO };
        move_towards(agent, target, Blend::Fixed(config.landing.descent_blend), dt);
        None
    }
}
