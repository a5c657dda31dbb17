//! Springing off the ground into free flight.
use glam::Vec3;
use log::debug;

use super::in_air::{clamp_attitude, reset_left_right, reset_up_down};
use super::{Frame, StateKind};
use crate::agent::{Agent, BoundingBox};
use crate::animation::{AnimParam, Clip};
use crate::motion::move_with_obstacle_avoidance;

/// Lift-off state. Waits for the lift-off clip, then climbs along the
/// forward/up bisector until high enough to fly.
#[derive(Debug, Clone, PartialEq)]
pub struct TakingFlight {
    start_height: f32,
    lift_started: bool,
}

impl TakingFlight {
    pub(super) fn enter(agent: &mut Agent, frame: &mut Frame<'_>) -> Self {
        agent.gravity = false;
        // Whatever slope the bird stood on becomes its starting attitude.
        agent.tilt = agent.pose.roll();
        agent.pitch = agent.pose.pitch();
        clamp_attitude(agent, frame.config.in_air.max_down_tilt, &frame.config.in_air);
        agent.bounding = BoundingBox::new(Vec3::new(1.4, 0.2, 1.4), Vec3::new(0.0, 0.2, 0.7));
        Self {
            start_height: agent.pose.position.y,
            lift_started: false,
        }
    }

    /// Whether the bird has started climbing.
    #[must_use]
    pub const fn lift_started(&self) -> bool {
        self.lift_started
    }

    pub(super) fn update(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) -> Option<StateKind> {
        let config = frame.config;
        let dt = frame.dt;
        if frame.animator.is_playing(Clip::LiftOff) {
            frame.animator.set_bool(AnimParam::Landed, false);
            frame.animator.set_bool(AnimParam::TakeFlight, false);
            if !self.lift_started {
                debug!("bird {:?} lifting off", agent.id);
            }
            self.lift_started = true;
        }

        if self.lift_started {
            let up = agent.pose.up();
            let lift = (agent.pose.forward() + up).normalize_or_zero() * config.taking_flight.lift_off_speed;
            move_with_obstacle_avoidance(agent, lift, up, &config.motion, dt);
            reset_left_right(agent, &config.in_air, config.taking_flight.roll_reset_scale, dt);
            reset_up_down(agent, &config.in_air, dt);
            agent.apply_attitude();
        }

        (agent.pose.position.y - self.start_height > config.taking_flight.transition_height)
            .then_some(StateKind::Flying)
    }

    pub(super) fn exit(&mut self, frame: &mut Frame<'_>) {
        frame.animator.set_bool(AnimParam::TakeFlight, false);
    }
}
