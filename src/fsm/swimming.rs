//! Floating on the water surface.
use glam::Vec3;
use log::debug;

use super::{Frame, StateKind};
use crate::agent::{Agent, BoundingBox};
use crate::animation::{AnimParam, Clip};
use crate::config::SwimmingConfig;
use crate::constants::WORLD_UP;
use crate::motion::move_with_obstacle_avoidance;
use crate::vector_math::{flatten, lerp, lerp_vec, yaw_rotation};

/// Swimming state. Settles onto the surface until the swim-idle clip plays,
/// then paddles along it and climbs out where the shore is shallow.
#[derive(Debug, Clone, PartialEq)]
pub struct Swimming {
    water_level: f32,
    speed: f32,
    rotation_speed: f32,
    settled: bool,
}

impl Swimming {
    pub(super) fn enter(agent: &mut Agent, frame: &mut Frame<'_>) -> Self {
        let swimming = &frame.config.swimming;
        agent.gravity = false;
        agent.velocity = Vec3::ZERO;
        agent.pitch = agent.pose.pitch();
        agent.bounding = BoundingBox::new(Vec3::new(0.1, 0.1, 0.4), Vec3::new(0.0, 0.1, 0.2));
        Self {
            water_level: frame.world.water_level(),
            speed: swimming.swim_speed,
            rotation_speed: swimming.rotation_speed,
            settled: false,
        }
    }

    /// Whether the swim-idle clip has taken over and the bird is pinned to
    /// the surface.
    #[must_use]
    pub const fn settled(&self) -> bool {
        self.settled
    }

    /// Current swim speed.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    pub(super) fn update(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) -> Option<StateKind> {
        let config = frame.config;
        let swimming = &config.swimming;
        let dt = frame.dt;
        let drive = if frame.input.forward { 1.0 } else { 0.0 };
        frame.signal_controls(frame.input, drive);
        if agent.pitch != 0.0 {
            agent.pitch = lerp(agent.pitch, 0.0, swimming.pitch_reset_rate * dt);
            agent.apply_attitude();
        }

        if frame.animator.is_playing(Clip::SwimIdle) {
            self.settled = true;
            agent.pose.position.y = self.water_level;
            let (speed, rotation_speed) = if frame.input.boost {
                (
                    swimming.swim_speed * swimming.boost_multiplier,
                    swimming.rotation_speed * swimming.rotation_boost_multiplier,
                )
            } else {
                (swimming.swim_speed, swimming.rotation_speed)
            };
            self.speed = speed;
            self.rotation_speed = rotation_speed;
            self.swim(agent, frame);
            if self.shore_ahead(agent, frame, swimming) {
                debug!("bird {:?} climbing out of the water", agent.id);
                frame.animator.set_bool(AnimParam::Swim, false);
                return Some(StateKind::Walking);
            }
        } else {
            let rate = if agent.pose.position.y > self.water_level {
                swimming.settle_rate_above
            } else {
                swimming.settle_rate_below
            };
            let position = agent.pose.position;
            agent.pose.position = lerp_vec(position, position.with_y(self.water_level), rate * dt);
            self.speed = swimming.swim_speed;
            self.swim(agent, frame);
        }
        None
    }

    fn swim(&self, agent: &mut Agent, frame: &Frame<'_>) {
        let dt = frame.dt;
        if frame.input.forward {
            let target = flatten(agent.pose.forward()) * self.speed;
            move_with_obstacle_avoidance(agent, target, Vec3::ZERO, &frame.config.motion, dt);
        } else {
            agent.velocity = Vec3::ZERO;
        }

        let forward = agent.pose.forward();
        let turn = yaw_rotation(self.rotation_speed * frame.input.turn * dt, WORLD_UP);
        agent
            .pose
            .set_forward(lerp_vec(forward, turn * forward, frame.config.walking.turn_follow));
    }

    /// Shallow ground just ahead and footing directly below.
    fn shore_ahead(&self, agent: &Agent, frame: &Frame<'_>, swimming: &SwimmingConfig) -> bool {
        let sensor = frame.sensor();
        let position = agent.pose.position;
        let ahead = sensor
            .ground_below(
                position + agent.pose.forward() * swimming.shore_probe_offset,
                swimming.shore_probe_distance,
            )
            .is_some_and(|hit| hit.distance < swimming.shore_distance);
        ahead
            && sensor
                .ground_below(position, swimming.footing_distance)
                .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationSink;
    use crate::fsm::test_support::{player_at, Harness};
    use crate::input::ControlInput;
    use crate::terrain::Terrain;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const DT: f32 = 1.0 / 60.0;

    fn forward() -> ControlInput {
        ControlInput {
            forward: true,
            ..ControlInput::default()
        }
    }

    #[rstest]
    fn entering_floats_the_bird() {
        let mut harness = Harness::new(Terrain::flat(-5.0), Clip::Idle);
        let mut agent = player_at(Vec3::new(0.0, -0.3, 0.0));
        agent.pose.set_attitude(0.0, 20.0, 0.0);
        agent.gravity = true;
        agent.velocity = Vec3::X;
        let state = Swimming::enter(&mut agent, &mut harness.frame(DT, ControlInput::default()));
        assert!(!agent.gravity);
        assert_eq!(agent.velocity, Vec3::ZERO);
        assert_relative_eq!(agent.pitch, 20.0, epsilon = 1e-3);
        assert_relative_eq!(agent.bounding.size.y, 0.1);
        assert!(!state.settled());
    }

    #[rstest]
    #[case::from_above(0.5, 2.0)]
    #[case::from_below(-0.3, 12.0)]
    fn surfaces_before_the_swim_clip(#[case] start: f32, #[case] rate: f32) {
        let mut harness = Harness::new(Terrain::flat(-5.0), Clip::Idle);
        let mut agent = player_at(Vec3::new(0.0, start, 0.0));
        let mut state = Swimming::enter(&mut agent, &mut harness.frame(DT, ControlInput::default()));
        assert!(state
            .update(&mut agent, &mut harness.frame(DT, ControlInput::default()))
            .is_none());
        assert_relative_eq!(agent.pose.position.y, start * (1.0 - rate * DT), epsilon = 1e-5);
        assert!(!state.settled());
    }

    #[rstest]
    fn settled_bird_is_pinned_and_paddles_flat() {
        let mut harness = Harness::new(Terrain::flat(-5.0), Clip::SwimIdle);
        let mut agent = player_at(Vec3::new(0.0, -0.2, 0.0));
        agent.pose.set_attitude(0.0, 10.0, 0.0);
        let mut state = Swimming::enter(&mut agent, &mut harness.frame(DT, ControlInput::default()));
        for _ in 0..60 {
            assert!(state.update(&mut agent, &mut harness.frame(DT, forward())).is_none());
        }
        assert!(state.settled());
        assert!(agent.pose.position.z < -1.0);
        assert!(agent.velocity.y.abs() < 1e-4, "paddles along the surface");
        assert!(agent.pitch.abs() < 10.0);
    }

    #[rstest]
    fn boost_doubles_paddling_speed() {
        let mut harness = Harness::new(Terrain::flat(-5.0), Clip::SwimIdle);
        let mut agent = player_at(Vec3::ZERO);
        let mut state = Swimming::enter(&mut agent, &mut harness.frame(DT, ControlInput::default()));
        let input = ControlInput {
            boost: true,
            ..forward()
        };
        state.update(&mut agent, &mut harness.frame(DT, input));
        assert_relative_eq!(state.speed(), 10.0);
    }

    #[rstest]
    fn turning_on_the_water() {
        let mut harness = Harness::new(Terrain::flat(-5.0), Clip::SwimIdle);
        let mut agent = player_at(Vec3::ZERO);
        let mut state = Swimming::enter(&mut agent, &mut harness.frame(DT, ControlInput::default()));
        let input = ControlInput {
            turn: -1.0,
            ..ControlInput::default()
        };
        for _ in 0..60 {
            state.update(&mut agent, &mut harness.frame(DT, input));
        }
        assert_relative_eq!(harness.animator.value(AnimParam::Turn), -1.0);
        assert_relative_eq!(harness.animator.value(AnimParam::Forward), 0.0);
        assert!(agent.pose.forward().x < -0.2, "negative turn heads left");
        assert_eq!(agent.velocity, Vec3::ZERO);
    }

    #[rstest]
    fn shallow_shore_hands_back_to_walking() {
        let mut harness = Harness::new(Terrain::flat(-0.1), Clip::SwimIdle);
        harness.animator.set_bool(AnimParam::Swim, true);
        let mut agent = player_at(Vec3::ZERO);
        let mut state = Swimming::enter(&mut agent, &mut harness.frame(DT, ControlInput::default()));
        assert_eq!(
            state.update(&mut agent, &mut harness.frame(DT, ControlInput::default())),
            Some(StateKind::Walking)
        );
        assert!(!harness.animator.flag(AnimParam::Swim));
    }

    #[rstest]
    fn deep_water_keeps_swimming() {
        let mut harness = Harness::new(Terrain::flat(-5.0), Clip::SwimIdle);
        let mut agent = player_at(Vec3::ZERO);
        let mut state = Swimming::enter(&mut agent, &mut harness.frame(DT, ControlInput::default()));
        for _ in 0..30 {
            assert!(state.update(&mut agent, &mut harness.frame(DT, forward())).is_none());
        }
    }
}
