//! Free flight: straight, banked arcs and climbing helices.
//!
//! The nose is allowed to dive less as the ground gets closer, and the bird
//! slides along walls and the ground rather than stopping dead.
use std::f32::consts::PI;

use glam::{Quat, Vec3};
use log::debug;

use super::in_air::{clamp_attitude, reset_left_right, reset_up_down, tilt_left_right, tilt_up_down};
use super::{Frame, StateKind};
use crate::agent::{Agent, BoundingBox, Pose};
use crate::animation::AnimParam;
use crate::config::{BirdConfig, FlyingConfig, InAirConfig};
use crate::constants::{MIN_DELTA_TIME, WORLD_UP};
use crate::motion::move_with_obstacle_avoidance;
use crate::sensor::{GroundSample, Sensor};
use crate::vector_math::{lerp_vec, quantize};

/// One frame of circling about a pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcStep {
    /// Orientation after turning.
    pub rotation: Quat,
    /// Displacement over the frame divided by the frame time.
    pub velocity: Vec3,
}

/// Turns `pose` about `pivot` so that it travels `speed` along a circle of
/// `radius`. A positive `turn` circles clockwise seen from above.
///
/// The returned velocity is the chord over `dt`, which approaches `speed` as
/// `dt` shrinks.
#[must_use]
pub fn arc_step(pose: &Pose, pivot: Vec3, turn: f32, speed: f32, radius: f32, dt: f32) -> ArcStep {
    let degrees_per_second = speed * 180.0 / (radius * PI);
    let axis = if turn > 0.0 { Vec3::NEG_Y } else { Vec3::Y };
    let spin = Quat::from_axis_angle(axis, (degrees_per_second * dt).to_radians());
    let target = spin * (pose.position - pivot) + pivot;
    let velocity = if dt > MIN_DELTA_TIME {
        (target - pose.position) / dt
    } else {
        Vec3::ZERO
    };
    ArcStep {
        rotation: (spin * pose.rotation).normalize(),
        velocity,
    }
}

/// Free-flight state.
#[derive(Debug, Clone, PartialEq)]
pub struct Flying {
    min_height: f32,
    speed: f32,
    dive_limit: f32,
    ground: GroundSample,
    target_velocity: Vec3,
}

impl Flying {
    pub(super) fn enter(agent: &mut Agent, frame: &mut Frame<'_>) -> Self {
        agent.gravity = false;
        agent.bounding = BoundingBox::new(Vec3::new(1.4, 1.0, 6.0), Vec3::new(0.0, 0.3, 3.0));
        let config = frame.config;
        Self {
            min_height: frame.world.water_level() - config.flying.water_clearance,
            speed: config.flying.fly_speed,
            dive_limit: config.in_air.max_down_tilt,
            ground: GroundSample::default(),
            target_velocity: Vec3::ZERO,
        }
    }

    /// Velocity requested on the last frame.
    #[must_use]
    pub const fn target_velocity(&self) -> Vec3 {
        self.target_velocity
    }

    /// Largest nose-down pitch allowed on the last frame.
    #[must_use]
    pub const fn dive_limit(&self) -> f32 {
        self.dive_limit
    }

    /// Ground sampled on the last frame.
    #[must_use]
    pub const fn ground(&self) -> &GroundSample {
        &self.ground
    }

    /// Lowest height the bird may fly at when no ground is close.
    #[must_use]
    pub const fn min_height(&self) -> f32 {
        self.min_height
    }

    /// Whether the last ground sample allows a landing at the current pitch.
    #[must_use]
    pub fn can_land(&self, agent: &Agent, config: &FlyingConfig) -> bool {
        self.ground.has_ground
            && self.ground.slope < config.land_max_slope
            && agent.pitch > config.land_min_pitch
            && self.ground.distance <= config.can_land_height
    }

    pub(super) fn update(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) -> Option<StateKind> {
        let config = frame.config;
        self.speed = config.flying.fly_speed;
        if frame.input.boost {
            self.speed *= config.flying.boost_multiplier;
        }
        frame.signal_controls(frame.input, 1.0);
        let sensor = frame.sensor();
        self.ground = GroundSample::take(&sensor, agent.pose.position, agent.pose.forward());

        if frame.input.land && self.can_land(agent, &config.flying) {
            debug!("bird {:?} landing from {:.2} up", agent.id, self.ground.distance);
            frame.animator.set_bool(AnimParam::Landing, true);
            return Some(StateKind::Landing);
        }

        self.fly(agent, frame, &sensor, config);
        None
    }

    fn fly(&mut self, agent: &mut Agent, frame: &mut Frame<'_>, sensor: &Sensor<'_>, config: &BirdConfig) {
        let in_air = &config.in_air;
        let flying = &config.flying;
        let dt = frame.dt;
        let turn = frame.input.turn;
        let vertical = frame.input.vertical;

        self.dive_limit =
            self.ground_limited_dive(agent.pose.position.y, sensor.water_level(), flying, in_air);

        let climbing = vertical != 0.0;
        let turning = turn != 0.0;
        match (climbing, turning) {
            (false, false) => {
                reset_up_down(agent, in_air, dt);
                self.target_velocity = agent.pose.forward() * self.speed;
                reset_left_right(agent, in_air, 1.0, dt);
            }
            (true, false) => {
                tilt_up_down(agent, vertical, self.dive_limit, in_air, dt);
                self.target_velocity = agent.pose.forward() * self.speed;
                reset_left_right(agent, in_air, 1.0, dt);
            }
            (false, true) => {
                reset_up_down(agent, in_air, dt);
                tilt_left_right(agent, turn, in_air, dt);
                self.target_velocity = self.arc(agent, turn, flying, dt);
            }
            (true, true) => {
                tilt_left_right(agent, turn, in_air, dt);
                tilt_up_down(agent, vertical, self.dive_limit, in_air, dt);
                let arc = self.arc(agent, turn, flying, dt);
                let climb = WORLD_UP * (vertical * self.speed / flying.climb_divisor);
                self.target_velocity = (arc + climb).normalize_or_zero() * self.speed;
            }
        }
        clamp_attitude(agent, self.dive_limit, in_air);

        // Flap when climbing or flying straight, glide otherwise.
        let flapping = vertical > 0.0 || (!climbing && !turning);
        frame.animator.set_bool(AnimParam::Glide, !flapping);

        let bounded = self.bounded_position(agent, sensor, flying);
        agent.pose.position = lerp_vec(agent.pose.position, bounded, flying.bound_follow);

        self.target_velocity =
            move_with_obstacle_avoidance(agent, self.target_velocity, Vec3::ZERO, &config.motion, dt);
        agent.pose.position.y = agent.pose.position.y.min(flying.max_height);
        agent.apply_attitude();
    }

    /// Nose-down limit for the current clearance. Shrinks in quantised steps
    /// across the level-off band and may follow a slope falling away below.
    fn ground_limited_dive(&self, height: f32, water: f32, flying: &FlyingConfig, in_air: &InAirConfig) -> f32 {
        let clearance = if self.ground.has_ground {
            self.ground.distance
        } else {
            height - water
        };
        if clearance >= flying.level_off_height {
            return in_air.max_down_tilt;
        }
        if self.descending_slope_below(flying) {
            return -self.ground.signed_slope;
        }
        if clearance < flying.level_height {
            return 0.0;
        }
        let band = flying.level_off_height - flying.level_height;
        quantize(
            (clearance - flying.level_height) * in_air.max_down_tilt / band,
            flying.pitch_step,
        )
    }

    fn descending_slope_below(&self, flying: &FlyingConfig) -> bool {
        self.ground.has_ground
            && self.ground.distance < flying.level_height
            && self.ground.signed_slope < 0.0
    }

    fn pivot(&self, pose: &Pose, turn: f32, flying: &FlyingConfig) -> Vec3 {
        let side = if turn > 0.0 { 1.0 } else { -1.0 };
        let mut pivot = pose.position + pose.right() * (flying.arc_radius * side);
        if self.descending_slope_below(flying) {
            pivot.y = self.ground.height + flying.level_height;
        }
        pivot
    }

    fn arc(&self, agent: &mut Agent, turn: f32, flying: &FlyingConfig, dt: f32) -> Vec3 {
        let pivot = self.pivot(&agent.pose, turn, flying);
        let step = arc_step(&agent.pose, pivot, turn, self.speed, flying.arc_radius, dt);
        agent.pose.rotation = step.rotation;
        step.velocity
    }

    /// Position clamped between the floor and the ceiling, pushed off nearby
    /// surfaces. Skimming damps the requested velocity.
    fn bounded_position(&mut self, agent: &Agent, sensor: &Sensor<'_>, flying: &FlyingConfig) -> Vec3 {
        let pose = &agent.pose;
        let floor = if self.ground.has_ground && self.ground.distance < flying.level_height {
            self.ground.height + flying.level_height
        } else {
            self.min_height
        };
        let mut bounded = pose.position;
        bounded.y = bounded.y.max(floor).min(flying.max_height);

        let reach = flying.skim_distance;
        let mut skimmed = sensor
            .obstacle_ahead(pose.position, pose.forward(), reach)
            .map(|hit| bounded + hit.normal * (reach - hit.distance));
        // Sideways skimming too close to the ground makes the bird shuffle.
        let clear_below = !self.ground.has_ground || self.ground.distance > reach;
        if clear_below {
            let side = sensor
                .probe(pose.position, -pose.right(), reach)
                .or_else(|| sensor.probe(pose.position, pose.right(), reach));
            if let Some(hit) = side {
                skimmed = Some(bounded + hit.normal * (reach - hit.distance));
            }
        }

        match skimmed {
            Some(position) => {
                self.target_velocity /= flying.skim_damping;
                position
            }
            None => bounded,
        }
    }
}
