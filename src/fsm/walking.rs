//! Ground locomotion.
//!
//! [`GroundWalker`] holds everything the player and NPC walkers share: fall
//! detection, the edge and steep-slope fan, terrain-following orientation and
//! the walk step itself. [`PlayerWalking`] layers the player's commands on top.
use glam::Vec3;
use log::debug;

use super::{Frame, JumpHeight, StateKind};
use crate::agent::{Agent, BoundingBox};
use crate::animation::{AnimParam, Clip};
use crate::config::{BirdConfig, WalkingConfig};
use crate::input::ControlInput;
use crate::constants::WORLD_UP;
use crate::motion::move_with_obstacle_avoidance;
use crate::sensor::{RayHit, Sensor, SurfaceKind};
use crate::vector_math::{angle_between, flatten, lerp_vec, project_on_plane, slerp_dir, yaw_rotation};

/// Height above the feet the position probe starts from.
const POSITION_PROBE_LIFT: f32 = 0.1;
/// Reach of the position probe.
const POSITION_PROBE_DISTANCE: f32 = 10.0;
/// Closer than this to land, slope changes are followed without smoothing.
const LAND_CONTACT_DISTANCE: f32 = 0.2;
/// Closer than this to a bridge, the bird stands upright.
const BRIDGE_CONTACT_DISTANCE: f32 = 0.4;
/// Height above the feet the edge fan starts from.
const EDGE_PROBE_LIFT: f32 = 0.5;
/// Reach of the terrain-normal probe along the bird's down.
const TERRAIN_PROBE_DISTANCE: f32 = 2.0;
/// Body/terrain angle beyond which the normal is always smoothed.
const SHARP_BODY_ANGLE: f32 = 60.0;
/// Frame-to-frame normal change that counts as a ridge.
const RIDGE_ANGLE: f32 = 10.0;
/// Horizontal offset and height of the jump clearance probe.
const JUMP_PROBE_OFFSET: f32 = 1.0;

/// State shared by every walking bird.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundWalker {
    min_height: f32,
    just_landed: bool,
    falling: bool,
    was_falling: bool,
    smoothing: bool,
    on_bridge: bool,
    ground: Option<RayHit>,
    near_edge: bool,
    near_steep_slope: bool,
    can_move_forward: bool,
    last_normal: Vec3,
    goal_forward: Vec3,
    terrain_angle: f32,
    speed: f32,
    rotation_speed: f32,
    locked_position: Vec3,
}

impl GroundWalker {
    pub(super) fn enter(agent: &mut Agent, frame: &mut Frame<'_>) -> Self {
        agent.gravity = true;
        agent.velocity = Vec3::ZERO;
        agent.pitch = 0.0;
        agent.tilt = 0.0;
        // Touching down close to the ground can beat the landing clip.
        let still_flapping = frame.animator.is_playing(Clip::FlapForward);
        frame.animator.set_bool(AnimParam::Landing, still_flapping);
        frame.animator.set_bool(AnimParam::Landed, true);
        frame.animator.set_bool(AnimParam::Glide, false);
        agent.bounding = BoundingBox::new(Vec3::new(0.1, 0.3, 0.4), Vec3::new(0.0, 0.4, 0.2));

        let walking = &frame.config.walking;
        Self {
            min_height: frame.world.water_level() - walking.water_clearance,
            just_landed: true,
            falling: false,
            was_falling: true,
            smoothing: true,
            on_bridge: false,
            ground: None,
            near_edge: false,
            near_steep_slope: false,
            can_move_forward: true,
            last_normal: WORLD_UP,
            goal_forward: flatten(agent.pose.forward()),
            terrain_angle: 0.0,
            speed: walking.walk_speed,
            rotation_speed: walking.rotation_speed,
            locked_position: agent.pose.position,
        }
    }

    /// Lowest height the bird may stand at before it has to swim.
    #[must_use]
    pub const fn min_height(&self) -> f32 {
        self.min_height
    }

    /// The ground is more than a short step below the feet, or missing.
    #[must_use]
    pub const fn falling(&self) -> bool {
        self.falling
    }

    /// Distance from just above the feet down to the ground, if any.
    #[must_use]
    pub fn ground_distance(&self) -> Option<f32> {
        self.ground.map(|hit| hit.distance)
    }

    /// A drop or steep descent lies ahead.
    #[must_use]
    pub const fn near_edge(&self) -> bool {
        self.near_edge
    }

    /// A wall or steep climb lies directly ahead.
    #[must_use]
    pub const fn near_steep_slope(&self) -> bool {
        self.near_steep_slope
    }

    /// Whether forward motion is currently allowed.
    #[must_use]
    pub const fn can_move_forward(&self) -> bool {
        self.can_move_forward
    }

    /// Forward direction the terrain is pulling the bird towards.
    #[must_use]
    pub const fn goal_forward(&self) -> Vec3 {
        self.goal_forward
    }

    /// Angle between the bird's up and the terrain normal, in degrees.
    #[must_use]
    pub const fn terrain_angle(&self) -> f32 {
        self.terrain_angle
    }

    /// Current walk speed.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    pub(super) fn set_speeds(&mut self, speed: f32, rotation_speed: f32) {
        self.speed = speed;
        self.rotation_speed = rotation_speed;
    }

    pub(super) fn block_forward(&mut self) {
        self.can_move_forward = false;
    }

    /// Clip bookkeeping and position attributes, run at the top of every frame.
    pub(super) fn begin_frame(&mut self, agent: &Agent, frame: &mut Frame<'_>) {
        if frame.animator.is_playing(Clip::FlapForward) {
            frame.animator.set_bool(AnimParam::Landing, true);
        }
        if frame.animator.is_playing(Clip::Landing) {
            frame.animator.set_bool(AnimParam::Landing, false);
        }
        self.locked_position = agent.pose.position;

        let origin = agent.pose.position + WORLD_UP * POSITION_PROBE_LIFT;
        self.ground = frame.sensor().ground_below(origin, POSITION_PROBE_DISTANCE);
        match self.ground {
            Some(hit) => {
                self.falling = hit.distance > frame.config.walking.fall_distance;
                self.smoothing =
                    !(hit.surface == SurfaceKind::Land && hit.distance < LAND_CONTACT_DISTANCE);
                self.on_bridge =
                    hit.surface == SurfaceKind::Bridge && hit.distance < BRIDGE_CONTACT_DISTANCE;
            }
            None => self.falling = true,
        }
    }

    /// Casts the forward, forward-left and forward-right fan and decides
    /// whether the bird may keep walking.
    pub(super) fn sense_edges(&mut self, agent: &Agent, sensor: &Sensor<'_>, config: &WalkingConfig) {
        let position = agent.pose.position;
        let base = position + WORLD_UP * EDGE_PROBE_LIFT;
        let forward = agent.pose.forward();
        let right = agent.pose.right();
        let down = -agent.pose.up();
        let forward_left = (forward - right).normalize_or_zero();
        let forward_right = (forward + right).normalize_or_zero();

        let obstacle_ahead = sensor
            .obstacle_ahead(position, forward, config.forward_check)
            .is_some();

        let drops_away = |origin: Vec3, slope_origin: Vec3| {
            sensor.ground_below(origin, config.max_fall).is_none()
                || sensor.slope_at(slope_origin, down, config.max_fall) > config.edge_slope
        };
        let forward_fall = drops_away(base + forward * config.forward_check, base + forward);
        let left_fall = drops_away(base + forward_left, base + forward_left);
        let right_fall = drops_away(base + forward_right, base + forward_right);
        self.near_edge = !obstacle_ahead && (forward_fall || left_fall || right_fall);

        let raised = base + WORLD_UP * config.slope_check;
        let steep_ahead = [forward, forward_left, forward_right].into_iter().any(|direction| {
            sensor.slope_at(raised + direction * config.slope_check, down, config.max_fall)
                > config.steep_slope
        });
        self.near_steep_slope = obstacle_ahead && steep_ahead;
        self.can_move_forward = !self.near_edge && !self.near_steep_slope;
    }

    /// Works out the forward direction that lays the bird along the terrain.
    ///
    /// Abrupt normal changes on smoothed surfaces follow the previous normal,
    /// itself capped at the surface tilt limit; bridges and water keep the
    /// bird upright.
    pub(super) fn follow_terrain(&mut self, agent: &Agent, sensor: &Sensor<'_>, config: &WalkingConfig) {
        let up = agent.pose.up();
        let forward = agent.pose.forward();
        let in_water = agent.pose.position.y < sensor.water_level();
        let Some(hit) = sensor.probe(
            agent.pose.position + up * POSITION_PROBE_LIFT,
            -up,
            TERRAIN_PROBE_DISTANCE + POSITION_PROBE_LIFT,
        ) else {
            return;
        };
        let normal = hit.normal;
        if self.was_falling {
            self.last_normal = WORLD_UP;
        }
        if self.just_landed {
            self.last_normal = normal;
            self.just_landed = false;
        }
        let change = angle_between(self.last_normal, normal);
        self.terrain_angle = angle_between(up, normal);
        let global = angle_between(WORLD_UP, normal);
        let cap = config.max_surface_tilt;

        if self.on_bridge || in_water {
            self.goal_forward = flatten(forward);
            self.last_normal = WORLD_UP;
        } else if self.smoothing
            && (global > cap
                || self.terrain_angle > SHARP_BODY_ANGLE
                || (change > RIDGE_ANGLE && self.terrain_angle > cap))
        {
            if global > cap {
                let last_global = angle_between(WORLD_UP, self.last_normal);
                if last_global > cap {
                    self.last_normal =
                        slerp_dir(self.last_normal, WORLD_UP, (last_global - cap) / last_global);
                }
            }
            self.goal_forward = project_on_plane(forward, self.last_normal).normalize_or_zero();
        } else {
            self.goal_forward = project_on_plane(forward, normal).normalize_or_zero();
            self.last_normal = normal;
        }
    }

    /// Turns by `turn` at the current rotation speed while easing towards the
    /// terrain-following forward.
    pub(super) fn steer(&mut self, agent: &mut Agent, turn: f32, config: &WalkingConfig, dt: f32) {
        let degrees = self.rotation_speed * turn * dt;
        let forward = agent.pose.forward();
        let next = if self.terrain_angle > config.min_projection_angle {
            let tilted = lerp_vec(forward, self.goal_forward, config.terrain_follow_rate * dt);
            lerp_vec(tilted, yaw_rotation(degrees, agent.pose.up()) * tilted, config.turn_follow)
        } else {
            // Projecting onto a nearly matching normal gives a tiny vector.
            lerp_vec(forward, yaw_rotation(degrees, WORLD_UP) * forward, config.turn_follow)
        };
        agent.pose.set_forward(next);
    }

    /// Eases towards the terrain-following forward without turning.
    pub(super) fn settle(&mut self, agent: &mut Agent, config: &WalkingConfig, dt: f32) {
        if self.terrain_angle > config.min_projection_angle {
            let forward = agent.pose.forward();
            agent
                .pose
                .set_forward(lerp_vec(forward, self.goal_forward, config.terrain_follow_rate * dt));
        }
    }

    /// Moves forward when asked and allowed, and updates the walk animation.
    ///
    /// Standing still zeroes the stored velocity outright so the next step
    /// starts from rest.
    pub(super) fn walk(
        &mut self,
        agent: &mut Agent,
        frame: &mut Frame<'_>,
        moving: bool,
        turn_magnitude: f32,
        animate: bool,
    ) {
        let config = frame.config;
        let target = if moving && self.can_move_forward {
            agent.pose.forward() * self.speed
        } else {
            Vec3::ZERO
        };
        if moving {
            move_with_obstacle_avoidance(agent, target, Vec3::ZERO, &config.motion, frame.dt);
        } else {
            agent.velocity = target;
        }
        frame.animator.set_float(AnimParam::IdleRotation, turn_magnitude);
        frame.animator.set_bool(
            AnimParam::Walking,
            animate && self.can_move_forward && agent.bounds.exceeded() == 0 && !self.falling,
        );
    }

    /// Puts the bird back where the frame started while it is at an edge or
    /// facing a wall.
    pub(super) fn hold_at_edge(&self, agent: &mut Agent) {
        if self.near_edge || self.near_steep_slope {
            agent.pose.position = self.locked_position;
        }
    }

    pub(super) fn end_frame(&mut self) {
        self.was_falling = self.falling;
    }
}

/// Player walking state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerWalking {
    walker: GroundWalker,
}

impl PlayerWalking {
    pub(super) fn enter(agent: &mut Agent, frame: &mut Frame<'_>) -> Self {
        Self {
            walker: GroundWalker::enter(agent, frame),
        }
    }

    /// Shared ground state.
    #[must_use]
    pub const fn walker(&self) -> &GroundWalker {
        &self.walker
    }

    pub(super) fn update(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) -> Option<StateKind> {
        self.walker.begin_frame(agent, frame);

        if agent.is_frozen() {
            frame.signal_controls(ControlInput::default(), 0.0);
            frame.animator.set_float(AnimParam::IdleRotation, 0.0);
            frame.animator.set_bool(AnimParam::Walking, false);
            return None;
        }

        let drive = if frame.input.forward { 1.0 } else { 0.0 };
        frame.signal_controls(frame.input, drive);
        let config = frame.config;
        let sensor = frame.sensor();
        if let Some(height) = Self::try_jump(agent, &sensor, frame, config) {
            frame.animator.set_bool(AnimParam::Jump, true);
            return Some(StateKind::Jumping(height));
        }
        if frame.input.take_flight {
            agent.velocity = Vec3::ZERO;
            frame.animator.set_bool(AnimParam::TakeFlight, true);
            return Some(StateKind::TakingFlight);
        }
        if self.try_swim(agent, &sensor, config) {
            debug!("bird {:?} slipped into the water", agent.id);
            frame.animator.set_bool(AnimParam::Walking, false);
            frame.animator.set_bool(AnimParam::Swim, true);
            return Some(StateKind::Swimming);
        }
        self.update_speeds(frame);

        let dt = frame.dt;
        let turn = frame.input.turn;
        let moving = frame.input.forward;
        self.walker.sense_edges(agent, &sensor, &config.walking);
        self.walker.walk(agent, frame, moving, turn.abs(), moving);
        self.walker.follow_terrain(agent, &sensor, &config.walking);
        self.walker.steer(agent, turn, &config.walking, dt);
        self.walker.hold_at_edge(agent);
        self.walker.end_frame();
        None
    }

    /// Probes for a ledge in front of the bird and picks the hop height from
    /// its clearance.
    fn try_jump(
        agent: &Agent,
        sensor: &Sensor<'_>,
        frame: &Frame<'_>,
        config: &BirdConfig,
    ) -> Option<JumpHeight> {
        let gate_open = agent.bounds.exceeded() > 0 || !config.walking.jump_requires_climbable;
        if !gate_open || !frame.input.jump {
            return None;
        }
        let origin =
            agent.pose.position + WORLD_UP * JUMP_PROBE_OFFSET + agent.pose.forward() * JUMP_PROBE_OFFSET;
        let hit = sensor.probe(origin, -agent.pose.up(), config.jumping.probe_distance)?;
        Some(if hit.distance <= config.jumping.tall_clearance {
            JumpHeight::Tall
        } else {
            JumpHeight::Short
        })
    }

    /// Drops into the water when falling towards it from just above, or when
    /// already below the walking floor.
    fn try_swim(&self, agent: &mut Agent, sensor: &Sensor<'_>, config: &BirdConfig) -> bool {
        let min_height = self.walker.min_height;
        let height = agent.pose.position.y;
        let water = sensor.water_level();
        let [low, high] = config.walking.swim_band;
        if height > water + low && height < water + high {
            // No ground, or ground that lies underwater.
            self.walker
                .ground_distance()
                .is_none_or(|distance| distance > height - min_height)
        } else if height <= min_height {
            agent.pose.position.y = min_height;
            true
        } else {
            false
        }
    }

    fn update_speeds(&mut self, frame: &mut Frame<'_>) {
        let walking = &frame.config.walking;
        if frame.input.boost {
            self.walker.set_speeds(
                walking.walk_speed * walking.boost_multiplier,
                walking.rotation_speed * walking.rotation_boost_multiplier,
            );
            frame.animator.set_float(AnimParam::WalkSpeed, 2.0);
        } else {
            self.walker
                .set_speeds(walking.walk_speed, walking.rotation_speed);
            frame.animator.set_float(AnimParam::WalkSpeed, 1.0);
        }
    }
}
