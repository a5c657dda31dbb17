//! Autonomous wandering for NPC birds.
//!
//! NPCs pick random waypoints on the terrain, steer towards them with the
//! same synthetic signal a player stick would give, and stop to face the
//! player once they come close.
use std::f32::consts::TAU;

use glam::Vec3;
use log::{debug, log, Level};
use rand::Rng;

use super::walking::GroundWalker;
use super::{Frame, StateKind};
use crate::agent::Agent;
use crate::animation::{AnimParam, AnimationSink, Clip};
use crate::config::NpcConfig;
use crate::input::{steer_towards, Steering};
use crate::sensor::Sensor;
use crate::vector_math::{angle_between, flatten};

/// NPC walking state. NPCs never leave it.
#[derive(Debug, Clone, PartialEq)]
pub struct NpcWalking {
    walker: GroundWalker,
    waypoint: Vec3,
    terrain_offset: f32,
    activated: bool,
    tried_rotating: bool,
    blocked_rerolls: u32,
    moving: bool,
    close_to_player: bool,
    steering: Option<Steering>,
}

impl NpcWalking {
    pub(super) fn enter(agent: &mut Agent, frame: &mut Frame<'_>) -> Self {
        let config = frame.config;
        let npc = &config.npc;
        let mut walker = GroundWalker::enter(agent, frame);
        walker.set_speeds(npc.walk_speed, npc.rotation_speed);
        frame.animator.set_float(AnimParam::WalkSpeed, 1.0);

        let sensor = frame.sensor();
        let terrain_offset = agent.pose.position.y - sensor.terrain_height(agent.pose.position);
        let waypoint = random_waypoint(agent, &sensor, npc.waypoint_radius, terrain_offset);
        Self {
            walker,
            waypoint,
            terrain_offset,
            activated: false,
            tried_rotating: false,
            blocked_rerolls: 0,
            moving: false,
            close_to_player: false,
            steering: None,
        }
    }

    /// Shared ground state.
    #[must_use]
    pub const fn walker(&self) -> &GroundWalker {
        &self.walker
    }

    /// Point the NPC is heading for.
    #[must_use]
    pub const fn waypoint(&self) -> Vec3 {
        self.waypoint
    }

    /// Whether the NPC wanted to advance on the last frame.
    #[must_use]
    pub const fn moving(&self) -> bool {
        self.moving
    }

    /// Whether the landing clip has finished and the NPC has started walking.
    #[must_use]
    pub const fn activated(&self) -> bool {
        self.activated
    }

    /// Steering signal computed on the last frame, if any.
    #[must_use]
    pub const fn steering(&self) -> Option<Steering> {
        self.steering
    }

    pub(super) fn update(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) -> Option<StateKind> {
        self.walker.begin_frame(agent, frame);
        self.activate(agent, &*frame.animator);

        let config = frame.config;
        let npc = &config.npc;
        let sensor = frame.sensor();
        let position = agent.pose.position;
        let distance_to_player = frame
            .player_position
            .map_or(f32::INFINITY, |player| player.distance(position));
        self.close_to_player = distance_to_player < npc.stopping_distance;
        self.moving = self.activated && !self.close_to_player;

        if self.moving && self.needs_new_waypoint(position, npc) {
            if self.tried_rotating && !self.walker.can_move_forward() {
                // Can flip between two waypoints either side of an obstacle.
                let level = self.note_blocked_reroll();
                log!(
                    level,
                    "npc {:?} blocked after turning, re-rolling waypoint ({} in a row)",
                    agent.id,
                    self.blocked_rerolls
                );
            } else {
                self.blocked_rerolls = 0;
            }
            self.waypoint = random_waypoint(agent, &sensor, npc.waypoint_radius, self.terrain_offset);
            self.tried_rotating = false;
        }

        self.walker.sense_edges(agent, &sensor, &config.walking);
        self.rotate(agent, frame, distance_to_player);
        self.walker.follow_terrain(agent, &sensor, &config.walking);
        self.walker.settle(agent, &config.walking, frame.dt);
        let moving = self.moving;
        let activated = self.activated;
        self.walker.walk(agent, frame, moving, 0.0, activated);
        self.walker.hold_at_edge(agent);

        let floor = self.walker.min_height() + npc.float_margin;
        agent.pose.position.y = agent.pose.position.y.max(floor);
        self.walker.end_frame();
        None
    }

    /// Counts a re-roll forced by an obstacle. The first of a run is worth a
    /// warning; repeats only show at debug level.
    fn note_blocked_reroll(&mut self) -> Level {
        self.blocked_rerolls = self.blocked_rerolls.saturating_add(1);
        if self.blocked_rerolls == 1 {
            Level::Warn
        } else {
            Level::Debug
        }
    }

    fn activate(&mut self, agent: &Agent, animator: &dyn AnimationSink) {
        if !self.activated && animator.is_playing(Clip::Idle) {
            debug!("npc {:?} settled, starting to wander", agent.id);
            self.activated = true;
        }
    }

    fn needs_new_waypoint(&self, position: Vec3, npc: &NpcConfig) -> bool {
        let min_height = self.walker.min_height();
        self.waypoint.distance(position) < npc.arrival_distance
            || (self.tried_rotating && !self.walker.can_move_forward())
            || position.y - min_height <= npc.water_margin
            || self.waypoint.y < min_height + npc.water_margin
    }

    fn rotate(&mut self, agent: &mut Agent, frame: &Frame<'_>, distance_to_player: f32) {
        let npc = &frame.config.npc;
        let blend = npc.rotation_speed * frame.dt;
        let position = agent.pose.position;
        self.steering = None;

        if self.moving {
            let Some(steering) =
                steer_towards(agent.pose.rotation, self.waypoint - position, npc.align_tolerance, true)
            else {
                self.tried_rotating = true;
                return;
            };
            if steering.aligned(npc.align_tolerance) {
                self.tried_rotating = true;
            } else {
                agent.pose.rotation = agent.pose.rotation.slerp(steering.target_heading, blend);
            }
            self.steering = Some(steering);
        } else if self.close_to_player {
            let Some(player) = frame.player_position else {
                return;
            };
            let towards_player = player - position;
            let Some(steering) =
                steer_towards(agent.pose.rotation, towards_player, npc.face_tolerance, false)
            else {
                return;
            };
            agent.pose.rotation = agent.pose.rotation.slerp(steering.target_heading, blend);
            let error = angle_between(flatten(agent.pose.forward()), flatten(towards_player));
            if error < npc.face_tolerance || distance_to_player < npc.close_distance {
                self.walker.block_forward();
            }
            self.steering = Some(steering);
        }
    }
}

/// Random point on the terrain around the agent, kept at the agent's height
/// above the ground.
fn random_waypoint(agent: &mut Agent, sensor: &Sensor<'_>, radius: f32, terrain_offset: f32) -> Vec3 {
    // Horizontal part of a uniform point on a sphere of `radius`.
    let theta = agent.rng.gen_range(0.0..TAU);
    let height: f32 = agent.rng.gen_range(-1.0..=1.0);
    let planar = (1.0 - height * height).max(0.0).sqrt() * radius;
    let mut waypoint = agent.pose.position + Vec3::new(theta.cos(), 0.0, theta.sin()) * planar;
    waypoint.y = sensor.terrain_height(waypoint) + terrain_offset;
    waypoint
}
