//! Frame-rate independent velocity smoothing and position integration.
//!
//! States never write positions from velocities themselves; they hand a
//! target velocity to [`move_with_obstacle_avoidance`] (or [`move_towards`]),
//! which blends the agent's stored velocity towards it and integrates one
//! Euler step.
use glam::Vec3;

use crate::agent::Agent;
use crate::config::MotionConfig;
use crate::vector_math::lerp_vec;

/// How far one call may close the velocity gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Blend {
    /// A rate per second, scaled by the frame duration.
    Rate(f32),
    /// A fixed per-frame fraction, independent of the frame duration.
    Fixed(f32),
}

impl Blend {
    /// Fraction of the gap closed this frame.
    #[must_use]
    pub fn fraction(self, dt: f32) -> f32 {
        match self {
            Self::Rate(rate) => rate * dt,
            Self::Fixed(fraction) => fraction,
        }
    }
}

/// Exponential smoothing of `current` towards `target`.
///
/// # Examples
/// ```
/// use crane::motion::blend_velocity;
/// use glam::Vec3;
/// let v = blend_velocity(Vec3::ZERO, Vec3::X * 10.0, 0.5);
/// assert!((v.x - 5.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn blend_velocity(current: Vec3, target: Vec3, fraction: f32) -> Vec3 {
    lerp_vec(current, target, fraction)
}

/// Straight Euler step.
#[must_use]
pub fn integrate_position(position: Vec3, velocity: Vec3, dt: f32) -> Vec3 {
    position + velocity * dt
}

/// Blends the agent's velocity towards `target` and moves it one frame.
pub fn move_towards(agent: &mut Agent, target: Vec3, blend: Blend, dt: f32) {
    let velocity = blend_velocity(agent.velocity, target, blend.fraction(dt));
    agent.velocity = velocity;
    agent.pose.position = integrate_position(agent.pose.position, velocity, dt);
}

/// Moves the agent towards `target`, or towards `fallback` at the faster
/// avoidance rate while a climbable volume overlaps its bounding box.
///
/// Returns `target` unchanged so callers can compare what they asked for with
/// what the collision layer allowed.
pub fn move_with_obstacle_avoidance(
    agent: &mut Agent,
    target: Vec3,
    fallback: Vec3,
    config: &MotionConfig,
    dt: f32,
) -> Vec3 {
    let (goal, rate) = if agent.bounds.exceeded() > 0 {
        (fallback, config.blend_rate * config.avoidance_multiplier)
    } else {
        (target, config.blend_rate)
    };
    move_towards(agent, goal, Blend::Rate(rate), dt);
    target
}
