//! Scripted two-segment hop onto a ledge.
use glam::Vec3;
use log::debug;

use super::{Frame, JumpHeight, StateKind};
use crate::agent::Agent;
use crate::animation::AnimParam;
use crate::constants::WORLD_UP;
use crate::vector_math::lerp_vec;

/// Offset from the take-off point after `elapsed` seconds of a jump lasting
/// `duration`: straight up one unit over the first half, then across to
/// `reach` over the second. Elapsed time past the end holds the final offset.
///
/// # Examples
/// ```
/// use crane::fsm::jump_offset;
/// use glam::Vec3;
/// let reach = Vec3::new(0.0, 1.1, -1.1);
/// assert_eq!(jump_offset(0.5, 1.0, reach), Vec3::Y);
/// assert!((jump_offset(3.0, 1.0, reach) - reach).length() < 1e-6);
/// ```
#[must_use]
pub fn jump_offset(elapsed: f32, duration: f32, reach: Vec3) -> Vec3 {
    let half = duration * 0.5;
    let elapsed = elapsed.clamp(0.0, duration);
    if half <= 0.0 {
        return reach;
    }
    if elapsed <= half {
        lerp_vec(Vec3::ZERO, WORLD_UP, elapsed / half)
    } else {
        lerp_vec(WORLD_UP, reach, (elapsed - half) / half)
    }
}

/// Jumping state. Position is scripted; gravity returns once the arc ends
/// and a ground contact hands the bird back to walking.
#[derive(Debug, Clone, PartialEq)]
pub struct Jumping {
    height: JumpHeight,
    start: Vec3,
    reach: Vec3,
    elapsed: f32,
}

impl Jumping {
    pub(super) fn enter(agent: &mut Agent, frame: &mut Frame<'_>, height: JumpHeight) -> Self {
        let jumping = &frame.config.jumping;
        agent.gravity = false;
        agent.velocity = Vec3::ZERO;
        let mut reach = (agent.pose.forward() + WORLD_UP) * jumping.reach;
        if height == JumpHeight::Short {
            reach *= jumping.short_scale;
        }
        debug!("bird {:?} jumping {height:?}", agent.id);
        Self {
            height,
            start: agent.pose.position,
            reach,
            elapsed: 0.0,
        }
    }

    /// Short or tall.
    #[must_use]
    pub const fn height(&self) -> JumpHeight {
        self.height
    }

    /// Seconds since take-off, capped at the jump duration.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Whether the scripted arc has finished.
    #[must_use]
    pub fn finished(&self, duration: f32) -> bool {
        self.elapsed >= duration
    }

    pub(super) fn update(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) -> Option<StateKind> {
        let duration = frame.config.jumping.duration;
        if self.finished(duration) {
            return None;
        }
        self.elapsed = (self.elapsed + frame.dt).min(duration);
        agent.pose.position = self.start + jump_offset(self.elapsed, duration, self.reach);
        if self.finished(duration) {
            frame.animator.set_bool(AnimParam::Jump, false);
            agent.gravity = true;
        }
        None
    }

    pub(super) fn exit(&mut self, agent: &mut Agent, frame: &mut Frame<'_>) {
        frame.animator.set_bool(AnimParam::Jump, false);
        agent.gravity = true;
    }
}
