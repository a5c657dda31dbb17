//! Pitch and roll smoothing shared by the airborne states.
//!
//! These only update the agent's stored `pitch` and `tilt`; the caller applies
//! them to the pose with [`Agent::apply_attitude`].
use crate::agent::Agent;
use crate::config::InAirConfig;
use crate::vector_math::lerp;

/// Moves the pitch goal by the vertical input and eases towards it, keeping
/// it between the climb limit and `dive_limit`.
pub(crate) fn tilt_up_down(agent: &mut Agent, vertical: f32, dive_limit: f32, config: &InAirConfig, dt: f32) {
    let goal = (agent.pitch - vertical * config.pitch_speed * dt)
        .min(dive_limit)
        .max(-config.max_up_tilt);
    agent.pitch = lerp(agent.pitch, goal, config.pitch_follow);
}

/// Eases the pitch back to level.
pub(crate) fn reset_up_down(agent: &mut Agent, config: &InAirConfig, dt: f32) {
    agent.pitch = lerp(agent.pitch, 0.0, config.tilt_reset_speed / 3.0 * dt);
}

/// Eases the roll towards a bank proportional to the turn input.
pub(crate) fn tilt_left_right(agent: &mut Agent, turn: f32, config: &InAirConfig, dt: f32) {
    let goal = config.max_left_right_tilt * -turn;
    agent.tilt = lerp(agent.tilt, goal, config.roll_follow_rate * dt);
}

/// Eases the roll back to level, `scale` times the usual rate.
pub(crate) fn reset_left_right(agent: &mut Agent, config: &InAirConfig, scale: f32, dt: f32) {
    agent.tilt = lerp(agent.tilt, 0.0, config.tilt_reset_speed * scale * dt);
}

/// Hard limits on the stored attitude.
pub(crate) fn clamp_attitude(agent: &mut Agent, dive_limit: f32, config: &InAirConfig) {
    agent.pitch = agent.pitch.min(dive_limit).max(-config.max_up_tilt);
    agent.tilt = agent
        .tilt
        .min(config.max_left_right_tilt)
        .max(-config.max_left_right_tilt);
}
