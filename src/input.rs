//! Control intent consumed by the locomotion states.
//!
//! Players and scripts feed [`ControlInput`] through an [`InputSource`]; NPCs
//! derive the same kind of signal from their waypoint with [`steer_towards`].
use glam::{Quat, Vec3};

use crate::constants::{LOCAL_FORWARD, WORLD_UP};
use crate::vector_math::{angle_between, flatten, look_rotation};

/// One frame of normalised control intent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlInput {
    /// Turn axis in `[-1, 1]`; positive turns right.
    pub turn: f32,
    /// Climb axis in `[-1, 1]`; positive climbs.
    pub vertical: f32,
    /// Move forward while grounded or swimming.
    pub forward: bool,
    /// Speed boost, held.
    pub boost: bool,
    /// Jump request, held.
    pub jump: bool,
    /// Take-flight request, edge-triggered.
    pub take_flight: bool,
    /// Land request, held.
    pub land: bool,
    /// Attack request, edge-triggered.
    pub attack: bool,
}

impl ControlInput {
    /// Returns a copy with both axes clamped into `[-1, 1]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            turn: self.turn.clamp(-1.0, 1.0),
            vertical: self.vertical.clamp(-1.0, 1.0),
            ..self
        }
    }

    /// Copy with the edge-triggered commands cleared.
    #[must_use]
    pub const fn held_only(self) -> Self {
        Self {
            take_flight: false,
            attack: false,
            ..self
        }
    }
}

/// Produces one [`ControlInput`] per tick.
pub trait InputSource {
    /// Control intent for the frame about to be simulated.
    fn sample(&mut self, dt: f32) -> ControlInput;
}

/// Always returns the same input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantInput(pub ControlInput);

impl InputSource for ConstantInput {
    fn sample(&mut self, _dt: f32) -> ControlInput {
        self.0.clamped()
    }
}

/// A timeline of held inputs, each lasting a fixed number of seconds.
///
/// Edge-triggered commands in a segment fire on its first frame only. Once
/// the timeline runs out the source reports idle input.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    segments: Vec<(f32, ControlInput)>,
    index: usize,
    elapsed: f32,
    fired: bool,
}

impl ScriptedInput {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment holding `input` for `seconds`.
    #[must_use]
    pub fn then(mut self, seconds: f32, input: ControlInput) -> Self {
        self.segments.push((seconds.max(0.0), input.clamped()));
        self
    }

    /// Whether every segment has been played.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.index >= self.segments.len()
    }

    /// Total length of the script in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.segments.iter().map(|(seconds, _)| seconds).sum()
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self, dt: f32) -> ControlInput {
        while let Some(&(seconds, _)) = self.segments.get(self.index) {
            if self.elapsed < seconds {
                break;
            }
            self.elapsed -= seconds;
            self.index += 1;
            self.fired = false;
        }
        let Some(&(_, input)) = self.segments.get(self.index) else {
            return ControlInput::default();
        };
        self.elapsed += dt;
        if self.fired {
            input.held_only()
        } else {
            self.fired = true;
            input
        }
    }
}

/// Synthetic steering signal for a bird heading towards a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    /// Rotation facing the target along the horizontal plane.
    pub target_heading: Quat,
    /// Horizontal heading error in degrees.
    pub error: f32,
    /// Turn axis in `[-1, 1]`; zero once within tolerance.
    pub turn: f32,
    /// Whether the bird should advance.
    pub forward: bool,
}

impl Steering {
    /// Whether the heading error is within `tolerance` degrees.
    #[must_use]
    pub fn aligned(&self, tolerance: f32) -> bool {
        self.error <= tolerance
    }
}

/// Compares the current heading with `direction` projected onto the ground
/// plane. Returns `None` when `direction` is vertical or zero.
#[must_use]
pub fn steer_towards(current: Quat, direction: Vec3, tolerance: f32, advance: bool) -> Option<Steering> {
    let wanted = flatten(direction);
    let target_heading = look_rotation(wanted, WORLD_UP)?;
    let facing = flatten(current * LOCAL_FORWARD);
    let error = angle_between(facing, wanted);
    let turn = if error <= tolerance {
        0.0
    } else if facing.cross(wanted).y < 0.0 {
        1.0
    } else {
        -1.0
    };
    Some(Steering {
        target_heading,
        error,
        turn,
        forward: advance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn script_fires_edges_once_and_then_idles() {
        let takeoff = ControlInput {
            take_flight: true,
            attack: true,
            forward: true,
            ..ControlInput::default()
        };
        let mut script = ScriptedInput::new().then(0.3, takeoff);
        let first = script.sample(0.1);
        let second = script.sample(0.1);
        assert!(first.take_flight && first.attack);
        assert!(!second.take_flight && !second.attack);
        assert!(second.forward);
        script.sample(0.1);
        assert_eq!(script.sample(0.1), ControlInput::default());
        assert!(script.finished());
    }

    #[rstest]
    fn script_clamps_axes() {
        let mut script = ScriptedInput::new().then(
            1.0,
            ControlInput {
                turn: 4.0,
                vertical: -3.0,
                ..ControlInput::default()
            },
        );
        let input = script.sample(0.1);
        assert_relative_eq!(input.turn, 1.0);
        assert_relative_eq!(input.vertical, -1.0);
    }

    #[rstest]
    #[case::right(Vec3::X, 1.0)]
    #[case::left(Vec3::NEG_X, -1.0)]
    #[case::ahead(Vec3::NEG_Z, 0.0)]
    fn steering_turns_towards_target(#[case] direction: Vec3, #[case] turn: f32) {
        let steering = steer_towards(Quat::IDENTITY, direction, 2.0, true).expect("horizontal target");
        assert_relative_eq!(steering.turn, turn);
        let heading = steering.target_heading * LOCAL_FORWARD;
        assert_relative_eq!(heading.dot(direction), 1.0, epsilon = 1e-5);
    }

    #[rstest]
    fn vertical_target_has_no_heading() {
        assert!(steer_towards(Quat::IDENTITY, Vec3::Y, 2.0, true).is_none());
    }
}
