//! Per-bird motion fields shared by every locomotion state.
//!
//! Only the bird's own active state writes these fields, and only during that
//! state's slice of the tick. The bounds tracker is the exception: it is fed by
//! trigger events on the bird's own collider.
use glam::{EulerRot, Quat, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bounds::BoundsTracker;
use crate::constants::{LOCAL_FORWARD, WORLD_UP};
use crate::tasks::Countdown;
use crate::vector_math::{look_rotation, wrap_degrees};

/// Stable identifier of a bird within one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

/// Which controls drive the bird.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Driven by player input.
    Player,
    /// Wanders on its own and waits to be found.
    Npc,
}

/// Position and orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World-space position of the bird's feet.
    pub position: Vec3,
    /// World-space orientation; the bird faces its local −Z.
    pub rotation: Quat,
}

impl Pose {
    /// Pose at `position` facing world −Z.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Facing direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * LOCAL_FORWARD
    }

    /// Right-hand direction.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Local up direction.
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Heading about world up, in radians.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.rotation.to_euler(EulerRot::YXZ).0
    }

    /// Nose-down pitch in degrees, wrapped to `(-180, 180]`.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        wrap_degrees(-self.rotation.to_euler(EulerRot::YXZ).1.to_degrees())
    }

    /// Roll in degrees, wrapped to `(-180, 180]`.
    #[must_use]
    pub fn roll(&self) -> f32 {
        wrap_degrees(self.rotation.to_euler(EulerRot::YXZ).2.to_degrees())
    }

    /// Rebuilds the rotation from a heading and the shared pitch/tilt values.
    pub fn set_attitude(&mut self, yaw: f32, pitch: f32, tilt: f32) {
        self.rotation = Quat::from_euler(
            EulerRot::YXZ,
            yaw,
            (-pitch).to_radians(),
            tilt.to_radians(),
        );
    }

    /// Points the bird along `forward`, keeping world up as the roll hint.
    /// Degenerate directions leave the rotation unchanged.
    pub fn set_forward(&mut self, forward: Vec3) {
        if let Some(rotation) = look_rotation(forward, WORLD_UP) {
            self.rotation = rotation;
        }
    }
}

/// Trigger box attached to the bird, in its local right/up/forward frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Full extents along right, up and forward.
    pub size: Vec3,
    /// Centre offset along right, up and forward.
    pub center: Vec3,
}

impl BoundingBox {
    /// Creates a box from its size and centre.
    #[must_use]
    pub const fn new(size: Vec3, center: Vec3) -> Self {
        Self { size, center }
    }

    /// World-space centre of the box for `pose`.
    #[must_use]
    pub fn world_center(&self, pose: &Pose) -> Vec3 {
        pose.position
            + pose.right() * self.center.x
            + pose.up() * self.center.y
            + pose.forward() * self.center.z
    }

    /// Half extents of the world-axis-aligned box enclosing the rotated box.
    #[must_use]
    pub fn world_half_extents(&self, pose: &Pose) -> Vec3 {
        let half = self.size * 0.5;
        pose.right().abs() * half.x + pose.up().abs() * half.y + pose.forward().abs() * half.z
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(Vec3::splat(0.4), Vec3::new(0.0, 0.2, 0.0))
    }
}

/// One bird.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Identifier.
    pub id: AgentId,
    /// Player or NPC.
    pub role: Role,
    /// Position and orientation.
    pub pose: Pose,
    /// Smoothed velocity owned by the motion integrator.
    pub velocity: Vec3,
    /// Roll in degrees; negative drops the right wing.
    pub tilt: f32,
    /// Pitch in degrees; positive is nose-down.
    pub pitch: f32,
    /// Trigger box, resized by each state.
    pub bounding: BoundingBox,
    /// Whether the physics layer applies gravity.
    pub gravity: bool,
    /// Climbable volumes overlapping the trigger box.
    pub bounds: BoundsTracker,
    /// Remaining freeze, if any.
    pub freeze: Option<Countdown>,
    /// Source of randomness for waypoint selection.
    pub rng: StdRng,
}

impl Agent {
    /// Creates a level bird at `position` facing world −Z.
    #[must_use]
    pub fn new(id: AgentId, role: Role, position: Vec3, seed: u64) -> Self {
        Self {
            id,
            role,
            pose: Pose::at(position),
            velocity: Vec3::ZERO,
            tilt: 0.0,
            pitch: 0.0,
            bounding: BoundingBox::default(),
            gravity: false,
            bounds: BoundsTracker::default(),
            freeze: None,
            rng: StdRng::seed_from_u64(seed ^ u64::from(id.0)),
        }
    }

    /// Faces the bird along `forward` before it is spawned.
    #[must_use]
    pub fn facing(mut self, forward: Vec3) -> Self {
        self.pose.set_forward(forward);
        self
    }

    /// Applies the shared pitch and tilt to the current heading.
    pub fn apply_attitude(&mut self) {
        let yaw = self.pose.yaw();
        self.pose.set_attitude(yaw, self.pitch, self.tilt);
    }

    /// Freezes ground control for `seconds`.
    pub fn freeze_for(&mut self, seconds: f32) {
        self.freeze = Some(Countdown::new(seconds));
    }

    /// Whether ground control is frozen.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.freeze.is_some()
    }

    /// Advances the freeze countdown, clearing it once it runs out.
    pub fn advance_freeze(&mut self, dt: f32) {
        if let Some(countdown) = self.freeze.as_mut() {
            if countdown.advance(dt) {
                self.freeze = None;
            }
        }
    }
}
