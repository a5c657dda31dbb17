//! World-level constants shared by the locomotion states and the physics
//! stand-in.
//!
//! Tuned feel values live in [`crate::config::BirdConfig`]; the values here
//! describe the world itself and never vary per bird.
use glam::Vec3;

/// World up axis.
pub const WORLD_UP: Vec3 = Vec3::Y;
/// World down axis.
pub const WORLD_DOWN: Vec3 = Vec3::NEG_Y;
/// Agent-local forward axis. Agents face down their local negative Z.
pub const LOCAL_FORWARD: Vec3 = Vec3::NEG_Z;
/// Reach of the downward probe used when sensing the ground under an agent.
pub const GROUND_PROBE_DISTANCE: f32 = 10.0;
/// Step used when marching rays across a height field.
pub const RAY_MARCH_STEP: f32 = 0.05;
/// Bisection iterations used to refine a height-field crossing.
pub const RAY_REFINE_ITERATIONS: u32 = 16;
/// Tolerance below a surface before a ray counts as crossing it.
pub const SURFACE_EPSILON: f32 = 1e-3;
/// Half-width of the central difference used for height-field normals.
pub const NORMAL_SAMPLE_OFFSET: f32 = 0.01;
/// Smallest frame duration the simulation will advance by.
pub const MIN_DELTA_TIME: f32 = 1e-6;
/// Default water level used by the demo terrain.
pub const DEFAULT_WATER_LEVEL: f32 = 0.0;
