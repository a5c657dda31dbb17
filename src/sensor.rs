//! Environment sensing: ray probes against the ground layer.
//!
//! The collision world itself is an external collaborator reached through
//! [`GroundQuery`] and [`TerrainHeight`]. A missing hit is a normal answer,
//! not an error: every caller branches on the `Option` explicitly.
use glam::Vec3;

use crate::constants::{GROUND_PROBE_DISTANCE, WORLD_DOWN, WORLD_UP};
use crate::vector_math::{angle_between, flatten};

/// Collision layers a probe may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Terrain, rocks, bridges and anything else a bird can stand on.
    pub const GROUND: Self = Self(1);
    /// Matches every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Returns `true` when the two masks share a layer.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

/// What kind of surface a probe landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceKind {
    /// Natural terrain; birds follow its slope closely.
    #[default]
    Land,
    /// Rocks and other props; slope following is smoothed and capped.
    Rock,
    /// Walkways; birds stay upright on them.
    Bridge,
}

/// Result of a successful probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the probe origin to the hit.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
    /// Surface normal at the hit.
    pub normal: Vec3,
    /// Surface that was hit.
    pub surface: SurfaceKind,
}

impl RayHit {
    /// Angle between the hit normal and world up, in degrees (0 to 180).
    #[must_use]
    pub fn slope(&self) -> f32 {
        angle_between(self.normal, WORLD_UP)
    }
}

/// Ray casts against the collision world.
///
/// Implementations must be pure queries: the same arguments within one tick
/// return the same answer.
#[cfg_attr(test, mockall::automock)]
pub trait GroundQuery {
    /// Casts a ray and returns the nearest hit on `layers`, if any.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<RayHit>;
}

/// Ground elevation lookup for waypoint placement.
pub trait TerrainHeight {
    /// Height of the terrain surface below the horizontal position.
    fn sample_height(&self, x: f32, z: f32) -> f32;
}

/// Everything a bird reads from the world it lives in.
pub trait Surroundings: GroundQuery + TerrainHeight {
    /// Height of the water surface.
    fn water_level(&self) -> f32;
}

/// A probe bound to one world and layer mask.
#[derive(Clone, Copy)]
pub struct Sensor<'a> {
    world: &'a dyn Surroundings,
    layers: LayerMask,
}

impl<'a> Sensor<'a> {
    /// Creates a probe against the ground layer of `world`.
    #[must_use]
    pub fn new(world: &'a dyn Surroundings) -> Self {
        Self {
            world,
            layers: LayerMask::GROUND,
        }
    }

    /// Height of the water surface.
    #[must_use]
    pub fn water_level(&self) -> f32 {
        self.world.water_level()
    }

    /// Terrain height under a horizontal position.
    #[must_use]
    pub fn terrain_height(&self, position: Vec3) -> f32 {
        self.world.sample_height(position.x, position.z)
    }

    /// Casts a ray along `direction` (normalised here) for at most
    /// `max_distance`.
    #[must_use]
    pub fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        self.world
            .raycast(origin, direction, max_distance, self.layers)
    }

    /// Probes straight down from `origin`.
    #[must_use]
    pub fn ground_below(&self, origin: Vec3, max_distance: f32) -> Option<RayHit> {
        self.probe(origin, WORLD_DOWN, max_distance)
    }

    /// Returns `true` when something on the ground layer lies within
    /// `max_distance` along `direction`.
    #[must_use]
    pub fn blocked(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
        self.probe(origin, direction, max_distance).is_some()
    }

    /// Probes along the horizontal projection of `forward`.
    #[must_use]
    pub fn obstacle_ahead(&self, origin: Vec3, forward: Vec3, reach: f32) -> Option<RayHit> {
        self.probe(origin, flatten(forward), reach)
    }

    /// Slope in degrees of the surface hit by a probe.
    ///
    /// A miss reads as flat ground (`0.0`), so a hole never registers as a
    /// steep slope; callers looking for drops probe for the miss separately.
    #[must_use]
    pub fn slope_at(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> f32 {
        self.probe(origin, direction, max_distance)
            .map_or(0.0, |hit| hit.slope())
    }
}

/// Ground directly beneath an airborne bird.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundSample {
    /// A hit exists and lies above the water surface.
    pub has_ground: bool,
    /// Height of the hit point.
    pub height: f32,
    /// Distance from the bird down to the hit.
    pub distance: f32,
    /// Unsigned slope in degrees.
    pub slope: f32,
    /// Slope signed by the facing direction: negative when the ground falls
    /// away in front of the bird.
    pub signed_slope: f32,
    /// Surface normal, or up when nothing was hit.
    pub normal: Vec3,
}

impl GroundSample {
    /// Samples the ground below `position`, treating ground under the water
    /// surface as no ground at all.
    #[must_use]
    pub fn take(sensor: &Sensor<'_>, position: Vec3, forward: Vec3) -> Self {
        let Some(hit) = sensor.ground_below(position, GROUND_PROBE_DISTANCE) else {
            return Self {
                normal: WORLD_UP,
                ..Self::default()
            };
        };
        let slope = hit.slope();
        let descending = flatten(hit.normal).dot(flatten(forward)) > 0.0;
        Self {
            has_ground: hit.point.y >= sensor.water_level(),
            height: hit.point.y,
            distance: hit.distance,
            slope,
            signed_slope: if descending { -slope } else { slope },
            normal: hit.normal,
        }
    }
}
