//! A small collision world: a height field, box props, climbable trigger
//! volumes and a flat water surface.
//!
//! Rays that start underneath a surface never hit it, so a probe from inside a
//! rock or below the terrain reports nothing rather than the surface it is
//! already behind.
use std::fmt;

use glam::Vec3;

use crate::bounds::{VolumeId, VolumeTag};
use crate::constants::{
    DEFAULT_WATER_LEVEL, NORMAL_SAMPLE_OFFSET, RAY_MARCH_STEP, RAY_REFINE_ITERATIONS,
    SURFACE_EPSILON,
};
use crate::sensor::{GroundQuery, LayerMask, RayHit, Surroundings, SurfaceKind, TerrainHeight};

type HeightFn = Box<dyn Fn(f32, f32) -> f32 + Send + Sync>;

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower corner.
    pub min: Vec3,
    /// Upper corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box spanning the two corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box around `center` with the given half extents.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Whether the boxes overlap.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Whether `point` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test. Returns the entry distance and face normal, or `None` for a
    /// miss or a ray starting inside the box.
    #[must_use]
    pub fn ray_entry(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        if self.contains(origin) {
            return None;
        }
        let mut near = 0.0_f32;
        let mut far = max_distance;
        let mut normal = Vec3::ZERO;
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() <= f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (mut t0, mut t1) = ((lo - o) / d, (hi - o) / d);
            let mut face = Vec3::ZERO;
            face[axis] = -d.signum();
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > near {
                near = t0;
                normal = face;
            }
            far = far.min(t1);
            if near > far {
                return None;
            }
        }
        (normal != Vec3::ZERO).then_some((near, normal))
    }
}

/// A solid prop on the ground layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Extent.
    pub bounds: Aabb,
    /// Surface tag reported on hits.
    pub surface: SurfaceKind,
    /// Layers the prop lives on.
    pub layers: LayerMask,
}

/// A trigger volume birds can overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerVolume {
    /// Identifier reported in trigger events.
    pub id: VolumeId,
    /// Extent.
    pub bounds: Aabb,
    /// Tag reported in trigger events.
    pub tag: VolumeTag,
}

/// The collision world.
pub struct Terrain {
    height: HeightFn,
    obstacles: Vec<Obstacle>,
    volumes: Vec<TriggerVolume>,
    water_level: f32,
}

impl fmt::Debug for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terrain")
            .field("obstacles", &self.obstacles)
            .field("volumes", &self.volumes)
            .field("water_level", &self.water_level)
            .finish_non_exhaustive()
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Self::flat(DEFAULT_WATER_LEVEL + 1.0)
    }
}

impl Terrain {
    /// Terrain shaped by `height(x, z)`.
    #[must_use]
    pub fn from_fn(height: impl Fn(f32, f32) -> f32 + Send + Sync + 'static) -> Self {
        Self {
            height: Box::new(height),
            obstacles: Vec::new(),
            volumes: Vec::new(),
            water_level: DEFAULT_WATER_LEVEL,
        }
    }

    /// Level ground at `height`.
    #[must_use]
    pub fn flat(height: f32) -> Self {
        Self::from_fn(move |_, _| height)
    }

    /// Rolling hills around a lake, used by the demo binary.
    #[must_use]
    pub fn demo() -> Self {
        Self::from_fn(|x, z| {
            let lake = ((x * x + z * z).sqrt() / 30.0).min(1.0);
            let hills = (x * 0.05).sin() * (z * 0.04).cos() * 3.0;
            -2.0 + lake * 6.0 + hills * lake
        })
        .with_water_level(DEFAULT_WATER_LEVEL)
        .with_obstacle(Obstacle {
            bounds: Aabb::new(Vec3::new(38.0, 0.0, -2.0), Vec3::new(42.0, 8.0, 2.0)),
            surface: SurfaceKind::Rock,
            layers: LayerMask::GROUND,
        })
    }

    /// Sets the water level.
    #[must_use]
    pub fn with_water_level(mut self, level: f32) -> Self {
        self.water_level = level;
        self
    }

    /// Adds a solid prop.
    #[must_use]
    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Adds a trigger volume.
    #[must_use]
    pub fn with_volume(mut self, volume: TriggerVolume) -> Self {
        self.volumes.push(volume);
        self
    }

    /// Height of the height field.
    #[must_use]
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        (self.height)(x, z)
    }

    /// Height-field normal by central difference.
    #[must_use]
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let e = NORMAL_SAMPLE_OFFSET;
        let dx = (self.height_at(x + e, z) - self.height_at(x - e, z)) / (2.0 * e);
        let dz = (self.height_at(x, z + e) - self.height_at(x, z - e)) / (2.0 * e);
        Vec3::new(-dx, 1.0, -dz).normalize()
    }

    /// Trigger volumes.
    #[must_use]
    pub fn volumes(&self) -> &[TriggerVolume] {
        &self.volumes
    }

    /// Solid props.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    fn below_surface(&self, point: Vec3) -> bool {
        point.y < self.height_at(point.x, point.z) - SURFACE_EPSILON
    }

    fn march_height_field(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        if self.below_surface(origin) || max_distance <= 0.0 {
            return None;
        }
        let mut previous = 0.0_f32;
        let mut t = 0.0_f32;
        while t < max_distance {
            t = (t + RAY_MARCH_STEP).min(max_distance);
            if self.below_surface(origin + direction * t) {
                let (mut lo, mut hi) = (previous, t);
                for _ in 0..RAY_REFINE_ITERATIONS {
                    let mid = 0.5 * (lo + hi);
                    if self.below_surface(origin + direction * mid) {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                // Report the last sample above the surface so a probe started
                // from the hit point is not already underneath it.
                let point = origin + direction * lo;
                return Some(RayHit {
                    distance: lo,
                    point,
                    normal: self.normal_at(point.x, point.z),
                    surface: SurfaceKind::Land,
                });
            }
            previous = t;
        }
        None
    }
}

impl GroundQuery for Terrain {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        let ground = if layers.intersects(LayerMask::GROUND) {
            self.march_height_field(origin, direction, max_distance)
        } else {
            None
        };
        self.obstacles
            .iter()
            .filter(|obstacle| obstacle.layers.intersects(layers))
            .filter_map(|obstacle| {
                obstacle
                    .bounds
                    .ray_entry(origin, direction, max_distance)
                    .map(|(distance, normal)| RayHit {
                        distance,
                        point: origin + direction * distance,
                        normal,
                        surface: obstacle.surface,
                    })
            })
            .chain(ground)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl TerrainHeight for Terrain {
    fn sample_height(&self, x: f32, z: f32) -> f32 {
        self.height_at(x, z)
    }
}

impl Surroundings for Terrain {
    fn water_level(&self) -> f32 {
        self.water_level
    }
}
