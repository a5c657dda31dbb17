//! Tuning values for every locomotion state.
//!
//! The defaults are the hand-tuned feel constants the birds shipped with.
//! Configuration files are JSON; every section and field is optional, so a
//! file only needs to name what it overrides.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure raised while loading or validating a [`BirdConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file was read but is not valid configuration JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value parsed but is outside its usable range.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// Two values that bound a range are the wrong way round.
    #[error("invalid config: `{lower}` must not exceed `{upper}`")]
    Unordered {
        /// Dotted path of the value that should be the smaller.
        lower: &'static str,
        /// Dotted path of the value that should be the larger.
        upper: &'static str,
    },
}

/// Velocity smoothing shared by every state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Fraction of the remaining velocity gap closed per second.
    pub blend_rate: f32,
    /// Blend-rate multiplier used while the bounds counter is non-zero.
    pub avoidance_multiplier: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            blend_rate: 2.0,
            avoidance_multiplier: 6.0,
        }
    }
}

/// Pitch and roll limits shared by the airborne states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InAirConfig {
    /// Degrees per second the pitch goal moves under full vertical input.
    pub pitch_speed: f32,
    /// Fraction of the pitch gap closed each frame while steering.
    pub pitch_follow: f32,
    /// Rate at which roll decays back to level.
    pub tilt_reset_speed: f32,
    /// Rate at which roll approaches its banked target.
    pub roll_follow_rate: f32,
    /// Largest nose-down pitch away from the ground.
    pub max_down_tilt: f32,
    /// Largest nose-up pitch.
    pub max_up_tilt: f32,
    /// Largest roll in either direction.
    pub max_left_right_tilt: f32,
}

impl Default for InAirConfig {
    fn default() -> Self {
        Self {
            pitch_speed: 50.0,
            pitch_follow: 0.7,
            tilt_reset_speed: 5.0,
            roll_follow_rate: 3.0,
            max_down_tilt: 40.0,
            max_up_tilt: 80.0,
            max_left_right_tilt: 30.0,
        }
    }
}

/// Free flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyingConfig {
    /// Cruise speed.
    pub fly_speed: f32,
    /// Speed multiplier while boost is held.
    pub boost_multiplier: f32,
    /// Radius of the arc flown while banking.
    pub arc_radius: f32,
    /// Share of the cruise speed spent climbing during a helical turn.
    pub climb_divisor: f32,
    /// Ceiling.
    pub max_height: f32,
    /// Floor below the water surface when there is no ground beneath.
    pub water_clearance: f32,
    /// Ground must be at most this far below to allow landing.
    pub can_land_height: f32,
    /// Steepest ground slope a landing may start over.
    pub land_max_slope: f32,
    /// Nose-up pitch beyond which landing is refused.
    pub land_min_pitch: f32,
    /// Clearance kept from walls and the ground while skimming.
    pub skim_distance: f32,
    /// Divisor applied to the requested velocity while skimming.
    pub skim_damping: f32,
    /// Height band over which the dive limit shrinks.
    pub level_off_height: f32,
    /// Below this height the bird is held level with the ground.
    pub level_height: f32,
    /// Quantisation step of the ground-limited dive angle.
    pub pitch_step: f32,
    /// Fraction of the gap to the bounded position closed each frame.
    pub bound_follow: f32,
}

impl Default for FlyingConfig {
    fn default() -> Self {
        Self {
            fly_speed: 7.0,
            boost_multiplier: 2.8,
            arc_radius: 28.0,
            climb_divisor: 3.0,
            max_height: 250.0,
            water_clearance: 0.2,
            can_land_height: 3.0,
            land_max_slope: 30.0,
            land_min_pitch: -10.0,
            skim_distance: 2.0,
            skim_damping: 10.0,
            level_off_height: 6.0,
            level_height: 0.6,
            pitch_step: 0.2,
            bound_follow: 0.8,
        }
    }
}

/// Lift-off from the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TakingFlightConfig {
    /// Speed along the forward/up bisector.
    pub lift_off_speed: f32,
    /// Height gained before free flight takes over.
    pub transition_height: f32,
    /// Scale applied to the roll reset rate during lift-off.
    pub roll_reset_scale: f32,
}

impl Default for TakingFlightConfig {
    fn default() -> Self {
        Self {
            lift_off_speed: 5.0,
            transition_height: 4.0,
            roll_reset_scale: 0.4,
        }
    }
}

/// Descent onto the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    /// Pitch and roll must both be within this many degrees of level before
    /// the bird starts sinking.
    pub level_tolerance: f32,
    /// Fixed per-frame velocity blend used while landing.
    pub descent_blend: f32,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            level_tolerance: 0.05,
            descent_blend: 0.8,
        }
    }
}

/// Scripted hop onto a ledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpingConfig {
    /// Length of the full arc in seconds.
    pub duration: f32,
    /// Scale of the forward-and-up displacement.
    pub reach: f32,
    /// Displacement scale used by short jumps.
    pub short_scale: f32,
    /// Clearance at or below which a jump is tall.
    pub tall_clearance: f32,
    /// Length of the clearance probe cast down in front of the bird.
    pub probe_distance: f32,
}

impl Default for JumpingConfig {
    fn default() -> Self {
        Self {
            duration: 1.0,
            reach: 1.1,
            short_scale: 0.6,
            tall_clearance: 0.6,
            probe_distance: 1.0,
        }
    }
}

/// Walking on the ground, shared by the player and NPC variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkingConfig {
    /// Player walk speed.
    pub walk_speed: f32,
    /// Walk speed multiplier while boost is held.
    pub boost_multiplier: f32,
    /// Player turn rate in degrees per second.
    pub rotation_speed: f32,
    /// Turn rate multiplier while boost is held.
    pub rotation_boost_multiplier: f32,
    /// Reach of the flattened forward obstacle probe.
    pub forward_check: f32,
    /// Offset of the steep-slope probes.
    pub slope_check: f32,
    /// Slope above which terrain ahead counts as a wall.
    pub steep_slope: f32,
    /// Slope above which the ground ahead counts as a drop.
    pub edge_slope: f32,
    /// Drop depth that counts as an edge.
    pub max_fall: f32,
    /// Ground further than this below the feet means falling.
    pub fall_distance: f32,
    /// Rate at which the forward vector follows the terrain.
    pub terrain_follow_rate: f32,
    /// Fraction of a frame's turn applied immediately.
    pub turn_follow: f32,
    /// Below this body/terrain angle the terrain projection is skipped.
    pub min_projection_angle: f32,
    /// Largest slope followed on rock and other non-land surfaces.
    pub max_surface_tilt: f32,
    /// Floor below the water surface while walking.
    pub water_clearance: f32,
    /// Height band above the water in which the bird checks for deep water.
    pub swim_band: [f32; 2],
    /// Require a climbable volume in front before jumping.
    pub jump_requires_climbable: bool,
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            boost_multiplier: 5.0,
            rotation_speed: 20.0,
            rotation_boost_multiplier: 3.0,
            forward_check: 0.3,
            slope_check: 1.5,
            steep_slope: 50.0,
            edge_slope: 30.0,
            max_fall: 5.0,
            fall_distance: 0.5,
            terrain_follow_rate: 8.0,
            turn_follow: 0.9,
            min_projection_angle: 5.0,
            max_surface_tilt: 20.0,
            water_clearance: 0.3,
            swim_band: [0.5, 2.0],
            jump_requires_climbable: false,
        }
    }
}

/// Autonomous NPC walking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcConfig {
    /// Walk speed.
    pub walk_speed: f32,
    /// Slerp rate used when turning towards a target.
    pub rotation_speed: f32,
    /// Within this distance of the player the NPC stops and faces them.
    pub stopping_distance: f32,
    /// Within this distance the NPC freezes its walk animation outright.
    pub close_distance: f32,
    /// Radius around the NPC in which waypoints are chosen.
    pub waypoint_radius: f32,
    /// A waypoint closer than this counts as reached.
    pub arrival_distance: f32,
    /// Heading error below which the NPC counts as aligned.
    pub align_tolerance: f32,
    /// Heading error below which the NPC counts as facing the player.
    pub face_tolerance: f32,
    /// Waypoints and positions this close to the water floor are rejected.
    pub water_margin: f32,
    /// Height kept above the water floor.
    pub float_margin: f32,
}

impl Default for NpcConfig {
    fn default() -> Self {
        Self {
            walk_speed: 0.4,
            rotation_speed: 0.5,
            stopping_distance: 4.0,
            close_distance: 2.0,
            waypoint_radius: 10.0,
            arrival_distance: 2.0,
            align_tolerance: 2.0,
            face_tolerance: 5.0,
            water_margin: 0.3,
            float_margin: 0.2,
        }
    }
}

/// Swimming on the water surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimmingConfig {
    /// Swim speed.
    pub swim_speed: f32,
    /// Swim speed multiplier while boost is held.
    pub boost_multiplier: f32,
    /// Turn rate in degrees per second.
    pub rotation_speed: f32,
    /// Turn rate multiplier while boost is held.
    pub rotation_boost_multiplier: f32,
    /// Rate of settling onto the surface from above.
    pub settle_rate_above: f32,
    /// Rate of surfacing from below.
    pub settle_rate_below: f32,
    /// Rate at which pitch returns to level.
    pub pitch_reset_rate: f32,
    /// Forward offset of the shore probe.
    pub shore_probe_offset: f32,
    /// Reach of the shore probe.
    pub shore_probe_distance: f32,
    /// Ground ahead closer than this counts as shore.
    pub shore_distance: f32,
    /// Ground directly below must be within this to step out.
    pub footing_distance: f32,
}

impl Default for SwimmingConfig {
    fn default() -> Self {
        Self {
            swim_speed: 5.0,
            boost_multiplier: 2.0,
            rotation_speed: 20.0,
            rotation_boost_multiplier: 2.0,
            settle_rate_above: 2.0,
            settle_rate_below: 12.0,
            pitch_reset_rate: 4.0,
            shore_probe_offset: 0.3,
            shore_probe_distance: 10.0,
            shore_distance: 0.2,
            footing_distance: 0.25,
        }
    }
}

/// The rigid-body stand-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration applied to gravity-enabled birds.
    pub gravity: f32,
    /// Distance above the ground still counted as touching it.
    pub contact_grace: f32,
    /// Centre distance at which two birds touch.
    pub agent_contact_radius: f32,
    /// Height above the feet from which the ground probe starts.
    pub probe_lift: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            contact_grace: 0.05,
            agent_contact_radius: 0.6,
            probe_lift: 0.5,
        }
    }
}

/// The sequence played when the player walks into an NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Seconds the player is frozen.
    pub freeze_seconds: f32,
    /// Lifetime of the found effect.
    pub fx_lifetime: f32,
    /// Height above the player the found effect spawns at.
    pub fx_height: f32,
    /// Seconds the NPC takes to fade out.
    pub fade_seconds: f32,
    /// Seconds the faded NPC lingers before despawning.
    pub linger_seconds: f32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            freeze_seconds: 4.0,
            fx_lifetime: 2.0,
            fx_height: 0.6,
            fade_seconds: 3.0,
            linger_seconds: 1.0,
        }
    }
}

/// Complete tuning for a simulation session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdConfig {
    /// Velocity smoothing.
    pub motion: MotionConfig,
    /// Airborne pitch and roll.
    pub in_air: InAirConfig,
    /// Free flight.
    pub flying: FlyingConfig,
    /// Lift-off.
    pub taking_flight: TakingFlightConfig,
    /// Landing.
    pub landing: LandingConfig,
    /// Jumping.
    pub jumping: JumpingConfig,
    /// Walking.
    pub walking: WalkingConfig,
    /// NPC walking.
    pub npc: NpcConfig,
    /// Swimming.
    pub swimming: SwimmingConfig,
    /// Physics stand-in.
    pub physics: PhysicsConfig,
    /// Discovery sequence.
    pub discovery: DiscoveryConfig,
}

fn positive(value: f32, field: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "must be finite and greater than zero",
        })
    }
}

fn non_negative(value: f32, field: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "must be finite and not negative",
        })
    }
}

fn at_most(
    (lower, lower_field): (f32, &'static str),
    (upper, upper_field): (f32, &'static str),
) -> Result<(), ConfigError> {
    if lower.is_finite() && upper.is_finite() && lower <= upper {
        Ok(())
    } else {
        Err(ConfigError::Unordered {
            lower: lower_field,
            upper: upper_field,
        })
    }
}

fn fraction(value: f32, field: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "must lie within [0, 1]",
        })
    }
}

impl BirdConfig {
    /// Parses a JSON document and validates the result.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the same errors as [`BirdConfig::from_json_str`].
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks that every value is usable by the locomotion states.
    ///
    /// # Errors
    /// Returns the first [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive(self.motion.blend_rate, "motion.blend_rate")?;
        positive(self.motion.avoidance_multiplier, "motion.avoidance_multiplier")?;

        positive(self.in_air.max_up_tilt, "in_air.max_up_tilt")?;
        positive(self.in_air.max_down_tilt, "in_air.max_down_tilt")?;
        positive(self.in_air.max_left_right_tilt, "in_air.max_left_right_tilt")?;
        fraction(self.in_air.pitch_follow, "in_air.pitch_follow")?;

        let flying = &self.flying;
        positive(flying.fly_speed, "flying.fly_speed")?;
        positive(flying.arc_radius, "flying.arc_radius")?;
        positive(flying.climb_divisor, "flying.climb_divisor")?;
        positive(flying.skim_damping, "flying.skim_damping")?;
        positive(flying.level_height, "flying.level_height")?;
        fraction(flying.bound_follow, "flying.bound_follow")?;
        if flying.level_height >= flying.level_off_height {
            return Err(ConfigError::Invalid {
                field: "flying.level_height",
                reason: "must be below flying.level_off_height",
            });
        }
        if flying.can_land_height <= flying.skim_distance {
            return Err(ConfigError::Invalid {
                field: "flying.can_land_height",
                reason: "must exceed flying.skim_distance",
            });
        }

        at_most(
            (flying.level_off_height, "flying.level_off_height"),
            (flying.max_height, "flying.max_height"),
        )?;

        positive(self.taking_flight.lift_off_speed, "taking_flight.lift_off_speed")?;
        positive(
            self.taking_flight.transition_height,
            "taking_flight.transition_height",
        )?;
        positive(self.landing.level_tolerance, "landing.level_tolerance")?;
        fraction(self.landing.descent_blend, "landing.descent_blend")?;

        let jumping = &self.jumping;
        positive(jumping.duration, "jumping.duration")?;
        positive(jumping.reach, "jumping.reach")?;
        positive(jumping.short_scale, "jumping.short_scale")?;
        fraction(jumping.short_scale, "jumping.short_scale")?;
        positive(jumping.tall_clearance, "jumping.tall_clearance")?;
        positive(jumping.probe_distance, "jumping.probe_distance")?;
        at_most(
            (jumping.tall_clearance, "jumping.tall_clearance"),
            (jumping.probe_distance, "jumping.probe_distance"),
        )?;

        let walking = &self.walking;
        positive(walking.walk_speed, "walking.walk_speed")?;
        positive(walking.rotation_speed, "walking.rotation_speed")?;
        fraction(walking.turn_follow, "walking.turn_follow")?;
        let [band_low, band_high] = walking.swim_band;
        if !(band_low.is_finite() && band_high.is_finite() && band_low < band_high) {
            return Err(ConfigError::Invalid {
                field: "walking.swim_band",
                reason: "lower bound must be below upper bound",
            });
        }

        let npc = &self.npc;
        positive(npc.walk_speed, "npc.walk_speed")?;
        positive(npc.waypoint_radius, "npc.waypoint_radius")?;
        non_negative(npc.stopping_distance, "npc.stopping_distance")?;
        non_negative(npc.close_distance, "npc.close_distance")?;
        non_negative(npc.arrival_distance, "npc.arrival_distance")?;
        at_most(
            (npc.close_distance, "npc.close_distance"),
            (npc.stopping_distance, "npc.stopping_distance"),
        )?;
        positive(self.swimming.swim_speed, "swimming.swim_speed")?;
        positive(self.physics.gravity, "physics.gravity")?;
        positive(self.discovery.fade_seconds, "discovery.fade_seconds")?;
        Ok(())
    }
}
