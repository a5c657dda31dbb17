//! Animation signals emitted by the locomotion states.
//!
//! The states only ever write parameters and ask which clip is playing; clip
//! blending lives outside the core. [`Animator`] is a headless stand-in that
//! derives the playing clip from the parameters so clip-gated transitions
//! resolve without a renderer.
use hashbrown::HashMap;
use log::trace;

/// Named parameters understood by the bird's animation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimParam {
    /// Walking forward on the ground.
    Walking,
    /// Gliding rather than flapping.
    Glide,
    /// Playing the touch-down clip.
    Landing,
    /// Standing on the ground.
    Landed,
    /// Hopping onto a ledge.
    Jump,
    /// Springing into the air.
    TakeFlight,
    /// Floating on water.
    Swim,
    /// Magnitude of the turn input while grounded.
    IdleRotation,
    /// Playback speed of the walk cycle.
    WalkSpeed,
    /// Forward drive, `0` standing still to `1` moving.
    Forward,
    /// Turn axis as given by the controls.
    Turn,
    /// Climb axis as given by the controls.
    Vertical,
    /// One-shot peck.
    Attack,
}

/// Clips the states synchronise with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    /// Standing still.
    Idle,
    /// Walk cycle.
    Walk,
    /// Touch-down.
    Landing,
    /// Flapping flight.
    FlapForward,
    /// Gliding flight.
    Glide,
    /// The spring from the ground into the air.
    LiftOff,
    /// Ledge hop.
    Jump,
    /// Settled on the water surface.
    SwimIdle,
}

/// Receives animation signals from the active state.
#[cfg_attr(test, mockall::automock)]
pub trait AnimationSink {
    /// Sets a boolean parameter.
    fn set_bool(&mut self, param: AnimParam, value: bool);
    /// Sets a float parameter.
    fn set_float(&mut self, param: AnimParam, value: f32);
    /// Fires a one-shot trigger.
    fn set_trigger(&mut self, param: AnimParam);
    /// Whether `clip` is the clip currently playing.
    fn is_playing(&self, clip: Clip) -> bool;
}

/// Shortest time a clip plays before the animator moves on.
pub const DEFAULT_MIN_DWELL: f32 = 0.25;

/// Parameter store with a derived current clip.
#[derive(Debug, Clone)]
pub struct Animator {
    bools: HashMap<AnimParam, bool>,
    floats: HashMap<AnimParam, f32>,
    triggers: HashMap<AnimParam, u32>,
    current: Clip,
    dwell: f32,
    min_dwell: f32,
}

impl Animator {
    /// Starts playing `clip` with the default dwell time.
    #[must_use]
    pub fn new(clip: Clip) -> Self {
        Self::with_dwell(clip, DEFAULT_MIN_DWELL)
    }

    /// Starts playing `clip`; later clips play for at least `min_dwell`
    /// seconds before being replaced.
    #[must_use]
    pub fn with_dwell(clip: Clip, min_dwell: f32) -> Self {
        Self {
            bools: HashMap::new(),
            floats: HashMap::new(),
            triggers: HashMap::new(),
            current: clip,
            dwell: 0.0,
            min_dwell: min_dwell.max(0.0),
        }
    }

    /// Clip currently playing.
    #[must_use]
    pub const fn current(&self) -> Clip {
        self.current
    }

    /// Value of a boolean parameter; unset reads as `false`.
    #[must_use]
    pub fn flag(&self, param: AnimParam) -> bool {
        self.bools.get(&param).copied().unwrap_or(false)
    }

    /// Value of a float parameter; unset reads as `0.0`.
    #[must_use]
    pub fn value(&self, param: AnimParam) -> f32 {
        self.floats.get(&param).copied().unwrap_or(0.0)
    }

    /// How many times a trigger has fired.
    #[must_use]
    pub fn fired(&self, param: AnimParam) -> u32 {
        self.triggers.get(&param).copied().unwrap_or(0)
    }

    /// Clip the parameters currently ask for.
    #[must_use]
    pub fn desired(&self) -> Clip {
        if self.flag(AnimParam::Swim) {
            Clip::SwimIdle
        } else if self.flag(AnimParam::Jump) {
            Clip::Jump
        } else if self.flag(AnimParam::TakeFlight) {
            Clip::LiftOff
        } else if self.flag(AnimParam::Landing) {
            Clip::Landing
        } else if self.flag(AnimParam::Landed) {
            if self.flag(AnimParam::Walking) {
                Clip::Walk
            } else {
                Clip::Idle
            }
        } else if self.flag(AnimParam::Glide) {
            Clip::Glide
        } else {
            Clip::FlapForward
        }
    }

    /// Advances playback, switching clip once the current one has dwelt
    /// long enough.
    pub fn advance(&mut self, dt: f32) {
        self.dwell += dt.max(0.0);
        let desired = self.desired();
        if desired != self.current && self.dwell >= self.min_dwell {
            trace!("clip {:?} -> {desired:?}", self.current);
            self.current = desired;
            self.dwell = 0.0;
        }
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(Clip::Idle)
    }
}

impl AnimationSink for Animator {
    fn set_bool(&mut self, param: AnimParam, value: bool) {
        self.bools.insert(param, value);
    }

    fn set_float(&mut self, param: AnimParam, value: f32) {
        self.floats.insert(param, value);
    }

    fn set_trigger(&mut self, param: AnimParam) {
        trace!("trigger {param:?}");
        *self.triggers.entry(param).or_insert(0) += 1;
    }

    fn is_playing(&self, clip: Clip) -> bool {
        self.current == clip
    }
}
