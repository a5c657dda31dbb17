//! Resumable multi-frame procedures.
//!
//! Each task holds its own elapsed time and is advanced once per tick by its
//! owner. Dropping the owner drops the task, so a despawned bird can never
//! receive a stale write from an unfinished sequence.

/// Counts down a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    elapsed: f32,
    duration: f32,
}

impl Countdown {
    /// Starts a countdown of `duration` seconds.
    #[must_use]
    pub const fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
        }
    }

    /// Advances by `dt` and returns `true` once the duration has elapsed.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed = (self.elapsed + dt).min(self.duration.max(0.0));
        self.finished()
    }

    /// Whether the duration has fully elapsed.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Seconds left before completion.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// Completed fraction in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Phase of a [`FadeSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    /// Opacity is falling towards zero.
    Fading,
    /// Fully transparent, waiting before removal.
    Lingering,
    /// The owner should be removed.
    Done,
}

/// What a fade produced this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeStep {
    /// Still visible at the given opacity.
    Opacity(f32),
    /// Invisible and waiting.
    Waiting,
    /// Finished on this tick. Reported exactly once.
    Finished,
}

/// Fades a bird out, lingers, then reports completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSequence {
    fade: Countdown,
    linger: Countdown,
    phase: FadePhase,
}

impl FadeSequence {
    /// Creates a fade of `fade_seconds` followed by `linger_seconds`.
    #[must_use]
    pub const fn new(fade_seconds: f32, linger_seconds: f32) -> Self {
        Self {
            fade: Countdown::new(fade_seconds),
            linger: Countdown::new(linger_seconds),
            phase: FadePhase::Fading,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> FadePhase {
        self.phase
    }

    /// Advances the sequence by `dt`.
    pub fn advance(&mut self, dt: f32) -> FadeStep {
        match self.phase {
            FadePhase::Fading => {
                if self.fade.advance(dt) {
                    self.phase = FadePhase::Lingering;
                    FadeStep::Opacity(0.0)
                } else {
                    FadeStep::Opacity(1.0 - self.fade.progress())
                }
            }
            FadePhase::Lingering => {
                if self.linger.advance(dt) {
                    self.phase = FadePhase::Done;
                    FadeStep::Finished
                } else {
                    FadeStep::Waiting
                }
            }
            FadePhase::Done => FadeStep::Waiting,
        }
    }
}
