//! Fire-and-forget visual requests and the play session they count into.
use glam::Vec3;

use crate::agent::AgentId;

/// Receives spawn, fade and UI requests. Nothing is returned to the core.
#[cfg_attr(test, mockall::automock)]
pub trait EffectsSink {
    /// Spawns the "found" particle burst at `position` for `lifetime` seconds.
    fn spawn_found_fx(&mut self, position: Vec3, lifetime: f32);
    /// Sets a bird's opacity.
    fn set_opacity(&mut self, agent: AgentId, alpha: f32);
    /// Adds the collected icon at `index` to the tally.
    fn add_collected_icon(&mut self, index: u32);
    /// Removes a bird's visuals.
    fn despawn(&mut self, agent: AgentId);
}

/// A recorded request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Found burst.
    FoundFx {
        /// Spawn position.
        position: Vec3,
        /// Seconds until the burst stops.
        lifetime: f32,
    },
    /// Opacity change.
    Opacity {
        /// Fading bird.
        agent: AgentId,
        /// New opacity in `[0, 1]`.
        alpha: f32,
    },
    /// Collected icon.
    CollectedIcon(u32),
    /// Despawn.
    Despawn(AgentId),
}

/// Sink that records every request in order.
#[derive(Debug, Clone, Default)]
pub struct EffectLog {
    effects: Vec<Effect>,
}

impl EffectLog {
    /// Everything recorded so far.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Takes the recorded requests, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

impl EffectsSink for EffectLog {
    fn spawn_found_fx(&mut self, position: Vec3, lifetime: f32) {
        self.effects.push(Effect::FoundFx { position, lifetime });
    }

    fn set_opacity(&mut self, agent: AgentId, alpha: f32) {
        self.effects.push(Effect::Opacity { agent, alpha });
    }

    fn add_collected_icon(&mut self, index: u32) {
        self.effects.push(Effect::CollectedIcon(index));
    }

    fn despawn(&mut self, agent: AgentId) {
        self.effects.push(Effect::Despawn(agent));
    }
}

/// Per-session tally of birds found. Created with the session and dropped
/// with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    collected: u32,
}

impl Session {
    /// Birds found so far.
    #[must_use]
    pub const fn collected(&self) -> u32 {
        self.collected
    }

    /// Counts one more bird and returns the icon slot it occupies.
    pub fn record_collected(&mut self) -> u32 {
        let index = self.collected;
        self.collected += 1;
        index
    }
}
