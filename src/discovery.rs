//! The "found a bird" sequence.
//!
//! When the walking player bumps into an NPC, a burst is spawned above the
//! player, the player's ground control freezes, and the NPC fades out. Once
//! the fade has lingered the NPC is counted, added to the tally and despawned.
//! The sequence lives on the NPC, so removing the NPC cancels it.
use log::{debug, info};

use crate::agent::{Agent, AgentId};
use crate::config::DiscoveryConfig;
use crate::constants::WORLD_UP;
use crate::effects::{EffectsSink, Session};
use crate::tasks::{FadeSequence, FadeStep};

/// Fade-out of one found NPC.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    npc: AgentId,
    fade: FadeSequence,
}

impl Discovery {
    /// Starts the sequence for `npc`, found by `player`.
    pub fn begin(
        player: &mut Agent,
        npc: AgentId,
        effects: &mut dyn EffectsSink,
        config: &DiscoveryConfig,
    ) -> Self {
        info!("player {:?} found bird {npc:?}", player.id);
        effects.spawn_found_fx(
            player.pose.position + WORLD_UP * config.fx_height,
            config.fx_lifetime,
        );
        player.freeze_for(config.freeze_seconds);
        Self {
            npc,
            fade: FadeSequence::new(config.fade_seconds, config.linger_seconds),
        }
    }

    /// The fading NPC.
    #[must_use]
    pub const fn npc(&self) -> AgentId {
        self.npc
    }

    /// Advances the fade. Returns `true` on the tick the NPC is counted and
    /// despawned.
    pub fn advance(&mut self, dt: f32, effects: &mut dyn EffectsSink, session: &mut Session) -> bool {
        match self.fade.advance(dt) {
            FadeStep::Opacity(alpha) => {
                effects.set_opacity(self.npc, alpha);
                false
            }
            FadeStep::Waiting => false,
            FadeStep::Finished => {
                let index = session.record_collected();
                effects.add_collected_icon(index);
                effects.despawn(self.npc);
                debug!("bird {:?} collected into slot {index}", self.npc);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;
    use crate::effects::MockEffectsSink;
    use glam::Vec3;
    use mockall::predicate::{always, eq};
    use mockall::Sequence;
    use rstest::rstest;

    fn player() -> Agent {
        Agent::new(AgentId(1), Role::Player, Vec3::new(1.0, 2.0, 3.0), 0)
    }

    #[rstest]
    fn begin_spawns_the_burst_and_freezes_the_player() {
        let mut effects = MockEffectsSink::new();
        effects
            .expect_spawn_found_fx()
            .withf(|position, lifetime| {
                (*position - Vec3::new(1.0, 2.6, 3.0)).length() < 1e-5 && (*lifetime - 2.0).abs() < 1e-6
            })
            .times(1)
            .return_const(());
        let mut agent = player();
        let discovery = Discovery::begin(&mut agent, AgentId(5), &mut effects, &DiscoveryConfig::default());
        assert_eq!(discovery.npc(), AgentId(5));
        assert!(agent.is_frozen());
        assert!(agent.freeze.is_some_and(|freeze| (freeze.remaining() - 4.0).abs() < 1e-6));
    }

    #[rstest]
    fn fade_counts_icons_and_despawns_in_order() {
        let config = DiscoveryConfig {
            fade_seconds: 1.0,
            linger_seconds: 1.0,
            ..DiscoveryConfig::default()
        };
        let mut effects = MockEffectsSink::new();
        let mut seq = Sequence::new();
        effects.expect_spawn_found_fx().return_const(());
        effects
            .expect_set_opacity()
            .with(eq(AgentId(5)), always())
            .times(2)
            .in_sequence(&mut seq)
            .return_const(());
        effects
            .expect_add_collected_icon()
            .with(eq(3))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        effects
            .expect_despawn()
            .with(eq(AgentId(5)))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let mut session = Session::default();
        for _ in 0..3 {
            session.record_collected();
        }
        let mut agent = player();
        let mut discovery = Discovery::begin(&mut agent, AgentId(5), &mut effects, &config);

        assert!(!discovery.advance(0.5, &mut effects, &mut session));
        assert!(!discovery.advance(0.5, &mut effects, &mut session));
        assert!(!discovery.advance(0.5, &mut effects, &mut session));
        assert!(discovery.advance(0.5, &mut effects, &mut session));
        assert_eq!(session.collected(), 4);
        assert!(!discovery.advance(0.5, &mut effects, &mut session));
    }
}
