//! Rigid-body stand-in.
//!
//! Provides only what the locomotion core expects from a physics engine:
//! gravity for birds that have it enabled, non-penetration against the ground,
//! and edge-triggered collision and trigger events. Gravity keeps its own fall
//! speed so it never fights the velocity a state blends towards.
use glam::Vec3;
use hashbrown::HashSet;

use crate::agent::{Agent, AgentId, Role};
use crate::bounds::{VolumeId, VolumeTag};
use crate::config::PhysicsConfig;
use crate::constants::WORLD_UP;
use crate::fsm::Contact;
use crate::sensor::{Sensor, Surroundings};
use crate::terrain::{Aabb, TriggerVolume};

/// Where another bird is this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    /// Its identifier.
    pub id: AgentId,
    /// Its role.
    pub role: Role,
    /// Its position.
    pub position: Vec3,
}

impl From<&Agent> for Neighbour {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            role: agent.role,
            position: agent.pose.position,
        }
    }
}

/// Something the physics step wants the controller to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsEvent {
    /// A collision began.
    Collision(Contact),
    /// A trigger volume started overlapping the bird.
    TriggerEnter {
        /// Volume identifier.
        volume: VolumeId,
        /// Volume tag.
        tag: VolumeTag,
    },
    /// A trigger volume stopped overlapping the bird.
    TriggerExit {
        /// Volume identifier.
        volume: VolumeId,
        /// Volume tag.
        tag: VolumeTag,
    },
}

/// Per-bird physics memory.
#[derive(Debug, Clone, Default)]
pub struct Body {
    fall_speed: f32,
    grounded: bool,
    touching: HashSet<AgentId>,
    volumes: HashSet<VolumeId>,
}

impl Body {
    /// Speed gravity has built up, in units per second.
    #[must_use]
    pub const fn fall_speed(&self) -> f32 {
        self.fall_speed
    }

    /// Whether the bird rested on the ground after the last step.
    #[must_use]
    pub const fn grounded(&self) -> bool {
        self.grounded
    }

    /// Advances one bird by `dt` and returns the events that began or ended
    /// this step.
    pub fn step(
        &mut self,
        agent: &mut Agent,
        world: &dyn Surroundings,
        volumes: &[TriggerVolume],
        neighbours: &[Neighbour],
        config: &PhysicsConfig,
        dt: f32,
    ) -> Vec<PhysicsEvent> {
        let mut events = Vec::new();
        if self.settle(agent, world, config, dt) {
            events.push(PhysicsEvent::Collision(Contact::Ground));
        }
        events.extend(
            self.touch(agent, neighbours, config.agent_contact_radius)
                .into_iter()
                .map(PhysicsEvent::Collision),
        );
        events.extend(self.overlap(agent, volumes));
        events
    }

    /// Applies gravity and keeps the bird above the ground. Returns `true`
    /// when ground contact began on this step.
    fn settle(
        &mut self,
        agent: &mut Agent,
        world: &dyn Surroundings,
        config: &PhysicsConfig,
        dt: f32,
    ) -> bool {
        let start = agent.pose.position;
        if agent.gravity {
            self.fall_speed += config.gravity * dt;
            agent.pose.position.y -= self.fall_speed * dt;
        } else {
            self.fall_speed = 0.0;
        }

        let drop = (start.y - agent.pose.position.y).max(0.0);
        let origin = agent.pose.position.with_y(start.y) + WORLD_UP * config.probe_lift;
        let reach = config.probe_lift + drop + config.contact_grace;
        let ground = Sensor::new(world).ground_below(origin, reach);

        let touching = match ground {
            Some(hit) => {
                if agent.pose.position.y < hit.point.y {
                    agent.pose.position.y = hit.point.y;
                }
                agent.pose.position.y - hit.point.y <= config.contact_grace
            }
            None => false,
        };
        if touching {
            self.fall_speed = 0.0;
        }
        let began = touching && !self.grounded;
        self.grounded = touching;
        began
    }

    fn touch(&mut self, agent: &Agent, neighbours: &[Neighbour], radius: f32) -> Vec<Contact> {
        let mut began = Vec::new();
        let mut now = HashSet::new();
        for other in neighbours.iter().filter(|other| other.id != agent.id) {
            if other.position.distance(agent.pose.position) > radius {
                continue;
            }
            now.insert(other.id);
            if !self.touching.contains(&other.id) {
                began.push(Contact::Bird {
                    id: other.id,
                    role: other.role,
                });
            }
        }
        self.touching = now;
        began
    }

    fn overlap(&mut self, agent: &Agent, volumes: &[TriggerVolume]) -> Vec<PhysicsEvent> {
        let bounds = Aabb::from_center(
            agent.bounding.world_center(&agent.pose),
            agent.bounding.world_half_extents(&agent.pose),
        );
        let mut events = Vec::new();
        let mut now = HashSet::new();
        for volume in volumes {
            if volume.bounds.intersects(&bounds) {
                now.insert(volume.id);
                if !self.volumes.contains(&volume.id) {
                    events.push(PhysicsEvent::TriggerEnter {
                        volume: volume.id,
                        tag: volume.tag,
                    });
                }
            } else if self.volumes.contains(&volume.id) {
                events.push(PhysicsEvent::TriggerExit {
                    volume: volume.id,
                    tag: volume.tag,
                });
            }
        }
        self.volumes = now;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Terrain;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    const DT: f32 = 1.0 / 60.0;

    #[fixture]
    fn config() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    fn bird(role: Role, id: u32, position: Vec3) -> Agent {
        Agent::new(AgentId(id), role, position, 3)
    }

    fn ground_contacts(events: &[PhysicsEvent]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, PhysicsEvent::Collision(Contact::Ground)))
            .count()
    }

    #[rstest]
    fn gravity_drops_the_bird_onto_the_ground_once(config: PhysicsConfig) {
        let terrain = Terrain::flat(0.0);
        let mut agent = bird(Role::Player, 1, Vec3::new(0.0, 1.0, 0.0));
        agent.gravity = true;
        let mut body = Body::default();
        let mut contacts = 0;
        for _ in 0..120 {
            let events = body.step(&mut agent, &terrain, &[], &[], &config, DT);
            contacts += ground_contacts(&events);
        }
        assert_eq!(contacts, 1);
        assert!(body.grounded());
        assert_relative_eq!(agent.pose.position.y, 0.0, epsilon = 0.01);
        assert_relative_eq!(body.fall_speed(), 0.0);
    }

    #[rstest]
    fn birds_without_gravity_hover(config: PhysicsConfig) {
        let terrain = Terrain::flat(0.0);
        let mut agent = bird(Role::Player, 1, Vec3::new(0.0, 1.0, 0.0));
        agent.gravity = false;
        let mut body = Body::default();
        for _ in 0..30 {
            assert!(body.step(&mut agent, &terrain, &[], &[], &config, DT).is_empty());
        }
        assert_relative_eq!(agent.pose.position.y, 1.0);
    }

    #[rstest]
    fn sinking_into_the_ground_is_pushed_back_out(config: PhysicsConfig) {
        let terrain = Terrain::flat(0.0);
        let mut agent = bird(Role::Npc, 2, Vec3::new(0.0, -0.2, 0.0));
        agent.gravity = false;
        let mut body = Body::default();
        let events = body.step(&mut agent, &terrain, &[], &[], &config, DT);
        assert_eq!(ground_contacts(&events), 1);
        assert!(agent.pose.position.y >= -1e-3);
    }

    #[rstest]
    fn bird_contacts_are_edge_triggered(config: PhysicsConfig) {
        let terrain = Terrain::flat(-5.0);
        let mut player = bird(Role::Player, 1, Vec3::ZERO);
        player.gravity = false;
        let npc = bird(Role::Npc, 2, Vec3::new(0.4, 0.0, 0.0));
        let neighbours = [Neighbour::from(&player), Neighbour::from(&npc)];
        let mut body = Body::default();

        let first = body.step(&mut player, &terrain, &[], &neighbours, &config, DT);
        assert_eq!(
            first,
            vec![PhysicsEvent::Collision(Contact::Bird {
                id: AgentId(2),
                role: Role::Npc
            })]
        );
        assert!(body
            .step(&mut player, &terrain, &[], &neighbours, &config, DT)
            .is_empty());

        let apart = [Neighbour {
            position: Vec3::new(3.0, 0.0, 0.0),
            ..Neighbour::from(&npc)
        }];
        assert!(body.step(&mut player, &terrain, &[], &apart, &config, DT).is_empty());
        assert_eq!(body.step(&mut player, &terrain, &[], &neighbours, &config, DT).len(), 1);
    }

    #[rstest]
    fn volumes_report_enter_and_exit(config: PhysicsConfig) {
        let terrain = Terrain::flat(-5.0);
        let volume = TriggerVolume {
            id: VolumeId(4),
            bounds: Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
            tag: VolumeTag::Climbable,
        };
        let mut agent = bird(Role::Player, 1, Vec3::ZERO);
        agent.gravity = false;
        let mut body = Body::default();

        let entered = body.step(&mut agent, &terrain, &[volume], &[], &config, DT);
        assert_eq!(
            entered,
            vec![PhysicsEvent::TriggerEnter {
                volume: VolumeId(4),
                tag: VolumeTag::Climbable
            }]
        );
        assert!(body.step(&mut agent, &terrain, &[volume], &[], &config, DT).is_empty());

        agent.pose.position = Vec3::new(5.0, 0.0, 0.0);
        let left = body.step(&mut agent, &terrain, &[volume], &[], &config, DT);
        assert_eq!(
            left,
            vec![PhysicsEvent::TriggerExit {
                volume: VolumeId(4),
                tag: VolumeTag::Climbable
            }]
        );
    }
}
