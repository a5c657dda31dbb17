#![cfg_attr(docsrs, feature(doc_cfg))]
//! Locomotion for a flying, walking and swimming crane.
//!
//! Every bird owns one active [`fsm::State`] behind a
//! [`controller::Controller`]. The states read the ground through
//! [`sensor::Sensor`], blend motion with the helpers in [`motion`] and signal
//! an external animation system through [`animation::AnimationSink`].
//! [`simulation::Simulation`] ties the birds to a shared [`terrain::Terrain`]
//! and the physics stand-in, and [`plugin::CranePlugin`] drives it from a Bevy
//! app.
pub mod agent;
pub mod animation;
pub mod bounds;
pub mod config;
pub mod constants;
pub mod controller;
pub mod discovery;
pub mod effects;
pub mod fsm;
pub mod input;
pub mod logging;
pub mod motion;
pub mod physics;
pub mod plugin;
pub mod sensor;
pub mod simulation;
pub mod tasks;
pub mod terrain;
pub mod vector_math;

pub use agent::{Agent, AgentId, Pose, Role};
pub use config::{BirdConfig, ConfigError};
pub use constants::*;
pub use controller::{Controller, Transition};
pub use fsm::{JumpHeight, StateKind};
pub use input::{ControlInput, InputSource, ScriptedInput};
pub use logging::init as init_logging;
pub use plugin::{BirdFound, CranePlugin, PlayerControls, SimulationHandle, StateChanged, StepSettings};
pub use simulation::{Simulation, TickReport};
pub use terrain::Terrain;

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use crane::prelude::*;
    //! ```

    pub use crate::BirdConfig;
    pub use crate::ControlInput;
    pub use crate::CranePlugin;
    pub use crate::Simulation;
    pub use crate::StateKind;
    pub use crate::Terrain;
}
