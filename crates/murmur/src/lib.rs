//! Murmur: composable per-tick behaviors for agent swarms and
//! reaction-diffusion fields.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Murmur sub-crates. For most users, adding `murmur` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use murmur::prelude::*;
//!
//! let mut sim = Simulation::new(SimulationConfig::default(), Box::new(ProximitySpace::new()))
//!     .unwrap();
//! let registry = BehaviorRegistry::standard();
//!
//! // Two boids that steer toward each other.
//! for (name, x) in [("a", 0.25), ("b", 0.75)] {
//!     let spec = AgentSpec::new(name)
//!         .with_parameter("position", vec![x, 0.5])
//!         .with_parameter("velocity", vec![0.0, 0.0])
//!         .with_parameter("acceleration", vec![0.0, 0.0])
//!         .with_registration(RegistrationSpec::new("position", "flock"))
//!         .with_behavior(BehaviorSpec::new("reset", "clear", "", "acceleration"))
//!         .with_behavior(BehaviorSpec::new("cohesion", "cohere", "position@flock", "acceleration"))
//!         .with_behavior(BehaviorSpec::new(
//!             "euler_integration",
//!             "move",
//!             "acceleration",
//!             "velocity position",
//!         ));
//!     sim.spawn(&spec, &registry).unwrap();
//! }
//!
//! let metrics = sim.step().unwrap();
//! assert_eq!(metrics.behaviors_run, 6);
//!
//! // Forces staged on one tick are integrated on the next.
//! let a = sim.agent_id("a").unwrap();
//! assert_eq!(sim.value(a, "velocity").unwrap(), &[0.0, 0.0]);
//! sim.step().unwrap();
//! assert!(sim.value(a, "velocity").unwrap()[0] > 0.0);
//! assert_eq!(sim.tick(), TickId(2));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `murmur-core` | IDs, parameters, arena, errors, core traits |
//! | [`space`] | `murmur-space` | Proximity index, grid stencils, field access |
//! | [`behavior`] | `murmur-behavior` | Behavior trait, wiring grammar, write-order checks |
//! | [`behaviors`] | `murmur-behaviors` | The behavior library and class registry |
//! | [`engine`] | `murmur-engine` | Simulation driver, agents, swarms, environments |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`murmur-core`).
///
/// Contains the double-buffered [`types::Parameter`], handle types, the
/// error taxonomy, and the seams between behaviors and the engine
/// ([`types::ParameterSource`], [`types::NeighborSource`],
/// [`types::SpatialIndex`]).
pub use murmur_core as types;

/// Spatial index and grid helpers (`murmur-space`).
///
/// [`space::ProximitySpace`] is the reference [`types::SpatialIndex`].
pub use murmur_space as space;

/// Behavior trait and wiring (`murmur-behavior`).
///
/// The [`behavior::Behavior`] trait is the main extension point for
/// user-defined per-tick logic.
pub use murmur_behavior as behavior;

/// Reference behaviors (`murmur-behaviors`).
///
/// Flocking, integration, field coupling, diffusion, and reaction, all
/// reachable by class tag through [`behaviors::BehaviorRegistry`].
pub use murmur_behaviors as behaviors;

/// Simulation driver (`murmur-engine`).
pub use murmur_engine as engine;

/// Common imports for typical Murmur usage.
///
/// ```rust
/// use murmur::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use murmur_core::{
        AgentId, NeighborQuery, ParamRef, Parameter, SpatialIndex, SwarmId, TickId,
    };

    // Errors
    pub use murmur_core::{ConfigError, LookupError, SpaceError, TickError};

    // Space
    pub use murmur_space::ProximitySpace;

    // Behaviors
    pub use murmur_behavior::{
        ActContext, AttachContext, Behavior, BehaviorCore, BehaviorFactory, BehaviorSpec,
        WriteMode, WriteOrderPolicy,
    };
    pub use murmur_behaviors::{Attach, BehaviorRegistry};

    // Engine
    pub use murmur_engine::{
        AgentSpec, EnvSpec, GridSpec, ParameterSpec, RegistrationSpec, Simulation,
        SimulationConfig, StepError, StepMetrics, SwarmSpec,
    };
}
