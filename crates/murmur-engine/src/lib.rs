//! Simulation driver for Murmur populations.
//!
//! A [`Simulation`] owns every [`Agent`] (including grid-carrying
//! environments) and [`Swarm`], the spatial index they register in, and
//! the tick counter. Each [`step`](Simulation::step) runs two passes over
//! the whole population: every agent's behavior pipeline acts against
//! committed values, then every agent flushes its staged values. No agent
//! observes another's half-finished tick, so the outcome does not depend
//! on the order agents are visited in.
//!
//! Populations are built either programmatically or from the declarative
//! specs in [`spec`], with behaviors constructed by a
//! [`BehaviorFactory`](murmur_behavior::BehaviorFactory).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod config;
mod lifecycle;
pub mod metrics;
pub mod simulation;
pub mod spec;
pub mod swarm;
mod tick;
mod world;

pub use agent::{Agent, EntityKind};
pub use config::SimulationConfig;
pub use metrics::StepMetrics;
pub use simulation::{Simulation, StepError};
pub use spec::{AgentSpec, EnvSpec, GridSpec, ParameterSpec, RegistrationSpec, SwarmSpec};
pub use swarm::Swarm;
