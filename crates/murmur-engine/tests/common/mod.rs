//! Shared builders for engine integration tests.

#![allow(dead_code)]

use murmur_behavior::BehaviorSpec;
use murmur_behaviors::BehaviorRegistry;
use murmur_engine::{AgentSpec, RegistrationSpec, Simulation, SimulationConfig};
use murmur_space::ProximitySpace;
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness; `RUST_LOG=murmur_engine=debug`
/// shows lifecycle events.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn simulation() -> Simulation {
    simulation_with(SimulationConfig::default())
}

pub fn simulation_with(config: SimulationConfig) -> Simulation {
    init_logging();
    Simulation::new(config, Box::new(ProximitySpace::new())).unwrap()
}

pub fn registry() -> BehaviorRegistry {
    BehaviorRegistry::standard()
}

/// A 2D boid with the full steering pipeline.
pub fn boid(name: &str, x: f32, y: f32) -> AgentSpec {
    AgentSpec::new(name)
        .with_parameter("position", vec![x, y])
        .with_parameter("velocity", vec![0.0, 0.0])
        .with_parameter("acceleration", vec![0.0, 0.0])
        .with_registration(RegistrationSpec::new("position", "flock").with_radius(0.6))
        .with_behavior(BehaviorSpec::new("reset", "clear", "", "acceleration"))
        .with_behavior(
            BehaviorSpec::new("cohesion", "cohere", "position@flock", "acceleration")
                .with_param("amount", vec![0.5]),
        )
        .with_behavior(BehaviorSpec::new(
            "alignment",
            "align",
            "position@flock:velocity velocity",
            "acceleration",
        ))
        .with_behavior(
            BehaviorSpec::new("evasion", "evade", "position@flock", "acceleration")
                .with_param("maxDist", vec![0.1])
                .with_param("amount", vec![0.01]),
        )
        .with_behavior(
            BehaviorSpec::new("randomize", "jitter", "", "acceleration")
                .with_param("amount", vec![0.05]),
        )
        .with_behavior(
            BehaviorSpec::new("euler_integration", "move", "acceleration", "velocity position")
                .with_param("maxSpeed", vec![0.2]),
        )
        .with_behavior(BehaviorSpec::new("boundary_wrap", "wrap", "", "position"))
}

/// Snapshot of every committed value, keyed by agent and parameter name.
pub fn snapshot(sim: &Simulation) -> Vec<(String, String, Vec<f32>)> {
    let mut out = Vec::new();
    for (_, agent) in sim.agents() {
        for (_, p) in agent.parameters().iter() {
            out.push((
                agent.name().to_string(),
                p.name().to_string(),
                p.current().to_vec(),
            ));
        }
    }
    out
}
