//! Benchmark profiles and utilities for the Murmur simulation framework.
//!
//! Provides pre-built [`Simulation`] profiles for benchmarking and examples:
//!
//! - [`flock_profile`]: `n` boids in the unit square with the full steering pipeline
//! - [`field_profile`]: an `n`x`n` Gray-Scott environment with diffusion
//! - [`init_positions`]: deterministic agent placement via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use murmur_behavior::BehaviorSpec;
use murmur_behaviors::BehaviorRegistry;
use murmur_core::{AgentId, ConfigError};
use murmur_engine::{AgentSpec, EnvSpec, GridSpec, RegistrationSpec, Simulation, SimulationConfig};
use murmur_space::ProximitySpace;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Neighbor search radius of the flock profile.
pub const FLOCK_RADIUS: f32 = 0.1;

/// One boid: reset, cohesion, alignment, evasion, jitter, integration, wrap.
pub fn boid_spec(name: &str, position: [f32; 2]) -> AgentSpec {
    AgentSpec::new(name)
        .with_parameter("position", position.to_vec())
        .with_parameter("velocity", vec![0.0, 0.0])
        .with_parameter("acceleration", vec![0.0, 0.0])
        .with_registration(RegistrationSpec::new("position", "flock").with_radius(FLOCK_RADIUS))
        .with_behavior(BehaviorSpec::new("reset", "clear", "", "acceleration"))
        .with_behavior(
            BehaviorSpec::new("cohesion", "cohere", "position@flock", "acceleration")
                .with_param("amount", vec![0.2]),
        )
        .with_behavior(BehaviorSpec::new(
            "alignment",
            "align",
            "position@flock velocity",
            "acceleration",
        ))
        .with_behavior(
            BehaviorSpec::new("evasion", "evade", "position@flock", "acceleration")
                .with_param("maxDist", vec![0.03])
                .with_param("amount", vec![0.005]),
        )
        .with_behavior(
            BehaviorSpec::new("randomize", "jitter", "", "acceleration")
                .with_param("amount", vec![0.01]),
        )
        .with_behavior(
            BehaviorSpec::new("euler_integration", "move", "acceleration", "velocity position")
                .with_param("maxSpeed", vec![0.01]),
        )
        .with_behavior(BehaviorSpec::new("boundary_wrap", "wrap", "", "position"))
}

/// Build a flock benchmark profile: `n` boids scattered over the unit square.
///
/// # Errors
///
/// Only if a profile spec is malformed.
pub fn flock_profile(n: usize, seed: u64) -> Result<Simulation, ConfigError> {
    let config = SimulationConfig {
        seed,
        ..SimulationConfig::default()
    };
    let mut sim = Simulation::new(config, Box::new(ProximitySpace::new()))?;
    let registry = BehaviorRegistry::standard();
    for (i, position) in init_positions(n, seed).into_iter().enumerate() {
        sim.spawn(&boid_spec(&format!("boid-{i}"), position), &registry)?;
    }
    Ok(sim)
}

fn unit_grid(name: &str, n: usize, fill: f32) -> GridSpec {
    GridSpec {
        name: name.into(),
        value_dim: 1,
        subdivisions: vec![n, n],
        min: vec![0.0, 0.0],
        max: vec![1.0, 1.0],
        fill: vec![fill],
    }
}

/// Build a field benchmark profile: one `n`x`n` Gray-Scott environment.
///
/// Pipeline: Diffusion(u, 0.2) → Diffusion(v, 0.1) → GrayScott, dt = 1
/// (within the explicit limit of `1 / (2 * ndim)` = 0.25). The central
/// tenth of the grid is seeded with `u = 0.5`, `v = 0.25`.
///
/// # Errors
///
/// Only if `n` is zero.
pub fn field_profile(n: usize) -> Result<(Simulation, AgentId), ConfigError> {
    let mut sim = Simulation::new(SimulationConfig::default(), Box::new(ProximitySpace::new()))?;
    let spec = EnvSpec::new("dish")
        .with_field(unit_grid("u", n, 1.0))
        .with_field(unit_grid("v", n, 0.0))
        .with_behavior(
            BehaviorSpec::new("diffusion", "diffuse_u", "u", "u").with_param("rate", vec![0.2]),
        )
        .with_behavior(
            BehaviorSpec::new("diffusion", "diffuse_v", "v", "v").with_param("rate", vec![0.1]),
        )
        .with_behavior(BehaviorSpec::new("gray_scott", "react", "u v", "u v"));
    let env = sim.spawn_env(&spec, &BehaviorRegistry::standard())?;

    let mut u = vec![1.0; n * n];
    let mut v = vec![0.0; n * n];
    let lo = n * 9 / 20;
    let hi = (n * 11 / 20).max(lo + 1).min(n);
    for y in lo..hi {
        for x in lo..hi {
            u[y * n + x] = 0.5;
            v[y * n + x] = 0.25;
        }
    }
    sim.set_values(env, "u", &u)?;
    sim.set_values(env, "v", &v)?;
    Ok((sim, env))
}

/// Generate `n` deterministic positions in the unit square.
pub fn init_positions(n: usize, seed: u64) -> Vec<[f32; 2]> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| [rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flock_profile_steps() {
        let mut sim = flock_profile(32, 42).unwrap();
        assert_eq!(sim.len(), 32);
        let metrics = sim.step().unwrap();
        assert_eq!(metrics.agents, 32);
        assert_eq!(metrics.behaviors_run, 32 * 7);
    }

    #[test]
    fn field_profile_steps() {
        let (mut sim, env) = field_profile(20).unwrap();
        sim.step().unwrap();
        let v = sim.value(env, "v").unwrap();
        assert_eq!(v.len(), 400);
        assert!(v.iter().all(|x| x.is_finite() && *x >= 0.0));
    }

    #[test]
    fn init_positions_are_deterministic() {
        let a = init_positions(10, 7);
        assert_eq!(a, init_positions(10, 7));
        assert_ne!(a, init_positions(10, 8));
        assert!(a.iter().flatten().all(|c| (0.0..1.0).contains(c)));
    }

    #[test]
    fn equal_seeds_give_equal_flocks() {
        let mut a = flock_profile(16, 3).unwrap();
        let mut b = flock_profile(16, 3).unwrap();
        for _ in 0..5 {
            a.step().unwrap();
            b.step().unwrap();
        }
        for i in 0..16 {
            let name = format!("boid-{i}");
            let pa = a.value(a.agent_id(&name).unwrap(), "position").unwrap();
            let pb = b.value(b.agent_id(&name).unwrap(), "position").unwrap();
            assert_eq!(pa, pb);
        }
    }
}
