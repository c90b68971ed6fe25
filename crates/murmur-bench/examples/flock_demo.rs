//! End-to-end flocking example.
//!
//! Demonstrates: build a flock → step → read metrics and velocities → copy
//! an agent → step again. Run with `RUST_LOG=murmur_engine=debug` to see
//! lifecycle events.

use murmur_bench::flock_profile;
use tracing_subscriber::EnvFilter;

/// Mean speed over every agent.
fn mean_speed(sim: &murmur_engine::Simulation) -> f32 {
    let total: f32 = sim
        .agents()
        .map(|(_, agent)| {
            let v = agent.value("velocity").unwrap();
            v[0].hypot(v[1])
        })
        .sum();
    total / sim.len() as f32
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Murmur Flock Example ===\n");

    let mut sim = flock_profile(200, 42).unwrap();
    for tick in 0..100 {
        let metrics = sim.step().unwrap();
        if tick % 25 == 0 || tick == 99 {
            println!(
                "  tick {:>3}: agents={}, behaviors={}, mean_speed={:>8.5}, time={:>6}μs",
                tick + 1,
                metrics.agents,
                metrics.behaviors_run,
                mean_speed(&sim),
                metrics.total_us,
            );
        }
    }

    println!("\nCopying boid-0 ten times...");
    let template = sim.agent_id("boid-0").unwrap();
    for i in 0..10 {
        sim.copy_agent(template, &format!("clone-{i}")).unwrap();
    }
    let metrics = sim.step().unwrap();
    println!(
        "  tick {:>3}: agents={}, time={:>6}μs",
        sim.tick().0,
        metrics.agents,
        metrics.total_us
    );
}
