//! Environments: grid fields, stencils, and agent-field coupling.

mod common;

use common::{registry, simulation};
use murmur_behavior::BehaviorSpec;
use murmur_engine::{AgentSpec, EntityKind, EnvSpec, GridSpec, RegistrationSpec, Simulation};

fn grid(name: &str, n: usize) -> GridSpec {
    GridSpec {
        name: name.into(),
        value_dim: 1,
        subdivisions: vec![n, n],
        min: vec![0.0, 0.0],
        max: vec![1.0, 1.0],
        fill: vec![],
    }
}

#[test]
fn diffusion_stencil_counts_in_bounds_neighbours() {
    let mut sim = simulation();
    let mut envs = Vec::new();
    for cell in 0..9 {
        let spec = EnvSpec::new(format!("dish{cell}"))
            .with_field(grid("heat", 3))
            .with_behavior(
                BehaviorSpec::new("diffusion", "spread", "heat", "heat")
                    .with_param("rate", vec![1.0]),
            );
        let env = sim.spawn_env(&spec, &registry()).unwrap();
        let mut spike = vec![0.0; 9];
        spike[cell] = 1.0;
        sim.set_values(env, "heat", &spike).unwrap();
        envs.push(env);
    }

    sim.step().unwrap();
    let delta = |cell: usize| sim.value(envs[cell], "heat").unwrap()[cell] - 1.0;
    for corner in [0, 2, 6, 8] {
        assert_eq!(delta(corner), -2.0, "corner {corner}");
    }
    for edge in [1, 3, 5, 7] {
        assert_eq!(delta(edge), -3.0, "edge {edge}");
    }
    assert_eq!(delta(4), -4.0);
    for &env in &envs {
        assert_eq!(sim.agent(env).unwrap().kind(), EntityKind::Env);
        let total: f32 = sim.value(env, "heat").unwrap().iter().sum();
        assert_eq!(total, 1.0);
    }
}

/// A probe at the origin of a 1D space with neighbors at -0.1, 0.4, and
/// -0.6, pulled toward them by cohesion limited to `band`.
fn banded_pull(band: Option<(f32, f32)>) -> f32 {
    let mut sim = simulation();
    for (name, x) in [("near", -0.1), ("mid", 0.4), ("far", -0.6)] {
        let spec = AgentSpec::new(name)
            .with_parameter("position", vec![x])
            .with_registration(RegistrationSpec::new("position", "line"));
        sim.spawn(&spec, &registry()).unwrap();
    }
    let mut cohere = BehaviorSpec::new("cohesion", "cohere", "position@line", "pull");
    if let Some((min, max)) = band {
        cohere = cohere
            .with_param("minDist", vec![min])
            .with_param("maxDist", vec![max]);
    }
    let probe = AgentSpec::new("probe")
        .with_parameter("position", vec![0.0])
        .with_parameter("pull", vec![0.0])
        .with_registration(RegistrationSpec::new("position", "line"))
        .with_behavior(cohere);
    let id = sim.spawn(&probe, &registry()).unwrap();
    sim.step().unwrap();
    sim.value(id, "pull").unwrap()[0]
}

#[test]
fn distance_band_admits_only_neighbors_inside_it() {
    assert!((banded_pull(Some((0.2, 0.5))) - 1.0).abs() < 1e-6);
    assert!((banded_pull(None) + 1.0 / 3.0).abs() < 1e-6);
    // Nobody in the band: the output is untouched.
    assert_eq!(banded_pull(Some((0.7, 0.9))), 0.0);
}

fn ant_colony() -> (Simulation, murmur_core::AgentId, murmur_core::AgentId) {
    let mut sim = simulation();
    let soil = EnvSpec::new("soil")
        .with_field(grid("trail", 4))
        .with_registration(RegistrationSpec::new("trail", "ground"))
        .with_behavior(BehaviorSpec::new(
            "field_deposit",
            "mark",
            "trail@ground:scent",
            "trail",
        ));
    let env = sim.spawn_env(&soil, &registry()).unwrap();
    let ant = AgentSpec::new("ant")
        .with_parameter("position", vec![0.1, 0.1])
        .with_parameter("scent", vec![2.0])
        .with_parameter("smell", vec![0.0])
        .with_registration(RegistrationSpec::new("position", "ground"))
        .with_behavior(BehaviorSpec::new("field_sample", "sniff", "position@ground", "smell"));
    let ant = sim.spawn(&ant, &registry()).unwrap();
    (sim, env, ant)
}

#[test]
fn agents_read_fields_written_on_the_previous_tick() {
    let (mut sim, env, ant) = ant_colony();

    sim.step().unwrap();
    assert_eq!(sim.value(env, "trail").unwrap()[0], 2.0);
    assert_eq!(sim.value(ant, "smell").unwrap(), &[0.0]);

    sim.step().unwrap();
    assert_eq!(sim.value(env, "trail").unwrap()[0], 4.0);
    assert_eq!(sim.value(ant, "smell").unwrap(), &[2.0]);
    let total: f32 = sim.value(env, "trail").unwrap().iter().sum();
    assert_eq!(total, 4.0);
}

#[test]
fn moving_agents_are_followed_by_the_field() {
    let (mut sim, env, ant) = ant_colony();
    sim.set_values(ant, "position", &[0.9, 0.9]).unwrap();
    sim.step().unwrap();
    let trail = sim.value(env, "trail").unwrap();
    assert_eq!(trail[15], 2.0);
    assert_eq!(trail[0], 0.0);
}

#[test]
fn environments_load_from_json() {
    let spec: EnvSpec = serde_json::from_str(
        r#"{
            "name": "pond",
            "fields": [
                { "name": "u", "subdivisions": [8, 8], "min": [0, 0], "max": [1, 1], "fill": [1.0] },
                { "name": "v", "subdivisions": [8, 8], "min": [0, 0], "max": [1, 1] }
            ],
            "behaviors": [
                { "class": "gray_scott", "name": "react", "input": "u v", "output": "u v" }
            ]
        }"#,
    )
    .unwrap();
    let mut sim = simulation();
    let pond = sim.spawn_env(&spec, &registry()).unwrap();
    for _ in 0..5 {
        sim.step().unwrap();
    }
    // u = 1, v = 0 is the trivial steady state.
    assert!(sim.value(pond, "u").unwrap().iter().all(|&u| u == 1.0));
    assert!(sim.value(pond, "v").unwrap().iter().all(|&v| v == 0.0));
    assert!(sim.agent(pond).unwrap().parameters().contains("react_active"));
}
