//! Declarative population specs.
//!
//! These are what an external loader deserializes and hands to
//! [`Simulation::spawn`](crate::Simulation::spawn),
//! [`spawn_env`](crate::Simulation::spawn_env), and
//! [`spawn_swarm`](crate::Simulation::spawn_swarm). Behaviors are described
//! by [`BehaviorSpec`].
//!
//! ```json
//! {
//!   "name": "boid-0",
//!   "parameters": [
//!     { "name": "position", "values": [0.5, 0.5] },
//!     { "name": "velocity", "values": [0.0, 0.0] },
//!     { "name": "acceleration", "values": [0.0, 0.0] }
//!   ],
//!   "registrations": [{ "parameter": "position", "space": "flock", "radius": 0.2 }],
//!   "behaviors": [
//!     { "class": "reset", "name": "clear", "output": "acceleration" },
//!     { "class": "cohesion", "name": "cohere", "input": "position@flock", "output": "acceleration" }
//!   ]
//! }
//! ```

use murmur_behavior::BehaviorSpec;
use murmur_core::{ConfigError, GridGeometry, NeighborQuery, Parameter};
use serde::{Deserialize, Serialize};

/// A vector parameter and its initial value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Parameter name, unique within its owner.
    pub name: String,
    /// Initial value; its length fixes the dimension.
    pub values: Vec<f32>,
}

impl ParameterSpec {
    /// Build the parameter.
    pub fn build(&self) -> Parameter {
        Parameter::new(self.name.clone(), self.values.clone())
    }
}

/// A grid parameter: geometry plus a uniform initial cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Parameter name.
    pub name: String,
    /// Components per cell.
    #[serde(default = "one")]
    pub value_dim: usize,
    /// Cells per spatial axis.
    pub subdivisions: Vec<usize>,
    /// Lower corner.
    pub min: Vec<f32>,
    /// Upper corner.
    pub max: Vec<f32>,
    /// Initial value of every cell. Empty means zeros.
    #[serde(default)]
    pub fill: Vec<f32>,
}

fn one() -> usize {
    1
}

impl GridSpec {
    /// Build the parameter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidGrid`] for malformed geometry or a fill value
    /// of the wrong length.
    pub fn build(&self) -> Result<Parameter, ConfigError> {
        let geometry = GridGeometry::new(self.value_dim, &self.subdivisions, &self.min, &self.max)?;
        let fill = if self.fill.is_empty() {
            vec![0.0; self.value_dim]
        } else {
            self.fill.clone()
        };
        Parameter::grid(self.name.clone(), geometry, &fill)
    }
}

/// Registration of a parameter in a named space.
///
/// A registered grid is discovered at its center. Agents sample it through
/// `field_sample`/`field_gradient`; steering behaviors (cohesion,
/// alignment, evasion, orbits) skip grid neighbors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationSpec {
    /// Name of the registered parameter.
    pub parameter: String,
    /// Space name.
    pub space: String,
    /// Whether others can discover this registration.
    #[serde(default = "yes")]
    pub visible: bool,
    /// Search radius; non-positive is unbounded.
    #[serde(default)]
    pub radius: f32,
    /// Neighbor list cap; zero is unbounded.
    #[serde(default)]
    pub max_neighbors: usize,
    /// Prefer closer candidates once the list is full.
    #[serde(default = "yes")]
    pub replace_when_full: bool,
}

fn yes() -> bool {
    true
}

impl RegistrationSpec {
    /// An unbounded, visible registration.
    pub fn new(parameter: impl Into<String>, space: impl Into<String>) -> Self {
        let query = NeighborQuery::default();
        Self {
            parameter: parameter.into(),
            space: space.into(),
            visible: query.visible,
            radius: query.radius,
            max_neighbors: query.max_neighbors,
            replace_when_full: query.replace_when_full,
        }
    }

    /// Limit the search radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// The query settings handed to the spatial index.
    pub fn query(&self) -> NeighborQuery {
        NeighborQuery {
            visible: self.visible,
            radius: self.radius,
            max_neighbors: self.max_neighbors,
            replace_when_full: self.replace_when_full,
        }
    }
}

/// A mobile agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Unique agent name.
    pub name: String,
    /// Name of the swarm the agent joins.
    #[serde(default)]
    pub swarm: Option<String>,
    /// Vector parameters.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Spatial registrations, made before any behavior is attached.
    #[serde(default)]
    pub registrations: Vec<RegistrationSpec>,
    /// Behavior pipeline, in execution order.
    #[serde(default)]
    pub behaviors: Vec<BehaviorSpec>,
}

impl AgentSpec {
    /// An agent with nothing attached.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Join a swarm.
    pub fn in_swarm(mut self, swarm: impl Into<String>) -> Self {
        self.swarm = Some(swarm.into());
        self
    }

    /// Add a vector parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            values,
        });
        self
    }

    /// Add a registration.
    pub fn with_registration(mut self, registration: RegistrationSpec) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Append a behavior.
    pub fn with_behavior(mut self, behavior: BehaviorSpec) -> Self {
        self.behaviors.push(behavior);
        self
    }
}

/// An environment: an agent whose state lives on grids.
///
/// Every registered grid publishes its center as its position, so agents
/// registered in the same space see the environment as a neighbor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvSpec {
    /// Unique environment name.
    pub name: String,
    /// Grid parameters.
    #[serde(default)]
    pub fields: Vec<GridSpec>,
    /// Additional vector parameters.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Spatial registrations.
    #[serde(default)]
    pub registrations: Vec<RegistrationSpec>,
    /// Behavior pipeline.
    #[serde(default)]
    pub behaviors: Vec<BehaviorSpec>,
}

impl EnvSpec {
    /// An environment with nothing attached.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a grid.
    pub fn with_field(mut self, field: GridSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a registration.
    pub fn with_registration(mut self, registration: RegistrationSpec) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Append a behavior.
    pub fn with_behavior(mut self, behavior: BehaviorSpec) -> Self {
        self.behaviors.push(behavior);
        self
    }
}

/// Parameters shared by a group of agents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SwarmSpec {
    /// Unique swarm name.
    pub name: String,
    /// Aggregate-level parameters.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_defaults_match_query_defaults() {
        let spec: RegistrationSpec =
            serde_json::from_str(r#"{ "parameter": "position", "space": "flock" }"#).unwrap();
        assert_eq!(spec.query(), NeighborQuery::default());
        assert_eq!(spec, RegistrationSpec::new("position", "flock"));
    }

    #[test]
    fn grid_spec_fills_zeros_by_default() {
        let spec: GridSpec = serde_json::from_str(
            r#"{ "name": "u", "subdivisions": [2, 2], "min": [0, 0], "max": [1, 1] }"#,
        )
        .unwrap();
        let p = spec.build().unwrap();
        assert_eq!(p.current(), &[0.0; 4]);
        assert!(p.shape().is_grid());
    }

    #[test]
    fn bad_grid_fill_is_rejected() {
        let spec = GridSpec {
            name: "uv".into(),
            value_dim: 2,
            subdivisions: vec![2],
            min: vec![0.0],
            max: vec![1.0],
            fill: vec![1.0],
        };
        assert!(matches!(spec.build(), Err(ConfigError::InvalidGrid { .. })));
    }

    #[test]
    fn agent_spec_from_json() {
        let spec: AgentSpec = serde_json::from_str(
            r#"{
                "name": "boid",
                "swarm": "flock",
                "parameters": [{ "name": "position", "values": [0.0, 1.0] }],
                "registrations": [{ "parameter": "position", "space": "flock", "radius": 0.5 }],
                "behaviors": [{ "class": "cohesion", "name": "c", "input": "position@flock",
                                "output": "position", "params": { "amount": [2.0] } }]
            }"#,
        )
        .unwrap();
        assert_eq!(spec.swarm.as_deref(), Some("flock"));
        assert_eq!(spec.registrations[0].radius, 0.5);
        assert!(spec.registrations[0].visible);
        assert_eq!(spec.behaviors[0].params["amount"], vec![2.0]);
    }
}
