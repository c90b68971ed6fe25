//! The [`Simulation`] context: population, spatial index, and tick clock.
//!
//! There is no global registry. Everything an agent needs at attach time
//! or during a tick is reached through the simulation that owns it.

use crate::agent::Agent;
use crate::config::SimulationConfig;
use crate::swarm::Swarm;
use indexmap::IndexMap;
use murmur_behavior::Behavior;
use murmur_core::{
    AgentId, Arena, ConfigError, GroupHandle, LookupError, NeighborRelation, Owner, ParamRef,
    Parameter, ParameterList, SpaceError, SpatialIndex, SwarmId, TickError, TickId,
};
use smallvec::SmallVec;
use std::fmt;

/// Why a driver call failed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StepError {
    /// The act-phase hit a stale handle; every staged value was discarded.
    #[error(transparent)]
    Tick(#[from] TickError),

    /// The spatial index rejected a republished position. Values were
    /// committed regardless.
    #[error("position republish failed: {0}")]
    Space(#[from] SpaceError),
}

/// Owner of every agent, environment, and swarm of one simulation.
pub struct Simulation {
    pub(crate) config: SimulationConfig,
    pub(crate) agents: Arena<AgentId, Agent>,
    pub(crate) swarms: Arena<SwarmId, Swarm>,
    pub(crate) agent_names: IndexMap<String, AgentId>,
    pub(crate) swarm_names: IndexMap<String, SwarmId>,
    pub(crate) index: Box<dyn SpatialIndex>,
    pub(crate) tick: TickId,
    pub(crate) next_serial: u64,
    /// Registrations changed since the last refresh.
    pub(crate) dirty: bool,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("tick", &self.tick)
            .field("agents", &self.agents.len())
            .field("swarms", &self.swarms.len())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Create an empty simulation over a spatial index.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: SimulationConfig, index: Box<dyn SpatialIndex>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            agents: Arena::new(),
            swarms: Arena::new(),
            agent_names: IndexMap::new(),
            swarm_names: IndexMap::new(),
            index,
            tick: TickId::default(),
            next_serial: 0,
            dirty: false,
        })
    }

    /// The configuration the simulation was built with.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Number of agents, environments included.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether there are no agents.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Every agent in slot order.
    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.agents.iter()
    }

    /// Every swarm in slot order.
    pub fn swarms(&self) -> impl Iterator<Item = (SwarmId, &Swarm)> + '_ {
        self.swarms.iter()
    }

    /// Handle of an agent by name.
    ///
    /// # Errors
    ///
    /// [`LookupError::AgentName`].
    pub fn agent_id(&self, name: &str) -> Result<AgentId, LookupError> {
        self.agent_names
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::AgentName(name.to_string()))
    }

    /// Agent by handle.
    ///
    /// # Errors
    ///
    /// [`LookupError::Agent`] for a removed or foreign handle.
    pub fn agent(&self, id: AgentId) -> Result<&Agent, LookupError> {
        self.agents.get(id).ok_or(LookupError::Agent(id))
    }

    /// Handle of a swarm by name.
    ///
    /// # Errors
    ///
    /// [`LookupError::SwarmName`].
    pub fn swarm_id(&self, name: &str) -> Result<SwarmId, LookupError> {
        self.swarm_names
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::SwarmName(name.to_string()))
    }

    /// Swarm by handle.
    ///
    /// # Errors
    ///
    /// [`LookupError::Swarm`].
    pub fn swarm(&self, id: SwarmId) -> Result<&Swarm, LookupError> {
        self.swarms.get(id).ok_or(LookupError::Swarm(id))
    }

    /// An agent's parameter by name.
    ///
    /// # Errors
    ///
    /// [`LookupError::Agent`] or [`LookupError::Parameter`].
    pub fn parameter(&self, agent: AgentId, name: &str) -> Result<&Parameter, LookupError> {
        self.agent(agent)?.parameter(name)
    }

    /// Committed value of an agent's parameter by name.
    ///
    /// # Errors
    ///
    /// As [`parameter`](Self::parameter).
    pub fn value(&self, agent: AgentId, name: &str) -> Result<&[f32], LookupError> {
        self.parameter(agent, name).map(Parameter::current)
    }

    /// Handle of an agent's parameter by name.
    ///
    /// # Errors
    ///
    /// As [`parameter`](Self::parameter).
    pub fn param_ref(&self, agent: AgentId, name: &str) -> Result<ParamRef, LookupError> {
        let a = self.agent(agent)?;
        let id = a.params.id(name).ok_or_else(|| LookupError::Parameter {
            owner: a.name().to_string(),
            name: name.to_string(),
        })?;
        Ok(ParamRef::agent(agent, id))
    }

    /// An agent's behavior by name.
    ///
    /// # Errors
    ///
    /// [`LookupError::Agent`] or [`LookupError::Behavior`].
    pub fn behavior(&self, agent: AgentId, name: &str) -> Result<&dyn Behavior, LookupError> {
        self.agent(agent)?.behavior(name)
    }

    /// Committed value behind any handle, or `None` if it is stale.
    pub fn current(&self, param: ParamRef) -> Option<&[f32]> {
        self.list(param.owner)?
            .get(param.param)
            .map(Parameter::current)
    }

    /// Neighbor list of a registration as of the last refresh.
    pub fn neighbors(&self, group: GroupHandle) -> &[NeighborRelation] {
        self.index.neighbors(group)
    }

    /// The spatial index.
    pub fn index(&self) -> &dyn SpatialIndex {
        self.index.as_ref()
    }

    fn list(&self, owner: Owner) -> Option<&ParameterList> {
        match owner {
            Owner::Agent(a) => self.agents.get(a).map(|a| &a.params),
            Owner::Swarm(s) => self.swarms.get(s).map(|s| &s.params),
        }
    }

    /// Overwrite both buffers of an agent's parameter and republish it.
    ///
    /// Configuration-time edit; calling it between the act- and
    /// flush-phases discards the parameter's staged value.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`], [`ConfigError::Dimension`] for a
    /// wrong-length value, or [`ConfigError::Space`].
    pub fn set_values(
        &mut self,
        agent: AgentId,
        name: &str,
        values: &[f32],
    ) -> Result<(), ConfigError> {
        let a = self.agents.get_mut(agent).ok_or(LookupError::Agent(agent))?;
        let p = a.params.parameter_mut(&a.name, name)?;
        p.set_values(values)?;
        publish(p, self.index.as_mut())?;
        self.dirty = true;
        Ok(())
    }

    /// Overwrite a swarm parameter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`] or [`ConfigError::Dimension`].
    pub fn set_swarm_values(
        &mut self,
        swarm: SwarmId,
        name: &str,
        values: &[f32],
    ) -> Result<(), ConfigError> {
        let s = self.swarms.get_mut(swarm).ok_or(LookupError::Swarm(swarm))?;
        let Swarm { name: owner, params, .. } = s;
        params.parameter_mut(owner, name)?.set_values(values)
    }
}

/// The position a registered parameter publishes: its value, or a grid's
/// center.
pub(crate) fn published_position(p: &Parameter) -> SmallVec<[f32; 4]> {
    match p.shape().grid() {
        Some(geometry) => geometry.center().into_iter().collect(),
        None => SmallVec::from_slice(p.current()),
    }
}

/// Republish every registration of one parameter.
pub(crate) fn publish(p: &Parameter, index: &mut dyn SpatialIndex) -> Result<(), SpaceError> {
    if p.registrations().is_empty() || p.shape().is_grid() {
        return Ok(());
    }
    for registration in p.registrations().values() {
        index.publish(registration.group, p.current())?;
    }
    Ok(())
}
