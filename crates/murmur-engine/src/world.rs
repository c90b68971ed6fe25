//! Read-only view of the population handed to behaviors.

use crate::agent::Agent;
use crate::swarm::Swarm;
use murmur_core::{
    AgentId, Arena, GroupHandle, NeighborRelation, NeighborSource, Owner, ParamRef, ParamShape,
    Parameter, ParameterList, ParameterSource, SpatialIndex, SwarmId,
};

/// Committed values of every entity plus the frozen neighbor lists.
pub(crate) struct World<'a> {
    pub(crate) agents: &'a Arena<AgentId, Agent>,
    pub(crate) swarms: &'a Arena<SwarmId, Swarm>,
    pub(crate) index: &'a dyn SpatialIndex,
}

impl<'a> World<'a> {
    fn list(&self, owner: Owner) -> Option<&'a ParameterList> {
        match owner {
            Owner::Agent(a) => self.agents.get(a).map(|a| &a.params),
            Owner::Swarm(s) => self.swarms.get(s).map(|s| &s.params),
        }
    }

    fn parameter(&self, param: ParamRef) -> Option<&'a Parameter> {
        self.list(param.owner)?.get(param.param)
    }
}

impl ParameterSource for World<'_> {
    fn current(&self, param: ParamRef) -> Option<&[f32]> {
        self.parameter(param).map(Parameter::current)
    }

    fn shape(&self, param: ParamRef) -> Option<&ParamShape> {
        self.parameter(param).map(Parameter::shape)
    }

    fn find(&self, owner: Owner, name: &str) -> Option<ParamRef> {
        let id = self.list(owner)?.id(name)?;
        Some(ParamRef { owner, param: id })
    }
}

impl NeighborSource for World<'_> {
    fn neighbors(&self, group: GroupHandle) -> &[NeighborRelation] {
        self.index.neighbors(group)
    }
}
