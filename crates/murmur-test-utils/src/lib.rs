//! Test utilities and mock types for Murmur development.
//!
//! [`MockWorld`] is a minimal stand-in for the simulation: it owns agents
//! and swarms, implements [`ParameterSource`] and [`NeighborSource`], and
//! lets tests script neighbor lists directly instead of going through a
//! spatial index.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use indexmap::IndexMap;
use murmur_behavior::{ActContext, ActSummary, AttachContext, Behavior, BehaviorList};
use murmur_core::{
    AgentId, Arena, BackupBank, GroupHandle, NeighborQuery, NeighborRelation, NeighborSource,
    Owner, ParamRef, ParamShape, Parameter, ParameterList, ParameterSource, Registration, SwarmId,
    TickError, TickId,
};
use smallvec::SmallVec;

pub use fixtures::{AddConstBehavior, ConstBehavior, FixtureFactory};

struct MockAgent {
    name: String,
    params: ParameterList,
}

/// A scripted population for behavior tests.
#[derive(Default)]
pub struct MockWorld {
    agents: Arena<AgentId, MockAgent>,
    swarms: Arena<SwarmId, ParameterList>,
    neighbors: IndexMap<GroupHandle, Vec<NeighborRelation>>,
    next_group: u32,
    pub tick: TickId,
    pub seed: u64,
    pub dt: f32,
}

impl MockWorld {
    pub fn new() -> Self {
        Self {
            dt: 1.0,
            ..Self::default()
        }
    }

    pub fn add_agent(&mut self, name: &str) -> AgentId {
        self.agents.insert(MockAgent {
            name: name.to_string(),
            params: ParameterList::new(),
        })
    }

    pub fn add_swarm(&mut self) -> SwarmId {
        self.swarms.insert(ParameterList::new())
    }

    /// Add a parameter to an agent. Panics on a duplicate name.
    pub fn add_param(&mut self, agent: AgentId, parameter: Parameter) -> ParamRef {
        let id = self
            .params_mut(agent)
            .add(parameter)
            .expect("duplicate parameter in mock agent");
        ParamRef::agent(agent, id)
    }

    pub fn add_swarm_param(&mut self, swarm: SwarmId, parameter: Parameter) -> ParamRef {
        let id = self
            .swarms
            .get_mut(swarm)
            .expect("unknown mock swarm")
            .add(parameter)
            .expect("duplicate parameter in mock swarm");
        ParamRef::swarm(swarm, id)
    }

    pub fn remove_agent(&mut self, agent: AgentId) {
        self.agents.remove(agent);
    }

    pub fn params(&self, agent: AgentId) -> &ParameterList {
        &self.agents.get(agent).expect("unknown mock agent").params
    }

    pub fn params_mut(&mut self, agent: AgentId) -> &mut ParameterList {
        &mut self.agents.get_mut(agent).expect("unknown mock agent").params
    }

    /// Record a registration of `param` in `space` and hand out a fresh
    /// group whose neighbor list starts empty.
    pub fn register(&mut self, param: ParamRef, space: &str) -> GroupHandle {
        let group = GroupHandle(self.next_group);
        self.next_group += 1;
        let agent = param.owner.agent().expect("only agent parameters register");
        self.params_mut(agent)
            .get_mut(param.param)
            .expect("unknown mock parameter")
            .add_registration(
                space,
                Registration {
                    group,
                    query: NeighborQuery::default(),
                },
            );
        self.neighbors.insert(group, Vec::new());
        group
    }

    /// Script the neighbor list of a group.
    pub fn set_neighbors(&mut self, group: GroupHandle, relations: Vec<NeighborRelation>) {
        self.neighbors.insert(group, relations);
    }

    /// Build a relation pointing at `neighbor`.
    pub fn relation(neighbor: ParamRef, distance: f32, direction: &[f32]) -> NeighborRelation {
        NeighborRelation {
            neighbor,
            distance,
            direction: SmallVec::from_slice(direction),
        }
    }

    /// An attach scope for one agent (without swarm).
    pub fn attach_context(&mut self, agent: AgentId) -> AttachContext<'_> {
        let a = self.agents.get_mut(agent).expect("unknown mock agent");
        AttachContext::new(agent, &a.name, &mut a.params, None)
    }

    /// An attach scope for one agent that also resolves swarm parameters.
    pub fn attach_context_in(&mut self, agent: AgentId, swarm: SwarmId) -> AttachContext<'_> {
        let a = self.agents.get_mut(agent).expect("unknown mock agent");
        let s = self.swarms.get(swarm).expect("unknown mock swarm");
        AttachContext::new(agent, &a.name, &mut a.params, Some((swarm, s)))
    }

    pub fn detach(&mut self, agent: AgentId) -> BackupBank {
        self.params_mut(agent).detach_backups()
    }

    pub fn restore(&mut self, agent: AgentId, bank: BackupBank) {
        self.params_mut(agent).restore_backups(bank);
    }

    /// Run one behavior for `agent`, leaving its writes staged.
    pub fn act(&mut self, agent: AgentId, behavior: &dyn Behavior) -> Result<(), TickError> {
        let mut bank = self.detach(agent);
        let result = {
            let mut ctx = self.context(agent, &mut bank);
            behavior.act(&mut ctx)
        };
        self.restore(agent, bank);
        result
    }

    /// Run a pipeline for `agent`, leaving its writes staged.
    pub fn act_list(&mut self, agent: AgentId, list: &BehaviorList) -> Result<ActSummary, TickError> {
        let mut bank = self.detach(agent);
        let result = {
            let mut ctx = self.context(agent, &mut bank);
            list.act(&mut ctx)
        };
        self.restore(agent, bank);
        result
    }

    fn context<'a>(&'a self, agent: AgentId, bank: &'a mut BackupBank) -> ActContext<'a> {
        ActContext::new(
            agent,
            u64::from(agent.index()),
            self.tick,
            self.seed,
            self.dt,
            self,
            self,
            bank,
        )
    }

    /// Commit an agent's staged values.
    pub fn flush(&mut self, agent: AgentId) {
        self.params_mut(agent).flush();
    }

    /// Committed value, panicking on a stale reference.
    pub fn value(&self, param: ParamRef) -> &[f32] {
        self.current(param).expect("stale mock parameter")
    }

    /// Staged value of an agent parameter.
    pub fn staged(&self, param: ParamRef) -> &[f32] {
        let agent = param.owner.agent().expect("only agents stage values");
        self.params(agent)
            .get(param.param)
            .expect("stale mock parameter")
            .backup()
    }

    /// Overwrite both buffers of a parameter.
    pub fn set(&mut self, param: ParamRef, values: &[f32]) {
        let agent = param.owner.agent().expect("only agent parameters are settable");
        self.params_mut(agent)
            .get_mut(param.param)
            .expect("stale mock parameter")
            .set_values(values)
            .expect("wrong dimension");
    }

    fn list(&self, owner: Owner) -> Option<&ParameterList> {
        match owner {
            Owner::Agent(a) => self.agents.get(a).map(|a| &a.params),
            Owner::Swarm(s) => self.swarms.get(s),
        }
    }
}

impl ParameterSource for MockWorld {
    fn current(&self, param: ParamRef) -> Option<&[f32]> {
        self.list(param.owner)?.get(param.param).map(Parameter::current)
    }

    fn shape(&self, param: ParamRef) -> Option<&ParamShape> {
        self.list(param.owner)?.get(param.param).map(Parameter::shape)
    }

    fn find(&self, owner: Owner, name: &str) -> Option<ParamRef> {
        let id = self.list(owner)?.id(name)?;
        Some(ParamRef { owner, param: id })
    }
}

impl NeighborSource for MockWorld {
    fn neighbors(&self, group: GroupHandle) -> &[NeighborRelation] {
        self.neighbors
            .get(&group)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
