//! Creating, copying, editing, and removing entities.
//!
//! Every operation here is all-or-nothing: on error the simulation is left
//! exactly as it was, with no half-built agent, stray internal parameter,
//! or orphaned registration.

use crate::agent::{Agent, EntityKind};
use crate::simulation::{published_position, Simulation};
use crate::spec::{AgentSpec, EnvSpec, RegistrationSpec, SwarmSpec};
use crate::swarm::Swarm;
use murmur_behavior::{
    AttachContext, BehaviorFactory, BehaviorList, BehaviorSpec, WriteOrderPolicy,
};
use murmur_core::{
    AgentId, ConfigError, GroupHandle, LookupError, NeighborQuery, ParamRef, Parameter,
    ParameterList, Registration, SpaceError, SpatialIndex, SwarmId,
};
use tracing::{debug, warn};

impl Simulation {
    /// Create a swarm.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateEntity`] or [`ConfigError::DuplicateParameter`].
    pub fn spawn_swarm(&mut self, spec: &SwarmSpec) -> Result<SwarmId, ConfigError> {
        if self.swarm_names.contains_key(&spec.name) {
            return Err(ConfigError::DuplicateEntity {
                name: spec.name.clone(),
            });
        }
        let mut params = ParameterList::new();
        for p in &spec.parameters {
            params.add(p.build())?;
        }
        let id = self.swarms.insert(Swarm::new(spec.name.clone(), params));
        self.swarm_names.insert(spec.name.clone(), id);
        debug!(swarm = %spec.name, "swarm created");
        Ok(id)
    }

    /// Create an agent: parameters, then registrations, then behaviors in
    /// order.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]; nothing of the agent remains.
    pub fn spawn(
        &mut self,
        spec: &AgentSpec,
        factory: &dyn BehaviorFactory,
    ) -> Result<AgentId, ConfigError> {
        let swarm = match &spec.swarm {
            Some(name) => Some(self.swarm_id(name)?),
            None => None,
        };
        let mut params = ParameterList::new();
        for p in &spec.parameters {
            params.add(p.build())?;
        }
        self.build(
            &spec.name,
            EntityKind::Agent,
            swarm,
            params,
            &spec.registrations,
            &spec.behaviors,
            factory,
        )
    }

    /// Create an environment. Registered grids publish their center.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]; nothing of the environment remains.
    pub fn spawn_env(
        &mut self,
        spec: &EnvSpec,
        factory: &dyn BehaviorFactory,
    ) -> Result<AgentId, ConfigError> {
        let mut params = ParameterList::new();
        for field in &spec.fields {
            params.add(field.build()?)?;
        }
        for p in &spec.parameters {
            params.add(p.build())?;
        }
        self.build(
            &spec.name,
            EntityKind::Env,
            None,
            params,
            &spec.registrations,
            &spec.behaviors,
            factory,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &mut self,
        name: &str,
        kind: EntityKind,
        swarm: Option<SwarmId>,
        params: ParameterList,
        registrations: &[RegistrationSpec],
        behaviors: &[BehaviorSpec],
        factory: &dyn BehaviorFactory,
    ) -> Result<AgentId, ConfigError> {
        if self.agent_names.contains_key(name) {
            return Err(ConfigError::DuplicateEntity {
                name: name.to_string(),
            });
        }
        let id = self.insert_agent(name, kind, swarm, params);
        if let Err(e) = self.populate(id, registrations, behaviors, factory) {
            self.teardown(id);
            return Err(e);
        }
        debug!(%kind, name, behaviors = behaviors.len(), "entity created");
        Ok(id)
    }

    fn populate(
        &mut self,
        id: AgentId,
        registrations: &[RegistrationSpec],
        behaviors: &[BehaviorSpec],
        factory: &dyn BehaviorFactory,
    ) -> Result<(), ConfigError> {
        for r in registrations {
            self.register(id, &r.parameter, &r.space, &r.query())?;
        }
        for b in behaviors {
            self.add_behavior(id, b, factory)?;
        }
        Ok(())
    }

    fn insert_agent(
        &mut self,
        name: &str,
        kind: EntityKind,
        swarm: Option<SwarmId>,
        params: ParameterList,
    ) -> AgentId {
        let serial = self.next_serial;
        self.next_serial += 1;
        let id = self
            .agents
            .insert(Agent::new(name.to_string(), serial, kind, swarm, params));
        self.agent_names.insert(name.to_string(), id);
        if let Some(s) = swarm.and_then(|s| self.swarms.get_mut(s)) {
            s.members.insert(id);
        }
        self.dirty = true;
        id
    }

    /// Unlink an agent from every directory and retract its registrations.
    fn teardown(&mut self, id: AgentId) -> Option<Agent> {
        let mut agent = self.agents.remove(id)?;
        self.agent_names.shift_remove(agent.name());
        if let Some(s) = agent.swarm().and_then(|s| self.swarms.get_mut(s)) {
            s.members.shift_remove(&id);
        }
        for (_, p) in agent.params.iter_mut() {
            retract(p, self.index.as_mut());
        }
        self.dirty = true;
        Some(agent)
    }

    /// Destroy an agent or environment, returning it.
    ///
    /// Other agents never wire to another agent's parameters directly, so
    /// removal cannot leave a behavior dangling; neighbor lists drop the
    /// agent at the next refresh.
    ///
    /// # Errors
    ///
    /// [`LookupError::Agent`].
    pub fn remove_agent(&mut self, id: AgentId) -> Result<Agent, LookupError> {
        let agent = self.teardown(id).ok_or(LookupError::Agent(id))?;
        debug!(kind = %agent.kind(), name = agent.name(), "entity removed");
        Ok(agent)
    }

    /// Deep copy of `template` under a new name: parameter values,
    /// registrations (with the same query settings), swarm membership, and
    /// every behavior re-attached to the copy's own parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateEntity`], [`ConfigError::Lookup`], or any
    /// error re-attaching a behavior; nothing of the copy remains.
    pub fn copy_agent(&mut self, template: AgentId, name: &str) -> Result<AgentId, ConfigError> {
        if self.agent_names.contains_key(name) {
            return Err(ConfigError::DuplicateEntity {
                name: name.to_string(),
            });
        }
        let src = self.agent(template)?;
        let kind = src.kind();
        let swarm = src.swarm();
        let params = src.params.duplicate();
        let registrations: Vec<(String, String, NeighborQuery)> = src
            .params
            .iter()
            .flat_map(|(_, p)| {
                p.registrations()
                    .iter()
                    .map(move |(space, r)| (p.name().to_string(), space.clone(), r.query.clone()))
            })
            .collect();

        let id = self.insert_agent(name, kind, swarm, params);
        if let Err(e) = self.copy_into(template, id, &registrations) {
            self.teardown(id);
            return Err(e);
        }
        debug!(template = %template, name, "agent copied");
        Ok(id)
    }

    fn copy_into(
        &mut self,
        template: AgentId,
        id: AgentId,
        registrations: &[(String, String, NeighborQuery)],
    ) -> Result<(), ConfigError> {
        for (param, space, query) in registrations {
            self.register(id, param, space, query)?;
        }
        let policy = self.config.write_order;
        let copy = self.agents.get_mut(id).ok_or(LookupError::Agent(id))?;
        let mut params = std::mem::take(&mut copy.params);
        let name = copy.name.clone();
        let swarm = copy.swarm();

        let result = match self.agents.get(template) {
            Some(src) => {
                let swarm = swarm.and_then(|s| self.swarms.get(s).map(|sw| (s, &sw.params)));
                clone_pipeline(&src.behaviors, id, &name, &mut params, swarm, policy)
            }
            None => Err(LookupError::Agent(template).into()),
        };

        // The parameters go back even on failure so teardown can retract
        // their registrations.
        let copy = self.agents.get_mut(id).ok_or(LookupError::Agent(id))?;
        copy.params = params;
        copy.behaviors = result?;
        Ok(())
    }

    /// Register an agent's parameter in a space at its current position
    /// (a grid's center).
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`], or [`ConfigError::Space`] if the index
    /// rejects it or the parameter is already registered in that space.
    pub fn register(
        &mut self,
        agent: AgentId,
        param: &str,
        space: &str,
        query: &NeighborQuery,
    ) -> Result<GroupHandle, ConfigError> {
        let a = self.agents.get_mut(agent).ok_or(LookupError::Agent(agent))?;
        let id = a.params.id(param).ok_or_else(|| LookupError::Parameter {
            owner: a.name.clone(),
            name: param.to_string(),
        })?;
        let handle = ParamRef::agent(agent, id);
        let p = a
            .params
            .get_mut(id)
            .ok_or(ConfigError::Lookup(LookupError::Agent(agent)))?;
        if p.group(space).is_some() {
            return Err(SpaceError::AlreadyRegistered {
                space: space.to_string(),
                param: handle,
            }
            .into());
        }
        let group = self
            .index
            .register(handle, space, &published_position(p), query)?;
        p.add_registration(
            space,
            Registration {
                group,
                query: query.clone(),
            },
        );
        self.dirty = true;
        debug!(agent = %a.name, param, space, %group, "registered");
        Ok(group)
    }

    /// Retract a registration, returning whether there was one.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`], or [`ConfigError::ParameterInUse`] while a
    /// behavior reads that registration's neighbor list.
    pub fn deregister(
        &mut self,
        agent: AgentId,
        param: &str,
        space: &str,
    ) -> Result<bool, ConfigError> {
        let a = self.agents.get_mut(agent).ok_or(LookupError::Agent(agent))?;
        let Agent {
            name,
            params,
            behaviors,
            ..
        } = a;
        let p = params.parameter_mut(name, param)?;
        let Some(group) = p.group(space) else {
            return Ok(false);
        };
        let reader = behaviors.iter().find(|b| {
            b.inputs()
                .iter()
                .flat_map(|port| &port.groups)
                .any(|g| g.handle == group)
        });
        if let Some(b) = reader {
            return Err(ConfigError::ParameterInUse {
                parameter: format!("{param}@{space}"),
                behavior: b.name().to_string(),
            });
        }
        p.take_registration(space);
        self.index.deregister(group)?;
        self.dirty = true;
        debug!(agent = %name, param, space, "deregistered");
        Ok(true)
    }

    /// Attach a behavior at the end of an agent's pipeline.
    ///
    /// # Errors
    ///
    /// Any construction error, [`ConfigError::DuplicateBehavior`], or
    /// [`ConfigError::WriteOrder`] under the strict policy. Internal
    /// parameters created by a failed attach are removed again.
    pub fn add_behavior(
        &mut self,
        agent: AgentId,
        spec: &BehaviorSpec,
        factory: &dyn BehaviorFactory,
    ) -> Result<(), ConfigError> {
        self.attach(agent, None, spec, factory)
    }

    /// Attach a behavior at `index` in an agent's pipeline.
    ///
    /// # Errors
    ///
    /// As [`add_behavior`](Self::add_behavior).
    pub fn insert_behavior(
        &mut self,
        agent: AgentId,
        index: usize,
        spec: &BehaviorSpec,
        factory: &dyn BehaviorFactory,
    ) -> Result<(), ConfigError> {
        self.attach(agent, Some(index), spec, factory)
    }

    fn attach(
        &mut self,
        agent: AgentId,
        index: Option<usize>,
        spec: &BehaviorSpec,
        factory: &dyn BehaviorFactory,
    ) -> Result<(), ConfigError> {
        let policy = self.config.write_order;
        let a = self.agents.get_mut(agent).ok_or(LookupError::Agent(agent))?;
        let swarm = match a.swarm() {
            Some(s) => Some((s, &self.swarms.get(s).ok_or(LookupError::Swarm(s))?.params)),
            None => None,
        };
        let Agent {
            name,
            params,
            behaviors,
            ..
        } = a;
        let mut ctx = AttachContext::new(agent, name, params, swarm);
        let result = factory.create(spec, &mut ctx).and_then(|b| {
            let at = index.unwrap_or(behaviors.len());
            behaviors.insert(at, b, policy)
        });
        if let Err(e) = result {
            ctx.rollback();
            return Err(e);
        }
        debug!(
            agent = %name,
            behavior = %spec.name,
            class = %spec.class,
            internals = ctx.created().len(),
            "behavior attached"
        );
        Ok(())
    }

    /// Move a behavior to `index` in its agent's pipeline.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`], or [`ConfigError::WriteOrder`] under the
    /// strict policy.
    pub fn move_behavior(
        &mut self,
        agent: AgentId,
        name: &str,
        index: usize,
    ) -> Result<(), ConfigError> {
        let policy = self.config.write_order;
        let a = self.agents.get_mut(agent).ok_or(LookupError::Agent(agent))?;
        a.behaviors.move_to(&a.name, name, index, policy)?;
        debug!(agent = %a.name, behavior = name, index, "behavior moved");
        Ok(())
    }

    /// Detach a behavior and remove its internal parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`], or [`ConfigError::ParameterInUse`] if
    /// another behavior is wired to one of its internal parameters.
    pub fn remove_behavior(&mut self, agent: AgentId, name: &str) -> Result<(), ConfigError> {
        let a = self.agents.get_mut(agent).ok_or(LookupError::Agent(agent))?;
        let internals: Vec<ParamRef> = a
            .behaviors
            .behavior(&a.name, name)?
            .internal_parameters()
            .values()
            .copied()
            .collect();
        for other in a.behaviors.iter().filter(|b| b.name() != name) {
            if let Some(p) = internals.iter().find(|p| other.references(**p)) {
                return Err(ConfigError::ParameterInUse {
                    parameter: param_name(&a.params, *p),
                    behavior: other.name().to_string(),
                });
            }
        }
        a.behaviors.remove(name);
        for p in internals {
            if let Some(mut removed) = a.params.remove_id(p.param) {
                retract(&mut removed, self.index.as_mut());
            }
        }
        self.dirty = true;
        debug!(agent = %a.name, behavior = name, "behavior removed");
        Ok(())
    }

    /// Remove an agent's parameter, returning it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`], or [`ConfigError::ParameterInUse`] while
    /// any behavior is wired to it (internal parameters included).
    pub fn remove_parameter(
        &mut self,
        agent: AgentId,
        name: &str,
    ) -> Result<Parameter, ConfigError> {
        let a = self.agents.get_mut(agent).ok_or(LookupError::Agent(agent))?;
        let id = a.params.id(name).ok_or_else(|| LookupError::Parameter {
            owner: a.name.clone(),
            name: name.to_string(),
        })?;
        let handle = ParamRef::agent(agent, id);
        let user = a.behaviors.iter().find(|b| {
            b.references(handle) || b.internal_parameters().values().any(|p| *p == handle)
        });
        if let Some(b) = user {
            return Err(ConfigError::ParameterInUse {
                parameter: name.to_string(),
                behavior: b.name().to_string(),
            });
        }
        let mut removed = a
            .params
            .remove_id(id)
            .ok_or(ConfigError::Lookup(LookupError::Agent(agent)))?;
        retract(&mut removed, self.index.as_mut());
        self.dirty = true;
        debug!(agent = %a.name, param = name, "parameter removed");
        Ok(removed)
    }
}

/// Re-attach every behavior of `src` to another agent's parameters.
fn clone_pipeline(
    src: &BehaviorList,
    agent: AgentId,
    name: &str,
    params: &mut ParameterList,
    swarm: Option<(SwarmId, &ParameterList)>,
    policy: WriteOrderPolicy,
) -> Result<BehaviorList, ConfigError> {
    let mut list = BehaviorList::new();
    for behavior in src.iter() {
        let mut ctx = AttachContext::new(agent, name, params, swarm);
        let copy = behavior.clone_onto(&mut ctx)?;
        list.push(copy, policy)?;
    }
    Ok(list)
}

fn retract(p: &mut Parameter, index: &mut dyn SpatialIndex) {
    for (space, registration) in p.take_registrations() {
        if let Err(e) = index.deregister(registration.group) {
            warn!(param = p.name(), space = %space, error = %e, "registration already gone");
        }
    }
}

fn param_name(params: &ParameterList, p: ParamRef) -> String {
    params
        .get(p.param)
        .map(|param| param.name().to_string())
        .unwrap_or_else(|| p.to_string())
}
