//! Attach-time resolution of wiring tokens into handles.
//!
//! [`AttachContext`] gives a behavior constructor mutable access to the
//! agent's parameter list (to create internal parameters) and read access
//! to the agent's swarm. Every parameter it creates is remembered so a
//! failed attach can be rolled back without leaving anything behind.

use crate::wiring::{parse_wiring, WiringToken};
use murmur_core::{
    AgentId, ConfigError, GroupHandle, ParamId, ParamRef, ParamShape, Parameter, ParameterList,
    PortRole, SwarmId,
};

/// A neighbor group bound to a port through `@space`.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborGroup {
    /// Space name.
    pub space: String,
    /// The registration's group handle.
    pub handle: GroupHandle,
    /// Parameter to fetch on each neighbor, if the token named one.
    pub neighbor_param: Option<String>,
}

/// One resolved input or output of a behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    /// Parameter name as written in the wiring.
    pub name: String,
    /// Resolved handle.
    pub param: ParamRef,
    /// Shape at attach time; fixed for the parameter's lifetime.
    pub shape: ParamShape,
    /// Neighbor groups, one per `@space` binding.
    pub groups: Vec<NeighborGroup>,
}

impl Port {
    /// Value dimension (per cell for grids).
    pub fn dim(&self) -> usize {
        self.shape.value_dim()
    }
}

/// Resolution scope for one behavior attach.
pub struct AttachContext<'a> {
    agent: AgentId,
    agent_name: &'a str,
    params: &'a mut ParameterList,
    swarm: Option<(SwarmId, &'a ParameterList)>,
    created: Vec<ParamId>,
}

impl<'a> AttachContext<'a> {
    /// Scope resolution to one agent and, optionally, its swarm.
    pub fn new(
        agent: AgentId,
        agent_name: &'a str,
        params: &'a mut ParameterList,
        swarm: Option<(SwarmId, &'a ParameterList)>,
    ) -> Self {
        Self {
            agent,
            agent_name,
            params,
            swarm,
            created: Vec::new(),
        }
    }

    /// The agent being attached to.
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// The agent's name.
    pub fn agent_name(&self) -> &str {
        self.agent_name
    }

    /// Parameters created through this context so far.
    pub fn created(&self) -> &[ParamId] {
        &self.created
    }

    /// Committed value of a resolved parameter, for attach-time validation.
    pub fn value(&self, param: ParamRef) -> Option<&[f32]> {
        self.lookup(param).map(Parameter::current)
    }

    fn lookup(&self, param: ParamRef) -> Option<&Parameter> {
        match param.owner {
            murmur_core::Owner::Agent(a) if a == self.agent => self.params.get(param.param),
            murmur_core::Owner::Swarm(s) => match self.swarm {
                Some((id, list)) if id == s => list.get(param.param),
                _ => None,
            },
            murmur_core::Owner::Agent(_) => None,
        }
    }

    /// Resolve one token.
    ///
    /// The name is looked up on the agent first, then on its swarm. Outputs
    /// must resolve to the agent's own parameters. Every `@space` binding
    /// must name a space the parameter is registered in.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownParameter`], [`ConfigError::ForeignOutput`], or
    /// [`ConfigError::NotRegistered`].
    pub fn resolve(
        &self,
        behavior: &str,
        token: &WiringToken,
        role: PortRole,
    ) -> Result<Port, ConfigError> {
        let own = self
            .params
            .id(&token.param)
            .map(|id| ParamRef::agent(self.agent, id));
        let found = own.or_else(|| {
            let (swarm, list) = self.swarm?;
            list.id(&token.param).map(|id| ParamRef::swarm(swarm, id))
        });
        let param = found.ok_or_else(|| ConfigError::UnknownParameter {
            behavior: behavior.to_string(),
            agent: self.agent_name.to_string(),
            name: token.param.clone(),
        })?;
        if role == PortRole::Output && param.owner.agent() != Some(self.agent) {
            return Err(ConfigError::ForeignOutput {
                behavior: behavior.to_string(),
                parameter: token.param.clone(),
            });
        }

        let parameter = self
            .lookup(param)
            .ok_or_else(|| ConfigError::UnknownParameter {
                behavior: behavior.to_string(),
                agent: self.agent_name.to_string(),
                name: token.param.clone(),
            })?;
        let groups = token
            .spaces
            .iter()
            .map(|binding| {
                let handle =
                    parameter
                        .group(&binding.space)
                        .ok_or_else(|| ConfigError::NotRegistered {
                            behavior: behavior.to_string(),
                            parameter: token.param.clone(),
                            space: binding.space.clone(),
                        })?;
                Ok(NeighborGroup {
                    space: binding.space.clone(),
                    handle,
                    neighbor_param: binding.neighbor_param.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Port {
            name: token.param.clone(),
            param,
            shape: parameter.shape().clone(),
            groups,
        })
    }

    /// Parse and resolve a whole token list.
    ///
    /// # Errors
    ///
    /// Any error from [`parse_wiring`] or [`resolve`](Self::resolve).
    pub fn resolve_all(
        &self,
        behavior: &str,
        text: &str,
        role: PortRole,
    ) -> Result<Vec<Port>, ConfigError> {
        parse_wiring(text)?
            .iter()
            .map(|token| self.resolve(behavior, token, role))
            .collect()
    }

    /// Create (or adopt) the internal parameter `<behavior>_<key>`.
    ///
    /// An existing parameter of that name is adopted as-is, which is how a
    /// copied agent keeps its behaviors' tuned values. Its dimension must
    /// match `values`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Dimension`] if an adopted parameter has the wrong
    /// dimension or is a grid.
    pub fn internal_param(
        &mut self,
        behavior: &str,
        key: &str,
        values: Vec<f32>,
    ) -> Result<ParamRef, ConfigError> {
        let name = internal_name(behavior, key);
        if let Some(id) = self.params.id(&name) {
            let existing = self.params.parameter(self.agent_name, &name)?;
            if existing.shape().is_grid() || existing.dim() != values.len() {
                return Err(ConfigError::Dimension {
                    behavior: behavior.to_string(),
                    parameter: name,
                    expected: values.len(),
                    actual: existing.shape().storage_len(),
                });
            }
            return Ok(ParamRef::agent(self.agent, id));
        }
        let id = self
            .params
            .add(Parameter::new(name, values).owned_by(behavior))?;
        self.created.push(id);
        Ok(ParamRef::agent(self.agent, id))
    }

    /// Remove every parameter created through this context.
    pub fn rollback(&mut self) {
        for id in self.created.drain(..).rev() {
            self.params.remove_id(id);
        }
    }
}

/// Name under which a behavior's internal parameter is visible.
pub fn internal_name(behavior: &str, key: &str) -> String {
    format!("{behavior}_{key}")
}
