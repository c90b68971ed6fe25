//! [`Swarm`]: aggregate-level parameters shared by member agents.
//!
//! A member's behaviors resolve names against the agent first and the
//! swarm second, and may read swarm parameters but never write them.
//! Swarm values change only through configuration-time edits.

use indexmap::IndexSet;
use murmur_core::{AgentId, LookupError, Parameter, ParameterList};

/// A named group of agents with shared parameters.
#[derive(Debug)]
pub struct Swarm {
    pub(crate) name: String,
    pub(crate) params: ParameterList,
    pub(crate) members: IndexSet<AgentId>,
}

impl Swarm {
    pub(crate) fn new(name: String, params: ParameterList) -> Self {
        Self {
            name,
            params,
            members: IndexSet::new(),
        }
    }

    /// Unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared parameters.
    pub fn parameters(&self) -> &ParameterList {
        &self.params
    }

    /// Parameter by name.
    ///
    /// # Errors
    ///
    /// [`LookupError::Parameter`].
    pub fn parameter(&self, name: &str) -> Result<&Parameter, LookupError> {
        self.params.parameter(&self.name, name)
    }

    /// Member agents in joining order.
    pub fn members(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.members.iter().copied()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the swarm has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
