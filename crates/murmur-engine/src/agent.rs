//! [`Agent`]: one entity's parameters and behavior pipeline.

use murmur_behavior::{ActContext, ActSummary, Behavior, BehaviorList};
use murmur_core::{LookupError, Parameter, ParameterList, SwarmId, TickError};
use std::fmt;

/// Whether an entity is a mobile agent or a grid environment.
///
/// Both are driven identically; the distinction only affects how their
/// registrations publish positions and how they are reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Vector state, typically a position registered in a space.
    Agent,
    /// Grid state, registered at the grid's center.
    Env,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::Env => write!(f, "env"),
        }
    }
}

/// An entity exclusively owning its parameters and behaviors.
///
/// Agents are created and destroyed through the
/// [`Simulation`](crate::Simulation), which keeps their spatial
/// registrations consistent. Read access is public; structural edits go
/// through the simulation.
#[derive(Debug)]
pub struct Agent {
    pub(crate) name: String,
    serial: u64,
    kind: EntityKind,
    swarm: Option<SwarmId>,
    pub(crate) params: ParameterList,
    pub(crate) behaviors: BehaviorList,
}

impl Agent {
    pub(crate) fn new(
        name: String,
        serial: u64,
        kind: EntityKind,
        swarm: Option<SwarmId>,
        params: ParameterList,
    ) -> Self {
        Self {
            name,
            serial,
            kind,
            swarm,
            params,
            behaviors: BehaviorList::new(),
        }
    }

    /// Unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serial number, unique over the simulation's lifetime and never reused.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Agent or environment.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Swarm membership.
    pub fn swarm(&self) -> Option<SwarmId> {
        self.swarm
    }

    /// Every parameter, internal ones included.
    pub fn parameters(&self) -> &ParameterList {
        &self.params
    }

    /// The behavior pipeline.
    pub fn behaviors(&self) -> &BehaviorList {
        &self.behaviors
    }

    /// Parameter by name.
    ///
    /// # Errors
    ///
    /// [`LookupError::Parameter`].
    pub fn parameter(&self, name: &str) -> Result<&Parameter, LookupError> {
        self.params.parameter(&self.name, name)
    }

    /// Committed value of a parameter by name.
    ///
    /// # Errors
    ///
    /// [`LookupError::Parameter`].
    pub fn value(&self, name: &str) -> Result<&[f32], LookupError> {
        self.parameter(name).map(Parameter::current)
    }

    /// Behavior by name.
    ///
    /// # Errors
    ///
    /// [`LookupError::Behavior`].
    pub fn behavior(&self, name: &str) -> Result<&dyn Behavior, LookupError> {
        self.behaviors.behavior(&self.name, name)
    }

    /// Run the pipeline once against `ctx`, staging every write.
    ///
    /// # Errors
    ///
    /// The first [`TickError`] raised by a behavior.
    pub fn act(&self, ctx: &mut ActContext<'_>) -> Result<ActSummary, TickError> {
        self.behaviors.act(ctx)
    }

    /// Commit every staged value.
    pub fn flush(&mut self) {
        self.params.flush();
    }

    /// Reset every staged value to the committed one.
    pub fn discard_staged(&mut self) {
        self.params.discard();
    }
}
