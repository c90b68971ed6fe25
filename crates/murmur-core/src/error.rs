//! Error types for the Murmur engine.
//!
//! Organized by when they can occur: [`ConfigError`] at construction and
//! attach time, [`LookupError`] for by-name and by-handle queries,
//! [`TickError`] during the act-phase, and [`SpaceError`] from the
//! spatial index. Per-tick numeric edge cases are never errors.

use crate::id::{AgentId, GroupHandle, ParamRef, SwarmId};

/// Which side of a behavior's wiring an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortRole {
    /// The input token list.
    Input,
    /// The output token list.
    Output,
}

impl std::fmt::Display for PortRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Construction-time configuration errors.
///
/// Always fatal for the entity being built; the engine never leaves a
/// partially attached behavior or half-created parameter behind.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A wiring string does not follow the `name[@space[:param][,space…]]` grammar.
    #[error("malformed wiring `{text}`: {reason}")]
    Wiring {
        /// The offending wiring text.
        text: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A wiring token names a parameter the agent (or its swarm) does not have.
    #[error("behavior '{behavior}': unknown parameter '{name}' on '{agent}'")]
    UnknownParameter {
        /// Behavior being attached.
        behavior: String,
        /// Agent the name was resolved against.
        agent: String,
        /// The unresolved parameter name.
        name: String,
    },

    /// A wiring token uses `@space` but the parameter is not registered there.
    #[error("behavior '{behavior}': parameter '{parameter}' is not registered in space '{space}'")]
    NotRegistered {
        /// Behavior being attached.
        behavior: String,
        /// The parameter named by the token.
        parameter: String,
        /// The space named after `@`.
        space: String,
    },

    /// Wrong number of input or output tokens.
    #[error("behavior '{behavior}' ({class}): expected {expected} {role} parameter(s), got {actual}")]
    Arity {
        /// Behavior being attached.
        behavior: String,
        /// Behavior class tag.
        class: String,
        /// Input or output side.
        role: PortRole,
        /// Human-readable expectation (e.g. `"2"` or `"at least 1"`).
        expected: String,
        /// Number of tokens supplied.
        actual: usize,
    },

    /// A parameter's value dimension violates the behavior's contract.
    #[error("behavior '{behavior}': parameter '{parameter}' has dimension {actual}, expected {expected}")]
    Dimension {
        /// Behavior being attached.
        behavior: String,
        /// The offending parameter.
        parameter: String,
        /// Required dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Two grid parameters used together do not share shape and bounds.
    #[error("behavior '{behavior}': grids '{first}' and '{second}' differ in shape or bounds")]
    GridMismatch {
        /// Behavior being attached.
        behavior: String,
        /// First grid parameter.
        first: String,
        /// Second grid parameter.
        second: String,
    },

    /// A behavior needs a grid parameter but got a vector, or vice versa.
    #[error("behavior '{behavior}': parameter '{parameter}' must be a {expected} parameter")]
    ParameterKind {
        /// Behavior being attached.
        behavior: String,
        /// The offending parameter.
        parameter: String,
        /// `"grid"` or `"vector"`.
        expected: &'static str,
    },

    /// A token requires neighbor groups the behavior cannot do without.
    #[error("behavior '{behavior}': parameter '{parameter}' needs at least one @space binding")]
    MissingNeighborGroup {
        /// Behavior being attached.
        behavior: String,
        /// The token without a space binding.
        parameter: String,
    },

    /// A parameter name is already taken within one list.
    #[error("duplicate parameter name '{name}'")]
    DuplicateParameter {
        /// The duplicated name.
        name: String,
    },

    /// A behavior name is already taken within one agent.
    #[error("duplicate behavior name '{name}'")]
    DuplicateBehavior {
        /// The duplicated name.
        name: String,
    },

    /// An output token resolved to a parameter the acting agent does not own.
    #[error("behavior '{behavior}': output '{parameter}' is not owned by the agent")]
    ForeignOutput {
        /// Behavior being attached.
        behavior: String,
        /// The output parameter.
        parameter: String,
    },

    /// A replace-mode writer follows an accumulating writer of the same parameter.
    #[error(
        "behavior '{behavior}' replaces '{parameter}' after '{earlier}' already accumulated into it"
    )]
    WriteOrder {
        /// The replace-mode behavior.
        behavior: String,
        /// The contested parameter.
        parameter: String,
        /// The earlier accumulating behavior.
        earlier: String,
    },

    /// An internal-parameter value is out of its valid domain.
    #[error("behavior '{behavior}': invalid value for '{parameter}': {reason}")]
    InvalidValue {
        /// Behavior being attached.
        behavior: String,
        /// Internal parameter name.
        parameter: String,
        /// What is wrong.
        reason: String,
    },

    /// An internal-parameter override names a key the behavior does not declare.
    #[error("behavior '{behavior}' ({class}) has no internal parameter '{key}'")]
    UnknownInternal {
        /// Behavior being attached.
        behavior: String,
        /// Behavior class tag.
        class: String,
        /// The unknown key.
        key: String,
    },

    /// No constructor is registered for a behavior class tag.
    #[error("unknown behavior class '{class}'")]
    UnknownClass {
        /// The unknown class tag.
        class: String,
    },

    /// An agent, environment, or swarm name is already taken.
    #[error("an entity named '{name}' already exists")]
    DuplicateEntity {
        /// The duplicated name.
        name: String,
    },

    /// A parameter cannot be removed while a behavior is wired to it.
    #[error("parameter '{parameter}' is still wired into behavior '{behavior}'")]
    ParameterInUse {
        /// The parameter.
        parameter: String,
        /// A behavior referencing it.
        behavior: String,
    },

    /// Grid geometry is malformed.
    #[error("invalid grid: {reason}")]
    InvalidGrid {
        /// What is wrong.
        reason: String,
    },

    /// A simulation-level setting is invalid.
    #[error("invalid simulation config: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// A referenced entity does not exist.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The spatial index rejected a registration.
    #[error(transparent)]
    Space(#[from] SpaceError),
}

/// A named or handle-addressed entity could not be found.
///
/// Lookups never mutate state, so these errors leave the simulation intact.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// No live agent behind the handle.
    #[error("no such agent {0}")]
    Agent(AgentId),

    /// No agent with the given name.
    #[error("no agent named '{0}'")]
    AgentName(String),

    /// No live swarm behind the handle.
    #[error("no such swarm {0}")]
    Swarm(SwarmId),

    /// No swarm with the given name.
    #[error("no swarm named '{0}'")]
    SwarmName(String),

    /// No parameter with the given name on the entity.
    #[error("'{owner}' has no parameter '{name}'")]
    Parameter {
        /// Entity name.
        owner: String,
        /// Missing parameter name.
        name: String,
    },

    /// No behavior with the given name on the agent.
    #[error("'{agent}' has no behavior '{name}'")]
    Behavior {
        /// Agent name.
        agent: String,
        /// Missing behavior name.
        name: String,
    },
}

/// Errors raised during the act-phase.
///
/// These only occur when an entity was removed while still wired into a
/// live behavior. The driver discards the attempted tick.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TickError {
    /// A wired parameter (or its owner) no longer exists.
    #[error("stale parameter reference {0}")]
    StaleParameter(ParamRef),

    /// A behavior tried to stage a write into a parameter its agent does not own.
    #[error("parameter {param} is not writable by {agent}")]
    ForeignWrite {
        /// The acting agent.
        agent: AgentId,
        /// The target parameter.
        param: ParamRef,
    },

    /// The acting agent itself is gone.
    #[error("no such agent {0}")]
    StaleAgent(AgentId),
}

/// Errors from the spatial index.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpaceError {
    /// Space names must be non-empty.
    #[error("space name must not be empty")]
    EmptyName,

    /// Every position in one space must have the same dimension.
    #[error("space '{space}' holds {expected}-dimensional positions, got {actual}")]
    Dimension {
        /// Space name.
        space: String,
        /// Dimension fixed by the first registration.
        expected: usize,
        /// Dimension of the rejected position.
        actual: usize,
    },

    /// The parameter is already registered in this space.
    #[error("{param} is already registered in space '{space}'")]
    AlreadyRegistered {
        /// Space name.
        space: String,
        /// The parameter.
        param: ParamRef,
    },

    /// The group handle is not known to the index.
    #[error("unknown {0}")]
    UnknownGroup(GroupHandle),
}
