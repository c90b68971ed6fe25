//! Strongly-typed handles and identifiers.

use crate::arena::{ArenaKey, RawId};
use std::fmt;

macro_rules! arena_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(RawId);

        impl $name {
            /// Slot index within the owning arena.
            pub fn index(self) -> u32 {
                self.0.index
            }

            /// Slot generation at the time the handle was issued.
            pub fn generation(self) -> u32 {
                self.0.generation
            }

            /// Pack into a single `u64`.
            pub fn to_bits(self) -> u64 {
                self.0.to_bits()
            }
        }

        impl ArenaKey for $name {
            fn from_raw(raw: RawId) -> Self {
                Self(raw)
            }

            fn raw(self) -> RawId {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

arena_handle!(
    /// Handle to an agent (or environment) in a simulation.
    AgentId,
    "agent"
);

arena_handle!(
    /// Handle to a swarm, the aggregate entity whose parameters member
    /// agents may read.
    SwarmId,
    "swarm"
);

arena_handle!(
    /// Handle to a parameter within one entity's parameter list.
    ParamId,
    "param"
);

/// The entity that owns a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Owner {
    /// An agent or environment.
    Agent(AgentId),
    /// A swarm.
    Swarm(SwarmId),
}

impl Owner {
    /// The agent handle, if this owner is an agent.
    pub fn agent(self) -> Option<AgentId> {
        match self {
            Self::Agent(id) => Some(id),
            Self::Swarm(_) => None,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent(id) => write!(f, "{id}"),
            Self::Swarm(id) => write!(f, "{id}"),
        }
    }
}

/// Non-owning reference to one parameter of one entity.
///
/// Stored by behaviors (their resolved wiring) and by neighbor relations.
/// Validity is checked on every dereference through the generation of
/// both the owner and the parameter handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamRef {
    /// Owning entity.
    pub owner: Owner,
    /// Parameter within the owner's list.
    pub param: ParamId,
}

impl ParamRef {
    /// Reference a parameter owned by an agent.
    pub fn agent(agent: AgentId, param: ParamId) -> Self {
        Self {
            owner: Owner::Agent(agent),
            param,
        }
    }

    /// Reference a parameter owned by a swarm.
    pub fn swarm(swarm: SwarmId, param: ParamId) -> Self {
        Self {
            owner: Owner::Swarm(swarm),
            param,
        }
    }
}

impl fmt::Display for ParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.param)
    }
}

/// Handle to one registration of a parameter in a named space.
///
/// Issued by the [`SpatialIndex`](crate::SpatialIndex); opaque to the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupHandle(pub u32);

impl fmt::Display for GroupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Monotonically increasing tick counter.
///
/// Incremented each time the simulation completes both phases of a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
