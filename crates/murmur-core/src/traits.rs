//! Collaborator traits: parameter reads and the spatial index.
//!
//! Behaviors never see the simulation directly. During the act-phase they
//! read committed values through a [`ParameterSource`] and neighbor lists
//! through a [`NeighborSource`]; both are implemented by the engine (and by
//! mocks in `murmur-test-utils`).

use crate::error::SpaceError;
use crate::id::{GroupHandle, Owner, ParamRef};
use crate::parameter::ParamShape;
use smallvec::SmallVec;

/// Read-only access to committed parameter values.
///
/// Implementations must only ever expose `current` buffers, never staged
/// ones. Returns `None` for stale references.
pub trait ParameterSource {
    /// Committed value of a parameter.
    fn current(&self, param: ParamRef) -> Option<&[f32]>;

    /// Shape of a parameter.
    fn shape(&self, param: ParamRef) -> Option<&ParamShape>;

    /// Look up a parameter by name on an entity.
    fn find(&self, owner: Owner, name: &str) -> Option<ParamRef>;
}

/// One entry of a neighbor list.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborRelation {
    /// The neighbor's registered parameter (usually its position).
    pub neighbor: ParamRef,
    /// Euclidean distance from the querying position.
    pub distance: f32,
    /// Unit vector pointing from the querying position to the neighbor.
    /// All zeros when the two positions coincide.
    pub direction: SmallVec<[f32; 4]>,
}

/// Read-only access to neighbor lists.
///
/// Lists are ordered by the index and must not change during an act-phase.
pub trait NeighborSource {
    /// Neighbors of a registered parameter. Unknown groups yield an empty list.
    fn neighbors(&self, group: GroupHandle) -> &[NeighborRelation];
}

/// Algorithm parameters supplied when registering in a space.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborQuery {
    /// Whether other members can discover this registration.
    pub visible: bool,
    /// Search radius. Non-positive means unbounded.
    pub radius: f32,
    /// Maximum list length. Zero means unbounded.
    pub max_neighbors: usize,
    /// When the list is full, replace the farthest entry with a closer
    /// candidate (`true`) or keep the first candidates found (`false`).
    pub replace_when_full: bool,
}

impl Default for NeighborQuery {
    fn default() -> Self {
        Self {
            visible: true,
            radius: 0.0,
            max_neighbors: 0,
            replace_when_full: true,
        }
    }
}

/// The spatial index the engine consults.
///
/// The engine supplies geometry (the registered parameter's committed
/// value as its position) and query settings; partitioning strategy is
/// entirely the index's business.
pub trait SpatialIndex: NeighborSource + Send {
    /// Register a parameter's position in a named space.
    fn register(
        &mut self,
        param: ParamRef,
        space: &str,
        position: &[f32],
        query: &NeighborQuery,
    ) -> Result<GroupHandle, SpaceError>;

    /// Publish a new position for a registration.
    fn publish(&mut self, group: GroupHandle, position: &[f32]) -> Result<(), SpaceError>;

    /// Retract a registration.
    fn deregister(&mut self, group: GroupHandle) -> Result<(), SpaceError>;

    /// Recompute every neighbor list from the published positions.
    fn refresh(&mut self);
}
