//! Core types and traits for the Murmur behavior-composition engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Murmur workspace:
//! generational handles, double-buffered parameters, grid geometry,
//! the collaborator traits behaviors read through, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod error;
pub mod grid;
pub mod id;
pub mod math;
pub mod parameter;
pub mod traits;

pub use arena::{Arena, ArenaKey, RawId};
pub use error::{ConfigError, LookupError, PortRole, SpaceError, TickError};
pub use grid::GridGeometry;
pub use id::{AgentId, GroupHandle, Owner, ParamId, ParamRef, SwarmId, TickId};
pub use parameter::{BackupBank, ParamShape, Parameter, ParameterList, Registration};
pub use traits::{
    NeighborQuery, NeighborRelation, NeighborSource, ParameterSource, SpatialIndex,
};
