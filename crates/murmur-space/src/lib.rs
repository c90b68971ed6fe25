//! Spatial collaborators for Murmur simulations.
//!
//! The engine treats neighbor search as an external concern reached
//! through [`SpatialIndex`](murmur_core::SpatialIndex). This crate provides:
//!
//! - [`ProximitySpace`]: an exact all-pairs reference index supporting any
//!   number of named spaces, suitable for small populations and tests.
//! - [`field`]: sampling and localized writes on grid parameters.
//! - [`stencil`]: von Neumann neighbour lookup for grid stencils.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod field;
pub mod proximity;
pub mod stencil;

pub use field::{Placement, WriteOp};
pub use proximity::ProximitySpace;
pub use stencil::von_neumann;
