//! Behavior trait, wiring grammar, and act context for Murmur simulations.
//!
//! A behavior is bound once, at attach time, to resolved parameter handles
//! and neighbor groups. Each tick it reads committed values and writes
//! staged values through an [`ActContext`]. Its per-output [`WriteMode`]
//! decides how it composes with the other behaviors of the same agent.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attach;
pub mod behavior;
pub mod context;
pub mod list;
pub mod pipeline;
pub mod wiring;

pub use attach::{internal_name, AttachContext, NeighborGroup, Port};
pub use behavior::{Behavior, BehaviorCore, BehaviorFactory, BehaviorSpec, WriteMode, ACTIVE};
pub use context::ActContext;
pub use list::{ActSummary, BehaviorList};
pub use pipeline::{write_order_violations, WriteOrderPolicy, WriteOrderViolation};
pub use wiring::{format_wiring, parse_wiring, SpaceBinding, WiringToken};
